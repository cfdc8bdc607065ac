//! Draft reconciliation engine for git-backed content editing.
//!
//! Users stage edits to documents and media as drafts, see them overlaid on a
//! navigation tree, and commit them to a GitHub or GitLab repository in one
//! batch. See [`state::StudioSession`] for the entry point.

pub mod compare;
pub mod draft;
pub mod error;
pub mod events;
pub mod host;
pub mod models;
pub mod repository;
pub mod settings;
pub mod state;
pub mod tree;

#[cfg(feature = "cli")]
pub mod cli;

pub use draft::{DraftStore, RenameRequest};
pub use error::{Result, StudioError};
pub use events::{EventBus, EventHandler, StudioEvent};
pub use models::{DocumentItem, DraftItem, DraftStatus, MediaItem, TreeItem, TreeStatus};
pub use repository::{create_provider, RepositoryClient, RepositoryConfig, RepositoryProvider};
pub use state::{HostServices, StudioSession};
pub use tree::{build_tree, TreeState};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence; otherwise the crate logs at `level`
/// (`advanced.log_level` in settings). Calling this twice is harmless.
pub fn init_tracing(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("studio_lib={}", level)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
