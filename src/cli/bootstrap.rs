//! CLI bootstrap - Load settings and open an editing session.
//!
//! Drafts persist in `FsStorage` under the configured data dir, one JSON file
//! per item kind. The content projection starts empty and is rebuilt from the
//! persisted drafts on load.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::host::{BasicConverter, FsStorage, MemoryDatabase};
use crate::models::{DocumentItem, MediaItem, MEDIA_COLLECTION};
use crate::settings::{SettingsManager, StudioSettings};
use crate::state::{HostServices, StudioSession};

use super::args::Args;

/// Collection name of documents opened from the CLI.
const DOCUMENT_COLLECTION: &str = "content";

/// Context for CLI execution: settings plus the parsed arguments.
pub struct CliContext {
    /// Settings manager
    pub settings_manager: Arc<SettingsManager>,

    /// Snapshot of the settings at startup
    pub settings: StudioSettings,

    /// Command-line arguments
    pub args: Args,
}

impl CliContext {
    /// Open a session over the persisted drafts and load them.
    pub async fn open_session(&self) -> Result<StudioSession> {
        let data_dir = self.settings.storage.resolve_data_dir();
        if self.args.verbose {
            eprintln!("[cli] Drafts directory: {}", data_dir.display());
        }

        let host = host_services(&data_dir);
        let session = StudioSession::start(&self.settings, host)
            .context("Failed to start session (check [repository] in settings.toml)")?;
        session
            .load()
            .await
            .context("Failed to load persisted drafts")?;
        Ok(session)
    }
}

fn host_services(data_dir: &Path) -> HostServices {
    HostServices {
        document_db: Arc::new(MemoryDatabase::<DocumentItem>::new(DOCUMENT_COLLECTION)),
        media_db: Arc::new(MemoryDatabase::<MediaItem>::new(MEDIA_COLLECTION)),
        document_storage: Arc::new(FsStorage::new(data_dir, "documents")),
        media_storage: Arc::new(FsStorage::new(data_dir, "medias")),
        converter: Arc::new(BasicConverter),
    }
}

/// Initialize the CLI context: `.env`, logging and settings.
pub async fn initialize(args: &Args) -> Result<CliContext> {
    // Load .env file if present
    if let Err(e) = dotenvy::dotenv() {
        // Only warn on errors other than file not found
        if !matches!(e, dotenvy::Error::Io(_)) {
            tracing::warn!("Failed to load .env file: {}", e);
        }
    }

    let settings_manager = Arc::new(match &args.config {
        Some(path) => SettingsManager::with_path(path.clone())
            .await
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => SettingsManager::new()
            .await
            .context("Failed to initialize settings manager")?,
    });

    let settings = settings_manager.get().await;

    let level = if args.verbose {
        "debug"
    } else {
        settings.advanced.log_level.as_str()
    };
    crate::init_tracing(level);

    if args.verbose {
        eprintln!(
            "[cli] Settings loaded from {}",
            settings_manager.path().display()
        );
        eprintln!(
            "[cli] Repository: {}/{}@{} ({})",
            settings.repository.owner,
            settings.repository.repo,
            settings.repository.branch,
            settings.repository.provider
        );
    }

    Ok(CliContext {
        settings_manager,
        settings,
        args: args.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[tokio::test]
    async fn test_initialize_with_config_path() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("settings.toml");
        std::fs::write(
            &config,
            "[repository]\nowner = \"acme\"\nrepo = \"docs\"\n",
        )
        .unwrap();

        let args = Args::parse_from([
            "studio-cli",
            "status",
            "--config",
            config.to_str().unwrap(),
        ]);
        let ctx = initialize(&args).await.unwrap();

        assert_eq!(ctx.settings.repository.owner, "acme");
        assert_eq!(ctx.settings_manager.path(), &config);
    }

    #[tokio::test]
    async fn test_host_services_persist_under_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let host = host_services(dir.path());

        host.document_storage
            .set_item("content/a.md", serde_json::json!({ "id": "content/a.md" }))
            .await
            .unwrap();

        assert!(dir.path().join("documents.json").exists());
    }
}
