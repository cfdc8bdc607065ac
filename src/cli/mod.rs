//! CLI module for headless draft inspection and commits.
//!
//! The CLI opens the same [`StudioSession`](crate::state::StudioSession) an
//! embedding application would, backed by drafts persisted on disk and an
//! in-memory content projection. It is meant for scripting: every command
//! supports `--json`.

mod args;
mod bootstrap;
mod output;
mod runner;

pub use args::{Args, Command, ConfigAction};
pub use bootstrap::{initialize, CliContext};
pub use runner::run;
