//! Studio CLI - Headless interface to the draft engine
//!
//! Inspects, diffs, reverts and commits drafts persisted by an editing
//! session, against the repository configured in `~/.studio/settings.toml`.
//!
//! # Usage
//!
//! ```bash
//! # Write the settings template
//! ./target/debug/studio-cli init
//!
//! # Draft tree with statuses
//! ./target/debug/studio-cli status
//!
//! # Unified diff of pending documents
//! ./target/debug/studio-cli diff
//!
//! # Commit every pending draft
//! ./target/debug/studio-cli commit -m "Update docs"
//!
//! # JSON output for scripting
//! ./target/debug/studio-cli status --json | jq .
//! ```

use anyhow::Result;
use clap::Parser;

use studio_lib::cli::{initialize, run, Args};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let ctx = initialize(&args).await?;

    run(&ctx).await
}
