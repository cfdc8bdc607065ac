//! CLI argument parsing using clap.
//!
//! Defines the command-line interface for studio-cli.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Studio CLI - Inspect and commit content drafts headlessly
#[derive(Parser, Debug, Clone)]
#[command(name = "studio-cli")]
#[command(version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Settings file (default: ~/.studio/settings.toml)
    #[arg(long, global = true, env = "STUDIO_SETTINGS")]
    pub config: Option<PathBuf>,

    /// Output as JSON (for scripting/parsing)
    #[arg(long, global = true)]
    pub json: bool,

    /// Show verbose output (debug information)
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show the draft tree with statuses
    Status,

    /// Show a unified diff of every draft against its original
    Diff,

    /// Print a file from the remote branch
    Fetch {
        /// Path relative to the repository root dir, e.g. content/index.md
        path: String,
    },

    /// Commit every pending draft
    Commit {
        /// Commit message
        #[arg(short = 'm', long)]
        message: String,
    },

    /// Revert one draft (and its descendants) or all drafts
    Revert {
        /// Draft id, e.g. content/guide/intro.md
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        id: Option<String>,

        /// Revert every draft
        #[arg(long)]
        all: bool,
    },

    /// Write the settings template if no settings file exists
    Init,

    /// Read or change a setting by dot-notation key
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigAction {
    /// Print a setting, e.g. repository.branch
    Get { key: String },

    /// Change a setting and save the file. Values are parsed as JSON when
    /// possible, otherwise kept as strings.
    Set { key: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_status() {
        let args = Args::parse_from(["studio-cli", "status"]);
        assert_eq!(args.command, Command::Status);
        assert!(!args.json);
        assert!(!args.verbose);
        assert!(args.config.is_none());
    }

    #[test]
    fn test_args_commit_message() {
        let args = Args::parse_from(["studio-cli", "commit", "-m", "Fix typo"]);
        assert_eq!(
            args.command,
            Command::Commit {
                message: "Fix typo".to_string()
            }
        );
    }

    #[test]
    fn test_args_revert_modes() {
        let args = Args::parse_from(["studio-cli", "revert", "--all"]);
        assert_eq!(args.command, Command::Revert { id: None, all: true });

        let args = Args::parse_from(["studio-cli", "revert", "content/a.md"]);
        assert_eq!(
            args.command,
            Command::Revert {
                id: Some("content/a.md".to_string()),
                all: false
            }
        );

        assert!(Args::try_parse_from(["studio-cli", "revert"]).is_err());
        assert!(Args::try_parse_from(["studio-cli", "revert", "a", "--all"]).is_err());
    }

    #[test]
    fn test_args_config_actions() {
        let args = Args::parse_from(["studio-cli", "config", "get", "repository.branch"]);
        assert_eq!(
            args.command,
            Command::Config {
                action: ConfigAction::Get {
                    key: "repository.branch".to_string()
                }
            }
        );

        let args = Args::parse_from(["studio-cli", "config", "set", "advanced.log_level", "debug"]);
        assert_eq!(
            args.command,
            Command::Config {
                action: ConfigAction::Set {
                    key: "advanced.log_level".to_string(),
                    value: "debug".to_string()
                }
            }
        );
    }

    #[test]
    fn test_args_global_flags() {
        let args = Args::parse_from(["studio-cli", "diff", "--json", "-v"]);
        assert_eq!(args.command, Command::Diff);
        assert!(args.json);
        assert!(args.verbose);
    }
}
