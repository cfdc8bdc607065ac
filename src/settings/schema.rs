//! Settings schema definitions for Studio configuration.
//!
//! All settings structs use `#[serde(default)]` to allow partial configuration files.
//! Missing fields are filled with sensible defaults.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::repository::RepositoryProvider;

/// Root settings structure for Studio.
///
/// Loaded from `~/.studio/settings.toml` with environment variable interpolation support.
/// Version field enables future migrations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StudioSettings {
    /// Schema version for migrations
    pub version: u32,

    /// Remote repository holding the content
    pub repository: RepositorySettings,

    /// Commit author identity
    pub author: AuthorSettings,

    /// Where drafts are persisted between sessions
    pub storage: StorageSettings,

    /// Advanced/debug settings
    pub advanced: AdvancedSettings,
}

/// Remote repository settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositorySettings {
    /// Provider flavor: "github" | "gitlab"
    pub provider: RepositoryProvider,

    /// Repository owner (user, organization or GitLab namespace)
    pub owner: String,

    /// Repository name
    pub repo: String,

    /// Branch drafts are read from and committed to
    pub branch: String,

    /// Directory inside the repository that holds `content/` and `public/`
    pub root_dir: String,

    /// Self-hosted instance URL (GitLab only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_url: Option<String>,

    /// Write token (supports $ENV_VAR syntax)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Commit author identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorSettings {
    pub name: String,
    pub email: String,
}

/// Draft persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StorageSettings {
    /// Directory for persisted drafts (defaults to ~/.studio/drafts/)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
}

/// Advanced/debug settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvancedSettings {
    /// Log level: "error" | "warn" | "info" | "debug" | "trace"
    pub log_level: String,

    /// Timeout applied to every repository HTTP request
    pub request_timeout_secs: u64,
}

impl StorageSettings {
    /// Resolve the draft directory, falling back to `~/.studio/drafts`.
    pub fn resolve_data_dir(&self) -> PathBuf {
        match &self.data_dir {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".studio")
                .join("drafts"),
        }
    }
}

// =============================================================================
// Default implementations
// =============================================================================

impl Default for StudioSettings {
    fn default() -> Self {
        Self {
            version: 1,
            repository: RepositorySettings::default(),
            author: AuthorSettings::default(),
            storage: StorageSettings::default(),
            advanced: AdvancedSettings::default(),
        }
    }
}

impl Default for RepositorySettings {
    fn default() -> Self {
        Self {
            provider: RepositoryProvider::GitHub,
            owner: String::new(),
            repo: String::new(),
            branch: "main".to_string(),
            root_dir: String::new(),
            instance_url: None,
            token: None,
        }
    }
}

impl Default for AuthorSettings {
    fn default() -> Self {
        Self {
            name: "Studio".to_string(),
            email: "studio@localhost".to_string(),
        }
    }
}

impl Default for AdvancedSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            request_timeout_secs: 30,
        }
    }
}
