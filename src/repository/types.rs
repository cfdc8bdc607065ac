//! Types shared by the repository providers.

use std::time::Duration;

use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::settings::{resolve_token, StudioSettings};

/// Supported remote repository flavors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RepositoryProvider {
    #[serde(rename = "github")]
    GitHub,
    #[serde(rename = "gitlab")]
    GitLab,
}

impl std::fmt::Display for RepositoryProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RepositoryProvider::GitHub => write!(f, "github"),
            RepositoryProvider::GitLab => write!(f, "gitlab"),
        }
    }
}

impl std::str::FromStr for RepositoryProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "github" => Ok(RepositoryProvider::GitHub),
            "gitlab" => Ok(RepositoryProvider::GitLab),
            other => Err(format!("Unknown repository provider: {}", other)),
        }
    }
}

/// A file read from the remote branch head.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteFile {
    pub name: String,
    pub path: String,
    pub sha: String,
    pub size: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Base64 payload as returned by the provider (may contain line breaks).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    pub encoding: String,
    pub provider: RepositoryProvider,
}

impl RemoteFile {
    /// Decode the base64 payload as UTF-8 text.
    pub fn decoded_content(&self) -> Option<String> {
        let content = self.content.as_deref()?;
        let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(compact)
            .map_err(|e| {
                tracing::warn!("[git] Invalid base64 content for {}: {}", self.path, e);
                e
            })
            .ok()?;
        Some(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FetchOptions {
    /// Serve from (and populate) the session cache.
    pub cached: bool,
}

impl FetchOptions {
    pub fn cached() -> Self {
        Self { cached: true }
    }
}

/// Outcome of a successful commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitResult {
    pub success: bool,
    pub commit_sha: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryInfo {
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub provider: RepositoryProvider,
}

/// Everything a provider needs to talk to its remote.
#[derive(Debug, Clone)]
pub struct RepositoryConfig {
    pub provider: RepositoryProvider,
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub root_dir: String,
    pub token: Option<String>,
    pub instance_url: Option<String>,
    pub author_name: String,
    pub author_email: String,
    pub request_timeout: Duration,
}

impl RepositoryConfig {
    pub fn from_settings(settings: &StudioSettings) -> Self {
        let repository = &settings.repository;
        Self {
            provider: repository.provider,
            owner: repository.owner.clone(),
            repo: repository.repo.clone(),
            branch: repository.branch.clone(),
            root_dir: repository.root_dir.clone(),
            token: resolve_token(settings),
            instance_url: repository.instance_url.clone(),
            author_name: settings.author.name.clone(),
            author_email: settings.author.email.clone(),
            request_timeout: Duration::from_secs(settings.advanced.request_timeout_secs),
        }
    }

    pub fn info(&self) -> RepositoryInfo {
        RepositoryInfo {
            owner: self.owner.clone(),
            repo: self.repo.clone(),
            branch: self.branch.clone(),
            provider: self.provider,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote(content: Option<&str>) -> RemoteFile {
        RemoteFile {
            name: "a.md".to_string(),
            path: "content/a.md".to_string(),
            sha: "abc".to_string(),
            size: 5,
            url: None,
            content: content.map(str::to_string),
            encoding: "base64".to_string(),
            provider: RepositoryProvider::GitHub,
        }
    }

    #[test]
    fn test_decoded_content_ignores_line_breaks() {
        // GitHub wraps base64 payloads at 60 columns
        assert_eq!(
            remote(Some("SGVs\nbG8=\n")).decoded_content(),
            Some("Hello".to_string())
        );
    }

    #[test]
    fn test_decoded_content_invalid() {
        assert_eq!(remote(Some("***")).decoded_content(), None);
        assert_eq!(remote(None).decoded_content(), None);
    }

    #[test]
    fn test_provider_from_str() {
        assert_eq!(
            "GitLab".parse::<RepositoryProvider>().unwrap(),
            RepositoryProvider::GitLab
        );
        assert!("bitbucket".parse::<RepositoryProvider>().is_err());
    }

    #[test]
    fn test_config_from_settings() {
        let mut settings = StudioSettings::default();
        settings.repository.owner = "acme".to_string();
        settings.repository.repo = "docs".to_string();
        settings.repository.token = Some("glpat-abc".to_string());
        settings.repository.provider = RepositoryProvider::GitLab;

        let config = RepositoryConfig::from_settings(&settings);
        assert_eq!(config.token.as_deref(), Some("glpat-abc"));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.info().provider, RepositoryProvider::GitLab);
    }
}
