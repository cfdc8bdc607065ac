//! Remote repository access.
//!
//! A [`RepositoryClient`] reads single files from the configured branch head
//! and writes a batch of drafts as one commit. Two providers exist:
//! [`GitHubProvider`] and [`GitLabProvider`], selected from configuration by
//! [`create_provider`].

pub mod github;
pub mod gitlab;
pub mod types;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::{Result, StudioError};
use crate::models::{DraftStatus, ItemKind, RawFile};

pub use github::GitHubProvider;
pub use gitlab::GitLabProvider;
pub use types::{
    CommitResult, FetchOptions, RemoteFile, RepositoryConfig, RepositoryInfo, RepositoryProvider,
};

/// Read/write access to the remote content repository.
#[async_trait]
pub trait RepositoryClient: Send + Sync {
    /// Fetch a file at `path` (relative to the root dir) from the branch head.
    ///
    /// Missing files and transport failures both yield `None`; failures are
    /// logged.
    async fn fetch_file(&self, path: &str, options: FetchOptions) -> Option<RemoteFile>;

    /// Commit every non-pristine file in one commit.
    ///
    /// Returns `Ok(None)` when no write token is configured.
    async fn commit_files(&self, files: &[RawFile], message: &str)
        -> Result<Option<CommitResult>>;

    fn repository_url(&self) -> String;

    fn branch_url(&self) -> String;

    fn commit_url(&self, sha: &str) -> String;

    /// Web URL of an item file on the branch.
    fn file_url(&self, kind: ItemKind, fs_path: &str) -> String;

    fn repository_info(&self) -> RepositoryInfo;
}

/// Build the provider selected by `config.provider`.
pub fn create_provider(config: RepositoryConfig) -> Result<Arc<dyn RepositoryClient>> {
    if config.owner.is_empty() || config.repo.is_empty() {
        return Err(StudioError::Config(
            "repository.owner and repository.repo must be set".to_string(),
        ));
    }

    if config.token.is_none() {
        tracing::info!(
            "[git] No write token configured for {}/{}, commits are disabled",
            config.owner,
            config.repo
        );
    }

    let client: Arc<dyn RepositoryClient> = match config.provider {
        RepositoryProvider::GitHub => Arc::new(GitHubProvider::new(config)?),
        RepositoryProvider::GitLab => Arc::new(GitLabProvider::new(config)?),
    };
    Ok(client)
}

/// Session cache of fetched files, keyed by full repository path.
#[derive(Default)]
pub struct FileCache {
    files: RwLock<HashMap<String, RemoteFile>>,
}

impl FileCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Option<RemoteFile> {
        self.files.read().get(path).cloned()
    }

    pub fn insert(&self, path: &str, file: RemoteFile) {
        self.files.write().insert(path.to_string(), file);
    }

    pub fn len(&self) -> usize {
        self.files.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.read().is_empty()
    }
}

/// Join path fragments with single slashes, skipping empty ones.
pub fn join_path(parts: &[&str]) -> String {
    parts
        .iter()
        .flat_map(|p| p.split('/'))
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Drop pristine files and move the rest under `root_dir`.
pub(crate) fn prepare_files(files: &[RawFile], root_dir: &str) -> Vec<RawFile> {
    files
        .iter()
        .filter(|f| f.status != DraftStatus::Pristine)
        .map(|f| RawFile {
            path: join_path(&[root_dir, &f.path]),
            ..f.clone()
        })
        .collect()
}

/// Turn a non-success response into a [`StudioError::Repository`].
pub(crate) async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response.text().await.unwrap_or_default();
    Err(StudioError::Repository {
        status: status.as_u16(),
        message,
    })
}

pub(crate) fn build_http_client(config: &RepositoryConfig) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(config.request_timeout)
        .user_agent(concat!("studio/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// Base URL without trailing slashes.
pub(crate) fn trim_base(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FileEncoding;

    fn raw(path: &str, status: DraftStatus) -> RawFile {
        RawFile {
            path: path.to_string(),
            content: Some("x".to_string()),
            status,
            encoding: FileEncoding::Utf8,
        }
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path(&["", "content/a.md"]), "content/a.md");
        assert_eq!(join_path(&["/site/", "/content/", "a.md"]), "site/content/a.md");
    }

    #[test]
    fn test_prepare_files_drops_pristine() {
        let files = vec![
            raw("content/a.md", DraftStatus::Pristine),
            raw("content/b.md", DraftStatus::Updated),
        ];
        let prepared = prepare_files(&files, "website");
        assert_eq!(prepared.len(), 1);
        assert_eq!(prepared[0].path, "website/content/b.md");
    }

    #[test]
    fn test_file_cache() {
        let cache = FileCache::new();
        assert!(cache.get("a").is_none());

        cache.insert(
            "a",
            RemoteFile {
                name: "a".to_string(),
                path: "a".to_string(),
                sha: "1".to_string(),
                size: 0,
                url: None,
                content: None,
                encoding: "base64".to_string(),
                provider: RepositoryProvider::GitHub,
            },
        );
        assert_eq!(cache.get("a").map(|f| f.sha), Some("1".to_string()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_create_provider_requires_owner_and_repo() {
        let mut config = test_support::config(RepositoryProvider::GitHub);
        config.owner.clear();
        assert!(matches!(create_provider(config), Err(StudioError::Config(_))));

        let client = create_provider(test_support::config(RepositoryProvider::GitLab)).unwrap();
        assert_eq!(client.repository_info().provider, RepositoryProvider::GitLab);
    }
}
