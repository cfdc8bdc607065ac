//! GitHub provider.
//!
//! Reads go through the contents API. A commit is assembled with the git
//! data API: resolve the branch ref, read its tree, upload binary blobs,
//! create a tree on top of the base tree, create the commit and move the ref.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::types::{
    CommitResult, FetchOptions, RemoteFile, RepositoryConfig, RepositoryInfo, RepositoryProvider,
};
use super::{
    build_http_client, ensure_success, join_path, prepare_files, trim_base, FileCache,
    RepositoryClient,
};
use crate::error::{Result, StudioError};
use crate::models::{DraftStatus, FileEncoding, ItemKind, RawFile};

const API_BASE: &str = "https://api.github.com";
const WEB_BASE: &str = "https://github.com";

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    name: String,
    path: String,
    sha: String,
    size: u64,
    #[serde(default)]
    html_url: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RefResponse {
    object: ShaObject,
}

#[derive(Debug, Deserialize)]
struct ShaObject {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct CommitResponse {
    sha: String,
    tree: ShaObject,
}

/// Content of one tree entry in a commit.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TreeEntryContent {
    /// Text inlined into the tree request.
    Inline(String),
    /// Previously uploaded blob.
    Blob(String),
    /// Removal of the path.
    Delete,
}

/// One entry of the `POST git/trees` payload. Deletions carry `sha: null`.
pub(crate) fn tree_entry(path: &str, content: &TreeEntryContent) -> Value {
    match content {
        TreeEntryContent::Inline(text) => json!({
            "path": path,
            "mode": "100644",
            "type": "blob",
            "content": text,
        }),
        TreeEntryContent::Blob(sha) => json!({
            "path": path,
            "mode": "100644",
            "type": "blob",
            "sha": sha,
        }),
        TreeEntryContent::Delete => json!({
            "path": path,
            "mode": "100644",
            "type": "blob",
            "sha": Value::Null,
        }),
    }
}

pub struct GitHubProvider {
    config: RepositoryConfig,
    http: reqwest::Client,
    api_base: String,
    web_base: String,
    cache: FileCache,
}

impl GitHubProvider {
    pub fn new(config: RepositoryConfig) -> Result<Self> {
        let http = build_http_client(&config)?;
        let web_base = config
            .instance_url
            .as_deref()
            .map(trim_base)
            .unwrap_or_else(|| WEB_BASE.to_string());
        let api_base = match config.instance_url.as_deref() {
            Some(instance) => format!("{}/api/v3", trim_base(instance)),
            None => API_BASE.to_string(),
        };

        Ok(Self {
            config,
            http,
            api_base,
            web_base,
            cache: FileCache::new(),
        })
    }

    fn repo_api(&self, suffix: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.api_base, self.config.owner, self.config.repo, suffix
        )
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        let builder = self
            .http
            .request(method, url)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28");

        match &self.config.token {
            Some(token) => builder.header("Authorization", format!("Bearer {}", token)),
            None => builder,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self.request(reqwest::Method::GET, url).send().await?;
        Ok(ensure_success(response).await?.json().await?)
    }

    async fn send_json<T: serde::de::DeserializeOwned>(
        &self,
        method: reqwest::Method,
        url: &str,
        body: &Value,
    ) -> Result<T> {
        let response = self.request(method, url).json(body).send().await?;
        Ok(ensure_success(response).await?.json().await?)
    }

    async fn fetch_remote(&self, path: &str) -> Result<Option<RemoteFile>> {
        let mut url = url::Url::parse(&self.repo_api("contents"))
            .map_err(|e| StudioError::Config(format!("Invalid GitHub API URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| StudioError::Config("GitHub API URL cannot be a base".to_string()))?
            .extend(path.split('/'));
        url.query_pairs_mut().append_pair("ref", &self.config.branch);

        let response = self
            .request(reqwest::Method::GET, url.as_str())
            .send()
            .await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let body: ContentsResponse = ensure_success(response).await?.json().await?;
        Ok(Some(RemoteFile {
            name: body.name,
            path: body.path,
            sha: body.sha,
            size: body.size,
            url: body.html_url,
            content: body.content,
            encoding: body.encoding.unwrap_or_else(|| "base64".to_string()),
            provider: RepositoryProvider::GitHub,
        }))
    }

    async fn create_blob(&self, content: &str) -> Result<String> {
        let body = json!({ "content": content, "encoding": "base64" });
        let blob: ShaObject = self
            .send_json(reqwest::Method::POST, &self.repo_api("git/blobs"), &body)
            .await?;
        Ok(blob.sha)
    }

    async fn commit(&self, files: &[RawFile], message: &str) -> Result<CommitResult> {
        let branch = &self.config.branch;

        let head: RefResponse = self
            .get_json(&self.repo_api(&format!("git/ref/heads/{}", branch)))
            .await?;
        let base: CommitResponse = self
            .get_json(&self.repo_api(&format!("git/commits/{}", head.object.sha)))
            .await?;

        let mut entries = Vec::with_capacity(files.len());
        for file in files {
            let content = match (&file.status, &file.content, file.encoding) {
                (DraftStatus::Deleted, _, _) | (_, None, _) => TreeEntryContent::Delete,
                (_, Some(content), FileEncoding::Base64) => {
                    TreeEntryContent::Blob(self.create_blob(content).await?)
                }
                (_, Some(content), FileEncoding::Utf8) => TreeEntryContent::Inline(content.clone()),
            };
            entries.push(tree_entry(&file.path, &content));
        }

        let tree: ShaObject = self
            .send_json(
                reqwest::Method::POST,
                &self.repo_api("git/trees"),
                &json!({ "base_tree": base.tree.sha, "tree": entries }),
            )
            .await?;

        let commit_body = json!({
            "message": message,
            "tree": tree.sha,
            "parents": [base.sha],
            "author": {
                "name": self.config.author_name,
                "email": self.config.author_email,
            },
        });
        let commit: ShaObject = self
            .send_json(
                reqwest::Method::POST,
                &self.repo_api("git/commits"),
                &commit_body,
            )
            .await?;

        let _: Value = self
            .send_json(
                reqwest::Method::PATCH,
                &self.repo_api(&format!("git/refs/heads/{}", branch)),
                &json!({ "sha": commit.sha }),
            )
            .await?;

        Ok(CommitResult {
            success: true,
            url: self.commit_url(&commit.sha),
            commit_sha: commit.sha,
        })
    }
}

#[async_trait]
impl RepositoryClient for GitHubProvider {
    async fn fetch_file(&self, path: &str, options: FetchOptions) -> Option<RemoteFile> {
        let path = join_path(&[&self.config.root_dir, path]);

        if options.cached {
            if let Some(file) = self.cache.get(&path) {
                return Some(file);
            }
        }

        match self.fetch_remote(&path).await {
            Ok(Some(file)) => {
                if options.cached {
                    self.cache.insert(&path, file.clone());
                }
                Some(file)
            }
            Ok(None) => {
                tracing::debug!("[git] File not found on GitHub: {}", path);
                None
            }
            Err(e) => {
                tracing::error!("[git] Failed to fetch file from GitHub: {}: {}", path, e);
                None
            }
        }
    }

    async fn commit_files(
        &self,
        files: &[RawFile],
        message: &str,
    ) -> Result<Option<CommitResult>> {
        if self.config.token.is_none() {
            tracing::warn!("[git] Commit skipped: no GitHub token configured");
            return Ok(None);
        }

        let files = prepare_files(files, &self.config.root_dir);
        if files.is_empty() {
            tracing::info!("[git] Nothing to commit");
            return Ok(None);
        }

        tracing::info!(
            "[git] Committing {} file(s) to {}/{}@{}",
            files.len(),
            self.config.owner,
            self.config.repo,
            self.config.branch
        );
        let result = self.commit(&files, message).await?;
        tracing::info!("[git] Created commit {}", result.commit_sha);
        Ok(Some(result))
    }

    fn repository_url(&self) -> String {
        format!("{}/{}/{}", self.web_base, self.config.owner, self.config.repo)
    }

    fn branch_url(&self) -> String {
        format!("{}/tree/{}", self.repository_url(), self.config.branch)
    }

    fn commit_url(&self, sha: &str) -> String {
        format!("{}/commit/{}", self.repository_url(), sha)
    }

    fn file_url(&self, kind: ItemKind, fs_path: &str) -> String {
        let full_path = join_path(&[&self.config.root_dir, kind.remote_dir(), fs_path]);
        format!(
            "{}/blob/{}/{}",
            self.repository_url(),
            self.config.branch,
            full_path
        )
    }

    fn repository_info(&self) -> RepositoryInfo {
        self.config.info()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{closed_port_url, config, direct_client, StubServer};

    fn provider() -> GitHubProvider {
        GitHubProvider::new(config(RepositoryProvider::GitHub)).unwrap()
    }

    #[test]
    fn test_urls() {
        let github = provider();
        assert_eq!(github.repository_url(), "https://github.com/acme/docs");
        assert_eq!(github.branch_url(), "https://github.com/acme/docs/tree/main");
        assert_eq!(
            github.commit_url("abc123"),
            "https://github.com/acme/docs/commit/abc123"
        );
        assert_eq!(
            github.file_url(ItemKind::Document, "1.guide/intro.md"),
            "https://github.com/acme/docs/blob/main/website/content/1.guide/intro.md"
        );
        assert_eq!(
            github.file_url(ItemKind::Media, "logo.png"),
            "https://github.com/acme/docs/blob/main/website/public/logo.png"
        );
    }

    #[test]
    fn test_enterprise_instance_urls() {
        let mut cfg = config(RepositoryProvider::GitHub);
        cfg.instance_url = Some("https://git.example.com/".to_string());
        let github = GitHubProvider::new(cfg).unwrap();

        assert_eq!(github.repository_url(), "https://git.example.com/acme/docs");
        assert_eq!(
            github.repo_api("git/trees"),
            "https://git.example.com/api/v3/repos/acme/docs/git/trees"
        );
    }

    #[test]
    fn test_tree_entries() {
        assert_eq!(
            tree_entry("content/a.md", &TreeEntryContent::Inline("# A".to_string())),
            json!({ "path": "content/a.md", "mode": "100644", "type": "blob", "content": "# A" })
        );
        assert_eq!(
            tree_entry("public/a.png", &TreeEntryContent::Blob("sha1".to_string())),
            json!({ "path": "public/a.png", "mode": "100644", "type": "blob", "sha": "sha1" })
        );

        let deleted = tree_entry("content/b.md", &TreeEntryContent::Delete);
        assert!(deleted["sha"].is_null());
        assert!(deleted.get("content").is_none());
    }

    #[tokio::test]
    async fn test_commit_without_token_is_skipped() {
        let mut cfg = config(RepositoryProvider::GitHub);
        cfg.token = None;
        let github = GitHubProvider::new(cfg).unwrap();

        let files = vec![RawFile {
            path: "content/a.md".to_string(),
            content: Some("# A".to_string()),
            status: DraftStatus::Created,
            encoding: FileEncoding::Utf8,
        }];
        assert!(github.commit_files(&files, "msg").await.unwrap().is_none());
    }

    fn local_provider(instance_url: &str) -> GitHubProvider {
        let mut cfg = config(RepositoryProvider::GitHub);
        cfg.instance_url = Some(instance_url.to_string());
        let mut github = GitHubProvider::new(cfg).unwrap();
        github.http = direct_client();
        github
    }

    fn contents_body() -> String {
        json!({
            "name": "a.md",
            "path": "website/content/a.md",
            "sha": "sha-a",
            "size": 4,
            "html_url": "https://github.com/acme/docs/blob/main/website/content/a.md",
            "content": "IyBB\nCg==\n",
            "encoding": "base64"
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_fetch_file_not_found_and_cache() {
        let server = StubServer::start(vec![
            (404, r#"{"message":"Not Found"}"#.to_string()),
            (200, contents_body()),
            (200, contents_body()),
        ])
        .await;
        let github = local_provider(&server.url);

        assert!(github
            .fetch_file("content/missing.md", FetchOptions::default())
            .await
            .is_none());
        assert_eq!(
            server.requests()[0],
            "GET /api/v3/repos/acme/docs/contents/website/content/missing.md?ref=main HTTP/1.1"
        );

        // uncached reads leave the cache alone
        let file = github
            .fetch_file("content/a.md", FetchOptions::default())
            .await
            .unwrap();
        assert_eq!(file.decoded_content().as_deref(), Some("# A\n"));
        assert!(github.cache.is_empty());

        let file = github
            .fetch_file("content/a.md", FetchOptions::cached())
            .await
            .unwrap();
        assert_eq!(file.sha, "sha-a");
        assert_eq!(github.cache.len(), 1);
        assert_eq!(server.hits(), 3);

        let cached = github
            .fetch_file("content/a.md", FetchOptions::cached())
            .await
            .unwrap();
        assert_eq!(cached, file);
        assert_eq!(server.hits(), 3);
    }

    #[tokio::test]
    async fn test_fetch_file_swallows_failures() {
        let server = StubServer::start(vec![(500, r#"{"message":"boom"}"#.to_string())]).await;
        let github = local_provider(&server.url);
        assert!(github
            .fetch_file("content/a.md", FetchOptions::cached())
            .await
            .is_none());
        assert!(github.cache.is_empty());

        let unreachable = local_provider(&closed_port_url().await);
        assert!(unreachable
            .fetch_file("content/a.md", FetchOptions::default())
            .await
            .is_none());
    }

    #[test]
    fn test_repository_info() {
        let info = provider().repository_info();
        assert_eq!(info.owner, "acme");
        assert_eq!(info.branch, "main");
        assert_eq!(info.provider, RepositoryProvider::GitHub);
    }
}
