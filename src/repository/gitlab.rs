//! GitLab provider.
//!
//! Reads use `/projects/:id/repository/files/:path?ref=<branch>`. Commits are a
//! single `/repository/commits` call carrying one action per file.

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

const DEFAULT_INSTANCE: &str = "https://gitlab.com";

#[derive(Debug, Deserialize)]
struct FileResponse {
    blob_id: String,
    size: u64,
    file_path: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommitResponse {
    id: String,
}

/// Header used to authenticate `token`.
///
/// Personal access tokens (`glpat-` prefix) go in `PRIVATE-TOKEN`, OAuth
/// tokens in a bearer `Authorization` header.
pub(crate) fn auth_header(token: &str) -> (&'static str, String) {
    if token.starts_with("glpat-") {
        ("PRIVATE-TOKEN", token.to_string())
    } else {
        ("Authorization", format!("Bearer {}", token))
    }
}

/// Commit action for one file.
pub(crate) fn commit_action(file: &RawFile) -> Value {
    let action = match file.status {
        DraftStatus::Deleted => {
            return json!({ "action": "delete", "file_path": file.path });
        }
        DraftStatus::Created => "create",
        _ => "update",
    };

    let encoding = match file.encoding {
        FileEncoding::Base64 => "base64",
        FileEncoding::Utf8 => "text",
    };

    json!({
        "action": action,
        "file_path": file.path,
        "content": file.content,
        "encoding": encoding,
    })
}

pub struct GitLabProvider {
    config: RepositoryConfig,
    http: reqwest::Client,
    instance_url: String,
    cache: FileCache,
}

impl GitLabProvider {
    pub fn new(config: RepositoryConfig) -> Result<Self> {
        let http = build_http_client(&config)?;
        let instance_url = trim_base(config.instance_url.as_deref().unwrap_or(DEFAULT_INSTANCE));

        Ok(Self {
            config,
            http,
            instance_url,
            cache: FileCache::new(),
        })
    }

    /// `<instance>/api/v4/projects/<owner%2Frepo>/<segments...>`
    fn project_api(&self, segments: &[&str]) -> Result<url::Url> {
        let mut url = url::Url::parse(&format!("{}/api/v4/projects", self.instance_url))
            .map_err(|e| StudioError::Config(format!("Invalid GitLab instance URL: {}", e)))?;
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| StudioError::Config("GitLab URL cannot be a base".to_string()))?;
            // owner/repo is a single, encoded segment
            path.push(&format!("{}/{}", self.config.owner, self.config.repo));
            path.extend(segments);
        }
        Ok(url)
    }

    fn request(&self, method: reqwest::Method, url: url::Url) -> reqwest::RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.config.token {
            Some(token) => {
                let (name, value) = auth_header(token);
                builder.header(name, value)
            }
            None => builder,
        }
    }

    fn web_url(&self) -> String {
        format!(
            "{}/{}/{}",
            self.instance_url, self.config.owner, self.config.repo
        )
    }

    async fn fetch_remote(&self, path: &str) -> Result<Option<RemoteFile>> {
        // the file path is a single, encoded segment
        let mut url = self.project_api(&["repository", "files", path])?;
        url.query_pairs_mut().append_pair("ref", &self.config.branch);

        let response = self.request(reqwest::Method::GET, url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let body: FileResponse = ensure_success(response).await?.json().await?;
        Ok(Some(RemoteFile {
            name: path.rsplit('/').next().unwrap_or(path).to_string(),
            path: path.to_string(),
            sha: body.blob_id,
            size: body.size,
            url: Some(format!(
                "{}/-/blob/{}/{}",
                self.web_url(),
                self.config.branch,
                body.file_path
            )),
            content: body.content,
            encoding: "base64".to_string(),
            provider: RepositoryProvider::GitLab,
        }))
    }

    async fn commit(&self, files: &[RawFile], message: &str) -> Result<CommitResult> {
        let actions: Vec<Value> = files.iter().map(commit_action).collect();
        let body = json!({
            "branch": self.config.branch,
            "commit_message": message,
            "actions": actions,
            "author_name": self.config.author_name,
            "author_email": self.config.author_email,
        });

        let url = self.project_api(&["repository", "commits"])?;
        let response = self
            .request(reqwest::Method::POST, url)
            .json(&body)
            .send()
            .await?;
        let commit: CommitResponse = ensure_success(response).await?.json().await?;

        Ok(CommitResult {
            success: true,
            url: self.commit_url(&commit.id),
            commit_sha: commit.id,
        })
    }
}

#[async_trait]
impl RepositoryClient for GitLabProvider {
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
                tracing::warn!("[git] File not found on GitLab: {}", path);
                None
            }
            Err(e) => {
                tracing::error!("[git] Failed to fetch file from GitLab: {}: {}", path, e);
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
            tracing::warn!("[git] Commit skipped: no GitLab token configured");
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
        self.web_url()
    }

    fn branch_url(&self) -> String {
        format!("{}/-/tree/{}", self.web_url(), self.config.branch)
    }

    fn commit_url(&self, sha: &str) -> String {
        format!("{}/-/commit/{}", self.web_url(), sha)
    }

    fn file_url(&self, kind: ItemKind, fs_path: &str) -> String {
        let full_path = join_path(&[&self.config.root_dir, kind.remote_dir(), fs_path]);
        format!(
            "{}/-/blob/{}/{}",
            self.web_url(),
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

    fn provider() -> GitLabProvider {
        GitLabProvider::new(config(RepositoryProvider::GitLab)).unwrap()
    }

    fn raw(path: &str, content: Option<&str>, status: DraftStatus, encoding: FileEncoding) -> RawFile {
        RawFile {
            path: path.to_string(),
            content: content.map(str::to_string),
            status,
            encoding,
        }
    }

    #[test]
    fn test_auth_header() {
        assert_eq!(
            auth_header("glpat-123"),
            ("PRIVATE-TOKEN", "glpat-123".to_string())
        );
        assert_eq!(
            auth_header("oauth-abc"),
            ("Authorization", "Bearer oauth-abc".to_string())
        );
    }

    #[test]
    fn test_commit_actions() {
        let created = commit_action(&raw(
            "content/a.md",
            Some("# A"),
            DraftStatus::Created,
            FileEncoding::Utf8,
        ));
        assert_eq!(
            created,
            json!({ "action": "create", "file_path": "content/a.md", "content": "# A", "encoding": "text" })
        );

        let updated = commit_action(&raw(
            "public/logo.png",
            Some("AAAA"),
            DraftStatus::Updated,
            FileEncoding::Base64,
        ));
        assert_eq!(updated["action"], "update");
        assert_eq!(updated["encoding"], "base64");

        let deleted = commit_action(&raw(
            "content/b.md",
            None,
            DraftStatus::Deleted,
            FileEncoding::Utf8,
        ));
        assert_eq!(deleted, json!({ "action": "delete", "file_path": "content/b.md" }));
    }

    #[test]
    fn test_urls() {
        let gitlab = provider();
        assert_eq!(gitlab.repository_url(), "https://gitlab.com/acme/docs");
        assert_eq!(gitlab.branch_url(), "https://gitlab.com/acme/docs/-/tree/main");
        assert_eq!(
            gitlab.commit_url("abc"),
            "https://gitlab.com/acme/docs/-/commit/abc"
        );
        assert_eq!(
            gitlab.file_url(ItemKind::Document, "guide/a.md"),
            "https://gitlab.com/acme/docs/-/blob/main/website/content/guide/a.md"
        );
    }

    #[test]
    fn test_project_api_encodes_segments() {
        let mut cfg = config(RepositoryProvider::GitLab);
        cfg.instance_url = Some("https://gitlab.example.com/".to_string());
        let gitlab = GitLabProvider::new(cfg).unwrap();

        let url = gitlab
            .project_api(&["repository", "files", "website/content/a b.md"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://gitlab.example.com/api/v4/projects/acme%2Fdocs/repository/files/website%2Fcontent%2Fa%20b.md"
        );
    }

    fn local_provider(instance_url: &str) -> GitLabProvider {
        let mut cfg = config(RepositoryProvider::GitLab);
        cfg.instance_url = Some(instance_url.to_string());
        let mut gitlab = GitLabProvider::new(cfg).unwrap();
        gitlab.http = direct_client();
        gitlab
    }

    #[tokio::test]
    async fn test_fetch_file_not_found_and_cache() {
        let body = json!({
            "blob_id": "blob-a",
            "size": 4,
            "file_path": "website/content/a.md",
            "content": "IyBBCg=="
        })
        .to_string();
        let server = StubServer::start(vec![
            (404, r#"{"message":"404 File Not Found"}"#.to_string()),
            (200, body),
        ])
        .await;
        let gitlab = local_provider(&server.url);

        assert!(gitlab
            .fetch_file("content/missing.md", FetchOptions::cached())
            .await
            .is_none());
        assert!(gitlab.cache.is_empty());
        assert_eq!(
            server.requests()[0],
            "GET /api/v4/projects/acme%2Fdocs/repository/files/website%2Fcontent%2Fmissing.md?ref=main HTTP/1.1"
        );

        let file = gitlab
            .fetch_file("content/a.md", FetchOptions::cached())
            .await
            .unwrap();
        assert_eq!(file.sha, "blob-a");
        assert_eq!(file.name, "a.md");
        assert_eq!(file.decoded_content().as_deref(), Some("# A\n"));
        assert_eq!(
            file.url,
            Some(format!("{}/acme/docs/-/blob/main/website/content/a.md", server.url))
        );

        let cached = gitlab
            .fetch_file("content/a.md", FetchOptions::cached())
            .await
            .unwrap();
        assert_eq!(cached, file);
        assert_eq!(server.hits(), 2);
    }

    #[tokio::test]
    async fn test_fetch_file_unreachable_instance() {
        let gitlab = local_provider(&closed_port_url().await);
        assert!(gitlab
            .fetch_file("content/a.md", FetchOptions::cached())
            .await
            .is_none());
        assert!(gitlab.cache.is_empty());
    }
}
