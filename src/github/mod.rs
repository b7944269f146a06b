//! GitHub REST access: recursive tree listing and per-file contents.

mod reference;
mod tree;

pub use reference::RepositoryReference;
pub use tree::{EntryKind, FetchLimits, TreeEntry, DEFAULT_MAX_ENTRIES, DEFAULT_MAX_TOTAL_BYTES};

use crate::error::{ReviewError, Result};
use async_trait::async_trait;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};
use tree::TreeResponse;
use url::Url;

/// Public GitHub API endpoint
pub const GITHUB_API_BASE: &str = "https://api.github.com";
const GITHUB_API_VERSION: &str = "2022-11-28";

/// Source of repository trees and file contents
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RepositorySource: Send + Sync {
    /// Lists every entry of `branch`, recursively, after applying size guards
    async fn fetch_tree(&self, repo: &RepositoryReference, branch: &str) -> Result<Vec<TreeEntry>>;

    /// Returns the decoded text of the file at `path`
    async fn fetch_file(&self, repo: &RepositoryReference, path: &str) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct ContentResponse {
    #[serde(default)]
    content: String,
}

/// Bearer-authenticated client for the GitHub REST API
#[derive(Clone)]
pub struct GitHubClient {
    client: Client,
    token: String,
    api_base: Url,
    limits: FetchLimits,
}

impl GitHubClient {
    /// Creates a client against `api_base`.
    ///
    /// `timeout` bounds each request; `None` leaves requests unbounded.
    pub fn new(
        token: impl Into<String>,
        api_base: &str,
        limits: FetchLimits,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let api_base = Url::parse(api_base)
            .map_err(|e| ReviewError::Config(format!("Invalid GitHub API base '{}': {}", api_base, e)))?;
        if api_base.cannot_be_a_base() {
            return Err(ReviewError::Config(format!(
                "GitHub API base cannot be used as a base URL: {}",
                api_base
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("x-github-api-version", HeaderValue::from_static(GITHUB_API_VERSION));

        let mut builder = Client::builder()
            .default_headers(headers)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            token: token.into(),
            api_base,
            limits,
        })
    }

    /// Size guards applied by [`GitHubClient::get_tree`]
    pub fn limits(&self) -> FetchLimits {
        self.limits
    }

    /// Retrieves the full recursive listing of `branch`.
    ///
    /// Fails with [`ReviewError::TooManyEntries`] or
    /// [`ReviewError::RepositoryTooLarge`] when the tree exceeds the limits.
    pub async fn get_tree(&self, repo: &RepositoryReference, branch: &str) -> Result<Vec<TreeEntry>> {
        let mut url = self.endpoint(
            ["repos", repo.owner.as_str(), repo.name.as_str(), "git", "trees"]
                .into_iter()
                .chain(branch.split('/')),
        );
        url.query_pairs_mut().append_pair("recursive", "1");

        let response: TreeResponse = self.get_json(url, "Failed to retrieve tree".to_string()).await?;
        if response.truncated {
            warn!(repository = %repo, branch, "GitHub truncated the tree listing");
        }

        self.limits.check(&response.tree)?;
        debug!(repository = %repo, entries = response.tree.len(), "Tree retrieved");
        Ok(response.tree)
    }

    /// Retrieves and decodes the content of a single file
    pub async fn get_file_content(&self, repo: &RepositoryReference, path: &str) -> Result<String> {
        let url = self.endpoint(
            ["repos", repo.owner.as_str(), repo.name.as_str(), "contents"]
                .into_iter()
                .chain(path.split('/')),
        );

        let response: ContentResponse = self
            .get_json(url, format!("Failed to retrieve file content for {}", path))
            .await?;
        decode_content(path, &response.content)
    }

    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Url {
        let mut url = self.api_base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, context: String) -> Result<T> {
        debug!(%url, "GitHub request");
        let response = self.client.get(url).bearer_auth(&self.token).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    debug!(error = %e, %status, "Failed to read GitHub error body");
                    String::new()
                }
            };
            return Err(ReviewError::GitHubApi {
                context,
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl RepositorySource for GitHubClient {
    async fn fetch_tree(&self, repo: &RepositoryReference, branch: &str) -> Result<Vec<TreeEntry>> {
        self.get_tree(repo, branch).await
    }

    async fn fetch_file(&self, repo: &RepositoryReference, path: &str) -> Result<String> {
        self.get_file_content(repo, path).await
    }
}

/// Decodes the base64 payload GitHub returns for file contents.
///
/// GitHub wraps the encoded text at 60 columns, so whitespace is dropped first.
pub fn decode_content(path: &str, encoded: &str) -> Result<String> {
    let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(compact)
        .map_err(|e| ReviewError::decode(path, e))?;
    String::from_utf8(bytes).map_err(|e| ReviewError::decode(path, e))
}
