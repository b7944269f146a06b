use crate::error::{ReviewError, Result};
use crate::github::{RepositoryReference, RepositorySource, TreeEntry};
use crate::models::RepositorySnapshot;
use futures::{stream, StreamExt, TryStreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

/// Branch reviewed when none is configured
pub const DEFAULT_BRANCH: &str = "main";

/// Turns a repository into the path listing and content dump sent for review
#[derive(Clone)]
pub struct RepositoryAggregator {
    source: Arc<dyn RepositorySource>,
    branch: String,
    max_concurrent: usize,
}

impl RepositoryAggregator {
    /// Creates an aggregator that fetches one file at a time from `branch`
    pub fn new(source: Arc<dyn RepositorySource>, branch: impl Into<String>) -> Self {
        Self {
            source,
            branch: branch.into(),
            max_concurrent: 1,
        }
    }

    /// Allows up to `max_concurrent` file fetches in flight; `0` is treated as `1`
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    /// Branch this aggregator reads
    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// Parses `url` and aggregates the repository it names
    pub async fn aggregate_url(&self, url: &str) -> Result<RepositorySnapshot> {
        let repo = RepositoryReference::parse(url)
            .ok_or_else(|| ReviewError::InvalidRepositoryUrl(url.to_string()))?;
        self.aggregate(&repo).await
    }

    /// Fetches the tree, then every blob in tree order.
    ///
    /// The first failure aborts the whole aggregation.
    pub async fn aggregate(&self, repo: &RepositoryReference) -> Result<RepositorySnapshot> {
        let tree = self.source.fetch_tree(repo, &self.branch).await?;
        let paths = blob_paths(tree)?;

        info!(
            repository = %repo,
            branch = %self.branch,
            files = paths.len(),
            "Fetching repository contents"
        );

        let source = Arc::clone(&self.source);
        let repo = repo.clone();
        let contents: Vec<String> = stream::iter(paths.clone())
            .map(move |path| {
                let source = Arc::clone(&source);
                let repo = repo.clone();
                async move {
                    debug!(path = %path, "Fetching file");
                    source.fetch_file(&repo, &path).await
                }
            })
            .buffered(self.max_concurrent)
            .try_collect()
            .await?;

        Ok(assemble(&paths, &contents))
    }
}

/// Blob paths in tree order; a path listed twice is an error
fn blob_paths(tree: Vec<TreeEntry>) -> Result<Vec<String>> {
    let mut seen = HashSet::with_capacity(tree.len());
    let mut paths = Vec::new();
    for entry in tree.into_iter().filter(TreeEntry::is_blob) {
        if !seen.insert(entry.path.clone()) {
            return Err(ReviewError::DuplicatePath(entry.path));
        }
        paths.push(entry.path);
    }
    Ok(paths)
}

fn assemble(paths: &[String], contents: &[String]) -> RepositorySnapshot {
    let file_contents = paths
        .iter()
        .zip(contents)
        .map(|(path, content)| format!("Content of {}:\n{}", path, content))
        .collect::<Vec<_>>()
        .join("\n");

    RepositorySnapshot {
        file_list: paths.join("\n"),
        file_contents,
    }
}
