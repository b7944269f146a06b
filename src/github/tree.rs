use crate::error::{ReviewError, Result};
use serde::{Deserialize, Serialize};

/// Default maximum number of tree entries
pub const DEFAULT_MAX_ENTRIES: usize = 100_000;
/// Default maximum cumulative blob size (7 MiB)
pub const DEFAULT_MAX_TOTAL_BYTES: u64 = 7 * 1024 * 1024;

/// Kind of a tree entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Regular file
    Blob,
    /// Directory
    Tree,
    /// Anything else GitHub reports (submodule commits, ...)
    #[serde(other)]
    Other,
}

/// One path in a recursive tree listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    /// Path relative to the repository root
    pub path: String,
    /// Entry kind
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// Size in bytes, present for blobs
    #[serde(default)]
    pub size: Option<u64>,
}

impl TreeEntry {
    /// Creates a blob entry
    pub fn blob(path: impl Into<String>, size: u64) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::Blob,
            size: Some(size),
        }
    }

    /// Creates a directory entry
    pub fn tree(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::Tree,
            size: None,
        }
    }

    /// Whether this entry is a regular file
    pub fn is_blob(&self) -> bool {
        self.kind == EntryKind::Blob
    }
}

/// Body of `GET /repos/{owner}/{name}/git/trees/{branch}`
#[derive(Debug, Deserialize)]
pub(crate) struct TreeResponse {
    #[serde(default)]
    pub tree: Vec<TreeEntry>,
    #[serde(default)]
    pub truncated: bool,
}

/// Size guards applied to a tree before any content is fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchLimits {
    /// Maximum number of entries of any kind
    pub max_entries: usize,
    /// Maximum sum of blob sizes in bytes
    pub max_total_bytes: u64,
}

impl Default for FetchLimits {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            max_total_bytes: DEFAULT_MAX_TOTAL_BYTES,
        }
    }
}

impl FetchLimits {
    /// Rejects trees over either limit; both limits are inclusive
    pub fn check(&self, entries: &[TreeEntry]) -> Result<()> {
        if entries.len() > self.max_entries {
            return Err(ReviewError::TooManyEntries {
                limit: self.max_entries,
            });
        }

        let total: u64 = entries
            .iter()
            .filter(|entry| entry.is_blob())
            .map(|entry| entry.size.unwrap_or(0))
            .sum();
        if total > self.max_total_bytes {
            return Err(ReviewError::RepositoryTooLarge {
                limit_bytes: self.max_total_bytes,
            });
        }

        Ok(())
    }
}
