use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Owner and name of a GitHub repository
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepositoryReference {
    /// User or organization that owns the repository
    pub owner: String,
    /// Repository name
    pub name: String,
}

impl RepositoryReference {
    /// Creates a reference from its parts
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Parses `scheme://host/owner/name[/...]`.
    ///
    /// Returns `None` when the URL does not parse or its path has fewer than
    /// two non-empty segments. Anything after the name (`/tree/main`, ...) is
    /// ignored and a trailing `.git` is dropped from the name.
    pub fn parse(url: &str) -> Option<Self> {
        let parsed = Url::parse(url.trim()).ok()?;
        let mut segments = parsed.path_segments()?;

        let owner = segments.next().filter(|s| !s.is_empty())?;
        let name = segments.next().filter(|s| !s.is_empty())?;
        let name = name.strip_suffix(".git").unwrap_or(name);
        if name.is_empty() {
            return None;
        }

        Some(Self::new(owner, name))
    }
}

impl fmt::Display for RepositoryReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}
