use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Skill tier the review is tailored to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CandidateLevel {
    /// Entry-level developer
    Junior,
    /// Mid-level developer
    Middle,
    /// Senior developer
    Senior,
}

impl CandidateLevel {
    /// Name as it appears on the wire and in the prompt
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Junior => "Junior",
            Self::Middle => "Middle",
            Self::Senior => "Senior",
        }
    }
}

impl fmt::Display for CandidateLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CandidateLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Junior" => Ok(Self::Junior),
            "Middle" => Ok(Self::Middle),
            "Senior" => Ok(Self::Senior),
            other => Err(format!(
                "unknown candidate level '{}', expected Junior, Middle or Senior",
                other
            )),
        }
    }
}

/// Request payload for a code review
///
/// This is also the unit the cache key is derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRequest {
    /// What the candidate was asked to build
    pub assignment_description: String,
    /// Repository to review, e.g. `https://github.com/owner/name`
    pub github_repo_url: String,
    /// Skill tier the review is written for
    pub candidate_level: CandidateLevel,
}

/// Completed review returned to the caller and stored in the cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewResult {
    /// Review text produced by the completion API
    pub message: String,
    /// Echo of the request that produced this review
    pub repository: ReviewRequest,
}

/// The two text artifacts assembled from a repository
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositorySnapshot {
    /// Newline-joined blob paths in tree order
    pub file_list: String,
    /// Newline-joined `Content of {path}:\n{content}` blocks in tree order
    pub file_contents: String,
}
