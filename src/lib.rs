#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![warn(clippy::all)]

//! codereview-service - LLM code reviews of GitHub repositories
//!
//! A request names a repository and a candidate level. The service lists the
//! repository tree, downloads every file, sends both artifacts to a chat
//! completion API with a fixed review prompt, and caches the answer for a
//! short time so repeated requests are served without upstream calls.
//!
//! ## Usage
//! ```rust,ignore
//! use codereview_service::{Config, MemoryCache, ReviewService, ReviewRequest, CandidateLevel};
//! use std::sync::Arc;
//!
//! async fn example() -> codereview_service::Result<()> {
//!     let config = Config::load(None)?;
//!     let service = ReviewService::from_config(&config, Arc::new(MemoryCache::new()))?;
//!     let result = service
//!         .review(&ReviewRequest {
//!             assignment_description: "Todo list API".into(),
//!             github_repo_url: "https://github.com/owner/repo".into(),
//!             candidate_level: CandidateLevel::Junior,
//!         })
//!         .await?;
//!     println!("{}", result.message);
//!     Ok(())
//! }
//! ```

/// Repository Aggregator: tree plus per-file contents into two text artifacts
pub mod aggregator;
/// HTTP routes, API-key middleware and error rendering
pub mod api;
/// Cache key derivation and cache back-ends
pub mod cache;
/// Configuration module for the application
pub mod config;
/// Error handling types and utilities
pub mod error;
/// GitHub tree and content fetching
pub mod github;
/// Logging configuration
pub mod logging;
/// Request and response types
pub mod models;
/// Prompt text sent to the completion API
pub mod prompts;
/// Review Requester backed by a chat completion API
pub mod reviewer;
/// Review orchestration
pub mod service;
/// Per-key deduplication of in-flight requests
pub mod singleflight;

// Re-export common types
pub use aggregator::RepositoryAggregator;
pub use cache::{cache_key, MemoryCache, RedisCache, ReviewCache};
pub use config::Config;
pub use error::{Result, ReviewError};
pub use github::{GitHubClient, RepositoryReference, RepositorySource, TreeEntry};
pub use models::{CandidateLevel, RepositorySnapshot, ReviewRequest, ReviewResult};
pub use reviewer::{OpenAIReviewer, ReviewModel};
pub use service::ReviewService;
