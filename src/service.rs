//! Request orchestration: cache check, repository aggregation, review, cache write.

use crate::aggregator::RepositoryAggregator;
use crate::cache::{cache_key, ReviewCache, DEFAULT_TTL};
use crate::config::Config;
use crate::error::Result;
use crate::github::GitHubClient;
use crate::models::{ReviewRequest, ReviewResult};
use crate::reviewer::{OpenAIReviewer, ReviewModel};
use crate::singleflight::KeyedLocks;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Produces reviews, reusing cached results for identical requests
#[derive(Clone)]
pub struct ReviewService {
    aggregator: RepositoryAggregator,
    reviewer: Arc<dyn ReviewModel>,
    cache: Arc<dyn ReviewCache>,
    ttl: Duration,
    in_flight: Option<KeyedLocks>,
}

impl ReviewService {
    /// Creates a service with the default cache TTL and no in-flight deduplication
    pub fn new(
        aggregator: RepositoryAggregator,
        reviewer: Arc<dyn ReviewModel>,
        cache: Arc<dyn ReviewCache>,
    ) -> Self {
        Self {
            aggregator,
            reviewer,
            cache,
            ttl: DEFAULT_TTL,
            in_flight: None,
        }
    }

    /// Wires the GitHub client and completion reviewer described by `config`
    pub fn from_config(config: &Config, cache: Arc<dyn ReviewCache>) -> Result<Self> {
        let settings = &config.settings;
        let github = GitHubClient::new(
            config.credentials.github_token.as_str(),
            &settings.github_api_base,
            settings.limits,
            settings.http_timeout(),
        )?;
        let aggregator = RepositoryAggregator::new(Arc::new(github), settings.branch.as_str())
            .with_max_concurrent(settings.max_concurrent_fetches);
        let reviewer = OpenAIReviewer::new(
            &config.credentials.openai_key,
            settings.openai_api_base.as_deref(),
            settings.model.as_str(),
        );

        Ok(Self::new(aggregator, Arc::new(reviewer), cache)
            .with_ttl(settings.cache_ttl())
            .with_deduplication(settings.dedupe_in_flight))
    }

    /// Sets how long computed reviews stay cached
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// When enabled, concurrent identical requests wait for the first one and
    /// then read its cached result instead of repeating the work
    pub fn with_deduplication(mut self, enabled: bool) -> Self {
        self.in_flight = enabled.then(KeyedLocks::new);
        self
    }

    /// Returns the review for `request`, from the cache when possible
    pub async fn review(&self, request: &ReviewRequest) -> Result<ReviewResult> {
        let key = cache_key(request)?;
        if let Some(cached) = self.cached(&key).await? {
            info!(repository = %request.github_repo_url, "Serving cached review");
            return Ok(cached);
        }

        let _guard = match self.in_flight.clone() {
            Some(locks) => {
                let guard = locks.lock(key.clone()).await;
                if let Some(cached) = self.cached(&key).await? {
                    info!(repository = %request.github_repo_url, "Serving review computed by a concurrent request");
                    return Ok(cached);
                }
                Some(guard)
            }
            None => None,
        };

        info!(
            repository = %request.github_repo_url,
            level = %request.candidate_level,
            "Cache miss, building review"
        );
        let snapshot = self.aggregator.aggregate_url(&request.github_repo_url).await?;
        let message = self.reviewer.review(&snapshot, request.candidate_level).await?;

        let result = ReviewResult {
            message,
            repository: request.clone(),
        };
        self.cache
            .store(&key, &serde_json::to_string(&result)?, self.ttl)
            .await?;

        info!(repository = %request.github_repo_url, "Review completed");
        Ok(result)
    }

    async fn cached(&self, key: &str) -> Result<Option<ReviewResult>> {
        let Some(raw) = self.cache.lookup(key).await? else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(result) => Ok(Some(result)),
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable cache entry");
                Ok(None)
            }
        }
    }
}
