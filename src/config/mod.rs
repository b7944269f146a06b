mod env_manager;

use crate::aggregator::DEFAULT_BRANCH;
use crate::error::{ReviewError, Result};
use crate::github::{FetchLimits, GITHUB_API_BASE};
use crate::reviewer::DEFAULT_MODEL;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub use env_manager::{get_env_value, Credentials};
use env_manager::parse_var;

/// Main configuration: secrets plus service settings
#[derive(Debug, Clone)]
pub struct Config {
    /// Keys and tokens, all required
    pub credentials: Credentials,
    /// Tunables with defaults
    pub settings: Settings,
}

/// Service settings, read from an optional TOML file and overridden by env vars
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Address the HTTP server binds to
    pub bind_addr: String,
    /// Redis connection URL for the review cache
    pub redis_url: String,
    /// GitHub REST API base URL
    pub github_api_base: String,
    /// Completion API base URL; `None` uses the client default
    pub openai_api_base: Option<String>,
    /// Completion model name
    pub model: String,
    /// Branch whose tree is reviewed
    pub branch: String,
    /// Tree size guards
    pub limits: FetchLimits,
    /// Seconds a computed review stays cached
    pub cache_ttl_secs: u64,
    /// File fetches allowed in flight per repository
    pub max_concurrent_fetches: usize,
    /// Serialize concurrent identical requests
    pub dedupe_in_flight: bool,
    /// Per-request timeout for GitHub calls; `None` waits indefinitely
    pub http_timeout_secs: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8000".to_string(),
            redis_url: "redis://127.0.0.1:6379/0".to_string(),
            github_api_base: GITHUB_API_BASE.to_string(),
            openai_api_base: None,
            model: DEFAULT_MODEL.to_string(),
            branch: DEFAULT_BRANCH.to_string(),
            limits: FetchLimits::default(),
            cache_ttl_secs: 60,
            max_concurrent_fetches: 1,
            dedupe_in_flight: true,
            http_timeout_secs: None,
        }
    }
}

impl Settings {
    /// Parses settings from a TOML file; missing keys keep their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| ReviewError::Config(format!("Failed to read config file {}: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| ReviewError::Config(format!("Failed to parse config file {}: {}", path.display(), e)))
    }

    /// Applies environment overrides on top of the current values
    pub fn apply_env<F>(&mut self, lookup: &F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("BIND_ADDR") {
            self.bind_addr = value;
        }
        if let Some(value) = lookup("REDIS_URL") {
            self.redis_url = value;
        }
        if let Some(value) = lookup("GITHUB_API_BASE_URL") {
            self.github_api_base = value;
        }
        if let Some(value) = lookup("OPENAI_API_BASE") {
            self.openai_api_base = Some(value);
        }
        if let Some(value) = lookup("OPENAI_MODEL") {
            self.model = value;
        }
        if let Some(value) = lookup("GITHUB_BRANCH") {
            self.branch = value;
        }
        if let Some(value) = parse_var::<usize, _>(lookup, "MAX_TREE_ENTRIES")? {
            self.limits.max_entries = value;
        }
        if let Some(mb) = parse_var::<u64, _>(lookup, "MAX_REPO_SIZE_MB")? {
            self.limits.max_total_bytes = mb
                .checked_mul(1024 * 1024)
                .ok_or_else(|| ReviewError::Config(format!("MAX_REPO_SIZE_MB is too large: {}", mb)))?;
        }
        if let Some(value) = parse_var(lookup, "REVIEW_CACHE_TTL_SECS")? {
            self.cache_ttl_secs = value;
        }
        if let Some(value) = parse_var(lookup, "MAX_CONCURRENT_FETCHES")? {
            self.max_concurrent_fetches = value;
        }
        if let Some(value) = parse_var(lookup, "DEDUPE_IN_FLIGHT")? {
            self.dedupe_in_flight = value;
        }
        if let Some(value) = parse_var(lookup, "HTTP_TIMEOUT_SECS")? {
            self.http_timeout_secs = Some(value);
        }
        Ok(())
    }

    /// Cache lifetime as a duration
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// GitHub request timeout, if any
    pub fn http_timeout(&self) -> Option<Duration> {
        self.http_timeout_secs.map(Duration::from_secs)
    }
}

impl Config {
    /// Loads configuration from the process environment.
    ///
    /// Settings come from `config_file` when given, otherwise from the default
    /// config file location if it exists. Missing secrets are an error.
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let default_path = Self::default_config_path().filter(|path| path.exists());
        let file = config_file.or(default_path.as_deref());
        Self::from_lookup(get_env_value, file)
    }

    /// Builds the configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F, config_file: Option<&Path>) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = match config_file {
            Some(path) => Settings::from_file(path)?,
            None => Settings::default(),
        };
        settings.apply_env(&lookup)?;

        Ok(Self {
            credentials: Credentials::from_lookup(&lookup)?,
            settings,
        })
    }

    /// `<config dir>/codereview-service/config.toml`
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("codereview-service").join("config.toml"))
    }
}
