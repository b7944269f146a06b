use crate::error::{ReviewError, Result};
use std::fmt;
use std::str::FromStr;

/// Secrets the service cannot start without
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Key callers must present
    pub api_key: String,
    /// Header the key is read from
    pub api_key_header: String,
    /// GitHub token used for repository reads
    pub github_token: String,
    /// Completion API key
    pub openai_key: String,
}

impl Credentials {
    /// Reads `API_KEY`, `API_KEY_NAME`, `API_TOKEN_GITHUB` and `OPENAI_KEY`
    pub fn from_lookup<F>(lookup: &F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            api_key: required(lookup, "API_KEY")?,
            api_key_header: required(lookup, "API_KEY_NAME")?,
            github_token: required(lookup, "API_TOKEN_GITHUB")?,
            openai_key: required(lookup, "OPENAI_KEY")?,
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .field("api_key_header", &self.api_key_header)
            .field("github_token", &"<redacted>")
            .field("openai_key", &"<redacted>")
            .finish()
    }
}

/// Reads a process environment variable, treating empty values as unset
pub fn get_env_value(key: &str) -> Option<String> {
    let value = std::env::var(key).ok()?;
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

fn required<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ReviewError::Config(format!("{} environment variable not set", key)))
}

pub(super) fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|e| ReviewError::Config(format!("Invalid value for {}: {}", key, e)))
        })
        .transpose()
}
