use crate::error::Result;
use crate::models::ReviewRequest;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

/// Lifetime of a cached review unless configured otherwise
pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

/// Derives the cache key for a request.
///
/// The key is the request serialized as JSON with object keys sorted, so two
/// requests with the same field values always share a key.
pub fn cache_key(request: &ReviewRequest) -> Result<String> {
    let value = serde_json::to_value(request)?;
    Ok(serde_json::to_string(&canonicalize(value))?)
}

/// Recursively rebuilds every JSON object with its keys in lexicographic order
pub fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, canonicalize(value)))
                    .collect::<Map<String, Value>>(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}

/// Key-value store holding serialized review results
#[async_trait]
pub trait ReviewCache: Send + Sync {
    /// Returns the stored value for `key`, if present and not expired
    async fn lookup(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key` for `ttl`, replacing any previous value
    async fn store(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;
}

/// Redis-backed cache using `GET` and `SET ... EX`
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    /// Connects to the Redis server at `url`
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl ReviewCache for RedisCache {
    async fn lookup(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = redis::cmd("GET").arg(key).query_async(&mut conn).await?;
        Ok(value)
    }

    async fn store(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut conn = self.conn.clone();
        redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .query_async::<_, ()>(&mut conn)
            .await?;
        debug!(ttl_secs = ttl.as_secs(), "Review cached");
        Ok(())
    }
}

/// In-process cache with per-entry expiry, for tests and single-instance runs.
///
/// Expired entries are dropped on every write.
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    store: Arc<RwLock<HashMap<String, (String, Instant)>>>,
}

impl MemoryCache {
    /// Creates an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries, expired ones included until the next write or cleanup
    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    /// Checks if the cache holds no entries
    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }

    /// Removes expired entries and returns how many were removed
    pub async fn cleanup_expired(&self) -> usize {
        let mut store = self.store.write().await;
        let before_len = store.len();
        let now = Instant::now();
        store.retain(|_, (_, expires_at)| *expires_at > now);
        before_len - store.len()
    }
}

#[async_trait]
impl ReviewCache for MemoryCache {
    async fn lookup(&self, key: &str) -> Result<Option<String>> {
        let store = self.store.read().await;
        Ok(store
            .get(key)
            .filter(|(_, expires_at)| *expires_at > Instant::now())
            .map(|(value, _)| value.clone()))
    }

    async fn store(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut store = self.store.write().await;
        let now = Instant::now();
        store.retain(|_, (_, expires_at)| *expires_at > now);
        store.insert(key.to_string(), (value.to_string(), now + ttl));
        Ok(())
    }
}
