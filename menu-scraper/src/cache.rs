use async_trait::async_trait;
use rand::Rng;
use redis::aio::ConnectionManager;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::warn;

/// Build a Redis cache key for a `(hall, date, meal)` triple.
pub fn menu_cache_key(hall_id: &str, date_str: &str, meal: &str) -> String {
    format!("menu:{hall_id}:{date_str}:{meal}")
}

/// Compute a TTL in `[base - jitter, base + jitter]`, randomized to avoid
/// synchronized expiration across keys written around the same time.
pub fn jittered_ttl(base_ttl_secs: u64, jitter_secs: u64) -> u64 {
    let jitter: i64 = rand::thread_rng().gen_range(-(jitter_secs as i64)..=(jitter_secs as i64));
    (base_ttl_secs as i64 + jitter).max(1) as u64
}

/// Key-value cache with jittered TTL, fronting the fallback orchestrator.
/// Cache errors are non-fatal: callers treat them as a miss and proceed to
/// the live path rather than failing the request.
#[async_trait]
pub trait MenuCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;
    async fn set(&self, key: &str, value: &str, base_ttl_secs: u64, jitter_secs: u64);
}

/// Redis-backed cache. TTL for each write is `base_ttl_secs +/- jitter_secs`,
/// preventing synchronized expiration across keys written around the same
/// time (thundering herd).
pub struct RedisMenuCache {
    conn: ConnectionManager,
}

impl RedisMenuCache {
    pub async fn connect(redis_url: &str) -> redis::RedisResult<Self> {
        let client = redis::Client::open(redis_url)?;
        let conn = client.get_connection_manager().await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl MenuCache for RedisMenuCache {
    async fn get(&self, key: &str) -> Option<String> {
        let mut conn = self.conn.clone();
        match redis::cmd("GET").arg(key).query_async::<Option<String>>(&mut conn).await {
            Ok(value) => value,
            Err(err) => {
                warn!(key, error = %err, "cache get failed, treating as miss");
                None
            }
        }
    }

    async fn set(&self, key: &str, value: &str, base_ttl_secs: u64, jitter_secs: u64) {
        let ttl = jittered_ttl(base_ttl_secs, jitter_secs);

        let mut conn = self.conn.clone();
        if let Err(err) = redis::cmd("SETEX")
            .arg(key)
            .arg(ttl)
            .arg(value)
            .query_async::<()>(&mut conn)
            .await
        {
            warn!(key, error = %err, "cache set failed, proceeding without caching");
        }
    }
}

/// In-memory cache fake for tests, avoiding a real Redis dependency in the
/// test suite.
#[derive(Default)]
pub struct InMemoryMenuCache {
    entries: Mutex<HashMap<String, String>>,
}

impl InMemoryMenuCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MenuCache for InMemoryMenuCache {
    async fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().await.get(key).cloned()
    }

    async fn set(&self, key: &str, value: &str, _base_ttl_secs: u64, _jitter_secs: u64) {
        self.entries.lock().await.insert(key.to_string(), value.to_string());
    }
}
