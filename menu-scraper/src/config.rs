use std::env;

/// Process configuration, read once at startup. Follows the teacher's
/// `DatabaseManager::new` pattern of explicit `env::var` reads with sane
/// defaults rather than a generic config-framework dependency.
#[derive(Debug, Clone)]
pub struct MenuConfig {
    pub database_url: String,
    pub redis_url: String,
    pub cache_base_ttl_secs: u64,
    pub cache_jitter_secs: u64,
    pub coalescer_timeout_secs: u64,
    pub fetch_total_timeout_secs: u64,
    pub fetch_connect_timeout_secs: u64,
}

impl MenuConfig {
    /// Load from the environment, applying `.env` first if present. Missing
    /// optional values fall back to the documented defaults; `DATABASE_URL`
    /// is the only value without one.
    pub fn from_env() -> Self {
        let _ = dotenv::dotenv();

        Self {
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "menus.db".to_string()),
            redis_url: env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),
            cache_base_ttl_secs: env_u64("CACHE_BASE_TTL_SECS", 1800),
            cache_jitter_secs: env_u64("CACHE_JITTER_SECS", 300),
            coalescer_timeout_secs: env_u64("COALESCER_TIMEOUT_SECS", 30),
            fetch_total_timeout_secs: env_u64("FETCH_TOTAL_TIMEOUT_SECS", 30),
            fetch_connect_timeout_secs: env_u64("FETCH_CONNECT_TIMEOUT_SECS", 10),
        }
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}
