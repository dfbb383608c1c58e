use chrono::NaiveDate;
use clap::Parser;
use menu_core::error::MenuError;
use menu_core::storage::InMemorySnapshotStore;
use menu_scraper::cache::{InMemoryMenuCache, RedisMenuCache};
use menu_scraper::{MenuConfig, MenuService};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// Thin, non-production entry point for exercising the menu pipeline end to
/// end: loads config, wires up storage/cache, fetches one `(hall, date,
/// meal)`, and prints the result. Not the production HTTP server.
#[derive(Parser)]
#[command(name = "fetch-menu")]
#[command(about = "Fetch a single hall/date/meal through the full menu pipeline")]
struct Cli {
    /// Hall id, e.g. "hoch"
    #[arg(long)]
    hall: String,
    /// Date in YYYY-MM-DD form
    #[arg(long)]
    date: String,
    /// Meal period, e.g. "lunch"
    #[arg(long)]
    meal: String,
    /// Skip Redis and use an in-process cache instead
    #[arg(long)]
    no_redis: bool,
}

fn parse_date(raw: &str) -> Result<NaiveDate, MenuError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| MenuError::InvalidDate(raw.to_string()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    menu_scraper::logging::init_logging();
    let cli = Cli::parse();
    let config = MenuConfig::from_env();

    let date = parse_date(&cli.date)?;

    #[cfg(feature = "db")]
    let store = {
        info!(database_url = %config.database_url, "opening snapshot store");
        Arc::new(menu_core::storage::LibsqlSnapshotStore::open_local(&config.database_url).await?)
    };
    #[cfg(not(feature = "db"))]
    let store = {
        info!("db feature disabled; using an in-memory snapshot store for this run");
        Arc::new(InMemorySnapshotStore::new())
    };

    let cache: Arc<dyn menu_scraper::cache::MenuCache> = if cli.no_redis {
        Arc::new(InMemoryMenuCache::new())
    } else {
        match RedisMenuCache::connect(&config.redis_url).await {
            Ok(redis_cache) => Arc::new(redis_cache),
            Err(err) => {
                error!(error = %err, "failed to connect to redis, falling back to in-memory cache");
                Arc::new(InMemoryMenuCache::new())
            }
        }
    };

    let service = MenuService::with_coalescer_timeout(
        store,
        cache,
        config.cache_base_ttl_secs,
        config.cache_jitter_secs,
        Duration::from_secs(config.coalescer_timeout_secs),
    );

    match service.get_menu(&cli.hall, date, &cli.meal).await {
        Ok(Some(response)) => {
            info!(hall = %cli.hall, is_stale = response.is_stale, "fetched menu");
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Ok(None) => {
            info!(hall = %cli.hall, "no menu available for this hall/date/meal");
        }
        Err(err) => {
            error!(error = %err, "fetch-menu failed");
            return Err(err.into());
        }
    }

    Ok(())
}
