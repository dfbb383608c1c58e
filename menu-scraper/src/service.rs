use crate::apis::base::MenuParser;
use crate::apis::{BonAppetitParser, PomonaParser, SodexoParser};
use crate::cache::{menu_cache_key, MenuCache};
use crate::coalescer::Coalescer;
use crate::orchestrator::get_with_fallback;
use crate::registry::{self, UrlParams};
use chrono::NaiveDate;
use std::time::Duration;
use menu_core::domain::{Station, Vendor};
use menu_core::error::Result;
use menu_core::storage::{RunLog, SnapshotStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// The wire shape served to the (out-of-scope) HTTP boundary, also what the
/// cache stores verbatim as JSON.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MenuResponse {
    pub hall_id: String,
    pub date: NaiveDate,
    pub meal: String,
    pub stations: Vec<Station>,
    pub is_stale: bool,
    pub fetched_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Composition root: cache lookup -> single-flight coalesce -> fallback
/// orchestrator -> meal extraction. Construct one per process; it owns the
/// coalescer registry and is cheap to clone (everything inside is `Arc`'d
/// or a connection pool).
pub struct MenuService<S> {
    store: Arc<S>,
    cache: Arc<dyn MenuCache>,
    coalescer: Coalescer<Option<MenuResponse>>,
    base_ttl_secs: u64,
    jitter_secs: u64,
}

impl<S> MenuService<S>
where
    S: SnapshotStore + RunLog + Send + Sync + 'static,
{
    pub fn new(store: Arc<S>, cache: Arc<dyn MenuCache>, base_ttl_secs: u64, jitter_secs: u64) -> Self {
        Self {
            store,
            cache,
            coalescer: Coalescer::new(),
            base_ttl_secs,
            jitter_secs,
        }
    }

    /// Like `new`, but with an explicit coalescer timeout instead of the
    /// built-in 30s default. Used when wiring up from `MenuConfig`.
    pub fn with_coalescer_timeout(
        store: Arc<S>,
        cache: Arc<dyn MenuCache>,
        base_ttl_secs: u64,
        jitter_secs: u64,
        coalescer_timeout: Duration,
    ) -> Self {
        Self {
            store,
            cache,
            coalescer: Coalescer::with_timeout(coalescer_timeout),
            base_ttl_secs,
            jitter_secs,
        }
    }

    fn build_parser(hall_id: &str) -> Result<Box<dyn MenuParser>> {
        let entry = registry::lookup(hall_id)?;
        let parser: Box<dyn MenuParser> = match (entry.vendor, entry.params) {
            (Vendor::Sodexo, UrlParams::Sodexo { .. }) => Box::new(SodexoParser::new()),
            (Vendor::BonAppetit, UrlParams::BonAppetit { subdomain, cafe_path }) => {
                Box::new(BonAppetitParser::new(entry.hall_id, subdomain, cafe_path))
            }
            (Vendor::Pomona, UrlParams::Pomona { slug }) => {
                Box::new(PomonaParser::new(entry.hall_id, entry.display_name, slug))
            }
            _ => unreachable!("registry params always match the hall's vendor"),
        };
        Ok(parser)
    }

    /// Fetch the menu for `(hall_id, date, meal)`, using the cache, the
    /// coalescer, and the fallback orchestrator in that order. Returns
    /// `None` if no data is available from any source.
    pub async fn get_menu(&self, hall_id: &str, date: NaiveDate, meal: &str) -> Result<Option<MenuResponse>> {
        // Validate before touching cache/coalescer so the caller gets a
        // crisp UnknownHall/InvalidDate error rather than a cache miss.
        registry::lookup(hall_id)?;

        let date_str = date.format("%Y-%m-%d").to_string();
        let cache_key = menu_cache_key(hall_id, &date_str, meal);

        if let Some(raw) = self.cache.get(&cache_key).await {
            if let Ok(cached) = serde_json::from_str::<MenuResponse>(&raw) {
                return Ok(Some(cached));
            }
        }

        let store = self.store.clone();
        let hall_id_owned = hall_id.to_string();
        let meal_owned = meal.to_string();
        let cache = self.cache.clone();
        let cache_key_for_thunk = cache_key.clone();
        let base_ttl_secs = self.base_ttl_secs;
        let jitter_secs = self.jitter_secs;

        let result = self
            .coalescer
            .run(&cache_key, move || async move {
                let parser = match Self::build_parser(&hall_id_owned) {
                    Ok(parser) => parser,
                    Err(_) => return None,
                };

                let outcome = get_with_fallback(parser.as_ref(), store.as_ref(), &hall_id_owned, date).await;
                let menu = outcome.menu?;
                let matching_meal = menu.find_meal(&meal_owned)?;

                let response = MenuResponse {
                    hall_id: hall_id_owned.clone(),
                    date,
                    meal: meal_owned.clone(),
                    stations: matching_meal.stations.clone(),
                    is_stale: outcome.is_stale,
                    fetched_at: outcome.fetched_at,
                };

                if let Ok(serialized) = serde_json::to_string(&response) {
                    cache.set(&cache_key_for_thunk, &serialized, base_ttl_secs, jitter_secs).await;
                }

                Some(response)
            })
            .await?;

        Ok(result)
    }
}
