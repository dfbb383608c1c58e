use chrono::NaiveDate;
use menu_core::domain::Menu;
use std::time::Duration;
use tracing::{info, warn};

const DEFAULT_MIN_STATIONS: usize = 1;
const TOTAL_TIMEOUT_SECS: u64 = 30;
const CONNECT_TIMEOUT_SECS: u64 = 10;
const USER_AGENT: &str =
    "Mozilla/5.0 (compatible; MenuService/1.0; +https://consortium.example.edu)";

/// Build an HTTP client with the fetch timeouts and user agent mandated for
/// every vendor parser. Scoped to a single call, never reused across
/// invocations, so its connection pool is released on every exit path.
pub fn build_http_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(TOTAL_TIMEOUT_SECS))
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .redirect(reqwest::redirect::Policy::limited(10))
        .user_agent(USER_AGENT)
        .build()
}

/// Shared contract across the three vendor parsers. `parse` is pure and
/// side-effect free so fixture tests never touch the network; only
/// `fetch_raw` performs I/O.
#[async_trait::async_trait]
pub trait MenuParser: Send + Sync {
    fn vendor_name(&self) -> &'static str;
    fn hall_id(&self) -> &'static str;

    /// Perform the vendor-specific HTTP fetch(es), returning the raw payload
    /// `parse` expects. Network/HTTP failures are the only acceptable error.
    async fn fetch_raw(&self, target_date: NaiveDate) -> anyhow::Result<String>;

    /// Pure extraction + normalization. No I/O.
    fn parse(&self, raw: &str, target_date: NaiveDate) -> anyhow::Result<Menu>;

    fn min_stations(&self) -> usize {
        DEFAULT_MIN_STATIONS
    }

    /// A menu is valid if it has at least one meal and every meal meets
    /// `min_stations`.
    fn validate(&self, menu: &Menu) -> bool {
        !menu.meals.is_empty()
            && menu
                .meals
                .iter()
                .all(|m| m.stations.len() >= self.min_stations())
    }

    /// Fetch, parse, and validate, swallowing every recoverable failure into
    /// `None` so callers never see a vendor-specific exception.
    async fn fetch_and_parse(&self, target_date: NaiveDate) -> Option<Menu> {
        let raw = match self.fetch_raw(target_date).await {
            Ok(raw) => raw,
            Err(err) => {
                warn!(hall_id = self.hall_id(), vendor = self.vendor_name(), date = %target_date, error = %err, "menu fetch failed");
                return None;
            }
        };

        let menu = match self.parse(&raw, target_date) {
            Ok(menu) => menu,
            Err(err) => {
                warn!(hall_id = self.hall_id(), vendor = self.vendor_name(), date = %target_date, error = %err, "menu parse failed");
                return None;
            }
        };

        if !self.validate(&menu) {
            warn!(hall_id = self.hall_id(), vendor = self.vendor_name(), date = %target_date, "menu failed validation");
            return None;
        }

        info!(hall_id = self.hall_id(), vendor = self.vendor_name(), date = %target_date, meals = menu.meals.len(), "menu fetch succeeded");
        Some(menu)
    }
}
