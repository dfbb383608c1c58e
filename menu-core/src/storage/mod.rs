pub mod memory;
pub mod run_log;

#[cfg(feature = "db")]
pub mod libsql_store;

use crate::domain::Menu;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

#[cfg(feature = "db")]
pub use libsql_store::LibsqlSnapshotStore;
pub use memory::InMemorySnapshotStore;
pub use run_log::RunLog;

/// Persists and reloads the last-known-good menu for a `(hall, date, meal)`
/// triple. Implementations never delete rows — `persist` always upserts,
/// `load_latest` always reads `is_valid = true` rows.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Upsert one row per meal in `menu`, all in a single commit.
    async fn persist(&self, menu: &Menu) -> Result<()>;

    /// Load the most recent valid snapshot for `(hall_id, date)`, one row
    /// per meal period (ties broken by most recent `fetched_at`).
    ///
    /// Returns `(None, None)` if nothing is stored.
    async fn load_latest(
        &self,
        hall_id: &str,
        date: NaiveDate,
    ) -> Result<(Option<Menu>, Option<DateTime<Utc>>)>;
}
