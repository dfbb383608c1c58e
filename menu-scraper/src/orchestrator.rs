use crate::apis::base::MenuParser;
use chrono::{DateTime, NaiveDate, Utc};
use menu_core::domain::{Menu, ParserRun, RunStatus};
use menu_core::storage::{RunLog, SnapshotStore};
use std::time::Instant;
use tracing::warn;

/// The outcome of `get_with_fallback`: the menu (live or stale), whether it
/// came from the fallback snapshot rather than a live parse, and when it
/// was produced.
pub struct FallbackOutcome {
    pub menu: Option<Menu>,
    pub is_stale: bool,
    pub fetched_at: Option<DateTime<Utc>>,
}

/// Drives a parser to completion, persisting fresh data on success and
/// falling back to the last-known-good snapshot on failure. Every
/// invocation is recorded as a `ParserRun` for operational visibility,
/// best-effort (a failure to record never demotes the actual result).
/// The recorded status is `Success` on a live parse, `Fallback` when a
/// stale snapshot is served in its place, and `NoData` when nothing is
/// available at all; `Error` is reserved for failures in this function's
/// own persist/record calls, not for parser misses.
pub async fn get_with_fallback<S>(
    parser: &dyn MenuParser,
    store: &S,
    hall_id: &str,
    target_date: NaiveDate,
) -> FallbackOutcome
where
    S: SnapshotStore + RunLog,
{
    let start = Instant::now();

    match parser.fetch_and_parse(target_date).await {
        Some(menu) => {
            let now = Utc::now();
            let (status, message) = match store.persist(&menu).await {
                Ok(()) => (RunStatus::Success, None),
                Err(err) => {
                    warn!(hall_id, error = %err, "failed to persist fresh menu; serving it anyway");
                    (RunStatus::Error, Some(format!("persist failed: {err}")))
                }
            };
            record_run(store, hall_id, target_date, start, status, message).await;

            FallbackOutcome {
                menu: Some(menu),
                is_stale: false,
                fetched_at: Some(now),
            }
        }
        None => {
            let (stored_menu, stored_fetched_at) = load_latest_best_effort(store, hall_id, target_date).await;

            let (status, message) = if stored_menu.is_some() {
                (RunStatus::Fallback, "parser returned no data; serving last-known-good snapshot")
            } else {
                (RunStatus::NoData, "parser returned no data and no snapshot is available")
            };
            record_run(store, hall_id, target_date, start, status, Some(message.to_string())).await;

            FallbackOutcome {
                menu: stored_menu,
                is_stale: true,
                fetched_at: stored_fetched_at,
            }
        }
    }
}

async fn load_latest_best_effort<S: SnapshotStore>(
    store: &S,
    hall_id: &str,
    target_date: NaiveDate,
) -> (Option<Menu>, Option<DateTime<Utc>>) {
    match store.load_latest(hall_id, target_date).await {
        Ok(result) => result,
        Err(err) => {
            warn!(hall_id, error = %err, "snapshot load failed during fallback; treating as no data");
            (None, None)
        }
    }
}

async fn record_run<S: RunLog>(
    store: &S,
    hall_id: &str,
    target_date: NaiveDate,
    start: Instant,
    status: RunStatus,
    error_message: Option<String>,
) {
    let run = ParserRun {
        hall_id: hall_id.to_string(),
        started_at: Utc::now(),
        duration_ms: start.elapsed().as_millis() as u64,
        status,
        error_message: error_message.map(|m| ParserRun::error_message_truncated(&m)),
        menu_date: target_date,
    };
    if let Err(err) = store.record(&run).await {
        warn!(hall_id, error = %err, "failed to record parser run");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use menu_core::domain::{Meal, Station};
    use menu_core::storage::InMemorySnapshotStore;

    struct AlwaysFails;
    #[async_trait]
    impl MenuParser for AlwaysFails {
        fn vendor_name(&self) -> &'static str {
            "test"
        }
        fn hall_id(&self) -> &'static str {
            "hoch"
        }
        async fn fetch_raw(&self, _target_date: NaiveDate) -> anyhow::Result<String> {
            Err(anyhow::anyhow!("network down"))
        }
        fn parse(&self, _raw: &str, _target_date: NaiveDate) -> anyhow::Result<Menu> {
            unreachable!()
        }
    }

    struct AlwaysSucceeds;
    #[async_trait]
    impl MenuParser for AlwaysSucceeds {
        fn vendor_name(&self) -> &'static str {
            "test"
        }
        fn hall_id(&self) -> &'static str {
            "hoch"
        }
        async fn fetch_raw(&self, _target_date: NaiveDate) -> anyhow::Result<String> {
            Ok(String::new())
        }
        fn parse(&self, _raw: &str, target_date: NaiveDate) -> anyhow::Result<Menu> {
            Ok(Menu::new(
                "hoch",
                target_date,
                vec![Meal::new("lunch", vec![Station::new("Grill", vec![])])],
            ))
        }
        fn validate(&self, _menu: &Menu) -> bool {
            true
        }
    }

    #[tokio::test]
    async fn failing_parser_with_no_snapshot_returns_stale_none() {
        let store = InMemorySnapshotStore::new();
        let date = NaiveDate::from_ymd_opt(2026, 2, 7).unwrap();
        let outcome = get_with_fallback(&AlwaysFails, &store, "hoch", date).await;
        assert!(outcome.menu.is_none());
        assert!(outcome.is_stale);
        assert!(outcome.fetched_at.is_none());
        assert_eq!(store.runs().len(), 1);
        assert_eq!(store.runs()[0].status, RunStatus::NoData);
    }

    #[tokio::test]
    async fn failing_parser_with_existing_snapshot_returns_it_marked_stale() {
        let store = InMemorySnapshotStore::new();
        let date = NaiveDate::from_ymd_opt(2026, 2, 7).unwrap();
        let snapshot = Menu::new("hoch", date, vec![Meal::new("lunch", vec![])]);
        store.persist(&snapshot).await.unwrap();

        let outcome = get_with_fallback(&AlwaysFails, &store, "hoch", date).await;
        assert!(outcome.menu.is_some());
        assert!(outcome.is_stale);
        assert!(outcome.fetched_at.is_some());
        assert_eq!(store.runs()[0].status, RunStatus::Fallback);
    }

    #[tokio::test]
    async fn successful_parse_persists_and_returns_fresh_data() {
        let store = InMemorySnapshotStore::new();
        let date = NaiveDate::from_ymd_opt(2026, 2, 7).unwrap();
        let outcome = get_with_fallback(&AlwaysSucceeds, &store, "hoch", date).await;
        assert!(!outcome.is_stale);
        assert!(outcome.menu.is_some());

        let (stored, _) = store.load_latest("hoch", date).await.unwrap();
        assert!(stored.is_some());
        assert_eq!(store.runs()[0].status, RunStatus::Success);
    }
}
