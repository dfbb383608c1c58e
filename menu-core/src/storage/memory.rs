use super::{RunLog, SnapshotStore};
use crate::domain::{Meal, Menu, ParserRun};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Clone)]
struct Row {
    meal: Meal,
    fetched_at: DateTime<Utc>,
    is_valid: bool,
}

/// In-memory `SnapshotStore`, used by the test suite in place of a real
/// database. Not process-shareable across connections — one instance per
/// test, same as the teacher's in-memory storage fakes.
#[derive(Default)]
pub struct InMemorySnapshotStore {
    rows: Mutex<HashMap<(String, NaiveDate, String), Row>>,
    runs: Mutex<Vec<ParserRun>>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test helper: inspect recorded parser runs.
    pub fn runs(&self) -> Vec<ParserRun> {
        self.runs.lock().expect("run log mutex poisoned").clone()
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn persist(&self, menu: &Menu) -> Result<()> {
        let mut rows = self.rows.lock().expect("snapshot store mutex poisoned");
        let now = Utc::now();
        for meal in &menu.meals {
            let key = (menu.hall_id.clone(), menu.date, meal.period.clone());
            rows.insert(
                key,
                Row {
                    meal: meal.clone(),
                    fetched_at: now,
                    is_valid: true,
                },
            );
        }
        Ok(())
    }

    async fn load_latest(
        &self,
        hall_id: &str,
        date: NaiveDate,
    ) -> Result<(Option<Menu>, Option<DateTime<Utc>>)> {
        let rows = self.rows.lock().expect("snapshot store mutex poisoned");

        let mut matching: Vec<&Row> = rows
            .iter()
            .filter(|((h, d, _), row)| h == hall_id && *d == date && row.is_valid)
            .map(|(_, row)| row)
            .collect();
        matching.sort_by(|a, b| b.fetched_at.cmp(&a.fetched_at));

        if matching.is_empty() {
            return Ok((None, None));
        }
        let latest = matching[0].fetched_at;

        let mut seen = std::collections::HashSet::new();
        let mut meals = Vec::new();
        for row in matching {
            let key = row.meal.period.to_lowercase();
            if !seen.insert(key) {
                continue;
            }
            meals.push(row.meal.clone());
        }

        if meals.is_empty() {
            return Ok((None, None));
        }

        Ok((Some(Menu::new(hall_id, date, meals)), Some(latest)))
    }
}

#[async_trait]
impl RunLog for InMemorySnapshotStore {
    async fn record(&self, run: &ParserRun) -> Result<()> {
        self.runs
            .lock()
            .expect("run log mutex poisoned")
            .push(run.clone());
        Ok(())
    }
}
