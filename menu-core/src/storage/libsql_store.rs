use super::{RunLog, SnapshotStore};
use crate::domain::{Item, Meal, Menu, ParserRun, Station, Tag};
use crate::error::{MenuError, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use libsql::{Builder, Connection, Database};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Snapshot store backed by libSQL (local file or remote Turso database),
/// mirroring the teacher's `DatabaseManager` connection/migration pattern.
pub struct LibsqlSnapshotStore {
    db: Database,
}

#[derive(Serialize, Deserialize)]
struct StoredItem {
    name: String,
    tags: Vec<Tag>,
}

#[derive(Serialize, Deserialize)]
struct StoredStation {
    name: String,
    items: Vec<StoredItem>,
}

impl LibsqlSnapshotStore {
    /// Open (and create if missing) a local libSQL database file.
    pub async fn open_local(path: &str) -> Result<Self> {
        let db = Builder::new_local(path)
            .build()
            .await
            .map_err(|e| MenuError::Database(format!("failed to open local database: {e}")))?;
        let store = Self { db };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Connect to a remote Turso database.
    pub async fn open_remote(url: String, auth_token: String) -> Result<Self> {
        let db = Builder::new_remote(url, auth_token)
            .build()
            .await
            .map_err(|e| MenuError::Database(format!("failed to connect to database: {e}")))?;
        let store = Self { db };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn get_connection(&self) -> Result<Connection> {
        self.db
            .connect()
            .map_err(|e| MenuError::Database(format!("failed to get connection: {e}")))
    }

    async fn run_migrations(&self) -> Result<()> {
        info!("running menu snapshot store migrations");
        let conn = self.get_connection().await?;

        conn.execute_batch(include_str!("../../migrations/001_create_menus.sql"))
            .await
            .map_err(|e| MenuError::Database(format!("base migration failed: {e}")))?;
        conn.execute_batch(include_str!("../../migrations/002_indexes.sql"))
            .await
            .map_err(|e| MenuError::Database(format!("index migration failed: {e}")))?;

        Ok(())
    }

    fn stations_to_json(stations: &[Station]) -> Result<String> {
        let stored: Vec<StoredStation> = stations
            .iter()
            .map(|s| StoredStation {
                name: s.name.clone(),
                items: s
                    .items
                    .iter()
                    .map(|i| StoredItem {
                        name: i.name.clone(),
                        tags: i.tags.clone(),
                    })
                    .collect(),
            })
            .collect();
        Ok(serde_json::to_string(&stored)?)
    }

    fn json_to_stations(raw: &str) -> Result<Vec<Station>> {
        let stored: Vec<StoredStation> = serde_json::from_str(raw)?;
        Ok(stored
            .into_iter()
            .map(|s| Station::new(s.name, s.items.into_iter().map(|i| Item::new(i.name, i.tags)).collect()))
            .collect())
    }
}

#[async_trait]
impl SnapshotStore for LibsqlSnapshotStore {
    async fn persist(&self, menu: &Menu) -> Result<()> {
        let conn = self.get_connection().await?;
        let now = Utc::now().to_rfc3339();
        let date_str = menu.date.format("%Y-%m-%d").to_string();

        for meal in &menu.meals {
            let stations_json = Self::stations_to_json(&meal.stations)?;
            conn.execute(
                "INSERT INTO menus (hall_id, date, meal, stations_json, fetched_at, is_valid)
                 VALUES (?1, ?2, ?3, ?4, ?5, 1)
                 ON CONFLICT(hall_id, date, meal) DO UPDATE SET
                   stations_json = excluded.stations_json,
                   fetched_at = excluded.fetched_at,
                   is_valid = 1",
                libsql::params![menu.hall_id.clone(), date_str.clone(), meal.period.clone(), stations_json, now.clone()],
            )
            .await
            .map_err(|e| MenuError::Database(format!("failed to upsert menu row: {e}")))?;
        }

        Ok(())
    }

    async fn load_latest(
        &self,
        hall_id: &str,
        date: NaiveDate,
    ) -> Result<(Option<Menu>, Option<DateTime<Utc>>)> {
        let conn = self.get_connection().await?;
        let date_str = date.format("%Y-%m-%d").to_string();

        let mut rows = conn
            .query(
                "SELECT meal, stations_json, fetched_at FROM menus
                 WHERE hall_id = ?1 AND date = ?2 AND is_valid = 1
                 ORDER BY fetched_at DESC",
                libsql::params![hall_id, date_str],
            )
            .await
            .map_err(|e| MenuError::Database(format!("failed to query menus: {e}")))?;

        let mut seen = std::collections::HashSet::new();
        let mut meals = Vec::new();
        let mut latest: Option<DateTime<Utc>> = None;

        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| MenuError::Database(format!("failed to read menu row: {e}")))?
        {
            let meal: String = row
                .get(0)
                .map_err(|e| MenuError::Database(format!("failed to read meal column: {e}")))?;
            let stations_json: String = row
                .get(1)
                .map_err(|e| MenuError::Database(format!("failed to read stations_json column: {e}")))?;
            let fetched_at_str: String = row
                .get(2)
                .map_err(|e| MenuError::Database(format!("failed to read fetched_at column: {e}")))?;
            let fetched_at = DateTime::parse_from_rfc3339(&fetched_at_str)
                .map_err(|e| MenuError::Database(format!("invalid fetched_at timestamp: {e}")))?
                .with_timezone(&Utc);

            if latest.is_none() {
                latest = Some(fetched_at);
            }

            let key = meal.to_lowercase();
            if !seen.insert(key) {
                continue;
            }

            let stations = Self::json_to_stations(&stations_json)?;
            meals.push(Meal::new(meal, stations));
        }

        if meals.is_empty() {
            return Ok((None, None));
        }

        Ok((Some(Menu::new(hall_id, date, meals)), latest))
    }
}

#[async_trait]
impl RunLog for LibsqlSnapshotStore {
    async fn record(&self, run: &ParserRun) -> Result<()> {
        let conn = self.get_connection().await?;
        let date_str = run.menu_date.format("%Y-%m-%d").to_string();
        conn.execute(
            "INSERT INTO parser_runs (hall_id, started_at, duration_ms, status, error_message, menu_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            libsql::params![
                run.hall_id.clone(),
                run.started_at.to_rfc3339(),
                run.duration_ms as i64,
                run.status.as_str().to_string(),
                run.error_message.clone(),
                date_str,
            ],
        )
        .await
        .map_err(|e| MenuError::Database(format!("failed to insert parser run: {e}")))?;
        Ok(())
    }
}
