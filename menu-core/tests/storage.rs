use chrono::NaiveDate;
use menu_core::domain::{Item, Meal, Menu, Station, Tag};
use menu_core::storage::{InMemorySnapshotStore, RunLog, SnapshotStore};
use menu_core::ParserRun;

fn sample_menu(hall_id: &str, date: NaiveDate) -> Menu {
    Menu::new(
        hall_id,
        date,
        vec![Meal::new(
            "lunch",
            vec![Station::new(
                "Grill",
                vec![
                    Item::new("Burger", vec![Tag::Halal]),
                    Item::new("Veggie Burger", vec![Tag::Vegan, Tag::Vegetarian]),
                ],
            )],
        )],
    )
}

#[tokio::test]
async fn persist_then_load_latest_round_trips_meals() {
    let store = InMemorySnapshotStore::new();
    let date = NaiveDate::from_ymd_opt(2026, 2, 7).unwrap();
    let menu = sample_menu("hoch", date);

    store.persist(&menu).await.unwrap();
    let (loaded, fetched_at) = store.load_latest("hoch", date).await.unwrap();

    let loaded = loaded.expect("snapshot should exist after persist");
    assert_eq!(loaded.hall_id, "hoch");
    assert_eq!(loaded.date, date);
    assert_eq!(loaded.meals, menu.meals);
    assert!(fetched_at.is_some());
}

#[tokio::test]
async fn load_latest_returns_none_when_nothing_stored() {
    let store = InMemorySnapshotStore::new();
    let date = NaiveDate::from_ymd_opt(2026, 2, 7).unwrap();

    let (loaded, fetched_at) = store.load_latest("hoch", date).await.unwrap();
    assert!(loaded.is_none());
    assert!(fetched_at.is_none());
}

#[tokio::test]
async fn persist_overwrites_existing_row_for_same_triple() {
    let store = InMemorySnapshotStore::new();
    let date = NaiveDate::from_ymd_opt(2026, 2, 7).unwrap();

    store.persist(&sample_menu("hoch", date)).await.unwrap();

    let updated = Menu::new(
        "hoch",
        date,
        vec![Meal::new(
            "lunch",
            vec![Station::new("Grill", vec![Item::new("Chicken", vec![])])],
        )],
    );
    store.persist(&updated).await.unwrap();

    let (loaded, _) = store.load_latest("hoch", date).await.unwrap();
    let loaded = loaded.unwrap();
    assert_eq!(loaded.meals.len(), 1);
    assert_eq!(loaded.meals[0].stations[0].items.len(), 1);
    assert_eq!(loaded.meals[0].stations[0].items[0].name, "Chicken");
}

#[tokio::test]
async fn load_latest_dedups_by_meal_keeping_most_recent() {
    let store = InMemorySnapshotStore::new();
    let date = NaiveDate::from_ymd_opt(2026, 2, 7).unwrap();

    let lunch_only = Menu::new(
        "hoch",
        date,
        vec![Meal::new("lunch", vec![Station::new("Grill", vec![Item::new("A", vec![])])])],
    );
    let dinner_only = Menu::new(
        "hoch",
        date,
        vec![Meal::new("dinner", vec![Station::new("Grill", vec![Item::new("B", vec![])])])],
    );

    store.persist(&lunch_only).await.unwrap();
    store.persist(&dinner_only).await.unwrap();

    let (loaded, _) = store.load_latest("hoch", date).await.unwrap();
    let loaded = loaded.unwrap();
    let periods: Vec<&str> = loaded.meals.iter().map(|m| m.period.as_str()).collect();
    assert!(periods.contains(&"lunch"));
    assert!(periods.contains(&"dinner"));
}

#[tokio::test]
async fn run_log_records_runs_best_effort() {
    let store = InMemorySnapshotStore::new();
    let run = ParserRun {
        hall_id: "hoch".into(),
        started_at: chrono::Utc::now(),
        duration_ms: 120,
        status: menu_core::domain::RunStatus::Success,
        error_message: None,
        menu_date: NaiveDate::from_ymd_opt(2026, 2, 7).unwrap(),
    };
    store.record(&run).await.unwrap();
    assert_eq!(store.runs().len(), 1);
}
