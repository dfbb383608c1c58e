use chrono::NaiveDate;
use menu_scraper::apis::{MenuParser, PomonaParser};

const FIXTURE: &str = include_str!("fixtures/pomona/frank_2026-02-07.json");

fn parser() -> PomonaParser {
    PomonaParser::new("frank", "Frank", "frank")
}

#[test]
fn closed_meal_period_is_excluded() {
    let menu = parser().parse(FIXTURE, NaiveDate::from_ymd_opt(2026, 2, 7).unwrap()).unwrap();
    assert!(menu.find_meal("closed").is_none());
    assert_eq!(menu.meals.len(), 2);
}

#[test]
fn displayonwebsite_n_is_filtered_and_grill_variants_merge() {
    let menu = parser().parse(FIXTURE, NaiveDate::from_ymd_opt(2026, 2, 7).unwrap()).unwrap();
    let lunch = menu.find_meal("lunch").unwrap();

    let all_names: Vec<&str> = lunch.stations.iter().flat_map(|s| s.items.iter().map(|i| i.name.as_str())).collect();
    assert!(!all_names.contains(&"Brownie"));

    let grill = lunch.stations.iter().find(|s| s.name == "Grill").unwrap();
    assert_eq!(grill.items.len(), 2);
}

#[test]
fn breakfast_grill_is_truncated_to_five() {
    let menu = parser().parse(FIXTURE, NaiveDate::from_ymd_opt(2026, 2, 7).unwrap()).unwrap();
    let breakfast = menu.find_meal("breakfast").unwrap();
    let station = breakfast.stations.iter().find(|s| s.name == "Breakfast Grill").unwrap();
    assert_eq!(station.items.len(), 5);
}

#[test]
fn comma_only_split_keeps_roasted_chicken_rice_together() {
    let menu = parser().parse(FIXTURE, NaiveDate::from_ymd_opt(2026, 2, 7).unwrap()).unwrap();
    let lunch = menu.find_meal("lunch").unwrap();
    let entree = lunch.stations.iter().find(|s| s.name == "Entree").unwrap();
    let names: Vec<&str> = entree.items.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["Roasted Chicken", "Rice"]);
}
