use chrono::NaiveDate;
use menu_scraper::apis::{BonAppetitParser, MenuParser};

const FIXTURE: &str = include_str!("fixtures/bonappetit/collins_2026-02-07.html");

fn parser() -> BonAppetitParser {
    BonAppetitParser::new("collins", "collins-cmc", "collins")
}

#[test]
fn parses_fixture_with_no_hidden_stations() {
    let menu = parser().parse(FIXTURE, NaiveDate::from_ymd_opt(2026, 2, 7).unwrap()).unwrap();
    assert_eq!(menu.hall_id, "collins");
    assert!(!menu.meals.is_empty());

    for meal in &menu.meals {
        for station in &meal.stations {
            assert_ne!(station.name.to_lowercase(), "beverages");
            assert!(!station.items.is_empty());
        }
    }
}

#[test]
fn breakfast_at_home_is_truncated_to_three_and_renamed_grill_special() {
    let menu = parser().parse(FIXTURE, NaiveDate::from_ymd_opt(2026, 2, 7).unwrap()).unwrap();
    let breakfast = menu.find_meal("breakfast").unwrap();

    let home_station = breakfast
        .stations
        .iter()
        .find(|s| s.name.to_lowercase().contains("home"))
        .expect("breakfast @home station present");
    assert_eq!(home_station.items.len(), 3);

    let grill_special = breakfast.stations.iter().find(|s| s.name == "Grill Special").unwrap();
    let names: Vec<&str> = grill_special.items.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["Grilled Chicken", "Grilled Salmon"]);
}

#[test]
fn main_plate_variants_merge_into_one_station() {
    let menu = parser().parse(FIXTURE, NaiveDate::from_ymd_opt(2026, 2, 7).unwrap()).unwrap();
    let lunch = menu.find_meal("lunch").unwrap();

    let main_plate_stations: Vec<_> = lunch.stations.iter().filter(|s| s.name == "Main Plate").collect();
    assert_eq!(main_plate_stations.len(), 1);
    assert_eq!(main_plate_stations[0].items.len(), 3);
}
