use menu_core::domain::{Item, Station};
use std::collections::HashMap;

/// Truncation rule for a single station: keep the first N items, or drop
/// the station entirely when N is `Drop`.
#[derive(Debug, Clone, Copy)]
pub enum Truncate {
    Keep(usize),
    Drop,
}

/// Static, per-vendor station filter configuration.
///
/// All maps are keyed by lowercased station name. `combined` maps a
/// canonical display name to the lowercased aliases that should merge
/// into it; `ordered` is the sort priority list, also lowercased.
#[derive(Debug, Clone, Default)]
pub struct StationFilterConfig {
    pub combined: Vec<(&'static str, &'static [&'static str])>,
    pub hidden: &'static [&'static str],
    pub truncated: Vec<(&'static str, Truncate)>,
    pub ordered: &'static [&'static str],
}

/// Run the merge -> hide -> truncate -> sort -> drop-empty pipeline.
pub fn apply_station_filters(stations: Vec<Station>, config: &StationFilterConfig) -> Vec<Station> {
    let stations = merge(stations, config);
    let stations = hide(stations, config);
    let stations = truncate(stations, config);
    let stations = sort(stations, config);
    drop_empty(stations)
}

fn alias_map(config: &StationFilterConfig) -> HashMap<String, &'static str> {
    let mut map = HashMap::new();
    for (canonical, aliases) in &config.combined {
        for alias in *aliases {
            map.insert(alias.to_lowercase(), *canonical);
        }
    }
    map
}

fn merge(stations: Vec<Station>, config: &StationFilterConfig) -> Vec<Station> {
    let aliases = alias_map(config);
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Station> = HashMap::new();

    for station in stations {
        let lowered = station.name.to_lowercase();
        let canonical_display = aliases.get(&lowered).copied();
        let key = canonical_display
            .map(|c| c.to_lowercase())
            .unwrap_or_else(|| lowered.clone());
        let display_name = canonical_display
            .map(|c| c.to_string())
            .unwrap_or(station.name.clone());

        match groups.get_mut(&key) {
            Some(existing) => existing.items.extend(station.items),
            None => {
                order.push(key.clone());
                groups.insert(key, Station::new(display_name, station.items));
            }
        }
    }

    order.into_iter().map(|k| groups.remove(&k).unwrap()).collect()
}

fn hide(stations: Vec<Station>, config: &StationFilterConfig) -> Vec<Station> {
    stations
        .into_iter()
        .filter(|s| {
            let key = s.name.to_lowercase();
            if config.hidden.iter().any(|h| *h == key) {
                return false;
            }
            !matches!(
                config.truncated.iter().find(|(name, _)| *name == key),
                Some((_, Truncate::Drop))
            )
        })
        .collect()
}

fn truncate(stations: Vec<Station>, config: &StationFilterConfig) -> Vec<Station> {
    stations
        .into_iter()
        .map(|mut s| {
            let key = s.name.to_lowercase();
            if let Some((_, Truncate::Keep(n))) = config.truncated.iter().find(|(name, _)| *name == key) {
                s.items.truncate(*n);
            }
            s
        })
        .collect()
}

fn sort(mut stations: Vec<Station>, config: &StationFilterConfig) -> Vec<Station> {
    let priority: HashMap<&str, usize> = config
        .ordered
        .iter()
        .enumerate()
        .map(|(i, name)| (*name, i))
        .collect();
    let unlisted = config.ordered.len();

    stations.sort_by_key(|s| {
        let key = s.name.to_lowercase();
        *priority.get(key.as_str()).unwrap_or(&unlisted)
    });
    stations
}

fn drop_empty(stations: Vec<Station>) -> Vec<Station> {
    stations.into_iter().filter(|s| !s.items.is_empty()).collect()
}

pub fn sodexo_filter() -> StationFilterConfig {
    StationFilterConfig {
        combined: vec![
            (
                "Special Salad Station",
                &[
                    "hmc salad",
                    "special hot station salad north",
                    "special bar salad-s",
                    "special hot station salad south",
                    "special station salad north",
                    "special station salad south",
                ],
            ),
            ("Miscellaneous", &["misc", "-"]),
            ("Soups", &["stew", "stews", "soup"]),
            ("Breakfast Grill", &["breakfast grill", "grill breakfast"]),
            ("The Grill Dinner", &["the grill dinner"]),
            ("Entree", &["entree", "entrees", "entree", "entrees"]),
        ],
        hidden: &[
            "salad bar",
            "deli bar",
            "hot cereal",
            "sub connection",
            "deli bar hmc",
            "deli",
            "have a great day",
            "have a great day!",
            "rice",
            "potatoes",
            "sauces",
            "action-made to order",
        ],
        truncated: vec![
            ("breakfast grill", Truncate::Keep(5)),
            ("salad bar", Truncate::Drop),
            ("grill", Truncate::Keep(3)),
            ("omelet bar", Truncate::Drop),
            ("breakfast", Truncate::Keep(12)),
            ("breakfast @home", Truncate::Keep(3)),
            ("breakfast options", Truncate::Drop),
            ("international", Truncate::Keep(6)),
            ("burger shack", Truncate::Drop),
        ],
        ordered: &[
            "exhibition",
            "entree",
            "entrees",
            "dim sum",
            "entrees",
            "entree",
            "chicken entree",
            "beef entree",
            "fish/seafood entree",
            "pork",
            "action",
            "creations",
            "creations lto's",
            "breakfast grill",
            "chef's corner lto's",
            "chef's corner",
            "international",
            "oven",
            "taco bar",
            "breakfast",
            "grill breakfast",
            "grill",
            "the grill dinner",
            "vegetarian entrees",
            "special salad station",
            "veggie valley",
            "pasta/noodles",
            "pizza",
            "simple servings",
            "vegetables",
            "miscellaneous",
            "soups",
            "soup bar",
            "specialty salads",
            "hmc special salad",
            "salad",
            "hmc salad",
            "stg",
            "dessert",
            "desserts",
            "fruit bar",
            "bakery",
            "salad bar yogurt",
        ],
    }
}

pub fn bonappetit_filter() -> StationFilterConfig {
    StationFilterConfig {
        combined: vec![
            ("Grill Special", &["grill"]),
            ("Sweets", &["sweets", "chocolate chip cookies"]),
            ("Main Plate", &["main plate", "main plate in balance"]),
            ("Ovens", &["ovens", "ovens2"]),
        ],
        hidden: &[
            "breakfast toppings",
            "breads, bagels and spreads",
            "cold cereals",
            "cold cereal",
            "fruits and yogurts",
            "beverage",
            "beverages",
            "build your own sandwich",
            "cereal",
            "toppings & condiments",
            "deli bar",
        ],
        truncated: vec![
            ("breakfast grill", Truncate::Keep(5)),
            ("salad bar", Truncate::Drop),
            ("grill", Truncate::Keep(3)),
            ("omelet bar", Truncate::Drop),
            ("breakfast", Truncate::Keep(12)),
            ("breakfast @home", Truncate::Keep(3)),
            ("breakfast options", Truncate::Keep(5)),
            ("juice and smoothie bar", Truncate::Drop),
            ("expo - mongolian", Truncate::Drop),
            ("expo - little italy", Truncate::Keep(3)),
            ("chef's table - pasta bar", Truncate::Drop),
            ("chef's table - taco bar", Truncate::Drop),
        ],
        ordered: &[
            "chef's table",
            "main plate",
            "breakfast",
            "breakfast @home",
            "@home",
            "@ home",
            "breakfast options",
            "expo",
            "global",
            "options",
            "expo - mongolian",
            "expo - little italy",
            "grill",
            "pasta - express",
            "ovens",
            "collins late night snack",
            "ovens",
            "vegan",
            "vegan salads",
            "vegan - hummus & pita",
            "sweets",
            "stock pot",
            "stocks",
        ],
    }
}

pub fn pomona_filter() -> StationFilterConfig {
    StationFilterConfig {
        combined: vec![
            ("Grill", &["grill", "grill station"]),
            ("Soup", &["soup", "soup station", "soups"]),
            ("Expo", &["expo", "expo station"]),
        ],
        hidden: &[],
        truncated: vec![("breakfast grill", Truncate::Keep(5))],
        ordered: &[
            "entree",
            "expo",
            "grill",
            "mainline",
            "starch",
            "pizza",
            "allergen friendly station",
            "salad",
            "salad bar",
            "vegetable",
            "vegan/veggie",
            "soup",
            "deli-salad",
            "dessert",
        ],
    }
}

fn item(name: &str) -> Item {
    Item::new(name, vec![])
}
