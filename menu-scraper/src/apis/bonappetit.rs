use super::base::{build_http_client, MenuParser};
use crate::filter::{apply_station_filters, bonappetit_filter};
use crate::tags;
use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use menu_core::domain::{Item, Meal, Menu, Station};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;

static RE_MENU_ITEMS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Bamco\.menu_items\s*=\s*(\{[^;]+\});").unwrap());
static RE_DAYPARTS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Bamco\.dayparts\['(\d+)'\]\s*=\s*(\{[^;]+\});").unwrap());
static RE_HTML_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());

fn clean_station_label(raw_label: &str) -> String {
    let cleaned = RE_HTML_TAGS.replace_all(raw_label, "");
    let cleaned = cleaned.trim();
    match cleaned.strip_prefix('@') {
        Some(rest) => rest.trim().to_string(),
        None => cleaned.to_string(),
    }
}

/// Parser for the three BAMCO-powered halls: Collins, Malott, McConnell.
pub struct BonAppetitParser {
    hall_id: &'static str,
    subdomain: &'static str,
    cafe_path: &'static str,
}

impl BonAppetitParser {
    pub fn new(hall_id: &'static str, subdomain: &'static str, cafe_path: &'static str) -> Self {
        Self {
            hall_id,
            subdomain,
            cafe_path,
        }
    }

    fn build_url(&self, target_date: NaiveDate) -> String {
        format!(
            "https://{}.cafebonappetit.com/cafe/{}/{}",
            self.subdomain,
            self.cafe_path,
            target_date.format("%Y-%m-%d")
        )
    }

    fn extract_menu_items(html: &str) -> Result<Value> {
        let caps = RE_MENU_ITEMS
            .captures(html)
            .ok_or_else(|| anyhow!("could not find Bamco.menu_items in page"))?;
        Ok(serde_json::from_str(&caps[1]).context("Bamco.menu_items is malformed JSON")?)
    }

    fn extract_dayparts(html: &str) -> Result<Vec<Value>> {
        let dayparts: Vec<Value> = RE_DAYPARTS
            .captures_iter(html)
            .filter_map(|caps| serde_json::from_str::<Value>(&caps[2]).ok())
            .collect();
        if dayparts.is_empty() {
            return Err(anyhow!("could not find Bamco.dayparts in page"));
        }
        Ok(dayparts)
    }

    fn build_stations(daypart: &Value, menu_items: &Value) -> Vec<Station> {
        daypart
            .get("stations")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(|station_data| {
                let raw_label = station_data.get("label").and_then(Value::as_str).unwrap_or("");
                let station_name = clean_station_label(raw_label);
                if station_name.is_empty() {
                    return None;
                }

                let mut seen: HashSet<String> = HashSet::new();
                let mut items = Vec::new();
                for item_id in station_data.get("items").and_then(Value::as_array).into_iter().flatten() {
                    let item_id_str = match item_id {
                        Value::String(s) => s.clone(),
                        Value::Number(n) => n.to_string(),
                        _ => continue,
                    };
                    let Some(item_data) = menu_items.get(&item_id_str) else {
                        continue;
                    };

                    let special = item_data.get("special");
                    let is_special = match special {
                        Some(Value::Bool(b)) => *b,
                        Some(Value::Number(n)) => n.as_i64().map(|v| v != 0).unwrap_or(false),
                        Some(Value::String(s)) => !s.is_empty(),
                        _ => false,
                    };
                    if !is_special {
                        continue;
                    }

                    let label = item_data.get("label").and_then(Value::as_str).unwrap_or("").trim();
                    if label.is_empty() {
                        continue;
                    }
                    let label_lower = label.to_lowercase();
                    if !seen.insert(label_lower) {
                        continue;
                    }

                    let raw_tags: Vec<String> = match item_data.get("cor_icon") {
                        Some(Value::Object(map)) => map
                            .values()
                            .filter_map(|v| v.as_str().map(str::to_string))
                            .collect(),
                        _ => Vec::new(),
                    };

                    items.push(Item::new(label, tags::normalize(raw_tags)));
                }

                Some(Station::new(station_name, items))
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl MenuParser for BonAppetitParser {
    fn vendor_name(&self) -> &'static str {
        "bonappetit"
    }

    fn hall_id(&self) -> &'static str {
        self.hall_id
    }

    async fn fetch_raw(&self, target_date: NaiveDate) -> Result<String> {
        let client = build_http_client()?;
        let url = self.build_url(target_date);
        let response = client.get(&url).send().await.context("bonappetit request failed")?;
        let response = response.error_for_status().context("bonappetit returned an error status")?;
        Ok(response.text().await.context("failed to read bonappetit response body")?)
    }

    fn parse(&self, raw: &str, target_date: NaiveDate) -> Result<Menu> {
        let menu_items = Self::extract_menu_items(raw)?;
        let dayparts = Self::extract_dayparts(raw)?;

        let mut meals = Vec::new();
        for daypart in &dayparts {
            let meal_label = daypart.get("label").and_then(Value::as_str).unwrap_or("Unknown");
            let stations = Self::build_stations(daypart, &menu_items);
            let filtered = apply_station_filters(stations, &bonappetit_filter());
            if !filtered.is_empty() {
                meals.push(Meal::new(meal_label.to_lowercase(), filtered));
            }
        }

        Ok(Menu::new(self.hall_id, target_date, meals))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture_html() -> String {
        r#"
        <html><script>
        Bamco.menu_items = {"1":{"label":"Chicken","special":1,"cor_icon":{"a":"vegan"}},"2":{"label":"chicken","special":1},"3":{"label":"Tofu","special":0}};
        Bamco.dayparts['100'] = {"label":"Lunch","stations":[{"label":"Grill","items":[1,2,3]}]};
        </script></html>
        "#
        .to_string()
    }

    #[test]
    fn dedups_case_insensitively_and_drops_non_special_items() {
        let parser = BonAppetitParser::new("collins", "collins-cmc", "collins");
        let menu = parser
            .parse(&fixture_html(), NaiveDate::from_ymd_opt(2026, 2, 7).unwrap())
            .unwrap();
        let meal = menu.find_meal("lunch").unwrap();
        let grill = &meal.stations[0];
        assert_eq!(grill.items.len(), 1);
        assert_eq!(grill.items[0].name, "Chicken");
    }

    #[test]
    fn cor_icon_object_values_feed_the_tag_normalizer() {
        let parser = BonAppetitParser::new("collins", "collins-cmc", "collins");
        let menu = parser
            .parse(&fixture_html(), NaiveDate::from_ymd_opt(2026, 2, 7).unwrap())
            .unwrap();
        let meal = menu.find_meal("lunch").unwrap();
        assert!(!meal.stations[0].items[0].tags.is_empty());
    }

    #[test]
    fn cor_icon_array_shape_produces_no_tags() {
        let html = r#"
        Bamco.menu_items = {"1":{"label":"Soup","special":1,"cor_icon":["vegan"]}};
        Bamco.dayparts['1'] = {"label":"Dinner","stations":[{"label":"Soup","items":[1]}]};
        "#;
        let parser = BonAppetitParser::new("collins", "collins-cmc", "collins");
        let menu = parser.parse(html, NaiveDate::from_ymd_opt(2026, 2, 7).unwrap()).unwrap();
        let meal = menu.find_meal("dinner").unwrap();
        assert!(meal.stations[0].items[0].tags.is_empty());
    }

    #[test]
    fn station_label_strips_leading_at_and_tags() {
        assert_eq!(clean_station_label("@<b>Grill</b>"), "Grill");
    }
}
