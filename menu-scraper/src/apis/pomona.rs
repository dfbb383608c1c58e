use super::base::{build_http_client, MenuParser};
use crate::filter::{apply_station_filters, pomona_filter};
use crate::tags;
use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use menu_core::domain::{Item, Meal, Menu, Station};
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::warn;

const PAGE_URL_TEMPLATE: &str = "https://www.pomona.edu/administration/dining/menus/{slug}";
const FALLBACK_JSON_URL_TEMPLATE: &str = "https://my.pomona.edu/eatec/{name}.json";

/// Parser for the three Pomona-operated halls: Frank, Frary, Oldenborg.
pub struct PomonaParser {
    hall_id: &'static str,
    display_name: &'static str,
    slug: &'static str,
}

impl PomonaParser {
    pub fn new(hall_id: &'static str, display_name: &'static str, slug: &'static str) -> Self {
        Self {
            hall_id,
            display_name,
            slug,
        }
    }

    /// Extract the JSON feed URL from `#dining-menu-from-json`'s
    /// `data-dining-menu-json-url` attribute, falling back to the known
    /// eatec URL pattern and logging a warning when absent.
    fn discover_json_url(&self, page_html: &str) -> String {
        let document = Html::parse_document(page_html);
        if let Ok(selector) = Selector::parse("#dining-menu-from-json") {
            if let Some(el) = document.select(&selector).next() {
                if let Some(url) = el.value().attr("data-dining-menu-json-url") {
                    if !url.is_empty() {
                        return url.to_string();
                    }
                }
            }
        }

        let fallback = FALLBACK_JSON_URL_TEMPLATE.replace("{name}", self.display_name);
        warn!(
            hall_id = self.hall_id,
            fallback_url = %fallback,
            "could not find data-dining-menu-json-url; falling back to eatec URL"
        );
        fallback
    }

    fn split_item_name(&self, name: &str) -> Vec<String> {
        let parts: Vec<&str> = if self.hall_id == "oldenborg" {
            let re = Regex::new(r"[,/]\s*").expect("static regex is valid");
            re.split(name).collect()
        } else {
            name.split(',').collect()
        };
        parts
            .into_iter()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn extract_dietary_tags(recipe: &Value) -> Vec<String> {
        let Some(choices_container) = recipe.get("dietaryChoices") else {
            return Vec::new();
        };
        let choices = match choices_container.get("dietaryChoice") {
            Some(Value::Array(items)) => items.clone(),
            Some(single @ Value::Object(_)) => vec![single.clone()],
            _ => Vec::new(),
        };

        choices
            .iter()
            .filter_map(|choice| {
                let text = choice.get("#text").and_then(Value::as_str).unwrap_or("");
                if text != "Yes" {
                    return None;
                }
                let tag_id = choice.get("@id").and_then(Value::as_str).unwrap_or("");
                if tag_id.is_empty() {
                    None
                } else {
                    Some(tag_id.to_string())
                }
            })
            .collect()
    }

    fn normalize_recipes(container: &Value) -> Vec<Value> {
        match container.get("recipe") {
            Some(Value::Array(items)) => items.clone(),
            Some(single @ Value::Object(_)) => vec![single.clone()],
            _ => Vec::new(),
        }
    }
}

#[async_trait::async_trait]
impl MenuParser for PomonaParser {
    fn vendor_name(&self) -> &'static str {
        "pomona"
    }

    fn hall_id(&self) -> &'static str {
        self.hall_id
    }

    async fn fetch_raw(&self, _target_date: NaiveDate) -> Result<String> {
        let client = build_http_client()?;
        let page_url = PAGE_URL_TEMPLATE.replace("{slug}", self.slug);

        let page_response = client.get(&page_url).send().await.context("pomona page request failed")?;
        let page_response = page_response.error_for_status().context("pomona page returned an error status")?;
        let page_html = page_response.text().await.context("failed to read pomona page body")?;

        let json_url = self.discover_json_url(&page_html);
        let json_response = client.get(&json_url).send().await.context("pomona json request failed")?;
        let json_response = json_response.error_for_status().context("pomona json returned an error status")?;
        Ok(json_response.text().await.context("failed to read pomona json body")?)
    }

    fn parse(&self, raw: &str, target_date: NaiveDate) -> Result<Menu> {
        let data: Value = serde_json::from_str(raw).context("pomona feed is malformed JSON")?;
        let menu_entries = data
            .get("EatecExchange")
            .and_then(|v| v.get("menu"))
            .cloned()
            .unwrap_or(Value::Null);

        let entries: Vec<Value> = match menu_entries {
            Value::Array(items) => items,
            obj @ Value::Object(_) => vec![obj],
            _ => return Err(anyhow!("pomona feed missing EatecExchange.menu")),
        };

        let target_str = target_date.format("%Y%m%d").to_string();
        let mut meal_order: Vec<String> = Vec::new();
        let mut meals_by_period: std::collections::HashMap<String, Vec<Station>> = std::collections::HashMap::new();

        for entry in &entries {
            let serve_date = entry.get("@servedate").and_then(Value::as_str).unwrap_or("");
            if serve_date != target_str {
                continue;
            }

            let meal_period = entry.get("@mealperiodname").and_then(Value::as_str).unwrap_or("");
            let bulletin = entry.get("@menubulletin").and_then(Value::as_str).unwrap_or("");
            if meal_period.eq_ignore_ascii_case("closed") || bulletin.eq_ignore_ascii_case("closed") {
                continue;
            }
            if meal_period.is_empty() {
                continue;
            }

            let recipes_container = entry.get("recipes").cloned().unwrap_or(Value::Null);
            let recipes = Self::normalize_recipes(&recipes_container);

            let mut station_order: Vec<String> = Vec::new();
            let mut station_items: std::collections::HashMap<String, Vec<Item>> = std::collections::HashMap::new();
            let mut station_display: std::collections::HashMap<String, String> = std::collections::HashMap::new();

            for recipe in &recipes {
                let display = recipe.get("@displayonwebsite").and_then(Value::as_str).unwrap_or("Y");
                if display != "Y" {
                    continue;
                }

                let raw_name = recipe.get("@shortName").and_then(Value::as_str).unwrap_or("").trim();
                if raw_name.is_empty() {
                    continue;
                }

                let category = recipe.get("@category").and_then(Value::as_str).unwrap_or("").trim();
                let category = if category.is_empty() { "Miscellaneous" } else { category };
                let cat_key = category.to_lowercase();

                let tags = tags::normalize(Self::extract_dietary_tags(recipe));
                let item_names = self.split_item_name(raw_name);

                if !station_items.contains_key(&cat_key) {
                    station_order.push(cat_key.clone());
                    station_items.insert(cat_key.clone(), Vec::new());
                    station_display.insert(cat_key.clone(), category.to_string());
                }

                for item_name in item_names {
                    station_items.get_mut(&cat_key).unwrap().push(Item::new(item_name, tags.clone()));
                }
            }

            let stations: Vec<Station> = station_order
                .into_iter()
                .map(|key| {
                    let display_name = station_display.remove(&key).unwrap();
                    let items = station_items.remove(&key).unwrap();
                    Station::new(display_name, items)
                })
                .collect();

            let filtered = apply_station_filters(stations, &pomona_filter());

            let meal_key = meal_period.to_lowercase();
            match meals_by_period.get_mut(&meal_key) {
                Some(existing) => existing.extend(filtered),
                None => {
                    meal_order.push(meal_key.clone());
                    meals_by_period.insert(meal_key, filtered);
                }
            }
        }

        let meals: Vec<Meal> = meal_order
            .into_iter()
            .filter_map(|key| {
                let stations = meals_by_period.remove(&key)?;
                if stations.is_empty() {
                    None
                } else {
                    Some(Meal::new(key, stations))
                }
            })
            .collect();

        Ok(Menu::new(self.hall_id, target_date, meals))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(shortname: &str) -> String {
        format!(
            r#"{{"EatecExchange":{{"menu":{{"@servedate":"20260207","@mealperiodname":"Lunch","@menubulletin":"","recipes":{{"recipe":{{"@shortName":"{shortname}","@category":"Grill","@displayonwebsite":"Y"}}}}}}}}}}"#
        )
    }

    #[test]
    fn oldenborg_splits_on_comma_and_slash() {
        let parser = PomonaParser::new("oldenborg", "Oldenborg", "oldenborg");
        let menu = parser
            .parse(&fixture("Pasta/Salad, Bread"), NaiveDate::from_ymd_opt(2026, 2, 7).unwrap())
            .unwrap();
        let meal = menu.find_meal("lunch").unwrap();
        let names: Vec<&str> = meal.stations[0].items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Pasta", "Salad", "Bread"]);
    }

    #[test]
    fn frank_splits_on_comma_only() {
        let parser = PomonaParser::new("frank", "Frank", "frank");
        let menu = parser
            .parse(&fixture("Pasta/Salad, Bread"), NaiveDate::from_ymd_opt(2026, 2, 7).unwrap())
            .unwrap();
        let meal = menu.find_meal("lunch").unwrap();
        let names: Vec<&str> = meal.stations[0].items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Pasta/Salad", "Bread"]);
    }

    #[test]
    fn singleton_recipe_dict_and_single_element_list_are_equivalent() {
        let parser = PomonaParser::new("frank", "Frank", "frank");
        let singleton = fixture("Pasta, Bread");
        let as_list = singleton.replacen(
            r#""recipe":{"@shortName":"Pasta, Bread","@category":"Grill","@displayonwebsite":"Y"}"#,
            r#""recipe":[{"@shortName":"Pasta, Bread","@category":"Grill","@displayonwebsite":"Y"}]"#,
            1,
        );
        let date = NaiveDate::from_ymd_opt(2026, 2, 7).unwrap();
        let a = parser.parse(&singleton, date).unwrap();
        let b = parser.parse(&as_list, date).unwrap();
        assert_eq!(a.meals, b.meals);
    }
}
