use super::base::{build_http_client, MenuParser};
use crate::filter::{apply_station_filters, sodexo_filter};
use crate::tags;
use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use menu_core::domain::{Item, Meal, Menu, Station};
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::debug;

const URL_TEMPLATE: &str =
    "https://menus.sodexomyway.com/BiteMenu/MenuOnly?menuId=15258&locationId=13147001&startdate={date}";

/// Parser for the single Sodexo-operated hall, Hoch-Shanahan.
pub struct SodexoParser {
    hall_id: &'static str,
}

impl SodexoParser {
    pub fn new() -> Self {
        Self { hall_id: "hoch" }
    }

    fn build_url(&self, target_date: NaiveDate) -> String {
        URL_TEMPLATE.replace("{date}", &target_date.format("%m/%d/%Y").to_string())
    }

    /// Extract the JSON text embedded in the `#nutData` div. Tries a CSS
    /// selector first, falling back to a tolerant regex for malformed HTML.
    fn extract_json(html: &str) -> Result<String> {
        let document = Html::parse_document(html);
        if let Ok(selector) = Selector::parse("#nutData") {
            if let Some(el) = document.select(&selector).next() {
                let text: String = el.text().collect();
                let text = text.trim();
                if !text.is_empty() {
                    return Ok(text.to_string());
                }
            }
        }

        debug!("css extraction of #nutData empty, trying regex fallback");
        let re = regex::Regex::new(r#"(?s)<div[^>]*id\s*=\s*["']nutData["'][^>]*>(.*?)</div>"#)
            .expect("static regex is valid");
        if let Some(caps) = re.captures(html) {
            let text = caps[1].trim();
            if !text.is_empty() {
                return Ok(text.to_string());
            }
        }

        Err(anyhow!(
            "could not extract menu JSON from Sodexo HTML: #nutData div not found or empty"
        ))
    }

    fn parse_items(menu_items: &[Value]) -> Vec<Item> {
        menu_items
            .iter()
            .filter_map(|item| {
                let name = item.get("formalName").and_then(Value::as_str).unwrap_or("").trim();
                if name.is_empty() {
                    return None;
                }

                let mut raw_tags = Vec::new();
                if item.get("isVegan").and_then(Value::as_bool).unwrap_or(false) {
                    raw_tags.push("isvegan");
                }
                if item.get("isVegetarian").and_then(Value::as_bool).unwrap_or(false) {
                    raw_tags.push("isvegetarian");
                }
                if item.get("isMindful").and_then(Value::as_bool).unwrap_or(false) {
                    raw_tags.push("ismindful");
                }

                Some(Item::new(name, tags::normalize(raw_tags)))
            })
            .collect()
    }

    fn parse_day_part(day_part: &Value) -> Option<Meal> {
        let meal_name = day_part
            .get("dayPartName")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_lowercase();
        if meal_name.is_empty() {
            return None;
        }

        let mut order: Vec<String> = Vec::new();
        let mut stations: std::collections::HashMap<String, Station> = std::collections::HashMap::new();

        for course in day_part.get("courses").and_then(Value::as_array).into_iter().flatten() {
            let raw_name = course.get("courseName").and_then(Value::as_str).unwrap_or("");
            let normalized = normalize_station_name(raw_name);

            let items = Self::parse_items(
                course.get("menuItems").and_then(Value::as_array).map(Vec::as_slice).unwrap_or(&[]),
            );

            if normalized == "Miscellaneous" && items.is_empty() {
                continue;
            }

            let key = normalized.to_lowercase();
            match stations.get_mut(&key) {
                Some(existing) => existing.items.extend(items),
                None => {
                    order.push(key.clone());
                    stations.insert(key, Station::new(normalized, items));
                }
            }
        }

        let ordered_stations: Vec<Station> = order.into_iter().map(|k| stations.remove(&k).unwrap()).collect();
        let filtered = apply_station_filters(ordered_stations, &sodexo_filter());
        if filtered.is_empty() {
            return None;
        }

        Some(Meal::new(meal_name, filtered))
    }
}

impl Default for SodexoParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalize a Sodexo station name: strip a trailing " SCR" suffix, title-case
/// all-caps names with a few fixups, and map blank/dash names to
/// "Miscellaneous".
fn normalize_station_name(raw_name: &str) -> String {
    let name = raw_name.trim();
    if name.is_empty() || name == "-" {
        return "Miscellaneous".to_string();
    }

    let name = name.strip_suffix(" SCR").map(str::trim_end).unwrap_or(name);

    let has_cased = name.chars().any(|c| c.is_alphabetic());
    if has_cased && name.chars().all(|c| !c.is_alphabetic() || c.is_uppercase()) {
        let titled = title_case(name);
        let titled = titled.replace(" And ", " and ").replace(" To ", " to ").replace("Hmc", "HMC");
        return titled.trim().to_string();
    }

    name.trim().to_string()
}

fn title_case(name: &str) -> String {
    name.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[async_trait::async_trait]
impl MenuParser for SodexoParser {
    fn vendor_name(&self) -> &'static str {
        "sodexo"
    }

    fn hall_id(&self) -> &'static str {
        self.hall_id
    }

    async fn fetch_raw(&self, target_date: NaiveDate) -> Result<String> {
        let client = build_http_client()?;
        let url = self.build_url(target_date);
        let response = client.get(&url).send().await.context("sodexo request failed")?;
        let response = response.error_for_status().context("sodexo returned an error status")?;
        Ok(response.text().await.context("failed to read sodexo response body")?)
    }

    fn parse(&self, raw: &str, target_date: NaiveDate) -> Result<Menu> {
        let json_text = Self::extract_json(raw)?;
        let days: Vec<Value> = serde_json::from_str(&json_text).context("sodexo menu JSON is malformed")?;

        let target_str = target_date.format("%Y-%m-%d").to_string();
        let mut meals = Vec::new();

        for day in &days {
            let day_date = day.get("date").and_then(Value::as_str).unwrap_or("");
            let day_date = day_date.get(0..10).unwrap_or("");
            if day_date != target_str {
                continue;
            }

            for day_part in day.get("dayParts").and_then(Value::as_array).into_iter().flatten() {
                if let Some(meal) = Self::parse_day_part(day_part) {
                    meals.push(meal);
                }
            }
        }

        Ok(Menu::new(self.hall_id, target_date, meals))
    }
}
