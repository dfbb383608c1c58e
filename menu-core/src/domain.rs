use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Canonical dietary tags. The set is closed — vendors speak in their own
/// dietary-label vocabularies, and the tag normalizer is the only thing
/// allowed to produce one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tag {
    Balanced,
    FarmToFork,
    GlutenFree,
    Halal,
    Humane,
    Mindful,
    Vegan,
    Vegetarian,
}

impl Tag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tag::Balanced => "balanced",
            Tag::FarmToFork => "farm-to-fork",
            Tag::GlutenFree => "gluten-free",
            Tag::Halal => "halal",
            Tag::Humane => "humane",
            Tag::Mindful => "mindful",
            Tag::Vegan => "vegan",
            Tag::Vegetarian => "vegetarian",
        }
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single menu item with its normalized dietary tags.
///
/// Equality is by lowercased name only, matching the vendor-side
/// deduplication rule — two items with the same name but different
/// tag sets are still "the same item" for dedup purposes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub tags: Vec<Tag>,
}

impl Item {
    /// Build an item, sorting and deduplicating its tags.
    pub fn new(name: impl Into<String>, mut tags: Vec<Tag>) -> Self {
        tags.sort();
        tags.dedup();
        Self {
            name: name.into(),
            tags,
        }
    }

    pub fn name_key(&self) -> String {
        self.name.to_lowercase()
    }
}

impl PartialEq for Item {
    fn eq(&self, other: &Self) -> bool {
        self.name.eq_ignore_ascii_case(&other.name)
    }
}
impl Eq for Item {}

/// A counter within a meal (e.g. "Grill", "Entree").
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Station {
    pub name: String,
    pub items: Vec<Item>,
}

impl Station {
    pub fn new(name: impl Into<String>, items: Vec<Item>) -> Self {
        Self {
            name: name.into(),
            items,
        }
    }

    pub fn name_key(&self) -> String {
        self.name.to_lowercase()
    }
}

/// A meal period (breakfast, lunch, dinner, ...) with its stations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Meal {
    pub period: String,
    pub stations: Vec<Station>,
}

impl Meal {
    pub fn new(period: impl Into<String>, stations: Vec<Station>) -> Self {
        Self {
            period: period.into(),
            stations,
        }
    }
}

/// The complete normalized menu for a single hall and date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Menu {
    pub hall_id: String,
    pub date: NaiveDate,
    pub meals: Vec<Meal>,
}

impl Menu {
    pub fn new(hall_id: impl Into<String>, date: NaiveDate, meals: Vec<Meal>) -> Self {
        Self {
            hall_id: hall_id.into(),
            date,
            meals,
        }
    }

    /// Find a meal by case-insensitive match on its period name.
    pub fn find_meal(&self, period: &str) -> Option<&Meal> {
        self.meals
            .iter()
            .find(|m| m.period.eq_ignore_ascii_case(period))
    }
}

/// The food-service vendor operating a hall. Drives which parser runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vendor {
    Sodexo,
    BonAppetit,
    Pomona,
}

/// Outcome of a single parser invocation, recorded for health monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Success,
    NoData,
    Error,
    Fallback,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Success => "success",
            RunStatus::NoData => "no_data",
            RunStatus::Error => "error",
            RunStatus::Fallback => "fallback",
        }
    }
}

/// A single parser execution, kept for operational visibility into
/// fetch health across halls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserRun {
    pub hall_id: String,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub status: RunStatus,
    pub error_message: Option<String>,
    pub menu_date: NaiveDate,
}

impl ParserRun {
    pub fn error_message_truncated(msg: &str) -> String {
        msg.chars().take(500).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_new_sorts_and_dedups_tags() {
        let item = Item::new("Tofu Bowl", vec![Tag::Vegan, Tag::GlutenFree, Tag::Vegan]);
        assert_eq!(item.tags, vec![Tag::GlutenFree, Tag::Vegan]);
    }

    #[test]
    fn item_equality_is_case_insensitive_on_name() {
        let a = Item::new("Chicken", vec![]);
        let b = Item::new("chicken", vec![Tag::Halal]);
        assert_eq!(a, b);
    }

    #[test]
    fn tag_ordering_matches_alphabetical_canonical_strings() {
        let mut tags = vec![Tag::Vegetarian, Tag::Balanced, Tag::Halal];
        tags.sort();
        let strs: Vec<&str> = tags.iter().map(Tag::as_str).collect();
        assert_eq!(strs, vec!["balanced", "halal", "vegetarian"]);
    }

    #[test]
    fn menu_find_meal_is_case_insensitive() {
        let menu = Menu::new(
            "hoch",
            NaiveDate::from_ymd_opt(2026, 2, 7).unwrap(),
            vec![Meal::new("Lunch", vec![])],
        );
        assert!(menu.find_meal("lunch").is_some());
        assert!(menu.find_meal("LUNCH").is_some());
        assert!(menu.find_meal("dinner").is_none());
    }
}
