use menu_core::domain::Tag;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use tracing::warn;

/// Vendor dietary-label vocabularies, lowercased, mapped to the canonical
/// closed tag set. Vendors each invent their own label text for the same
/// handful of concepts; this table is the single place that knowledge lives.
static DIETARY_TAG_MAP: Lazy<HashMap<&'static str, Tag>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert("isvegan", Tag::Vegan);
    m.insert("isvegetarian", Tag::Vegetarian);
    m.insert("ismindful", Tag::Mindful);
    m.insert("vegan", Tag::Vegan);
    m.insert("vegetarian", Tag::Vegetarian);
    m.insert(
        "made without gluten-containing ingredients",
        Tag::GlutenFree,
    );
    m.insert("gluten free", Tag::GlutenFree);
    m.insert("in balance", Tag::Balanced);
    m.insert("farm to fork", Tag::FarmToFork);
    m.insert("humane", Tag::Humane);
    m.insert("halal", Tag::Halal);
    m
});

/// Map vendor-raw dietary labels to the canonical tag set. Unknown labels
/// are dropped with a warning; the normalizer itself never fails.
pub fn normalize<I, S>(raw_tags: I) -> Vec<Tag>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut tags: Vec<Tag> = raw_tags
        .into_iter()
        .filter_map(|raw| {
            let key = raw.as_ref().trim().to_lowercase();
            match DIETARY_TAG_MAP.get(key.as_str()) {
                Some(tag) => Some(*tag),
                None => {
                    if !key.is_empty() {
                        warn!(raw_tag = %key, "dropping unknown dietary tag");
                    }
                    None
                }
            }
        })
        .collect();
    tags.sort();
    tags.dedup();
    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_maps_known_vendor_labels() {
        let tags = normalize(["isVegan", "IsMindful", "halal"]);
        assert_eq!(tags, vec![Tag::Halal, Tag::Mindful, Tag::Vegan]);
    }

    #[test]
    fn normalize_drops_unknown_labels_without_failing() {
        let tags = normalize(["isVegan", "contains nuts"]);
        assert_eq!(tags, vec![Tag::Vegan]);
    }

    #[test]
    fn normalize_is_sorted_and_deduplicated() {
        let tags = normalize(["vegan", "isVegan", "Vegan"]);
        assert_eq!(tags, vec![Tag::Vegan]);
    }

    #[test]
    fn normalize_is_idempotent() {
        let raw = ["gluten free", "in balance", "isVegetarian"];
        let once = normalize(raw);
        let strs: Vec<String> = once.iter().map(|t| t.as_str().to_string()).collect();
        let twice = normalize(strs);
        assert_eq!(once, twice);
    }
}
