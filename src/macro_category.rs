//! Macro-category grouping
//!
//! Collapses fine-grained tariff descriptions into the coarse buckets shown
//! to callers:
//!
//! | category type   | bucket                                             |
//! |-----------------|----------------------------------------------------|
//! | `mobile`        | `Mobile`                                           |
//! | `landline`      | `Fisso`                                            |
//! | `special`       | the description itself (`Numero Verde`, ...)       |
//! | `international` | `{Country} Mobile`, `{Country} Fisso` or `{Country}` |
//! | `unknown`       | `Altro`                                            |
//!
//! The mapping is total and idempotent: every (type, description) pair maps
//! to exactly one bucket, and mapping a bucket name again returns it
//! unchanged.

use crate::models::{Category, CategoryType};
use crate::prefix_table::PrefixTable;
use std::collections::HashMap;

pub const MOBILE_BUCKET: &str = "Mobile";
pub const LANDLINE_BUCKET: &str = "Fisso";
pub const UNKNOWN_BUCKET: &str = "Altro";
pub const SPECIAL_BUCKET: &str = "Servizi Speciali";
pub const INTERNATIONAL_BUCKET: &str = "Internazionale";

const MOBILE_MARKERS: &[&str] = &["mobile", "cellulare", "mobil"];
const LANDLINE_MARKERS: &[&str] = &["fisso", "fissa", "landline"];

/// Precomputed `(type, normalized description) -> bucket` lookup.
#[derive(Debug, Clone, Default)]
pub struct MacroCategoryMap {
    buckets: HashMap<(CategoryType, String), String>,
}

impl MacroCategoryMap {
    pub fn from_table(table: &PrefixTable) -> Self {
        let mut buckets = HashMap::new();
        for rule in table.rules() {
            let key = (rule.category, normalize_description(&rule.description));
            buckets
                .entry(key)
                .or_insert_with(|| macro_bucket(rule.category, &rule.description));
        }
        Self { buckets }
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn bucket(&self, category_type: CategoryType, description: &str) -> String {
        self.buckets
            .get(&(category_type, normalize_description(description)))
            .cloned()
            .unwrap_or_else(|| macro_bucket(category_type, description))
    }

    pub fn bucket_for(&self, category: &Category) -> String {
        self.bucket(category.category_type, &category.description)
    }
}

/// Derive the bucket for one category without a lookup table.
pub fn macro_bucket(category_type: CategoryType, description: &str) -> String {
    let description = collapse_whitespace(description);
    match category_type {
        CategoryType::Mobile => MOBILE_BUCKET.to_string(),
        CategoryType::Landline => LANDLINE_BUCKET.to_string(),
        CategoryType::Unknown => UNKNOWN_BUCKET.to_string(),
        CategoryType::Special => {
            if description.is_empty() {
                SPECIAL_BUCKET.to_string()
            } else {
                description
            }
        }
        CategoryType::International => international_bucket(&description),
    }
}

fn international_bucket(description: &str) -> String {
    let words: Vec<&str> = description.split(' ').collect();

    let position_of = |markers: &[&str]| {
        words.iter().position(|w| {
            let w = w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase();
            markers.contains(&w.as_str())
        })
    };

    let (country_words, suffix) = match (position_of(MOBILE_MARKERS), position_of(LANDLINE_MARKERS)) {
        (Some(m), Some(l)) if l < m => (&words[..l], Some(LANDLINE_BUCKET)),
        (Some(m), _) => (&words[..m], Some(MOBILE_BUCKET)),
        (None, Some(l)) => (&words[..l], Some(LANDLINE_BUCKET)),
        (None, None) => (&words[..], None),
    };

    let country = country_name(&country_words.join(" "));
    if country.is_empty() {
        return INTERNATIONAL_BUCKET.to_string();
    }
    match suffix {
        Some(kind) => format!("{} {}", country, kind),
        None => country,
    }
}

/// "Regno Unito - Londra" and "Germania (Vodafone)" name their country first.
fn country_name(text: &str) -> String {
    let cut = text
        .find(" - ")
        .into_iter()
        .chain(text.find('('))
        .chain(text.find(','))
        .min()
        .unwrap_or(text.len());
    text[..cut].trim().trim_end_matches('-').trim().to_string()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn normalize_description(description: &str) -> String {
    collapse_whitespace(description).to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domestic_buckets() {
        assert_eq!(macro_bucket(CategoryType::Mobile, "TIM"), "Mobile");
        assert_eq!(macro_bucket(CategoryType::Mobile, "Iliad"), "Mobile");
        assert_eq!(macro_bucket(CategoryType::Landline, "Firenze"), "Fisso");
        assert_eq!(macro_bucket(CategoryType::Unknown, "Altro"), "Altro");
    }

    #[test]
    fn test_special_numbers_stay_distinct() {
        assert_eq!(macro_bucket(CategoryType::Special, "Numero Verde"), "Numero Verde");
        assert_eq!(macro_bucket(CategoryType::Special, "Numero Premium"), "Numero Premium");
        assert_eq!(macro_bucket(CategoryType::Special, "  "), "Servizi Speciali");
    }

    #[test]
    fn test_international_buckets() {
        let intl = CategoryType::International;
        assert_eq!(macro_bucket(intl, "Francia Mobile"), "Francia Mobile");
        assert_eq!(macro_bucket(intl, "Germania Mobile Vodafone"), "Germania Mobile");
        assert_eq!(macro_bucket(intl, "Regno Unito Fisso"), "Regno Unito Fisso");
        assert_eq!(macro_bucket(intl, "Spagna - Madrid"), "Spagna");
        assert_eq!(macro_bucket(intl, "Stati Uniti e Canada"), "Stati Uniti e Canada");
        assert_eq!(macro_bucket(intl, "Svizzera (Swisscom) Mobile"), "Svizzera Mobile");
        assert_eq!(macro_bucket(intl, "Mobile"), "Internazionale");
        assert_eq!(macro_bucket(intl, ""), "Internazionale");
    }

    #[test]
    fn test_idempotent() {
        let cases = [
            (CategoryType::Mobile, "Vodafone"),
            (CategoryType::Landline, "Roma"),
            (CategoryType::Special, "Numero Verde"),
            (CategoryType::International, "Germania Mobile Telekom"),
            (CategoryType::International, "Spagna - Madrid"),
            (CategoryType::Unknown, "Internazionale Sconosciuto"),
        ];
        for (category_type, description) in cases {
            let once = macro_bucket(category_type, description);
            let twice = macro_bucket(category_type, &once);
            assert_eq!(once, twice, "{:?} {}", category_type, description);
        }
    }

    #[test]
    fn test_map_is_total_over_default_table() {
        let table = PrefixTable::default();
        let map = MacroCategoryMap::from_table(&table);
        assert!(!map.is_empty());
        for rule in table.rules() {
            let bucket = map.bucket(rule.category, &rule.description);
            assert!(!bucket.is_empty(), "empty bucket for {}", rule.description);
        }
        assert_eq!(map.bucket(CategoryType::Unknown, "Internazionale Sconosciuto"), "Altro");
        assert_eq!(map.bucket(CategoryType::International, "Francia  mobile"), "Francia Mobile");
    }
}
