//! Number Classification
//!
//! Longest-prefix-wins matching of a [`NormalizedNumber`] against a
//! [`PrefixTable`]. International and domestic numbers are matched against
//! disjoint partitions of the table: a number carrying the `00` marker can
//! only hit international rules, everything else only domestic ones.
//!
//! When no rule matches, the configured fallback applies. The two fallbacks
//! are deliberately different: an unknown domestic number is treated as
//! free ("Altro", 0 by default), an unknown international one as expensive
//! (0.50 by default). Both are [`ClassifierConfig`] values, not constants.

use crate::config::ClassifierConfig;
use crate::models::{Category, CategoryType, Classification, PrefixRule};
use crate::normalizer::{NormalizedNumber, NumberNormalizer};
use crate::prefix_table::PrefixTable;

#[derive(Debug, Clone)]
pub struct Classifier {
    config: ClassifierConfig,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(ClassifierConfig::default())
    }
}

impl Classifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Normalize and classify a raw number field.
    pub fn classify_raw(&self, raw: &str, table: &PrefixTable) -> Classification {
        self.classify(&NumberNormalizer::normalize(raw), table)
    }

    pub fn classify(&self, number: &NormalizedNumber, table: &PrefixTable) -> Classification {
        if !number.is_classifiable() {
            return self.unknown_domestic();
        }

        if number.is_international {
            match Self::first_match(table.international_rules(), &number.cleaned) {
                Some(rule) => Self::from_rule(rule),
                None => self.unknown_international(),
            }
        } else {
            match Self::first_match(table.domestic_rules(), &number.cleaned) {
                Some(rule) => Self::from_rule(rule),
                None => self.unknown_domestic(),
            }
        }
    }

    // Rules arrive most specific first, so the first hit is the longest match.
    fn first_match<'a>(
        mut rules: impl Iterator<Item = &'a PrefixRule>,
        digits: &str,
    ) -> Option<&'a PrefixRule> {
        rules.find(|rule| digits.starts_with(rule.prefix.as_str()))
    }

    fn from_rule(rule: &PrefixRule) -> Classification {
        Classification {
            category: Category {
                category_type: rule.category,
                description: rule.description.clone(),
            },
            cost_per_minute: rule.cost_per_minute,
            matched_prefix: Some(rule.prefix.clone()),
        }
    }

    fn unknown_domestic(&self) -> Classification {
        Classification {
            category: Category {
                category_type: CategoryType::Unknown,
                description: self.config.unknown_domestic_label.clone(),
            },
            cost_per_minute: self.config.unknown_domestic_rate,
            matched_prefix: None,
        }
    }

    fn unknown_international(&self) -> Classification {
        Classification {
            category: Category {
                category_type: CategoryType::Unknown,
                description: self.config.unknown_international_label.clone(),
            },
            cost_per_minute: self.config.unknown_international_rate,
            matched_prefix: None,
        }
    }
}
