//! Prefix Table
//!
//! An immutable, validated list of [`PrefixRule`]s. Edits never mutate a
//! table in place: [`PrefixTable::with_rule`], [`PrefixTable::without_prefix`]
//! and [`PrefixTable::with_rate`] return a new table, so a classification or
//! recalculation pass always sees one consistent set of rates.
//!
//! At construction the rules are partitioned into a domestic and an
//! international match order, each sorted by prefix length descending and
//! then prefix ascending. The sort is stable, so when two rules share the
//! exact same prefix the one inserted first wins.

use crate::models::{CategoryType, PrefixRule};
use anyhow::{Context, Result};
use rust_decimal::Decimal;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum PrefixTableError {
    #[error("prefix must not be empty")]
    EmptyPrefix,

    #[error("prefix '{prefix}' must contain only digits after an optional leading '+'")]
    InvalidPrefix { prefix: String },

    #[error("prefix '{prefix}' has a negative rate ({rate})")]
    NegativeRate { prefix: String, rate: Decimal },

    #[error("no rule with prefix '{prefix}'")]
    UnknownPrefix { prefix: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrefixTable {
    rules: Vec<PrefixRule>,
    domestic_order: Vec<usize>,
    international_order: Vec<usize>,
}

impl PrefixTable {
    pub fn new(rules: Vec<PrefixRule>) -> Result<Self, PrefixTableError> {
        let rules = rules
            .into_iter()
            .map(validate_rule)
            .collect::<Result<Vec<_>, _>>()?;

        let mut domestic_order = Vec::new();
        let mut international_order = Vec::new();
        for (index, rule) in rules.iter().enumerate() {
            if rule.is_international() {
                international_order.push(index);
            } else {
                domestic_order.push(index);
            }
        }

        let by_specificity = |a: &usize, b: &usize| {
            let (ra, rb) = (&rules[*a], &rules[*b]);
            rb.prefix
                .len()
                .cmp(&ra.prefix.len())
                .then_with(|| ra.prefix.cmp(&rb.prefix))
        };
        domestic_order.sort_by(by_specificity);
        international_order.sort_by(by_specificity);

        Ok(Self {
            rules,
            domestic_order,
            international_order,
        })
    }

    pub fn empty() -> Self {
        Self {
            rules: Vec::new(),
            domestic_order: Vec::new(),
            international_order: Vec::new(),
        }
    }

    /// Rules in insertion order.
    pub fn rules(&self) -> &[PrefixRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Domestic rules, most specific first.
    pub fn domestic_rules(&self) -> impl Iterator<Item = &PrefixRule> {
        self.domestic_order.iter().map(move |i| &self.rules[*i])
    }

    /// International rules, most specific first.
    pub fn international_rules(&self) -> impl Iterator<Item = &PrefixRule> {
        self.international_order.iter().map(move |i| &self.rules[*i])
    }

    /// Returns a table where `rule` replaces every rule with the same prefix,
    /// or is appended when the prefix is new.
    pub fn with_rule(&self, rule: PrefixRule) -> Result<Self, PrefixTableError> {
        let rule = validate_rule(rule)?;
        let mut rules: Vec<PrefixRule> = Vec::with_capacity(self.rules.len() + 1);
        let mut replaced = false;
        for existing in &self.rules {
            if existing.prefix == rule.prefix {
                if !replaced {
                    rules.push(rule.clone());
                    replaced = true;
                }
            } else {
                rules.push(existing.clone());
            }
        }
        if !replaced {
            rules.push(rule);
        }
        Self::new(rules)
    }

    pub fn without_prefix(&self, prefix: &str) -> Self {
        let prefix = canonical_prefix(prefix);
        let rules = self
            .rules
            .iter()
            .filter(|r| r.prefix != prefix)
            .cloned()
            .collect();
        // Every remaining rule was already validated.
        Self::new(rules).unwrap_or_else(|_| Self::empty())
    }

    pub fn with_rate(&self, prefix: &str, rate: Decimal) -> Result<Self, PrefixTableError> {
        let prefix = canonical_prefix(prefix);
        if rate.is_sign_negative() && !rate.is_zero() {
            return Err(PrefixTableError::NegativeRate { prefix, rate });
        }
        if !self.rules.iter().any(|r| r.prefix == prefix) {
            return Err(PrefixTableError::UnknownPrefix { prefix });
        }
        let rules = self
            .rules
            .iter()
            .map(|r| {
                if r.prefix == prefix {
                    PrefixRule {
                        cost_per_minute: rate,
                        ..r.clone()
                    }
                } else {
                    r.clone()
                }
            })
            .collect();
        Self::new(rules)
    }

    /// Mean rate of the rules in `category`, ignoring zero-rate rules when
    /// `skip_free` is set. An empty selection yields zero.
    pub fn average_rate(&self, category: CategoryType, skip_free: bool) -> Decimal {
        let rates: Vec<Decimal> = self
            .rules
            .iter()
            .filter(|r| r.category == category)
            .filter(|r| !(skip_free && r.cost_per_minute.is_zero()))
            .map(|r| r.cost_per_minute)
            .collect();

        if rates.is_empty() {
            return Decimal::ZERO;
        }
        let total: Decimal = rates.iter().sum();
        (total / Decimal::from(rates.len())).round_dp(4)
    }

    /// Load a JSON array of rules.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read prefix table: {}", path.display()))?;
        let rules: Vec<PrefixRule> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse prefix table: {}", path.display()))?;
        let table = Self::new(rules)
            .with_context(|| format!("Invalid prefix table: {}", path.display()))?;
        Ok(table)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(&self.rules)
            .context("Failed to serialize prefix table")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write prefix table: {}", path.display()))?;
        Ok(())
    }
}

impl Default for PrefixTable {
    fn default() -> Self {
        crate::tariffs::default_prefix_table()
    }
}

/// `+33` and `0033` name the same international prefix.
fn canonical_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim();
    match trimmed.strip_prefix('+') {
        Some(rest) => format!("00{}", rest),
        None => trimmed.to_string(),
    }
}

fn validate_rule(mut rule: PrefixRule) -> Result<PrefixRule, PrefixTableError> {
    let trimmed = rule.prefix.trim();
    if trimmed.is_empty() || trimmed == "+" {
        return Err(PrefixTableError::EmptyPrefix);
    }
    let digits = trimmed.strip_prefix('+').unwrap_or(trimmed);
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(PrefixTableError::InvalidPrefix {
            prefix: rule.prefix.clone(),
        });
    }
    if rule.cost_per_minute.is_sign_negative() && !rule.cost_per_minute.is_zero() {
        return Err(PrefixTableError::NegativeRate {
            prefix: rule.prefix.clone(),
            rate: rule.cost_per_minute,
        });
    }
    rule.prefix = canonical_prefix(trimmed);
    Ok(rule)
}
