//! Core Data Models
//!
//! This module defines the data structures shared by every stage of the CDR
//! pipeline, from tariff rules to per-client revenue reports.
//!
//! ## Data Flow
//!
//! 1. **Tariffs**: [`PrefixRule`] - one row of the prefix table
//! 2. **Raw Data**: [`CallRecord`] - one classified and costed CSV row
//! 3. **Aggregation**: [`CallSummary`], [`CallerAnalysis`], [`MonthlySummary`]
//! 4. **Clients**: [`Client`], [`ClientPricing`], [`GlobalPricing`],
//!    [`ClientNumberAssignment`] - read-only lookups supplied by the host
//! 5. **Reports**: [`ClientReport`] - revenue and margin per client
//!
//! ## Features
//!
//! - **Serde Integration**: every public type serializes to camelCase JSON
//! - **Exact Money**: all monetary values are [`Decimal`]
//! - **Derived Fields**: `category` and `cost` on a [`CallRecord`] are always
//!   re-derivable from the called number, the duration and the prefix table

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Broad tariff category of a dialed number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryType {
    Mobile,
    Landline,
    Special,
    International,
    Unknown,
}

impl CategoryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryType::Mobile => "mobile",
            CategoryType::Landline => "landline",
            CategoryType::Special => "special",
            CategoryType::International => "international",
            CategoryType::Unknown => "unknown",
        }
    }
}

impl FromStr for CategoryType {
    type Err = std::convert::Infallible;

    /// Unrecognized names read as `Unknown`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "mobile" => CategoryType::Mobile,
            "landline" => CategoryType::Landline,
            "special" => CategoryType::Special,
            "international" => CategoryType::International,
            _ => CategoryType::Unknown,
        })
    }
}

impl fmt::Display for CategoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PrefixRule {
    pub prefix: String,
    pub category: CategoryType,
    pub description: String,
    pub cost_per_minute: Decimal,
}

impl PrefixRule {
    pub fn new(
        prefix: impl Into<String>,
        category: CategoryType,
        description: impl Into<String>,
        cost_per_minute: Decimal,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            category,
            description: description.into(),
            cost_per_minute,
        }
    }

    /// International rules carry the `00` dialing marker.
    pub fn is_international(&self) -> bool {
        self.prefix.starts_with("00")
    }
}

/// Category assigned to a call: the broad type plus the tariff description
/// ("Firenze", "TIM", "Francia Mobile", ...).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(rename = "type")]
    pub category_type: CategoryType,
    pub description: String,
}

/// Result of classifying one number against a prefix table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub category: Category,
    pub cost_per_minute: Decimal,
    /// Prefix of the matching rule, `None` when the unknown fallback applied
    pub matched_prefix: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CallRecord {
    pub id: String,
    pub timestamp: Option<NaiveDateTime>,
    pub time: String,
    pub date: String,
    pub caller_number: String,
    pub called_number: String,
    pub duration: String,
    pub duration_seconds: u64,
    pub category: Category,
    pub cost: Decimal,
}

impl CallRecord {
    /// A call that lasted but costs nothing usually means a missing tariff.
    pub fn needs_review(&self) -> bool {
        self.duration_seconds > 0 && self.cost.is_zero()
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CallSummary {
    pub category: String,
    pub count: u64,
    pub total_seconds: u64,
    pub total_minutes: f64,
    pub total_hours: f64,
    pub formatted_duration: String,
    pub cost: Decimal,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CallerAnalysis {
    pub caller_number: String,
    pub total_calls: u64,
    pub categories: Vec<CallSummary>,
    pub total_duration: u64,
    pub formatted_total_duration: String,
}

impl CallerAnalysis {
    pub fn total_cost(&self) -> Decimal {
        self.categories.iter().map(|c| c.cost).sum()
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySummary {
    pub month: String,
    pub total_calls: u64,
    pub total_seconds: u64,
    pub formatted_duration: String,
    pub cost: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClientPricing {
    pub client_id: String,
    #[serde(default)]
    pub mobile_rate: Decimal,
    #[serde(default)]
    pub landline_rate: Decimal,
    #[serde(default)]
    pub monthly_flat_fee: Decimal,
    #[serde(default)]
    pub forfait_only: bool,
}

/// Rates shared by every client. Unset rates fall back to the prefix table.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GlobalPricing {
    #[serde(default)]
    pub international_rate: Option<Decimal>,
    #[serde(default)]
    pub premium_rate: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClientNumberAssignment {
    pub client_id: String,
    pub caller_number: String,
}

/// Billing classes used when invoicing a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingClass {
    Mobile,
    Landline,
    International,
    Special,
}

impl BillingClass {
    pub fn from_category(category: CategoryType) -> Option<Self> {
        match category {
            CategoryType::Mobile => Some(BillingClass::Mobile),
            CategoryType::Landline => Some(BillingClass::Landline),
            CategoryType::International => Some(BillingClass::International),
            CategoryType::Special => Some(BillingClass::Special),
            CategoryType::Unknown => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BilledMinutes {
    pub mobile: u64,
    pub landline: u64,
    pub international: u64,
    pub special: u64,
}

impl BilledMinutes {
    pub fn add(&mut self, class: BillingClass, minutes: u64) {
        let slot = match class {
            BillingClass::Mobile => &mut self.mobile,
            BillingClass::Landline => &mut self.landline,
            BillingClass::International => &mut self.international,
            BillingClass::Special => &mut self.special,
        };
        *slot = slot.saturating_add(minutes);
    }

    pub fn total(&self) -> u64 {
        [self.mobile, self.landline, self.international, self.special]
            .into_iter()
            .fold(0, u64::saturating_add)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClientReport {
    pub client_id: String,
    pub client_name: String,
    pub numbers_count: usize,
    pub total_calls: u64,
    pub total_seconds: u64,
    pub total_cost: Decimal,
    pub billed_minutes: BilledMinutes,
    pub usage_revenue: Decimal,
    pub flat_fee: Decimal,
    pub revenue: Decimal,
    pub margin: Decimal,
    pub margin_pct: f64,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationTotals {
    pub total_calls: u64,
    pub total_seconds: u64,
    pub total_cost: Decimal,
    pub revenue: Decimal,
    pub margin: Decimal,
    pub margin_pct: f64,
}

/// Counters collected while importing one CSV text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportStats {
    pub rows_read: usize,
    pub records: usize,
    pub skipped: usize,
    pub warnings: usize,
}
