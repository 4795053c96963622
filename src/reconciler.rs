//! Client Revenue Reconciliation
//!
//! Maps caller numbers to billing clients and sets what each client is
//! invoiced against what its traffic cost.
//!
//! ## Revenue rules
//!
//! - Caller categories are re-bucketed into four billing classes (mobile,
//!   landline, international, special). Unknown-category calls count towards
//!   calls, seconds and cost but earn no usage revenue.
//! - Each class bills `max(calls, ceil(seconds / 60))` minutes per caller, so
//!   N short calls bill at least N minutes.
//! - [`RevenueMode::PerMinute`] multiplies billed minutes by the client's
//!   mobile/landline rates and the global international/premium rates.
//!   Unset global rates fall back to the average of the matching prefix
//!   table rules (zero when there are none).
//! - [`RevenueMode::CostPlus`] charges the traffic cost plus a markup.
//! - `forfait_only` clients earn no usage revenue at all.
//! - The monthly flat fee is added once per client, however many numbers it
//!   owns.
//! - Callers without an assignment are reported under a synthetic
//!   `no-client` entry with no pricing.

use crate::aggregator::Aggregator;
use crate::config::ReconcilerConfig;
use crate::cost::CostCalculator;
use crate::models::*;
use crate::normalizer::NumberNormalizer;
use crate::prefix_table::PrefixTable;
use crate::timestamp_parser::TimestampParser;
use anyhow::{Context, Result};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

pub const UNASSIGNED_CLIENT_ID: &str = "no-client";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum RevenueMode {
    PerMinute,
    CostPlus { markup_pct: Decimal },
}

impl RevenueMode {
    pub fn from_config(config: &ReconcilerConfig) -> Self {
        match config.mode.as_str() {
            "cost_plus" => RevenueMode::CostPlus {
                markup_pct: config.markup_pct,
            },
            _ => RevenueMode::PerMinute,
        }
    }
}

/// Everything the host knows about its clients.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientBook {
    #[serde(default)]
    pub clients: Vec<Client>,
    #[serde(default)]
    pub pricing: Vec<ClientPricing>,
    #[serde(default)]
    pub global_pricing: GlobalPricing,
    #[serde(default)]
    pub assignments: Vec<ClientNumberAssignment>,
}

impl ClientBook {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read client book: {}", path.display()))?;
        let book: ClientBook = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse client book: {}", path.display()))?;
        Ok(book)
    }

    pub fn client(&self, client_id: &str) -> Option<&Client> {
        self.clients.iter().find(|c| c.id == client_id)
    }

    pub fn pricing_for(&self, client_id: &str) -> Option<&ClientPricing> {
        self.pricing.iter().find(|p| p.client_id == client_id)
    }

    /// Normalized caller number -> client id. The first assignment of a
    /// number wins.
    pub fn assignment_map(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();
        for assignment in &self.assignments {
            let key = caller_key(&assignment.caller_number);
            if let Some(existing) = map.get(&key) {
                if existing != &assignment.client_id {
                    warn!(
                        caller_number = %assignment.caller_number,
                        kept = %existing,
                        ignored = %assignment.client_id,
                        "Caller number assigned to more than one client"
                    );
                }
                continue;
            }
            map.insert(key, assignment.client_id.clone());
        }
        map
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Reconciliation {
    pub clients: Vec<ClientReport>,
    pub totals: ReconciliationTotals,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyReconciliation {
    pub month: String,
    pub reconciliation: Reconciliation,
}

#[derive(Default)]
struct ClientAccumulator {
    numbers: BTreeSet<String>,
    total_calls: u64,
    total_seconds: u64,
    total_cost: Decimal,
    billed_minutes: BilledMinutes,
}

#[derive(Debug, Clone, Copy)]
struct ClassRates {
    international: Decimal,
    premium: Decimal,
}

pub struct ClientRevenueReconciler<'a> {
    book: &'a ClientBook,
    table: &'a PrefixTable,
    mode: RevenueMode,
    unassigned_label: String,
}

impl<'a> ClientRevenueReconciler<'a> {
    pub fn new(book: &'a ClientBook, table: &'a PrefixTable, mode: RevenueMode) -> Self {
        Self {
            book,
            table,
            mode,
            unassigned_label: ReconcilerConfig::default().unassigned_label,
        }
    }

    pub fn with_unassigned_label(mut self, label: impl Into<String>) -> Self {
        self.unassigned_label = label.into();
        self
    }

    pub fn reconcile(&self, callers: &[CallerAnalysis]) -> Reconciliation {
        let assignments = self.book.assignment_map();
        let mut accumulators: BTreeMap<String, ClientAccumulator> = BTreeMap::new();

        // Every known client appears, so flat fees count even without traffic.
        for client in &self.book.clients {
            accumulators.entry(client.id.clone()).or_default();
        }
        for (number, client_id) in &assignments {
            if self.book.client(client_id).is_some() {
                accumulators
                    .entry(client_id.clone())
                    .or_default()
                    .numbers
                    .insert(number.clone());
            }
        }

        for caller in callers {
            let key = caller_key(&caller.caller_number);
            let client_id = match assignments.get(&key) {
                Some(id) if self.book.client(id).is_some() => id.as_str(),
                Some(id) => {
                    warn!(
                        caller_number = %caller.caller_number,
                        client_id = %id,
                        "Caller assigned to an unknown client"
                    );
                    UNASSIGNED_CLIENT_ID
                }
                None => UNASSIGNED_CLIENT_ID,
            };

            let acc = accumulators.entry(client_id.to_string()).or_default();
            acc.numbers.insert(key);
            acc.total_calls = acc.total_calls.saturating_add(caller.total_calls);
            acc.total_seconds = acc.total_seconds.saturating_add(caller.total_duration);
            for summary in &caller.categories {
                acc.total_cost += summary.cost;
                let category: CategoryType = summary.category.parse().unwrap_or(CategoryType::Unknown);
                if let Some(class) = BillingClass::from_category(category) {
                    acc.billed_minutes.add(
                        class,
                        CostCalculator::billed_minutes_for_calls(summary.count, summary.total_seconds),
                    );
                }
            }
        }

        let rates = self.class_rates();
        let mut clients: Vec<ClientReport> = accumulators
            .into_iter()
            .map(|(client_id, acc)| self.client_report(client_id, acc, rates))
            .collect();

        clients.sort_by(|a, b| {
            b.revenue
                .cmp(&a.revenue)
                .then_with(|| a.client_name.cmp(&b.client_name))
        });

        let totals = totals_for(&clients);
        info!(
            clients = clients.len(),
            revenue = %totals.revenue,
            margin = %totals.margin,
            "Client reconciliation finished"
        );

        Reconciliation { clients, totals }
    }

    /// One reconciliation per calendar month of the records. Flat fees are
    /// charged once per client per month.
    pub fn reconcile_by_month(&self, records: &[CallRecord]) -> Vec<MonthlyReconciliation> {
        let mut months: BTreeMap<String, Vec<CallRecord>> = BTreeMap::new();
        for record in records {
            months
                .entry(TimestampParser::month_key(record.timestamp.as_ref()))
                .or_default()
                .push(record.clone());
        }

        months
            .into_iter()
            .map(|(month, records)| MonthlyReconciliation {
                month,
                reconciliation: self.reconcile(&Aggregator::generate_caller_analysis(&records)),
            })
            .collect()
    }

    fn class_rates(&self) -> ClassRates {
        let global = &self.book.global_pricing;
        ClassRates {
            international: global
                .international_rate
                .unwrap_or_else(|| self.table.average_rate(CategoryType::International, false)),
            premium: global
                .premium_rate
                .unwrap_or_else(|| self.table.average_rate(CategoryType::Special, true)),
        }
    }

    fn client_report(&self, client_id: String, acc: ClientAccumulator, rates: ClassRates) -> ClientReport {
        let client_name = if client_id == UNASSIGNED_CLIENT_ID {
            self.unassigned_label.clone()
        } else {
            self.book
                .client(&client_id)
                .map(|c| c.name.clone())
                .unwrap_or_else(|| client_id.clone())
        };

        let pricing = if client_id == UNASSIGNED_CLIENT_ID {
            None
        } else {
            self.book.pricing_for(&client_id)
        };

        let usage_revenue = match pricing {
            Some(p) if p.forfait_only => Decimal::ZERO,
            Some(p) => self.usage_revenue(&acc, p.mobile_rate, p.landline_rate, rates),
            None => Decimal::ZERO,
        };
        let flat_fee = pricing.map(|p| p.monthly_flat_fee).unwrap_or(Decimal::ZERO);
        let revenue = usage_revenue + flat_fee;
        let margin = revenue - acc.total_cost;

        ClientReport {
            client_id,
            client_name,
            numbers_count: acc.numbers.len(),
            total_calls: acc.total_calls,
            total_seconds: acc.total_seconds,
            total_cost: acc.total_cost,
            billed_minutes: acc.billed_minutes,
            usage_revenue,
            flat_fee,
            revenue,
            margin,
            margin_pct: margin_pct(margin, revenue),
        }
    }

    fn usage_revenue(
        &self,
        acc: &ClientAccumulator,
        mobile_rate: Decimal,
        landline_rate: Decimal,
        rates: ClassRates,
    ) -> Decimal {
        let revenue = match self.mode {
            RevenueMode::PerMinute => {
                let minutes = &acc.billed_minutes;
                Decimal::from(minutes.mobile) * mobile_rate
                    + Decimal::from(minutes.landline) * landline_rate
                    + Decimal::from(minutes.international) * rates.international
                    + Decimal::from(minutes.special) * rates.premium
            }
            RevenueMode::CostPlus { markup_pct } => {
                acc.total_cost * (Decimal::ONE + markup_pct / Decimal::ONE_HUNDRED)
            }
        };
        revenue.round_dp(4)
    }
}

fn caller_key(caller_number: &str) -> String {
    NumberNormalizer::normalize(caller_number).cleaned
}

fn margin_pct(margin: Decimal, revenue: Decimal) -> f64 {
    if revenue.is_zero() {
        return 0.0;
    }
    let pct = (margin / revenue * Decimal::ONE_HUNDRED).round_dp(2);
    pct.to_f64().unwrap_or(0.0)
}

fn totals_for(clients: &[ClientReport]) -> ReconciliationTotals {
    let mut totals = ReconciliationTotals::default();
    for client in clients {
        totals.total_calls = totals.total_calls.saturating_add(client.total_calls);
        totals.total_seconds = totals.total_seconds.saturating_add(client.total_seconds);
        totals.total_cost += client.total_cost;
        totals.revenue += client.revenue;
    }
    totals.margin = totals.revenue - totals.total_cost;
    totals.margin_pct = margin_pct(totals.margin, totals.revenue);
    totals
}
