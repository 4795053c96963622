//! Cost recalculation
//!
//! Re-prices imported records after a prefix table edit without going back
//! to the source CSV. Only `category` and `cost` change; identity fields are
//! copied as they are. Both the CSV parser and the recalculator derive those
//! two fields through [`price_call`], so a recalculated record is identical
//! to the one a fresh import under the same table would produce.

use crate::classifier::Classifier;
use crate::cost::CostCalculator;
use crate::models::{CallRecord, Category};
use crate::prefix_table::PrefixTable;
use rust_decimal::Decimal;
use tracing::info;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Category and cost of one call under `table`.
pub fn price_call(
    classifier: &Classifier,
    table: &PrefixTable,
    called_number: &str,
    duration_seconds: u64,
) -> (Category, Decimal) {
    let classification = classifier.classify_raw(called_number, table);
    let cost = CostCalculator::calculate(duration_seconds, classification.cost_per_minute);
    (classification.category, cost)
}

pub fn recalculate_record(classifier: &Classifier, table: &PrefixTable, record: &CallRecord) -> CallRecord {
    let (category, cost) = price_call(classifier, table, &record.called_number, record.duration_seconds);
    CallRecord {
        category,
        cost,
        ..record.clone()
    }
}

pub fn recalculate_costs(
    records: &[CallRecord],
    table: &PrefixTable,
    classifier: &Classifier,
) -> Vec<CallRecord> {
    #[cfg(feature = "parallel")]
    let updated: Vec<CallRecord> = records
        .par_iter()
        .map(|r| recalculate_record(classifier, table, r))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let updated: Vec<CallRecord> = records
        .iter()
        .map(|r| recalculate_record(classifier, table, r))
        .collect();

    let changed = records
        .iter()
        .zip(&updated)
        .filter(|(old, new)| old.cost != new.cost || old.category != new.category)
        .count();
    info!(records = records.len(), changed, "Recalculated call costs");

    updated
}
