//! Aggregation of costed call records
//!
//! Every summary cost is the sum of the member records' own costs. Nothing
//! here re-derives a cost from an aggregated duration, because under 60/60
//! billing `ceil(a + b) != ceil(a) + ceil(b)`.
//!
//! Output order is deterministic: descending by the primary measure, ties
//! broken by the group key ascending.

use crate::duration::format_duration;
use crate::macro_category::MacroCategoryMap;
use crate::models::*;
use crate::timestamp_parser::TimestampParser;
use rust_decimal::Decimal;
use std::collections::HashMap;

#[derive(Default)]
struct Bucket {
    count: u64,
    total_seconds: u64,
    cost: Decimal,
}

impl Bucket {
    fn add(&mut self, record: &CallRecord) {
        self.count += 1;
        self.total_seconds = self.total_seconds.saturating_add(record.duration_seconds);
        self.cost += record.cost;
    }

    fn into_summary(self, category: String) -> CallSummary {
        CallSummary {
            category,
            count: self.count,
            total_seconds: self.total_seconds,
            total_minutes: round2(self.total_seconds as f64 / 60.0),
            total_hours: round2(self.total_seconds as f64 / 3600.0),
            formatted_duration: format_duration(self.total_seconds),
            cost: self.cost,
        }
    }
}

pub struct Aggregator;

impl Aggregator {
    /// One summary per category type, longest total duration first.
    pub fn generate_summary(records: &[CallRecord]) -> Vec<CallSummary> {
        Self::summarize_by(records, |r| r.category.category_type.as_str().to_string())
    }

    /// One summary per tariff description ("Firenze", "TIM", ...).
    pub fn generate_detailed_summary(records: &[CallRecord]) -> Vec<CallSummary> {
        Self::summarize_by(records, |r| r.category.description.clone())
    }

    pub fn generate_macro_summary(records: &[CallRecord], map: &MacroCategoryMap) -> Vec<CallSummary> {
        Self::summarize_by(records, |r| map.bucket_for(&r.category))
    }

    pub fn generate_caller_analysis(records: &[CallRecord]) -> Vec<CallerAnalysis> {
        let mut by_caller: HashMap<&str, Vec<CallRecord>> = HashMap::new();
        for record in records {
            by_caller
                .entry(record.caller_number.as_str())
                .or_default()
                .push(record.clone());
        }

        let mut analyses: Vec<CallerAnalysis> = by_caller
            .into_iter()
            .map(|(caller, calls)| {
                let total_duration = calls
                    .iter()
                    .fold(0u64, |acc, c| acc.saturating_add(c.duration_seconds));
                CallerAnalysis {
                    caller_number: caller.to_string(),
                    total_calls: calls.len() as u64,
                    categories: Self::generate_summary(&calls),
                    total_duration,
                    formatted_total_duration: format_duration(total_duration),
                }
            })
            .collect();

        analyses.sort_by(|a, b| {
            b.total_duration
                .cmp(&a.total_duration)
                .then_with(|| a.caller_number.cmp(&b.caller_number))
        });
        analyses
    }

    /// Calendar months ascending; undated records collect under `unknown`.
    pub fn generate_monthly_summary(records: &[CallRecord]) -> Vec<MonthlySummary> {
        let mut months: HashMap<String, Bucket> = HashMap::new();
        for record in records {
            months
                .entry(TimestampParser::month_key(record.timestamp.as_ref()))
                .or_default()
                .add(record);
        }

        let mut result: Vec<MonthlySummary> = months
            .into_iter()
            .map(|(month, bucket)| MonthlySummary {
                month,
                total_calls: bucket.count,
                total_seconds: bucket.total_seconds,
                formatted_duration: format_duration(bucket.total_seconds),
                cost: bucket.cost,
            })
            .collect();

        result.sort_by(|a, b| a.month.cmp(&b.month));
        result
    }

    pub fn total_cost(records: &[CallRecord]) -> Decimal {
        records.iter().map(|r| r.cost).sum()
    }

    fn summarize_by<F>(records: &[CallRecord], key: F) -> Vec<CallSummary>
    where
        F: Fn(&CallRecord) -> String,
    {
        let mut groups: HashMap<String, Bucket> = HashMap::new();
        for record in records {
            groups.entry(key(record)).or_default().add(record);
        }

        let mut summaries: Vec<CallSummary> = groups
            .into_iter()
            .map(|(category, bucket)| bucket.into_summary(category))
            .collect();

        summaries.sort_by(|a, b| {
            b.total_seconds
                .cmp(&a.total_seconds)
                .then_with(|| a.category.cmp(&b.category))
        });
        summaries
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::CdrParser;
    use crate::prefix_table::PrefixTable;
    use rust_decimal_macros::dec;

    const CSV: &str = "\
10:15:00,01-06-2024,3331234567,0558494133,00:01:30
10:20:00,01-06-2024,3331234567,3391234567,45
10:25:00,02-06-2024,0612345678,0212345678,00:00:01
10:30:00,02-07-2024,0612345678,3471234567,00:10:00
10:35:00,03-07-2024,0612345678,+33612345678,61
10:40:00,bad-date,3331234567,800123456,30
";

    fn records() -> Vec<CallRecord> {
        CdrParser::default().parse(CSV, &PrefixTable::default())
    }

    #[test]
    fn test_summary_totals_match_records() {
        let records = records();
        let summary = Aggregator::generate_summary(&records);

        let count: u64 = summary.iter().map(|s| s.count).sum();
        let cost: Decimal = summary.iter().map(|s| s.cost).sum();
        assert_eq!(count as usize, records.len());
        assert_eq!(cost, Aggregator::total_cost(&records));
    }

    #[test]
    fn test_huge_durations_saturate() {
        let csv = "\
10:00:00,01-06-2024,100,3331234567,18446744073709551615
10:05:00,01-06-2024,100,3331234567,18446744073709551615
";
        let records = CdrParser::default().parse(csv, &PrefixTable::default());
        assert_eq!(records.len(), 2);

        let summary = Aggregator::generate_summary(&records);
        assert_eq!(summary[0].count, 2);
        assert_eq!(summary[0].total_seconds, u64::MAX);

        let callers = Aggregator::generate_caller_analysis(&records);
        assert_eq!(callers[0].total_duration, u64::MAX);
        assert_eq!(Aggregator::generate_monthly_summary(&records)[0].total_seconds, u64::MAX);
    }

    #[test]
    fn test_summary_sorted_by_duration() {
        let summary = Aggregator::generate_summary(&records());
        assert_eq!(summary[0].category, "mobile");
        assert_eq!(summary[0].total_seconds, 645);
        assert_eq!(summary[0].formatted_duration, "00:10:45");
        assert!(summary.windows(2).all(|w| w[0].total_seconds >= w[1].total_seconds));
    }

    #[test]
    fn test_summary_cost_is_summed_not_rederived() {
        // Two 30s calls bill 2 minutes in total, not ceil(60/60) = 1.
        let csv = "\
10:00:00,01-06-2024,100,3331234567,30
10:05:00,01-06-2024,100,3331234567,30
";
        let records = CdrParser::default().parse(csv, &PrefixTable::default());
        let summary = Aggregator::generate_summary(&records);
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].cost, dec!(0.30));
        assert_eq!(summary[0].total_minutes, 1.0);
    }

    #[test]
    fn test_detailed_summary() {
        let detailed = Aggregator::generate_detailed_summary(&records());
        let names: Vec<&str> = detailed.iter().map(|s| s.category.as_str()).collect();
        assert!(names.contains(&"Firenze"));
        assert!(names.contains(&"Milano"));
        assert!(names.contains(&"Francia Mobile"));
    }

    #[test]
    fn test_macro_summary() {
        let table = PrefixTable::default();
        let map = MacroCategoryMap::from_table(&table);
        let summary = Aggregator::generate_macro_summary(&records(), &map);

        let fisso = summary.iter().find(|s| s.category == "Fisso").unwrap();
        assert_eq!(fisso.count, 2);
        let mobile = summary.iter().find(|s| s.category == "Mobile").unwrap();
        assert_eq!(mobile.count, 2);
        assert!(summary.iter().any(|s| s.category == "Numero Verde"));
    }

    #[test]
    fn test_caller_analysis() {
        let analysis = Aggregator::generate_caller_analysis(&records());
        assert_eq!(analysis.len(), 2);

        let first = &analysis[0];
        assert_eq!(first.caller_number, "0612345678");
        assert_eq!(first.total_calls, 3);
        assert_eq!(first.total_duration, 1 + 600 + 61);
        assert_eq!(first.formatted_total_duration, "00:11:02");

        let per_caller: u64 = analysis.iter().map(|a| a.total_calls).sum();
        assert_eq!(per_caller, 6);
    }

    #[test]
    fn test_monthly_summary() {
        let monthly = Aggregator::generate_monthly_summary(&records());
        let months: Vec<&str> = monthly.iter().map(|m| m.month.as_str()).collect();
        assert_eq!(months, vec!["2024-06", "2024-07", "unknown"]);
        assert_eq!(monthly[0].total_calls, 3);
        assert_eq!(monthly[1].cost, dec!(1.50) + dec!(0.24));
    }

    #[test]
    fn test_empty_input() {
        assert!(Aggregator::generate_summary(&[]).is_empty());
        assert!(Aggregator::generate_caller_analysis(&[]).is_empty());
        assert!(Aggregator::generate_monthly_summary(&[]).is_empty());
    }
}
