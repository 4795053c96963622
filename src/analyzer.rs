//! CDR Analysis Session
//!
//! [`CdrAnalyzer`] holds everything one billing review works on: the active
//! prefix table, the classifier policy and the records imported so far.
//!
//! ## Lifecycle
//!
//! 1. **Import**: one or more CSV exports via [`CdrAnalyzer::import_csv`],
//!    [`CdrAnalyzer::import_file`] or [`CdrAnalyzer::import_glob`]. Records
//!    accumulate across imports.
//! 2. **Edit tariffs**: [`CdrAnalyzer::replace_table`] swaps the whole table
//!    and re-prices every stored record in one pass.
//! 3. **Report**: the summaries recompute from the stored records on every
//!    call, so they always reflect the current table.
//! 4. **Reconcile**: [`CdrAnalyzer::reconcile`] sets per-client revenue
//!    against traffic cost.
//!
//! ## Usage Example
//!
//! ```rust
//! use cdr_billing::CdrAnalyzer;
//!
//! let mut analyzer = CdrAnalyzer::new();
//! analyzer.import_csv("10:15:00,01-06-2024,3331234567,0558494133,00:01:30\n");
//!
//! let summary = analyzer.summary();
//! assert_eq!(summary[0].category, "landline");
//! ```

use crate::aggregator::Aggregator;
use crate::classifier::Classifier;
use crate::config::{ClassifierConfig, Config};
use crate::macro_category::MacroCategoryMap;
use crate::models::*;
use crate::parser::CdrParser;
use crate::prefix_table::PrefixTable;
use crate::recalculator::recalculate_costs;
use crate::reconciler::{ClientBook, ClientRevenueReconciler, Reconciliation, RevenueMode};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

pub struct CdrAnalyzer {
    table: PrefixTable,
    parser: CdrParser,
    classifier: Classifier,
    macro_map: MacroCategoryMap,
    unassigned_label: String,
    records: Vec<CallRecord>,
}

impl Default for CdrAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl CdrAnalyzer {
    /// Session over the built-in tariff table with default policies.
    pub fn new() -> Self {
        Self::with_table(PrefixTable::default(), ClassifierConfig::default())
    }

    pub fn with_table(table: PrefixTable, classifier_config: ClassifierConfig) -> Self {
        let classifier = Classifier::new(classifier_config);
        Self {
            macro_map: MacroCategoryMap::from_table(&table),
            parser: CdrParser::new(classifier.clone()),
            classifier,
            table,
            unassigned_label: crate::config::ReconcilerConfig::default().unassigned_label,
            records: Vec::new(),
        }
    }

    /// Session built from configuration. A configured prefix table file
    /// replaces the built-in table.
    pub fn from_config(config: &Config) -> Result<Self> {
        let table = match &config.paths.prefix_table {
            Some(path) => PrefixTable::load_from_file(path)?,
            None => PrefixTable::default(),
        };
        let mut analyzer = Self::with_table(table, config.classifier.clone());
        analyzer.unassigned_label = config.reconciler.unassigned_label.clone();
        Ok(analyzer)
    }

    pub fn table(&self) -> &PrefixTable {
        &self.table
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn records(&self) -> &[CallRecord] {
        &self.records
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Parse one CSV export and append its records.
    pub fn import_csv(&mut self, text: &str) -> ImportStats {
        let (records, stats) = self.parser.parse_with_stats(text, &self.table);
        self.records.extend(records);
        stats
    }

    pub fn import_file(&mut self, path: &Path) -> Result<ImportStats> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read CDR file: {}", path.display()))?;
        let stats = self.import_csv(&text);
        info!(file = %path.display(), records = stats.records, "Imported CDR file");
        Ok(stats)
    }

    /// Import every file matching `pattern`, in path order.
    pub fn import_glob(&mut self, pattern: &str) -> Result<ImportStats> {
        let mut paths: Vec<_> = glob::glob(pattern)
            .with_context(|| format!("Invalid file pattern: {}", pattern))?
            .filter_map(|entry| match entry {
                Ok(path) => Some(path),
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable path");
                    None
                }
            })
            .filter(|path| path.is_file())
            .collect();
        paths.sort();

        if paths.is_empty() {
            anyhow::bail!("No CDR files match: {}", pattern);
        }

        let mut total = ImportStats::default();
        for path in &paths {
            let stats = self.import_file(path)?;
            total.rows_read += stats.rows_read;
            total.records += stats.records;
            total.skipped += stats.skipped;
            total.warnings += stats.warnings;
        }
        Ok(total)
    }

    /// Swap the whole prefix table and re-price every stored record.
    pub fn replace_table(&mut self, table: PrefixTable) {
        self.records = recalculate_costs(&self.records, &table, &self.classifier);
        self.macro_map = MacroCategoryMap::from_table(&table);
        self.table = table;
    }

    pub fn summary(&self) -> Vec<CallSummary> {
        Aggregator::generate_summary(&self.records)
    }

    pub fn detailed_summary(&self) -> Vec<CallSummary> {
        Aggregator::generate_detailed_summary(&self.records)
    }

    pub fn caller_analysis(&self) -> Vec<CallerAnalysis> {
        Aggregator::generate_caller_analysis(&self.records)
    }

    pub fn macro_summary(&self) -> Vec<CallSummary> {
        Aggregator::generate_macro_summary(&self.records, &self.macro_map)
    }

    pub fn monthly_summary(&self) -> Vec<MonthlySummary> {
        Aggregator::generate_monthly_summary(&self.records)
    }

    pub fn total_cost(&self) -> rust_decimal::Decimal {
        Aggregator::total_cost(&self.records)
    }

    /// Records that lasted but cost nothing.
    pub fn review_queue(&self) -> Vec<&CallRecord> {
        self.records.iter().filter(|r| r.needs_review()).collect()
    }

    pub fn reconcile(&self, book: &ClientBook, mode: RevenueMode) -> Reconciliation {
        ClientRevenueReconciler::new(book, &self.table, mode)
            .with_unassigned_label(self.unassigned_label.clone())
            .reconcile(&self.caller_analysis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    const JUNE: &str = "\
Ora,Data,Chiamante,Chiamato,Durata
10:15:00,01-06-2024,3331234567,0558494133,00:01:30
10:20:00,01-06-2024,3331234567,3391234567,45
";

    const JULY: &str = "\
10:15:00,01-07-2024,3331234567,0612345678,00:02:00
bad,row
";

    #[test]
    fn test_imports_accumulate() {
        let mut analyzer = CdrAnalyzer::new();
        let first = analyzer.import_csv(JUNE);
        let second = analyzer.import_csv(JULY);

        assert_eq!(first.records, 2);
        assert_eq!(second.records, 1);
        assert_eq!(second.skipped, 1);
        assert_eq!(analyzer.records().len(), 3);
        assert_eq!(analyzer.monthly_summary().len(), 2);
    }

    #[test]
    fn test_replace_table_reprices_records() {
        let mut analyzer = CdrAnalyzer::new();
        analyzer.import_csv(JUNE);
        assert_eq!(analyzer.total_cost(), dec!(0.06) + dec!(0.15));

        let table = PrefixTable::new(vec![PrefixRule::new(
            "055",
            CategoryType::Landline,
            "Firenze",
            dec!(0.10),
        )])
        .unwrap();
        analyzer.replace_table(table);

        // The mobile number no longer matches anything and costs nothing.
        assert_eq!(analyzer.total_cost(), dec!(0.20));
        assert_eq!(analyzer.review_queue().len(), 1);
        assert_eq!(analyzer.table().len(), 1);
    }

    #[test]
    fn test_import_glob() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("2024-06.csv"), JUNE).unwrap();
        fs::write(dir.path().join("2024-07.csv"), JULY).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let mut analyzer = CdrAnalyzer::new();
        let pattern = format!("{}/*.csv", dir.path().display());
        let stats = analyzer.import_glob(&pattern).unwrap();

        assert_eq!(stats.records, 3);
        assert_eq!(analyzer.records().len(), 3);
    }

    #[test]
    fn test_import_glob_without_matches() {
        let dir = TempDir::new().unwrap();
        let mut analyzer = CdrAnalyzer::new();
        let pattern = format!("{}/*.csv", dir.path().display());
        assert!(analyzer.import_glob(&pattern).is_err());
    }

    #[test]
    fn test_import_missing_file() {
        let mut analyzer = CdrAnalyzer::new();
        let err = analyzer.import_file(Path::new("/nonexistent/calls.csv")).unwrap_err();
        assert!(err.to_string().contains("Failed to read CDR file"));
    }

    #[test]
    fn test_reconcile_uses_current_table() {
        let mut analyzer = CdrAnalyzer::new();
        analyzer.import_csv(JUNE);
        let result = analyzer.reconcile(&ClientBook::default(), RevenueMode::PerMinute);

        assert_eq!(result.clients.len(), 1);
        assert_eq!(result.clients[0].client_name, "Senza cliente");
        assert_eq!(result.totals.total_cost, analyzer.total_cost());
    }
}
