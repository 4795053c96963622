//! End-to-end tests over realistic provider exports

mod common;

use cdr_billing::analyzer::CdrAnalyzer;
use cdr_billing::models::{CategoryType, PrefixRule};
use cdr_billing::prefix_table::PrefixTable;
use cdr_billing::reconciler::{ClientBook, RevenueMode, UNASSIGNED_CLIENT_ID};
use common::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn loaded_analyzer() -> CdrAnalyzer {
    let mut analyzer = CdrAnalyzer::new();
    analyzer.import_csv(JUNE_CSV);
    analyzer.import_csv(JULY_CSV);
    analyzer
}

#[test]
fn test_single_row_firenze_scenario() {
    let mut analyzer = CdrAnalyzer::new();
    let stats = analyzer.import_csv("10:15:00,01-06-2024,3331234567,0558494133,00:01:30\n");
    assert_eq!(stats.records, 1);

    let record = &analyzer.records()[0];
    assert_eq!(record.duration_seconds, 90);
    assert_eq!(record.cost, dec!(0.06));
    assert_eq!(record.category.category_type, CategoryType::Landline);
    assert_eq!(record.category.description, "Firenze");
}

#[test]
fn test_import_statistics() {
    let mut analyzer = CdrAnalyzer::new();
    let june = analyzer.import_csv(JUNE_CSV);
    assert_eq!(june.rows_read, 7);
    assert_eq!(june.records, 7);
    assert_eq!(june.skipped, 0);
    // The toll-free call and the two-digit number cost nothing.
    assert_eq!(june.warnings, 2);

    let july = analyzer.import_csv(JULY_CSV);
    assert_eq!(july.records, 2);
    assert_eq!(july.skipped, 1);
    assert_eq!(analyzer.records().len(), 9);
}

#[test]
fn test_summary_by_category() {
    let analyzer = loaded_analyzer();
    let summary = analyzer.summary();

    let order: Vec<&str> = summary.iter().map(|s| s.category.as_str()).collect();
    assert_eq!(order, vec!["landline", "international", "special", "mobile", "unknown"]);

    let mobile = summary.iter().find(|s| s.category == "mobile").unwrap();
    assert_eq!(mobile.count, 3);
    assert_eq!(mobile.total_seconds, 175);
    assert_eq!(mobile.cost, dec!(0.60));

    let total: Decimal = summary.iter().map(|s| s.cost).sum();
    assert_eq!(total, dec!(4.29));
    assert_eq!(total, analyzer.total_cost());
}

#[test]
fn test_detail_and_macro_views() {
    let analyzer = loaded_analyzer();

    let detail = analyzer.detailed_summary();
    let firenze = detail.iter().find(|s| s.category == "Firenze").unwrap();
    assert_eq!(firenze.cost, dec!(0.06));
    assert!(detail.iter().any(|s| s.category == "Roma"));
    assert!(detail.iter().any(|s| s.category == "Vodafone"));

    let macros = analyzer.macro_summary();
    let names: Vec<&str> = macros.iter().map(|s| s.category.as_str()).collect();
    for expected in ["Fisso", "Mobile", "Francia Mobile", "Numero Verde", "Numero Premium", "Altro"] {
        assert!(names.contains(&expected), "missing bucket {}", expected);
    }
    let count: u64 = macros.iter().map(|s| s.count).sum();
    assert_eq!(count as usize, analyzer.records().len());
}

#[test]
fn test_monthly_and_callers() {
    let analyzer = loaded_analyzer();

    let monthly = analyzer.monthly_summary();
    assert_eq!(monthly.len(), 2);
    assert_eq!(monthly[0].month, "2024-06");
    assert_eq!(monthly[0].cost, dec!(3.84));
    assert_eq!(monthly[1].month, "2024-07");
    assert_eq!(monthly[1].cost, dec!(0.45));

    let callers = analyzer.caller_analysis();
    assert_eq!(callers.len(), 3);
    assert_eq!(callers[0].caller_number, "0511111111");
    assert_eq!(callers[0].total_duration, 90 + 45 + 10 + 300);
    assert_eq!(callers[0].total_cost(), dec!(0.51));
    assert_eq!(callers[1].caller_number, "0522222222");
    assert_eq!(callers[1].total_duration, 181 + 120 + 120);
    assert_eq!(callers[1].total_cost(), dec!(0.78));
}

#[test]
fn test_table_edit_reprices_like_a_reimport() {
    let mut edited = loaded_analyzer();
    let table = edited
        .table()
        .with_rate("055", dec!(0.10))
        .unwrap()
        .with_rule(PrefixRule::new("800", CategoryType::Special, "Numero Verde", dec!(0.01)))
        .unwrap();
    edited.replace_table(table.clone());

    let mut reimported = CdrAnalyzer::with_table(table, Default::default());
    reimported.import_csv(JUNE_CSV);
    reimported.import_csv(JULY_CSV);

    assert_eq!(edited.records(), reimported.records());
    assert_eq!(edited.summary(), reimported.summary());
    assert_eq!(edited.total_cost(), dec!(4.29) + dec!(0.14) + dec!(0.02));
}

#[test]
fn test_reconciliation_scenario() {
    let analyzer = loaded_analyzer();
    let book: ClientBook = serde_json::from_str(CLIENT_BOOK).unwrap();
    let result = analyzer.reconcile(&book, RevenueMode::PerMinute);

    let ids: Vec<&str> = result.clients.iter().map(|c| c.client_id.as_str()).collect();
    assert_eq!(ids, vec!["bruno", "acme", UNASSIGNED_CLIENT_ID]);

    let bruno = &result.clients[0];
    assert_eq!(bruno.revenue, dec!(50));
    assert_eq!(bruno.total_cost, dec!(0.78));
    assert_eq!(bruno.total_calls, 3);

    let acme = &result.clients[1];
    assert_eq!(acme.numbers_count, 3);
    assert_eq!(acme.billed_minutes.landline, 7);
    assert_eq!(acme.billed_minutes.mobile, 2);
    assert_eq!(acme.flat_fee, dec!(20));
    assert_eq!(acme.revenue, dec!(20.75));
    assert_eq!(acme.margin, dec!(20.24));

    let unassigned = &result.clients[2];
    assert_eq!(unassigned.revenue, Decimal::ZERO);
    assert_eq!(unassigned.margin, dec!(-3.00));

    assert_eq!(result.totals.revenue, dec!(70.75));
    assert_eq!(result.totals.total_cost, analyzer.total_cost());
    assert_eq!(result.totals.margin, dec!(66.46));
}

#[test]
fn test_custom_table_from_file() {
    let dir = fixture_dir();
    let table = PrefixTable::new(vec![
        PrefixRule::new("0", CategoryType::Landline, "Fisso", dec!(0.05)),
        PrefixRule::new("+33", CategoryType::International, "Francia", dec!(0.09)),
    ])
    .unwrap();
    let path = dir.path().join("prefixes.json");
    table.save_to_file(&path).unwrap();

    let loaded = PrefixTable::load_from_file(&path).unwrap();
    assert_eq!(loaded.rules()[1].prefix, "0033");

    let mut analyzer = CdrAnalyzer::with_table(loaded, Default::default());
    analyzer.import_glob(&format!("{}/*.csv", dir.path().display())).unwrap();

    let france = analyzer
        .records()
        .iter()
        .find(|r| r.called_number == "+33612345678")
        .unwrap();
    assert_eq!(france.category.description, "Francia");
    assert_eq!(france.cost, dec!(0.36));
}
