//! CDR Billing Library
//!
//! Classifies and costs telephone call detail records (CDRs) exported as CSV
//! by a provider, aggregates them for review, and reconciles per-client
//! revenue against traffic cost.
//!
//! ## Core Features
//!
//! - **Longest-prefix classification**: every dialed number resolves to a
//!   category and a per-minute rate through an editable prefix table
//! - **60/60 billing**: each call is charged per started minute
//! - **Tolerant import**: malformed CSV rows are skipped, never fatal
//! - **Recalculation**: tariff edits re-price stored records without a
//!   re-import
//! - **Client reconciliation**: per-minute or cost-plus revenue, flat fees
//!   and margins per billing client
//!
//! ## Architecture Overview
//!
//! - [`models`] - Data structures shared by every stage
//! - [`prefix_table`] - Validated, pre-sorted tariff table
//! - [`tariffs`] - Built-in Italian tariff table
//! - [`normalizer`] - Dialed-number normalization
//! - [`classifier`] - Longest-prefix match with unknown fallbacks
//! - [`duration`] - Call duration parsing and formatting
//! - [`cost`] - 60/60 cost calculation
//! - [`parser`] - CSV record builder
//! - [`aggregator`] - Summaries by category, caller and month
//! - [`macro_category`] - Coarse reporting buckets
//! - [`recalculator`] - Re-pricing after tariff edits
//! - [`reconciler`] - Client revenue reconciliation
//! - [`analyzer`] - Analysis session tying the stages together
//! - [`display`] - Terminal and JSON report output
//! - [`config`] - Configuration with environment variable support
//! - [`logging`] - Structured logging with JSON and pretty formats
//!
//! ## Main Entry Point
//!
//! ```rust
//! use cdr_billing::{CdrAnalyzer, CategoryType};
//!
//! let mut analyzer = CdrAnalyzer::new();
//! let stats = analyzer.import_csv(
//!     "Ora,Data,Chiamante,Chiamato,Durata\n\
//!      10:15:00,01-06-2024,3331234567,0558494133,00:01:30\n",
//! );
//! assert_eq!(stats.records, 1);
//!
//! let record = &analyzer.records()[0];
//! assert_eq!(record.category.category_type, CategoryType::Landline);
//! assert_eq!(record.category.description, "Firenze");
//! ```

pub mod aggregator;
pub mod analyzer;
pub mod classifier;
pub mod config;
pub mod cost;
pub mod display;
pub mod duration;
pub mod logging;
pub mod macro_category;
pub mod models;
pub mod normalizer;
pub mod parser;
pub mod prefix_table;
pub mod recalculator;
pub mod reconciler;
pub mod tariffs;
pub mod timestamp_parser;

pub use analyzer::CdrAnalyzer;
pub use models::*;
pub use prefix_table::{PrefixTable, PrefixTableError};
pub use reconciler::{ClientBook, Reconciliation, RevenueMode};
