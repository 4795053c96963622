//! CDR CSV parsing
//!
//! Turns the raw text of a provider export into classified, costed
//! [`CallRecord`]s. Columns are positional: time, date, caller number,
//! called number, duration. Extra columns are ignored.
//!
//! Parsing is best effort and line-granular. A row with fewer than five
//! fields is logged at debug level and skipped; it never aborts the import.
//! Rows that parse but cost nothing despite a non-zero duration are kept and
//! reported as data-quality warnings.

use crate::classifier::Classifier;
use crate::duration::DurationParser;
use crate::models::*;
use crate::prefix_table::PrefixTable;
use crate::recalculator::price_call;
use crate::timestamp_parser::TimestampParser;
use anyhow::Result;
use std::ops::ControlFlow;
use tracing::{debug, info, info_span, warn};
use uuid::Uuid;

pub const MIN_FIELDS: usize = 5;

const HEADER_TOKENS: &[&str] = &[
    "ora",
    "data",
    "chiamante",
    "chiamato",
    "durata",
    "time",
    "date",
    "caller",
    "called",
    "duration",
    "numero",
    "source",
    "destination",
];

// Trait for custom record processing
pub trait RecordProcessor {
    type Output;

    fn process_record(&mut self, record: CallRecord, line_number: usize) -> Result<()>;
    fn finalize(self) -> Result<Self::Output>;
}

pub struct CdrParser {
    classifier: Classifier,
}

impl Default for CdrParser {
    fn default() -> Self {
        Self::new(Classifier::default())
    }
}

impl CdrParser {
    pub fn new(classifier: Classifier) -> Self {
        Self { classifier }
    }

    pub fn parse(&self, text: &str, table: &PrefixTable) -> Vec<CallRecord> {
        self.parse_with_stats(text, table).0
    }

    pub fn parse_with_stats(&self, text: &str, table: &PrefixTable) -> (Vec<CallRecord>, ImportStats) {
        let mut records = Vec::new();
        let stats = self.scan(text, table, |record, _| {
            records.push(record);
            ControlFlow::Continue(())
        });
        (records, stats)
    }

    // Generic method that accepts any processor
    pub fn process_csv<P: RecordProcessor>(
        &self,
        text: &str,
        table: &PrefixTable,
        mut processor: P,
    ) -> Result<P::Output> {
        let mut failure = None;
        self.scan(text, table, |record, line_number| {
            match processor.process_record(record, line_number) {
                Ok(()) => ControlFlow::Continue(()),
                Err(e) => {
                    failure = Some(e);
                    ControlFlow::Break(())
                }
            }
        });

        if let Some(e) = failure {
            return Err(e);
        }
        processor.finalize()
    }

    /// Build one record from already-split fields.
    pub fn build_record(
        &self,
        fields: &[&str],
        line_number: usize,
        table: &PrefixTable,
    ) -> Option<CallRecord> {
        if fields.len() < MIN_FIELDS {
            return None;
        }
        let time = clean_field(fields[0]);
        let date = clean_field(fields[1]);
        let caller_number = clean_field(fields[2]);
        let called_number = clean_field(fields[3]);
        let duration = clean_field(fields[4]);

        let duration_seconds = DurationParser::parse(&duration);
        let (category, cost) = price_call(&self.classifier, table, &called_number, duration_seconds);

        Some(CallRecord {
            id: format!("cdr-{:06}", line_number),
            timestamp: TimestampParser::parse(&date, &time),
            time,
            date,
            caller_number,
            called_number,
            duration,
            duration_seconds,
            category,
            cost,
        })
    }

    fn scan<F>(&self, text: &str, table: &PrefixTable, mut sink: F) -> ImportStats
    where
        F: FnMut(CallRecord, usize) -> ControlFlow<()>,
    {
        let span = info_span!("import", import_id = %Uuid::new_v4());
        let _enter = span.enter();

        let mut stats = ImportStats::default();
        let mut first_row = true;
        for (index, line) in text.lines().enumerate() {
            let line_number = index + 1;
            if line.trim().is_empty() {
                continue;
            }
            let record = match split_line(line) {
                Ok(record) => record,
                Err(e) => {
                    stats.rows_read += 1;
                    stats.skipped += 1;
                    debug!(line = line_number, error = %e, "Skipping unreadable CSV row");
                    continue;
                }
            };

            let fields: Vec<&str> = record.iter().collect();
            if fields.iter().all(|f| f.is_empty()) {
                continue;
            }

            if first_row {
                first_row = false;
                if is_header(&fields) {
                    debug!(line = line_number, "Skipping header row");
                    continue;
                }
            }

            stats.rows_read += 1;
            let Some(call) = self.build_record(&fields, line_number, table) else {
                stats.skipped += 1;
                debug!(
                    line = line_number,
                    fields = fields.len(),
                    "Skipping malformed row: expected at least {} fields",
                    MIN_FIELDS
                );
                continue;
            };

            if call.needs_review() {
                stats.warnings += 1;
                warn!(
                    line = line_number,
                    called_number = %call.called_number,
                    duration_seconds = call.duration_seconds,
                    category = %call.category.description,
                    "Call has a duration but no cost"
                );
            }

            stats.records += 1;
            if sink(call, line_number).is_break() {
                break;
            }
        }

        info!(
            rows_read = stats.rows_read,
            records = stats.records,
            skipped = stats.skipped,
            warnings = stats.warnings,
            "CDR import finished"
        );
        stats
    }
}

/// Quote-aware split of a single line. Each line gets its own reader so an
/// unbalanced quote cannot run into the rows after it.
fn split_line(line: &str) -> csv::Result<csv::StringRecord> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(line.as_bytes());
    let mut record = csv::StringRecord::new();
    reader.read_record(&mut record)?;
    Ok(record)
}

fn clean_field(field: &str) -> String {
    field.trim().trim_matches('"').trim().to_string()
}

fn is_header(fields: &[&str]) -> bool {
    fields.iter().any(|field| {
        let lower = field.to_lowercase();
        HEADER_TOKENS.iter().any(|token| lower.contains(token))
    })
}

// Default processor that collects all records into a Vec
pub struct CollectorProcessor {
    records: Vec<CallRecord>,
}

impl Default for CollectorProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl CollectorProcessor {
    pub fn new() -> Self {
        Self { records: Vec::new() }
    }
}

impl RecordProcessor for CollectorProcessor {
    type Output = Vec<CallRecord>;

    fn process_record(&mut self, record: CallRecord, _line_number: usize) -> Result<()> {
        self.records.push(record);
        Ok(())
    }

    fn finalize(self) -> Result<Self::Output> {
        Ok(self.records)
    }
}

// Processor that streams records through a callback
pub struct StreamProcessor<F>
where
    F: FnMut(CallRecord, usize) -> Result<()>,
{
    callback: F,
}

impl<F> StreamProcessor<F>
where
    F: FnMut(CallRecord, usize) -> Result<()>,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> RecordProcessor for StreamProcessor<F>
where
    F: FnMut(CallRecord, usize) -> Result<()>,
{
    type Output = ();

    fn process_record(&mut self, record: CallRecord, line_number: usize) -> Result<()> {
        (self.callback)(record, line_number)
    }

    fn finalize(self) -> Result<Self::Output> {
        Ok(())
    }
}
