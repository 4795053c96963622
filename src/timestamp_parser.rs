use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};

const DATE_FORMATS: &[&str] = &["%d-%m-%Y", "%d/%m/%Y", "%d.%m.%Y", "%Y-%m-%d", "%Y/%m/%d"];

const TIME_FORMATS: &[&str] = &["%H:%M:%S", "%H:%M"];

/// Handles the locale-dependent date and time columns of CDR exports
pub struct TimestampParser;

impl TimestampParser {
    pub fn parse_date(date_str: &str) -> Option<NaiveDate> {
        let value = clean(date_str);
        if value.is_empty() {
            return None;
        }
        let date = DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())?;
        // "01/06/24" parses as year 24
        if date.year() < 100 {
            date.with_year(date.year() + 2000)
        } else {
            Some(date)
        }
    }

    pub fn parse_time(time_str: &str) -> Option<NaiveTime> {
        let value = clean(time_str);
        TIME_FORMATS
            .iter()
            .find_map(|fmt| NaiveTime::parse_from_str(value, fmt).ok())
    }

    /// Combine the two columns. A missing or bad time falls back to midnight
    /// so the call still lands on the right day.
    pub fn parse(date_str: &str, time_str: &str) -> Option<NaiveDateTime> {
        let date = Self::parse_date(date_str)?;
        let time = Self::parse_time(time_str).unwrap_or(NaiveTime::MIN);
        Some(date.and_time(time))
    }

    /// `YYYY-MM` bucket used by monthly reports.
    pub fn month_key(timestamp: Option<&NaiveDateTime>) -> String {
        match timestamp {
            Some(ts) => ts.format("%Y-%m").to_string(),
            None => "unknown".to_string(),
        }
    }
}

fn clean(value: &str) -> &str {
    value.trim().trim_matches('"').trim()
}
