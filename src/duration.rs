/// Parses the free-form duration column of a CDR export
pub struct DurationParser;

impl DurationParser {
    /// Seconds in `HH:MM:SS`, `MM:SS` or a bare second count.
    ///
    /// Quotes and surrounding whitespace are ignored. Anything else that
    /// does not parse yields 0; this never fails.
    pub fn parse(raw: &str) -> u64 {
        let value = raw.trim().trim_matches(|c| c == '"' || c == '\'').trim();
        if value.is_empty() {
            return 0;
        }

        if value.contains(':') {
            let parts: Option<Vec<u64>> = value
                .split(':')
                .map(|p| p.trim().parse::<u64>().ok())
                .collect();
            let total = match parts.as_deref() {
                Some([h, m, s]) => h
                    .checked_mul(3600)
                    .and_then(|hs| m.checked_mul(60).and_then(|ms| hs.checked_add(ms)))
                    .and_then(|hms| hms.checked_add(*s)),
                Some([m, s]) => m.checked_mul(60).and_then(|ms| ms.checked_add(*s)),
                _ => None,
            };
            return total.unwrap_or(0);
        }

        if let Ok(seconds) = value.parse::<u64>() {
            return seconds;
        }

        // Some exports write "90.0"; keep the whole seconds.
        match value.parse::<f64>() {
            Ok(seconds) if seconds.is_finite() && seconds > 0.0 => seconds.trunc() as u64,
            _ => 0,
        }
    }
}

/// `HH:MM:SS`, hours unbounded.
pub fn format_duration(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hms() {
        assert_eq!(DurationParser::parse("00:01:30"), 90);
        assert_eq!(DurationParser::parse("01:00:01"), 3601);
    }

    #[test]
    fn test_parse_ms() {
        assert_eq!(DurationParser::parse("02:05"), 125);
    }

    #[test]
    fn test_parse_seconds() {
        assert_eq!(DurationParser::parse("75"), 75);
        assert_eq!(DurationParser::parse("\"75\""), 75);
        assert_eq!(DurationParser::parse(" 12 "), 12);
        assert_eq!(DurationParser::parse("90.7"), 90);
    }

    #[test]
    fn test_parse_garbage_is_zero() {
        assert_eq!(DurationParser::parse(""), 0);
        assert_eq!(DurationParser::parse("abc"), 0);
        assert_eq!(DurationParser::parse("1:2:3:4"), 0);
        assert_eq!(DurationParser::parse("aa:10"), 0);
        assert_eq!(DurationParser::parse("-5"), 0);
    }

    #[test]
    fn test_overflowing_fields_are_zero() {
        assert_eq!(DurationParser::parse("9999999999999999999:00:00"), 0);
        assert_eq!(DurationParser::parse("99999999999999999999:00"), 0);
        assert_eq!(DurationParser::parse("5124095576030431:00:00"), 0);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "00:00:00");
        assert_eq!(format_duration(90), "00:01:30");
        assert_eq!(format_duration(3 * 3600 + 5 * 60 + 7), "03:05:07");
        assert_eq!(format_duration(100 * 3600), "100:00:00");
    }
}
