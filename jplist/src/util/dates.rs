/*!
 Contains date conversions shared by the readers and writers.

 Property lists count time in seconds from the Apple reference date, `2001-01-01T00:00:00Z`.
 Text forms use ISO 8601 timestamps in UTC with second precision.
*/

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

/// Seconds between the Unix epoch and the Apple reference date, `2001-01-01T00:00:00Z`
pub const APPLE_EPOCH_OFFSET: i64 = 978_307_200;

/// Prefix that marks a string value as a serialized date
pub const DATE_STRING_PREFIX: &str = "date:";

const ISO_8601_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Outside of this range `chrono` cannot represent the timestamp
const MAX_APPLE_SECONDS: f64 = 8.0e12;

/// Format a timestamp the way property lists store it, i.e. `2001-01-01T00:00:00Z`
pub fn format(date: &DateTime<Utc>) -> String {
    date.format(ISO_8601_FORMAT).to_string()
}

/// Parse an ISO 8601 timestamp, accepting any offset and normalizing it to UTC
pub fn parse(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(text) {
        return Some(date.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(text, ISO_8601_FORMAT)
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Convert a binary plist date, seconds relative to the Apple reference date, into a timestamp
pub fn from_apple_seconds(seconds: f64) -> Option<DateTime<Utc>> {
    if !seconds.is_finite() || seconds.abs() > MAX_APPLE_SECONDS {
        return None;
    }
    let whole = seconds.floor();
    let nanos = (((seconds - whole) * 1e9).round() as u32).min(999_999_999);
    DateTime::from_timestamp((whole as i64).checked_add(APPLE_EPOCH_OFFSET)?, nanos)
}

/// Parse a `date:`-prefixed string value, if it is one
pub fn parse_date_string(text: &str) -> Option<DateTime<Utc>> {
    text.strip_prefix(DATE_STRING_PREFIX).and_then(parse)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use crate::util::dates::{format, from_apple_seconds, parse, parse_date_string};

    #[test]
    fn can_convert_reference_date() {
        let expected = Utc.with_ymd_and_hms(2001, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(from_apple_seconds(0.0), Some(expected));
    }

    #[test]
    fn can_convert_before_reference_date() {
        let expected = Utc.with_ymd_and_hms(2000, 12, 31, 23, 59, 0).unwrap();
        assert_eq!(from_apple_seconds(-60.0), Some(expected));
    }

    #[test]
    fn cant_convert_non_finite() {
        assert!(from_apple_seconds(f64::NAN).is_none());
        assert!(from_apple_seconds(f64::INFINITY).is_none());
        assert!(from_apple_seconds(1e300).is_none());
    }

    #[test]
    fn can_format_and_parse() {
        let date = Utc.with_ymd_and_hms(2024, 2, 29, 13, 5, 9).unwrap();
        let text = format(&date);
        assert_eq!(text, "2024-02-29T13:05:09Z");
        assert_eq!(parse(&text), Some(date));
    }

    #[test]
    fn can_parse_with_offset() {
        let date = Utc.with_ymd_and_hms(2024, 2, 29, 11, 5, 9).unwrap();
        assert_eq!(parse("2024-02-29T13:05:09+02:00"), Some(date));
    }

    #[test]
    fn can_parse_date_string() {
        let date = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_date_string("date:2020-01-01T00:00:00Z"), Some(date));
        assert!(parse_date_string("2020-01-01T00:00:00Z").is_none());
        assert!(parse_date_string("date:tomorrow").is_none());
    }
}
