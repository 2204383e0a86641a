//! Lenient field parsers.
//!
//! CSV values always arrive as strings. Numeric parsing reads the longest
//! numeric prefix (`"12.7 min"` reads as `12.7`, `"12.7"` as integer `12`),
//! booleans compare case-insensitively against `true`/`false`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

/// Parse the leading integer of `s`. Returns None when no digits lead.
pub fn parse_int_prefix(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == digits_start {
        return None;
    }
    // Only overflow can fail here; saturate instead of dropping the value.
    match s[..end].parse::<i64>() {
        Ok(v) => Some(v),
        Err(_) if s.starts_with('-') => Some(i64::MIN),
        Err(_) => Some(i64::MAX),
    }
}

/// Parse the leading decimal number of `s`. Returns None when nothing numeric leads.
pub fn parse_float_prefix(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }
    if s[end..].starts_with("Infinity") {
        let inf = f64::INFINITY;
        return Some(if s.starts_with('-') { -inf } else { inf });
    }

    let mut mantissa_digits = 0;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
        mantissa_digits += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
            mantissa_digits += 1;
        }
    }
    if mantissa_digits == 0 {
        return None;
    }

    // Exponent only counts when at least one digit follows it.
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok()
}

/// Integer value for sums and averages: absent, empty or non-numeric reads as 0.
pub fn int_or_zero(value: Option<&str>) -> i64 {
    value.and_then(parse_int_prefix).unwrap_or(0)
}

/// Float value with a zero default: absent, empty or non-numeric reads as 0.
pub fn float_or_zero(value: Option<&str>) -> f64 {
    value.and_then(parse_float_prefix).unwrap_or(0.0)
}

/// Float value with no default: anything unparseable reads as NaN.
pub fn float_or_nan(value: Option<&str>) -> f64 {
    value.and_then(parse_float_prefix).unwrap_or(f64::NAN)
}

/// `Some(true)` / `Some(false)` for the literals `true` / `false` in any case.
pub fn parse_flag(value: Option<&str>) -> Option<bool> {
    let value = value?;
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// 1.0 when the flag reads `true`, 0.0 otherwise.
pub fn flag_score(value: Option<&str>) -> f64 {
    if parse_flag(value) == Some(true) {
        1.0
    } else {
        0.0
    }
}

/// Parse a call timestamp. Values without an offset are taken as UTC.
pub fn parse_call_date(s: &str) -> Option<DateTime<Utc>> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(naive.and_utc());
        }
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
            return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_int_prefix() {
        assert_eq!(parse_int_prefix("42"), Some(42));
        assert_eq!(parse_int_prefix("  -7"), Some(-7));
        assert_eq!(parse_int_prefix("12.7"), Some(12));
        assert_eq!(parse_int_prefix("3 calls"), Some(3));
        assert_eq!(parse_int_prefix(""), None);
        assert_eq!(parse_int_prefix("abc"), None);
        assert_eq!(parse_int_prefix("-"), None);
        assert_eq!(parse_int_prefix("99999999999999999999"), Some(i64::MAX));
        assert_eq!(parse_int_prefix("-99999999999999999999x"), Some(i64::MIN));
    }

    #[test]
    fn test_parse_float_prefix() {
        assert_eq!(parse_float_prefix("5.0"), Some(5.0));
        assert_eq!(parse_float_prefix(" 0.75"), Some(0.75));
        assert_eq!(parse_float_prefix(".5"), Some(0.5));
        assert_eq!(parse_float_prefix("4."), Some(4.0));
        assert_eq!(parse_float_prefix("3.5abc"), Some(3.5));
        assert_eq!(parse_float_prefix("1e3"), Some(1000.0));
        assert_eq!(parse_float_prefix("2e"), Some(2.0));
        assert_eq!(parse_float_prefix("-Infinity"), Some(f64::NEG_INFINITY));
        assert_eq!(parse_float_prefix(""), None);
        assert_eq!(parse_float_prefix("."), None);
        assert_eq!(parse_float_prefix("n/a"), None);
    }

    #[test]
    fn test_defaults() {
        assert_eq!(int_or_zero(None), 0);
        assert_eq!(int_or_zero(Some("")), 0);
        assert_eq!(int_or_zero(Some("x")), 0);
        assert_eq!(int_or_zero(Some("15")), 15);

        assert_eq!(float_or_zero(None), 0.0);
        assert_eq!(float_or_zero(Some("6.5")), 6.5);

        assert!(float_or_nan(None).is_nan());
        assert!(float_or_nan(Some("bad")).is_nan());
        assert_eq!(float_or_nan(Some("0.9")), 0.9);
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag(Some("true")), Some(true));
        assert_eq!(parse_flag(Some("TRUE")), Some(true));
        assert_eq!(parse_flag(Some("False")), Some(false));
        assert_eq!(parse_flag(Some("yes")), None);
        assert_eq!(parse_flag(Some("")), None);
        assert_eq!(parse_flag(None), None);

        assert_eq!(flag_score(Some("True")), 1.0);
        assert_eq!(flag_score(Some("maybe")), 0.0);
    }

    #[test]
    fn test_parse_call_date_formats() {
        let midnight = Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap();
        let afternoon = Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 0).unwrap();

        assert_eq!(parse_call_date("2024-03-05"), Some(midnight));
        assert_eq!(parse_call_date("03/05/2024"), Some(midnight));
        assert_eq!(parse_call_date("2024-03-05 14:30:00"), Some(afternoon));
        assert_eq!(parse_call_date("2024-03-05T14:30"), Some(afternoon));
        assert_eq!(parse_call_date("2024-03-05T14:30:00Z"), Some(afternoon));
        assert_eq!(
            parse_call_date("2024-03-05T16:30:00+02:00"),
            Some(afternoon)
        );
    }

    #[test]
    fn test_parse_call_date_invalid() {
        assert_eq!(parse_call_date(""), None);
        assert_eq!(parse_call_date("   "), None);
        assert_eq!(parse_call_date("not a date"), None);
        assert_eq!(parse_call_date("2024-13-40"), None);
    }
}
