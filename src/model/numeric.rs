//! Lenient number handling for user-typed and stored values.
//!
//! Non-numeric input is never rejected: it coerces to 0.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Parses the longest numeric prefix of `input` (`"12.5kt"` gives 12.5).
/// Anything without a leading number, or a non-finite result, gives 0.
pub fn coerce_numeric(input: &str) -> f64 {
    let s = input.trim_start();
    let bytes = s.as_bytes();
    let len = bytes.len();

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }
    let int_start = end;
    while end < len && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut mantissa_digits = end - int_start;

    if end < len && bytes[end] == b'.' {
        let mut frac_end = end + 1;
        while frac_end < len && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        mantissa_digits += frac_end - (end + 1);
        if mantissa_digits > 0 {
            end = frac_end;
        }
    }
    if mantissa_digits == 0 {
        return 0.0;
    }

    if end < len && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < len && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits = exp_end;
        while exp_end < len && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits {
            end = exp_end;
        }
    }

    s[..end]
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Coerces a stored JSON value: numbers pass through, strings are parsed
/// leniently, everything else is 0.
pub fn coerce_value(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()).unwrap_or(0.0),
        Value::String(s) => coerce_numeric(s),
        Value::Bool(true) => 1.0,
        _ => 0.0,
    }
}

/// `deserialize_with` helper for numeric fields that may hold junk.
pub fn deserialize_lenient<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(coerce_value(&value))
}

/// Integer value of the leading digits of `s` (`"2024/25"` gives 2024).
pub fn parse_leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (sign, digits) = match s.as_bytes().first() {
        Some(b'-') => (-1, &s[1..]),
        Some(b'+') => (1, &s[1..]),
        _ => (1, s),
    };
    let end = digits
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().ok().map(|v| v * sign)
}

/// Shortest display form of a metric value: `12.0` prints as `12`.
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    format!("{}", value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use serde_json::json;

    #[test]
    fn coerces_numeric_prefixes() {
        assert_relative_eq!(coerce_numeric("12.5"), 12.5);
        assert_relative_eq!(coerce_numeric("  -33.92 "), -33.92);
        assert_relative_eq!(coerce_numeric("7kt"), 7.0);
        assert_relative_eq!(coerce_numeric(".5"), 0.5);
        assert_relative_eq!(coerce_numeric("5."), 5.0);
        assert_relative_eq!(coerce_numeric("1e3x"), 1000.0);
        assert_relative_eq!(coerce_numeric("2e"), 2.0);
    }

    #[test]
    fn junk_input_becomes_zero() {
        assert_eq!(coerce_numeric(""), 0.0);
        assert_eq!(coerce_numeric("abc"), 0.0);
        assert_eq!(coerce_numeric("-"), 0.0);
        assert_eq!(coerce_numeric("."), 0.0);
        assert_eq!(coerce_numeric("1e999"), 0.0);
    }

    #[test]
    fn coerces_json_values() {
        assert_eq!(coerce_value(&json!(4.5)), 4.5);
        assert_eq!(coerce_value(&json!("11")), 11.0);
        assert_eq!(coerce_value(&json!(null)), 0.0);
        assert_eq!(coerce_value(&json!([1, 2])), 0.0);
    }

    #[test]
    fn parses_leading_integers() {
        assert_eq!(parse_leading_int("2024"), Some(2024));
        assert_eq!(parse_leading_int("2024/25"), Some(2024));
        assert_eq!(parse_leading_int("-12"), Some(-12));
        assert_eq!(parse_leading_int("FY24"), None);
        assert_eq!(parse_leading_int(""), None);
    }

    #[test]
    fn formats_numbers_without_trailing_zeroes() {
        assert_eq!(format_number(12.0), "12");
        assert_eq!(format_number(5.5), "5.5");
        assert_eq!(format_number(-0.0), "0");
    }
}
