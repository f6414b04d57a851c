//! Lenient access into heterogeneous JSON records.
//!
//! Dashboard payloads arrive as loosely typed rows. Everything here reads a
//! `serde_json::Value` the way a browser dashboard would: missing or
//! malformed numbers degrade to zero and blank names fall back to a label.

use serde_json::Value;

/// Label used when a record carries no usable name.
pub const UNKNOWN_NAME: &str = "Unknown";

/// Number read from a record plus whether a present value had to be coerced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LenientNumber {
    pub value: f64,
    pub coerced: bool,
}

impl LenientNumber {
    const fn exact(value: f64) -> Self {
        Self {
            value,
            coerced: false,
        }
    }

    const fn coerced_zero() -> Self {
        Self {
            value: 0.0,
            coerced: true,
        }
    }
}

/// Resolves `path` inside `record`, descending through objects on `.`.
///
/// Numeric segments index into arrays so `items.0.price` works too.
#[must_use]
pub fn lookup<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return None;
    }
    if let Some(direct) = record.get(path) {
        return Some(direct);
    }
    path.split('.').try_fold(record, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Parse-or-zero number read.
///
/// Strings are read up to their longest numeric prefix (`"12.5kg"` is
/// `12.5`), anything unparsable becomes `0` flagged as coerced. Missing and
/// `null` fields are plain zeros.
#[must_use]
pub fn lenient_number(value: Option<&Value>) -> LenientNumber {
    match value {
        None | Some(Value::Null) => LenientNumber::exact(0.0),
        Some(Value::Number(n)) => match n.as_f64() {
            Some(v) if v.is_finite() => LenientNumber::exact(v),
            _ => LenientNumber::coerced_zero(),
        },
        Some(Value::String(s)) => match parse_numeric_prefix(s) {
            Some(v) if v.is_finite() => LenientNumber::exact(v),
            _ => LenientNumber::coerced_zero(),
        },
        Some(Value::Array(items)) if items.len() == 1 => lenient_number(items.first()),
        Some(_) => LenientNumber::coerced_zero(),
    }
}

/// Shorthand for `lenient_number(lookup(record, field)).value`.
#[must_use]
pub fn number_field(record: &Value, field: &str) -> f64 {
    lenient_number(lookup(record, field)).value
}

/// Returns the display name at `field`, or `fallback` when the value is falsy.
#[must_use]
pub fn name_field(record: &Value, field: &str, fallback: &str) -> String {
    match lookup(record, field) {
        Some(value) if is_truthy(value) => display_string(value),
        _ => fallback.to_owned(),
    }
}

/// Falsy means absent, `null`, `false`, `""`, `0` or `NaN`.
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0 && !v.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// String form used for labels and substring matching.
#[must_use]
pub fn display_string(value: &Value) -> String {
    match value {
        Value::Null => "null".to_owned(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => i.to_string(),
            (None, Some(f)) => format_plain_number(f),
            (None, None) => n.to_string(),
        },
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => display_string(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_owned(),
    }
}

/// Strict numeric conversion used by comparison filters.
///
/// Unlike [`lenient_number`], trailing garbage yields `NaN`, so the
/// comparison fails instead of silently matching.
#[must_use]
pub fn strict_number(value: Option<&Value>) -> f64 {
    match value {
        None => f64::NAN,
        Some(Value::Null) => 0.0,
        Some(Value::Bool(b)) => f64::from(u8::from(*b)),
        Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return 0.0;
            }
            match trimmed {
                "Infinity" | "+Infinity" => f64::INFINITY,
                "-Infinity" => f64::NEG_INFINITY,
                _ if trimmed
                    .chars()
                    .any(|c| c.is_alphabetic() && c != 'e' && c != 'E') =>
                {
                    f64::NAN
                }
                _ => trimmed.parse::<f64>().unwrap_or(f64::NAN),
            }
        }
        Some(Value::Array(items)) => match items.as_slice() {
            [] => 0.0,
            [single] => strict_number(Some(single)),
            _ => f64::NAN,
        },
        Some(Value::Object(_)) => f64::NAN,
    }
}

/// Formats a float without a trailing `.0` for integral values.
#[must_use]
pub fn format_plain_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

fn parse_numeric_prefix(input: &str) -> Option<f64> {
    let trimmed = input.trim_start();
    let bytes = trimmed.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    if trimmed[end..].starts_with("Infinity") {
        return Some(if trimmed.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        });
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }
    if digits == 0 {
        return None;
    }

    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
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

    trimmed[..end].parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{lenient_number, lookup, parse_numeric_prefix, strict_number};

    #[test]
    fn numeric_prefix_stops_at_first_invalid_character() {
        assert_eq!(parse_numeric_prefix("12.5kg"), Some(12.5));
        assert_eq!(parse_numeric_prefix("  -3e2x"), Some(-300.0));
        assert_eq!(parse_numeric_prefix(".5"), Some(0.5));
        assert_eq!(parse_numeric_prefix("7."), Some(7.0));
        assert_eq!(parse_numeric_prefix("1e"), Some(1.0));
        assert_eq!(parse_numeric_prefix("abc"), None);
        assert_eq!(parse_numeric_prefix("-"), None);
        assert_eq!(parse_numeric_prefix("."), None);
    }

    #[test]
    fn lenient_number_flags_only_present_garbage() {
        assert!(!lenient_number(None).coerced);
        assert!(!lenient_number(Some(&json!(null))).coerced);
        assert!(lenient_number(Some(&json!(true))).coerced);
        assert!(lenient_number(Some(&json!("n/a"))).coerced);
        assert_eq!(lenient_number(Some(&json!("42"))).value, 42.0);
    }

    #[test]
    fn lenient_number_reads_overflowing_strings_as_zero() {
        for raw in ["1e400", "Infinity", "-Infinity"] {
            let number = lenient_number(Some(&json!(raw)));
            assert_eq!(number.value, 0.0, "{raw}");
            assert!(number.coerced, "{raw}");
        }
    }

    #[test]
    fn strict_number_rejects_trailing_garbage() {
        assert!(strict_number(Some(&json!("12abc"))).is_nan());
        assert_eq!(strict_number(Some(&json!(" 12 "))), 12.0);
        assert_eq!(strict_number(Some(&json!(""))), 0.0);
        assert!(strict_number(None).is_nan());
    }

    #[test]
    fn lookup_walks_nested_objects_and_arrays() {
        let record = json!({"a": {"b": [{"c": 5}]}, "x.y": 1});
        assert_eq!(lookup(&record, "a.b.0.c"), Some(&json!(5)));
        assert_eq!(lookup(&record, "x.y"), Some(&json!(1)));
        assert_eq!(lookup(&record, "a.missing"), None);
        assert_eq!(lookup(&record, ""), None);
    }
}
