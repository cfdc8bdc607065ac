//! Normalization of document data before comparison.
//!
//! Volatile or defaulted fields are rewritten so that two documents that
//! render to the same file compare equal.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};

/// Keys dropped before comparison. Compared documents share an id, so the
/// route and content hash carry no extra information.
const VOLATILE_KEYS: &[&str] = &["__hash__", "path"];

/// Rewrite flattened document data into its comparable form.
pub fn refine(mut data: Map<String, Value>) -> Map<String, Value> {
    apply_seo_fallback(&mut data);

    for key in VOLATILE_KEYS {
        data.remove(*key);
    }

    match data.get("navigation") {
        None | Some(Value::Null) => {
            data.insert("navigation".to_string(), Value::Bool(true));
        }
        _ => {}
    }

    for value in data.values_mut() {
        if let Value::String(s) = value {
            if let Some(date) = normalize_date(s) {
                *s = date;
            }
        }
    }

    strip_nulls(data)
}

/// `seo.title` and `seo.description` default to the document's own values.
fn apply_seo_fallback(data: &mut Map<String, Value>) {
    let title = data.get("title").cloned();
    let description = data.get("description").cloned();

    let Some(Value::Object(seo)) = data.get_mut("seo") else {
        return;
    };

    for (key, fallback) in [("title", title), ("description", description)] {
        if !seo.get(key).map(is_truthy).unwrap_or(false) {
            seo.insert(key.to_string(), fallback.unwrap_or(Value::Null));
        }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Normalize a date-looking string to `YYYY-MM-DD` (UTC).
///
/// Returns `None` when the string does not start with a `YYYY-MM-DD` date or
/// cannot be parsed as a whole.
pub fn normalize_date(value: &str) -> Option<String> {
    if !starts_with_iso_date(value) {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc).format("%Y-%m-%d").to_string());
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt.date().format("%Y-%m-%d").to_string());
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .map(|d| d.format("%Y-%m-%d").to_string())
}

fn starts_with_iso_date(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() >= 10
        && bytes[..4].iter().all(u8::is_ascii_digit)
        && bytes[4] == b'-'
        && bytes[5..7].iter().all(u8::is_ascii_digit)
        && bytes[7] == b'-'
        && bytes[8..10].iter().all(u8::is_ascii_digit)
}

/// Remove null values from objects, recursing into nested objects only.
pub fn strip_nulls(map: Map<String, Value>) -> Map<String, Value> {
    map.into_iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| match v {
            Value::Object(inner) => (k, Value::Object(strip_nulls(inner))),
            other => (k, other),
        })
        .collect()
}
