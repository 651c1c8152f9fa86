//! Fallback-ordered field extraction over untyped provider JSON.
//!
//! Paths are JSON pointers (`/teams/home/name`). The first path yielding a
//! usable value wins; wrong types and missing keys simply move on to the next.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::Value;

/// First non-empty text (strings, or numbers rendered as text).
pub fn first_text(item: &Value, paths: &[&str]) -> Option<String> {
    paths.iter().find_map(|p| item.pointer(p).and_then(as_text))
}

/// First non-null value.
pub fn first_value<'a>(item: &'a Value, paths: &[&str]) -> Option<&'a Value> {
    paths
        .iter()
        .filter_map(|p| item.pointer(p))
        .find(|v| !v.is_null())
}

/// First value that parses as a number.
pub fn first_number(item: &Value, paths: &[&str]) -> Option<f64> {
    paths.iter().find_map(|p| item.pointer(p).and_then(as_f64))
}

pub fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Numbers, or strings holding a number (`"1.85"`).
pub fn as_f64(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Probability given as `0.45`, `45`, or `"45%"`.
pub fn as_probability(value: &Value) -> Option<f64> {
    let raw = match value {
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok()?,
        other => as_f64(other)?,
    };
    let p = if raw > 1.0 { raw / 100.0 } else { raw };
    (0.0..=1.0).contains(&p).then_some(p)
}

/// ISO-8601 (UTC, seconds precision) from RFC 3339 strings, common naive
/// layouts, or unix timestamps in seconds or milliseconds. Unparseable
/// strings are passed through trimmed.
pub fn as_iso_datetime(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => {
            let raw = n.as_i64()?;
            let secs = if raw.unsigned_abs() > 100_000_000_000 { raw / 1000 } else { raw };
            DateTime::<Utc>::from_timestamp(secs, 0).map(iso)
        }
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            Some(parse_datetime(s).map(iso).unwrap_or_else(|| s.to_string()))
        }
        _ => None,
    }
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for layout in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, layout) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn iso(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Render a score component without a trailing `.0`.
pub fn score_component(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(i.to_string()),
            None => n.as_f64().map(|f| format!("{}", f)),
        },
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

/// Lowercase, ASCII alphanumerics joined by single dashes.
pub fn slugify(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut dash = false;
    for ch in s.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
            dash = false;
        } else if !dash && !out.is_empty() {
            out.push('-');
            dash = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    if out.is_empty() {
        out.push('x');
    }
    out
}
