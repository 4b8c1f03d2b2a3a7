//! Resolved item values and timestamp casting

use std::sync::OnceLock;

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

/// A value read from an item, possibly cast to a timestamp
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ItemValue {
    Timestamp(DateTime<FixedOffset>),
    Json(Value),
}

impl ItemValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ItemValue::Json(Value::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<&DateTime<FixedOffset>> {
        match self {
            ItemValue::Timestamp(ts) => Some(ts),
            ItemValue::Json(_) => None,
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ItemValue::Json(value) => Some(value),
            ItemValue::Timestamp(_) => None,
        }
    }

    pub fn is_timestamp(&self) -> bool {
        matches!(self, ItemValue::Timestamp(_))
    }

    /// Plain-text rendering: strings unquoted, timestamps as RFC 3339,
    /// everything else as compact JSON
    pub fn to_text(&self) -> String {
        match self {
            ItemValue::Timestamp(ts) => ts.to_rfc3339(),
            ItemValue::Json(Value::String(s)) => s.clone(),
            ItemValue::Json(other) => other.to_string(),
        }
    }
}

impl PartialEq<str> for ItemValue {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == Some(other)
    }
}

impl PartialEq<&str> for ItemValue {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == Some(*other)
    }
}

impl PartialEq<Value> for ItemValue {
    fn eq(&self, other: &Value) -> bool {
        self.as_json() == Some(other)
    }
}

fn iso8601() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(\.\d+)?(Z|[+-]\d{2}:\d{2})$")
            .expect("static ISO-8601 pattern is valid")
    })
}

/// Whether a string has the `YYYY-MM-DDThh:mm:ss[.f](Z|±hh:mm)` shape
pub fn looks_like_timestamp(s: &str) -> bool {
    iso8601().is_match(s)
}

/// Cast a resolved value for the accessor `name`.
///
/// Strings become timestamps when the name ends in `_at` or the string is
/// ISO-8601 shaped; unparsable strings are returned unchanged.
pub fn cast(name: &str, value: Value) -> ItemValue {
    let candidate = match &value {
        Value::String(s) if name.ends_with("_at") || looks_like_timestamp(s) => parse_timestamp(s),
        _ => None,
    };

    match candidate {
        Some(ts) => ItemValue::Timestamp(ts),
        None => ItemValue::Json(value),
    }
}

fn parse_timestamp(s: &str) -> Option<DateTime<FixedOffset>> {
    let s = s.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts);
    }

    for format in ["%Y-%m-%d %H:%M:%S %z", "%Y-%m-%dT%H:%M:%S%.f%z"] {
        if let Ok(ts) = DateTime::parse_from_str(s, format) {
            return Some(ts);
        }
    }

    // Zone-less forms are read as UTC
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .into_iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
        .map(|naive| naive.and_utc().fixed_offset())
}
