//! Row decoding
//!
//! The table-data API returns each row as `{"f": [{"v": ...}, ...]}`: cells are
//! positional and loosely typed. [`RawEventRow`] keeps that shape; [`EventRecord`] is
//! the named view the rest of the pipeline works with, so column positions are only
//! ever spelled out in this file.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Column positions in the interaction table
pub mod column {
    pub const CONVERSATION_ID: usize = 0;
    pub const TURN_GROUP: usize = 1;
    pub const TIMESTAMP: usize = 2;
    pub const CATEGORY: usize = 3;
    pub const LAST_UTTERANCE: usize = 4;
    pub const NAVIGATION: usize = 5;
    pub const COUNTRY: usize = 6;
    pub const SOURCE_ADDRESS: usize = 7;
    pub const COUNTERPART_ADDRESS: usize = 9;
    pub const AMOUNT: usize = 12;
}

/// One cell as delivered by the warehouse
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawCell {
    #[serde(default, deserialize_with = "scalar_as_string")]
    pub v: Option<String>,
}

/// Positional row as delivered by the warehouse
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawEventRow {
    #[serde(default)]
    pub f: Vec<RawCell>,
}

/// Scalars arrive as JSON strings, but numbers and booleans are tolerated too.
/// Nested records and arrays are not consumed by the pipeline and decode as absent.
fn scalar_as_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

impl RawEventRow {
    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        Self {
            f: values
                .into_iter()
                .map(|v| RawCell {
                    v: v.map(Into::into),
                })
                .collect(),
        }
    }

    pub fn field(&self, index: usize) -> Option<&str> {
        self.f.get(index).and_then(|cell| cell.v.as_deref())
    }
}

/// Extract a field from a possibly-missing row. Never fails: a missing row, a short
/// row and a null cell all read as `None`.
pub fn field(row: Option<&RawEventRow>, index: usize) -> Option<&str> {
    row.and_then(|r| r.field(index))
}

/// How the user reached this turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Navigation {
    Text,
    Button,
    Other,
}

impl Navigation {
    fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("Text") => Self::Text,
            Some("Button") => Self::Button,
            _ => Self::Other,
        }
    }
}

/// Named view over one interaction row
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub conversation_id: Option<String>,
    pub turn_group: Option<String>,
    pub timestamp: Option<String>,
    pub category: Option<String>,
    pub last_utterance: Option<String>,
    pub navigation: Navigation,
    pub country: Option<String>,
    pub source_address: Option<String>,
    pub counterpart_address: Option<String>,
    pub amount: Option<String>,
}

impl EventRecord {
    pub fn decode(row: Option<&RawEventRow>) -> Self {
        let text = |index| field(row, index).map(str::to_string);
        Self {
            conversation_id: text(column::CONVERSATION_ID),
            turn_group: text(column::TURN_GROUP),
            timestamp: text(column::TIMESTAMP),
            category: text(column::CATEGORY),
            last_utterance: text(column::LAST_UTTERANCE),
            navigation: Navigation::parse(field(row, column::NAVIGATION)),
            country: text(column::COUNTRY),
            source_address: text(column::SOURCE_ADDRESS),
            counterpart_address: text(column::COUNTERPART_ADDRESS),
            amount: text(column::AMOUNT),
        }
    }

    /// The event time, if the row carries a usable non-zero timestamp
    pub fn occurred_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp.as_deref().and_then(parse_timestamp)
    }
}

/// Parse the timestamp formats the warehouse emits.
///
/// Accepts RFC 3339, naive `YYYY-MM-DD[T ]HH:MM:SS[.f]` (optionally suffixed with
/// ` UTC`, read as UTC) and epoch seconds as a float string (`"1.7E9"`). Empty, `"0"`
/// and the epoch itself are treated as absent.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() || raw == "0" {
        return None;
    }

    let parsed = if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        Some(ts.with_timezone(&Utc))
    } else if let Some(naive) = parse_naive(raw.trim_end_matches(" UTC")) {
        Some(naive.and_utc())
    } else if let Ok(secs) = raw.parse::<f64>() {
        if secs.is_finite() {
            DateTime::from_timestamp_millis((secs * 1000.0).round() as i64)
        } else {
            None
        }
    } else {
        None
    };

    parsed.filter(|ts| ts.timestamp_millis() != 0)
}

fn parse_naive(raw: &str) -> Option<NaiveDateTime> {
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}
