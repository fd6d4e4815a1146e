pub mod category;
pub mod marker;
pub mod notification;
pub mod report;
pub mod session;

pub use category::*;
pub use marker::*;
pub use notification::*;
pub use report::*;
pub use session::*;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Identifier as it may arrive on the wire: a number or a numeric string.
#[derive(Deserialize)]
#[serde(untagged)]
enum IdRepr {
    Int(i64),
    Str(String),
}

pub(crate) fn deserialize_id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match IdRepr::deserialize(deserializer)? {
        IdRepr::Int(v) => Ok(v),
        IdRepr::Str(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Accept a number, a numeric string, or anything else (which becomes `None`).
pub(crate) fn deserialize_lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Accept an integer, a numeric string, or anything else (which becomes `None`).
pub(crate) fn deserialize_lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Accept a string, or a number/bool rendered as text. Anything else is `None`.
pub(crate) fn deserialize_lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
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

/// Accept a bool; null or any other type reads as `false`.
pub(crate) fn deserialize_lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(matches!(value, Some(Value::Bool(true))))
}

/// Parse a backend timestamp. Naive timestamps are taken as UTC; bare
/// integers are Unix seconds, or milliseconds past 10^12.
pub(crate) fn parse_timestamp(raw: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    let raw = raw.trim();
    if let Ok(epoch) = raw.parse::<i64>() {
        return if epoch.abs() >= 1_000_000_000_000 {
            chrono::DateTime::<chrono::Utc>::from_timestamp_millis(epoch)
        } else {
            chrono::DateTime::<chrono::Utc>::from_timestamp(epoch, 0)
        };
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&chrono::Utc));
    }
    chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}
