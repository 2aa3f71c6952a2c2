//! Row codec: timestamp representation across the local/remote boundary.
//!
//! Locally timestamps live as native `DateTime<Utc>` values (stored as Unix
//! milliseconds). The remote replica stores them as RFC 3339 text with
//! millisecond precision. Only the fields in [`TIMESTAMP_FIELDS`] are touched;
//! every other column is opaque payload and passes through as-is.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

use super::row::{Row, Value};

/// Columns that carry a point in time.
pub const TIMESTAMP_FIELDS: [&str; 3] = ["created_at", "updated_at", "date"];

/// Whether a column carries a point in time.
pub fn is_timestamp_field(name: &str) -> bool {
    TIMESTAMP_FIELDS.contains(&name)
}

/// Decode a row fetched from the remote store into the local representation.
pub fn to_local_row(row: Row) -> Row {
    row.into_iter()
        .map(|(name, value)| {
            let value = if is_timestamp_field(&name) {
                decode_timestamp(value)
            } else {
                value
            };
            (name, value)
        })
        .collect()
}

/// Encode a local row for the remote store.
pub fn to_remote_row(row: Row) -> Row {
    row.into_iter()
        .map(|(name, value)| {
            let value = match value {
                Value::Timestamp(instant) if is_timestamp_field(&name) => {
                    Value::Text(format_timestamp(instant))
                }
                other => other,
            };
            (name, value)
        })
        .collect()
}

/// Wire form of an instant: `2024-05-01T10:00:00.000Z`.
pub fn format_timestamp(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse the wire form. Accepts RFC 3339, a naive date-time (read as UTC)
/// and a bare `YYYY-MM-DD` date (midnight UTC).
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(text) {
        return Some(instant.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn decode_timestamp(value: Value) -> Value {
    match value {
        Value::Text(text) => parse_timestamp(&text).map_or(Value::Text(text), Value::Timestamp),
        other => other,
    }
}
