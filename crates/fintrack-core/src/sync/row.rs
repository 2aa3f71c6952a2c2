//! Schema-agnostic rows moved between the local and remote stores.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A stored row as column name to value.
pub type Row = BTreeMap<String, Value>;

/// A single column value.
///
/// `Timestamp` is the local native temporal representation; it never reaches
/// the remote store because `to_remote_row` turns it into ISO-8601 text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
    Timestamp(DateTime<Utc>),
}

impl Value {
    /// Convert into a libSQL bind value. Timestamps bind as Unix milliseconds.
    pub fn into_libsql(self) -> libsql::Value {
        match self {
            Self::Null => libsql::Value::Null,
            Self::Integer(value) => libsql::Value::Integer(value),
            Self::Real(value) => libsql::Value::Real(value),
            Self::Text(value) => libsql::Value::Text(value),
            Self::Blob(value) => libsql::Value::Blob(value),
            Self::Timestamp(instant) => libsql::Value::Integer(instant.timestamp_millis()),
        }
    }
}

impl From<libsql::Value> for Value {
    fn from(value: libsql::Value) -> Self {
        match value {
            libsql::Value::Null => Self::Null,
            libsql::Value::Integer(value) => Self::Integer(value),
            libsql::Value::Real(value) => Self::Real(value),
            libsql::Value::Text(value) => Self::Text(value),
            libsql::Value::Blob(value) => Self::Blob(value),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Build a row from `(column, value)` pairs.
pub fn row_from<I, K, V>(fields: I) -> Row
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    fields
        .into_iter()
        .map(|(key, value)| (key.into(), value.into()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_binds_as_millis() {
        let instant = DateTime::from_timestamp_millis(1_714_550_400_123).unwrap();
        assert_eq!(
            Value::Timestamp(instant).into_libsql(),
            libsql::Value::Integer(1_714_550_400_123)
        );
    }

    #[test]
    fn row_from_converts_options_to_null() {
        let row = row_from([("description", Value::from(None::<String>)), ("amount", 12.5.into())]);
        assert_eq!(row["description"], Value::Null);
        assert_eq!(row["amount"], Value::Real(12.5));
    }
}
