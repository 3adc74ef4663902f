use std::fmt;

use serde::{Deserialize, Serialize};

/// Declared storage type of a persisted field.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Integer,
    Float,
    Text,
}

impl ValueType {
    pub fn as_str(self) -> &'static str {
        match self {
            ValueType::Integer => "integer",
            ValueType::Float => "float",
            ValueType::Text => "text",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single column value as it travels between records and statements.
///
/// `Null` marks a cell that was missing or could not be scanned; it decodes
/// to the field's zero value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Text(String),
    Null,
}

impl Value {
    pub fn value_type(&self) -> Option<ValueType> {
        match self {
            Value::Integer(_) => Some(ValueType::Integer),
            Value::Float(_) => Some(ValueType::Float),
            Value::Text(_) => Some(ValueType::Text),
            Value::Null => None,
        }
    }

    /// True for `0`, `0.0`, the empty string and `Null`.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Integer(value) => *value == 0,
            Value::Float(value) => *value == 0.0,
            Value::Text(value) => value.is_empty(),
            Value::Null => true,
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<Value> for sea_orm::Value {
    fn from(value: Value) -> Self {
        match value {
            Value::Integer(value) => sea_orm::Value::BigInt(Some(value)),
            Value::Float(value) => sea_orm::Value::Double(Some(value)),
            Value::Text(value) => value.into(),
            Value::Null => sea_orm::Value::BigInt(None),
        }
    }
}
