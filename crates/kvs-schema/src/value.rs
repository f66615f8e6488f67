//! Scalar conversions between raw strings and JSON values

use kvs_core::convert::parse_bool;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// Declared type of a scalar member or collection item
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// Raw string
    #[default]
    String,
    /// Signed 64-bit integer
    Integer,
    /// Finite floating point number
    Float,
    /// Lenient boolean (`true/false/1/0/on/off/yes/no`)
    Boolean,
}

impl ValueType {
    /// Convert a raw string into a JSON value
    ///
    /// # Errors
    /// Returns a message when the string does not hold this type
    pub fn parse(self, raw: &str) -> Result<Value, String> {
        match self {
            Self::String => Ok(Value::String(raw.to_string())),
            Self::Integer => raw
                .trim()
                .parse::<i64>()
                .map(Value::from)
                .map_err(|e| e.to_string()),
            Self::Float => {
                let number = raw.trim().parse::<f64>().map_err(|e| e.to_string())?;
                Number::from_f64(number)
                    .map(Value::Number)
                    .ok_or_else(|| format!("not a finite number: {raw}"))
            }
            Self::Boolean => parse_bool(raw).map(Value::Bool),
        }
    }

    /// Render a JSON value as a raw string
    ///
    /// Only scalars are rendered; `null`, arrays and objects produce
    /// nothing.
    #[must_use]
    pub fn format(self, value: &Value) -> Option<String> {
        scalar_to_string(value)
    }
}

/// Render a JSON scalar as a raw string
#[must_use]
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
