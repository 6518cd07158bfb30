use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Map of control names to values, ordered so serialized output is stable
pub type ValueMap = BTreeMap<String, Value>;

/// Represents a value carried by a pattern event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Number value
    Number(f64),
    /// String value (note names, sample names, colors, etc.)
    String(String),
    /// Control map (`s`, `n`, `gain`, ...)
    Map(ValueMap),
}

impl Value {
    /// Try to extract a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Try to extract a string
    pub fn as_string(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to extract a control map
    pub fn as_map(&self) -> Option<&ValueMap> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Look up a control in a map value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map().and_then(|map| map.get(key))
    }

    /// Convert into a control map
    ///
    /// Scalars are stored under the `value` key.
    pub fn into_map(self) -> ValueMap {
        match self {
            Value::Map(map) => map,
            other => {
                let mut map = ValueMap::new();
                map.insert("value".to_string(), other);
                map
            }
        }
    }

    /// Insert a control, turning a scalar into a map under `fallback_key`
    pub fn with_control(self, key: &str, value: Value, fallback_key: &str) -> Value {
        let mut map = match self {
            Value::Map(map) => map,
            other => {
                let mut map = ValueMap::new();
                map.insert(fallback_key.to_string(), other);
                map
            }
        };
        map.insert(key.to_string(), value);
        Value::Map(map)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
            Value::Map(map) => {
                write!(f, "{{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<ValueMap> for Value {
    fn from(map: ValueMap) -> Self {
        Value::Map(map)
    }
}
