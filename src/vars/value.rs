// src/vars/value.rs

//! In-memory value tree for tool variables.
//!
//! Callers build these from Rust values (`Value::from(3)`, `Value::from("x")`)
//! or from the `[vars]` table of the config file. Maps are plain `HashMap`s;
//! the formatter sorts keys, so their iteration order never reaches the output.

use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

/// A variable value of arbitrary nesting.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent optional value; rendered as `null`.
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    String(String),
    /// Ordered list; order is preserved when formatting.
    List(Vec<Value>),
    /// Object; keys are sorted when formatting.
    Map(HashMap<String, Value>),
    /// A value with no literal form of its own (e.g. a TOML datetime).
    /// Rendered as a quoted string of its textual form.
    Opaque(String),
}

impl Value {
    /// Convenience constructor for an empty map.
    pub fn map() -> Self {
        Value::Map(HashMap::new())
    }

    /// Insert into a `Map` value, returning `self` for chaining.
    ///
    /// Non-map values are left untouched.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        if let Value::Map(ref mut m) = self {
            m.insert(key.into(), value.into());
        }
        self
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

macro_rules! signed_into_value {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::Int(i64::from(v))
            }
        })*
    };
}

macro_rules! unsigned_into_value {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::UInt(u64::from(v))
            }
        })*
    };
}

signed_into_value!(i8, i16, i32, i64);
unsigned_into_value!(u8, u16, u32, u64);

// Lossless on every target; a `usize` wider than 64 bits keeps its decimal text.
impl From<usize> for Value {
    fn from(v: usize) -> Self {
        u64::try_from(v)
            .map(Value::UInt)
            .unwrap_or_else(|_| Value::Opaque(v.to_string()))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<f32> for Value {
    // Go through the shortest decimal text so 3.14f32 stays "3.14" rather
    // than picking up binary widening noise.
    fn from(v: f32) -> Self {
        Value::Float(f64::from_str(&v.to_string()).unwrap_or(f64::from(v)))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl<T: Into<Value>> From<HashMap<String, T>> for Value {
    fn from(v: HashMap<String, T>) -> Self {
        Value::Map(v.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl<T: Into<Value>> From<BTreeMap<String, T>> for Value {
    fn from(v: BTreeMap<String, T>) -> Self {
        Value::Map(v.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl From<toml::Value> for Value {
    fn from(v: toml::Value) -> Self {
        match v {
            toml::Value::String(s) => Value::String(s),
            toml::Value::Integer(i) => Value::Int(i),
            toml::Value::Float(f) => Value::Float(f),
            toml::Value::Boolean(b) => Value::Bool(b),
            toml::Value::Datetime(dt) => Value::Opaque(dt.to_string()),
            toml::Value::Array(items) => Value::List(items.into_iter().map(Value::from).collect()),
            toml::Value::Table(table) => {
                Value::Map(table.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usize_converts_without_truncation() {
        assert_eq!(Value::from(7usize), Value::UInt(7));
        assert_eq!(Value::from(usize::MAX), Value::UInt(usize::MAX as u64));
    }

    #[test]
    fn option_none_is_null() {
        let v: Value = Option::<i32>::None.into();
        assert_eq!(v, Value::Null);
    }

    #[test]
    fn f32_keeps_short_decimal() {
        assert_eq!(Value::from(3.14f32), Value::Float(3.14));
    }

    #[test]
    fn toml_table_converts_recursively() {
        let parsed: toml::Table = toml::from_str(
            r#"
            name = "x"
            nodes = { count = 3, tags = ["a", "b"] }
            "#,
        )
        .unwrap();

        let v = Value::from(toml::Value::Table(parsed));
        let expected = Value::map()
            .with("name", "x")
            .with(
                "nodes",
                Value::map().with("count", 3i64).with("tags", vec!["a", "b"]),
            );
        assert_eq!(v, expected);
    }
}
