//! Runtime values and type tags for routing queries.

use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Process-wide Undefined sentinel, handed out for missing bindings
pub static UNDEFINED: QueryValue = QueryValue::Undefined;

/// Runtime type tag of a [`QueryValue`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Undefined,
    Null,
    Bool,
    Number,
    String,
    DateTime,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Undefined => "Undefined",
            ValueType::Null => "Null",
            ValueType::Bool => "Bool",
            ValueType::Number => "Number",
            ValueType::String => "String",
            ValueType::DateTime => "DateTime",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type of a subexpression as far as the compiler can tell.
///
/// Message fields are `Dynamic`: their concrete type is only known once a
/// message is bound. Any static type may still evaluate to Undefined at run
/// time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StaticType {
    Null,
    Bool,
    Number,
    String,
    DateTime,
    Dynamic,
}

impl StaticType {
    /// Static type of a constant value
    pub fn of(value: &QueryValue) -> Self {
        match value {
            QueryValue::Undefined => StaticType::Dynamic,
            QueryValue::Null => StaticType::Null,
            QueryValue::Bool(_) => StaticType::Bool,
            QueryValue::Number(_) => StaticType::Number,
            QueryValue::String(_) => StaticType::String,
            QueryValue::DateTime(_) => StaticType::DateTime,
        }
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self, StaticType::Dynamic)
    }

    /// Concrete runtime type this static type stands for, if any
    pub fn value_type(&self) -> Option<ValueType> {
        match self {
            StaticType::Null => Some(ValueType::Null),
            StaticType::Bool => Some(ValueType::Bool),
            StaticType::Number => Some(ValueType::Number),
            StaticType::String => Some(ValueType::String),
            StaticType::DateTime => Some(ValueType::DateTime),
            StaticType::Dynamic => None,
        }
    }
}

impl fmt::Display for StaticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value_type() {
            Some(value_type) => f.write_str(value_type.as_str()),
            None => f.write_str("Dynamic"),
        }
    }
}

/// Dynamically typed scalar flowing through the evaluator
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    /// No usable value: missing field, type mismatch, or failed computation
    Undefined,
    Null,
    Bool(bool),
    /// Always finite; see [`QueryValue::number`]
    Number(f64),
    String(Arc<str>),
    DateTime(DateTime<Utc>),
}

impl QueryValue {
    /// Build a number, mapping NaN and infinities to Undefined
    pub fn number(n: f64) -> Self {
        if n.is_finite() {
            QueryValue::Number(n)
        } else {
            QueryValue::Undefined
        }
    }

    pub fn string(s: impl Into<Arc<str>>) -> Self {
        QueryValue::String(s.into())
    }

    /// Runtime type tag; always agrees with the payload
    pub fn value_type(&self) -> ValueType {
        match self {
            QueryValue::Undefined => ValueType::Undefined,
            QueryValue::Null => ValueType::Null,
            QueryValue::Bool(_) => ValueType::Bool,
            QueryValue::Number(_) => ValueType::Number,
            QueryValue::String(_) => ValueType::String,
            QueryValue::DateTime(_) => ValueType::DateTime,
        }
    }

    pub fn is_defined(&self) -> bool {
        !matches!(self, QueryValue::Undefined)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, QueryValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            QueryValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            QueryValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            QueryValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            QueryValue::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    /// Order two values of the same comparable type.
    ///
    /// Returns `None` for mixed types, Null and Undefined.
    pub fn compare(&self, other: &QueryValue) -> Option<Ordering> {
        match (self, other) {
            (QueryValue::Number(a), QueryValue::Number(b)) => a.partial_cmp(b),
            (QueryValue::String(a), QueryValue::String(b)) => Some(a.cmp(b)),
            (QueryValue::Bool(a), QueryValue::Bool(b)) => Some(a.cmp(b)),
            (QueryValue::DateTime(a), QueryValue::DateTime(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl From<bool> for QueryValue {
    fn from(b: bool) -> Self {
        QueryValue::Bool(b)
    }
}

impl From<f64> for QueryValue {
    fn from(n: f64) -> Self {
        QueryValue::number(n)
    }
}

impl From<i32> for QueryValue {
    fn from(n: i32) -> Self {
        QueryValue::Number(f64::from(n))
    }
}

impl From<i64> for QueryValue {
    fn from(n: i64) -> Self {
        QueryValue::number(n as f64)
    }
}

impl From<&str> for QueryValue {
    fn from(s: &str) -> Self {
        QueryValue::String(Arc::from(s))
    }
}

impl From<String> for QueryValue {
    fn from(s: String) -> Self {
        QueryValue::String(Arc::from(s))
    }
}

impl From<DateTime<Utc>> for QueryValue {
    fn from(dt: DateTime<Utc>) -> Self {
        QueryValue::DateTime(dt)
    }
}

impl From<&serde_json::Value> for QueryValue {
    fn from(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => QueryValue::Null,
            serde_json::Value::Bool(b) => QueryValue::Bool(*b),
            serde_json::Value::Number(n) => n
                .as_f64()
                .map(QueryValue::number)
                .unwrap_or(QueryValue::Undefined),
            serde_json::Value::String(s) => QueryValue::from(s.as_str()),
            // The value model is scalar
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => QueryValue::Undefined,
        }
    }
}

impl fmt::Display for QueryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryValue::Undefined => f.write_str("undefined"),
            QueryValue::Null => f.write_str("null"),
            QueryValue::Bool(b) => write!(f, "{}", b),
            QueryValue::Number(n) => write!(f, "{}", n),
            QueryValue::String(s) => write!(f, "{:?}", s),
            QueryValue::DateTime(dt) => f.write_str(&dt.to_rfc3339()),
        }
    }
}

/// Field values a single message supplies to an evaluation.
///
/// Paths are stored exactly as rule authors write them, e.g.
/// `properties.color`, `$contentType` or `$body.temperature`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings {
    values: HashMap<String, QueryValue>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, path: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.insert(path, value);
        self
    }

    pub fn insert(
        &mut self,
        path: impl Into<String>,
        value: impl Into<QueryValue>,
    ) -> Option<QueryValue> {
        self.values.insert(path.into(), value.into())
    }

    /// Look up a field; missing paths read as Undefined
    pub fn get(&self, path: &str) -> &QueryValue {
        self.values.get(path).unwrap_or(&UNDEFINED)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.values.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &QueryValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<QueryValue>> FromIterator<(K, V)> for Bindings {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut bindings = Bindings::new();
        for (path, value) in iter {
            bindings.insert(path, value);
        }
        bindings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_value_type_matches_payload() {
        assert_eq!(QueryValue::Undefined.value_type(), ValueType::Undefined);
        assert_eq!(QueryValue::Null.value_type(), ValueType::Null);
        assert_eq!(QueryValue::from(true).value_type(), ValueType::Bool);
        assert_eq!(QueryValue::from(4.5).value_type(), ValueType::Number);
        assert_eq!(QueryValue::from("x").value_type(), ValueType::String);

        let dt = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(QueryValue::from(dt).value_type(), ValueType::DateTime);
    }

    #[test]
    fn test_non_finite_numbers_are_undefined() {
        assert_eq!(QueryValue::number(f64::NAN), QueryValue::Undefined);
        assert_eq!(QueryValue::from(f64::INFINITY), QueryValue::Undefined);
        assert_eq!(QueryValue::number(1.5), QueryValue::Number(1.5));
    }

    #[test]
    fn test_tag_checked_accessors() {
        let s = QueryValue::from("abc");
        assert_eq!(s.as_str(), Some("abc"));
        assert_eq!(s.as_number(), None);
        assert_eq!(s.as_bool(), None);

        let n = QueryValue::from(7);
        assert_eq!(n.as_number(), Some(7.0));
        assert_eq!(n.as_str(), None);

        assert!(!QueryValue::Undefined.is_defined());
        assert!(QueryValue::Null.is_defined());
        assert!(QueryValue::Null.is_null());
    }

    #[test]
    fn test_compare_same_types_only() {
        assert_eq!(
            QueryValue::from(1).compare(&QueryValue::from(2)),
            Some(Ordering::Less)
        );
        assert_eq!(
            QueryValue::from("b").compare(&QueryValue::from("a")),
            Some(Ordering::Greater)
        );
        assert_eq!(QueryValue::from(1).compare(&QueryValue::from("1")), None);
        assert_eq!(QueryValue::Null.compare(&QueryValue::Null), None);
        assert_eq!(QueryValue::Undefined.compare(&QueryValue::Undefined), None);
    }

    #[test]
    fn test_from_json() {
        let json = serde_json::json!({"a": 1});
        assert_eq!(QueryValue::from(&json), QueryValue::Undefined);
        assert_eq!(QueryValue::from(&json["a"]), QueryValue::Number(1.0));
        assert_eq!(
            QueryValue::from(&serde_json::Value::Null),
            QueryValue::Null
        );
        assert_eq!(
            QueryValue::from(&serde_json::json!("hi")),
            QueryValue::from("hi")
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(QueryValue::Undefined.to_string(), "undefined");
        assert_eq!(QueryValue::from(42).to_string(), "42");
        assert_eq!(QueryValue::from(2.5).to_string(), "2.5");
        assert_eq!(QueryValue::from("red").to_string(), "\"red\"");
        assert_eq!(StaticType::Dynamic.to_string(), "Dynamic");
        assert_eq!(StaticType::String.to_string(), "String");
    }

    #[test]
    fn test_bindings_missing_path_is_undefined() {
        let bindings = Bindings::new().with("properties.color", "RED");
        assert_eq!(bindings.get("properties.color"), &QueryValue::from("RED"));
        assert_eq!(bindings.get("properties.size"), &QueryValue::Undefined);
        assert!(bindings.contains("properties.color"));
        assert_eq!(bindings.len(), 1);
    }

    #[test]
    fn test_bindings_from_iter() {
        let bindings: Bindings = vec![("a", 1), ("b", 2)].into_iter().collect();
        assert_eq!(bindings.get("b"), &QueryValue::Number(2.0));
        assert!(!bindings.is_empty());
    }
}
