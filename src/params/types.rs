use super::model::ModelSchema;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Where a parameter is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamSource {
    Path,
    Header,
    Query,
    Body,
    Form,
    FormUrlEncoded,
    File,
}

impl ParamSource {
    /// Lowercase name, also used as the OpenAPI `in` value for path/header/query.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamSource::Path => "path",
            ParamSource::Header => "header",
            ParamSource::Query => "query",
            ParamSource::Body => "body",
            ParamSource::Form => "form",
            ParamSource::FormUrlEncoded => "form-urlencoded",
            ParamSource::File => "file",
        }
    }

    /// Path, header and query parameters are documented under `parameters`.
    #[must_use]
    pub fn is_parameter(&self) -> bool {
        matches!(
            self,
            ParamSource::Path | ParamSource::Header | ParamSource::Query
        )
    }

    /// Form, URL-encoded form and file parameters share the form body.
    #[must_use]
    pub fn is_form(&self) -> bool {
        matches!(
            self,
            ParamSource::Form | ParamSource::FormUrlEncoded | ParamSource::File
        )
    }
}

impl fmt::Display for ParamSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared type of a parameter or model field.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
    Array(Box<ParamType>),
    Object,
    Enum(Arc<EnumType>),
    Model(Arc<ModelSchema>),
}

impl ParamType {
    pub fn array(item: ParamType) -> Self {
        ParamType::Array(Box::new(item))
    }

    pub fn model<T: super::Model>() -> Self {
        ParamType::Model(Arc::new(T::model_schema()))
    }

    pub fn enumeration<E: ParamEnum>() -> Self {
        ParamType::Enum(Arc::new(E::enum_type()))
    }

    /// JSON Schema `type` keyword for primitive and container types.
    ///
    /// Enums report the type shared by all member values; models are objects.
    #[must_use]
    pub fn json_type(&self) -> Option<&'static str> {
        match self {
            ParamType::String => Some("string"),
            ParamType::Integer => Some("integer"),
            ParamType::Number => Some("number"),
            ParamType::Boolean => Some("boolean"),
            ParamType::Array(_) => Some("array"),
            ParamType::Object | ParamType::Model(_) => Some("object"),
            ParamType::Enum(e) => e.json_type(),
        }
    }

    #[must_use]
    pub fn as_model(&self) -> Option<&Arc<ModelSchema>> {
        match self {
            ParamType::Model(m) => Some(m),
            _ => None,
        }
    }
}

/// A named enumeration whose members carry primitive values.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumType {
    pub name: String,
    pub members: Vec<(String, Value)>,
}

impl EnumType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
        }
    }

    pub fn member(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.members.push((name.into(), value.into()));
        self
    }

    /// Member values, in declaration order.
    #[must_use]
    pub fn values(&self) -> Vec<Value> {
        self.members.iter().map(|(_, v)| v.clone()).collect()
    }

    #[must_use]
    pub fn json_type(&self) -> Option<&'static str> {
        let mut kinds = self.members.iter().map(|(_, v)| match v {
            Value::String(_) => "string",
            Value::Bool(_) => "boolean",
            Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
            Value::Number(_) => "number",
            _ => "",
        });
        let first = kinds.next()?;
        if first.is_empty() || kinds.any(|k| k != first) {
            return None;
        }
        Some(first)
    }

    /// Find the member whose value renders as `raw`.
    ///
    /// Query strings and headers arrive as text, so `"2"` matches the integer
    /// member value `2`.
    #[must_use]
    pub fn lookup_raw(&self, raw: &str) -> Option<&Value> {
        self.members.iter().map(|(_, v)| v).find(|v| match v {
            Value::String(s) => s == raw,
            other => other.to_string() == raw,
        })
    }

    #[must_use]
    pub fn contains(&self, value: &Value) -> bool {
        self.members.iter().any(|(_, v)| v == value)
    }
}

/// Rust enums usable as parameter types.
///
/// ```
/// use brrtkit::params::{EnumType, ParamEnum};
///
/// enum Color { Red, Green }
///
/// impl ParamEnum for Color {
///     fn enum_type() -> EnumType {
///         EnumType::new("Color").member("red", "red").member("green", "green")
///     }
/// }
/// ```
pub trait ParamEnum {
    fn enum_type() -> EnumType;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_enum_json_type() {
        let colors = EnumType::new("Color").member("red", "red").member("blue", "blue");
        assert_eq!(colors.json_type(), Some("string"));
        let mixed = EnumType::new("Mixed").member("a", "a").member("one", 1);
        assert_eq!(mixed.json_type(), None);
    }

    #[test]
    fn test_enum_lookup_raw_matches_value_text() {
        let prio = EnumType::new("Priority").member("low", 1).member("high", 2);
        assert_eq!(prio.lookup_raw("2"), Some(&json!(2)));
        assert_eq!(prio.lookup_raw("high"), None);
    }

    #[test]
    fn test_source_display() {
        assert_eq!(ParamSource::FormUrlEncoded.to_string(), "form-urlencoded");
        assert!(ParamSource::Header.is_parameter());
        assert!(ParamSource::File.is_form());
        assert!(!ParamSource::Body.is_form());
    }
}
