//! Conversion of raw request values into JSON values of the declared type.
//!
//! Conversion never fails: a value that cannot be converted is passed through
//! unchanged so the validator reports it against the parameter.

use crate::params::{ModelSchema, ParamType};
use serde_json::{Map, Value};

/// A value as it arrived, before conversion.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RawValue {
    /// One or more textual values (query, header, path, form field).
    Text(Vec<String>),
    /// A value taken from a JSON body.
    Json(Value),
}

pub(crate) fn coerce(raw: RawValue, ty: &ParamType) -> Value {
    match raw {
        RawValue::Text(values) => coerce_texts(&values, ty),
        RawValue::Json(v) => coerce_json(v, ty),
    }
}

fn coerce_texts(values: &[String], ty: &ParamType) -> Value {
    match ty {
        ParamType::Array(item) => {
            let parts: Vec<&str> = if values.len() > 1 {
                values.iter().map(String::as_str).collect()
            } else {
                values
                    .iter()
                    .flat_map(|v| v.split(','))
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .collect()
            };
            Value::Array(parts.into_iter().map(|p| coerce_text(p, item)).collect())
        }
        _ => match values.last() {
            Some(v) => coerce_text(v, ty),
            None => Value::Null,
        },
    }
}

fn coerce_text(text: &str, ty: &ParamType) -> Value {
    let fallback = || Value::String(text.to_string());
    match ty {
        ParamType::String => fallback(),
        ParamType::Integer => text
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| fallback()),
        ParamType::Number => text
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(fallback),
        ParamType::Boolean => parse_bool(text).map(Value::Bool).unwrap_or_else(fallback),
        ParamType::Enum(e) => e.lookup_raw(text).cloned().unwrap_or_else(fallback),
        ParamType::Array(item) => Value::Array(
            text.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|p| coerce_text(p, item))
                .collect(),
        ),
        ParamType::Object => serde_json::from_str(text).unwrap_or_else(|_| fallback()),
        ParamType::Model(m) => match serde_json::from_str(text) {
            Ok(v) => coerce_model(v, m),
            Err(_) => fallback(),
        },
    }
}

fn coerce_json(value: Value, ty: &ParamType) -> Value {
    match (ty, value) {
        (ParamType::Model(m), v) => coerce_model(v, m),
        (ParamType::Array(item), Value::Array(items)) => {
            Value::Array(items.into_iter().map(|v| coerce_json(v, item)).collect())
        }
        // Numeric and boolean enum members sent as strings.
        (ParamType::Enum(e), Value::String(s)) => {
            e.lookup_raw(&s).cloned().unwrap_or(Value::String(s))
        }
        (ParamType::Integer | ParamType::Number | ParamType::Boolean, Value::String(s)) => {
            coerce_text(&s, ty)
        }
        (_, v) => v,
    }
}

fn coerce_model(value: Value, model: &ModelSchema) -> Value {
    match value {
        Value::Object(obj) => {
            let mut out = Map::with_capacity(obj.len());
            for (key, v) in obj {
                let field = model.fields.iter().find(|(n, f)| f.key(n) == key);
                let v = match field {
                    Some((_, f)) => coerce_json(v, &f.ty),
                    None => v,
                };
                out.insert(key, v);
            }
            Value::Object(out)
        }
        other => other,
    }
}

/// Fill absent optional fields of nested models with their defaults.
pub(crate) fn fill_defaults(value: &mut Value, ty: &ParamType) {
    match (ty, value) {
        (ParamType::Model(m), Value::Object(obj)) => {
            for (name, field) in &m.fields {
                let key = field.key(name);
                match obj.get_mut(key) {
                    Some(v) => fill_defaults(v, &field.ty),
                    None => {
                        if let Some(default) = &field.info.default {
                            obj.insert(key.to_string(), default.clone());
                        }
                    }
                }
            }
        }
        (ParamType::Array(item), Value::Array(items)) => {
            for v in items {
                fill_defaults(v, item);
            }
        }
        _ => {}
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{EnumType, FieldInfo};
    use serde_json::json;
    use std::sync::Arc;

    fn text(v: &str) -> RawValue {
        RawValue::Text(vec![v.to_string()])
    }

    #[test]
    fn test_scalars() {
        assert_eq!(coerce(text("42"), &ParamType::Integer), json!(42));
        assert_eq!(coerce(text("4.5"), &ParamType::Number), json!(4.5));
        assert_eq!(coerce(text("Yes"), &ParamType::Boolean), json!(true));
        assert_eq!(coerce(text("abc"), &ParamType::Integer), json!("abc"));
        assert_eq!(coerce(text("007"), &ParamType::String), json!("007"));
    }

    #[test]
    fn test_arrays_from_csv_and_repeats() {
        let ty = ParamType::array(ParamType::Integer);
        assert_eq!(coerce(text("1, 2,3"), &ty), json!([1, 2, 3]));
        let repeated = RawValue::Text(vec!["4".into(), "5".into()]);
        assert_eq!(coerce(repeated, &ty), json!([4, 5]));
    }

    #[test]
    fn test_enum_by_value_text() {
        let prio = Arc::new(EnumType::new("Priority").member("low", 1).member("high", 2));
        assert_eq!(coerce(text("2"), &ParamType::Enum(Arc::clone(&prio))), json!(2));
        assert_eq!(
            coerce(RawValue::Json(json!("1")), &ParamType::Enum(prio)),
            json!(1)
        );
    }

    #[test]
    fn test_nested_model_defaults() {
        let inner = ModelSchema::new("Inner")
            .field("a", ParamType::Integer, FieldInfo::required())
            .field("b", ParamType::Boolean, FieldInfo::optional(false));
        let outer = ModelSchema::new("Outer")
            .field("inner", ParamType::Model(Arc::new(inner)), FieldInfo::required())
            .field("note", ParamType::String, FieldInfo::optional("none"));
        let ty = ParamType::Model(Arc::new(outer));
        let mut v = coerce(RawValue::Json(json!({"inner": {"a": "3"}})), &ty);
        fill_defaults(&mut v, &ty);
        assert_eq!(v, json!({"inner": {"a": 3, "b": false}, "note": "none"}));
    }
}
