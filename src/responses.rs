//! Helpers for documenting responses.
//!
//! ```
//! use brrtkit::responses::json_example;
//! use brrtkit::routing::Route;
//! use serde_json::json;
//!
//! let mut ok = json_example(None, Some(json!({"id": 1, "name": "Rex"})));
//! ok["description"] = json!("The pet");
//! let route = Route::get("/pets/{pet_id}", "get_pet").response(200, ok);
//! ```

use crate::params::{Model, ParamType};
use crate::schema::{SchemaBuilder, VALIDATION_REF_PREFIX};
use serde::Serialize;
use serde_json::{json, Map, Value};

/// Nesting depth at which referenced definitions stop being inlined.
const MAX_INLINE_DEPTH: usize = 8;

/// Response entry `{content: {application/json: {schema?, example?}}}`.
///
/// Empty or absent parts are left out.
pub fn json_example(schema: Option<Value>, example: Option<Value>) -> Value {
    let mut media = Map::new();
    if let Some(schema) = schema.filter(|s| !is_empty(s)) {
        media.insert("schema".to_string(), schema);
    }
    if let Some(example) = example.filter(|e| !is_empty(e)) {
        media.insert("example".to_string(), example);
    }
    json!({ "content": { "application/json": media } })
}

/// Response entry whose schema is the model `T` and whose example is
/// `example`.
///
/// Nested models and enums are inlined, so the entry stands alone.
///
/// # Errors
///
/// Returns the serialization error when `example` cannot be encoded.
pub fn model_example<T: Model>(example: &impl Serialize) -> Result<Value, serde_json::Error> {
    let example = serde_json::to_value(example)?;
    Ok(json_example(Some(model_schema::<T>()), Some(example)))
}

/// Self-contained JSON schema of the model `T`.
pub fn model_schema<T: Model>() -> Value {
    let ty = ParamType::model::<T>();
    let mut builder = SchemaBuilder::validation();
    let root = builder.type_schema(&ty);
    let definitions = builder.into_definitions();
    inline_refs(root, &definitions, 0)
}

fn inline_refs(value: Value, definitions: &Map<String, Value>, depth: usize) -> Value {
    match value {
        Value::Object(map) => {
            let target = map
                .get("$ref")
                .and_then(Value::as_str)
                .and_then(|r| r.strip_prefix(VALIDATION_REF_PREFIX))
                .and_then(|name| definitions.get(name));
            if let Some(def) = target {
                if depth >= MAX_INLINE_DEPTH {
                    return json!({ "type": "object" });
                }
                return inline_refs(def.clone(), definitions, depth + 1);
            }
            Value::Object(
                map.into_iter()
                    .map(|(k, v)| (k, inline_refs(v, definitions, depth)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|v| inline_refs(v, definitions, depth))
                .collect(),
        ),
        other => other,
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(m) => m.is_empty(),
        Value::Array(a) => a.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{EnumType, FieldInfo, ModelSchema};
    use std::sync::Arc;

    struct Owner;

    impl Model for Owner {
        fn model_schema() -> ModelSchema {
            let kind = EnumType::new("Kind").member("person", "person").member("org", "org");
            ModelSchema::new("Owner")
                .field("name", ParamType::String, FieldInfo::required())
                .field("kind", ParamType::Enum(Arc::new(kind)), FieldInfo::optional("person"))
        }
    }

    #[test]
    fn test_json_example_skips_empty_parts() {
        assert_eq!(
            json_example(Some(json!({})), Some(json!({"ok": true}))),
            json!({"content": {"application/json": {"example": {"ok": true}}}})
        );
        assert_eq!(
            json_example(None, None),
            json!({"content": {"application/json": {}}})
        );
    }

    #[test]
    fn test_model_example_inlines_definitions() {
        let entry = model_example::<Owner>(&json!({"name": "Ann", "kind": "org"})).unwrap();
        let media = &entry["content"]["application/json"];
        assert_eq!(media["schema"]["title"], "Owner");
        let kind = &media["schema"]["properties"]["kind"];
        assert_eq!(kind["allOf"][0]["enum"], json!(["person", "org"]));
        assert_eq!(media["example"]["kind"], "org");
        assert!(!entry.to_string().contains("$ref"));
    }
}
