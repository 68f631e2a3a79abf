//! JSON Schema synthesis from parameter declarations.
//!
//! The same builder serves two consumers that differ only in where shared
//! definitions live:
//!
//! - request validation, where the schema must be self-contained and
//!   definitions go under `$defs` (see [`VALIDATION_REF_PREFIX`]);
//! - the OpenAPI document, where definitions are hoisted into
//!   `components.schemas` (see [`OPENAPI_REF_PREFIX`]).

use crate::error::ConfigError;
use crate::params::{EnumType, FieldInfo, ModelSchema, ParamType};
use crate::routing::ParameterSpec;
use indexmap::IndexMap;
use serde_json::{json, Map, Value};
use std::fmt;
use std::sync::Arc;

/// `$ref` prefix for definitions embedded in a validation schema.
pub const VALIDATION_REF_PREFIX: &str = "#/$defs/";
/// `$ref` prefix for definitions published in the OpenAPI document.
pub const OPENAPI_REF_PREFIX: &str = "#/components/schemas/";

/// Accumulates named definitions while field schemas are generated.
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    ref_prefix: String,
    definitions: Map<String, Value>,
}

impl SchemaBuilder {
    pub fn new(ref_prefix: impl Into<String>) -> Self {
        Self {
            ref_prefix: ref_prefix.into(),
            definitions: Map::new(),
        }
    }

    pub fn validation() -> Self {
        Self::new(VALIDATION_REF_PREFIX)
    }

    pub fn openapi() -> Self {
        Self::new(OPENAPI_REF_PREFIX)
    }

    /// Definitions collected so far, keyed by model or enum name.
    pub fn definitions(&self) -> &Map<String, Value> {
        &self.definitions
    }

    pub fn into_definitions(self) -> Map<String, Value> {
        self.definitions
    }

    /// Schema for a bare type. Models and enums become `$ref`s and are
    /// registered as definitions on first use.
    pub fn type_schema(&mut self, ty: &ParamType) -> Value {
        match ty {
            ParamType::Array(item) => {
                let items = self.type_schema(item);
                json!({ "type": "array", "items": items })
            }
            ParamType::Enum(e) => self.enum_ref(e),
            ParamType::Model(m) => self.model_ref(m),
            other => match other.json_type() {
                Some(t) => json!({ "type": t }),
                None => json!({}),
            },
        }
    }

    /// Schema for a named field: the type schema plus documentation and
    /// constraint keywords taken from `info`.
    ///
    /// A `$ref` cannot carry sibling keywords in older OpenAPI tooling, so a
    /// reference with extras is wrapped as `allOf: [$ref]`.
    pub fn field_schema(&mut self, name: &str, ty: &ParamType, info: &FieldInfo) -> Value {
        let base = self.type_schema(ty);
        let extras = field_keywords(name, info);
        match base {
            Value::Object(map) if map.contains_key("$ref") => {
                let mut wrapped = Map::new();
                wrapped.insert("allOf".to_string(), Value::Array(vec![Value::Object(map)]));
                wrapped.extend(extras);
                Value::Object(wrapped)
            }
            Value::Object(mut map) => {
                map.extend(extras);
                Value::Object(map)
            }
            other => other,
        }
    }

    /// Object schema over `fields`, with a `required` list for fields
    /// without a default.
    pub fn object_schema<'a, I>(&mut self, title: &str, fields: I) -> Value
    where
        I: IntoIterator<Item = (&'a str, &'a ParamType, &'a FieldInfo, bool)>,
    {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for (name, ty, info, is_required) in fields {
            properties.insert(name.to_string(), self.field_schema(name, ty, info));
            if is_required {
                required.push(Value::String(name.to_string()));
            }
        }
        let mut schema = Map::new();
        schema.insert("title".to_string(), Value::String(title.to_string()));
        schema.insert("type".to_string(), Value::String("object".to_string()));
        schema.insert("properties".to_string(), Value::Object(properties));
        if !required.is_empty() {
            schema.insert("required".to_string(), Value::Array(required));
        }
        Value::Object(schema)
    }

    fn reference(&self, name: &str) -> Value {
        json!({ "$ref": format!("{}{}", self.ref_prefix, name) })
    }

    fn enum_ref(&mut self, e: &EnumType) -> Value {
        if !self.definitions.contains_key(&e.name) {
            let mut def = Map::new();
            def.insert("title".to_string(), Value::String(e.name.clone()));
            def.insert("enum".to_string(), Value::Array(e.values()));
            if let Some(t) = e.json_type() {
                def.insert("type".to_string(), Value::String(t.to_string()));
            }
            self.definitions.insert(e.name.clone(), Value::Object(def));
        }
        self.reference(&e.name)
    }

    fn model_ref(&mut self, model: &Arc<ModelSchema>) -> Value {
        if !self.definitions.contains_key(&model.name) {
            // Reserve the slot first so self-referencing models terminate.
            self.definitions.insert(model.name.clone(), Value::Null);
            let mut def = self.object_schema(
                &model.name,
                model
                    .fields
                    .iter()
                    .map(|(n, f)| (f.key(n), &f.ty, &f.info, f.info.is_required())),
            );
            if let (Some(desc), Value::Object(map)) = (&model.description, &mut def) {
                map.insert("description".to_string(), Value::String(desc.clone()));
            }
            self.definitions.insert(model.name.clone(), def);
        }
        self.reference(&model.name)
    }
}

/// `page_size` becomes `Page Size`.
pub fn title_case(name: &str) -> String {
    name.split(['_', ' '])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// JSON number for a bound, written as an integer when it has no fraction.
pub(crate) fn bound_value(bound: f64) -> Value {
    if bound.fract() == 0.0 && bound.abs() < i64::MAX as f64 {
        Value::from(bound as i64)
    } else {
        serde_json::Number::from_f64(bound)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

fn field_keywords(name: &str, info: &FieldInfo) -> Map<String, Value> {
    let mut kw = Map::new();
    let title = match &info.title {
        Some(t) => t.clone(),
        None => title_case(info.alias.as_deref().unwrap_or(name)),
    };
    kw.insert("title".to_string(), Value::String(title));
    if let Some(d) = &info.description {
        kw.insert("description".to_string(), Value::String(d.clone()));
    }
    if let Some(d) = info.default.as_ref().filter(|d| !d.is_null()) {
        kw.insert("default".to_string(), d.clone());
    }
    let bounds = [
        ("exclusiveMinimum", info.gt),
        ("minimum", info.ge),
        ("exclusiveMaximum", info.lt),
        ("maximum", info.le),
    ];
    for (key, bound) in bounds {
        if let Some(b) = bound {
            kw.insert(key.to_string(), bound_value(b));
        }
    }
    if let Some(n) = info.min_length {
        kw.insert("minLength".to_string(), Value::from(n));
    }
    if let Some(n) = info.max_length {
        kw.insert("maxLength".to_string(), Value::from(n));
    }
    if let Some(p) = &info.pattern {
        kw.insert("pattern".to_string(), Value::String(p.clone()));
    }
    if let Some(e) = &info.example {
        kw.insert("example".to_string(), e.clone());
    }
    if let Some(examples) = &info.examples {
        kw.insert(
            "examples".to_string(),
            Value::Array(examples.values().cloned().collect()),
        );
    }
    if info.deprecated {
        kw.insert("deprecated".to_string(), Value::Bool(true));
    }
    kw
}

/// Compiled validation schema for one endpoint.
///
/// Properties are keyed by wire name (alias, or argument name). File uploads
/// are only checked for presence.
#[derive(Clone)]
pub struct RequestSchema {
    schema: Value,
    validator: Arc<jsonschema::Validator>,
}

impl RequestSchema {
    /// Build and compile the schema for `params`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Schema`] when `jsonschema` rejects the synthesized
    /// schema, typically because of an invalid `pattern`.
    pub fn compile(
        operation: &str,
        params: &IndexMap<String, ParameterSpec>,
    ) -> Result<Self, ConfigError> {
        let mut builder = SchemaBuilder::validation();
        let mut properties = Map::new();
        let mut required = Vec::new();
        for spec in params.values() {
            let wire = spec.wire_name();
            let prop = if spec.param.source == crate::params::ParamSource::File {
                json!({ "title": title_case(wire) })
            } else {
                builder.field_schema(wire, &spec.ty, &spec.param.info)
            };
            properties.insert(wire.to_string(), prop);
            if spec.is_required() {
                required.push(Value::String(wire.to_string()));
            }
        }
        let mut schema = Map::new();
        schema.insert("title".to_string(), Value::String(operation.to_string()));
        schema.insert("type".to_string(), Value::String("object".to_string()));
        schema.insert("properties".to_string(), Value::Object(properties));
        schema.insert("required".to_string(), Value::Array(required));
        let defs = builder.into_definitions();
        if !defs.is_empty() {
            schema.insert("$defs".to_string(), Value::Object(defs));
        }
        let schema = Value::Object(schema);

        let validator = jsonschema::validator_for(&schema).map_err(|e| ConfigError::Schema {
            operation: operation.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            schema,
            validator: Arc::new(validator),
        })
    }

    pub fn schema(&self) -> &Value {
        &self.schema
    }

    pub fn validator(&self) -> &jsonschema::Validator {
        &self.validator
    }
}

impl fmt::Debug for RequestSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestSchema")
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}
