//! # Request Binder
//!
//! Assembles handler arguments from a request and validates them.
//!
//! ## Precedence
//!
//! For every declared parameter the binder looks up the wire name (alias or
//! argument name) in, from lowest to highest precedence:
//!
//! 1. the query string
//! 2. the headers (case-insensitive, `_` also matched as `-`)
//! 3. the path variables
//!
//! Parameters still missing are then read from the body according to their
//! source: the JSON body for `body` parameters, the form body for `form`,
//! `form-urlencoded` and `file` parameters. With exactly one `body`
//! parameter of model type the whole JSON body is that parameter; otherwise
//! each `body` parameter reads its own key.
//!
//! Raw values are converted to the declared types, validated against the
//! endpoint's compiled schema, and missing optional values are filled with
//! their defaults. Enum parameters are delivered as their member's value.

mod coerce;
mod form;

pub use form::UploadedFile;

use crate::error::{BindError, ValidationErrorItem, ValidationErrors};
use crate::params::{ParamSource, ParamType};
use crate::routing::{EndpointSpec, ParameterSpec};
use crate::server::ParsedRequest;
use coerce::{coerce, fill_defaults, RawValue};
use indexmap::IndexMap;
use jsonschema::error::ValidationErrorKind;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::debug;

/// Validated handler arguments, keyed by argument name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundArgs {
    values: IndexMap<String, Value>,
    files: IndexMap<String, Vec<UploadedFile>>,
}

impl BoundArgs {
    /// Raw JSON value of an argument.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Typed value of an argument.
    ///
    /// # Errors
    ///
    /// [`BindError::Missing`] for an undeclared name, [`BindError::Deserialize`]
    /// when the value does not fit `T`.
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<T, BindError> {
        let value = self
            .values
            .get(name)
            .ok_or_else(|| BindError::Missing(name.to_string()))?;
        serde_json::from_value(value.clone()).map_err(|source| BindError::Deserialize {
            name: name.to_string(),
            source,
        })
    }

    /// All arguments deserialized into one struct whose fields are named
    /// like the arguments.
    ///
    /// # Errors
    ///
    /// [`BindError::Deserialize`] when the arguments do not fit `T`.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, BindError> {
        let object: Map<String, Value> = self
            .values
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        serde_json::from_value(Value::Object(object)).map_err(|source| BindError::Deserialize {
            name: "*".to_string(),
            source,
        })
    }

    /// First file uploaded for a `file` argument.
    #[must_use]
    pub fn file(&self, name: &str) -> Option<&UploadedFile> {
        self.files.get(name).and_then(|f| f.first())
    }

    /// Every file uploaded for a `file` argument.
    #[must_use]
    pub fn files(&self, name: &str) -> &[UploadedFile] {
        self.files.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// JSON object of all arguments.
    #[must_use]
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.values
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }
}

/// Header lookup by wire name: exact (case-insensitive), then with `_` as `-`.
fn header_value<'a>(req: &'a ParsedRequest, wire: &str) -> Option<&'a str> {
    req.get_header(wire).or_else(|| {
        if wire.contains('_') {
            req.get_header(&wire.replace('_', "-"))
        } else {
            None
        }
    })
}

/// Declared parameters of the wanted sources that have no value yet.
fn missing<'e>(
    endpoint: &'e EndpointSpec,
    raw: &IndexMap<&str, RawValue>,
    wanted: fn(ParamSource) -> bool,
) -> Vec<&'e ParameterSpec> {
    endpoint
        .params
        .values()
        .filter(|s| wanted(s.source()) && !raw.contains_key(s.wire_name()))
        .collect()
}

/// Bind and validate the arguments of `endpoint` from `req`.
///
/// # Arguments
///
/// * `endpoint` - The matched endpoint with its parameter table and schema
/// * `req` - The parsed request
/// * `path_params` - Variables captured from the URL by the route table
///
/// # Errors
///
/// Every offending field, as [`ValidationErrors`], when the request does not
/// satisfy the declarations.
pub fn bind(
    endpoint: &EndpointSpec,
    req: &ParsedRequest,
    path_params: &HashMap<String, String>,
) -> Result<BoundArgs, ValidationErrors> {
    let mut errors = ValidationErrors::default();
    let mut raw: IndexMap<&str, RawValue> = IndexMap::new();

    for spec in endpoint.params.values() {
        let wire = spec.wire_name();
        let query = req.query_values(wire);
        if !query.is_empty() {
            raw.insert(wire, RawValue::Text(query.into_iter().map(str::to_string).collect()));
        }
        if let Some(h) = header_value(req, wire) {
            raw.insert(wire, RawValue::Text(vec![h.to_string()]));
        }
        if let Some(p) = path_params.get(wire) {
            raw.insert(wire, RawValue::Text(vec![p.clone()]));
        }
    }

    let missing_body = missing(endpoint, &raw, |s| s == ParamSource::Body);
    if !missing_body.is_empty() && !req.body.is_empty() {
        match serde_json::from_slice::<Value>(&req.body) {
            Ok(body) => {
                let body_params: Vec<&ParameterSpec> = endpoint
                    .params
                    .values()
                    .filter(|s| s.source() == ParamSource::Body)
                    .collect();
                let whole_body = body_params.len() == 1
                    && matches!(body_params[0].ty, ParamType::Model(_));
                for spec in missing_body {
                    let wire = spec.wire_name();
                    let value = if whole_body {
                        Some(body.clone())
                    } else {
                        body.get(wire).cloned()
                    };
                    if let Some(v) = value {
                        raw.insert(wire, RawValue::Json(v));
                    }
                }
            }
            Err(e) => errors.push(ValidationErrorItem::new(
                vec!["body".to_string()],
                format!("invalid JSON body: {e}"),
                "value_error.jsondecode",
            )),
        }
    }

    let mut files: IndexMap<String, Vec<UploadedFile>> = IndexMap::new();
    let missing_form = missing(endpoint, &raw, |s| s.is_form());
    if !missing_form.is_empty() {
        let form = match form::read_form(req) {
            Ok(form) => form,
            Err(e) => {
                errors.push(ValidationErrorItem::new(
                    vec!["body".to_string()],
                    format!("invalid form body: {e}"),
                    "value_error.form",
                ));
                form::FormData::default()
            }
        };
        for spec in missing_form {
            let key = spec.wire_name();
            if spec.source() == ParamSource::File {
                let uploaded = form.files(key);
                if let Some(first) = uploaded.first() {
                    let described = match &spec.ty {
                        ParamType::Array(_) => {
                            Value::Array(uploaded.iter().map(UploadedFile::describe).collect())
                        }
                        _ => first.describe(),
                    };
                    raw.insert(key, RawValue::Json(described));
                    files.insert(spec.name.clone(), uploaded);
                }
            } else {
                let values = form.field_values(key);
                if !values.is_empty() {
                    raw.insert(key, RawValue::Text(values));
                }
            }
        }
    }

    let mut instance = Map::new();
    for spec in endpoint.params.values() {
        if let Some(r) = raw.shift_remove(spec.wire_name()) {
            let value = if spec.source() == ParamSource::File {
                match r {
                    RawValue::Json(v) => v,
                    RawValue::Text(t) => Value::from(t),
                }
            } else {
                coerce(r, &spec.ty)
            };
            instance.insert(spec.wire_name().to_string(), value);
        }
    }
    let instance = Value::Object(instance);

    for error in endpoint.request_schema.validator().iter_errors(&instance) {
        errors.push(to_error_item(endpoint, &error));
    }
    if !errors.is_empty() {
        debug!(
            operation = %endpoint.operation,
            error_count = errors.errors.len(),
            "Request validation failed"
        );
        return Err(errors);
    }

    let Value::Object(mut instance) = instance else {
        return Err(errors);
    };
    let mut values = IndexMap::with_capacity(endpoint.params.len());
    for spec in endpoint.params.values() {
        let mut value = instance
            .remove(spec.wire_name())
            .or_else(|| spec.param.info.default.clone())
            .unwrap_or(Value::Null);
        fill_defaults(&mut value, &spec.ty);
        values.insert(spec.name.clone(), value);
    }
    Ok(BoundArgs { values, files })
}

/// Decode one JSON pointer token.
fn unescape_pointer(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}

fn to_error_item(
    endpoint: &EndpointSpec,
    error: &jsonschema::ValidationError<'_>,
) -> ValidationErrorItem {
    let mut path: Vec<String> = error
        .instance_path
        .to_string()
        .split('/')
        .filter(|s| !s.is_empty())
        .map(unescape_pointer)
        .collect();

    let (msg, kind) = match &error.kind {
        ValidationErrorKind::Required { property } => {
            let name = property
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| property.to_string());
            if path.is_empty() {
                return ValidationErrorItem::missing(source_of(endpoint, &name), &name);
            }
            path.push(name);
            ("field required".to_string(), "value_error.missing")
        }
        other => (error.to_string(), error_kind(other)),
    };

    let source = path
        .first()
        .map(|wire| source_of(endpoint, wire))
        .unwrap_or("body");

    let mut loc = Vec::with_capacity(path.len() + 1);
    loc.push(source.to_string());
    loc.extend(path);
    ValidationErrorItem::new(loc, msg, kind)
}

/// Source name of the parameter sent as `wire`; unknown keys belong to the body.
fn source_of(endpoint: &EndpointSpec, wire: &str) -> &'static str {
    endpoint
        .params
        .values()
        .find(|s| s.wire_name() == wire)
        .map(|s| s.source().as_str())
        .unwrap_or("body")
}

/// Error type identifiers in the pydantic vocabulary clients already parse.
fn error_kind(kind: &ValidationErrorKind) -> &'static str {
    match kind {
        ValidationErrorKind::Required { .. } => "value_error.missing",
        ValidationErrorKind::Type { .. } => "type_error",
        ValidationErrorKind::Minimum { .. }
        | ValidationErrorKind::Maximum { .. }
        | ValidationErrorKind::ExclusiveMinimum { .. }
        | ValidationErrorKind::ExclusiveMaximum { .. } => "value_error.number",
        ValidationErrorKind::MinLength { .. } | ValidationErrorKind::MaxLength { .. } => {
            "value_error.any_str"
        }
        ValidationErrorKind::Pattern { .. } => "value_error.str.regex",
        ValidationErrorKind::Enum { .. } => "type_error.enum",
        _ => "value_error",
    }
}
