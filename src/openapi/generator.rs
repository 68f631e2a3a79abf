use crate::params::{ParamSource, ParamType};
use crate::routing::{EndpointRegistry, EndpointSpec, ParameterSpec};
use crate::schema::{title_case, SchemaBuilder};
use crate::security::SecurityRegistry;
use http::Method;
use serde_json::{json, Map, Value};
use tracing::debug;

pub const OPENAPI_VERSION: &str = "3.1.0";
pub const DEFAULT_JSON_URL: &str = "/openapi.json";

/// Builds the OpenAPI document for a set of registered endpoints.
///
/// Every call to [`SwaggerGenerator::generate`] starts from an empty document,
/// so repeated calls over an unchanged registry yield identical output.
///
/// ```
/// use brrtkit::openapi::SwaggerGenerator;
/// use brrtkit::routing::EndpointRegistry;
///
/// let generator = SwaggerGenerator::new("Pets").version("2.0.0");
/// let doc = generator.generate(&EndpointRegistry::new());
/// assert_eq!(doc["info"]["title"], "Pets");
/// assert_eq!(doc["openapi"], "3.1.0");
/// ```
#[derive(Debug, Clone)]
pub struct SwaggerGenerator {
    title: String,
    version: String,
    description: String,
    servers: Vec<String>,
    json_url: String,
    additional_paths: Map<String, Value>,
    additional_components: Map<String, Value>,
    additional_schemas: Map<String, Value>,
    security: SecurityRegistry,
}

impl Default for SwaggerGenerator {
    fn default() -> Self {
        Self::new("Auto Swagger")
    }
}

impl SwaggerGenerator {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            version: "1.0.0".to_string(),
            description: String::new(),
            servers: Vec::new(),
            json_url: DEFAULT_JSON_URL.to_string(),
            additional_paths: Map::new(),
            additional_components: Map::new(),
            additional_schemas: Map::new(),
            security: SecurityRegistry::global().clone(),
        }
    }

    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn servers<I, S>(mut self, servers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.servers = servers.into_iter().map(Into::into).collect();
        self
    }

    /// URL the document is served at.
    #[must_use]
    pub fn json_url(mut self, url: impl Into<String>) -> Self {
        self.json_url = url.into();
        self
    }

    /// Path items merged into `paths` after generation.
    #[must_use]
    pub fn additional_paths(mut self, paths: Map<String, Value>) -> Self {
        self.additional_paths = paths;
        self
    }

    /// Entries merged into `components` after generation.
    #[must_use]
    pub fn additional_components(mut self, components: Map<String, Value>) -> Self {
        self.additional_components = components;
        self
    }

    /// Schemas merged into `components.schemas` after generation.
    #[must_use]
    pub fn additional_component_schemas(mut self, schemas: Map<String, Value>) -> Self {
        self.additional_schemas = schemas;
        self
    }

    /// Registry read for `components.securitySchemes`. Defaults to
    /// [`SecurityRegistry::global`].
    #[must_use]
    pub fn security_registry(mut self, registry: SecurityRegistry) -> Self {
        self.security = registry;
        self
    }

    pub fn documentation_url(&self) -> &str {
        &self.json_url
    }

    /// Generate the document for `registry`.
    ///
    /// # Arguments
    ///
    /// * `registry` - Registered endpoints, in registration order
    ///
    /// # Returns
    ///
    /// The OpenAPI document as JSON
    pub fn generate(&self, registry: &EndpointRegistry) -> Value {
        let mut builder = SchemaBuilder::openapi();
        let mut paths = Map::new();

        for spec in registry.specs() {
            let operation = if let Some(custom) = &spec.custom_swagger {
                custom.clone()
            } else if spec.auto_swagger {
                operation_object(spec, &mut builder)
            } else {
                continue;
            };
            let item = paths
                .entry(spec.rule.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(item) = item {
                item.insert(spec.method_key(), operation);
            }
        }

        let mut schemas = builder.into_definitions();
        for (path, extra) in &self.additional_paths {
            match (paths.get_mut(path), extra) {
                (Some(Value::Object(item)), Value::Object(extra)) => {
                    item.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
                }
                _ => {
                    paths.insert(path.clone(), extra.clone());
                }
            }
        }
        schemas.extend(
            self.additional_schemas
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );

        let mut components = Map::new();
        components.insert("schemas".to_string(), Value::Object(schemas));
        components.insert("securitySchemes".to_string(), self.security.schemes());
        for (key, extra) in &self.additional_components {
            match (components.get_mut(key), extra) {
                (Some(Value::Object(existing)), Value::Object(extra)) => {
                    existing.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
                }
                _ => {
                    components.insert(key.clone(), extra.clone());
                }
            }
        }

        debug!(
            endpoints = registry.len(),
            paths = paths.len(),
            "OpenAPI document generated"
        );

        json!({
            "openapi": OPENAPI_VERSION,
            "info": {
                "title": self.title,
                "version": self.version,
                "description": self.description,
            },
            "servers": self.servers.iter().map(|s| json!({ "url": s })).collect::<Vec<_>>(),
            "paths": paths,
            "components": components,
            "security": [],
        })
    }
}

/// Whether the method documents a request body.
fn has_request_body(method: &Method) -> bool {
    ![Method::GET, Method::HEAD, Method::OPTIONS, Method::DELETE].contains(method)
}

fn operation_object(spec: &EndpointSpec, builder: &mut SchemaBuilder) -> Value {
    let mut op = Map::new();
    op.insert("tags".to_string(), json!(spec.tags));
    op.insert("summary".to_string(), Value::String(spec.summary.clone()));
    op.insert(
        "description".to_string(),
        Value::String(spec.description.clone()),
    );
    op.insert(
        "operationId".to_string(),
        Value::String(spec.operation.clone()),
    );

    let parameters: Vec<Value> = spec
        .params
        .values()
        .filter(|p| p.source().is_parameter())
        .map(|p| parameter_object(p, builder))
        .collect();
    if !parameters.is_empty() {
        op.insert("parameters".to_string(), Value::Array(parameters));
    }

    if has_request_body(&spec.method) {
        let content = request_body_content(spec, builder);
        if !content.is_empty() {
            op.insert("requestBody".to_string(), json!({ "content": content }));
        }
    }

    op.insert("responses".to_string(), json!(spec.responses));

    if let Some(security) = &spec.security {
        op.insert(
            "security".to_string(),
            Value::Array(vec![security.requirement()]),
        );
    }
    Value::Object(op)
}

fn parameter_object(p: &ParameterSpec, builder: &mut SchemaBuilder) -> Value {
    let wire = p.wire_name();
    let info = &p.param.info;
    let mut obj = Map::new();
    obj.insert("name".to_string(), Value::String(wire.to_string()));
    obj.insert("in".to_string(), Value::String(p.source().as_str().to_string()));
    obj.insert("required".to_string(), Value::Bool(p.is_required()));
    if let Some(d) = &info.description {
        obj.insert("description".to_string(), Value::String(d.clone()));
    }
    if let Some(e) = &info.example {
        obj.insert("example".to_string(), e.clone());
    }
    if let Some(d) = info.default.as_ref().filter(|d| !d.is_null()) {
        obj.insert("default".to_string(), d.clone());
    }
    if info.deprecated {
        obj.insert("deprecated".to_string(), Value::Bool(true));
    }
    obj.insert(
        "schema".to_string(),
        builder.field_schema(wire, &p.ty, info),
    );
    Value::Object(obj)
}

fn params_of(spec: &EndpointSpec, wanted: fn(ParamSource) -> bool) -> Vec<&ParameterSpec> {
    spec.params.values().filter(|p| wanted(p.source())).collect()
}

/// `requestBody.content`, keyed by media type.
fn request_body_content(spec: &EndpointSpec, builder: &mut SchemaBuilder) -> Map<String, Value> {
    let title = spec.rule.replace('/', "-");
    let mut content = Map::new();

    let body = params_of(spec, |s| s == ParamSource::Body);
    if let [single] = body.as_slice() {
        if matches!(single.ty, ParamType::Model(_)) {
            let schema = builder.type_schema(&single.ty);
            content.insert("application/json".to_string(), json!({ "schema": schema }));
        }
    }
    if !body.is_empty() && !content.contains_key("application/json") {
        let schema = builder.object_schema(
            &title,
            body.iter()
                .map(|p| (p.wire_name(), &p.ty, &p.param.info, p.is_required())),
        );
        content.insert("application/json".to_string(), json!({ "schema": schema }));
    }

    let multipart = params_of(spec, |s| matches!(s, ParamSource::Form | ParamSource::File));
    if !multipart.is_empty() {
        let schema = form_schema(&format!("{title}__form"), &multipart, builder);
        content.insert("multipart/form-data".to_string(), json!({ "schema": schema }));
    }
    let urlencoded = params_of(spec, |s| s == ParamSource::FormUrlEncoded);
    if !urlencoded.is_empty() {
        let schema = form_schema(&format!("{title}__form_urlencoded"), &urlencoded, builder);
        content.insert(
            "application/x-www-form-urlencoded".to_string(),
            json!({ "schema": schema }),
        );
    }
    content
}

fn form_schema(title: &str, params: &[&ParameterSpec], builder: &mut SchemaBuilder) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for p in params {
        let wire = p.wire_name();
        let schema = if p.source() == ParamSource::File {
            file_schema(wire, p)
        } else {
            builder.field_schema(wire, &p.ty, &p.param.info)
        };
        properties.insert(wire.to_string(), schema);
        if p.is_required() {
            required.push(Value::String(wire.to_string()));
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

fn file_schema(wire: &str, p: &ParameterSpec) -> Value {
    let title = p
        .param
        .info
        .title
        .clone()
        .unwrap_or_else(|| title_case(wire));
    let binary = json!({ "type": "string", "format": "binary" });
    let mut schema = match p.ty {
        ParamType::Array(_) => json!({ "type": "array", "items": binary }),
        _ => binary,
    };
    if let Value::Object(map) = &mut schema {
        map.insert("title".to_string(), Value::String(title));
        if let Some(d) = &p.param.info.description {
            map.insert("description".to_string(), Value::String(d.clone()));
        }
    }
    schema
}
