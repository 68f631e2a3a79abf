use super::signature::{extract_signature, openapi_rule, ParameterSpec};
use crate::error::ConfigError;
use crate::params::{Arg, Signature};
use crate::schema::RequestSchema;
use crate::security::HttpSecurity;
use http::Method;
use indexmap::IndexMap;
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;

pub const DEFAULT_RESPONSE_DESCRIPTION: &str = "Successful Response";

/// Responses documented when a route declares none.
pub fn default_responses(description: &str) -> IndexMap<String, Value> {
    let mut responses = IndexMap::new();
    responses.insert(
        "200".to_string(),
        json!({
            "description": description,
            "content": { "application/json": { "schema": {} } }
        }),
    );
    responses.insert(
        "422".to_string(),
        json!({
            "description": "ValidationError",
            "content": {
                "application/json": {
                    "example": [
                        { "loc": ["string"], "msg": "string", "type": "string" }
                    ]
                }
            }
        }),
    );
    responses
}

/// Route declaration: method, rule, documentation and handler signature.
///
/// ```
/// use brrtkit::params::{Arg, FieldBuilder, Param};
/// use brrtkit::routing::Route;
///
/// let route = Route::get("/pets/{pet_id}", "get_pet")
///     .summary("Fetch one pet")
///     .arg(Arg::integer("pet_id"))
///     .arg(Arg::boolean("verbose").param(Param::query().with_default(false)));
/// assert_eq!(route.rule(), "/pets/{pet_id}");
/// ```
#[derive(Clone)]
pub struct Route {
    method: Method,
    rule: String,
    operation: String,
    tags: Vec<String>,
    summary: Option<String>,
    description: Option<String>,
    response_description: String,
    responses: Option<IndexMap<String, Value>>,
    auto_swagger: bool,
    custom_swagger: Option<Value>,
    security: Option<Arc<dyn HttpSecurity>>,
    signature: Signature,
}

impl Route {
    pub fn new(method: Method, rule: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            method,
            rule: rule.into(),
            operation: operation.into(),
            tags: Vec::new(),
            summary: None,
            description: None,
            response_description: DEFAULT_RESPONSE_DESCRIPTION.to_string(),
            responses: None,
            auto_swagger: true,
            custom_swagger: None,
            security: None,
            signature: Vec::new(),
        }
    }

    pub fn get(rule: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::new(Method::GET, rule, operation)
    }

    pub fn post(rule: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::new(Method::POST, rule, operation)
    }

    pub fn put(rule: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::new(Method::PUT, rule, operation)
    }

    pub fn delete(rule: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::new(Method::DELETE, rule, operation)
    }

    pub fn patch(rule: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::new(Method::PATCH, rule, operation)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn rule(&self) -> &str {
        &self.rule
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    #[must_use]
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn response_description(mut self, description: impl Into<String>) -> Self {
        self.response_description = description.into();
        self
    }

    /// Document a response. Once any response is declared the defaults are
    /// no longer added.
    #[must_use]
    pub fn response(mut self, status: impl ToString, response: Value) -> Self {
        self.responses
            .get_or_insert_with(IndexMap::new)
            .insert(status.to_string(), response);
        self
    }

    #[must_use]
    pub fn auto_swagger(mut self, enabled: bool) -> Self {
        self.auto_swagger = enabled;
        self
    }

    /// Publish `fragment` as this operation's document entry, verbatim.
    #[must_use]
    pub fn custom_swagger(mut self, fragment: Value) -> Self {
        self.custom_swagger = Some(fragment);
        self
    }

    #[must_use]
    pub fn security<S: HttpSecurity + 'static>(mut self, scheme: S) -> Self {
        self.security = Some(Arc::new(scheme));
        self
    }

    #[must_use]
    pub fn security_arc(mut self, scheme: Arc<dyn HttpSecurity>) -> Self {
        self.security = Some(scheme);
        self
    }

    #[must_use]
    pub fn arg(mut self, arg: Arg) -> Self {
        self.signature.push(arg);
        self
    }

    #[must_use]
    pub fn args<I: IntoIterator<Item = Arg>>(mut self, args: I) -> Self {
        self.signature.extend(args);
        self
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("rule", &self.rule)
            .field("operation", &self.operation)
            .field("args", &self.signature.len())
            .finish_non_exhaustive()
    }
}

/// Router-level settings applied while a route is resolved.
#[derive(Debug, Clone)]
pub(crate) struct RouterContext<'a> {
    pub prefix: &'a str,
    pub tags: &'a [String],
    pub auto_swagger: bool,
}

/// A registered endpoint, fully resolved.
#[derive(Clone)]
pub struct EndpointSpec {
    /// Full rule in `{name}` placeholder form, prefixes included.
    pub rule: String,
    pub method: Method,
    pub operation: String,
    pub params: IndexMap<String, ParameterSpec>,
    pub tags: Vec<String>,
    pub summary: String,
    pub description: String,
    pub response_description: String,
    pub responses: IndexMap<String, Value>,
    pub auto_swagger: bool,
    pub custom_swagger: Option<Value>,
    pub request_schema: RequestSchema,
    pub security: Option<Arc<dyn HttpSecurity>>,
}

impl EndpointSpec {
    pub(crate) fn resolve(route: &Route, ctx: &RouterContext<'_>) -> Result<Self, ConfigError> {
        let full_rule = join_prefix(ctx.prefix, &route.rule);
        let rule = openapi_rule(&full_rule)?;
        let params = extract_signature(&rule, &route.signature)?;
        let request_schema = RequestSchema::compile(&route.operation, &params)?;

        let mut tags = route.tags.clone();
        tags.extend(ctx.tags.iter().filter(|t| !route.tags.contains(t)).cloned());

        Ok(Self {
            rule,
            method: route.method.clone(),
            operation: route.operation.clone(),
            params,
            tags,
            summary: route
                .summary
                .clone()
                .unwrap_or_else(|| route.operation.clone()),
            description: route
                .description
                .clone()
                .unwrap_or_else(|| route.operation.clone()),
            response_description: route.response_description.clone(),
            responses: route
                .responses
                .clone()
                .unwrap_or_else(|| default_responses(&route.response_description)),
            auto_swagger: ctx.auto_swagger && route.auto_swagger,
            custom_swagger: route.custom_swagger.clone(),
            request_schema,
            security: route.security.clone(),
        })
    }

    /// Lowercase method, as used for OpenAPI path item keys.
    pub fn method_key(&self) -> String {
        self.method.as_str().to_ascii_lowercase()
    }
}

impl fmt::Debug for EndpointSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointSpec")
            .field("method", &self.method)
            .field("rule", &self.rule)
            .field("operation", &self.operation)
            .field("params", &self.params.keys().collect::<Vec<_>>())
            .field("auto_swagger", &self.auto_swagger)
            .field(
                "security",
                &self.security.as_ref().map(|s| s.scheme_name().to_string()),
            )
            .finish_non_exhaustive()
    }
}

/// `prefix.trim_end('/') + '/' + rule.trim_start('/')`, or `rule` alone
/// without a prefix.
pub fn join_prefix(prefix: &str, rule: &str) -> String {
    if prefix.is_empty() {
        return rule.to_string();
    }
    format!(
        "{}/{}",
        prefix.trim_end_matches('/'),
        rule.trim_start_matches('/')
    )
}
