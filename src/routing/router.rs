use super::endpoint::{join_prefix, EndpointSpec, Route, RouterContext};
use crate::error::ConfigError;
use crate::handler::{Handler, HandlerRequest, HandlerResponse};
use crate::params::Signature;
use http::Method;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// A resolved endpoint together with its handler.
#[derive(Clone)]
pub struct Endpoint {
    pub spec: EndpointSpec,
    pub handler: Handler,
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("spec", &self.spec)
            .finish_non_exhaustive()
    }
}

/// Group of routes sharing a URL prefix, tags and the auto-documentation flag.
///
/// Routes are checked when added so a malformed rule or dependency fails at
/// the call site; they are resolved again against the final prefix when the
/// router is registered with an application.
///
/// ```
/// use brrtkit::handler::HandlerResponse;
/// use brrtkit::params::Arg;
/// use brrtkit::routing::{ApiRouter, Route};
///
/// let mut pets = ApiRouter::new("pets").prefix("/pets");
/// pets.add(Route::get("/{pet_id}", "get_pet").arg(Arg::integer("pet_id")), |req| {
///     let id: i64 = req.args.get("pet_id")?;
///     Ok(HandlerResponse::text(200, id.to_string()))
/// })
/// .unwrap();
///
/// let mut api = ApiRouter::new("api").prefix("/api/");
/// api.include_router(pets);
/// let endpoints = api.resolve().unwrap();
/// assert_eq!(endpoints[0].spec.rule, "/api/pets/{pet_id}");
/// ```
pub struct ApiRouter {
    name: String,
    url_prefix: String,
    tags: Option<Vec<String>>,
    auto_swagger: bool,
    routes: Vec<(Route, Handler)>,
    children: Vec<ApiRouter>,
}

impl ApiRouter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url_prefix: String::new(),
            tags: None,
            auto_swagger: true,
            routes: Vec::new(),
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn prefix(mut self, url_prefix: impl Into<String>) -> Self {
        self.url_prefix = url_prefix.into();
        self
    }

    /// Tags added to every route. Defaults to the router name.
    #[must_use]
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn auto_swagger(mut self, enabled: bool) -> Self {
        self.auto_swagger = enabled;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn router_tags(&self) -> Vec<String> {
        self.tags.clone().unwrap_or_else(|| vec![self.name.clone()])
    }

    /// Register `route` with `handler`.
    ///
    /// # Arguments
    ///
    /// * `route` - Method, rule, documentation and argument declarations
    /// * `handler` - Function invoked with the bound arguments
    ///
    /// # Errors
    ///
    /// A [`ConfigError`] for a malformed rule, an unresolvable dependency or a
    /// parameter schema that does not compile.
    pub fn add<H>(&mut self, route: Route, handler: H) -> Result<&mut Self, ConfigError>
    where
        H: Fn(HandlerRequest) -> anyhow::Result<HandlerResponse> + Send + Sync + 'static,
    {
        let tags = self.router_tags();
        let spec = EndpointSpec::resolve(
            &route,
            &RouterContext {
                prefix: &self.url_prefix,
                tags: &tags,
                auto_swagger: self.auto_swagger,
            },
        )?;
        debug!(
            router = %self.name,
            method = %spec.method,
            rule = %spec.rule,
            operation = %spec.operation,
            params = spec.params.len(),
            "Route added"
        );
        self.routes.push((route, Arc::new(handler)));
        Ok(self)
    }

    fn add_method<H>(
        &mut self,
        method: Method,
        rule: &str,
        operation: &str,
        signature: Signature,
        handler: H,
    ) -> Result<&mut Self, ConfigError>
    where
        H: Fn(HandlerRequest) -> anyhow::Result<HandlerResponse> + Send + Sync + 'static,
    {
        self.add(Route::new(method, rule, operation).args(signature), handler)
    }

    /// `GET` route with default documentation.
    ///
    /// # Errors
    ///
    /// See [`ApiRouter::add`].
    pub fn get<H>(
        &mut self,
        rule: &str,
        operation: &str,
        signature: Signature,
        handler: H,
    ) -> Result<&mut Self, ConfigError>
    where
        H: Fn(HandlerRequest) -> anyhow::Result<HandlerResponse> + Send + Sync + 'static,
    {
        self.add_method(Method::GET, rule, operation, signature, handler)
    }

    /// `POST` route with default documentation.
    ///
    /// # Errors
    ///
    /// See [`ApiRouter::add`].
    pub fn post<H>(
        &mut self,
        rule: &str,
        operation: &str,
        signature: Signature,
        handler: H,
    ) -> Result<&mut Self, ConfigError>
    where
        H: Fn(HandlerRequest) -> anyhow::Result<HandlerResponse> + Send + Sync + 'static,
    {
        self.add_method(Method::POST, rule, operation, signature, handler)
    }

    /// `PUT` route with default documentation.
    ///
    /// # Errors
    ///
    /// See [`ApiRouter::add`].
    pub fn put<H>(
        &mut self,
        rule: &str,
        operation: &str,
        signature: Signature,
        handler: H,
    ) -> Result<&mut Self, ConfigError>
    where
        H: Fn(HandlerRequest) -> anyhow::Result<HandlerResponse> + Send + Sync + 'static,
    {
        self.add_method(Method::PUT, rule, operation, signature, handler)
    }

    /// `DELETE` route with default documentation.
    ///
    /// # Errors
    ///
    /// See [`ApiRouter::add`].
    pub fn delete<H>(
        &mut self,
        rule: &str,
        operation: &str,
        signature: Signature,
        handler: H,
    ) -> Result<&mut Self, ConfigError>
    where
        H: Fn(HandlerRequest) -> anyhow::Result<HandlerResponse> + Send + Sync + 'static,
    {
        self.add_method(Method::DELETE, rule, operation, signature, handler)
    }

    /// `PATCH` route with default documentation.
    ///
    /// # Errors
    ///
    /// See [`ApiRouter::add`].
    pub fn patch<H>(
        &mut self,
        rule: &str,
        operation: &str,
        signature: Signature,
        handler: H,
    ) -> Result<&mut Self, ConfigError>
    where
        H: Fn(HandlerRequest) -> anyhow::Result<HandlerResponse> + Send + Sync + 'static,
    {
        self.add_method(Method::PATCH, rule, operation, signature, handler)
    }

    /// Nest `child` beneath this router's prefix.
    pub fn include_router(&mut self, child: ApiRouter) -> &mut Self {
        self.children.push(child);
        self
    }

    /// Resolve every route, nested routers included, into endpoints with
    /// their full rules.
    ///
    /// # Errors
    ///
    /// The first [`ConfigError`] met while resolving.
    pub fn resolve(&self) -> Result<Vec<Endpoint>, ConfigError> {
        let mut out = Vec::new();
        self.resolve_into("", true, &mut out)?;
        Ok(out)
    }

    fn resolve_into(
        &self,
        parent_prefix: &str,
        parent_auto_swagger: bool,
        out: &mut Vec<Endpoint>,
    ) -> Result<(), ConfigError> {
        let prefix = join_prefix(parent_prefix, &self.url_prefix);
        let tags = self.router_tags();
        let auto_swagger = parent_auto_swagger && self.auto_swagger;
        let ctx = RouterContext {
            prefix: &prefix,
            tags: &tags,
            auto_swagger,
        };
        for (route, handler) in &self.routes {
            out.push(Endpoint {
                spec: EndpointSpec::resolve(route, &ctx)?,
                handler: Arc::clone(handler),
            });
        }
        for child in &self.children {
            child.resolve_into(&prefix, auto_swagger, out)?;
        }
        Ok(())
    }
}

impl fmt::Debug for ApiRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiRouter")
            .field("name", &self.name)
            .field("url_prefix", &self.url_prefix)
            .field("routes", &self.routes.len())
            .field("children", &self.children)
            .finish_non_exhaustive()
    }
}

/// Ordered list of registered endpoints.
///
/// Filled at startup and read afterwards by the route table and the
/// document generator.
#[derive(Debug, Clone, Default)]
pub struct EndpointRegistry {
    endpoints: Vec<Arc<Endpoint>>,
}

impl EndpointRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an endpoint.
    ///
    /// # Errors
    ///
    /// [`ConfigError::DuplicateRoute`] when the method and rule are taken.
    pub fn register(&mut self, endpoint: Endpoint) -> Result<(), ConfigError> {
        let taken = self
            .endpoints
            .iter()
            .any(|e| e.spec.method == endpoint.spec.method && e.spec.rule == endpoint.spec.rule);
        if taken {
            return Err(ConfigError::DuplicateRoute {
                method: endpoint.spec.method.to_string(),
                rule: endpoint.spec.rule,
            });
        }
        info!(
            method = %endpoint.spec.method,
            rule = %endpoint.spec.rule,
            operation = %endpoint.spec.operation,
            "Endpoint registered"
        );
        self.endpoints.push(Arc::new(endpoint));
        Ok(())
    }

    /// Resolve `router` and register all of its endpoints.
    ///
    /// # Errors
    ///
    /// See [`ApiRouter::resolve`] and [`EndpointRegistry::register`].
    pub fn register_router(&mut self, router: &ApiRouter) -> Result<usize, ConfigError> {
        let endpoints = router.resolve()?;
        let count = endpoints.len();
        for endpoint in endpoints {
            self.register(endpoint)?;
        }
        Ok(count)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Endpoint>> {
        self.endpoints.iter()
    }

    pub fn specs(&self) -> impl Iterator<Item = &EndpointSpec> {
        self.endpoints.iter().map(|e| &e.spec)
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}
