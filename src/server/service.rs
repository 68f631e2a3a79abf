use super::request::{parse_request, ParsedRequest};
use super::response::write_handler_response;
use crate::binder::bind;
use crate::error::{ConfigError, SecurityError};
use crate::handler::{HandlerRequest, HandlerResponse};
use crate::ids::RequestId;
use crate::openapi::{SwaggerGenerator, SwaggerUi};
use crate::router::{RouteLookup, RouteMatch, Router};
use crate::routing::{ApiRouter, EndpointRegistry};
use crate::security::{HttpScheme, SecurityRequest};
use http::Method;
use may_minihttp::{HttpService, Request, Response};
use serde_json::Value;
use std::io;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, info_span, warn};

/// Application under construction: routers, documentation and UI.
///
/// ```
/// use brrtkit::handler::HandlerResponse;
/// use brrtkit::openapi::{SwaggerGenerator, SwaggerUi};
/// use brrtkit::routing::ApiRouter;
/// use brrtkit::server::App;
///
/// let mut health = ApiRouter::new("health");
/// health.get("/health", "health", Vec::new(), |_| Ok(HandlerResponse::text(200, "ok"))).unwrap();
///
/// let mut app = App::new();
/// app.register_router(&health).unwrap();
/// let service = app
///     .with_docs(SwaggerGenerator::new("Demo"), Some(SwaggerUi::new("/docs", "/openapi.json")))
///     .unwrap()
///     .into_service()
///     .unwrap();
/// assert_eq!(service.registry().len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct App {
    registry: EndpointRegistry,
    generator: Option<SwaggerGenerator>,
    swagger_ui: Option<SwaggerUi>,
}

impl App {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every endpoint of `router`, nested routers included.
    ///
    /// # Errors
    ///
    /// Any [`ConfigError`] raised while resolving the routes, or
    /// [`ConfigError::DuplicateRoute`].
    pub fn register_router(&mut self, router: &ApiRouter) -> Result<&mut Self, ConfigError> {
        let count = self.registry.register_router(router)?;
        info!(router = %router.name(), endpoints = count, "Router registered");
        Ok(self)
    }

    /// Serve the generated document at the generator's URL and, optionally,
    /// Swagger UI.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Template`] when the UI shell cannot be rendered.
    pub fn with_docs(
        mut self,
        generator: SwaggerGenerator,
        swagger_ui: Option<SwaggerUi>,
    ) -> Result<Self, ConfigError> {
        if let Some(ui) = &swagger_ui {
            ui.render_index()?;
        }
        self.generator = Some(generator);
        self.swagger_ui = swagger_ui;
        Ok(self)
    }

    pub fn registry(&self) -> &EndpointRegistry {
        &self.registry
    }

    /// Compile the route table and freeze the application.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidRule`] when a rule cannot be compiled.
    pub fn into_service(self) -> Result<AppService, ConfigError> {
        let router = Router::new(&self.registry)?;
        Ok(AppService {
            state: Arc::new(AppState {
                registry: self.registry,
                router,
                generator: self.generator,
                swagger_ui: self.swagger_ui,
            }),
        })
    }
}

#[derive(Debug)]
struct AppState {
    registry: EndpointRegistry,
    router: Router,
    generator: Option<SwaggerGenerator>,
    swagger_ui: Option<SwaggerUi>,
}

/// Immutable, cheaply cloned service shared by the connection coroutines.
#[derive(Debug, Clone)]
pub struct AppService {
    state: Arc<AppState>,
}

impl AppService {
    pub fn registry(&self) -> &EndpointRegistry {
        &self.state.registry
    }

    /// The current OpenAPI document, when documentation is enabled.
    pub fn openapi(&self) -> Option<Value> {
        self.state
            .generator
            .as_ref()
            .map(|g| g.generate(&self.state.registry))
    }

    /// Handle one parsed request.
    ///
    /// Order: documentation routes, route matching (400/404/405), security
    /// (401/403), binding and validation (422), then the handler. Handler
    /// errors and panics become 500.
    pub fn handle(&self, req: ParsedRequest) -> HandlerResponse {
        let request_id = RequestId::from_header_or_new(req.get_header("x-request-id"));
        let span = info_span!(
            "request",
            request_id = %request_id,
            method = %req.method,
            path = %req.path
        );
        let _entered = span.enter();
        let start = Instant::now();

        let response = self.dispatch(request_id, req);

        info!(
            status = response.status,
            duration_us = start.elapsed().as_micros() as u64,
            "Request completed"
        );
        response
    }

    fn dispatch(&self, request_id: RequestId, req: ParsedRequest) -> HandlerResponse {
        if req.method == "GET" {
            if let Some(generator) = &self.state.generator {
                if req.path == generator.documentation_url() {
                    return HandlerResponse::json(200, &generator.generate(&self.state.registry));
                }
            }
            if let Some(res) = self.state.swagger_ui.as_ref().and_then(|ui| ui.serve(&req.path)) {
                return res;
            }
        }

        let Ok(method) = req.method.parse::<Method>() else {
            return HandlerResponse::error(400, "Bad Request");
        };
        let route_match = match self.state.router.route(&method, &req.path) {
            RouteLookup::Matched(m) => m,
            RouteLookup::MethodNotAllowed(allowed) => {
                let allow = allowed
                    .iter()
                    .map(Method::as_str)
                    .collect::<Vec<_>>()
                    .join(", ");
                return HandlerResponse::error(405, "Method Not Allowed")
                    .with_header("Allow", allow);
            }
            RouteLookup::MalformedPath(name) => {
                let detail = format!("path parameter '{name}' is not valid UTF-8");
                return HandlerResponse::error(400, detail);
            }
            RouteLookup::NotFound => return HandlerResponse::error(404, "Not Found"),
        };

        let claims = match authorize(&route_match, &req) {
            Ok(claims) => claims,
            Err(res) => return res,
        };

        let spec = &route_match.endpoint.spec;
        let args = match bind(spec, &req, &route_match.path_params) {
            Ok(args) => args,
            Err(errors) => {
                warn!(
                    operation = %spec.operation,
                    errors = ?errors.errors,
                    "Request validation failed"
                );
                return HandlerResponse::json(422, &errors.to_json());
            }
        };

        let ParsedRequest {
            path,
            headers,
            cookies,
            query,
            body,
            ..
        } = req;
        let handler_req = HandlerRequest {
            request_id,
            method,
            path,
            operation: spec.operation.clone(),
            args,
            headers,
            cookies,
            query,
            raw_body: body,
            claims,
        };

        let handler = &route_match.endpoint.handler;
        match catch_unwind(AssertUnwindSafe(|| handler(handler_req))) {
            Ok(Ok(res)) => res,
            Ok(Err(e)) => {
                error!(operation = %spec.operation, error = %e, "Handler failed");
                HandlerResponse::error(500, "Internal Server Error")
            }
            Err(panic) => {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!(operation = %spec.operation, panic = %message, "Handler panicked");
                HandlerResponse::error(500, "Internal Server Error")
            }
        }
    }
}

/// Run the endpoint's security scheme, if any.
fn authorize(
    route_match: &RouteMatch,
    req: &ParsedRequest,
) -> Result<Option<Value>, HandlerResponse> {
    let Some(scheme) = &route_match.endpoint.spec.security else {
        return Ok(None);
    };
    scheme.authorize(&SecurityRequest::from(req)).map_err(|e| {
        warn!(
            operation = %route_match.endpoint.spec.operation,
            scheme_name = %scheme.scheme_name(),
            error = %e,
            "Authorization failed"
        );
        let res = HandlerResponse::error(e.status(), e.to_string());
        match (&e, scheme.scheme()) {
            (SecurityError::Forbidden(_), _) => res,
            (_, HttpScheme::Basic) => res.with_header("WWW-Authenticate", "Basic"),
            (_, HttpScheme::Bearer) => res.with_header("WWW-Authenticate", "Bearer"),
        }
    })
}

impl HttpService for AppService {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        let response = match parse_request(req) {
            Ok(parsed) => self.handle(parsed),
            Err(e) => {
                warn!(error = %e, "Request body could not be read");
                HandlerResponse::error(400, "Bad Request")
            }
        };
        write_handler_response(res, response);
        Ok(())
    }
}
