//! # brrtkit
//!
//! **brrtkit** adds declarative request-parameter binding, request validation and
//! automatic [OpenAPI 3.1.0](https://spec.openapis.org/oas/v3.1.0) documentation
//! to services running on the `may` coroutine runtime and `may_minihttp`.
//!
//! ## Overview
//!
//! A handler declares its inputs as a [`params::Signature`]. Each argument
//! says where its value comes from (path, query, header, JSON body, form,
//! URL-encoded form or file upload) and carries validation and documentation
//! metadata. From that one declaration brrtkit:
//!
//! - binds and coerces the request values before the handler runs,
//! - validates them with a JSON Schema and answers `422` with a
//!   `[{loc, msg, type}]` list when they are invalid,
//! - documents the endpoint in a generated OpenAPI document,
//! - serves that document and a Swagger UI page.
//!
//! HTTP `basic` and `bearer` security schemes can be attached per route; they
//! appear in the document and run before binding.
//!
//! ## Architecture
//!
//! - **[`params`]** - Argument declarations, parameter sources and models
//! - **[`schema`]** - JSON Schema synthesis and the per-endpoint validator
//! - **[`routing`]** - `ApiRouter`, routes, signature extraction and the endpoint registry
//! - **[`binder`]** - Request binding, coercion and validation
//! - **[`security`]** - HTTP basic/bearer schemes and their registry
//! - **[`openapi`]** - Document generation and Swagger UI
//! - **[`router`]** - Regex route table used at request time
//! - **[`server`]** - `may_minihttp` service and server handle
//! - **[`handler`]** - Handler request/response types
//! - **[`responses`]** - Helpers for documented responses
//! - **[`config`]**, **[`logging`]** - Startup configuration and tracing setup
//!
//! ### Request Handling Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Client
//!     participant Service as AppService
//!     participant Router as router::Router
//!     participant Security as HttpSecurity
//!     participant Binder as binder::bind
//!     participant Handler
//!
//!     Client->>Service: HTTP request
//!     Service->>Service: Docs JSON / Swagger UI?
//!     Service->>Router: route(method, path)
//!     Router-->>Service: endpoint + path params (or 404/405)
//!     Service->>Security: authorize(request)
//!     Security-->>Service: claims (or 401/403)
//!     Service->>Binder: bind(endpoint, request, path params)
//!     Binder-->>Service: BoundArgs (or 422)
//!     Service->>Handler: HandlerRequest
//!     Handler-->>Service: HandlerResponse (Err/panic -> 500)
//!     Service-->>Client: HTTP response
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use brrtkit::prelude::*;
//!
//! let mut pets = ApiRouter::new("pets").prefix("/api");
//! pets.get(
//!     "/pets/{pet_id}",
//!     "get_pet",
//!     vec![
//!         Arg::integer("pet_id").param(Param::path().ge(1.0)),
//!         Arg::boolean("verbose").default_value(false),
//!     ],
//!     |req| {
//!         let id: i64 = req.args.get("pet_id")?;
//!         Ok(HandlerResponse::json(200, &serde_json::json!({"id": id})))
//!     },
//! )
//! .unwrap();
//!
//! let mut app = App::new();
//! app.register_router(&pets).unwrap();
//! let service = app
//!     .with_docs(SwaggerGenerator::new("Pets"), Some(SwaggerUi::new("/docs", "/openapi.json")))
//!     .unwrap()
//!     .into_service()
//!     .unwrap();
//!
//! let doc = service.openapi().unwrap();
//! assert!(doc["paths"]["/api/pets/{pet_id}"]["get"].is_object());
//! ```
//!
//! Serve it with `HttpServer(service).start("127.0.0.1:8080")`.
//!
//! ## Errors
//!
//! Registration problems are [`error::ConfigError`]s and abort startup.
//! Request problems never escape the service: they become `401`/`403`,
//! `404`/`405`, `422` or `500` responses.

pub mod binder;
pub mod config;
pub mod error;
pub mod handler;
pub mod ids;
pub mod logging;
pub mod openapi;
pub mod params;
pub mod responses;
pub mod router;
pub mod routing;
pub mod schema;
pub mod security;
pub mod server;
pub mod static_files;

pub use error::{BindError, ConfigError, SecurityError, ValidationErrorItem, ValidationErrors};

/// Everything needed to declare routes and run an application.
pub mod prelude {
    pub use crate::binder::{BoundArgs, UploadedFile};
    pub use crate::config::AppConfig;
    pub use crate::error::{BindError, ConfigError, SecurityError};
    pub use crate::handler::{Handler, HandlerRequest, HandlerResponse};
    pub use crate::openapi::{SwaggerGenerator, SwaggerUi};
    pub use crate::params::{
        Arg, ArgDefault, Dependency, Depends, EnumType, FieldBuilder, FieldInfo, Model,
        ModelSchema, Param, ParamEnum, ParamSource, ParamType, Signature,
    };
    pub use crate::responses::{json_example, model_example};
    pub use crate::routing::{ApiRouter, Route};
    pub use crate::security::{
        BasicCredentials, HttpBasicSecurity, HttpBearerSecurity, HttpScheme, HttpSecurity,
    };
    pub use crate::server::{App, AppService, HttpServer, ServerHandle};
}
