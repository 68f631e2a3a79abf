//! # OpenAPI Module
//!
//! Generates the OpenAPI 3.1 document from registered endpoints and serves
//! Swagger UI for it.
//!
//! - [`SwaggerGenerator`] walks an [`EndpointRegistry`](crate::routing::EndpointRegistry)
//!   and builds the document from scratch on every call. Parameter schemas,
//!   request bodies (JSON, multipart and URL-encoded forms), security
//!   requirements and shared model/enum definitions all come from the
//!   endpoint declarations.
//! - [`SwaggerUi`] renders the UI shell and serves an optional local copy of
//!   the Swagger UI bundle.

mod generator;
mod swagger_ui;

pub use generator::{SwaggerGenerator, DEFAULT_JSON_URL, OPENAPI_VERSION};
pub use swagger_ui::{SwaggerUi, DEFAULT_DOCS_URL};
