//! # Routing Module
//!
//! Declares endpoints and turns their declarations into resolved
//! [`EndpointSpec`]s.
//!
//! ## Overview
//!
//! - [`Route`] describes one endpoint: method, rule, documentation and the
//!   handler's argument list.
//! - [`ApiRouter`] groups routes under a URL prefix with shared tags, and nests
//!   other routers.
//! - [`extract_signature`] turns the argument list into the flat parameter
//!   table, following dependency declarations and reclassifying arguments
//!   named after rule placeholders as path parameters.
//! - [`EndpointRegistry`] keeps resolved endpoints in registration order for
//!   the request path and the document generator.
//!
//! Rules accept `{name}`, `<name>` and `<converter:name>` placeholders; all are
//! published in `{name}` form.

mod endpoint;
mod router;
mod signature;

pub use endpoint::{
    default_responses, join_prefix, EndpointSpec, Route, DEFAULT_RESPONSE_DESCRIPTION,
};
pub use router::{ApiRouter, Endpoint, EndpointRegistry};
pub use signature::{extract_signature, openapi_rule, placeholder_names, ParameterSpec};
