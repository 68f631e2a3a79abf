//! # Router Module
//!
//! Matches incoming requests to registered endpoints.
//!
//! ## Architecture
//!
//! 1. **Compilation**: when the application is built, every endpoint rule
//!    (e.g. `/pets/{pet_id}`) is turned into an anchored regex that captures
//!    the path variables.
//!
//! 2. **Matching**: each request path is tested against the compiled
//!    patterns in registration order. A path that matches only under other
//!    methods is reported as `MethodNotAllowed` so the service can answer 405.
//!
//! ## Example
//!
//! ```rust
//! use brrtkit::handler::HandlerResponse;
//! use brrtkit::params::Arg;
//! use brrtkit::router::{RouteLookup, Router};
//! use brrtkit::routing::{ApiRouter, EndpointRegistry};
//! use http::Method;
//!
//! let mut api = ApiRouter::new("pets");
//! api.get("/pets/{pet_id}", "get_pet", vec![Arg::integer("pet_id")], |_| {
//!     Ok(HandlerResponse::no_content())
//! })
//! .unwrap();
//! let mut registry = EndpointRegistry::new();
//! registry.register_router(&api).unwrap();
//!
//! let router = Router::new(&registry).unwrap();
//! match router.route(&Method::GET, "/pets/7") {
//!     RouteLookup::Matched(m) => assert_eq!(m.get_path_param("pet_id"), Some("7")),
//!     other => panic!("unexpected {other:?}"),
//! }
//! ```

mod core;
#[cfg(test)]
mod tests;

pub use core::{RouteLookup, RouteMatch, Router};
