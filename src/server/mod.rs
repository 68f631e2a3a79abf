//! # Server Module
//!
//! Hosts the application on `may_minihttp`.
//!
//! - [`parse_request`] reads the method, path, query string, headers, cookies
//!   and raw body of an incoming request.
//! - [`App`] collects routers and documentation settings; [`App::into_service`]
//!   freezes it into an [`AppService`], the `HttpService` shared by all
//!   connection coroutines.
//! - [`HttpServer`] binds the service to an address and returns a
//!   [`ServerHandle`].

pub mod http_server;
pub mod request;
pub mod response;
pub mod service;

pub use http_server::{HttpServer, ServerHandle};
pub use request::{parse_cookies, parse_query_params, parse_request, ParsedRequest};
pub use service::{App, AppService};
