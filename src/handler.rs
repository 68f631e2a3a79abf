//! Handler request/response types.
//!
//! A handler receives a [`HandlerRequest`] whose arguments are already bound
//! and validated, and returns a [`HandlerResponse`]. Returning `Err` ends the
//! request with a 500 response and a logged error.

use crate::binder::BoundArgs;
use crate::ids::RequestId;
use http::Method;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Request passed to a handler.
#[derive(Debug, Clone)]
pub struct HandlerRequest {
    pub request_id: RequestId,
    pub method: Method,
    pub path: String,
    pub operation: String,
    /// Validated arguments, keyed by argument name.
    pub args: BoundArgs,
    pub headers: HashMap<String, String>,
    pub cookies: HashMap<String, String>,
    pub query: Vec<(String, String)>,
    pub raw_body: Vec<u8>,
    /// Claims returned by the endpoint's security scheme, if any.
    pub claims: Option<Value>,
}

impl HandlerRequest {
    /// Header value by case-insensitive name.
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn get_cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }
}

/// Response produced by a handler.
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerResponse {
    pub status: u16,
    /// Header names are kept as given; lookups are case-insensitive.
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HandlerResponse {
    pub fn new(status: u16, content_type: &str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: vec![("Content-Type".to_string(), content_type.to_string())],
            body: body.into(),
        }
    }

    pub fn json(status: u16, body: &Value) -> Self {
        Self::new(status, "application/json", body.to_string())
    }

    /// JSON response from any serializable value.
    ///
    /// # Errors
    ///
    /// Returns the serialization error when `body` cannot be encoded.
    pub fn json_from<T: Serialize>(status: u16, body: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::new(status, "application/json", serde_json::to_vec(body)?))
    }

    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self::new(status, "text/plain; charset=utf-8", body.into())
    }

    pub fn html(status: u16, body: impl Into<String>) -> Self {
        Self::new(status, "text/html; charset=utf-8", body.into())
    }

    /// `{"detail": message}` with the given status.
    pub fn error(status: u16, message: impl Into<String>) -> Self {
        Self::json(status, &json!({ "detail": message.into() }))
    }

    pub fn no_content() -> Self {
        Self {
            status: 204,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Add a header. The server writes only `Content-Type`, `Allow` and
    /// `WWW-Authenticate`; see [`crate::server::response::write_handler_response`].
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_header(name, value);
        self
    }

    /// Replace any header of the same name.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
    }

    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Endpoint handler.
pub type Handler = Arc<dyn Fn(HandlerRequest) -> anyhow::Result<HandlerResponse> + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_body() {
        let res = HandlerResponse::error(404, "pet not found");
        assert_eq!(res.status, 404);
        assert_eq!(res.get_header("content-type"), Some("application/json"));
        let body: Value = serde_json::from_slice(&res.body).unwrap();
        assert_eq!(body, json!({"detail": "pet not found"}));
    }

    #[test]
    fn test_set_header_replaces() {
        let res = HandlerResponse::text(200, "ok")
            .with_header("X-Trace", "a")
            .with_header("x-trace", "b");
        assert_eq!(res.get_header("X-TRACE"), Some("b"));
        assert_eq!(res.headers.len(), 2);
    }

    #[test]
    fn test_no_content_has_no_body() {
        let res = HandlerResponse::no_content();
        assert_eq!(res.status, 204);
        assert!(res.body.is_empty());
        assert!(res.get_header("Content-Type").is_none());
    }
}
