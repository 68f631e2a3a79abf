//! # Security Module
//!
//! HTTP authentication schemes that are both enforced per request and
//! published in the OpenAPI document.
//!
//! ## Overview
//!
//! Two schemes are built in:
//! - [`HttpBasicSecurity`] - `Authorization: Basic <base64(user:pass)>`
//! - [`HttpBearerSecurity`] - `Authorization: Bearer <token>`, with JWT
//!   verification through `jsonwebtoken`
//!
//! Constructing a scheme registers its name in a [`SecurityRegistry`]. The
//! registry feeds `components.securitySchemes`; the scheme attached to a
//! route is what runs at request time.
//!
//! ## Enforcing
//!
//! [`HttpSecurity::authorize`] passes every request by default. Enforce by
//! configuring the built-in schemes or by implementing the trait on your own
//! type:
//!
//! ```rust
//! use brrtkit::error::SecurityError;
//! use brrtkit::security::{
//!     HttpBasicSecurity, HttpScheme, HttpSecurity, SecurityRegistry, SecurityRequest,
//! };
//! use serde_json::{json, Value};
//!
//! struct AdminOnly(HttpBasicSecurity);
//!
//! impl HttpSecurity for AdminOnly {
//!     fn scheme_name(&self) -> &str { self.0.scheme_name() }
//!     fn scheme(&self) -> HttpScheme { HttpScheme::Basic }
//!     fn authorize(&self, req: &SecurityRequest<'_>) -> Result<Option<Value>, SecurityError> {
//!         let creds = self.0.credentials(req)?;
//!         if creds.username == "admin" && creds.password == "secret" {
//!             Ok(Some(json!({ "sub": creds.username })))
//!         } else {
//!             Err(SecurityError::InvalidCredentials("bad username or password".into()))
//!         }
//!     }
//! }
//!
//! let registry = SecurityRegistry::new();
//! let scheme = AdminOnly(HttpBasicSecurity::with_registry("adminAuth", &registry));
//! assert_eq!(scheme.requirement(), json!({ "adminAuth": [] }));
//! ```

mod basic;
mod bearer;
mod registry;

pub use basic::{BasicCredentials, HttpBasicSecurity};
pub use bearer::HttpBearerSecurity;
pub use registry::SecurityRegistry;

use crate::error::SecurityError;
use crate::server::ParsedRequest;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fmt;

/// HTTP authentication scheme kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpScheme {
    Basic,
    Bearer,
}

impl HttpScheme {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpScheme::Basic => "basic",
            HttpScheme::Bearer => "bearer",
        }
    }

    /// Entry for `components.securitySchemes`.
    #[must_use]
    pub fn openapi_scheme(&self) -> Value {
        match self {
            HttpScheme::Basic => json!({ "type": "http", "scheme": "basic" }),
            HttpScheme::Bearer => {
                json!({ "type": "http", "scheme": "bearer", "bearerFormat": "JWT" })
            }
        }
    }
}

impl fmt::Display for HttpScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request context for security checks.
///
/// Borrowed view over the credentials a scheme may read.
#[derive(Debug, Clone, Copy)]
pub struct SecurityRequest<'a> {
    /// HTTP headers (lowercase keys)
    pub headers: &'a HashMap<String, String>,
    /// Query string pairs
    pub query: &'a [(String, String)],
    /// Cookies
    pub cookies: &'a HashMap<String, String>,
}

impl<'a> SecurityRequest<'a> {
    /// Get a header by name (case-insensitive)
    #[inline]
    pub fn get_header(&self, name: &str) -> Option<&'a str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Get a query parameter by name
    #[inline]
    pub fn get_query(&self, name: &str) -> Option<&'a str> {
        self.query
            .iter()
            .rfind(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a cookie by name
    #[inline]
    pub fn get_cookie(&self, name: &str) -> Option<&'a str> {
        self.cookies.get(name).map(String::as_str)
    }
}

impl<'a> From<&'a ParsedRequest> for SecurityRequest<'a> {
    fn from(req: &'a ParsedRequest) -> Self {
        Self {
            headers: &req.headers,
            query: &req.query,
            cookies: &req.cookies,
        }
    }
}

/// An HTTP security scheme.
pub trait HttpSecurity: Send + Sync {
    /// Name under which the scheme is registered and referenced.
    fn scheme_name(&self) -> &str;

    fn scheme(&self) -> HttpScheme;

    /// Operation-level security requirement: `{name: []}`.
    fn requirement(&self) -> Value {
        let mut req = serde_json::Map::new();
        req.insert(self.scheme_name().to_string(), Value::Array(Vec::new()));
        Value::Object(req)
    }

    /// Credentials part of the `Authorization` header, when its scheme
    /// matches this one (compared case-insensitively).
    fn authorization_data<'a>(&self, req: &SecurityRequest<'a>) -> Option<&'a str> {
        let header = req.get_header("authorization")?;
        let (scheme, data) = header.split_once(' ').unwrap_or((header, ""));
        scheme
            .eq_ignore_ascii_case(self.scheme().as_str())
            .then(|| data.trim())
    }

    /// Authorize a request.
    ///
    /// Returns claims to expose to the handler, if any. The default lets every
    /// request through.
    fn authorize(&self, _req: &SecurityRequest<'_>) -> Result<Option<Value>, SecurityError> {
        Ok(None)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn headers(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v.to_string()))
            .collect()
    }

    struct Plain;

    impl HttpSecurity for Plain {
        fn scheme_name(&self) -> &str {
            "plain"
        }
        fn scheme(&self) -> HttpScheme {
            HttpScheme::Bearer
        }
    }

    #[test]
    fn test_authorization_data_case_insensitive_scheme() {
        let h = headers(&[("Authorization", "bEaReR abc.def")]);
        let cookies = HashMap::new();
        let req = SecurityRequest {
            headers: &h,
            query: &[],
            cookies: &cookies,
        };
        assert_eq!(Plain.authorization_data(&req), Some("abc.def"));
    }

    #[test]
    fn test_authorization_data_other_scheme() {
        let h = headers(&[("Authorization", "Basic Zm9vOmJhcg==")]);
        let cookies = HashMap::new();
        let req = SecurityRequest {
            headers: &h,
            query: &[],
            cookies: &cookies,
        };
        assert_eq!(Plain.authorization_data(&req), None);
        assert!(Plain.authorize(&req).unwrap().is_none());
    }

    #[test]
    fn test_requirement_and_openapi_entry() {
        assert_eq!(Plain.requirement(), json!({"plain": []}));
        assert_eq!(HttpScheme::Bearer.openapi_scheme()["bearerFormat"], "JWT");
        assert!(HttpScheme::Basic.openapi_scheme().get("bearerFormat").is_none());
    }
}
