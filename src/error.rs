//! Error types shared across the crate.
//!
//! Two families exist:
//!
//! - [`ConfigError`] is raised while routes are being registered. It means the
//!   application is wired incorrectly and startup should abort.
//! - [`ValidationErrors`] is produced per request by the binder and is turned
//!   into a `422 Unprocessable Entity` response instead of being propagated.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Registration-time failures. These are fatal to startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Placeholder delimiters in a route rule do not balance.
    #[error("invalid use of path placeholders in rule: {rule}")]
    InvalidRule { rule: String },

    /// A parameter name is found in the rule but its placeholder is never closed.
    #[error("invalid path, no closing mark for '{name}' in: {rule}")]
    UnclosedPlaceholder { rule: String, name: String },

    /// A `Depends` marker has neither an explicit target nor a model annotation.
    #[error("cannot resolve dependency for argument '{name}'")]
    UnresolvedDependency { name: String },

    /// The same method and rule were registered twice.
    #[error("route {method} {rule} is already registered")]
    DuplicateRoute { method: String, rule: String },

    /// The synthesized validation schema could not be compiled.
    #[error("invalid request schema for '{operation}': {message}")]
    Schema { operation: String, message: String },

    /// The Swagger UI template failed to load.
    #[error("swagger ui template error: {0}")]
    Template(String),
}

/// One offending field in a rejected request.
///
/// Serialized in the same shape FastAPI and pydantic use, so existing clients
/// can parse it: `{"loc": ["query", "limit"], "msg": "...", "type": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrorItem {
    /// Location path: the parameter source followed by the field name and any
    /// nested keys.
    pub loc: Vec<String>,
    /// Human-readable violation reason.
    pub msg: String,
    /// Machine-readable violation kind, e.g. `value_error.missing`.
    #[serde(rename = "type")]
    pub kind: String,
}

impl ValidationErrorItem {
    pub fn new(loc: Vec<String>, msg: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            loc,
            msg: msg.into(),
            kind: kind.into(),
        }
    }

    /// Shorthand for a missing required field.
    pub fn missing(source: &str, name: &str) -> Self {
        Self::new(
            vec![source.to_string(), name.to_string()],
            "field required",
            "value_error.missing",
        )
    }
}

/// All validation failures for a single request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{} validation error(s)", .errors.len())]
pub struct ValidationErrors {
    pub errors: Vec<ValidationErrorItem>,
}

impl ValidationErrors {
    pub fn push(&mut self, item: ValidationErrorItem) {
        self.errors.push(item);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// JSON array served as the 422 response body.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.errors).unwrap_or_else(|_| serde_json::Value::Array(Vec::new()))
    }
}

/// Failure raised by a security scheme while authorizing a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SecurityError {
    #[error("not authenticated")]
    MissingCredentials,
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
}

impl SecurityError {
    /// HTTP status matching the failure.
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            SecurityError::Forbidden(_) => 403,
            _ => 401,
        }
    }
}

/// Failure while reading a bound argument inside a handler.
#[derive(Debug, Error)]
pub enum BindError {
    #[error("argument '{0}' was not bound")]
    Missing(String),
    #[error("argument '{name}' has an unexpected shape: {source}")]
    Deserialize {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_serializes_with_type_key() {
        let item = ValidationErrorItem::missing("query", "limit");
        let v = serde_json::to_value(&item).unwrap();
        assert_eq!(v["loc"], serde_json::json!(["query", "limit"]));
        assert_eq!(v["type"], "value_error.missing");
        assert_eq!(v["msg"], "field required");
    }

    #[test]
    fn test_security_status() {
        assert_eq!(SecurityError::MissingCredentials.status(), 401);
        assert_eq!(SecurityError::Forbidden("no".into()).status(), 403);
    }
}
