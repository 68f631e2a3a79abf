use super::{HttpScheme, HttpSecurity, SecurityRegistry, SecurityRequest};
use crate::error::SecurityError;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde_json::Value;
use std::fmt;
use tracing::debug;

/// HTTP `bearer` scheme.
///
/// Passes every request until a secret is configured with
/// [`HttpBearerSecurity::with_secret`]; from then on the token must be a JWT
/// signed with that secret and its claims reach the handler.
#[derive(Clone)]
pub struct HttpBearerSecurity {
    name: String,
    secret: Option<Vec<u8>>,
    validation: Validation,
}

impl HttpBearerSecurity {
    /// Create the scheme and register it in the global registry.
    pub fn new(scheme_name: impl Into<String>) -> Self {
        Self::with_registry(scheme_name, SecurityRegistry::global())
    }

    /// Create the scheme and register it in `registry`.
    pub fn with_registry(scheme_name: impl Into<String>, registry: &SecurityRegistry) -> Self {
        let name = scheme_name.into();
        registry.register(name.clone(), HttpScheme::Bearer);
        Self {
            name,
            secret: None,
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Verify tokens as JWTs signed with `secret`.
    #[must_use]
    pub fn with_secret(mut self, secret: impl AsRef<[u8]>) -> Self {
        self.secret = Some(secret.as_ref().to_vec());
        self
    }

    /// Replace the default validation (HS256, `exp` required).
    #[must_use]
    pub fn validation(mut self, validation: Validation) -> Self {
        self.validation = validation;
        self
    }

    /// Raw bearer token.
    ///
    /// # Errors
    ///
    /// [`SecurityError::MissingCredentials`] when no bearer token is sent.
    pub fn token<'a>(&self, req: &SecurityRequest<'a>) -> Result<&'a str, SecurityError> {
        self.authorization_data(req)
            .filter(|t| !t.is_empty())
            .ok_or(SecurityError::MissingCredentials)
    }

    /// Verify `token` against `key` and return its claims.
    ///
    /// # Errors
    ///
    /// [`SecurityError::InvalidCredentials`] carrying the `jsonwebtoken`
    /// failure (bad signature, expired, malformed).
    pub fn decode(
        token: &str,
        key: &[u8],
        validation: &Validation,
    ) -> Result<Value, SecurityError> {
        decode::<Value>(token, &DecodingKey::from_secret(key), validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!(error = %e, "Bearer token rejected");
                SecurityError::InvalidCredentials(e.to_string())
            })
    }
}

impl HttpSecurity for HttpBearerSecurity {
    fn scheme_name(&self) -> &str {
        &self.name
    }

    fn scheme(&self) -> HttpScheme {
        HttpScheme::Bearer
    }

    fn authorize(&self, req: &SecurityRequest<'_>) -> Result<Option<Value>, SecurityError> {
        let Some(secret) = &self.secret else {
            return Ok(None);
        };
        let token = self.token(req)?;
        Self::decode(token, secret, &self.validation).map(Some)
    }
}

impl fmt::Debug for HttpBearerSecurity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpBearerSecurity")
            .field("name", &self.name)
            .field("verifies_jwt", &self.secret.is_some())
            .finish()
    }
}
