use super::{HttpScheme, HttpSecurity, SecurityRegistry, SecurityRequest};
use crate::error::SecurityError;
use base64::{engine::general_purpose, Engine as _};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Username and password decoded from a basic `Authorization` header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

type BasicVerifier =
    dyn Fn(&BasicCredentials) -> Result<Option<Value>, SecurityError> + Send + Sync;

/// HTTP `basic` scheme.
///
/// Without a verifier every request passes; call
/// [`HttpBasicSecurity::verify_with`] or wrap the type to enforce.
#[derive(Clone)]
pub struct HttpBasicSecurity {
    name: String,
    verifier: Option<Arc<BasicVerifier>>,
}

impl HttpBasicSecurity {
    /// Create the scheme and register it in the global registry.
    pub fn new(scheme_name: impl Into<String>) -> Self {
        Self::with_registry(scheme_name, SecurityRegistry::global())
    }

    /// Create the scheme and register it in `registry`.
    pub fn with_registry(scheme_name: impl Into<String>, registry: &SecurityRegistry) -> Self {
        let name = scheme_name.into();
        registry.register(name.clone(), HttpScheme::Basic);
        Self {
            name,
            verifier: None,
        }
    }

    /// Check decoded credentials on every request. The returned value becomes
    /// the handler's `claims`.
    #[must_use]
    pub fn verify_with<F>(mut self, verifier: F) -> Self
    where
        F: Fn(&BasicCredentials) -> Result<Option<Value>, SecurityError> + Send + Sync + 'static,
    {
        self.verifier = Some(Arc::new(verifier));
        self
    }

    /// Decode `base64(username:password)`. A missing colon yields an empty
    /// password.
    ///
    /// # Errors
    ///
    /// [`SecurityError::InvalidCredentials`] when the data is not base64 or
    /// not UTF-8.
    pub fn decode(data: &str) -> Result<BasicCredentials, SecurityError> {
        let bytes = general_purpose::STANDARD.decode(data.trim()).map_err(|e| {
            debug!(error = %e, "Basic credentials are not valid base64");
            SecurityError::InvalidCredentials("malformed basic credentials".to_string())
        })?;
        let text = String::from_utf8(bytes).map_err(|_| {
            SecurityError::InvalidCredentials("malformed basic credentials".to_string())
        })?;
        let (username, password) = text.split_once(':').unwrap_or((text.as_str(), ""));
        Ok(BasicCredentials {
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    /// Credentials carried by `req`.
    ///
    /// # Errors
    ///
    /// [`SecurityError::MissingCredentials`] without a basic `Authorization`
    /// header, otherwise any error from [`HttpBasicSecurity::decode`].
    pub fn credentials(
        &self,
        req: &SecurityRequest<'_>,
    ) -> Result<BasicCredentials, SecurityError> {
        let data = self
            .authorization_data(req)
            .ok_or(SecurityError::MissingCredentials)?;
        Self::decode(data)
    }
}

impl HttpSecurity for HttpBasicSecurity {
    fn scheme_name(&self) -> &str {
        &self.name
    }

    fn scheme(&self) -> HttpScheme {
        HttpScheme::Basic
    }

    fn authorize(&self, req: &SecurityRequest<'_>) -> Result<Option<Value>, SecurityError> {
        match &self.verifier {
            Some(verify) => verify(&self.credentials(req)?),
            None => Ok(None),
        }
    }
}

impl fmt::Debug for HttpBasicSecurity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpBasicSecurity")
            .field("name", &self.name)
            .field("verifier", &self.verifier.is_some())
            .finish()
    }
}
