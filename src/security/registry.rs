use super::HttpScheme;
use once_cell::sync::Lazy;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

static GLOBAL: Lazy<SecurityRegistry> = Lazy::new(SecurityRegistry::new);

/// Name → scheme table behind `components.securitySchemes`.
///
/// Written while schemes are constructed at startup, read when documents are
/// generated. Cloning shares the table.
#[derive(Debug, Clone, Default)]
pub struct SecurityRegistry {
    schemes: Arc<RwLock<BTreeMap<String, HttpScheme>>>,
}

impl SecurityRegistry {
    /// Empty registry, independent of [`SecurityRegistry::global`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry used by the scheme constructors that take no
    /// registry argument.
    pub fn global() -> &'static SecurityRegistry {
        &GLOBAL
    }

    /// Register `name`. Registering an existing name replaces its kind.
    pub fn register(&self, name: impl Into<String>, scheme: HttpScheme) {
        let name = name.into();
        debug!(scheme_name = %name, scheme = %scheme, "Security scheme registered");
        self.schemes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name, scheme);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<HttpScheme> {
        self.schemes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .copied()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schemes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }

    /// JSON table for `components.securitySchemes`, sorted by name.
    #[must_use]
    pub fn schemes(&self) -> Value {
        let table = self.schemes.read().unwrap_or_else(PoisonError::into_inner);
        let map: Map<String, Value> = table
            .iter()
            .map(|(name, scheme)| (name.clone(), scheme.openapi_scheme()))
            .collect();
        Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_isolated_registries() {
        let a = SecurityRegistry::new();
        let b = SecurityRegistry::new();
        a.register("token", HttpScheme::Bearer);
        assert_eq!(a.get("token"), Some(HttpScheme::Bearer));
        assert!(b.is_empty());
    }

    #[test]
    fn test_schemes_table() {
        let r = SecurityRegistry::new();
        r.register("zeta", HttpScheme::Basic);
        r.register("alpha", HttpScheme::Bearer);
        let table = r.schemes();
        let keys: Vec<_> = table.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["alpha", "zeta"]);
        assert_eq!(table["zeta"], json!({"type": "http", "scheme": "basic"}));
    }

    #[test]
    fn test_clone_shares_table() {
        let r = SecurityRegistry::new();
        let shared = r.clone();
        shared.register("basicAuth", HttpScheme::Basic);
        assert_eq!(r.get("basicAuth"), Some(HttpScheme::Basic));
    }
}
