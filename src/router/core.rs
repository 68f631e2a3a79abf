use crate::error::ConfigError;
use crate::routing::{Endpoint, EndpointRegistry};
use http::Method;
use percent_encoding::percent_decode_str;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of successfully matching a request path to an endpoint.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub endpoint: Arc<Endpoint>,
    /// Path variables captured from the URL, e.g. `{pet_id}` → `"7"`.
    pub path_params: HashMap<String, String>,
}

impl RouteMatch {
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name).map(String::as_str)
    }
}

/// Outcome of a route lookup.
#[derive(Debug, Clone)]
pub enum RouteLookup {
    Matched(RouteMatch),
    /// The path exists, but not for this method. Carries the allowed methods.
    MethodNotAllowed(Vec<Method>),
    /// A path variable is not valid percent-encoded UTF-8. Carries its name.
    MalformedPath(String),
    NotFound,
}

#[derive(Debug, Clone)]
struct CompiledRoute {
    method: Method,
    regex: Regex,
    param_names: Vec<String>,
    endpoint: Arc<Endpoint>,
}

/// Route table matching requests against the registered endpoint rules.
///
/// Routes are tried in registration order; the first whose method and path
/// both match wins.
#[derive(Debug, Clone, Default)]
pub struct Router {
    routes: Vec<CompiledRoute>,
}

impl Router {
    /// Compile the table for every endpoint in `registry`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidRule`] when a rule does not yield a valid pattern.
    pub fn new(registry: &EndpointRegistry) -> Result<Self, ConfigError> {
        let mut routes = Vec::with_capacity(registry.len());
        for endpoint in registry.iter() {
            let (regex, param_names) = Self::path_to_regex(&endpoint.spec.rule)?;
            routes.push(CompiledRoute {
                method: endpoint.spec.method.clone(),
                regex,
                param_names,
                endpoint: Arc::clone(endpoint),
            });
        }

        let routes_summary: Vec<String> = routes
            .iter()
            .take(10)
            .map(|r| format!("{} {}", r.method, r.endpoint.spec.rule))
            .collect();
        info!(
            routes_count = routes.len(),
            routes_summary = ?routes_summary,
            "Routing table loaded"
        );
        Ok(Self { routes })
    }

    /// Match a request.
    ///
    /// # Arguments
    ///
    /// * `method` - HTTP method of the request
    /// * `path` - Request path without the query string
    ///
    /// # Returns
    ///
    /// The matched endpoint with its path variables, or why nothing matched.
    #[must_use]
    pub fn route(&self, method: &Method, path: &str) -> RouteLookup {
        let mut allowed = Vec::new();
        for route in &self.routes {
            let Some(caps) = route.regex.captures(path) else {
                continue;
            };
            if route.method != *method {
                allowed.push(route.method.clone());
                continue;
            }
            let mut path_params = HashMap::with_capacity(route.param_names.len());
            for (name, m) in route.param_names.iter().zip(caps.iter().skip(1)) {
                let Some(m) = m else {
                    continue;
                };
                match percent_decode_str(m.as_str()).decode_utf8() {
                    Ok(value) => {
                        path_params.insert(name.clone(), value.into_owned());
                    }
                    Err(e) => {
                        warn!(
                            path = %path,
                            param = %name,
                            error = %e,
                            "Path variable is not valid UTF-8"
                        );
                        return RouteLookup::MalformedPath(name.clone());
                    }
                }
            }
            debug!(
                method = %method,
                path = %path,
                operation = %route.endpoint.spec.operation,
                path_params = ?path_params,
                "Route matched"
            );
            return RouteLookup::Matched(RouteMatch {
                endpoint: Arc::clone(&route.endpoint),
                path_params,
            });
        }
        if allowed.is_empty() {
            debug!(method = %method, path = %path, "No route matched");
            RouteLookup::NotFound
        } else {
            debug!(method = %method, path = %path, allowed = ?allowed, "Method not allowed");
            RouteLookup::MethodNotAllowed(allowed)
        }
    }

    /// Registered rules in table order.
    #[must_use]
    pub fn path_patterns(&self) -> Vec<String> {
        self.routes
            .iter()
            .map(|r| r.endpoint.spec.rule.clone())
            .collect()
    }

    /// Convert a `{name}` rule to an anchored regex and its parameter names.
    ///
    /// `/pets/{pet_id}` becomes `^/pets/([^/]+)$` with `["pet_id"]`. Literal
    /// segments are escaped. A segment may hold several placeholders, as in
    /// `{name}.{ext}`. Captures are percent-decoded by [`Router::route`].
    pub(crate) fn path_to_regex(path: &str) -> Result<(Regex, Vec<String>), ConfigError> {
        let invalid = || ConfigError::InvalidRule {
            rule: path.to_string(),
        };
        if path == "/" || path.is_empty() {
            return Ok((Regex::new(r"^/$").map_err(|_| invalid())?, Vec::new()));
        }

        let mut pattern = String::with_capacity(path.len() + 5);
        pattern.push('^');
        let mut param_names = Vec::with_capacity(path.matches('{').count());

        for segment in path.split('/') {
            let placeholders = segment.matches('{').count();
            if placeholders == 1 && segment.starts_with('{') && segment.ends_with('}') {
                param_names.push(segment[1..segment.len() - 1].to_string());
                pattern.push_str("/([^/]+)");
            } else if placeholders > 0 {
                // Placeholders mixed with literals, e.g. `file.{ext}` or `{name}.{ext}`.
                pattern.push('/');
                let mut rest = segment;
                while let Some(open) = rest.find('{') {
                    let close = rest[open..].find('}').ok_or_else(invalid)? + open;
                    pattern.push_str(&regex::escape(&rest[..open]));
                    pattern.push_str("([^/]+?)");
                    param_names.push(rest[open + 1..close].to_string());
                    rest = &rest[close + 1..];
                }
                pattern.push_str(&regex::escape(rest));
            } else if !segment.is_empty() {
                pattern.push('/');
                pattern.push_str(&regex::escape(segment));
            }
        }
        if path.ends_with('/') {
            pattern.push('/');
        }
        pattern.push('$');

        let regex = Regex::new(&pattern).map_err(|_| invalid())?;
        Ok((regex, param_names))
    }
}
