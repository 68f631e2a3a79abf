use crate::error::ConfigError;
use crate::handler::HandlerResponse;
use crate::static_files::StaticFiles;
use minijinja::{context, Environment};
use serde_json::{Map, Value};
use std::path::PathBuf;
use tracing::{debug, error};

const INDEX_TEMPLATE: &str = include_str!("../../templates/swagger_ui.html");
const CDN_ASSET_BASE: &str = "https://unpkg.com/swagger-ui-dist@5";
pub const DEFAULT_DOCS_URL: &str = "/docs";

/// Swagger UI pages served under `base_url`.
///
/// `base_url` and `base_url/index.html` render the UI shell pointed at the
/// documentation URL. With an asset directory, other paths beneath
/// `base_url` are served from it and the shell loads its scripts from there;
/// without one the scripts come from a CDN.
#[derive(Debug, Clone)]
pub struct SwaggerUi {
    base_url: String,
    app_name: String,
    config: Map<String, Value>,
    oauth_config: Option<Value>,
    assets: Option<StaticFiles>,
}

impl SwaggerUi {
    pub fn new(base_url: impl Into<String>, api_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        let base_url = match base_url.trim_end_matches('/') {
            "" => "/".to_string(),
            trimmed => trimmed.to_string(),
        };
        let mut config = Map::new();
        config.insert("dom_id".to_string(), Value::from("#swagger-ui"));
        config.insert("url".to_string(), Value::from(api_url.into()));
        config.insert("layout".to_string(), Value::from("StandaloneLayout"));
        config.insert("deepLinking".to_string(), Value::Bool(true));
        Self {
            base_url,
            app_name: "Swagger UI".to_string(),
            config,
            oauth_config: None,
            assets: None,
        }
    }

    #[must_use]
    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = name.into();
        self
    }

    /// Set a Swagger UI configuration key.
    #[must_use]
    pub fn config(mut self, key: impl Into<String>, value: Value) -> Self {
        self.config.insert(key.into(), value);
        self
    }

    /// Options passed to `initOAuth`.
    #[must_use]
    pub fn oauth_config(mut self, config: Value) -> Self {
        self.oauth_config = Some(config);
        self
    }

    #[must_use]
    pub fn oauth2_redirect_url(self, url: impl Into<String>) -> Self {
        self.config("oauth2RedirectUrl", Value::from(url.into()))
    }

    /// Serve the Swagger UI bundle from a local directory.
    #[must_use]
    pub fn assets_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.assets = Some(StaticFiles::new(dir));
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn prefix(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Render the UI shell.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Template`] when the template fails to render.
    pub fn render_index(&self) -> Result<String, ConfigError> {
        let mut config = self.config.clone();
        if !config.contains_key("oauth2RedirectUrl") {
            config.insert(
                "oauth2RedirectUrl".to_string(),
                Value::from(format!("{}/oauth2-redirect.html", self.prefix())),
            );
        }
        let asset_base = match self.assets {
            Some(_) => self.prefix().to_string(),
            None => CDN_ASSET_BASE.to_string(),
        };
        let oauth_config_json = self.oauth_config.as_ref().map(Value::to_string);

        let mut env = Environment::new();
        // No extension, so no HTML auto-escaping of the JSON values.
        env.add_template("swagger_ui", INDEX_TEMPLATE)
            .map_err(|e| ConfigError::Template(e.to_string()))?;
        let tmpl = env
            .get_template("swagger_ui")
            .map_err(|e| ConfigError::Template(e.to_string()))?;
        tmpl.render(context! {
            app_name => &self.app_name,
            asset_base => asset_base,
            config_json => Value::Object(config).to_string(),
            oauth_config_json => oauth_config_json,
        })
        .map_err(|e| ConfigError::Template(e.to_string()))
    }

    /// Response for `path` when it lies under `base_url`.
    pub fn serve(&self, path: &str) -> Option<HandlerResponse> {
        let rest = if self.base_url == "/" {
            path.strip_prefix('/')?
        } else {
            let rest = path.strip_prefix(self.prefix())?;
            match rest {
                "" => "",
                r => r.strip_prefix('/')?,
            }
        };
        if rest.is_empty() || rest == "index.html" {
            return Some(match self.render_index() {
                Ok(html) => HandlerResponse::html(200, html),
                Err(e) => {
                    error!(error = %e, "Swagger UI render failed");
                    HandlerResponse::error(500, "documentation unavailable")
                }
            });
        }
        let assets = self.assets.as_ref()?;
        Some(match assets.load(rest) {
            Ok((bytes, content_type)) => HandlerResponse::new(200, content_type, bytes),
            Err(_) => {
                debug!(path = %path, "Swagger UI asset not found");
                HandlerResponse::error(404, "Not Found")
            }
        })
    }
}
