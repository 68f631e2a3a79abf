//! # Application Configuration
//!
//! Settings for the documentation endpoints and the listening address, read
//! from an optional YAML file and then overridden by environment variables.
//!
//! ```yaml
//! title: Pet Store
//! version: 2.0.0
//! description: Pets and their owners
//! servers:
//!   - https://api.example.com
//! json_url: /openapi.json
//! docs_url: /docs
//! swagger_assets_dir: ./swagger-ui-dist
//! addr: 0.0.0.0:8080
//! ```
//!
//! Every key is optional. Overrides: `BRRTKIT_TITLE`, `BRRTKIT_VERSION`,
//! `BRRTKIT_DESCRIPTION`, `BRRTKIT_SERVERS` (comma-separated),
//! `BRRTKIT_JSON_URL`, `BRRTKIT_DOCS_URL`, `BRRTKIT_SWAGGER_ASSETS_DIR`,
//! `BRRTKIT_ADDR`.

use crate::openapi::{SwaggerGenerator, SwaggerUi, DEFAULT_DOCS_URL, DEFAULT_JSON_URL};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub title: String,
    pub version: String,
    pub description: String,
    pub servers: Vec<String>,
    pub json_url: String,
    pub docs_url: String,
    /// Serve Swagger UI assets from here instead of the CDN.
    pub swagger_assets_dir: Option<PathBuf>,
    pub addr: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Auto Swagger".to_string(),
            version: "1.0.0".to_string(),
            description: String::new(),
            servers: Vec::new(),
            json_url: DEFAULT_JSON_URL.to_string(),
            docs_url: DEFAULT_DOCS_URL.to_string(),
            swagger_assets_dir: None,
            addr: "127.0.0.1:8080".to_string(),
        }
    }
}

impl AppConfig {
    /// Parse a YAML file.
    ///
    /// # Errors
    ///
    /// The file cannot be read or is not valid YAML for this struct.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml(&content).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Apply `BRRTKIT_*` overrides from the process environment.
    #[must_use]
    pub fn apply_env(self) -> Self {
        self.apply_lookup(|key| env::var(key).ok())
    }

    fn apply_lookup(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(v) = lookup("BRRTKIT_TITLE") {
            self.title = v;
        }
        if let Some(v) = lookup("BRRTKIT_VERSION") {
            self.version = v;
        }
        if let Some(v) = lookup("BRRTKIT_DESCRIPTION") {
            self.description = v;
        }
        if let Some(v) = lookup("BRRTKIT_SERVERS") {
            self.servers = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(v) = lookup("BRRTKIT_JSON_URL") {
            self.json_url = v;
        }
        if let Some(v) = lookup("BRRTKIT_DOCS_URL") {
            self.docs_url = v;
        }
        if let Some(v) = lookup("BRRTKIT_SWAGGER_ASSETS_DIR") {
            self.swagger_assets_dir = (!v.is_empty()).then(|| PathBuf::from(v));
        }
        if let Some(v) = lookup("BRRTKIT_ADDR") {
            self.addr = v;
        }
        self
    }

    pub fn swagger_generator(&self) -> SwaggerGenerator {
        SwaggerGenerator::new(&self.title)
            .version(&self.version)
            .description(&self.description)
            .servers(self.servers.iter().cloned())
            .json_url(&self.json_url)
    }

    pub fn swagger_ui(&self) -> SwaggerUi {
        let ui = SwaggerUi::new(&self.docs_url, &self.json_url).app_name(&self.title);
        match &self.swagger_assets_dir {
            Some(dir) => ui.assets_dir(dir),
            None => ui,
        }
    }
}
