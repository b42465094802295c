use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{RouteDocError, RouteDocResult};
use crate::specification::{ApiInfo, ExternalDocumentation, License, SecurityScheme, Server, Tag};

/// Configuration for document generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    /// OpenAPI specification version (should be "3.0.3")
    pub openapi_version: String,

    /// API information
    pub info: ApiInfo,

    /// Server configurations
    pub servers: Vec<Server>,

    /// Security schemes available to every route
    pub security_schemes: IndexMap<String, SecurityScheme>,

    /// Names of schemes required by default, any one of which suffices
    pub security: Vec<String>,

    /// Global tags for grouping operations
    pub tags: Vec<Tag>,

    /// External documentation
    pub external_docs: Option<ExternalDocumentation>,

    /// Pretty print JSON output
    pub pretty_print: bool,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            openapi_version: "3.0.3".to_string(),
            info: ApiInfo {
                title: "API Documentation".to_string(),
                description: Some("Auto-generated API documentation".to_string()),
                terms_of_service: None,
                contact: None,
                license: Some(License {
                    name: "MIT".to_string(),
                    url: Some("https://opensource.org/licenses/MIT".to_string()),
                }),
                version: "1.0.0".to_string(),
            },
            servers: vec![Server {
                description: Some("Development server".to_string()),
                ..Server::new("http://localhost:3000")
            }],
            security_schemes: IndexMap::new(),
            security: Vec::new(),
            tags: Vec::new(),
            external_docs: None,
            pretty_print: true,
        }
    }
}

impl DocumentConfig {
    /// Create a new configuration with custom API info
    pub fn new(title: &str, version: &str) -> Self {
        let mut config = Self::default();
        config.info.title = title.to_string();
        config.info.version = version.to_string();
        config
    }

    /// Add a server configuration
    pub fn add_server(mut self, url: &str, description: Option<&str>) -> Self {
        self.servers.push(Server {
            description: description.map(|s| s.to_string()),
            ..Server::new(url)
        });
        self
    }

    /// Add a security scheme
    pub fn add_security_scheme(mut self, name: &str, scheme: SecurityScheme) -> Self {
        self.security_schemes.insert(name.to_string(), scheme);
        self
    }

    /// Require a registered scheme for every operation that does not override it
    pub fn require_security(mut self, name: &str) -> Self {
        if !self.security.iter().any(|s| s == name) {
            self.security.push(name.to_string());
        }
        self
    }

    /// Add a tag
    pub fn add_tag(mut self, name: &str, description: Option<&str>) -> Self {
        let mut tag = Tag::new(name);
        tag.description = description.map(|s| s.to_string());
        self.tags.push(tag);
        self
    }

    pub fn from_toml_str(source: &str) -> RouteDocResult<Self> {
        let config: Self = toml::from_str(source)?;
        config.validated()
    }

    pub fn from_json_str(source: &str) -> RouteDocResult<Self> {
        let config: Self = serde_json::from_str(source)?;
        config.validated()
    }

    /// Load from a `.toml`, `.json`, `.yaml` or `.yml` file
    pub fn from_file<P: AsRef<Path>>(path: P) -> RouteDocResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        tracing::debug!("Loading document config from {}", path.display());

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_str(&source),
            Some("json") => Self::from_json_str(&source),
            Some("yaml") | Some("yml") => {
                let config: Self = serde_yaml::from_str(&source)?;
                config.validated()
            }
            _ => Err(RouteDocError::config_error(format!(
                "Unsupported config file format: {}",
                path.display()
            ))),
        }
    }

    fn validated(self) -> RouteDocResult<Self> {
        if let Some(missing) = self
            .security
            .iter()
            .find(|name| !self.security_schemes.contains_key(*name))
        {
            return Err(RouteDocError::config_error(format!(
                "Global security references unknown scheme '{}'",
                missing
            )));
        }
        Ok(self)
    }
}
