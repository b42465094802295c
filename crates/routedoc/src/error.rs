use thiserror::Error;

use crate::route::RoutePathError;

/// Result type for route documentation operations
pub type RouteDocResult<T> = Result<T, RouteDocError>;

/// Errors that can occur while documenting routes or generating documents
#[derive(Debug, Error)]
pub enum RouteDocError {
    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// TOML deserialization error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// I/O error (file operations, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A value or type could not be turned into a schema
    #[error("Schema introspection error: {0}")]
    Schema(String),

    /// Route path could not be parsed
    #[error("Route path error: {0}")]
    RoutePath(#[from] RoutePathError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Generic error with context
    #[error("Route documentation error: {0}")]
    Generic(String),
}

impl RouteDocError {
    /// Create a new schema introspection error
    pub fn schema_error<T: ToString>(msg: T) -> Self {
        Self::Schema(msg.to_string())
    }

    /// Create a new configuration error
    pub fn config_error<T: ToString>(msg: T) -> Self {
        Self::Config(msg.to_string())
    }

    /// Create a new validation error
    pub fn validation_error<T: ToString>(msg: T) -> Self {
        Self::Validation(msg.to_string())
    }

    /// Create a generic error
    pub fn generic<T: ToString>(msg: T) -> Self {
        Self::Generic(msg.to_string())
    }
}
