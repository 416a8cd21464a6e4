//! Error types and handling for agentcfg core

use thiserror::Error;

/// Result type alias for agentcfg operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for agentcfg core
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Errors raised while layering configuration sources
    #[error("Configuration source error: {0}")]
    Layer(#[from] ::config::ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML rendering errors
    #[error("TOML render error: {0}")]
    Render(#[from] toml::ser::Error),

    /// Generic error with message
    #[error("{0}")]
    Generic(String),
}

/// Configuration-specific errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for field '{field}': {value}")]
    InvalidValue { field: String, value: String },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid configuration format: {message}")]
    InvalidFormat { message: String },

    #[error("No configuration found (searched: {})", searched.join(", "))]
    NoConfigFound { searched: Vec<String> },

    #[error("Environment variable not found: {var}")]
    EnvVarMissing { var: String },

    #[error("Path contains potentially unsafe patterns: {path}")]
    UnsafePath { path: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: impl Into<String>, value: impl ToString) -> Self {
        ConfigError::InvalidValue {
            field: field.into(),
            value: value.to_string(),
        }
    }
}
