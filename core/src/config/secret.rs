//! Secret handling for API keys

use super::scalar;
use crate::error::ConfigError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Prefix that marks an API key as an environment variable reference
pub const ENV_KEY_PREFIX: &str = "env:";

/// An API key that never shows up in `Debug` or `Display` output.
///
/// The raw value is only reachable through [`ApiKey::expose`]. Serialization
/// writes the raw value so a resolved config can be rendered back to a file;
/// use [`ApiKey::masked`] for anything shown to a user.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Get the raw key
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The variable name when the key is written as `env:VAR_NAME`
    pub fn env_reference(&self) -> Option<&str> {
        self.0
            .strip_prefix(ENV_KEY_PREFIX)
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    /// Masked form suitable for logs and terminal output
    pub fn masked(&self) -> String {
        if self.0.is_empty() {
            return "<empty>".to_string();
        }
        if let Some(var) = self.env_reference() {
            return format!("{}{}", ENV_KEY_PREFIX, var);
        }

        let chars: Vec<char> = self.0.chars().collect();
        if chars.len() <= 8 {
            return "****".to_string();
        }

        let head: String = chars[..3].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    }

    /// Resolve `env:VAR_NAME` against the process environment
    pub fn resolve(&self) -> Result<ApiKey, ConfigError> {
        self.resolve_with(|var| std::env::var(var).ok())
    }

    /// Resolve `env:VAR_NAME` using a custom lookup
    pub fn resolve_with<F>(&self, lookup: F) -> Result<ApiKey, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        match self.env_reference() {
            Some(var) => lookup(var)
                .map(ApiKey)
                .ok_or_else(|| ConfigError::EnvVarMissing {
                    var: var.to_string(),
                }),
            None => Ok(self.clone()),
        }
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiKey({})", self.masked())
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.masked())
    }
}

impl From<String> for ApiKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ApiKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl Serialize for ApiKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

// Environment overrides may parse an all-digit key as a number
impl<'de> Deserialize<'de> for ApiKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        scalar::string(deserializer).map(ApiKey)
    }
}
