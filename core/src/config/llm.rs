//! LLM endpoint settings and named profiles
//!
//! The `[llm]` table holds the default profile as plain keys. Every sub-table
//! (`[llm.vision]`, ...) is a named profile that overrides the default
//! key-by-key.

use super::scalar;
use super::secret::ApiKey;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Name of the profile built from the top-level `[llm]` keys
pub const DEFAULT_PROFILE: &str = "default";

/// Name of the secondary multimodal profile
pub const VISION_PROFILE: &str = "vision";

pub const DEFAULT_MAX_TOKENS: u32 = 4096;
pub const DEFAULT_TEMPERATURE: f64 = 1.0;

const REQUIRED_KEYS: [&str; 2] = ["model", "base_url"];

/// Supported LLM API flavours
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ApiType {
    /// OpenAI-compatible API (OpenAI itself, most proxies)
    #[default]
    OpenAI,
    /// Azure OpenAI deployment
    Azure,
    /// Local Ollama server
    Ollama,
    /// AWS Bedrock
    Aws,
    /// Anything else, kept verbatim
    Custom(String),
}

impl ApiType {
    /// Get the API type name as a string
    pub fn as_str(&self) -> &str {
        match self {
            ApiType::OpenAI => "openai",
            ApiType::Azure => "azure",
            ApiType::Ollama => "ollama",
            ApiType::Aws => "aws",
            ApiType::Custom(name) => name,
        }
    }

    /// Whether requests need an API key
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, ApiType::Ollama)
    }

    /// Whether an `api_version` must be configured
    pub fn requires_api_version(&self) -> bool {
        matches!(self, ApiType::Azure)
    }
}

impl fmt::Display for ApiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApiType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "" | "openai" => ApiType::OpenAI,
            "azure" | "azureopenai" | "azure_openai" => ApiType::Azure,
            "ollama" => ApiType::Ollama,
            "aws" | "bedrock" => ApiType::Aws,
            _ => ApiType::Custom(s.trim().to_string()),
        })
    }
}

impl From<String> for ApiType {
    fn from(value: String) -> Self {
        match value.parse() {
            Ok(api_type) => api_type,
            Err(never) => match never {},
        }
    }
}

impl From<ApiType> for String {
    fn from(value: ApiType) -> Self {
        value.as_str().to_string()
    }
}

/// Connection settings for one LLM endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmSettings {
    /// Model name/identifier
    #[serde(deserialize_with = "scalar::string")]
    pub model: String,

    /// Base URL for the API
    #[serde(deserialize_with = "scalar::string")]
    pub base_url: String,

    /// API key for authentication (may be `env:VAR_NAME`)
    #[serde(default)]
    pub api_key: ApiKey,

    /// Maximum tokens per request
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default)]
    pub api_type: ApiType,

    /// Azure API version, empty for other API types
    #[serde(default, deserialize_with = "scalar::string")]
    pub api_version: String,
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

fn default_temperature() -> f64 {
    DEFAULT_TEMPERATURE
}

impl LlmSettings {
    /// Create settings with default token limit and temperature
    pub fn new(
        api_type: ApiType,
        model: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<ApiKey>,
    ) -> Self {
        Self {
            model: model.into(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            api_type,
            api_version: String::new(),
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_in("llm")
    }

    /// Validate, reporting field paths under `scope` (e.g. `llm.vision`)
    pub(crate) fn validate_in(&self, scope: &str) -> Result<(), ConfigError> {
        let field = |name: &str| format!("{}.{}", scope, name);

        if self.model.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: field("model"),
            });
        }

        if self.base_url.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: field("base_url"),
            });
        }

        match url::Url::parse(&self.base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => {
                return Err(ConfigError::invalid(
                    field("base_url"),
                    format!("{} (must be an http:// or https:// URL)", self.base_url),
                ))
            }
        }

        if self.api_type.requires_api_key() && self.api_key.is_empty() {
            return Err(ConfigError::MissingField {
                field: field("api_key"),
            });
        }

        if self.max_tokens == 0 {
            return Err(ConfigError::invalid(field("max_tokens"), "0 (must be positive)"));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::invalid(
                field("temperature"),
                format!("{} (must be between 0.0 and 2.0)", self.temperature),
            ));
        }

        if self.api_type.requires_api_version() && self.api_version.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: field("api_version"),
            });
        }

        Ok(())
    }
}

/// All LLM profiles: the default plus any named overrides
#[derive(Debug, Clone, PartialEq)]
pub struct LlmProfiles {
    default: LlmSettings,
    named: BTreeMap<String, LlmSettings>,
}

impl LlmProfiles {
    /// Create profiles holding only the default
    pub fn new(default: LlmSettings) -> Self {
        Self {
            default,
            named: BTreeMap::new(),
        }
    }

    /// Add or replace a named profile
    pub fn with_profile(mut self, name: impl Into<String>, settings: LlmSettings) -> Self {
        self.insert(name.into(), settings);
        self
    }

    fn insert(&mut self, name: String, settings: LlmSettings) {
        if name == DEFAULT_PROFILE {
            self.default = settings;
        } else {
            self.named.insert(name, settings);
        }
    }

    /// Build profiles from the raw `[llm]` table
    pub fn from_table(table: &Map<String, Value>) -> Result<Self, ConfigError> {
        let mut base = Map::new();
        let mut overrides = Vec::new();

        for (key, value) in table {
            match value {
                Value::Object(sub) => overrides.push((key.as_str(), sub)),
                other => {
                    base.insert(key.clone(), other.clone());
                }
            }
        }

        let mut profiles = Self::new(build_profile(DEFAULT_PROFILE, base.clone())?);

        for (name, sub) in overrides {
            let mut merged = base.clone();
            merged.extend(sub.iter().map(|(k, v)| (k.clone(), v.clone())));
            debug!("Merged LLM profile '{}' over defaults", name);
            profiles.insert(name.to_string(), build_profile(name, merged)?);
        }

        Ok(profiles)
    }

    /// Get a profile by name, falling back to the default profile
    pub fn get(&self, name: &str) -> &LlmSettings {
        self.get_exact(name).unwrap_or(&self.default)
    }

    /// Get a profile only if it is configured under that exact name
    pub fn get_exact(&self, name: &str) -> Option<&LlmSettings> {
        if name == DEFAULT_PROFILE {
            Some(&self.default)
        } else {
            self.named.get(name)
        }
    }

    pub fn default_profile(&self) -> &LlmSettings {
        &self.default
    }

    /// The vision profile, or the default if none is configured
    pub fn vision(&self) -> &LlmSettings {
        self.get(VISION_PROFILE)
    }

    /// Profile names, default first, then the rest sorted
    pub fn names(&self) -> Vec<&str> {
        self.iter().map(|(name, _)| name).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &LlmSettings)> {
        std::iter::once((DEFAULT_PROFILE, &self.default))
            .chain(self.named.iter().map(|(k, v)| (k.as_str(), v)))
    }

    /// Named overrides only, without the default
    pub fn overrides(&self) -> impl Iterator<Item = (&str, &LlmSettings)> {
        self.named.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of profiles, including the default
    pub fn count(&self) -> usize {
        self.named.len() + 1
    }

    /// Validate every profile
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, settings) in self.iter() {
            settings.validate_in(&profile_scope(name))?;
        }
        Ok(())
    }

    /// Resolve `env:` API keys in every profile
    pub fn resolve_keys_with<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        for settings in std::iter::once(&mut self.default).chain(self.named.values_mut()) {
            settings.api_key = settings.api_key.resolve_with(&lookup)?;
        }
        Ok(())
    }

    /// Apply `f` to every profile
    pub fn map_settings<F>(&self, f: F) -> Self
    where
        F: Fn(&LlmSettings) -> LlmSettings,
    {
        Self {
            default: f(&self.default),
            named: self
                .named
                .iter()
                .map(|(name, settings)| (name.clone(), f(settings)))
                .collect(),
        }
    }
}

impl Serialize for LlmProfiles {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(self.count()))?;
        for (name, settings) in self.iter() {
            map.serialize_entry(name, settings)?;
        }
        map.end()
    }
}

/// Field path prefix for a profile: `llm` for the default, `llm.<name>` otherwise
pub(crate) fn profile_scope(name: &str) -> String {
    if name == DEFAULT_PROFILE {
        "llm".to_string()
    } else {
        format!("llm.{}", name)
    }
}

fn build_profile(name: &str, table: Map<String, Value>) -> Result<LlmSettings, ConfigError> {
    let scope = profile_scope(name);

    for key in REQUIRED_KEYS {
        if !table.contains_key(key) {
            return Err(ConfigError::MissingField {
                field: format!("{}.{}", scope, key),
            });
        }
    }

    for (key, value) in &table {
        check_key(key, value.clone())
            .map_err(|e| ConfigError::invalid(format!("{}.{}", scope, key), e))?;
    }

    serde_json::from_value(Value::Object(table)).map_err(|e| ConfigError::invalid(scope, e))
}

/// Type-check a single key so errors name the key rather than the profile
fn check_key(key: &str, value: Value) -> Result<(), serde_json::Error> {
    match key {
        "model" | "base_url" | "api_version" => scalar::string(value).map(drop),
        "api_key" => ApiKey::deserialize(value).map(drop),
        "api_type" => ApiType::deserialize(value).map(drop),
        "max_tokens" => u32::deserialize(value).map(drop),
        "temperature" => f64::deserialize(value).map(drop),
        _ => Ok(()),
    }
}
