//! # agentcfg Core
//!
//! Core library for agentcfg - the settings layer of an LLM agent runtime.
//!
//! This library owns the configuration schema for LLM endpoints and the code
//! execution sandbox, discovers and layers configuration files with
//! environment overrides, validates the result, and derives the views other
//! components consume (named LLM profiles, container limits).

// Core modules
pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use crate::config::{
    ApiKey, ApiType, AppConfig, ConfigLoader, ContainerSpec, LlmProfiles, LlmSettings,
    MemoryLimit, SandboxSettings,
};
pub use error::{ConfigError, Error, Result};
pub use logging::{init_logging, LogOptions};

/// Current version of the agent-config-core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
