//! Configuration module for agentcfg core
//!
//! Schema types, the layered loader, and derived views such as the sandbox
//! container spec.

pub mod app;
pub mod global;
pub mod llm;
pub mod loader;
pub mod sandbox;
mod scalar;
pub mod secret;
pub mod template;

pub use app::AppConfig;
pub use llm::{ApiType, LlmProfiles, LlmSettings, DEFAULT_PROFILE, VISION_PROFILE};
pub use loader::ConfigLoader;
pub use sandbox::{BindMount, ContainerSpec, HostConfig, MemoryLimit, SandboxSettings};
pub use secret::ApiKey;
