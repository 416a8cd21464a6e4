//! Top-level application configuration

use super::llm::{LlmProfiles, LlmSettings};
use super::sandbox::SandboxSettings;
use super::secret::ApiKey;
use crate::error::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Name of the workspace directory under the project root
pub const WORKSPACE_DIR: &str = "workspace";

/// Fully resolved and validated configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppConfig {
    /// LLM profiles (`default`, `vision`, ...)
    pub llm: LlmProfiles,

    /// Sandbox settings, defaults when the file has no `[sandbox]` table
    pub sandbox: SandboxSettings,

    /// Directory the configuration was discovered from
    #[serde(skip)]
    pub project_root: PathBuf,
}

impl AppConfig {
    pub fn new(llm: LlmProfiles, sandbox: SandboxSettings, project_root: PathBuf) -> Self {
        Self {
            llm,
            sandbox,
            project_root,
        }
    }

    /// Validate every LLM profile and the sandbox settings
    pub fn validate(&self) -> Result<()> {
        self.llm.validate()?;
        self.sandbox.validate()?;
        Ok(())
    }

    /// LLM settings for a profile, falling back to the default profile
    pub fn llm(&self, profile: &str) -> &LlmSettings {
        self.llm.get(profile)
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Directory agents write their files to
    pub fn workspace_root(&self) -> PathBuf {
        self.project_root.join(WORKSPACE_DIR)
    }

    /// Copy of the configuration with every API key masked, for display
    pub fn redacted(&self) -> AppConfig {
        AppConfig {
            llm: self.llm.map_settings(|settings| LlmSettings {
                api_key: ApiKey::new(settings.api_key.masked()),
                ..settings.clone()
            }),
            sandbox: self.sandbox.clone(),
            project_root: self.project_root.clone(),
        }
    }
}
