//! Configuration discovery and loading
//!
//! Implements single-source priority loading:
//! 1. Explicit override (file, or directory containing `config.toml`)
//! 2. `<project_root>/config/config.toml`
//! 3. `<project_root>/config/config.example.toml`
//! 4. `$XDG_CONFIG_HOME/agentcfg/config.toml`
//!
//! Environment variables prefixed with `AGENTCFG__` are layered on top of the
//! file, with `__` separating nested keys (`AGENTCFG__LLM__VISION__MODEL`).

use super::app::AppConfig;
use super::llm::LlmProfiles;
use super::sandbox::SandboxSettings;
use crate::error::{ConfigError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "AGENTCFG";

/// Separator between prefix and nested key segments
pub const ENV_SEPARATOR: &str = "__";

/// Directory under the project root holding the config files
pub const CONFIG_DIR: &str = "config";
pub const CONFIG_FILE: &str = "config.toml";
pub const EXAMPLE_CONFIG_FILE: &str = "config.example.toml";

/// Application directory name under the XDG config dir
pub const APP_DIR: &str = "agentcfg";

/// Raw file shape before profile merging
#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    llm: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    sandbox: SandboxSettings,
}

/// Configuration loader
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    /// Override config file/directory path
    config_override: Option<PathBuf>,
    /// Project root, defaults to the current directory
    project_root: Option<PathBuf>,
    /// Replaces the process environment when set
    env_source: Option<::config::Map<String, String>>,
    /// Replaces the platform config dir when set
    xdg_dir: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Set config file/directory override (`~` is expanded)
    pub fn with_config_override(mut self, path: impl AsRef<Path>) -> Self {
        self.config_override = Some(expand_home(path.as_ref()));
        self
    }

    /// Set the project root used for discovery and the workspace dir
    pub fn with_project_root(mut self, path: impl AsRef<Path>) -> Self {
        self.project_root = Some(expand_home(path.as_ref()));
        self
    }

    /// Use the given variables instead of the process environment
    pub fn with_env_source<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env_source = Some(
            vars.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// Use the given directory instead of the platform config dir
    pub fn with_xdg_dir(mut self, path: impl AsRef<Path>) -> Self {
        self.xdg_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Resolve the project root
    pub fn project_root(&self) -> Result<PathBuf> {
        match &self.project_root {
            Some(root) => Ok(root.clone()),
            None => Ok(std::env::current_dir()?),
        }
    }

    /// Candidate files in priority order, excluding the override
    pub fn candidates(&self) -> Result<Vec<PathBuf>> {
        let config_dir = self.project_root()?.join(CONFIG_DIR);
        let mut candidates = vec![
            config_dir.join(CONFIG_FILE),
            config_dir.join(EXAMPLE_CONFIG_FILE),
        ];

        let xdg = self.xdg_dir.clone().or_else(dirs::config_dir);
        if let Some(xdg) = xdg {
            candidates.push(xdg.join(APP_DIR).join(CONFIG_FILE));
        }

        Ok(candidates)
    }

    /// Find the configuration file to load
    pub fn locate(&self) -> Result<PathBuf> {
        if let Some(path) = &self.config_override {
            return locate_override(path);
        }

        let candidates = self.candidates()?;
        for candidate in &candidates {
            debug!("Looking for configuration at {}", candidate.display());
            if candidate.is_file() {
                return Ok(candidate.clone());
            }
        }

        Err(ConfigError::NoConfigFound {
            searched: candidates
                .iter()
                .map(|path| path.display().to_string())
                .collect(),
        }
        .into())
    }

    /// Locate, read, layer and validate the configuration
    pub async fn load(&self) -> Result<AppConfig> {
        let path = self.locate()?;
        info!("Loading configuration from {}", path.display());

        let content = tokio::fs::read_to_string(&path).await?;
        self.load_str(&content)
    }

    /// Run the loading pipeline on an in-memory TOML document
    pub fn load_str(&self, content: &str) -> Result<AppConfig> {
        let layered = ::config::Config::builder()
            .add_source(::config::File::from_str(content, ::config::FileFormat::Toml))
            .add_source(self.environment())
            .build()
            .map_err(|e| ConfigError::InvalidFormat {
                message: e.to_string(),
            })?;

        let raw: RawConfig = layered.try_deserialize()?;

        let mut llm = LlmProfiles::from_table(&raw.llm)?;
        llm.resolve_keys_with(|var| self.lookup_env(var))?;

        let config = AppConfig::new(llm, raw.sandbox, self.project_root()?);
        config.validate()?;

        info!(
            "Loaded LLM profiles [{}], sandbox {}",
            config.llm.names().join(", "),
            if config.sandbox.use_sandbox {
                "enabled"
            } else {
                "disabled"
            }
        );

        Ok(config)
    }

    fn environment(&self) -> ::config::Environment {
        ::config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator(ENV_SEPARATOR)
            .separator(ENV_SEPARATOR)
            .try_parsing(true)
            .source(self.env_source.clone())
    }

    fn lookup_env(&self, var: &str) -> Option<String> {
        match &self.env_source {
            Some(vars) => vars.get(var).cloned(),
            None => std::env::var(var).ok(),
        }
    }
}

fn locate_override(path: &Path) -> Result<PathBuf> {
    if path.is_file() {
        return Ok(path.to_path_buf());
    }

    if path.is_dir() {
        let file = path.join(CONFIG_FILE);
        if file.is_file() {
            return Ok(file);
        }
        return Err(ConfigError::FileNotFound {
            path: file.display().to_string(),
        }
        .into());
    }

    Err(ConfigError::FileNotFound {
        path: path.display().to_string(),
    }
    .into())
}

fn expand_home(path: &Path) -> PathBuf {
    match path.to_str() {
        Some(text) => PathBuf::from(shellexpand::tilde(text).into_owned()),
        None => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::llm::ApiType;
    use crate::error::Error;
    use tempfile::tempdir;

    const SAMPLE: &str = r#"
[llm]
api_type = "ollama"
model = "llama3.2"
base_url = "http://localhost:11434/v1"
api_key = ""
max_tokens = 4096
temperature = 0.0

[llm.vision]
model = "llama3.2-vision"

[sandbox]
use_sandbox = true
image = "python:3.12-slim"
work_dir = "/workspace"
memory_limit = "1g"
cpu_limit = 2.0
timeout = 300
network_enabled = false
"#;

    fn isolated(root: &Path) -> ConfigLoader {
        ConfigLoader::new()
            .with_project_root(root)
            .with_xdg_dir(root.join("xdg"))
            .with_env_source(Vec::<(String, String)>::new())
    }

    async fn write(path: &Path, content: &str) {
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(path, content).await.unwrap();
    }

    #[tokio::test]
    async fn test_load_from_project_config_dir() {
        let temp_dir = tempdir().unwrap();
        write(&temp_dir.path().join("config/config.toml"), SAMPLE).await;

        let config = isolated(temp_dir.path()).load().await.unwrap();

        assert_eq!(config.llm("default").api_type, ApiType::Ollama);
        assert_eq!(config.llm("vision").model, "llama3.2-vision");
        assert_eq!(config.llm("vision").temperature, 0.0);
        assert!(config.sandbox.use_sandbox);
        assert_eq!(config.sandbox.memory_limit.bytes(), 1 << 30);
        assert_eq!(config.sandbox.cpu_limit, 2.0);
        assert_eq!(config.workspace_root(), temp_dir.path().join("workspace"));
    }

    #[tokio::test]
    async fn test_config_toml_wins_over_example() {
        let temp_dir = tempdir().unwrap();
        write(&temp_dir.path().join("config/config.toml"), SAMPLE).await;
        write(
            &temp_dir.path().join("config/config.example.toml"),
            &SAMPLE.replace("llama3.2\"", "example-model\""),
        )
        .await;

        let loader = isolated(temp_dir.path());
        assert_eq!(
            loader.locate().unwrap(),
            temp_dir.path().join("config/config.toml")
        );
        assert_eq!(loader.load().await.unwrap().llm("default").model, "llama3.2");
    }

    #[tokio::test]
    async fn test_example_file_is_fallback() {
        let temp_dir = tempdir().unwrap();
        write(&temp_dir.path().join("config/config.example.toml"), SAMPLE).await;

        let loader = isolated(temp_dir.path());
        assert_eq!(
            loader.locate().unwrap(),
            temp_dir.path().join("config/config.example.toml")
        );
    }

    #[tokio::test]
    async fn test_xdg_dir_is_last_resort() {
        let temp_dir = tempdir().unwrap();
        let xdg_file = temp_dir.path().join("xdg/agentcfg/config.toml");
        write(&xdg_file, SAMPLE).await;

        assert_eq!(isolated(temp_dir.path()).locate().unwrap(), xdg_file);
    }

    #[tokio::test]
    async fn test_override_file_and_directory() {
        let temp_dir = tempdir().unwrap();
        let custom = temp_dir.path().join("custom/config.toml");
        write(&custom, SAMPLE).await;

        let by_file = isolated(temp_dir.path()).with_config_override(&custom);
        assert_eq!(by_file.locate().unwrap(), custom);

        let by_dir = isolated(temp_dir.path()).with_config_override(temp_dir.path().join("custom"));
        assert_eq!(by_dir.locate().unwrap(), custom);

        let missing = isolated(temp_dir.path()).with_config_override(temp_dir.path().join("nope.toml"));
        assert!(matches!(
            missing.locate(),
            Err(Error::Config(ConfigError::FileNotFound { .. }))
        ));
    }

    #[test]
    fn test_no_config_found_lists_searched_paths() {
        let temp_dir = tempdir().unwrap();
        match isolated(temp_dir.path()).locate() {
            Err(Error::Config(ConfigError::NoConfigFound { searched })) => {
                assert_eq!(searched.len(), 3);
                assert!(searched[0].ends_with("config.toml"));
            }
            other => panic!("expected NoConfigFound, got {:?}", other),
        }
    }

    #[test]
    fn test_env_overrides_layer_over_file() {
        let temp_dir = tempdir().unwrap();
        let loader = isolated(temp_dir.path()).with_env_source([
            ("AGENTCFG__LLM__MODEL", "llama3.3"),
            ("AGENTCFG__LLM__VISION__MAX_TOKENS", "1024"),
            ("AGENTCFG__SANDBOX__NETWORK_ENABLED", "true"),
            ("UNRELATED", "ignored"),
        ]);

        let config = loader.load_str(SAMPLE).unwrap();
        assert_eq!(config.llm("default").model, "llama3.3");
        assert_eq!(config.llm("vision").model, "llama3.2-vision");
        assert_eq!(config.llm("vision").max_tokens, 1024);
        assert!(config.sandbox.network_enabled);
    }

    #[test]
    fn test_env_api_key_reference_is_resolved() {
        let temp_dir = tempdir().unwrap();
        let content = r#"
[llm]
model = "gpt-4o"
base_url = "https://api.openai.com/v1"
api_key = "env:OPENAI_API_KEY"
"#;

        let resolved = isolated(temp_dir.path())
            .with_env_source([("OPENAI_API_KEY", "sk-from-env")])
            .load_str(content)
            .unwrap();
        assert_eq!(resolved.llm("default").api_key.expose(), "sk-from-env");

        let err = isolated(temp_dir.path()).load_str(content).unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::EnvVarMissing { ref var }) if var == "OPENAI_API_KEY"
        ));
    }

    #[test]
    fn test_numeric_env_overrides_for_text_fields() {
        let temp_dir = tempdir().unwrap();
        let config = isolated(temp_dir.path())
            .with_env_source([
                ("AGENTCFG__LLM__MODEL", "4"),
                ("AGENTCFG__SANDBOX__IMAGE", "3"),
            ])
            .load_str(SAMPLE)
            .unwrap();
        assert_eq!(config.llm("default").model, "4");
        assert_eq!(config.sandbox.image, "3");
    }

    #[test]
    fn test_tiny_cpu_limit_is_rejected() {
        let temp_dir = tempdir().unwrap();
        let err = isolated(temp_dir.path())
            .load_str(&SAMPLE.replace("cpu_limit = 2.0", "cpu_limit = 0.000001"))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::InvalidValue { ref field, .. }) if field == "sandbox.cpu_limit"
        ));
    }

    #[test]
    fn test_missing_sandbox_table_uses_defaults() {
        let temp_dir = tempdir().unwrap();
        let config = isolated(temp_dir.path())
            .load_str(
                r#"
[llm]
model = "gpt-4o"
base_url = "https://api.openai.com/v1"
api_key = "sk-test"
"#,
            )
            .unwrap();
        assert_eq!(config.sandbox, SandboxSettings::default());
        assert_eq!(config.llm.names(), vec!["default"]);
    }

    #[test]
    fn test_invalid_documents_are_rejected() {
        let temp_dir = tempdir().unwrap();
        let loader = isolated(temp_dir.path());

        assert!(matches!(
            loader.load_str("[llm\nmodel = "),
            Err(Error::Config(ConfigError::InvalidFormat { .. }))
        ));
        assert!(matches!(
            loader.load_str("[sandbox]\nuse_sandbox = true\n"),
            Err(Error::Config(ConfigError::MissingField { ref field })) if field == "llm.model"
        ));
        assert!(loader
            .load_str(&SAMPLE.replace("temperature = 0.0", "temperature = 5.0"))
            .is_err());
        assert!(loader
            .load_str(&SAMPLE.replace("memory_limit = \"1g\"", "memory_limit = \"huge\""))
            .is_err());
    }
}
