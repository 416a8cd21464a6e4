//! Example configuration and TOML rendering

use super::app::AppConfig;
use crate::error::{Error, Result};
use serde::Serialize;
use toml::{Table, Value};

/// The commented example configuration shipped with the project
pub const EXAMPLE_CONFIG: &str = include_str!("../../../config/config.example.toml");

/// Render a resolved configuration back into the `[llm]` / `[llm.<name>]` /
/// `[sandbox]` file layout.
///
/// Named profiles are written in full, so loading the output yields the same
/// profiles. API keys are written as-is; pass [`AppConfig::redacted`] to hide
/// them.
pub fn render(config: &AppConfig) -> Result<String> {
    let mut llm = to_table(config.llm.default_profile())?;
    for (name, settings) in config.llm.overrides() {
        llm.insert(name.to_string(), Value::Table(to_table(settings)?));
    }

    let mut root = Table::new();
    root.insert("llm".to_string(), Value::Table(llm));
    root.insert("sandbox".to_string(), Value::Table(to_table(&config.sandbox)?));

    Ok(toml::to_string_pretty(&root)?)
}

fn to_table<T: Serialize>(value: &T) -> Result<Table> {
    match Value::try_from(value)? {
        Value::Table(table) => Ok(table),
        other => Err(Error::Generic(format!(
            "Expected a table, got {}",
            other.type_str()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::llm::{ApiType, LlmProfiles, LlmSettings};
    use crate::config::loader::ConfigLoader;
    use crate::config::sandbox::SandboxSettings;
    use tempfile::tempdir;

    fn loader(root: &std::path::Path) -> ConfigLoader {
        ConfigLoader::new()
            .with_project_root(root)
            .with_xdg_dir(root)
            .with_env_source(Vec::<(String, String)>::new())
    }

    #[test]
    fn test_example_config_loads() {
        let temp_dir = tempdir().unwrap();
        let config = loader(temp_dir.path()).load_str(EXAMPLE_CONFIG).unwrap();

        assert_eq!(config.llm("default").api_type, ApiType::Ollama);
        assert_eq!(config.llm("vision").model, "llama3.2-vision");
        assert_eq!(config.llm("vision").base_url, "http://localhost:11434/v1");
        assert!(!config.sandbox.use_sandbox);
        assert_eq!(config.sandbox.memory_limit.as_str(), "1g");
    }

    #[test]
    fn test_rendered_config_loads_back() {
        let temp_dir = tempdir().unwrap();
        let llm = LlmProfiles::new(
            LlmSettings::new(
                ApiType::Azure,
                "gpt-4o",
                "https://example.openai.azure.com",
                "azure-key-123456789",
            )
            .with_api_version("2024-08-01-preview")
            .with_temperature(0.5),
        )
        .with_profile(
            "vision",
            LlmSettings::new(
                ApiType::OpenAI,
                "gpt-4o-mini",
                "https://api.openai.com/v1",
                "sk-vision-key-0000",
            )
            .with_max_tokens(1024),
        );
        let sandbox = SandboxSettings {
            use_sandbox: true,
            memory_limit: "2g".parse().unwrap(),
            ..SandboxSettings::default()
        };
        let config = AppConfig::new(llm, sandbox, temp_dir.path().to_path_buf());

        let rendered = render(&config).unwrap();
        assert!(rendered.contains("[llm.vision]"));
        assert!(rendered.contains("memory_limit = \"2g\""));

        let reloaded = loader(temp_dir.path()).load_str(&rendered).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn test_render_redacted_hides_keys() {
        let temp_dir = tempdir().unwrap();
        let config = loader(temp_dir.path())
            .load_str(
                "[llm]\nmodel = \"gpt-4o\"\nbase_url = \"https://api.openai.com/v1\"\napi_key = \"sk-supersecretvalue\"\n",
            )
            .unwrap();

        let rendered = render(&config.redacted()).unwrap();
        assert!(!rendered.contains("supersecret"));
        assert!(rendered.contains("sk-...alue"));
    }
}
