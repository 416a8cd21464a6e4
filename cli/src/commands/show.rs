//! Show the resolved configuration

use agent_config_core::config::template;
use agent_config_core::ConfigLoader;
use anyhow::{anyhow, Result};

/// Print the resolved configuration with API keys masked
pub async fn show_command(loader: ConfigLoader, profile: Option<String>, json: bool) -> Result<()> {
    let config = loader.load().await?.redacted();

    let output = match profile {
        Some(name) => {
            let settings = config.llm.get_exact(&name).ok_or_else(|| {
                anyhow!(
                    "Unknown LLM profile '{}'. Available profiles: {}",
                    name,
                    config.llm.names().join(", ")
                )
            })?;
            if json {
                serde_json::to_string_pretty(settings)?
            } else {
                toml::to_string_pretty(settings)?
            }
        }
        None if json => serde_json::to_string_pretty(&config)?,
        None => template::render(&config)?,
    };

    println!("{}", output.trim_end());

    Ok(())
}
