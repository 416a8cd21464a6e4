//! Scaffold a configuration file

use agent_config_core::config::loader::{CONFIG_DIR, CONFIG_FILE};
use agent_config_core::config::template::EXAMPLE_CONFIG;
use agent_config_core::ConfigLoader;
use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use tracing::info;

/// Default target: `<root>/config/config.toml`
pub fn default_target(loader: &ConfigLoader) -> Result<PathBuf> {
    Ok(loader.project_root()?.join(CONFIG_DIR).join(CONFIG_FILE))
}

/// Write the example configuration to `target`
pub async fn init_command(target: PathBuf, force: bool) -> Result<()> {
    let target = if target.is_dir() {
        target.join(CONFIG_FILE)
    } else {
        target
    };

    if target.exists() && !force {
        bail!(
            "{} already exists. Use --force to overwrite it.",
            target.display()
        );
    }

    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    tokio::fs::write(&target, EXAMPLE_CONFIG)
        .await
        .with_context(|| format!("Failed to write config file: {}", target.display()))?;

    info!("Wrote example configuration");
    println!("📝 Wrote example configuration to {}", target.display());
    println!("   Edit the [llm] section and set your API key before running the agent.");

    Ok(())
}
