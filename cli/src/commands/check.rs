//! Configuration check command

use agent_config_core::ConfigLoader;
use anyhow::{Context, Result};
use colored::Colorize;
use tracing::info;

/// Load and validate the configuration, then print a summary
pub async fn check_command(loader: ConfigLoader) -> Result<()> {
    let path = loader.locate()?;
    info!("Checking configuration at {}", path.display());

    let config = loader
        .load()
        .await
        .with_context(|| format!("Invalid configuration: {}", path.display()))?;

    println!("{} {}", "✅ Configuration OK:".green().bold(), path.display());

    println!("\n🤖 LLM profiles");
    for (name, settings) in config.llm.iter() {
        println!(
            "   {:<10} {} ({}) @ {}",
            name.cyan(),
            settings.model,
            settings.api_type,
            settings.base_url
        );
    }

    let sandbox = &config.sandbox;
    println!("\n🐳 Sandbox");
    if sandbox.use_sandbox {
        println!("   image:    {}", sandbox.image);
        println!("   work_dir: {}", sandbox.work_dir);
        println!(
            "   limits:   memory {}, cpu {}, timeout {}s",
            sandbox.memory_limit, sandbox.cpu_limit, sandbox.timeout
        );
        println!("   network:  {}", sandbox.network_mode());
    } else {
        println!("   {}", "disabled (use_sandbox = false)".dimmed());
    }

    println!("\n📁 Workspace: {}", config.workspace_root().display());

    Ok(())
}
