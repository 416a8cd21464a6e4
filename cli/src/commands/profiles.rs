//! LLM profiles listing command

use agent_config_core::config::VISION_PROFILE;
use agent_config_core::ConfigLoader;
use anyhow::Result;
use colored::Colorize;

/// List LLM profiles
pub async fn profiles_command(loader: ConfigLoader) -> Result<()> {
    let config = loader.load().await?;

    println!("🤖 LLM profiles\n");
    for (name, settings) in config.llm.iter() {
        println!("📦 {}", name.bold());
        println!("   model:       {}", settings.model);
        println!("   api_type:    {}", settings.api_type);
        println!("   base_url:    {}", settings.base_url);
        println!("   api_key:     {}", settings.api_key.masked());
        println!("   max_tokens:  {}", settings.max_tokens);
        println!("   temperature: {}\n", settings.temperature);
    }

    if config.llm.get_exact(VISION_PROFILE).is_none() {
        println!("💡 No [llm.vision] profile; vision requests use the default profile.");
    }

    Ok(())
}
