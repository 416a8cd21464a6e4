//! # agentcfg CLI
//!
//! Command-line interface for inspecting agent configuration.
//!
//! ## Usage
//!
//! - `agentcfg` / `agentcfg check` - Load and validate the configuration
//! - `agentcfg show [--profile NAME] [--json]` - Print the resolved configuration
//! - `agentcfg profiles` - List LLM profiles
//! - `agentcfg sandbox [--bind HOST:CONTAINER]...` - Print the sandbox container spec
//! - `agentcfg init [PATH] [--force]` - Write the example configuration

use agent_config_core::{init_logging, ConfigLoader, LogOptions};
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

use commands::{check_command, init_command, profiles_command, sandbox_command, show_command};

/// agentcfg - inspect and validate LLM agent configuration
#[derive(Parser)]
#[command(name = "agentcfg")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Inspect and validate LLM agent and sandbox configuration")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file or directory path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Project root used for config discovery (defaults to the current directory)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Also write logs to a dated file in this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Load and validate the configuration
    Check,

    /// Print the resolved configuration with API keys masked
    Show {
        /// Only print this LLM profile
        #[arg(long)]
        profile: Option<String>,

        /// Print JSON instead of TOML
        #[arg(long)]
        json: bool,
    },

    /// List LLM profiles
    Profiles,

    /// Print the container spec derived from the sandbox settings
    Sandbox {
        /// Extra volume binding, HOST:CONTAINER
        #[arg(long = "bind", value_name = "HOST:CONTAINER")]
        binds: Vec<String>,
    },

    /// Write the example configuration file
    Init {
        /// Target file (defaults to <root>/config/config.toml)
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Build a configuration loader from CLI arguments
fn build_config_loader(cli: &Cli) -> ConfigLoader {
    let mut loader = ConfigLoader::new();

    if let Some(config_path) = &cli.config {
        loader = loader.with_config_override(config_path);
    }

    if let Some(root) = &cli.root {
        loader = loader.with_project_root(root);
    }

    loader
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let mut log_options =
        LogOptions::default().with_print_level(if cli.verbose { "debug" } else { "info" });
    if let Some(dir) = &cli.log_dir {
        log_options = log_options.with_log_dir(dir, Some("agentcfg".to_string()));
    }
    if let Some(path) = init_logging(&log_options)? {
        tracing::debug!("Writing logs to {}", path.display());
    }

    let config_loader = build_config_loader(&cli);

    match cli.command.unwrap_or(Commands::Check) {
        Commands::Check => check_command(config_loader).await,
        Commands::Show { profile, json } => show_command(config_loader, profile, json).await,
        Commands::Profiles => profiles_command(config_loader).await,
        Commands::Sandbox { binds } => sandbox_command(config_loader, binds).await,
        Commands::Init { path, force } => {
            let target = match path.or(cli.config) {
                Some(path) => path,
                None => commands::init::default_target(&config_loader)?,
            };
            init_command(target, force).await
        }
    }
}
