//! Sandbox container spec command

use agent_config_core::ConfigLoader;
use anyhow::{anyhow, Result};
use std::collections::BTreeMap;
use tracing::warn;

/// Print the container spec derived from the sandbox settings
pub async fn sandbox_command(loader: ConfigLoader, binds: Vec<String>) -> Result<()> {
    let volume_bindings = parse_binds(&binds)?;
    let config = loader.load().await?;

    if !config.sandbox.use_sandbox {
        warn!("Sandbox is disabled (use_sandbox = false); showing the spec it would use");
    }

    let spec = config.sandbox.container_spec(&volume_bindings);
    println!("{}", serde_json::to_string_pretty(&spec)?);

    Ok(())
}

/// Parse `HOST:CONTAINER` bindings. The last `:` splits, so Windows host paths work.
fn parse_binds(binds: &[String]) -> Result<BTreeMap<String, String>> {
    binds
        .iter()
        .map(|bind| {
            bind.rsplit_once(':')
                .filter(|(host, container)| !host.is_empty() && container.starts_with('/'))
                .map(|(host, container)| (host.to_string(), container.to_string()))
                .ok_or_else(|| {
                    anyhow!(
                        "Invalid binding '{}': expected HOST:CONTAINER with an absolute container path",
                        bind
                    )
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_binds() {
        let binds = parse_binds(&[
            "/home/user/data:/data".to_string(),
            "C:\\work:/work".to_string(),
        ])
        .unwrap();
        assert_eq!(binds["/home/user/data"], "/data");
        assert_eq!(binds["C:\\work"], "/work");
    }

    #[test]
    fn test_parse_binds_rejects_malformed() {
        assert!(parse_binds(&["nocolon".to_string()]).is_err());
        assert!(parse_binds(&[":/data".to_string()]).is_err());
        assert!(parse_binds(&["/host:relative".to_string()]).is_err());
    }
}
