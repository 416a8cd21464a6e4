//! Process-wide configuration, loaded once

use super::app::AppConfig;
use super::loader::ConfigLoader;
use crate::error::{Error, Result};
use std::sync::OnceLock;
use tokio::sync::Mutex;

static CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// Serializes concurrent first loads
static LOAD_LOCK: Mutex<()> = Mutex::const_new(());

/// Install the global configuration. Fails if one is already installed.
pub fn init(config: AppConfig) -> Result<&'static AppConfig> {
    CONFIG
        .set(config)
        .map_err(|_| Error::Generic("Global configuration is already initialized".to_string()))?;
    get().ok_or_else(|| Error::Generic("Global configuration was not stored".to_string()))
}

/// The global configuration, if installed
pub fn get() -> Option<&'static AppConfig> {
    CONFIG.get()
}

/// Return the global configuration, loading it with `loader` on first use
pub async fn get_or_load(loader: &ConfigLoader) -> Result<&'static AppConfig> {
    if let Some(config) = get() {
        return Ok(config);
    }

    let _guard = LOAD_LOCK.lock().await;
    if let Some(config) = get() {
        return Ok(config);
    }

    let config = loader.load().await?;
    init(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    // The global is shared by the whole test binary, so everything lives in one test
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_global_lifecycle() {
        let temp_dir = tempdir().unwrap();
        let config_dir = temp_dir.path().join("config");
        tokio::fs::create_dir_all(&config_dir).await.unwrap();
        tokio::fs::write(
            config_dir.join("config.toml"),
            "[llm]\nmodel = \"gpt-4o\"\nbase_url = \"https://api.openai.com/v1\"\napi_key = \"sk-test\"\n",
        )
        .await
        .unwrap();

        let loader = ConfigLoader::new()
            .with_project_root(temp_dir.path())
            .with_xdg_dir(temp_dir.path())
            .with_env_source(Vec::<(String, String)>::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let loader = loader.clone();
                tokio::spawn(async move { get_or_load(&loader).await })
            })
            .collect();

        let mut loaded = Vec::new();
        for handle in handles {
            loaded.push(handle.await.unwrap().unwrap());
        }
        assert!(loaded.iter().all(|config| std::ptr::eq(*config, loaded[0])));

        let first = get_or_load(&loader).await.unwrap();
        assert!(std::ptr::eq(first, loaded[0]));
        assert_eq!(first.llm("default").model, "gpt-4o");

        let second = get_or_load(&loader).await.unwrap();
        assert!(std::ptr::eq(first, second));

        assert!(init(first.clone()).is_err());
        assert!(get().is_some());
    }
}
