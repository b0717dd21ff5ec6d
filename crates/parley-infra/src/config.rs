//! Configuration loader for Parley.
//!
//! Reads `parley.toml` and deserializes it into [`AppConfig`], falling back to
//! defaults when the file is missing or malformed, then applies environment
//! overrides.

use std::path::Path;

use secrecy::SecretString;

use parley_types::config::{AppConfig, ProviderKind, StoreBackend};

/// Load configuration from `path`.
///
/// - If the file does not exist, returns [`AppConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
/// - If the file exists and parses successfully, returns the parsed config.
pub async fn load_config(path: &Path) -> AppConfig {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config file found at {}, using defaults", path.display());
            return AppConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", path.display());
            return AppConfig::default();
        }
    };

    match toml::from_str::<AppConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!("Failed to parse {}: {err}, using defaults", path.display());
            AppConfig::default()
        }
    }
}

/// Load from `path`, then apply overrides from the process environment.
pub async fn load_config_with_env(path: &Path) -> AppConfig {
    let mut config = load_config(path).await;
    apply_env_overrides(&mut config, |name| std::env::var(name).ok());
    config
}

/// Apply environment overrides, reading variables through `lookup`.
///
/// Empty values are ignored. Recognised variables:
///
/// | Variable | Setting |
/// |---|---|
/// | `PORT` | `server.port` |
/// | `PARLEY_STORE_BACKEND` | `store.backend` (`sqlite` or `memory`) |
/// | `PARLEY_DATABASE_URL` | `store.database_url` |
/// | `PARLEY_LLM_PROVIDER` | `llm.provider` (`openai`, `azure` or `echo`) |
/// | `OPENAI_BASE_URL`, then `AZURE_OPENAI_ENDPOINT` | `llm.base_url` |
/// | `OPENAI_API_KEY`, then `AZURE_OPENAI_KEY` | `llm.api_key` |
/// | `AZURE_OPENAI_MODEL_NAME` | `llm.model` |
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(port) = var("PORT") {
        match port.trim().parse::<u16>() {
            Ok(port) => config.server.port = port,
            Err(err) => tracing::warn!("Ignoring PORT={port}: {err}"),
        }
    }

    if let Some(backend) = var("PARLEY_STORE_BACKEND") {
        match backend.to_lowercase().as_str() {
            "sqlite" => config.store.backend = StoreBackend::Sqlite,
            "memory" => config.store.backend = StoreBackend::Memory,
            other => tracing::warn!("Ignoring unknown PARLEY_STORE_BACKEND={other}"),
        }
    }

    if let Some(url) = var("PARLEY_DATABASE_URL") {
        config.store.database_url = url;
    }

    if let Some(provider) = var("PARLEY_LLM_PROVIDER") {
        match provider.to_lowercase().as_str() {
            "openai" => config.llm.provider = ProviderKind::OpenAi,
            "azure" => config.llm.provider = ProviderKind::Azure,
            "echo" => config.llm.provider = ProviderKind::Echo,
            other => tracing::warn!("Ignoring unknown PARLEY_LLM_PROVIDER={other}"),
        }
    }

    for name in ["OPENAI_BASE_URL", "AZURE_OPENAI_ENDPOINT"] {
        if let Some(url) = var(name) {
            config.llm.base_url = Some(url);
        }
    }

    for name in ["OPENAI_API_KEY", "AZURE_OPENAI_KEY"] {
        if let Some(key) = var(name) {
            config.llm.api_key = Some(SecretString::from(key));
        }
    }

    if let Some(model) = var("AZURE_OPENAI_MODEL_NAME") {
        config.llm.model = Some(model);
    }
}
