//! Configuration types for Parley.
//!
//! `AppConfig` represents `parley.toml`. Every field has a default so a
//! missing file still yields a runnable (offline) configuration.

use secrecy::SecretString;
use serde::Deserialize;

/// Top-level configuration for the Parley service.
#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory of static assets served for unknown paths, if it exists.
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_static_dir() -> String {
    "static".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
        }
    }
}

/// Which transcript store backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Sqlite,
    Memory,
}

/// Transcript store settings.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Conversations fetched per page when scanning a user's partition.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_database_url() -> String {
    "sqlite://parley.db?mode=rwc".to_string()
}

fn default_page_size() -> u32 {
    100
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            database_url: default_database_url(),
            page_size: default_page_size(),
        }
    }
}

/// Which generation provider answers turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Any OpenAI-compatible chat completions endpoint.
    OpenAi,
    /// Azure OpenAI deployment (`api-key` header, deployment-scoped URLs).
    Azure,
    /// Offline provider that streams the human input back. For local runs only.
    #[default]
    Echo,
}

/// Generation provider settings.
///
/// Does not derive `Clone` or `Serialize` so the API key cannot leak through
/// a config dump.
#[derive(Debug, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: ProviderKind,

    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default)]
    pub api_key: Option<SecretString>,

    #[serde(default)]
    pub model: Option<String>,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default)]
    pub temperature: Option<f64>,

    /// Azure OpenAI REST API version.
    #[serde(default = "default_api_version")]
    pub api_version: String,
}

fn default_api_version() -> String {
    "2024-10-21".to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            base_url: None,
            api_key: None,
            model: None,
            max_tokens: default_max_tokens(),
            temperature: None,
            api_version: default_api_version(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,

    /// Export spans to stdout via OpenTelemetry.
    #[serde(default)]
    pub otel: bool,
}
