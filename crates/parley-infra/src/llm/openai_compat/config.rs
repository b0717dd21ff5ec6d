//! Connection settings for OpenAI-compatible providers.

use secrecy::SecretString;

/// Base URL of the public OpenAI API.
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Settings for a plain OpenAI-compatible endpoint (`Authorization: Bearer`).
///
/// Used to construct an [`super::OpenAiCompatibleProvider`].
pub struct OpenAiCompatConfig {
    /// Human-readable provider name used in logs (e.g., "openai").
    pub provider_name: String,
    /// Base URL for the API (e.g., "https://api.openai.com/v1").
    pub base_url: String,
    pub api_key: SecretString,
    /// Default model when a request does not name one.
    pub model: String,
}

/// Settings for an Azure OpenAI deployment (`api-key` header, deployment URL).
pub struct AzureDeploymentConfig {
    /// Resource endpoint, e.g. `https://my-resource.openai.azure.com`.
    pub endpoint: String,
    pub api_key: SecretString,
    /// Deployment name; Azure routes by deployment rather than model.
    pub deployment: String,
    pub api_version: String,
}

/// OpenAI default configuration.
pub fn openai_defaults(api_key: SecretString, model: &str) -> OpenAiCompatConfig {
    OpenAiCompatConfig {
        provider_name: "openai".into(),
        base_url: OPENAI_BASE_URL.into(),
        api_key,
        model: model.into(),
    }
}
