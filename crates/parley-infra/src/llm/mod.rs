//! Generation provider implementations.
//!
//! Contains concrete implementations of the [`LlmProvider`] trait defined in
//! `parley-core`, plus a factory ([`create_provider`]) that builds the
//! configured provider.

pub mod echo;
pub mod openai_compat;

use std::sync::Arc;

use secrecy::SecretString;

use parley_core::llm::provider::LlmProvider;
use parley_types::config::{LlmConfig, ProviderKind};
use parley_types::llm::GenerationError;

use self::echo::EchoProvider;
use self::openai_compat::OpenAiCompatibleProvider;
use self::openai_compat::config::{AzureDeploymentConfig, OPENAI_BASE_URL, OpenAiCompatConfig};

/// Create the provider selected by `config.provider`.
///
/// # Errors
///
/// Remote providers need an API key and a model (deployment for Azure);
/// Azure additionally needs its endpoint. Missing keys yield
/// [`GenerationError::AuthenticationFailed`], other missing settings
/// [`GenerationError::InvalidRequest`] naming the setting.
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, GenerationError> {
    match config.provider {
        ProviderKind::Echo => Ok(Arc::new(EchoProvider::new())),
        ProviderKind::OpenAi => {
            let api_key = require_key(config)?;
            let model = require(config.model.as_deref(), "llm.model")?;
            let base_url = config
                .base_url
                .clone()
                .unwrap_or_else(|| OPENAI_BASE_URL.to_string());

            tracing::info!(%base_url, model, "using OpenAI-compatible provider");
            Ok(Arc::new(OpenAiCompatibleProvider::new(OpenAiCompatConfig {
                provider_name: "openai".to_string(),
                base_url,
                api_key,
                model: model.to_string(),
            })))
        }
        ProviderKind::Azure => {
            let api_key = require_key(config)?;
            let deployment = require(config.model.as_deref(), "llm.model")?;
            let endpoint = require(config.base_url.as_deref(), "llm.base_url")?;

            tracing::info!(endpoint, deployment, api_version = %config.api_version, "using Azure OpenAI provider");
            Ok(Arc::new(OpenAiCompatibleProvider::azure(AzureDeploymentConfig {
                endpoint: endpoint.to_string(),
                api_key,
                deployment: deployment.to_string(),
                api_version: config.api_version.clone(),
            })))
        }
    }
}

fn require_key(config: &LlmConfig) -> Result<SecretString, GenerationError> {
    config
        .api_key
        .clone()
        .ok_or(GenerationError::AuthenticationFailed)
}

fn require<'a>(value: Option<&'a str>, setting: &str) -> Result<&'a str, GenerationError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| GenerationError::InvalidRequest(format!("{setting} is not set")))
}
