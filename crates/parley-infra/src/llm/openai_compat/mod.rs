//! OpenAI-compatible generation provider.
//!
//! A single [`OpenAiCompatibleProvider`] serves the public OpenAI API, any
//! server speaking the same chat completions protocol, and Azure OpenAI
//! deployments. The client configuration type decides how requests are
//! addressed and authenticated.
//!
//! Uses [`async_openai`] for type-safe request/response handling and
//! built-in SSE streaming.

pub mod config;
pub mod streaming;

use async_openai::Client;
use async_openai::config::{AzureConfig, Config, OpenAIConfig};
use async_openai::types::chat::{
    ChatCompletionRequestMessage, ChatCompletionRequestUserMessage,
    ChatCompletionRequestUserMessageContent, CreateChatCompletionRequest,
};
use futures_util::StreamExt;
use secrecy::ExposeSecret;

use parley_core::llm::provider::{FragmentStream, LlmProvider};
use parley_types::llm::{CONTENT_POLICY_MARKER, GenerationError, GenerationRequest};

use self::config::{AzureDeploymentConfig, OpenAiCompatConfig};
use self::streaming::map_chat_stream;

/// Provider for any OpenAI chat completions endpoint.
///
/// # API Key Security
///
/// Does NOT derive Debug: the `async_openai::Client` holds the API key.
pub struct OpenAiCompatibleProvider<C: Config = OpenAIConfig> {
    client: Client<C>,
    provider_name: String,
    model: String,
}

impl OpenAiCompatibleProvider<OpenAIConfig> {
    /// Create a provider for a plain OpenAI-compatible endpoint.
    pub fn new(config: OpenAiCompatConfig) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(config.api_key.expose_secret())
            .with_api_base(&config.base_url);

        Self {
            client: Client::with_config(openai_config),
            provider_name: config.provider_name,
            model: config.model,
        }
    }
}

impl OpenAiCompatibleProvider<AzureConfig> {
    /// Create a provider for an Azure OpenAI deployment.
    pub fn azure(config: AzureDeploymentConfig) -> Self {
        let azure_config = AzureConfig::new()
            .with_api_base(&config.endpoint)
            .with_api_key(config.api_key.expose_secret())
            .with_deployment_id(&config.deployment)
            .with_api_version(&config.api_version);

        Self {
            client: Client::with_config(azure_config),
            provider_name: "azure".to_string(),
            model: config.deployment,
        }
    }
}

impl<C: Config> OpenAiCompatibleProvider<C> {
    /// Build a streaming [`CreateChatCompletionRequest`] from a [`GenerationRequest`].
    ///
    /// The rendered prompt already carries the transcript, so it is sent as a
    /// single user message.
    fn build_request(&self, request: &GenerationRequest) -> CreateChatCompletionRequest {
        let messages = vec![ChatCompletionRequestMessage::User(
            ChatCompletionRequestUserMessage {
                content: ChatCompletionRequestUserMessageContent::Text(request.prompt.clone()),
                name: None,
            },
        )];

        // Use the model from the request if set, otherwise fall back to config default
        let model = if request.model.is_empty() {
            self.model.clone()
        } else {
            request.model.clone()
        };

        CreateChatCompletionRequest {
            model,
            messages,
            max_completion_tokens: Some(request.max_tokens),
            temperature: request.temperature.map(|t| t as f32),
            stream: Some(true),
            ..Default::default()
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl<C: Config + Clone + 'static> LlmProvider for OpenAiCompatibleProvider<C> {
    fn name(&self) -> &str {
        &self.provider_name
    }

    fn stream(&self, request: GenerationRequest) -> FragmentStream {
        let oai_request = self.build_request(&request);

        // Clone the client for the 'static stream
        let client = self.client.clone();

        Box::pin(async_stream::try_stream! {
            let oai_stream = client
                .chat()
                .create_stream(oai_request)
                .await
                .map_err(map_openai_error)?;

            let mut inner = map_chat_stream(oai_stream);
            while let Some(fragment) = inner.next().await {
                yield fragment?;
            }
        })
    }
}

/// Map an `async_openai::error::OpenAIError` to a [`GenerationError`].
///
/// Azure rejects filtered prompts with an API error whose message names the
/// content management policy; those become [`GenerationError::ContentFiltered`].
pub(crate) fn map_openai_error(err: async_openai::error::OpenAIError) -> GenerationError {
    use async_openai::error::OpenAIError;

    match &err {
        OpenAIError::ApiError(api_err) => {
            let code = api_err.code.as_deref().unwrap_or("");
            let error_type = api_err.r#type.as_deref().unwrap_or("");

            if code == "content_filter"
                || api_err.message.to_lowercase().contains(CONTENT_POLICY_MARKER)
            {
                GenerationError::ContentFiltered(api_err.message.clone())
            } else if code == "invalid_api_key"
                || code == "401"
                || error_type == "authentication_error"
                || api_err.message.contains("Incorrect API key")
                || api_err.message.contains("Access denied due to invalid subscription key")
            {
                GenerationError::AuthenticationFailed
            } else if code == "rate_limit_exceeded" || code == "429" || error_type == "rate_limit_error" {
                GenerationError::RateLimited {
                    retry_after_ms: None,
                }
            } else {
                GenerationError::Provider {
                    message: err.to_string(),
                }
            }
        }
        OpenAIError::Reqwest(reqwest_err) => match reqwest_err.status().map(|s| s.as_u16()) {
            Some(401) => GenerationError::AuthenticationFailed,
            Some(429) => GenerationError::RateLimited {
                retry_after_ms: None,
            },
            _ => GenerationError::Provider {
                message: err.to_string(),
            },
        },
        OpenAIError::JSONDeserialize(_, content) => {
            GenerationError::Deserialization(format!("failed to parse response: {content}"))
        }
        OpenAIError::StreamError(stream_err) => GenerationError::Stream(stream_err.to_string()),
        OpenAIError::InvalidArgument(msg) => GenerationError::InvalidRequest(msg.clone()),
        _ => GenerationError::Provider {
            message: err.to_string(),
        },
    }
}
