//! OpenAI backend over the chat completions API.
//!
//! Uses [`async_openai`] for request/response types and transport. Every
//! request carries a fixed system instruction ahead of the user prompt.

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::chat::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
    ChatCompletionRequestSystemMessageContent, ChatCompletionRequestUserMessage,
    ChatCompletionRequestUserMessageContent, CreateChatCompletionRequest,
    CreateChatCompletionResponse,
};
use secrecy::{ExposeSecret, SecretString};
use tracing::Instrument;

use karte_core::llm::backend::LlmBackend;
use karte_observe::genai_attrs;
use karte_types::error::SummaryError;
use karte_types::llm::{GenerationResult, LlmError, ProviderKind};

use super::common;

/// System instruction sent with every request.
pub const SYSTEM_INSTRUCTION: &str = "あなたは経験豊富な医療文書作成の専門家です。";

/// OpenAI chat completions backend.
///
/// Does NOT derive Debug: the initialized `async_openai::Client` holds the
/// API key.
pub struct OpenAiBackend {
    client: Option<Client<OpenAIConfig>>,
    api_key: SecretString,
    base_url: String,
    model: String,
    max_completion_tokens: u32,
}

impl OpenAiBackend {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.openai.com/v1";

    pub const DEFAULT_MAX_COMPLETION_TOKENS: u32 = 10_000;

    pub fn new(api_key: SecretString, model: impl Into<String>) -> Self {
        Self {
            client: None,
            api_key,
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            model: model.into(),
            max_completion_tokens: Self::DEFAULT_MAX_COMPLETION_TOKENS,
        }
    }

    /// Override the API base (useful for testing or proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_max_completion_tokens(mut self, max_completion_tokens: u32) -> Self {
        self.max_completion_tokens = max_completion_tokens;
        self
    }

    fn build_request(&self, prompt: &str, model: &str) -> CreateChatCompletionRequest {
        let messages = vec![
            ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage {
                content: ChatCompletionRequestSystemMessageContent::Text(
                    SYSTEM_INSTRUCTION.to_string(),
                ),
                name: None,
            }),
            ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
                content: ChatCompletionRequestUserMessageContent::Text(prompt.to_string()),
                name: None,
            }),
        ];

        CreateChatCompletionRequest {
            model: model.to_string(),
            messages,
            max_completion_tokens: Some(self.max_completion_tokens),
            ..Default::default()
        }
    }
}

impl LlmBackend for OpenAiBackend {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    fn name(&self) -> &str {
        "OpenAiBackend"
    }

    fn default_model(&self) -> &str {
        &self.model
    }

    fn is_initialized(&self) -> bool {
        self.client.is_some()
    }

    fn initialize(&mut self) -> Result<(), SummaryError> {
        if common::is_blank(&self.api_key) {
            return Err(SummaryError::CredentialMissing {
                vendor: ProviderKind::OpenAi.vendor_name().to_string(),
            });
        }

        let config = OpenAIConfig::new()
            .with_api_key(self.api_key.expose_secret())
            .with_api_base(&self.base_url);
        self.client = Some(Client::with_config(config));
        Ok(())
    }

    async fn generate_content(
        &self,
        prompt: &str,
        model: &str,
    ) -> Result<GenerationResult, LlmError> {
        let client = self.client.as_ref().ok_or(LlmError::NotInitialized)?;
        let request = self.build_request(prompt, model);
        let span = common::chat_span(
            genai_attrs::PROVIDER_OPENAI,
            model,
            Some(self.max_completion_tokens),
        );

        let response = client
            .chat()
            .create(request)
            .instrument(span.clone())
            .await
            .map_err(map_openai_error)?;

        let result = normalize_response(&response);
        common::record_usage(&span, &result);

        Ok(result)
    }
}

/// Normalize a chat completion into a [`GenerationResult`].
///
/// Text is the first choice's message content; no choices, null content or
/// an empty string yield the empty-response sentinel. Missing usage yields
/// 0/0.
pub fn normalize_response(response: &CreateChatCompletionResponse) -> GenerationResult {
    let (input_tokens, output_tokens) = response
        .usage
        .as_ref()
        .map(|u| (u.prompt_tokens, u.completion_tokens))
        .unwrap_or((0, 0));

    let text = response
        .choices
        .first()
        .and_then(|choice| choice.message.content.as_deref())
        .filter(|content| !content.is_empty());

    match text {
        Some(text) => GenerationResult::new(text, input_tokens, output_tokens),
        None => GenerationResult::empty(input_tokens, output_tokens),
    }
}

/// Map an `async_openai::error::OpenAIError` to an [`LlmError`].
fn map_openai_error(err: async_openai::error::OpenAIError) -> LlmError {
    use async_openai::error::OpenAIError;

    match &err {
        OpenAIError::ApiError(api_err) => {
            let code = api_err.code.as_deref().unwrap_or("");
            let error_type = api_err.r#type.as_deref().unwrap_or("");

            if code == "invalid_api_key"
                || error_type == "authentication_error"
                || api_err.message.contains("Incorrect API key")
            {
                LlmError::AuthenticationFailed
            } else if code == "rate_limit_exceeded" || error_type == "rate_limit_error" {
                LlmError::RateLimited {
                    retry_after_ms: None,
                }
            } else if code == "server_error" || error_type == "overloaded_error" {
                LlmError::Overloaded(api_err.message.clone())
            } else {
                LlmError::Provider {
                    message: err.to_string(),
                }
            }
        }
        OpenAIError::Reqwest(reqwest_err) => match reqwest_err.status().map(|s| s.as_u16()) {
            Some(401) => LlmError::AuthenticationFailed,
            Some(429) => LlmError::RateLimited {
                retry_after_ms: None,
            },
            Some(503) | Some(529) => LlmError::Overloaded(err.to_string()),
            _ => LlmError::Provider {
                message: err.to_string(),
            },
        },
        OpenAIError::JSONDeserialize(_, content) => {
            LlmError::Deserialization(format!("failed to parse response: {content}"))
        }
        OpenAIError::InvalidArgument(msg) => LlmError::InvalidRequest(msg.clone()),
        _ => LlmError::Provider {
            message: err.to_string(),
        },
    }
}
