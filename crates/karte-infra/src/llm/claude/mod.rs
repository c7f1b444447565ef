//! Anthropic Claude backend.
//!
//! Sends one user message to the Messages API (`/v1/messages`) and joins the
//! text blocks of the reply. The API key is wrapped in
//! [`secrecy::SecretString`] and only exposed when building request headers.

pub mod types;

use secrecy::{ExposeSecret, SecretString};
use tracing::Instrument;

use karte_core::llm::backend::LlmBackend;
use karte_observe::genai_attrs;
use karte_types::error::SummaryError;
use karte_types::llm::{GenerationResult, LlmError, ProviderKind};

use self::types::{ClaudeContentBlock, ClaudeMessage, ClaudeRequest, ClaudeResponse};
use super::common;

/// Anthropic Claude backend.
///
/// Does not derive Debug; the credential stays out of formatted output.
pub struct ClaudeBackend {
    client: Option<reqwest::Client>,
    api_key: SecretString,
    base_url: String,
    model: String,
    max_tokens: u32,
}

impl ClaudeBackend {
    /// The Anthropic API version header value.
    const API_VERSION: &'static str = "2023-06-01";

    pub const DEFAULT_BASE_URL: &'static str = "https://api.anthropic.com";

    pub const DEFAULT_MAX_TOKENS: u32 = 6_000;

    pub fn new(api_key: SecretString, model: impl Into<String>) -> Self {
        Self {
            client: None,
            api_key,
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            model: model.into(),
            max_tokens: Self::DEFAULT_MAX_TOKENS,
        }
    }

    /// Override the base URL (useful for testing or proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    fn to_claude_request(&self, prompt: &str, model: &str) -> ClaudeRequest {
        ClaudeRequest {
            model: model.to_string(),
            max_tokens: self.max_tokens,
            messages: vec![ClaudeMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        }
    }
}

impl LlmBackend for ClaudeBackend {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Claude
    }

    fn name(&self) -> &str {
        "ClaudeBackend"
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
                vendor: ProviderKind::Claude.vendor_name().to_string(),
            });
        }
        self.client = Some(common::build_http_client(ProviderKind::Claude.vendor_name())?);
        Ok(())
    }

    async fn generate_content(
        &self,
        prompt: &str,
        model: &str,
    ) -> Result<GenerationResult, LlmError> {
        let client = self.client.as_ref().ok_or(LlmError::NotInitialized)?;
        let body = self.to_claude_request(prompt, model);
        let span = common::chat_span(genai_attrs::PROVIDER_ANTHROPIC, model, Some(self.max_tokens));

        let request = client
            .post(self.url("/v1/messages"))
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", Self::API_VERSION)
            .header("content-type", "application/json")
            .json(&body);

        let response: ClaudeResponse = common::send_json(request).instrument(span.clone()).await?;
        let result = normalize_response(response);
        common::record_usage(&span, &result);

        Ok(result)
    }
}

/// Normalize a Messages API reply into a [`GenerationResult`].
///
/// Text is the concatenation of all text blocks; no text at all yields the
/// empty-response sentinel. Missing usage counts default to 0.
pub fn normalize_response(response: ClaudeResponse) -> GenerationResult {
    let usage = response.usage.unwrap_or_default();
    let input_tokens = usage.input_tokens.unwrap_or(0);
    let output_tokens = usage.output_tokens.unwrap_or(0);

    let text: String = response
        .content
        .unwrap_or_default()
        .iter()
        .filter_map(|block| match block {
            ClaudeContentBlock::Text { text } => Some(text.as_str()),
            ClaudeContentBlock::Other => None,
        })
        .collect();

    if text.is_empty() {
        GenerationResult::empty(input_tokens, output_tokens)
    } else {
        GenerationResult::new(text, input_tokens, output_tokens)
    }
}
