//! Google Gemini backend.
//!
//! Two endpoints share one request shape:
//!
//! - **AI Studio** (default): `{base_url}/v1beta/models/{model}:generateContent`,
//!   authenticated with an `x-goog-api-key` header.
//! - **Vertex AI** (when a project ID is configured):
//!   `https://{location}-aiplatform.googleapis.com/v1/projects/{project}/locations/{location}/publishers/google/models/{model}:generateContent`,
//!   authenticated with the credential as a bearer token. The location is
//!   required in this mode.

pub mod types;

use secrecy::{ExposeSecret, SecretString};
use tracing::Instrument;

use karte_core::llm::backend::LlmBackend;
use karte_observe::genai_attrs;
use karte_types::error::SummaryError;
use karte_types::llm::{GenerationResult, LlmError, ProviderKind};

use self::types::{
    GeminiContent, GeminiPart, GeminiRequest, GeminiResponse, GenerationConfig, ThinkingConfig,
};
use super::common;

/// Where requests go and how they authenticate.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Endpoint {
    AiStudio { url: String },
    Vertex { url: String },
}

/// Google Gemini backend.
///
/// Does not derive Debug; the credential stays out of formatted output.
pub struct GeminiBackend {
    client: Option<reqwest::Client>,
    credentials: SecretString,
    model: String,
    thinking_budget: Option<u32>,
    base_url: String,
    project_id: Option<String>,
    location: Option<String>,
}

impl GeminiBackend {
    pub const DEFAULT_BASE_URL: &'static str = "https://generativelanguage.googleapis.com";

    pub fn new(credentials: SecretString, model: impl Into<String>) -> Self {
        Self {
            client: None,
            credentials,
            model: model.into(),
            thinking_budget: None,
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            project_id: None,
            location: None,
        }
    }

    /// Route requests through Vertex AI for `project_id`.
    pub fn with_vertex(mut self, project_id: impl Into<String>, location: Option<String>) -> Self {
        self.project_id = Some(project_id.into());
        self.location = location;
        self
    }

    /// Extended reasoning budget; `None` or `Some(0)` sends no thinking config.
    pub fn with_thinking_budget(mut self, budget: Option<u32>) -> Self {
        self.thinking_budget = budget;
        self
    }

    /// Override the AI Studio base URL (useful for testing or proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint(&self, model: &str) -> Result<Endpoint, SummaryError> {
        let project = self
            .project_id
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty());

        let Some(project) = project else {
            return Ok(Endpoint::AiStudio {
                url: format!(
                    "{}/v1beta/models/{model}:generateContent",
                    self.base_url.trim_end_matches('/')
                ),
            });
        };

        let location = self
            .location
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .ok_or_else(|| SummaryError::ConfigurationMissing {
                vendor: ProviderKind::Gemini.vendor_name().to_string(),
                setting: "location".to_string(),
            })?;

        Ok(Endpoint::Vertex {
            url: format!(
                "https://{location}-aiplatform.googleapis.com/v1/projects/{project}/locations/{location}/publishers/google/models/{model}:generateContent"
            ),
        })
    }

    fn build_request(&self, prompt: &str) -> GeminiRequest {
        let generation_config = self
            .thinking_budget
            .filter(|budget| *budget > 0)
            .map(|thinking_budget| GenerationConfig {
                thinking_config: ThinkingConfig { thinking_budget },
            });

        GeminiRequest {
            contents: vec![GeminiContent {
                role: "user".to_string(),
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config,
        }
    }
}

impl LlmBackend for GeminiBackend {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    fn name(&self) -> &str {
        "GeminiBackend"
    }

    fn default_model(&self) -> &str {
        &self.model
    }

    fn is_initialized(&self) -> bool {
        self.client.is_some()
    }

    fn initialize(&mut self) -> Result<(), SummaryError> {
        if common::is_blank(&self.credentials) {
            return Err(SummaryError::CredentialMissing {
                vendor: ProviderKind::Gemini.vendor_name().to_string(),
            });
        }
        self.endpoint(&self.model)?;
        self.client = Some(common::build_http_client(ProviderKind::Gemini.vendor_name())?);
        Ok(())
    }

    async fn generate_content(
        &self,
        prompt: &str,
        model: &str,
    ) -> Result<GenerationResult, LlmError> {
        let client = self.client.as_ref().ok_or(LlmError::NotInitialized)?;
        let body = self.build_request(prompt);
        let span = common::chat_span(genai_attrs::PROVIDER_GCP_GEMINI, model, None);

        let request = match self.endpoint(model)? {
            Endpoint::AiStudio { url } => client
                .post(url)
                .header("x-goog-api-key", self.credentials.expose_secret()),
            Endpoint::Vertex { url } => client
                .post(url)
                .bearer_auth(self.credentials.expose_secret()),
        }
        .json(&body);

        tracing::debug!(
            model,
            thinking_budget = ?body.generation_config.as_ref().map(|c| c.thinking_config.thinking_budget),
            "Sending Gemini request"
        );

        let response: GeminiResponse = common::send_json(request).instrument(span.clone()).await?;
        let result = normalize_response(response);
        common::record_usage(&span, &result);

        Ok(result)
    }
}

/// Normalize a `generateContent` reply into a [`GenerationResult`].
///
/// Text is the concatenation of the first candidate's text parts, skipping
/// thought summaries. No candidates, no parts or empty text yield the
/// empty-response sentinel. Each usage count defaults to 0 on its own.
pub fn normalize_response(response: GeminiResponse) -> GenerationResult {
    let usage = response.usage_metadata.unwrap_or_default();
    let input_tokens = usage.prompt_token_count.unwrap_or(0);
    let output_tokens = usage.candidates_token_count.unwrap_or(0);

    let text: String = response
        .candidates
        .unwrap_or_default()
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts)
        .unwrap_or_default()
        .into_iter()
        .filter(|part| part.thought != Some(true))
        .filter_map(|part| part.text)
        .collect();

    if text.is_empty() {
        GenerationResult::empty(input_tokens, output_tokens)
    } else {
        GenerationResult::new(text, input_tokens, output_tokens)
    }
}
