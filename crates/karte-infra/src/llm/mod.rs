//! LLM backend implementations.
//!
//! Contains the concrete [`LlmBackend`](karte_core::llm::backend::LlmBackend)
//! adapters for Claude, OpenAI and Gemini, and the
//! [`ConfiguredProviderFactory`] that builds them from an [`AppConfig`].

pub mod claude;
mod common;
pub mod gemini;
pub mod openai;

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};

use karte_core::dispatch::ProviderFactory;
use karte_core::llm::box_backend::BoxLlmBackend;
use karte_core::llm::client::SummaryClient;
use karte_core::prompt::{PromptBuilder, PromptStore};
use karte_types::config::AppConfig;
use karte_types::error::SummaryError;
use karte_types::llm::ProviderKind;

use self::claude::ClaudeBackend;
use self::gemini::GeminiBackend;
use self::openai::OpenAiBackend;

/// Builds backends bound to the credentials and models in an [`AppConfig`].
///
/// A provider without a configured credential still constructs; its
/// `initialize` then fails with `CredentialMissing`.
#[derive(Clone)]
pub struct ConfiguredProviderFactory {
    config: Arc<AppConfig>,
    prompts: PromptBuilder,
}

impl ConfiguredProviderFactory {
    pub fn new(config: Arc<AppConfig>, store: Arc<dyn PromptStore>) -> Self {
        let prompts = PromptBuilder::new(store, config.prompts.summary.clone());
        Self { config, prompts }
    }

    /// Construct the type-erased backend for `kind`.
    pub fn create_backend(&self, kind: ProviderKind) -> BoxLlmBackend {
        let providers = &self.config.providers;
        match kind {
            ProviderKind::Claude => {
                let settings = &providers.claude;
                let mut backend =
                    ClaudeBackend::new(copy_secret(settings.api_key.as_ref()), &settings.model)
                        .with_max_tokens(settings.max_tokens);
                if let Some(base_url) = &settings.base_url {
                    backend = backend.with_base_url(base_url);
                }
                BoxLlmBackend::new(backend)
            }
            ProviderKind::OpenAi => {
                let settings = &providers.openai;
                let mut backend =
                    OpenAiBackend::new(copy_secret(settings.api_key.as_ref()), &settings.model)
                        .with_max_completion_tokens(settings.max_completion_tokens);
                if let Some(base_url) = &settings.base_url {
                    backend = backend.with_base_url(base_url);
                }
                BoxLlmBackend::new(backend)
            }
            ProviderKind::Gemini => {
                let settings = &providers.gemini;
                let mut backend =
                    GeminiBackend::new(copy_secret(settings.credentials.as_ref()), &settings.model)
                        .with_thinking_budget(settings.thinking_budget);
                if let Some(project_id) = &settings.project_id {
                    backend = backend.with_vertex(project_id, settings.location.clone());
                }
                if let Some(base_url) = &settings.base_url {
                    backend = backend.with_base_url(base_url);
                }
                BoxLlmBackend::new(backend)
            }
        }
    }
}

impl ProviderFactory for ConfiguredProviderFactory {
    fn create(&self, kind: ProviderKind) -> Result<SummaryClient<BoxLlmBackend>, SummaryError> {
        tracing::debug!(provider = %kind, model = self.config.model_for(kind), "Constructing backend");
        Ok(SummaryClient::new(
            self.create_backend(kind),
            self.prompts.clone(),
        ))
    }

    fn has_credentials(&self, kind: ProviderKind) -> bool {
        self.config.has_credentials(kind)
    }
}

fn copy_secret(secret: Option<&SecretString>) -> SecretString {
    SecretString::from(
        secret
            .map(|s| s.expose_secret().to_string())
            .unwrap_or_default(),
    )
}
