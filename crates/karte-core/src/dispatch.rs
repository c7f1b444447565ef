//! Provider selection and the token-budget fallback policy.
//!
//! [`Dispatcher`] turns a provider selector into a concrete backend through a
//! [`ProviderFactory`] and runs one generation. [`Dispatcher::summarize`]
//! adds the composed policy: input validation, credential checks, default
//! provider selection and the switch to the high-capacity fallback provider
//! for long inputs.

use karte_types::config::DispatchConfig;
use karte_types::error::SummaryError;
use karte_types::llm::{GenerationResult, ProviderKind, ProviderSelector};
use karte_types::summary::SummaryRequest;

use crate::llm::box_backend::BoxLlmBackend;
use crate::llm::client::SummaryClient;
use crate::llm::token_estimate::estimate_tokens;

/// Builds ready-to-use clients for a provider kind.
///
/// Implemented in karte-infra by `ConfiguredProviderFactory`, which binds
/// each adapter to its configured credential and default model.
pub trait ProviderFactory: Send + Sync {
    /// Construct the adapter for `kind`. Does not initialize it.
    fn create(&self, kind: ProviderKind) -> Result<SummaryClient<BoxLlmBackend>, SummaryError>;

    /// Whether a non-blank credential is configured for `kind`.
    fn has_credentials(&self, kind: ProviderKind) -> bool;
}

/// Result of [`Dispatcher::summarize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub result: GenerationResult,
    /// Provider that produced the result.
    pub provider: ProviderKind,
    /// Model pinned by the caller or by the fallback switch, if any.
    pub model: Option<String>,
    /// Set when the token budget moved the request to the fallback provider.
    pub switch_notice: Option<String>,
}

/// Routes summary requests to a provider.
pub struct Dispatcher<F> {
    factory: F,
    policy: DispatchConfig,
}

impl<F: ProviderFactory> Dispatcher<F> {
    pub fn new(factory: F, policy: DispatchConfig) -> Self {
        Self { factory, policy }
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Resolve a selector to a provider kind.
    ///
    /// Unknown names fail with [`SummaryError::UnsupportedProvider`] before
    /// anything is constructed.
    pub fn resolve_provider(
        &self,
        selector: impl Into<ProviderSelector>,
    ) -> Result<ProviderKind, SummaryError> {
        selector.into().resolve()
    }

    /// Construct the selected provider and generate once.
    pub async fn generate_with_provider(
        &self,
        selector: impl Into<ProviderSelector>,
        request: &SummaryRequest,
    ) -> Result<GenerationResult, SummaryError> {
        let kind = self.resolve_provider(selector)?;
        let mut client = self.factory.create(kind)?;
        client.generate(request).await
    }

    /// Validate, select a provider (applying the fallback rule) and generate.
    pub async fn summarize(
        &self,
        selector: Option<ProviderSelector>,
        request: &SummaryRequest,
    ) -> Result<DispatchOutcome, SummaryError> {
        let tokens = validate_input(&request.medical_text, &self.policy)?;

        if !ProviderKind::ALL
            .iter()
            .any(|kind| self.factory.has_credentials(*kind))
        {
            return Err(SummaryError::NoCredentials);
        }

        let requested = match selector {
            Some(selector) => selector.resolve()?,
            None => self.policy.default_provider,
        };

        let fallback = self.policy.fallback_provider;
        let long_input = tokens > self.policy.token_threshold;

        if long_input && !self.factory.has_credentials(fallback) {
            tracing::warn!(
                tokens,
                threshold = self.policy.token_threshold,
                fallback = %fallback,
                "Input exceeds token threshold and fallback provider has no credentials"
            );
            return Err(SummaryError::TooLongNoFallback {
                tokens,
                threshold: self.policy.token_threshold,
            });
        }

        let kind = if long_input { fallback } else { requested };
        let mut client = self.factory.create(kind)?;
        let mut request = request.clone();
        let mut switch_notice = None;

        if long_input {
            let target = self
                .policy
                .fallback_model
                .clone()
                .unwrap_or_else(|| client.default_model().to_string());
            let pinned_elsewhere = request
                .model
                .as_deref()
                .is_some_and(|model| model != target);

            if requested != fallback || pinned_elsewhere {
                let original = request
                    .model
                    .clone()
                    .unwrap_or_else(|| requested.vendor_name().to_string());
                switch_notice = Some(format!(
                    "input is long ({tokens} tokens); switching from {original} to {} ({target})",
                    fallback.vendor_name()
                ));
                tracing::info!(
                    tokens,
                    threshold = self.policy.token_threshold,
                    from = %requested,
                    to = %fallback,
                    model = %target,
                    "Switching to fallback provider"
                );
                request.model = Some(target);
            }
        }

        let result = client.generate(&request).await?;

        tracing::info!(
            provider = %kind,
            input_tokens = result.input_tokens,
            output_tokens = result.output_tokens,
            "Summary generated"
        );

        Ok(DispatchOutcome {
            result,
            provider: kind,
            model: request.model,
            switch_notice,
        })
    }
}

/// Check the size of a medical record and return its estimated token count.
pub fn validate_input(text: &str, policy: &DispatchConfig) -> Result<u32, SummaryError> {
    if text.trim().is_empty() {
        return Err(SummaryError::EmptyInput);
    }

    let tokens = estimate_tokens(text);
    if tokens < policy.min_input_tokens {
        return Err(SummaryError::InputTooShort {
            tokens,
            min: policy.min_input_tokens,
        });
    }
    if tokens > policy.max_input_tokens {
        return Err(SummaryError::InputTooLong {
            tokens,
            max: policy.max_input_tokens,
        });
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::future::Future;
    use std::sync::{Arc, Mutex};

    use karte_types::llm::LlmError;

    use crate::llm::backend::LlmBackend;
    use crate::prompt::PromptBuilder;

    // --- Mocks ---

    struct MockBackend {
        kind: ProviderKind,
        initialized: bool,
        models: Arc<Mutex<Vec<String>>>,
    }

    impl LlmBackend for MockBackend {
        fn kind(&self) -> ProviderKind {
            self.kind
        }

        fn name(&self) -> &str {
            "MockBackend"
        }

        fn default_model(&self) -> &str {
            match self.kind {
                ProviderKind::Claude => "claude-default",
                ProviderKind::OpenAi => "openai-default",
                ProviderKind::Gemini => "gemini-default",
            }
        }

        fn is_initialized(&self) -> bool {
            self.initialized
        }

        fn initialize(&mut self) -> Result<(), SummaryError> {
            self.initialized = true;
            Ok(())
        }

        fn generate_content(
            &self,
            _prompt: &str,
            model: &str,
        ) -> impl Future<Output = Result<GenerationResult, LlmError>> + Send {
            self.models.lock().unwrap().push(model.to_string());
            let text = format!("{} summary", self.kind);
            async move { Ok(GenerationResult::new(text, 10, 5)) }
        }
    }

    /// Records every construction so tests can assert none happened.
    struct MockFactory {
        credentials: HashSet<ProviderKind>,
        created: Arc<Mutex<Vec<ProviderKind>>>,
        models: Arc<Mutex<Vec<String>>>,
    }

    impl MockFactory {
        fn with_credentials(kinds: &[ProviderKind]) -> Self {
            Self {
                credentials: kinds.iter().copied().collect(),
                created: Arc::new(Mutex::new(Vec::new())),
                models: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    impl ProviderFactory for MockFactory {
        fn create(
            &self,
            kind: ProviderKind,
        ) -> Result<SummaryClient<BoxLlmBackend>, SummaryError> {
            self.created.lock().unwrap().push(kind);
            let backend = MockBackend {
                kind,
                initialized: false,
                models: self.models.clone(),
            };
            Ok(SummaryClient::new(
                BoxLlmBackend::new(backend),
                PromptBuilder::with_default_template("テンプレート"),
            ))
        }

        fn has_credentials(&self, kind: ProviderKind) -> bool {
            self.credentials.contains(&kind)
        }
    }

    fn small_policy() -> DispatchConfig {
        DispatchConfig {
            token_threshold: 50,
            max_input_tokens: 200,
            min_input_tokens: 5,
            ..DispatchConfig::default()
        }
    }

    fn record(chars: usize) -> String {
        "あ".repeat(chars)
    }

    // --- resolve / generate_with_provider ---

    #[test]
    fn test_resolve_provider_by_kind_and_name() {
        let dispatcher = Dispatcher::new(MockFactory::with_credentials(&[]), small_policy());

        for kind in ProviderKind::ALL {
            assert_eq!(dispatcher.resolve_provider(kind).unwrap(), kind);
            assert_eq!(dispatcher.resolve_provider(kind.as_str()).unwrap(), kind);
            assert_eq!(
                dispatcher
                    .resolve_provider(kind.as_str().to_uppercase())
                    .unwrap(),
                kind
            );
        }
    }

    #[tokio::test]
    async fn test_generate_with_provider_constructs_matching_backend() {
        let factory = MockFactory::with_credentials(&ProviderKind::ALL);
        let created = factory.created.clone();
        let dispatcher = Dispatcher::new(factory, small_policy());

        let result = dispatcher
            .generate_with_provider("OpenAI", &SummaryRequest::new(record(10)))
            .await
            .unwrap();

        assert_eq!(result.text, "openai summary");
        assert_eq!(*created.lock().unwrap(), vec![ProviderKind::OpenAi]);
    }

    #[tokio::test]
    async fn test_unsupported_provider_never_constructs() {
        let factory = MockFactory::with_credentials(&ProviderKind::ALL);
        let created = factory.created.clone();
        let dispatcher = Dispatcher::new(factory, small_policy());

        let err = dispatcher
            .generate_with_provider("invalid_provider", &SummaryRequest::new(record(10)))
            .await
            .unwrap_err();

        match err {
            SummaryError::UnsupportedProvider(value) => assert_eq!(value, "invalid_provider"),
            other => panic!("expected UnsupportedProvider, got: {other}"),
        }
        assert!(created.lock().unwrap().is_empty());
    }

    // --- summarize ---

    #[tokio::test]
    async fn test_summarize_uses_default_provider() {
        let factory = MockFactory::with_credentials(&ProviderKind::ALL);
        let dispatcher = Dispatcher::new(factory, small_policy());

        let outcome = dispatcher
            .summarize(None, &SummaryRequest::new(record(10)))
            .await
            .unwrap();

        assert_eq!(outcome.provider, ProviderKind::Gemini);
        assert!(outcome.switch_notice.is_none());
        assert!(outcome.model.is_none());
    }

    #[tokio::test]
    async fn test_summarize_switches_to_fallback_for_long_input() {
        let factory = MockFactory::with_credentials(&[ProviderKind::Claude, ProviderKind::Gemini]);
        let models = factory.models.clone();
        let created = factory.created.clone();
        let dispatcher = Dispatcher::new(factory, small_policy());

        let outcome = dispatcher
            .summarize(
                Some(ProviderKind::Claude.into()),
                &SummaryRequest::new(record(60)).with_model("claude-3-haiku"),
            )
            .await
            .unwrap();

        assert_eq!(outcome.provider, ProviderKind::Gemini);
        assert_eq!(outcome.model.as_deref(), Some("gemini-default"));
        let notice = outcome.switch_notice.unwrap();
        assert!(notice.contains("claude-3-haiku"));
        assert!(notice.contains("Gemini"));
        assert_eq!(*created.lock().unwrap(), vec![ProviderKind::Gemini]);
        assert_eq!(*models.lock().unwrap(), vec!["gemini-default".to_string()]);
    }

    #[tokio::test]
    async fn test_fallback_uses_configured_model() {
        let factory = MockFactory::with_credentials(&[ProviderKind::OpenAi, ProviderKind::Gemini]);
        let models = factory.models.clone();
        let policy = DispatchConfig {
            fallback_model: Some("gemini-2.5-pro".to_string()),
            ..small_policy()
        };
        let dispatcher = Dispatcher::new(factory, policy);

        let outcome = dispatcher
            .summarize(Some("openai".into()), &SummaryRequest::new(record(60)))
            .await
            .unwrap();

        assert_eq!(outcome.model.as_deref(), Some("gemini-2.5-pro"));
        assert_eq!(*models.lock().unwrap(), vec!["gemini-2.5-pro".to_string()]);
    }

    #[tokio::test]
    async fn test_too_long_without_fallback_credentials_fails_fast() {
        let factory = MockFactory::with_credentials(&[ProviderKind::Claude]);
        let created = factory.created.clone();
        let models = factory.models.clone();
        let dispatcher = Dispatcher::new(factory, small_policy());

        let err = dispatcher
            .summarize(Some("claude".into()), &SummaryRequest::new(record(60)))
            .await
            .unwrap_err();

        match err {
            SummaryError::TooLongNoFallback { tokens, threshold } => {
                assert_eq!(tokens, 60);
                assert_eq!(threshold, 50);
            }
            other => panic!("expected TooLongNoFallback, got: {other}"),
        }
        assert!(created.lock().unwrap().is_empty());
        assert!(models.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_no_switch_when_already_on_fallback_provider() {
        let factory = MockFactory::with_credentials(&[ProviderKind::Gemini]);
        let dispatcher = Dispatcher::new(factory, small_policy());

        let outcome = dispatcher
            .summarize(None, &SummaryRequest::new(record(60)))
            .await
            .unwrap();

        assert_eq!(outcome.provider, ProviderKind::Gemini);
        assert!(outcome.switch_notice.is_none());
    }

    #[tokio::test]
    async fn test_pinned_model_on_fallback_provider_is_overridden() {
        let factory = MockFactory::with_credentials(&[ProviderKind::Gemini]);
        let models = factory.models.clone();
        let policy = DispatchConfig {
            fallback_model: Some("gemini-2.5-pro".to_string()),
            ..small_policy()
        };
        let dispatcher = Dispatcher::new(factory, policy);

        let outcome = dispatcher
            .summarize(
                Some(ProviderKind::Gemini.into()),
                &SummaryRequest::new(record(60)).with_model("gemini-2.5-flash"),
            )
            .await
            .unwrap();

        assert_eq!(outcome.provider, ProviderKind::Gemini);
        assert_eq!(outcome.model.as_deref(), Some("gemini-2.5-pro"));
        let notice = outcome.switch_notice.unwrap();
        assert!(notice.contains("gemini-2.5-flash"));
        assert!(notice.contains("gemini-2.5-pro"));
        assert_eq!(*models.lock().unwrap(), vec!["gemini-2.5-pro".to_string()]);
    }

    #[tokio::test]
    async fn test_pinned_model_without_fallback_model_moves_to_backend_default() {
        let factory = MockFactory::with_credentials(&[ProviderKind::Gemini]);
        let dispatcher = Dispatcher::new(factory, small_policy());

        let outcome = dispatcher
            .summarize(None, &SummaryRequest::new(record(60)).with_model("gemini-2.5-flash"))
            .await
            .unwrap();

        assert_eq!(outcome.model.as_deref(), Some("gemini-default"));
        assert!(outcome.switch_notice.is_some());
    }

    #[tokio::test]
    async fn test_pinned_fallback_model_needs_no_switch() {
        let factory = MockFactory::with_credentials(&[ProviderKind::Gemini]);
        let policy = DispatchConfig {
            fallback_model: Some("gemini-2.5-pro".to_string()),
            ..small_policy()
        };
        let dispatcher = Dispatcher::new(factory, policy);

        let outcome = dispatcher
            .summarize(None, &SummaryRequest::new(record(60)).with_model("gemini-2.5-pro"))
            .await
            .unwrap();

        assert_eq!(outcome.model.as_deref(), Some("gemini-2.5-pro"));
        assert!(outcome.switch_notice.is_none());
    }

    #[tokio::test]
    async fn test_too_long_on_fallback_provider_without_credentials_fails_fast() {
        let factory = MockFactory::with_credentials(&[ProviderKind::Claude]);
        let created = factory.created.clone();
        let dispatcher = Dispatcher::new(factory, small_policy());

        let err = dispatcher
            .summarize(None, &SummaryRequest::new(record(60)))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SummaryError::TooLongNoFallback {
                tokens: 60,
                threshold: 50
            }
        ));
        assert!(created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_no_credentials_at_all() {
        let factory = MockFactory::with_credentials(&[]);
        let created = factory.created.clone();
        let dispatcher = Dispatcher::new(factory, small_policy());

        let err = dispatcher
            .summarize(None, &SummaryRequest::new(record(10)))
            .await
            .unwrap_err();

        assert!(matches!(err, SummaryError::NoCredentials));
        assert!(created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_summarize_rejects_unknown_selector() {
        let dispatcher = Dispatcher::new(
            MockFactory::with_credentials(&ProviderKind::ALL),
            small_policy(),
        );
        let err = dispatcher
            .summarize(Some("bedrock".into()), &SummaryRequest::new(record(10)))
            .await
            .unwrap_err();
        assert!(matches!(err, SummaryError::UnsupportedProvider(_)));
    }

    // --- validate_input ---

    #[test]
    fn test_validate_input_bounds() {
        let policy = small_policy();

        assert!(matches!(
            validate_input("   \n", &policy),
            Err(SummaryError::EmptyInput)
        ));
        assert!(matches!(
            validate_input("あい", &policy),
            Err(SummaryError::InputTooShort { tokens: 2, min: 5 })
        ));
        assert!(matches!(
            validate_input(&record(201), &policy),
            Err(SummaryError::InputTooLong { tokens: 201, max: 200 })
        ));
        assert_eq!(validate_input(&record(5), &policy).unwrap(), 5);
        assert_eq!(validate_input(&record(200), &policy).unwrap(), 200);
    }
}
