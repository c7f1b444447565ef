//! SummaryClient -- the generation entry point shared by every backend.
//!
//! Pairs an [`LlmBackend`] with a [`PromptBuilder`] and runs the generate
//! lifecycle: initialize on first use, build the prompt, resolve the model
//! unless the caller pinned one, then delegate to the backend.

use karte_types::error::{PromptStoreError, SummaryError};
use karte_types::llm::{GenerationResult, LlmError, ProviderKind};
use karte_types::summary::SummaryRequest;

use super::backend::LlmBackend;
use crate::prompt::PromptBuilder;

/// A backend plus the prompt rules used to drive it.
pub struct SummaryClient<B> {
    backend: B,
    prompts: PromptBuilder,
}

impl<B: LlmBackend> SummaryClient<B> {
    pub fn new(backend: B, prompts: PromptBuilder) -> Self {
        Self { backend, prompts }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn kind(&self) -> ProviderKind {
        self.backend.kind()
    }

    pub fn name(&self) -> &str {
        self.backend.name()
    }

    pub fn default_model(&self) -> &str {
        self.backend.default_model()
    }

    /// Initialize the underlying backend.
    pub fn initialize(&mut self) -> Result<(), SummaryError> {
        self.backend.initialize()
    }

    /// Build the final prompt for `request`.
    pub fn create_prompt(&self, request: &SummaryRequest) -> Result<String, PromptStoreError> {
        self.prompts.build(request)
    }

    /// Model for a key: the override's pinned model, else the backend default.
    pub fn resolve_model(
        &self,
        department: &str,
        document_type: &str,
        doctor: &str,
    ) -> Result<String, PromptStoreError> {
        self.prompts
            .resolve_model(department, document_type, doctor, self.backend.default_model())
    }

    /// Generate a summary for `request`.
    ///
    /// Domain errors (from `initialize`, or raised deliberately inside the
    /// backend) propagate unchanged. Every other failure becomes
    /// [`SummaryError::GenerationFailed`] naming this backend.
    pub async fn generate(
        &mut self,
        request: &SummaryRequest,
    ) -> Result<GenerationResult, SummaryError> {
        if !self.backend.is_initialized() {
            self.backend.initialize()?;
        }

        let prompt = self
            .create_prompt(request)
            .map_err(|e| self.generation_failed(e.to_string()))?;

        let model = match request.model.as_deref() {
            Some(model) => model.to_string(),
            None => self
                .resolve_model(&request.department, &request.document_type, &request.doctor)
                .map_err(|e| self.generation_failed(e.to_string()))?,
        };

        tracing::debug!(
            backend = self.backend.name(),
            %model,
            prompt_chars = prompt.chars().count(),
            "Generating summary"
        );

        match self.backend.generate_content(&prompt, &model).await {
            Ok(result) => Ok(result),
            Err(LlmError::Domain(err)) => Err(err),
            Err(err) => Err(self.generation_failed(err.to_string())),
        }
    }

    fn generation_failed(&self, message: String) -> SummaryError {
        SummaryError::GenerationFailed {
            vendor: self.backend.name().to_string(),
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::Future;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use karte_types::summary::PromptOverride;

    use crate::llm::box_backend::BoxLlmBackend;
    use crate::prompt::PromptStore;

    // --- Mocks ---

    #[derive(Clone)]
    enum MockReply {
        Text(&'static str, u32, u32),
        Vendor(&'static str),
        Domain,
    }

    struct MockBackend {
        api_key: String,
        initialized: bool,
        reply: MockReply,
        seen: Arc<Mutex<Vec<(String, String)>>>,
    }

    impl MockBackend {
        fn new(api_key: &str, reply: MockReply) -> Self {
            Self {
                api_key: api_key.to_string(),
                initialized: false,
                reply,
                seen: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    impl LlmBackend for MockBackend {
        fn kind(&self) -> ProviderKind {
            ProviderKind::Claude
        }

        fn name(&self) -> &str {
            "MockBackend"
        }

        fn default_model(&self) -> &str {
            "test_model"
        }

        fn is_initialized(&self) -> bool {
            self.initialized
        }

        fn initialize(&mut self) -> Result<(), SummaryError> {
            if self.api_key.is_empty() {
                return Err(SummaryError::CredentialMissing {
                    vendor: "Mock".to_string(),
                });
            }
            self.initialized = true;
            Ok(())
        }

        fn generate_content(
            &self,
            prompt: &str,
            model: &str,
        ) -> impl Future<Output = Result<GenerationResult, LlmError>> + Send {
            let initialized = self.initialized;
            let reply = self.reply.clone();
            self.seen
                .lock()
                .unwrap()
                .push((prompt.to_string(), model.to_string()));
            async move {
                if !initialized {
                    return Err(LlmError::NotInitialized);
                }
                match reply {
                    MockReply::Text(text, input, output) => {
                        Ok(GenerationResult::new(text, input, output))
                    }
                    MockReply::Vendor(message) => Err(LlmError::Provider {
                        message: message.to_string(),
                    }),
                    MockReply::Domain => Err(LlmError::Domain(SummaryError::InitializationFailed {
                        vendor: "Mock".to_string(),
                        message: "token expired".to_string(),
                    })),
                }
            }
        }
    }

    /// Counts lookups so tests can tell prompt building from model resolution.
    struct CountingStore {
        prompt: Option<PromptOverride>,
        lookups: AtomicUsize,
    }

    impl CountingStore {
        fn new(prompt: Option<PromptOverride>) -> Arc<Self> {
            Arc::new(Self {
                prompt,
                lookups: AtomicUsize::new(0),
            })
        }

        fn lookups(&self) -> usize {
            self.lookups.load(Ordering::SeqCst)
        }
    }

    impl PromptStore for CountingStore {
        fn find(
            &self,
            _department: &str,
            _document_type: &str,
            _doctor: &str,
        ) -> Result<Option<PromptOverride>, PromptStoreError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            Ok(self.prompt.clone())
        }
    }

    fn client_with(
        backend: MockBackend,
        store: Arc<CountingStore>,
    ) -> SummaryClient<MockBackend> {
        SummaryClient::new(backend, PromptBuilder::new(store, "テストプロンプト"))
    }

    // --- Tests ---

    #[tokio::test]
    async fn test_generate_initializes_and_returns_result() {
        let store = CountingStore::new(None);
        let mut client = client_with(
            MockBackend::new("test_key", MockReply::Text("生成結果", 100, 50)),
            store,
        );
        assert!(!client.backend().is_initialized());

        let result = client
            .generate(&SummaryRequest::new("患者情報のテストデータ"))
            .await
            .unwrap();

        assert_eq!(result, GenerationResult::new("生成結果", 100, 50));
        assert!(client.backend().is_initialized());
    }

    #[tokio::test]
    async fn test_generate_passes_built_prompt_and_default_model() {
        let store = CountingStore::new(None);
        let backend = MockBackend::new("test_key", MockReply::Text("ok", 1, 1));
        let seen = backend.seen.clone();
        let mut client = client_with(backend, store);

        client
            .generate(&SummaryRequest::new("本文").with_additional_info("追加"))
            .await
            .unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, "テストプロンプト\n【カルテ情報】\n本文\n【追加情報】追加");
        assert_eq!(seen[0].1, "test_model");
    }

    #[tokio::test]
    async fn test_explicit_model_skips_resolution() {
        let store = CountingStore::new(Some(PromptOverride {
            content: "カスタム".to_string(),
            selected_model: Some("override-model".to_string()),
        }));
        let backend = MockBackend::new("test_key", MockReply::Text("指定モデル結果", 120, 60));
        let seen = backend.seen.clone();
        let mut client = client_with(backend, store.clone());

        let result = client
            .generate(&SummaryRequest::new("本文").with_model("specified_model"))
            .await
            .unwrap();

        assert_eq!(result, GenerationResult::new("指定モデル結果", 120, 60));
        assert_eq!(seen.lock().unwrap()[0].1, "specified_model");
        // One lookup for the prompt, none for the model.
        assert_eq!(store.lookups(), 1);
    }

    #[tokio::test]
    async fn test_model_resolved_exactly_once_without_explicit_model() {
        let store = CountingStore::new(Some(PromptOverride {
            content: "カスタム".to_string(),
            selected_model: Some("override-model".to_string()),
        }));
        let backend = MockBackend::new("test_key", MockReply::Text("ok", 0, 0));
        let seen = backend.seen.clone();
        let mut client = client_with(backend, store.clone());

        client.generate(&SummaryRequest::new("本文")).await.unwrap();

        assert_eq!(seen.lock().unwrap()[0].1, "override-model");
        // One lookup for the prompt, one for the model.
        assert_eq!(store.lookups(), 2);
    }

    #[tokio::test]
    async fn test_missing_credential_propagates_unchanged() {
        let store = CountingStore::new(None);
        let backend = MockBackend::new("", MockReply::Text("unused", 0, 0));
        let seen = backend.seen.clone();
        let mut client = client_with(backend, store);

        let err = client
            .generate(&SummaryRequest::new("本文"))
            .await
            .unwrap_err();

        assert!(matches!(err, SummaryError::CredentialMissing { .. }));
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_domain_error_from_backend_not_rewrapped() {
        let store = CountingStore::new(None);
        let mut client = client_with(MockBackend::new("test_key", MockReply::Domain), store);

        let err = client
            .generate(&SummaryRequest::new("本文"))
            .await
            .unwrap_err();

        match err {
            SummaryError::InitializationFailed { message, .. } => {
                assert_eq!(message, "token expired")
            }
            other => panic!("expected InitializationFailed, got: {other}"),
        }
    }

    #[tokio::test]
    async fn test_vendor_error_wrapped_with_backend_name() {
        let store = CountingStore::new(None);
        let mut client = client_with(
            MockBackend::new("test_key", MockReply::Vendor("unexpected failure")),
            store,
        );

        let err = client
            .generate(&SummaryRequest::new("本文"))
            .await
            .unwrap_err();

        match err {
            SummaryError::GenerationFailed { vendor, message } => {
                assert_eq!(vendor, "MockBackend");
                assert!(message.contains("unexpected failure"));
            }
            other => panic!("expected GenerationFailed, got: {other}"),
        }
    }

    #[tokio::test]
    async fn test_boxed_backend_behaves_the_same() {
        let store = CountingStore::new(None);
        let backend = BoxLlmBackend::new(MockBackend::new("test_key", MockReply::Text("boxed", 3, 4)));
        let mut client = SummaryClient::new(backend, PromptBuilder::new(store, "p"));

        assert_eq!(client.kind(), ProviderKind::Claude);
        assert_eq!(client.name(), "MockBackend");
        assert_eq!(client.default_model(), "test_model");

        let result = client.generate(&SummaryRequest::new("本文")).await.unwrap();
        assert_eq!(result, GenerationResult::new("boxed", 3, 4));
    }
}
