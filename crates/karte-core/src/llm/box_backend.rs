//! BoxLlmBackend -- object-safe dynamic dispatch wrapper for LlmBackend.
//!
//! 1. Define an object-safe `LlmBackendDyn` trait with boxed futures
//! 2. Blanket-impl `LlmBackendDyn` for all `T: LlmBackend`
//! 3. `BoxLlmBackend` wraps `Box<dyn LlmBackendDyn>` and delegates

use std::future::Future;
use std::pin::Pin;

use karte_types::error::SummaryError;
use karte_types::llm::{GenerationResult, LlmError, ProviderKind};

use super::backend::LlmBackend;

/// Object-safe version of [`LlmBackend`] with boxed futures.
pub trait LlmBackendDyn: Send + Sync {
    fn kind(&self) -> ProviderKind;

    fn name(&self) -> &str;

    fn default_model(&self) -> &str;

    fn is_initialized(&self) -> bool;

    fn initialize(&mut self) -> Result<(), SummaryError>;

    fn generate_content_boxed<'a>(
        &'a self,
        prompt: &'a str,
        model: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<GenerationResult, LlmError>> + Send + 'a>>;
}

impl<T: LlmBackend> LlmBackendDyn for T {
    fn kind(&self) -> ProviderKind {
        LlmBackend::kind(self)
    }

    fn name(&self) -> &str {
        LlmBackend::name(self)
    }

    fn default_model(&self) -> &str {
        LlmBackend::default_model(self)
    }

    fn is_initialized(&self) -> bool {
        LlmBackend::is_initialized(self)
    }

    fn initialize(&mut self) -> Result<(), SummaryError> {
        LlmBackend::initialize(self)
    }

    fn generate_content_boxed<'a>(
        &'a self,
        prompt: &'a str,
        model: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<GenerationResult, LlmError>> + Send + 'a>> {
        Box::pin(self.generate_content(prompt, model))
    }
}

/// Type-erased backend for runtime provider selection.
///
/// `LlmBackend` uses RPITIT and cannot be a trait object directly; this box
/// delegates to the object-safe [`LlmBackendDyn`] and implements
/// `LlmBackend` itself, so a `SummaryClient<BoxLlmBackend>` can hold any
/// adapter chosen at runtime.
pub struct BoxLlmBackend {
    inner: Box<dyn LlmBackendDyn>,
}

impl BoxLlmBackend {
    /// Wrap a concrete backend in a type-erased box.
    pub fn new<T: LlmBackend + 'static>(backend: T) -> Self {
        Self {
            inner: Box::new(backend),
        }
    }
}

impl LlmBackend for BoxLlmBackend {
    fn kind(&self) -> ProviderKind {
        self.inner.kind()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn default_model(&self) -> &str {
        self.inner.default_model()
    }

    fn is_initialized(&self) -> bool {
        self.inner.is_initialized()
    }

    fn initialize(&mut self) -> Result<(), SummaryError> {
        self.inner.initialize()
    }

    fn generate_content(
        &self,
        prompt: &str,
        model: &str,
    ) -> impl Future<Output = Result<GenerationResult, LlmError>> + Send {
        async move { self.inner.generate_content_boxed(prompt, model).await }
    }
}
