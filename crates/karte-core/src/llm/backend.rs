//! LlmBackend trait definition.
//!
//! This is the vendor-facing half of the provider contract: every adapter
//! (Claude, OpenAI, Gemini) implements it. Prompt construction, model
//! resolution and error normalization live in
//! [`SummaryClient`](super::client::SummaryClient), which wraps a backend.

use std::future::Future;

use karte_types::error::SummaryError;
use karte_types::llm::{GenerationResult, LlmError, ProviderKind};

/// Trait for vendor backends.
///
/// A backend is bound at construction to one credential and one default
/// model. Its connection handle is absent until [`initialize`](Self::initialize)
/// succeeds; `generate_content` on an uninitialized backend fails with
/// [`LlmError::NotInitialized`].
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition) for
/// `generate_content`. Implementations live in karte-infra.
pub trait LlmBackend: Send + Sync {
    /// Which vendor this backend talks to.
    fn kind(&self) -> ProviderKind;

    /// Adapter identity used in errors and logs (e.g., "ClaudeBackend").
    fn name(&self) -> &str;

    /// Model used when neither the caller nor a prompt override picks one.
    fn default_model(&self) -> &str;

    /// Whether the connection handle has been populated.
    fn is_initialized(&self) -> bool;

    /// Validate credentials and build the connection handle.
    ///
    /// A blank credential fails with [`SummaryError::CredentialMissing`]
    /// before any network activity.
    fn initialize(&mut self) -> Result<(), SummaryError>;

    /// Send one prompt to the vendor and normalize the reply.
    fn generate_content(
        &self,
        prompt: &str,
        model: &str,
    ) -> impl Future<Output = Result<GenerationResult, LlmError>> + Send;
}
