//! LLM provider identity, generation results, and vendor-layer errors.
//!
//! These types are provider-agnostic: every backend adapter normalizes its
//! vendor reply into a [`GenerationResult`] and reports vendor failures as
//! [`LlmError`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SummaryError;

/// Placeholder text returned when a vendor reply carries no usable content.
pub const EMPTY_RESPONSE_TEXT: &str = "レスポンスが空です";

/// The closed set of supported LLM vendors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Claude,
    #[serde(rename = "openai")]
    OpenAi,
    Gemini,
}

impl ProviderKind {
    /// All provider kinds, in display order.
    pub const ALL: [ProviderKind; 3] = [ProviderKind::Claude, ProviderKind::OpenAi, ProviderKind::Gemini];

    /// Lowercase identifier used in config files and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Claude => "claude",
            ProviderKind::OpenAi => "openai",
            ProviderKind::Gemini => "gemini",
        }
    }

    /// Vendor display name used in error messages.
    pub fn vendor_name(&self) -> &'static str {
        match self {
            ProviderKind::Claude => "Claude",
            ProviderKind::OpenAi => "OpenAI",
            ProviderKind::Gemini => "Gemini",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = SummaryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "claude" => Ok(ProviderKind::Claude),
            "openai" => Ok(ProviderKind::OpenAi),
            "gemini" => Ok(ProviderKind::Gemini),
            _ => Err(SummaryError::UnsupportedProvider(s.to_string())),
        }
    }
}

/// A provider choice as supplied by a caller: symbolic or by name.
///
/// Names are resolved case-insensitively through [`ProviderKind::from_str`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderSelector {
    Kind(ProviderKind),
    Name(String),
}

impl ProviderSelector {
    /// Resolve to a concrete kind, rejecting unknown names.
    pub fn resolve(&self) -> Result<ProviderKind, SummaryError> {
        match self {
            ProviderSelector::Kind(kind) => Ok(*kind),
            ProviderSelector::Name(name) => name.parse(),
        }
    }
}

impl From<ProviderKind> for ProviderSelector {
    fn from(kind: ProviderKind) -> Self {
        ProviderSelector::Kind(kind)
    }
}

impl From<&str> for ProviderSelector {
    fn from(name: &str) -> Self {
        ProviderSelector::Name(name.to_string())
    }
}

impl From<String> for ProviderSelector {
    fn from(name: String) -> Self {
        ProviderSelector::Name(name)
    }
}

/// Normalized output of one generation call.
///
/// `text` is never empty-by-absence: adapters substitute
/// [`EMPTY_RESPONSE_TEXT`] when the vendor returned nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub text: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl GenerationResult {
    pub fn new(text: impl Into<String>, input_tokens: u32, output_tokens: u32) -> Self {
        Self {
            text: text.into(),
            input_tokens,
            output_tokens,
        }
    }

    /// A sentinel result for a reply without content.
    pub fn empty(input_tokens: u32, output_tokens: u32) -> Self {
        Self::new(EMPTY_RESPONSE_TEXT, input_tokens, output_tokens)
    }

    /// Whether this result carries the empty-response sentinel.
    pub fn is_empty_response(&self) -> bool {
        self.text == EMPTY_RESPONSE_TEXT
    }
}

/// Errors from the vendor layer of a backend adapter.
///
/// Everything except [`LlmError::Domain`] is wrapped into
/// [`SummaryError::GenerationFailed`] by the summary client.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("provider error: {message}")]
    Provider { message: String },

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("rate limited (retry after {retry_after_ms:?}ms)")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("provider overloaded: {0}")]
    Overloaded(String),

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("client is not initialized")]
    NotInitialized,

    /// A domain error raised deliberately inside an adapter; never re-wrapped.
    #[error(transparent)]
    Domain(#[from] SummaryError),
}
