//! Pieces shared by the HTTP backends: client construction, status mapping
//! and GenAI span helpers.

use std::time::Duration;

use tracing::Span;

use karte_observe::genai_attrs;
use karte_types::error::SummaryError;
use karte_types::llm::{GenerationResult, LlmError};

/// Request timeout for long generations.
pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Build the HTTP client a backend holds once initialized.
pub(crate) fn build_http_client(vendor: &str) -> Result<reqwest::Client, SummaryError> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| SummaryError::InitializationFailed {
            vendor: vendor.to_string(),
            message: e.to_string(),
        })
}

/// Map a non-success HTTP status and its body onto [`LlmError`].
pub(crate) fn map_status(status: reqwest::StatusCode, body: String) -> LlmError {
    match status.as_u16() {
        401 | 403 => LlmError::AuthenticationFailed,
        429 => LlmError::RateLimited {
            retry_after_ms: None,
        },
        503 | 529 => LlmError::Overloaded(body),
        400 => LlmError::InvalidRequest(body),
        _ => LlmError::Provider {
            message: format!("HTTP {status}: {body}"),
        },
    }
}

/// Send a prepared request and decode a JSON success body.
pub(crate) async fn send_json<T: serde::de::DeserializeOwned>(
    request: reqwest::RequestBuilder,
) -> Result<T, LlmError> {
    let response = request.send().await.map_err(|e| LlmError::Provider {
        message: format!("HTTP request failed: {e}"),
    })?;

    let status = response.status();
    if !status.is_success() {
        let error_body = response.text().await.unwrap_or_default();
        return Err(map_status(status, error_body));
    }

    response
        .json()
        .await
        .map_err(|e| LlmError::Deserialization(format!("failed to parse response: {e}")))
}

/// Span wrapping one vendor call, named after the GenAI conventions.
pub(crate) fn chat_span(provider: &str, model: &str, max_tokens: Option<u32>) -> Span {
    tracing::info_span!(
        "gen_ai.chat",
        gen_ai.operation.name = genai_attrs::OP_CHAT,
        gen_ai.provider.name = provider,
        gen_ai.request.model = %model,
        gen_ai.request.max_tokens = ?max_tokens,
        gen_ai.usage.input_tokens = tracing::field::Empty,
        gen_ai.usage.output_tokens = tracing::field::Empty,
    )
}

/// Record usage on a span created by [`chat_span`].
pub(crate) fn record_usage(span: &Span, result: &GenerationResult) {
    span.record(genai_attrs::GEN_AI_USAGE_INPUT_TOKENS, result.input_tokens);
    span.record(genai_attrs::GEN_AI_USAGE_OUTPUT_TOKENS, result.output_tokens);
}

/// Whether a credential is missing or whitespace only.
pub(crate) fn is_blank(secret: &secrecy::SecretString) -> bool {
    use secrecy::ExposeSecret;
    secret.expose_secret().trim().is_empty()
}
