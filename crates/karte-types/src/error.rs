use thiserror::Error;

/// Domain errors surfaced to callers of the summarization layer.
#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("{vendor} API credentials are not configured")]
    CredentialMissing { vendor: String },

    #[error("{vendor} setting '{setting}' is not configured")]
    ConfigurationMissing { vendor: String, setting: String },

    #[error("{vendor} API initialization failed: {message}")]
    InitializationFailed { vendor: String, message: String },

    #[error("an error occurred in {vendor}: {message}")]
    GenerationFailed { vendor: String, message: String },

    #[error("unsupported API provider: '{0}'")]
    UnsupportedProvider(String),

    #[error(
        "input is too long ({tokens} tokens, threshold {threshold}) and no fallback provider credentials are configured"
    )]
    TooLongNoFallback { tokens: u32, threshold: u32 },

    #[error("no AI API credentials are configured")]
    NoCredentials,

    #[error("medical record text is empty")]
    EmptyInput,

    #[error("input text is too short ({tokens} tokens, minimum {min})")]
    InputTooShort { tokens: u32, min: u32 },

    #[error("input text is too long ({tokens} tokens, maximum {max})")]
    InputTooLong { tokens: u32, max: u32 },
}

/// Errors from prompt override lookups.
#[derive(Debug, Error)]
pub enum PromptStoreError {
    #[error("failed to read prompt store: {0}")]
    Io(String),

    #[error("failed to parse prompt store: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_missing_names_vendor() {
        let err = SummaryError::CredentialMissing {
            vendor: "OpenAI".to_string(),
        };
        assert_eq!(err.to_string(), "OpenAI API credentials are not configured");
    }

    #[test]
    fn test_generation_failed_display() {
        let err = SummaryError::GenerationFailed {
            vendor: "claude".to_string(),
            message: "HTTP 500".to_string(),
        };
        assert!(err.to_string().contains("claude"));
        assert!(err.to_string().contains("HTTP 500"));
    }

    #[test]
    fn test_too_long_display() {
        let err = SummaryError::TooLongNoFallback {
            tokens: 50_000,
            threshold: 40_000,
        };
        assert!(err.to_string().contains("50000"));
        assert!(err.to_string().contains("40000"));
    }

    #[test]
    fn test_prompt_store_error_display() {
        let err = PromptStoreError::Parse("expected table".to_string());
        assert_eq!(err.to_string(), "failed to parse prompt store: expected table");
    }
}
