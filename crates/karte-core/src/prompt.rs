//! Prompt construction for summary generation.
//!
//! The final prompt is the template (a per-key override when one exists,
//! otherwise the configured default) followed by the medical record and the
//! additional-info block:
//!
//! ```text
//! {template}
//! 【カルテ情報】
//! {medical_text}
//! 【追加情報】{additional_info}
//! ```
//!
//! The additional-info header is always present, even when the info is empty.

use std::sync::Arc;

use karte_types::error::PromptStoreError;
use karte_types::summary::{PromptOverride, SummaryRequest};

/// Header preceding the raw medical record text.
pub const RECORD_HEADER: &str = "【カルテ情報】";

/// Header preceding the additional-info text.
pub const ADDITIONAL_INFO_HEADER: &str = "【追加情報】";

/// Template placeholder replaced with the request's referral purpose.
pub const REFERRAL_PURPOSE_PLACEHOLDER: &str = "{referral_purpose}";

/// Template placeholder replaced with the request's current prescription.
pub const CURRENT_PRESCRIPTION_PLACEHOLDER: &str = "{current_prescription}";

/// Lookup of prompt overrides keyed by (department, document type, doctor).
///
/// Implementations live in karte-infra (e.g., `TomlPromptStore`).
pub trait PromptStore: Send + Sync {
    /// Find the override for an exact key, if any.
    fn find(
        &self,
        department: &str,
        document_type: &str,
        doctor: &str,
    ) -> Result<Option<PromptOverride>, PromptStoreError>;
}

/// A store with no overrides; every lookup falls through to the default.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPromptOverrides;

impl PromptStore for NoPromptOverrides {
    fn find(
        &self,
        _department: &str,
        _document_type: &str,
        _doctor: &str,
    ) -> Result<Option<PromptOverride>, PromptStoreError> {
        Ok(None)
    }
}

/// Builds final prompts and resolves per-key model overrides.
#[derive(Clone)]
pub struct PromptBuilder {
    store: Arc<dyn PromptStore>,
    default_template: String,
}

impl PromptBuilder {
    pub fn new(store: Arc<dyn PromptStore>, default_template: impl Into<String>) -> Self {
        Self {
            store,
            default_template: default_template.into(),
        }
    }

    /// A builder with no override store.
    pub fn with_default_template(default_template: impl Into<String>) -> Self {
        Self::new(Arc::new(NoPromptOverrides), default_template)
    }

    /// Build the final prompt for a request.
    pub fn build(&self, request: &SummaryRequest) -> Result<String, PromptStoreError> {
        let found = self
            .store
            .find(&request.department, &request.document_type, &request.doctor)?;

        let template = match &found {
            Some(prompt) => prompt.content.as_str(),
            None => self.default_template.as_str(),
        };

        Ok(render(template, request))
    }

    /// Model pinned by the matching override, or `default_model`.
    pub fn resolve_model(
        &self,
        department: &str,
        document_type: &str,
        doctor: &str,
        default_model: &str,
    ) -> Result<String, PromptStoreError> {
        let pinned = self
            .store
            .find(department, document_type, doctor)?
            .and_then(|prompt| prompt.selected_model)
            .filter(|model| !model.trim().is_empty());

        Ok(pinned.unwrap_or_else(|| default_model.to_string()))
    }
}

impl std::fmt::Debug for PromptBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptBuilder")
            .field("default_template", &self.default_template)
            .field("store", &"<store>")
            .finish()
    }
}

fn render(template: &str, request: &SummaryRequest) -> String {
    let template = template
        .replace(REFERRAL_PURPOSE_PLACEHOLDER, &request.referral_purpose)
        .replace(CURRENT_PRESCRIPTION_PLACEHOLDER, &request.current_prescription);

    format!(
        "{template}\n{RECORD_HEADER}\n{}\n{ADDITIONAL_INFO_HEADER}{}",
        request.medical_text, request.additional_info
    )
}
