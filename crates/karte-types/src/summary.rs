//! Summary request and prompt override types.

use serde::{Deserialize, Serialize};

/// Department used when the caller does not name one.
pub const DEFAULT_DEPARTMENT: &str = "default";

/// Doctor used when the caller does not name one.
pub const DEFAULT_DOCTOR: &str = "default";

/// Document type used when the caller does not name one.
pub const DEFAULT_DOCUMENT_TYPE: &str = "主治医意見書";

/// Arguments of one summary generation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRequest {
    pub medical_text: String,
    #[serde(default)]
    pub additional_info: String,
    #[serde(default)]
    pub referral_purpose: String,
    #[serde(default)]
    pub current_prescription: String,
    #[serde(default = "default_department")]
    pub department: String,
    #[serde(default = "default_document_type")]
    pub document_type: String,
    #[serde(default = "default_doctor")]
    pub doctor: String,
    /// Explicit model name; when set, model resolution is skipped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

fn default_department() -> String {
    DEFAULT_DEPARTMENT.to_string()
}

fn default_document_type() -> String {
    DEFAULT_DOCUMENT_TYPE.to_string()
}

fn default_doctor() -> String {
    DEFAULT_DOCTOR.to_string()
}

impl SummaryRequest {
    pub fn new(medical_text: impl Into<String>) -> Self {
        Self {
            medical_text: medical_text.into(),
            additional_info: String::new(),
            referral_purpose: String::new(),
            current_prescription: String::new(),
            department: default_department(),
            document_type: default_document_type(),
            doctor: default_doctor(),
            model: None,
        }
    }

    pub fn with_additional_info(mut self, info: impl Into<String>) -> Self {
        self.additional_info = info.into();
        self
    }

    pub fn with_referral_purpose(mut self, purpose: impl Into<String>) -> Self {
        self.referral_purpose = purpose.into();
        self
    }

    pub fn with_current_prescription(mut self, prescription: impl Into<String>) -> Self {
        self.current_prescription = prescription.into();
        self
    }

    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = department.into();
        self
    }

    pub fn with_document_type(mut self, document_type: impl Into<String>) -> Self {
        self.document_type = document_type.into();
        self
    }

    pub fn with_doctor(mut self, doctor: impl Into<String>) -> Self {
        self.doctor = doctor.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// A per-(department, document type, doctor) prompt replacing the default template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptOverride {
    pub content: String,
    /// Model pinned by this prompt; wins over the backend's default model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_model: Option<String>,
}
