//! File-backed prompt overrides.
//!
//! The overrides file is TOML with one `[[prompt]]` table per key:
//!
//! ```toml
//! [[prompt]]
//! department = "内科"
//! document_type = "主治医意見書"
//! doctor = "default"
//! content = "内科向けの要約プロンプト"
//! selected_model = "gemini-2.5-pro"   # optional
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use karte_core::prompt::PromptStore;
use karte_types::error::PromptStoreError;
use karte_types::summary::PromptOverride;

#[derive(Debug, Deserialize)]
struct PromptFile {
    #[serde(default)]
    prompt: Vec<PromptEntry>,
}

#[derive(Debug, Deserialize)]
struct PromptEntry {
    department: String,
    document_type: String,
    doctor: String,
    content: String,
    #[serde(default)]
    selected_model: Option<String>,
}

type PromptKey = (String, String, String);

/// Prompt overrides loaded once from a TOML file and matched by exact key.
#[derive(Debug, Default)]
pub struct TomlPromptStore {
    prompts: HashMap<PromptKey, PromptOverride>,
}

impl TomlPromptStore {
    /// Read and parse an overrides file.
    pub async fn load(path: &Path) -> Result<Self, PromptStoreError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| PromptStoreError::Io(format!("{}: {e}", path.display())))?;
        let store = Self::from_toml_str(&content)?;
        tracing::debug!(
            path = %path.display(),
            count = store.len(),
            "Loaded prompt overrides"
        );
        Ok(store)
    }

    /// Parse overrides from TOML text. Later entries replace earlier ones
    /// with the same key.
    pub fn from_toml_str(content: &str) -> Result<Self, PromptStoreError> {
        let file: PromptFile =
            toml::from_str(content).map_err(|e| PromptStoreError::Parse(e.to_string()))?;

        let prompts = file
            .prompt
            .into_iter()
            .map(|entry| {
                let key = (entry.department, entry.document_type, entry.doctor);
                let prompt = PromptOverride {
                    content: entry.content,
                    selected_model: entry.selected_model,
                };
                (key, prompt)
            })
            .collect();

        Ok(Self { prompts })
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }
}

impl PromptStore for TomlPromptStore {
    fn find(
        &self,
        department: &str,
        document_type: &str,
        doctor: &str,
    ) -> Result<Option<PromptOverride>, PromptStoreError> {
        let key = (
            department.to_string(),
            document_type.to_string(),
            doctor.to_string(),
        );
        Ok(self.prompts.get(&key).cloned())
    }
}
