//! Application configuration types for karte.
//!
//! `AppConfig` represents `karte.toml`. Every field has a default, so an empty
//! file (or no file at all) yields a usable configuration; credentials are
//! normally supplied through the environment rather than the file.

use std::path::PathBuf;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize};

use crate::llm::ProviderKind;
use crate::section::{DEFAULT_SECTION_ALIASES, DEFAULT_SECTION_NAMES};

/// Default prompt used when no override matches a request.
pub const DEFAULT_SUMMARY_PROMPT: &str = "以下のカルテ情報をもとに、治療経過、特記事項、備考の各項目に分けて簡潔に要約してください。各項目は見出しを付けて記載してください。";

/// Top-level configuration.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub prompts: PromptConfig,
    #[serde(default)]
    pub sections: SectionConfig,
}

impl AppConfig {
    /// Whether a non-blank credential is configured for `kind`.
    pub fn has_credentials(&self, kind: ProviderKind) -> bool {
        let secret = match kind {
            ProviderKind::Claude => self.providers.claude.api_key.as_ref(),
            ProviderKind::OpenAi => self.providers.openai.api_key.as_ref(),
            ProviderKind::Gemini => self.providers.gemini.credentials.as_ref(),
        };
        secret.is_some_and(|s| !s.expose_secret().trim().is_empty())
    }

    /// Default model configured for `kind`.
    pub fn model_for(&self, kind: ProviderKind) -> &str {
        match kind {
            ProviderKind::Claude => &self.providers.claude.model,
            ProviderKind::OpenAi => &self.providers.openai.model,
            ProviderKind::Gemini => &self.providers.gemini.model,
        }
    }
}

/// Per-vendor settings.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub claude: ClaudeSettings,
    #[serde(default)]
    pub openai: OpenAiSettings,
    #[serde(default)]
    pub gemini: GeminiSettings,
}

/// Anthropic Claude settings.
#[derive(Debug, Serialize, Deserialize)]
pub struct ClaudeSettings {
    #[serde(default, deserialize_with = "deserialize_secret", skip_serializing)]
    pub api_key: Option<SecretString>,
    #[serde(default = "default_claude_model")]
    pub model: String,
    #[serde(default = "default_claude_max_tokens")]
    pub max_tokens: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Default for ClaudeSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_claude_model(),
            max_tokens: default_claude_max_tokens(),
            base_url: None,
        }
    }
}

fn default_claude_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

fn default_claude_max_tokens() -> u32 {
    6_000
}

/// OpenAI settings.
#[derive(Debug, Serialize, Deserialize)]
pub struct OpenAiSettings {
    #[serde(default, deserialize_with = "deserialize_secret", skip_serializing)]
    pub api_key: Option<SecretString>,
    #[serde(default = "default_openai_model")]
    pub model: String,
    #[serde(default = "default_openai_max_completion_tokens")]
    pub max_completion_tokens: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Default for OpenAiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_openai_model(),
            max_completion_tokens: default_openai_max_completion_tokens(),
            base_url: None,
        }
    }
}

fn default_openai_model() -> String {
    "gpt-4o".to_string()
}

fn default_openai_max_completion_tokens() -> u32 {
    10_000
}

/// Google Gemini settings.
///
/// With `project_id` set, requests go to Vertex AI and `credentials` is used
/// as a bearer token; otherwise `credentials` is an AI Studio API key.
#[derive(Debug, Serialize, Deserialize)]
pub struct GeminiSettings {
    #[serde(default, deserialize_with = "deserialize_secret", skip_serializing)]
    pub credentials: Option<SecretString>,
    #[serde(default = "default_gemini_model")]
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flash_model: Option<String>,
    /// Extended reasoning budget; `None` or `Some(0)` disables it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking_budget: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            credentials: None,
            model: default_gemini_model(),
            flash_model: None,
            thinking_budget: None,
            project_id: None,
            location: None,
            base_url: None,
        }
    }
}

fn default_gemini_model() -> String {
    "gemini-2.5-pro".to_string()
}

/// Provider selection and input-size policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Provider used when the caller does not pick one.
    #[serde(default = "default_provider")]
    pub default_provider: ProviderKind,
    /// High-capacity provider substituted for long inputs.
    #[serde(default = "default_provider")]
    pub fallback_provider: ProviderKind,
    /// Model used on the fallback provider; its default model when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_model: Option<String>,
    /// Estimated input tokens above which the fallback provider is used.
    #[serde(default = "default_token_threshold")]
    pub token_threshold: u32,
    #[serde(default = "default_max_input_tokens")]
    pub max_input_tokens: u32,
    #[serde(default = "default_min_input_tokens")]
    pub min_input_tokens: u32,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            default_provider: default_provider(),
            fallback_provider: default_provider(),
            fallback_model: None,
            token_threshold: default_token_threshold(),
            max_input_tokens: default_max_input_tokens(),
            min_input_tokens: default_min_input_tokens(),
        }
    }
}

fn default_provider() -> ProviderKind {
    ProviderKind::Gemini
}

fn default_token_threshold() -> u32 {
    40_000
}

fn default_max_input_tokens() -> u32 {
    200_000
}

fn default_min_input_tokens() -> u32 {
    100
}

/// Prompt template configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    /// Template used when no override matches.
    #[serde(default = "default_summary_prompt")]
    pub summary: String,
    /// TOML file holding `[[prompt]]` overrides.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overrides_path: Option<PathBuf>,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            summary: default_summary_prompt(),
            overrides_path: None,
        }
    }
}

fn default_summary_prompt() -> String {
    DEFAULT_SUMMARY_PROMPT.to_string()
}

/// Output section names and heading aliases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionConfig {
    #[serde(default = "default_section_names")]
    pub names: Vec<String>,
    #[serde(default = "default_section_aliases")]
    pub aliases: Vec<SectionAlias>,
}

impl Default for SectionConfig {
    fn default() -> Self {
        Self {
            names: default_section_names(),
            aliases: default_section_aliases(),
        }
    }
}

/// A heading alias folded into a canonical section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionAlias {
    pub alias: String,
    pub section: String,
}

fn default_section_names() -> Vec<String> {
    DEFAULT_SECTION_NAMES.iter().map(|s| s.to_string()).collect()
}

fn default_section_aliases() -> Vec<SectionAlias> {
    DEFAULT_SECTION_ALIASES
        .iter()
        .map(|(alias, section)| SectionAlias {
            alias: alias.to_string(),
            section: section.to_string(),
        })
        .collect()
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.map(SecretString::from))
}
