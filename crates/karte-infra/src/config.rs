//! Configuration loader for karte.
//!
//! Reads `karte.toml` (by default from `{config_dir}/karte/karte.toml`) into
//! [`AppConfig`], falling back to defaults when the file is missing or
//! malformed, then overlays environment variables.

use std::path::{Path, PathBuf};

use secrecy::SecretString;

use karte_types::config::AppConfig;
use karte_types::llm::ProviderKind;

/// Config file name inside the karte config directory.
pub const CONFIG_FILE_NAME: &str = "karte.toml";

/// Default config path: `{config_dir}/karte/karte.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("karte").join(CONFIG_FILE_NAME))
}

/// Load configuration from `path`, then apply environment overrides.
pub async fn load_config(path: &Path) -> AppConfig {
    let mut config = load_config_file(path).await;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    config
}

/// Load configuration from a TOML file only.
///
/// - If the file does not exist, returns [`AppConfig::default()`].
/// - If the file exists but fails to read or parse, logs a warning and
///   returns the default.
pub async fn load_config_file(path: &Path) -> AppConfig {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config file found at {}, using defaults", path.display());
            return AppConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", path.display());
            return AppConfig::default();
        }
    };

    match toml::from_str::<AppConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!("Failed to parse {}: {err}, using defaults", path.display());
            AppConfig::default()
        }
    }
}

/// Overlay environment variables onto `config`.
///
/// `lookup` returns the value of a variable, if set. Blank values are
/// ignored; unparsable numbers and provider names log a warning and leave
/// the file value in place.
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    let providers = &mut config.providers;
    if let Some(key) = get("CLAUDE_API_KEY") {
        providers.claude.api_key = Some(SecretString::from(key));
    }
    if let Some(model) = get("CLAUDE_MODEL") {
        providers.claude.model = model;
    }
    if let Some(key) = get("OPENAI_API_KEY") {
        providers.openai.api_key = Some(SecretString::from(key));
    }
    if let Some(model) = get("OPENAI_MODEL") {
        providers.openai.model = model;
    }
    if let Some(credentials) = get("GEMINI_CREDENTIALS") {
        providers.gemini.credentials = Some(SecretString::from(credentials));
    }
    if let Some(model) = get("GEMINI_MODEL") {
        providers.gemini.model = model;
    }
    if let Some(model) = get("GEMINI_FLASH_MODEL") {
        providers.gemini.flash_model = Some(model);
    }
    if let Some(budget) = parse_number(get("GEMINI_THINKING_BUDGET"), "GEMINI_THINKING_BUDGET") {
        providers.gemini.thinking_budget = Some(budget);
    }
    if let Some(project_id) = get("GOOGLE_PROJECT_ID") {
        providers.gemini.project_id = Some(project_id);
    }
    if let Some(location) = get("GOOGLE_LOCATION") {
        providers.gemini.location = Some(location);
    }

    let dispatch = &mut config.dispatch;
    if let Some(name) = get("SELECTED_AI_MODEL") {
        match name.trim().parse::<ProviderKind>() {
            Ok(kind) => dispatch.default_provider = kind,
            Err(err) => tracing::warn!("Ignoring SELECTED_AI_MODEL: {err}"),
        }
    }
    if let Some(max) = parse_number(get("MAX_INPUT_TOKENS"), "MAX_INPUT_TOKENS") {
        dispatch.max_input_tokens = max;
    }
    if let Some(min) = parse_number(get("MIN_INPUT_TOKENS"), "MIN_INPUT_TOKENS") {
        dispatch.min_input_tokens = min;
    }
    if let Some(threshold) = parse_number(get("MAX_TOKEN_THRESHOLD"), "MAX_TOKEN_THRESHOLD") {
        dispatch.token_threshold = threshold;
    }
}

fn parse_number(value: Option<String>, key: &str) -> Option<u32> {
    let value = value?;
    match value.trim().parse::<u32>() {
        Ok(number) => Some(number),
        Err(err) => {
            tracing::warn!("Ignoring {key}={value}: {err}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[tokio::test]
    async fn load_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_config_file(&tmp.path().join(CONFIG_FILE_NAME)).await;
        assert_eq!(config.dispatch.token_threshold, 40_000);
        assert_eq!(config.dispatch.default_provider, ProviderKind::Gemini);
        assert!(!config.has_credentials(ProviderKind::Claude));
    }

    #[tokio::test]
    async fn load_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE_NAME);
        tokio::fs::write(
            &path,
            r#"
[providers.openai]
api_key = "sk-file"
model = "gpt-4.1"

[dispatch]
default_provider = "openai"
min_input_tokens = 10
"#,
        )
        .await
        .unwrap();

        let config = load_config_file(&path).await;
        assert!(config.has_credentials(ProviderKind::OpenAi));
        assert_eq!(config.providers.openai.model, "gpt-4.1");
        assert_eq!(config.dispatch.default_provider, ProviderKind::OpenAi);
        assert_eq!(config.dispatch.min_input_tokens, 10);
        assert_eq!(config.dispatch.max_input_tokens, 200_000);
    }

    #[tokio::test]
    async fn load_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE_NAME);
        tokio::fs::write(&path, "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = load_config_file(&path).await;
        assert_eq!(config.dispatch.token_threshold, 40_000);
        assert!(!config.has_credentials(ProviderKind::OpenAi));
    }

    #[test]
    fn env_overrides_credentials_and_models() {
        let mut config = AppConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[
                ("CLAUDE_API_KEY", "sk-ant-env"),
                ("CLAUDE_MODEL", "claude-3-7-sonnet"),
                ("OPENAI_API_KEY", "sk-env"),
                ("GEMINI_CREDENTIALS", "gemini-env"),
                ("GEMINI_MODEL", "gemini-2.5-pro-exp"),
                ("GEMINI_FLASH_MODEL", "gemini-2.5-flash"),
                ("GEMINI_THINKING_BUDGET", "2048"),
                ("GOOGLE_PROJECT_ID", "my-project"),
                ("GOOGLE_LOCATION", "asia-northeast1"),
            ]),
        );

        let providers = &config.providers;
        assert_eq!(
            providers.claude.api_key.as_ref().unwrap().expose_secret(),
            "sk-ant-env"
        );
        assert_eq!(providers.claude.model, "claude-3-7-sonnet");
        assert!(config.has_credentials(ProviderKind::OpenAi));
        assert!(config.has_credentials(ProviderKind::Gemini));
        assert_eq!(providers.gemini.model, "gemini-2.5-pro-exp");
        assert_eq!(providers.gemini.flash_model.as_deref(), Some("gemini-2.5-flash"));
        assert_eq!(providers.gemini.thinking_budget, Some(2048));
        assert_eq!(providers.gemini.project_id.as_deref(), Some("my-project"));
        assert_eq!(providers.gemini.location.as_deref(), Some("asia-northeast1"));
    }

    #[test]
    fn env_overrides_dispatch_policy() {
        let mut config = AppConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[
                ("SELECTED_AI_MODEL", "Claude"),
                ("MAX_INPUT_TOKENS", "150000"),
                ("MIN_INPUT_TOKENS", "50"),
                ("MAX_TOKEN_THRESHOLD", "30000"),
            ]),
        );

        assert_eq!(config.dispatch.default_provider, ProviderKind::Claude);
        assert_eq!(config.dispatch.max_input_tokens, 150_000);
        assert_eq!(config.dispatch.min_input_tokens, 50);
        assert_eq!(config.dispatch.token_threshold, 30_000);
    }

    #[test]
    fn env_overrides_take_precedence_over_file() {
        let mut config: AppConfig = toml::from_str(
            r#"
[providers.claude]
api_key = "sk-file"
model = "claude-file"
"#,
        )
        .unwrap();
        apply_env_overrides(&mut config, env(&[("CLAUDE_MODEL", "claude-env")]));

        assert_eq!(config.providers.claude.model, "claude-env");
        assert_eq!(
            config.providers.claude.api_key.as_ref().unwrap().expose_secret(),
            "sk-file"
        );
    }

    #[test]
    fn invalid_env_values_are_ignored() {
        let mut config = AppConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[
                ("SELECTED_AI_MODEL", "bedrock"),
                ("MAX_TOKEN_THRESHOLD", "lots"),
                ("GEMINI_THINKING_BUDGET", "-1"),
                ("OPENAI_API_KEY", "   "),
            ]),
        );

        assert_eq!(config.dispatch.default_provider, ProviderKind::Gemini);
        assert_eq!(config.dispatch.token_threshold, 40_000);
        assert!(config.providers.gemini.thinking_budget.is_none());
        assert!(!config.has_credentials(ProviderKind::OpenAi));
    }

    #[test]
    fn default_path_ends_with_file_name() {
        if let Some(path) = default_config_path() {
            assert!(path.ends_with("karte/karte.toml"));
        }
    }
}
