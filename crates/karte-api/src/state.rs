//! Application state shared by the CLI commands.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use karte_core::dispatch::Dispatcher;
use karte_core::prompt::{NoPromptOverrides, PromptStore};
use karte_core::sections::SectionParser;
use karte_infra::config::{apply_env_overrides, default_config_path, load_config};
use karte_infra::llm::ConfiguredProviderFactory;
use karte_infra::prompt_store::TomlPromptStore;
use karte_types::config::AppConfig;

/// Loaded configuration and the services built from it.
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub config_path: Option<PathBuf>,
    pub dispatcher: Dispatcher<ConfiguredProviderFactory>,
    pub sections: SectionParser,
}

impl AppState {
    /// Load configuration (explicit path, else the default location) and
    /// build the dispatcher.
    pub async fn init(config_path: Option<PathBuf>) -> Result<Self> {
        let config_path = config_path.or_else(default_config_path);
        let config = match &config_path {
            Some(path) => load_config(path).await,
            None => {
                let mut config = AppConfig::default();
                apply_env_overrides(&mut config, |key| std::env::var(key).ok());
                config
            }
        };

        let store: Arc<dyn PromptStore> = match &config.prompts.overrides_path {
            Some(path) => Arc::new(TomlPromptStore::load(path).await.with_context(|| {
                format!("failed to load prompt overrides from {}", path.display())
            })?),
            None => Arc::new(NoPromptOverrides),
        };

        let config = Arc::new(config);
        let factory = ConfiguredProviderFactory::new(config.clone(), store);
        let dispatcher = Dispatcher::new(factory, config.dispatch.clone());
        let sections = SectionParser::from_config(&config.sections);

        tracing::debug!(
            config_path = ?config_path,
            default_provider = %config.dispatch.default_provider,
            "Application state initialized"
        );

        Ok(Self {
            config,
            config_path,
            dispatcher,
            sections,
        })
    }
}
