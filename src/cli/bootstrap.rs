//! Wiring of collaborators from configuration

use std::path::Path;
use std::sync::Arc;

use sprintwright_api::ApiState;
use sprintwright_core::{AppConfig, ConfigManager, ConversationStore, Orchestrator};
use sprintwright_tools::{taiga_catalog, TaigaExecutorFactory};

use crate::cli::{Error, Result};
use crate::llm::create_reasoner;

/// Load configuration from `path` or the default location
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let manager = ConfigManager::load(path).map_err(|e| Error::Config(format!("{:#}", e)))?;
    Ok(manager.into_config())
}

/// Orchestrator over the Taiga catalog and the configured reasoner
pub fn build_orchestrator(config: &AppConfig) -> Result<Orchestrator> {
    let reasoner = create_reasoner(&config.reasoner).map_err(|e| Error::Config(e.to_string()))?;
    tracing::info!(provider = reasoner.provider_name(), "Reasoner ready");
    Ok(Orchestrator::new(
        config.budgets.clone(),
        Arc::new(taiga_catalog()),
        Arc::new(reasoner),
    ))
}

/// Shared state for the API server
pub fn build_state(config: &AppConfig) -> Result<ApiState> {
    Ok(ApiState::new(
        Arc::new(build_orchestrator(config)?),
        Arc::new(TaigaExecutorFactory::new(config.taiga.clone())),
        Arc::new(ConversationStore::from_config(&config.conversations)),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprintwright_core::ReasonerProvider;

    fn stub_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.reasoner.provider = ReasonerProvider::Stub;
        config
    }

    #[test]
    fn test_build_state_with_stub() {
        let state = build_state(&stub_config()).unwrap();
        assert!(state.runs.is_empty());
        assert!(state.conversations.is_empty());
    }

    #[test]
    fn test_missing_api_key_is_config_error() {
        let mut config = AppConfig::default();
        config.reasoner.api_key = Some("env:SPRINTWRIGHT_TEST_UNSET_KEY".to_string());
        assert!(matches!(build_orchestrator(&config), Err(Error::Config(_))));
    }
}
