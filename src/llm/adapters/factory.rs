//! Adapter Factory
//!
//! Creates the configured reasoner.

use sprintwright_core::{resolve_env_reference, ReasonerConfig, ReasonerProvider};

use crate::llm::adapters::anthropic::AnthropicAdapter;
use crate::llm::adapters::stub::StubAdapter;
use crate::llm::adapters::{Adapter, AdapterError};

/// Create the reasoner selected by `config.provider`
pub fn create_reasoner(config: &ReasonerConfig) -> Result<Adapter, AdapterError> {
    match config.provider {
        ReasonerProvider::Stub => Ok(Adapter::Stub(StubAdapter::new())),
        ReasonerProvider::Anthropic => {
            let api_key = config
                .api_key
                .as_deref()
                .and_then(resolve_env_reference)
                .ok_or_else(|| {
                    AdapterError::Configuration(
                        "Anthropic API key missing (set ANTHROPIC_API_KEY or reasoner.api_key)".to_string(),
                    )
                })?;
            let adapter = AnthropicAdapter::new(config.base_url.clone(), config.model.clone(), api_key)
                .with_api_version(config.api_version.clone())
                .with_max_tokens(config.max_tokens);
            Ok(Adapter::Anthropic(adapter))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stub_provider() {
        let config = ReasonerConfig {
            provider: ReasonerProvider::Stub,
            ..ReasonerConfig::default()
        };
        assert_eq!(create_reasoner(&config).unwrap().provider_name(), "stub");
    }

    #[test]
    fn test_literal_key() {
        let config = ReasonerConfig {
            api_key: Some("sk-literal".to_string()),
            model: "claude-test".to_string(),
            ..ReasonerConfig::default()
        };
        match create_reasoner(&config).unwrap() {
            Adapter::Anthropic(adapter) => assert_eq!(adapter.model(), "claude-test"),
            other => panic!("unexpected adapter {:?}", other),
        }
    }

    #[test]
    fn test_missing_key_is_configuration_error() {
        let config = ReasonerConfig {
            api_key: Some("env:SPRINTWRIGHT_TEST_UNSET_KEY".to_string()),
            ..ReasonerConfig::default()
        };
        assert!(matches!(
            create_reasoner(&config),
            Err(AdapterError::Configuration(_))
        ));
    }
}
