//! Configuration Management Module
//!
//! File-based configuration for budgets, the HTTP server, the reasoner
//! provider, the Taiga endpoint, conversation retention and logging.
//! Values are loaded from TOML or JSON, then overridden from
//! `SPRINTWRIGHT_*` environment variables, then validated.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "SPRINTWRIGHT_";

/// Configuration file format
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    #[default]
    Toml,
}

impl ConfigFormat {
    /// Pick the format from a file extension, defaulting to TOML
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ConfigFormat::Json,
            _ => ConfigFormat::Toml,
        }
    }
}

impl std::str::FromStr for ConfigFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ConfigFormat::Json),
            "toml" => Ok(ConfigFormat::Toml),
            _ => Err(anyhow!("Unsupported config format: {}", s)),
        }
    }
}

/// A configuration value that failed validation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid configuration: {field} {reason}")]
pub struct ConfigError {
    pub field: &'static str,
    pub reason: String,
}

impl ConfigError {
    fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Budget ceilings for a single run
///
/// Every ceiling must be positive. A run stops cleanly once any of them is
/// reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetConfig {
    /// Wall-clock deadline for the whole run
    pub deadline_seconds: u64,

    /// Maximum reasoner consultations
    pub max_steps: usize,

    /// Maximum executed tool calls (reads and writes)
    pub max_total_tool_calls: usize,

    /// Maximum executed write calls
    pub max_write_calls: usize,

    /// Maximum requests for one fingerprint
    pub max_repeated_call_hash: usize,

    /// Upper bound on a single reasoner or executor call
    pub call_timeout_seconds: u64,

    /// Grace period a call may run past the deadline
    pub overrun_grace_ms: u64,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            deadline_seconds: 30,
            max_steps: 10,
            max_total_tool_calls: 25,
            max_write_calls: 15,
            max_repeated_call_hash: 2,
            call_timeout_seconds: 20,
            overrun_grace_ms: 2_000,
        }
    }
}

impl BudgetConfig {
    /// Create permissive configuration for testing
    #[cfg(test)]
    pub fn permissive() -> Self {
        Self {
            deadline_seconds: 600,
            max_steps: 100,
            max_total_tool_calls: 1_000,
            max_write_calls: 1_000,
            max_repeated_call_hash: 100,
            call_timeout_seconds: 300,
            overrun_grace_ms: 2_000,
        }
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_seconds)
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_seconds)
    }

    pub fn overrun_grace(&self) -> Duration {
        Duration::from_millis(self.overrun_grace_ms)
    }

    /// Validate that no ceiling disables the loop's bounds
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("budgets.deadline_seconds", self.deadline_seconds as usize),
            ("budgets.max_steps", self.max_steps),
            ("budgets.max_total_tool_calls", self.max_total_tool_calls),
            ("budgets.max_write_calls", self.max_write_calls),
            ("budgets.max_repeated_call_hash", self.max_repeated_call_hash),
            ("budgets.call_timeout_seconds", self.call_timeout_seconds as usize),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(ConfigError::new(field, "must be greater than zero"));
            }
        }
        if self.max_write_calls > self.max_total_tool_calls {
            return Err(ConfigError::new(
                "budgets.max_write_calls",
                format!(
                    "({}) cannot exceed max_total_tool_calls ({})",
                    self.max_write_calls, self.max_total_tool_calls
                ),
            ));
        }
        Ok(())
    }
}

/// HTTP server settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Interval between idle-conversation sweeps
    pub conversation_sweep_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            conversation_sweep_seconds: 60,
        }
    }
}

/// Which reasoner implementation to build
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReasonerProvider {
    #[default]
    Anthropic,
    /// Offline reasoner that answers without calling a model
    Stub,
}

impl std::str::FromStr for ReasonerProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "anthropic" => Ok(ReasonerProvider::Anthropic),
            "stub" => Ok(ReasonerProvider::Stub),
            _ => Err(anyhow!("Unsupported reasoner provider: {}", s)),
        }
    }
}

/// Reasoner provider settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReasonerConfig {
    pub provider: ReasonerProvider,
    /// Literal key, or `env:VAR` to read it from the environment
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub api_version: String,
}

impl Default for ReasonerConfig {
    fn default() -> Self {
        Self {
            provider: ReasonerProvider::Anthropic,
            api_key: Some("env:ANTHROPIC_API_KEY".to_string()),
            base_url: "https://api.anthropic.com".to_string(),
            model: "claude-3-5-sonnet-20241022".to_string(),
            max_tokens: 4096,
            api_version: "2023-06-01".to_string(),
        }
    }
}

/// Taiga endpoint settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaigaConfig {
    pub base_url: String,
    pub request_timeout_seconds: u64,
}

impl Default for TaigaConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.taiga.io/api/v1".to_string(),
            request_timeout_seconds: 10,
        }
    }
}

/// Server-side conversation retention
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationConfig {
    /// Idle time after which a stored conversation is dropped
    pub ttl_seconds: u64,
    /// Maximum stored turns per conversation
    pub max_turns: usize,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: 30 * 60,
            max_turns: 200,
        }
    }
}

impl ConversationConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
    /// Write daily-rotated log files here in addition to stderr
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            directory: None,
        }
    }
}

/// Top-level application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub budgets: BudgetConfig,
    pub reasoner: ReasonerConfig,
    pub taiga: TaigaConfig,
    pub conversations: ConversationConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Parse configuration text in the given format
    pub fn parse(content: &str, format: ConfigFormat) -> Result<Self> {
        let config = match format {
            ConfigFormat::Toml => toml::from_str(content).context("Failed to parse TOML config")?,
            ConfigFormat::Json => {
                serde_json::from_str(content).context("Failed to parse JSON config")?
            }
        };
        Ok(config)
    }

    /// Validate every section
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.budgets.validate()?;
        if self.server.conversation_sweep_seconds == 0 {
            return Err(ConfigError::new(
                "server.conversation_sweep_seconds",
                "must be greater than zero",
            ));
        }
        if self.conversations.max_turns == 0 {
            return Err(ConfigError::new(
                "conversations.max_turns",
                "must be greater than zero",
            ));
        }
        if self.reasoner.max_tokens == 0 {
            return Err(ConfigError::new("reasoner.max_tokens", "must be greater than zero"));
        }
        if !self.taiga.base_url.starts_with("http://") && !self.taiga.base_url.starts_with("https://") {
            return Err(ConfigError::new("taiga.base_url", "must be an http(s) URL"));
        }
        Ok(())
    }

    /// Copy with secrets masked, for display
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if let Some(key) = &copy.reasoner.api_key {
            if !key.starts_with("env:") {
                copy.reasoner.api_key = Some("***".to_string());
            }
        }
        copy
    }
}

/// Resolve an `env:VAR` reference, or return the literal value
pub fn resolve_env_reference(value: &str) -> Option<String> {
    match value.strip_prefix("env:") {
        Some(var) => std::env::var(var).ok().filter(|v| !v.is_empty()),
        None if value.is_empty() => None,
        None => Some(value.to_string()),
    }
}

/// Configuration manager
pub struct ConfigManager {
    config: AppConfig,
    config_path: PathBuf,
    format: ConfigFormat,
}

impl ConfigManager {
    /// Default location: `<config dir>/sprintwright/config.toml`
    pub fn default_path() -> Result<PathBuf> {
        let dir = dirs::config_dir().ok_or_else(|| anyhow!("Could not determine config directory"))?;
        Ok(dir.join("sprintwright").join("config.toml"))
    }

    /// Create a manager for an explicit path
    pub fn with_path<P: AsRef<Path>>(path: P) -> Self {
        let config_path = path.as_ref().to_path_buf();
        let format = ConfigFormat::from_path(&config_path);
        Self {
            config: AppConfig::default(),
            config_path,
            format,
        }
    }

    /// Load from `path` (or the default location), apply environment
    /// overrides and validate
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut manager = match path {
            Some(path) => Self::with_path(path),
            None => Self::with_path(Self::default_path()?),
        };
        manager.load_config()?;
        manager.apply_env_overrides();
        manager.config.validate()?;
        Ok(manager)
    }

    pub fn config_exists(&self) -> bool {
        self.config_path.exists()
    }

    /// Read the file if present; defaults otherwise
    pub fn load_config(&mut self) -> Result<()> {
        if !self.config_exists() {
            debug!(path = %self.config_path.display(), "Config file not found, using defaults");
            return Ok(());
        }
        let content = fs::read_to_string(&self.config_path)
            .with_context(|| format!("Failed to read config file {}", self.config_path.display()))?;
        self.config = AppConfig::parse(&content, self.format)?;
        info!(path = %self.config_path.display(), "Loaded configuration");
        Ok(())
    }

    /// Write the current configuration, creating parent directories
    pub fn save_config(&self) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = match self.format {
            ConfigFormat::Toml => toml::to_string_pretty(&self.config)?,
            ConfigFormat::Json => serde_json::to_string_pretty(&self.config)?,
        };
        fs::write(&self.config_path, content)?;
        info!(path = %self.config_path.display(), "Saved configuration");
        Ok(())
    }

    /// Apply `SPRINTWRIGHT_*` overrides from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|name| std::env::var(name).ok());
    }

    /// Apply overrides from an arbitrary lookup
    ///
    /// Unparseable numeric values are ignored.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |suffix: &str| lookup(&format!("{}{}", ENV_PREFIX, suffix));
        let config = &mut self.config;

        if let Some(host) = var("HOST") {
            config.server.host = host;
            debug!("Applied env override for server host");
        }
        if let Some(port) = var("PORT").and_then(|v| v.parse().ok()) {
            config.server.port = port;
            debug!("Applied env override for server port");
        }
        if let Some(provider) = var("REASONER").and_then(|v| v.parse().ok()) {
            config.reasoner.provider = provider;
            debug!("Applied env override for reasoner provider");
        }
        if let Some(model) = var("ANTHROPIC_MODEL") {
            config.reasoner.model = model;
            debug!("Applied env override for reasoner model");
        }
        if let Some(url) = var("TAIGA_BASE_URL") {
            config.taiga.base_url = url;
            debug!("Applied env override for Taiga URL");
        }
        if let Some(level) = var("LOG_LEVEL") {
            config.logging.level = level;
            debug!("Applied env override for log level");
        }
        if let Some(json) = var("LOG_JSON").and_then(|v| v.parse().ok()) {
            config.logging.json = json;
            debug!("Applied env override for JSON logging");
        }

        let budgets = &mut config.budgets;
        if let Some(v) = var("DEADLINE_SECONDS").and_then(|v| v.parse().ok()) {
            budgets.deadline_seconds = v;
        }
        if let Some(v) = var("MAX_STEPS").and_then(|v| v.parse().ok()) {
            budgets.max_steps = v;
        }
        if let Some(v) = var("MAX_TOTAL_TOOL_CALLS").and_then(|v| v.parse().ok()) {
            budgets.max_total_tool_calls = v;
        }
        if let Some(v) = var("MAX_WRITE_CALLS").and_then(|v| v.parse().ok()) {
            budgets.max_write_calls = v;
        }
        if let Some(v) = var("MAX_REPEATED_CALL_HASH").and_then(|v| v.parse().ok()) {
            budgets.max_repeated_call_hash = v;
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut AppConfig {
        &mut self.config
    }

    pub fn into_config(self) -> AppConfig {
        self.config
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_budget_defaults() {
        let budgets = BudgetConfig::default();
        assert_eq!(budgets.deadline_seconds, 30);
        assert_eq!(budgets.max_steps, 10);
        assert_eq!(budgets.max_total_tool_calls, 25);
        assert_eq!(budgets.max_write_calls, 15);
        assert_eq!(budgets.max_repeated_call_hash, 2);
        assert!(budgets.validate().is_ok());
    }

    #[test]
    fn test_zero_ceiling_rejected() {
        let budgets = BudgetConfig {
            max_steps: 0,
            ..BudgetConfig::default()
        };
        let err = budgets.validate().unwrap_err();
        assert_eq!(err.field, "budgets.max_steps");
    }

    #[test]
    fn test_write_ceiling_cannot_exceed_total() {
        let budgets = BudgetConfig {
            max_total_tool_calls: 5,
            max_write_calls: 6,
            ..BudgetConfig::default()
        };
        assert!(budgets.validate().is_err());
    }

    #[test]
    fn test_config_format_from_str() {
        assert_eq!("json".parse::<ConfigFormat>().unwrap(), ConfigFormat::Json);
        assert_eq!("TOML".parse::<ConfigFormat>().unwrap(), ConfigFormat::Toml);
        assert!("yaml".parse::<ConfigFormat>().is_err());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AppConfig::parse(
            r#"
            [budgets]
            max_steps = 4

            [reasoner]
            provider = "stub"
            "#,
            ConfigFormat::Toml,
        )
        .unwrap();
        assert_eq!(config.budgets.max_steps, 4);
        assert_eq!(config.budgets.max_write_calls, 15);
        assert_eq!(config.reasoner.provider, ReasonerProvider::Stub);
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("SPRINTWRIGHT_PORT", "9100"),
            ("SPRINTWRIGHT_MAX_STEPS", "3"),
            ("SPRINTWRIGHT_REASONER", "stub"),
            ("SPRINTWRIGHT_MAX_WRITE_CALLS", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let mut manager = ConfigManager::with_path("/nonexistent/config.toml");
        manager.apply_overrides_from(|name| env.get(name).map(|v| v.to_string()));

        let config = manager.config();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.budgets.max_steps, 3);
        assert_eq!(config.reasoner.provider, ReasonerProvider::Stub);
        assert_eq!(config.budgets.max_write_calls, 15);
    }

    #[test]
    fn test_config_save_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.json");

        let mut manager = ConfigManager::with_path(&path);
        manager.config_mut().budgets.max_total_tool_calls = 40;
        manager.config_mut().server.port = 8123;
        manager.save_config().unwrap();

        let mut reloaded = ConfigManager::with_path(&path);
        reloaded.load_config().unwrap();
        assert_eq!(reloaded.config().budgets.max_total_tool_calls, 40);
        assert_eq!(reloaded.config().server.port, 8123);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let mut manager = ConfigManager::with_path(temp_dir.path().join("absent.toml"));
        manager.load_config().unwrap();
        assert_eq!(manager.config(), &AppConfig::default());
    }

    #[test]
    fn test_redacted_masks_literal_key() {
        let mut config = AppConfig::default();
        config.reasoner.api_key = Some("sk-secret".to_string());
        assert_eq!(config.redacted().reasoner.api_key.as_deref(), Some("***"));

        config.reasoner.api_key = Some("env:ANTHROPIC_API_KEY".to_string());
        assert_eq!(
            config.redacted().reasoner.api_key.as_deref(),
            Some("env:ANTHROPIC_API_KEY")
        );
    }

    #[test]
    fn test_resolve_literal_reference() {
        assert_eq!(resolve_env_reference("abc"), Some("abc".to_string()));
        assert_eq!(resolve_env_reference(""), None);
        assert_eq!(resolve_env_reference("env:SPRINTWRIGHT_SURELY_UNSET_VAR"), None);
    }
}
