//! Configuration management with validation and defaults
//!
//! Settings are grouped by concern and loaded from TOML, then overridden by
//! `AVIATOR_*` environment variables and validated before use.

use crate::errors::{AviatorResult, ConfigurationError};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

/// Longest history window chrono can represent, in seconds
pub const MAX_HISTORY_WINDOW_SECS: u64 = (i64::MAX / 1_000) as u64;

/// Complete game configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub engine: EngineConfig,
    pub account: AccountConfig,
    pub ledger: LedgerConfig,
    pub admin: AdminConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

/// Round progression settings
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub tick_interval_ms: u64,
    pub multiplier_step: f64,
    pub crash_bound_min: f64,
    pub crash_bound_max: f64,
    /// Start a new round this long after a crash, reusing the last wager
    pub auto_restart_delay_ms: Option<u64>,
    pub allow_deposits: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 200,
            multiplier_step: 0.1,
            crash_bound_min: 1.0,
            crash_bound_max: 20.0,
            auto_restart_delay_ms: None,
            allow_deposits: true,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountConfig {
    pub starting_balance: f64,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            starting_balance: 10_000.0,
        }
    }
}

/// Retention limits for the crash history and the leaderboard
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub history_window_secs: u64,
    pub history_capacity: usize,
    pub leaderboard_capacity: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            history_window_secs: 300,
            history_capacity: 20,
            leaderboard_capacity: 5,
        }
    }
}

/// Shared secret for the crash-point override. Not an auth boundary.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    pub secret: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            secret: "aviatoradmin".to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Rocksdb,
    Memory,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Rocksdb,
            data_dir: "./data".to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl GameConfig {
    /// Bounds 1-20, crashed rounds wait for the player to start again
    pub fn classic() -> Self {
        Self::default()
    }

    /// Bounds 1-200, a crashed round restarts itself after three seconds
    pub fn auto_restart() -> Self {
        Self {
            engine: EngineConfig {
                crash_bound_max: 200.0,
                auto_restart_delay_ms: Some(3_000),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.engine.tick_interval_ms)
    }

    pub fn auto_restart_delay(&self) -> Option<Duration> {
        self.engine.auto_restart_delay_ms.map(Duration::from_millis)
    }

    pub fn history_window(&self) -> chrono::Duration {
        let secs = self.ledger.history_window_secs.min(MAX_HISTORY_WINDOW_SECS);
        chrono::Duration::seconds(secs as i64)
    }
}

/// Configuration loader with environment variable support
#[derive(Default)]
pub struct ConfigLoader {
    config_path: Option<String>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Set the configuration file path
    pub fn with_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_string_lossy().to_string());
        self
    }

    /// Load configuration from file and environment variables
    pub fn load(&self) -> AviatorResult<GameConfig> {
        let mut config = match self.config_path {
            Some(ref path) => self.load_from_file(path)?,
            None => GameConfig::default(),
        };

        self.apply_env_overrides(&mut config)?;
        self.validate(&config)?;

        Ok(config)
    }

    fn load_from_file(&self, path: &str) -> AviatorResult<GameConfig> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigurationError::LoadFailed(format!("Failed to read {}: {}", path, e))
        })?;

        toml::from_str(&content).map_err(|e| {
            ConfigurationError::LoadFailed(format!("Failed to parse TOML: {}", e)).into()
        })
    }

    fn apply_env_overrides(&self, config: &mut GameConfig) -> AviatorResult<()> {
        if let Ok(data_dir) = env::var("AVIATOR_DATA_DIR") {
            config.storage.data_dir = data_dir;
        }
        if let Ok(secret) = env::var("AVIATOR_ADMIN_SECRET") {
            config.admin.secret = secret;
        }
        if let Ok(level) = env::var("AVIATOR_LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Ok(balance) = env::var("AVIATOR_STARTING_BALANCE") {
            config.account.starting_balance =
                balance.parse().map_err(|_| ConfigurationError::InvalidValue {
                    field: "AVIATOR_STARTING_BALANCE".to_string(),
                    value: balance,
                    reason: "Invalid number".to_string(),
                })?;
        }
        if let Ok(delay) = env::var("AVIATOR_AUTO_RESTART_MS") {
            config.engine.auto_restart_delay_ms = if delay.is_empty() || delay == "off" {
                None
            } else {
                Some(delay.parse().map_err(|_| ConfigurationError::InvalidValue {
                    field: "AVIATOR_AUTO_RESTART_MS".to_string(),
                    value: delay,
                    reason: "Expected milliseconds or 'off'".to_string(),
                })?)
            };
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self, config: &GameConfig) -> AviatorResult<()> {
        let engine = &config.engine;

        if engine.tick_interval_ms == 0 {
            return Err(invalid("engine.tick_interval_ms", "0", "Tick interval cannot be zero"));
        }

        if !(engine.multiplier_step.is_finite() && engine.multiplier_step > 0.0) {
            return Err(invalid(
                "engine.multiplier_step",
                engine.multiplier_step,
                "Step must be positive",
            ));
        }

        if !(engine.crash_bound_min >= 1.0) {
            return Err(invalid(
                "engine.crash_bound_min",
                engine.crash_bound_min,
                "Lower bound must be at least 1.0",
            ));
        }

        if !(engine.crash_bound_max.is_finite() && engine.crash_bound_max > engine.crash_bound_min) {
            return Err(invalid(
                "engine.crash_bound_max",
                engine.crash_bound_max,
                "Upper bound must exceed the lower bound",
            ));
        }

        if !(config.account.starting_balance.is_finite() && config.account.starting_balance >= 0.0) {
            return Err(invalid(
                "account.starting_balance",
                config.account.starting_balance,
                "Balance cannot be negative",
            ));
        }

        let window = config.ledger.history_window_secs;
        if window == 0 || window > MAX_HISTORY_WINDOW_SECS {
            return Err(invalid(
                "ledger.history_window_secs",
                window,
                "Window must be between one second and the chrono range",
            ));
        }

        if config.ledger.history_capacity == 0 {
            return Err(invalid("ledger.history_capacity", "0", "Capacity cannot be zero"));
        }

        if config.ledger.leaderboard_capacity == 0 {
            return Err(invalid("ledger.leaderboard_capacity", "0", "Capacity cannot be zero"));
        }

        if config.admin.secret.is_empty() {
            return Err(ConfigurationError::MissingRequired("admin.secret".to_string()).into());
        }

        if config.storage.backend == StorageBackend::Rocksdb && config.storage.data_dir.is_empty() {
            return Err(ConfigurationError::MissingRequired("storage.data_dir".to_string()).into());
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, config: &GameConfig, path: &str) -> AviatorResult<()> {
        let toml_string = toml::to_string_pretty(config).map_err(|e| {
            ConfigurationError::SaveFailed(format!("Failed to serialize config: {}", e))
        })?;

        std::fs::write(path, toml_string).map_err(|e| {
            ConfigurationError::SaveFailed(format!("Failed to write to {}: {}", path, e)).into()
        })
    }
}

fn invalid(field: &str, value: impl ToString, reason: &str) -> crate::errors::AviatorError {
    ConfigurationError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = GameConfig::default();
        assert_eq!(config.engine.tick_interval_ms, 200);
        assert_eq!(config.engine.crash_bound_max, 20.0);
        assert_eq!(config.engine.auto_restart_delay_ms, None);
        assert_eq!(config.ledger.history_capacity, 20);
        assert_eq!(config.ledger.leaderboard_capacity, 5);
        assert_eq!(config.account.starting_balance, 10_000.0);
    }

    #[test]
    fn test_auto_restart_preset() {
        let config = GameConfig::auto_restart();
        assert_eq!(config.engine.crash_bound_max, 200.0);
        assert_eq!(config.auto_restart_delay(), Some(Duration::from_secs(3)));
    }

    #[test]
    fn test_config_validation() {
        let loader = ConfigLoader::new();
        let mut config = GameConfig::default();

        assert!(loader.validate(&config).is_ok());

        config.engine.crash_bound_max = 0.5;
        assert!(loader.validate(&config).is_err());

        let mut config = GameConfig::default();
        config.ledger.leaderboard_capacity = 0;
        assert!(loader.validate(&config).is_err());

        let mut config = GameConfig::default();
        config.admin.secret.clear();
        assert!(loader.validate(&config).is_err());

        let mut config = GameConfig::default();
        config.ledger.history_window_secs = 0;
        assert!(loader.validate(&config).is_err());

        config.ledger.history_window_secs = 10_000_000_000_000_000;
        assert!(loader.validate(&config).is_err());

        config.ledger.history_window_secs = MAX_HISTORY_WINDOW_SECS;
        assert!(loader.validate(&config).is_ok());
    }

    #[test]
    fn test_history_window_clamped_to_chrono_range() {
        let mut config = GameConfig::default();
        assert_eq!(config.history_window(), chrono::Duration::minutes(5));

        config.ledger.history_window_secs = u64::MAX;
        assert_eq!(
            config.history_window(),
            chrono::Duration::seconds(MAX_HISTORY_WINDOW_SECS as i64)
        );
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: GameConfig = toml::from_str(
            r#"
            [engine]
            crash_bound_max = 200.0
            auto_restart_delay_ms = 3000

            [storage]
            backend = "memory"
            "#,
        )
        .unwrap();

        assert_eq!(config.engine.crash_bound_max, 200.0);
        assert_eq!(config.engine.tick_interval_ms, 200);
        assert_eq!(config.engine.auto_restart_delay_ms, Some(3000));
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.admin.secret, "aviatoradmin");
    }

    #[test]
    fn test_save_and_load_config() -> AviatorResult<()> {
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path().to_str().unwrap();

        let original = GameConfig::auto_restart();
        let loader = ConfigLoader::new();
        loader.save(&original, path)?;

        let loaded = ConfigLoader::new().with_path(path).load()?;
        assert_eq!(loaded.engine.crash_bound_max, original.engine.crash_bound_max);
        assert_eq!(
            loaded.engine.auto_restart_delay_ms,
            original.engine.auto_restart_delay_ms
        );

        Ok(())
    }
}
