//! Configuration module for managing user preferences and settings
//!
//! Provides TOML-based configuration with defaults, CLI override, and env var support.

pub use crate::models::{AutoRunPolicy, ShellType, UserConfiguration, UserConfigurationBuilder};
use crate::models::LogLevel;
use std::path::{Path, PathBuf};

/// Configuration-related errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("invalid configuration: {0}")]
    ValidationError(String),

    #[error("config directory error: {0}")]
    DirectoryError(String),
}

/// Loads, validates, and persists [`UserConfiguration`].
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager with the default XDG config directory
    /// (`~/.config/angela`), creating it if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::DirectoryError` if the config directory cannot be
    /// determined or created.
    pub fn new() -> Result<Self, ConfigError> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ConfigError::DirectoryError("could not determine config directory".to_string()))?
            .join("angela");

        if !config_dir.exists() {
            std::fs::create_dir_all(&config_dir)?;
        }

        Ok(Self { config_path: config_dir.join("config.toml") })
    }

    /// Create a ConfigManager with a custom config path, creating its parent
    /// directory if necessary.
    pub fn with_config_path(config_path: PathBuf) -> Result<Self, ConfigError> {
        if let Some(parent) = config_path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        Ok(Self { config_path })
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Load configuration from file, or return defaults if not found.
    ///
    /// # Errors
    ///
    /// Returns errors if the file cannot be read, fails to parse, or fails
    /// validation.
    pub fn load(&self) -> Result<UserConfiguration, ConfigError> {
        if !self.config_path.exists() {
            return Ok(UserConfiguration::default());
        }

        let contents = std::fs::read_to_string(&self.config_path)?;
        let config: UserConfiguration = toml::from_str(&contents)?;
        config.validate().map_err(ConfigError::ValidationError)?;

        Ok(config)
    }

    /// Validate and write configuration to file.
    pub fn save(&self, config: &UserConfiguration) -> Result<(), ConfigError> {
        config.validate().map_err(ConfigError::ValidationError)?;

        let toml_string = toml::to_string_pretty(config)?;
        std::fs::write(&self.config_path, toml_string)?;

        Ok(())
    }

    /// Load from file, then apply CLI overrides (CLI wins over file).
    pub fn merge_with_cli(
        &self,
        cli_shell: Option<ShellType>,
        cli_log_level: Option<LogLevel>,
    ) -> Result<UserConfiguration, ConfigError> {
        let mut config = self.load()?;

        if let Some(shell) = cli_shell {
            config.default_shell = Some(shell);
        }
        if let Some(level) = cli_log_level {
            config.log_level = level;
        }

        Ok(config)
    }

    /// Load from file, then apply `ANGELA_*` environment variable overrides
    /// (env wins over file, but CLI flags should still win over env when both
    /// are applied by the caller).
    pub fn merge_with_env(&self) -> Result<UserConfiguration, ConfigError> {
        let mut config = self.load()?;

        if let Ok(shell_str) = std::env::var("ANGELA_DEFAULT_SHELL") {
            config.default_shell = Some(shell_str.parse().map_err(ConfigError::ValidationError)?);
        }

        if let Ok(log_str) = std::env::var("ANGELA_LOG_LEVEL") {
            config.log_level = log_str.parse().map_err(ConfigError::ValidationError)?;
        }

        if let Ok(threshold_str) = std::env::var("ANGELA_AUTO_RUN_THRESHOLD") {
            config.auto_run.auto_run_threshold = parse_risk_tier(&threshold_str)?;
        }

        Ok(config)
    }

    pub fn config_path_string(&self) -> String {
        self.config_path.to_string_lossy().to_string()
    }
}

fn parse_risk_tier(s: &str) -> Result<crate::models::RiskTier, ConfigError> {
    use crate::models::RiskTier;
    match s.to_ascii_lowercase().as_str() {
        "safe" => Ok(RiskTier::Safe),
        "low" => Ok(RiskTier::Low),
        "medium" => Ok(RiskTier::Medium),
        "high" => Ok(RiskTier::High),
        "critical" => Ok(RiskTier::Critical),
        other => Err(ConfigError::ValidationError(format!("unknown risk tier: {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn config_manager_creation() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        assert!(ConfigManager::with_config_path(config_path).is_ok());
    }

    #[test]
    fn load_defaults_when_missing() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.toml");
        let manager = ConfigManager::with_config_path(config_path).unwrap();
        let config = manager.load().unwrap();
        assert_eq!(config.log_level, LogLevel::Info);
    }

    #[test]
    fn save_and_load_round_trips() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        let manager = ConfigManager::with_config_path(config_path).unwrap();

        let config = UserConfigurationBuilder::new().log_level(LogLevel::Debug).build();

        manager.save(&config).unwrap();
        let loaded = manager.load().unwrap();
        assert_eq!(loaded.log_level, LogLevel::Debug);
    }

    #[test]
    fn cli_override_wins_over_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        let manager = ConfigManager::with_config_path(config_path).unwrap();
        manager.save(&UserConfigurationBuilder::new().log_level(LogLevel::Info).build()).unwrap();

        let merged = manager.merge_with_cli(Some(ShellType::Zsh), Some(LogLevel::Trace)).unwrap();
        assert_eq!(merged.default_shell, Some(ShellType::Zsh));
        assert_eq!(merged.log_level, LogLevel::Trace);
    }
}
