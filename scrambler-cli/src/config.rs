use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use log::{debug, LevelFilter};
use scrambler_core::DelayModel;
use serde::{Deserialize, Serialize};

/// Range of the base delay, in milliseconds
pub const MIN_BASE_DELAY_MS: u64 = 50;
pub const MAX_BASE_DELAY_MS: u64 = 200;
pub const DEFAULT_BASE_DELAY_MS: u64 = 100;

const CONFIG_DIR_NAME: &str = "keystroke-scrambler";
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralConfig {
    pub base_delay_ms: u64,
    pub delay_model: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            delay_model: DelayModel::default().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub to_file: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            to_file: true,
        }
    }
}

impl LoggingConfig {
    pub fn level_filter(&self) -> Result<LevelFilter> {
        self.level
            .parse::<LevelFilter>()
            .with_context(|| format!("Invalid log level: {}", self.level))
    }
}

/// Check a base delay against the slider range
pub fn validate_base_delay_ms(ms: u64) -> Result<()> {
    if !(MIN_BASE_DELAY_MS..=MAX_BASE_DELAY_MS).contains(&ms) {
        bail!(
            "Base delay must be between {} and {} ms, got {}",
            MIN_BASE_DELAY_MS,
            MAX_BASE_DELAY_MS,
            ms
        );
    }
    Ok(())
}

/// Default location of the configuration file
pub fn default_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().context("Failed to get config directory")?;
    Ok(config_dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        validate_base_delay_ms(self.general.base_delay_ms)?;
        self.delay_model()?;
        self.logging.level_filter()?;
        Ok(())
    }

    /// Base delay in seconds, as the engine expects it
    pub fn base_delay_secs(&self) -> f64 {
        self.general.base_delay_ms as f64 / 1000.0
    }

    pub fn delay_model(&self) -> Result<DelayModel> {
        self.general
            .delay_model
            .parse::<DelayModel>()
            .context("Invalid delay model in config")
    }

    pub fn set_base_delay_ms(&mut self, ms: u64) -> Result<()> {
        validate_base_delay_ms(ms)?;
        self.general.base_delay_ms = ms;
        Ok(())
    }

    pub fn set_delay_model(&mut self, model: DelayModel) {
        self.general.delay_model = model.to_string();
    }

    /// Load from `path`, writing the defaults there when it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            debug!("Created default config at {}", path.display());
            return Ok(config);
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&contents).context("Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.validate()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, contents).context("Failed to write config file")?;
        Ok(())
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&default_config_path()?)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&default_config_path()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.base_delay_secs(), 0.1);
        assert_eq!(config.delay_model().unwrap(), DelayModel::PairAware);
    }

    #[test]
    fn test_delay_range() {
        assert!(validate_base_delay_ms(50).is_ok());
        assert!(validate_base_delay_ms(200).is_ok());
        assert!(validate_base_delay_ms(49).is_err());
        assert!(validate_base_delay_ms(201).is_err());
    }

    #[test]
    fn test_rejected_delay_keeps_previous() {
        let mut config = Config::default();
        config.set_base_delay_ms(150).unwrap();
        assert!(config.set_base_delay_ms(500).is_err());
        assert_eq!(config.general.base_delay_ms, 150);
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config: Config = toml::from_str("[general]\nbase_delay_ms = 80\ndelay_model = \"flat\"\n").unwrap();
        assert_eq!(config.logging, LoggingConfig::default());
        assert_eq!(config.delay_model().unwrap(), DelayModel::Flat);
    }

    #[test]
    fn test_bad_log_level() {
        let mut config = Config::default();
        config.logging.level = "chatty".to_string();
        assert!(config.validate().is_err());
    }
}
