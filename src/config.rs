use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::constants::{
    BASE_URL, DEFAULT_CREDENTIALS, DEFAULT_DELAY_MS, DEFAULT_EXCHANGE_RATE, DEFAULT_OUTPUT,
    DEFAULT_SHEET_RANGE, DEFAULT_TABLE, DEFAULT_TIMEOUT_SECONDS, DEFAULT_USER_AGENT,
};
use crate::error::ConfigError;
use crate::transform::TransformConfig;

/// File-level configuration. Every key is optional; CLI flags override it.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub extract: ExtractConfig,
    pub transform: TransformSection,
    pub load: LoadConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExtractConfig {
    pub base_url: String,
    pub delay_ms: u64,
    pub timeout_seconds: u64,
    pub user_agent: String,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            delay_ms: DEFAULT_DELAY_MS,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ExtractConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct TransformSection {
    pub exchange_rate: u32,
}

impl Default for TransformSection {
    fn default() -> Self {
        Self {
            exchange_rate: DEFAULT_EXCHANGE_RATE,
        }
    }
}

impl From<&TransformSection> for TransformConfig {
    fn from(section: &TransformSection) -> Self {
        TransformConfig {
            exchange_rate: section.exchange_rate,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoadConfig {
    pub output: String,
    pub credentials: String,
    pub sheet_range: String,
    pub table: String,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            output: DEFAULT_OUTPUT.to_string(),
            credentials: DEFAULT_CREDENTIALS.to_string(),
            sheet_range: DEFAULT_SHEET_RANGE.to_string(),
            table: DEFAULT_TABLE.to_string(),
        }
    }
}

impl Config {
    /// Loads `path` if it exists; a missing file means defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.transform.exchange_rate == 0 {
            return Err(ConfigError::Invalid("transform.exchange_rate must be positive".into()));
        }
        if self.extract.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("extract.base_url must not be empty".into()));
        }
        if self.extract.timeout_seconds == 0 {
            return Err(ConfigError::Invalid("extract.timeout_seconds must be positive".into()));
        }
        Ok(())
    }
}
