use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub notice: NoticeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Upper bound on how long a submission may stay in flight.
    #[serde(default = "TrackerConfig::default_submission_timeout")]
    pub submission_timeout_ms: u64,
    /// Wait after a window refocus before trusting it.
    #[serde(default = "TrackerConfig::default_settle_delay")]
    pub settle_delay_ms: u64,
}

impl TrackerConfig {
    fn default_submission_timeout() -> u64 { 30_000 }
    fn default_settle_delay() -> u64 { 2_000 }

    pub fn submission_timeout(&self) -> Duration {
        Duration::from_millis(self.submission_timeout_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            submission_timeout_ms: 30_000,
            settle_delay_ms: 2_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoticeConfig {
    /// Notices remove themselves after this long.
    #[serde(default = "NoticeConfig::default_dismiss_after")]
    pub dismiss_after_ms: u64,
}

impl NoticeConfig {
    fn default_dismiss_after() -> u64 { 5_000 }
}

impl Default for NoticeConfig {
    fn default() -> Self {
        Self {
            dismiss_after_ms: 5_000,
        }
    }
}

impl Config {
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("/etc"))
            .join("kinderslides")
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let config: Config = toml::from_str(&contents).with_context(|| "parsing config TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// A zero timeout would resolve every submission on the next tick.
    pub fn validate(&self) -> Result<()> {
        if self.tracker.submission_timeout_ms == 0 {
            anyhow::bail!("tracker.submission_timeout_ms must be greater than zero");
        }
        Ok(())
    }
}

pub fn socket_path() -> PathBuf {
    // KINDERSLIDES_SOCK env var overrides for testing.
    if let Ok(path) = std::env::var("KINDERSLIDES_SOCK") {
        return PathBuf::from(path);
    }
    dirs::runtime_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("kinderslides")
        .join("kinderslides.sock")
}
