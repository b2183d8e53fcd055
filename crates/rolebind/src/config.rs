use std::time::Duration;

use rolebind_api_memory::BackendConfig;
use rolebind_reconciler::ReconcilerConfig;
use rolebind_reconciler::config::{
    DEFAULT_CREATE_TIMEOUT, DEFAULT_DELETE_TIMEOUT, DEFAULT_JITTER_RATIO, DEFAULT_POLL_INTERVAL,
};
use serde::{Deserialize, Serialize};

/// Upper bound for either wait budget.
pub const MAX_TIMEOUT_SECS: u64 = 7 * 24 * 60 * 60;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config build error: {0}")]
    Build(#[source] config::ConfigError),

    #[error("config deserialize error: {0}")]
    Deserialize(#[source] config::ConfigError),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub reconciler: ReconcilerSection,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// API backend the reconciler talks to
    #[serde(default)]
    pub backend: BackendConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let r = &self.reconciler;
        if r.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "reconciler.poll_interval_ms must be > 0".into(),
            ));
        }
        if r.create_timeout_secs > MAX_TIMEOUT_SECS || r.delete_timeout_secs > MAX_TIMEOUT_SECS {
            return Err(ConfigError::Invalid(format!(
                "reconciler timeouts must be <= {MAX_TIMEOUT_SECS} seconds"
            )));
        }
        let interval = r.poll_interval();
        if r.create_timeout() < interval {
            return Err(ConfigError::Invalid(
                "reconciler.create_timeout_secs must cover at least one poll interval".into(),
            ));
        }
        if r.delete_timeout() < interval {
            return Err(ConfigError::Invalid(
                "reconciler.delete_timeout_secs must cover at least one poll interval".into(),
            ));
        }
        if !(0.0..1.0).contains(&r.jitter_ratio) {
            return Err(ConfigError::Invalid(
                "reconciler.jitter_ratio must be in [0, 1)".into(),
            ));
        }

        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "logging.level must be one of {valid_levels:?}"
            )));
        }
        Ok(())
    }

    pub fn to_reconciler_config(&self) -> ReconcilerConfig {
        let r = &self.reconciler;
        ReconcilerConfig::fixed(r.poll_interval(), r.create_timeout(), r.delete_timeout())
            .with_jitter_ratio(r.jitter_ratio)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcilerSection {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_create_timeout_secs")]
    pub create_timeout_secs: u64,
    #[serde(default = "default_delete_timeout_secs")]
    pub delete_timeout_secs: u64,
    #[serde(default = "default_jitter_ratio")]
    pub jitter_ratio: f64,
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL.as_millis() as u64
}
fn default_create_timeout_secs() -> u64 {
    DEFAULT_CREATE_TIMEOUT.as_secs()
}
fn default_delete_timeout_secs() -> u64 {
    DEFAULT_DELETE_TIMEOUT.as_secs()
}
fn default_jitter_ratio() -> f64 {
    DEFAULT_JITTER_RATIO
}

impl Default for ReconcilerSection {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            create_timeout_secs: default_create_timeout_secs(),
            delete_timeout_secs: default_delete_timeout_secs(),
            jitter_ratio: default_jitter_ratio(),
        }
    }
}

impl ReconcilerSection {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
    pub fn create_timeout(&self) -> Duration {
        Duration::from_secs(self.create_timeout_secs)
    }
    pub fn delete_timeout(&self) -> Duration {
        Duration::from_secs(self.delete_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}
fn default_log_level() -> String {
    "info".into()
}
impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

pub mod loader {
    use super::{AppConfig, ConfigError};
    use config::{Config, Environment, File};
    use std::path::{Path, PathBuf};

    pub const DEFAULT_CONFIG_PATH: &str = "rolebind.toml";

    /// Loads the config from `path` (or `rolebind.toml`) if the file exists,
    /// applies `ROLEBIND__SECTION__KEY` environment overrides and validates.
    pub fn load_config(path: Option<&str>) -> Result<AppConfig, ConfigError> {
        let mut builder = Config::builder();
        let file = PathBuf::from(path.unwrap_or(DEFAULT_CONFIG_PATH));
        if file.exists() {
            builder = builder.add_source(File::from(file));
        }
        // e.g. ROLEBIND__RECONCILER__POLL_INTERVAL_MS=1000
        builder = builder.add_source(
            Environment::with_prefix("ROLEBIND")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder.build().map_err(ConfigError::Build)?;
        let merged: AppConfig = cfg.try_deserialize().map_err(ConfigError::Deserialize)?;
        merged.validate()?;
        Ok(merged)
    }

    pub fn load_config_with_default_path<P: AsRef<Path>>(
        path: Option<P>,
    ) -> Result<AppConfig, ConfigError> {
        let p = path
            .as_ref()
            .map(|p| p.as_ref().to_string_lossy().to_string());
        load_config(p.as_deref())
    }
}
