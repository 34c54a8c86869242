use serde::Deserialize;
use std::time::Duration;

use crate::infrastructure::credentials::params::DEFAULT_REGION;
use crate::infrastructure::{RotationTiming, StsEndpointPolicy, StsSettings};

const ENV_PREFIX: &str = "AWS_CONNECTOR";

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub cache: CacheConfig,
    pub sts: StsConfig,
    pub rotation: RotationConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

/// Resolved-holder cache
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_secs: u64,
    pub capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 900,
            capacity: 1000,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StsConfig {
    pub default_region: String,
    /// Empty means every AWS STS endpoint; `[aws]` inside a custom list adds them
    pub endpoint_allowlist: Vec<String>,
}

impl Default for StsConfig {
    fn default() -> Self {
        Self {
            default_region: DEFAULT_REGION.to_string(),
            endpoint_allowlist: Vec::new(),
        }
    }
}

impl StsConfig {
    pub fn settings(&self) -> StsSettings {
        StsSettings::new(
            self.default_region.clone(),
            StsEndpointPolicy::new(self.endpoint_allowlist.clone()),
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RotationConfig {
    pub confirm_timeout_secs: u64,
    pub confirm_poll_interval_ms: u64,
    pub old_key_preserve_hours: i64,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            confirm_timeout_secs: 30,
            confirm_poll_interval_ms: 1000,
            old_key_preserve_hours: 24,
        }
    }
}

impl RotationConfig {
    pub fn timing(&self) -> RotationTiming {
        RotationTiming {
            confirm_timeout: Duration::from_secs(self.confirm_timeout_secs),
            poll_interval: Duration::from_millis(self.confirm_poll_interval_ms),
        }
    }

    pub fn old_key_preserve_time(&self) -> chrono::Duration {
        chrono::Duration::hours(self.old_key_preserve_hours)
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("sts.endpoint_allowlist")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load, falling back to defaults. The load error is handed back so the
    /// caller can report it once logging is up.
    pub fn load_or_default() -> (Self, Option<config::ConfigError>) {
        Self::or_default(Self::load())
    }

    fn or_default(loaded: Result<Self, config::ConfigError>) -> (Self, Option<config::ConfigError>) {
        match loaded {
            Ok(config) => (config, None),
            Err(e) => (Self::default(), Some(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.logging.level, "info");
        assert_eq!(config.cache.ttl(), Duration::from_secs(900));
        assert_eq!(config.cache.capacity, 1000);
        assert_eq!(config.sts.default_region, "us-east-1");
        assert!(config.sts.endpoint_allowlist.is_empty());
        assert_eq!(config.rotation.timing().confirm_timeout, Duration::from_secs(30));
        assert_eq!(config.rotation.old_key_preserve_time(), chrono::Duration::hours(24));
    }

    #[test]
    fn test_partial_sections_fall_back_to_defaults() {
        let config: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(
                r#"
                [sts]
                endpoint_allowlist = ["http://localhost:4566", "[aws]"]

                [rotation]
                confirm_timeout_secs = 5
                "#,
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.sts.default_region, "us-east-1");
        assert_eq!(config.sts.endpoint_allowlist.len(), 2);
        assert_eq!(config.rotation.confirm_timeout_secs, 5);
        assert_eq!(config.rotation.confirm_poll_interval_ms, 1000);

        let settings = config.sts.settings();
        assert_eq!(settings.default_region(), "us-east-1");
    }

    #[test]
    fn test_malformed_value_falls_back_with_error() {
        let loaded = config::Config::builder()
            .add_source(config::File::from_str(
                r#"
                [cache]
                ttl_secs = "fifteen minutes"
                "#,
                config::FileFormat::Toml,
            ))
            .build()
            .and_then(|c| c.try_deserialize::<AppConfig>());

        let (config, error) = AppConfig::or_default(loaded);

        assert!(error.is_some());
        assert_eq!(config.cache.ttl_secs, 900);
    }
}
