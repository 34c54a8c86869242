mod app_config;

pub use app_config::{
    AppConfig, CacheConfig, LogFormat, LoggingConfig, RotationConfig, StsConfig,
};
