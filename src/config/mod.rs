//! Application configuration

mod app_config;

pub use app_config::{
    AppConfig, EmbeddingConfig, GeocodingConfig, LogFormat, LoggingConfig, ServerConfig,
};
