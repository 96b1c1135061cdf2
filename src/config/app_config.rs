use serde::Deserialize;

use crate::domain::geo_cache::GeoCacheConfig;
use crate::infrastructure::observability::MetricsConfig;

/// Flat variables honored on top of the `APP__` environment for compatibility
const LEGACY_OVERRIDES: &[(&str, &str)] = &[
    ("CACHE_TTL", "cache.ttl_secs"),
    ("SIMILARITY_THRESHOLD", "cache.similarity_threshold"),
    ("DISTANCE_THRESHOLD", "cache.distance_threshold_meters"),
];

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub cache: GeoCacheConfig,
    #[serde(default)]
    pub geocoding: GeocodingConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// External geo provider (Nominatim) settings
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodingConfig {
    #[serde(default = "default_geocoding_base_url")]
    pub base_url: String,
    /// Nominatim's usage policy requires an identifying User-Agent
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_geocoding_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_reverse_radius_meters")]
    pub reverse_radius_meters: f64,
    #[serde(default = "default_autocomplete_limit")]
    pub autocomplete_limit: usize,
}

/// Embedding provider settings
///
/// When `enabled` is false every address is embedded with the local hash
/// embedder of `dimensions` length.
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_embedding_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default = "default_embedding_dimensions")]
    pub dimensions: usize,
    #[serde(default = "default_embedding_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_geocoding_base_url() -> String {
    "https://nominatim.openstreetmap.org".to_string()
}

fn default_user_agent() -> String {
    format!("geo-semantic-cache/{}", env!("CARGO_PKG_VERSION"))
}

fn default_geocoding_timeout_secs() -> u64 {
    5
}

fn default_reverse_radius_meters() -> f64 {
    100.0
}

fn default_autocomplete_limit() -> usize {
    5
}

fn default_embedding_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_embedding_dimensions() -> usize {
    384
}

fn default_embedding_timeout_ms() -> u64 {
    5_000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            base_url: default_geocoding_base_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_geocoding_timeout_secs(),
            reverse_radius_meters: default_reverse_radius_meters(),
            autocomplete_limit: default_autocomplete_limit(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: default_embedding_base_url(),
            api_key: None,
            model: default_embedding_model(),
            dimensions: default_embedding_dimensions(),
            timeout_ms: default_embedding_timeout_ms(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_with(|name| std::env::var(name).ok())
    }

    /// Load configuration, resolving the legacy flat variables through `lookup`
    pub fn load_with<F>(lookup: F) -> Result<Self, config::ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            );

        for &(variable, key) in LEGACY_OVERRIDES {
            builder = builder.set_override_option(key, lookup(variable))?;
        }

        let mut config: Self = builder.build()?.try_deserialize()?;
        config.cache = config.cache.sanitized();

        Ok(config)
    }
}
