use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub cache: CacheSettings,
    pub scoring: ScoringSettings,
    pub providers: ProviderSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_embedding_capacity")]
    pub embedding_capacity: u64,
    /// JSON snapshot path; no persistence when unset
    pub embedding_path: Option<String>,
}

fn default_embedding_capacity() -> u64 {
    10_000
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoringSettings {
    #[serde(default)]
    pub weights: WeightsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeightsConfig {
    #[serde(default = "default_interest_weight")]
    pub interest: f64,
    #[serde(default = "default_location_weight")]
    pub location: f64,
    #[serde(default = "default_skills_weight")]
    pub skills: f64,
    #[serde(default = "default_preferences_weight")]
    pub preferences: f64,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            interest: default_interest_weight(),
            location: default_location_weight(),
            skills: default_skills_weight(),
            preferences: default_preferences_weight(),
        }
    }
}

fn default_interest_weight() -> f64 { 0.35 }
fn default_location_weight() -> f64 { 0.25 }
fn default_skills_weight() -> f64 { 0.20 }
fn default_preferences_weight() -> f64 { 0.20 }

/// Backend selection for the three capability interfaces
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProviderSettings {
    #[serde(default)]
    pub routing: RoutingProviderSettings,
    #[serde(default)]
    pub embedding: EmbeddingProviderSettings,
    #[serde(default)]
    pub narration: NarrationProviderSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoutingProviderSettings {
    /// "none" (heuristic fallback only) or "http"
    #[serde(default = "default_routing_mode")]
    pub mode: String,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RoutingProviderSettings {
    fn default() -> Self {
        Self {
            mode: default_routing_mode(),
            base_url: None,
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingProviderSettings {
    /// "keyword" or "http"
    #[serde(default = "default_embedding_mode")]
    pub mode: String,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingProviderSettings {
    fn default() -> Self {
        Self {
            mode: default_embedding_mode(),
            base_url: None,
            api_key: None,
            model: default_embedding_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NarrationProviderSettings {
    /// "template" or "http"
    #[serde(default = "default_narration_mode")]
    pub mode: String,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    #[serde(default = "default_narration_model")]
    pub model: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for NarrationProviderSettings {
    fn default() -> Self {
        Self {
            mode: default_narration_mode(),
            base_url: None,
            api_key: None,
            model: default_narration_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_routing_mode() -> String { "none".to_string() }
fn default_embedding_mode() -> String { "keyword".to_string() }
fn default_narration_mode() -> String { "template".to_string() }
fn default_embedding_model() -> String { "text-embedding-3-small".to_string() }
fn default_narration_model() -> String { "gpt-3.5-turbo".to_string() }
fn default_timeout_secs() -> u64 { 10 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Environment variables (prefixed with LEHR_)
    pub fn load() -> Result<Self, ConfigError> {
        let mut settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            // Local config file for development overrides
            .add_source(File::with_name("config/local").required(false))
            // e.g., LEHR_SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("LEHR")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings = substitute_env_vars(settings)?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("LEHR")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }
}

/// Apply well-known environment variables as overrides.
/// DATABASE_URL takes precedence over LEHR_DATABASE__URL.
fn substitute_env_vars(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let database_url = env::var("DATABASE_URL")
        .or_else(|_| env::var("LEHR_DATABASE__URL"))
        .unwrap_or_else(|_| "sqlite://lehrmatch.db".to_string());

    let mut builder = Config::builder()
        .add_source(settings)
        .set_override("database.url", database_url)?;

    if let Ok(api_key) = env::var("ROUTING_API_KEY") {
        builder = builder.set_override("providers.routing.api_key", api_key)?;
    }
    if let Ok(api_key) = env::var("OPENAI_API_KEY") {
        builder = builder.set_override("providers.embedding.api_key", api_key.clone())?;
        builder = builder.set_override("providers.narration.api_key", api_key)?;
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights() {
        let weights = WeightsConfig::default();
        assert_eq!(weights.interest, 0.35);
        assert_eq!(weights.location, 0.25);
        assert_eq!(weights.skills, 0.20);
        assert_eq!(weights.preferences, 0.20);
    }

    #[test]
    fn test_default_providers() {
        let providers = ProviderSettings::default();
        assert_eq!(providers.routing.mode, "none");
        assert_eq!(providers.embedding.mode, "keyword");
        assert_eq!(providers.narration.mode, "template");
    }

    #[test]
    fn test_default_logging() {
        assert_eq!(default_log_level(), "info");
        assert_eq!(default_log_format(), "json");
    }

    #[test]
    fn test_load_from_reads_logging_section() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(
            &path,
            r#"
[server]
host = "127.0.0.1"
port = 8080

[database]
url = "sqlite::memory:"

[cache]

[scoring]

[providers]

[logging]
level = "debug"
format = "pretty"
"#,
        )
        .unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.logging.level, "debug");
        assert_eq!(settings.logging.format, "pretty");
    }
}
