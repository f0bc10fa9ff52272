use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub auth: AuthConfig,
    pub amadeus: AmadeusSettings,
    #[serde(default)]
    pub airlabs: AirLabsSettings,
    #[serde(default)]
    pub aviationstack: AviationStackSettings,
    pub stripe: StripeSettings,
    pub email: EmailSettings,
    #[serde(default)]
    pub search: SearchSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiration_seconds: u64,
    pub refresh_expiration_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AmadeusSettings {
    pub api_key: String,
    pub api_secret: String,
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AirLabsSettings {
    pub api_key: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AviationStackSettings {
    pub api_key: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StripeSettings {
    pub secret_key: String,
    pub publishable_key: String,
    pub webhook_secret: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmailSettings {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub username: String,
    pub password: String,
    pub from_address: String,
    #[serde(default)]
    pub enabled: bool,
}

fn default_provider() -> String {
    "amadeus".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchSettings {
    /// Skip live providers entirely and serve synthetic offers. Useful
    /// for demos and environments without API keys.
    #[serde(default)]
    pub use_mock_data: bool,
    /// Which live provider backs flight search: amadeus, aviationstack
    /// or opensky.
    #[serde(default = "default_provider")]
    pub provider: String,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            use_mock_data: false,
            provider: default_provider(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Add in the current environment file (optional)
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Environment variables, e.g. SKYLANE__DATABASE__URL=...
            .add_source(config::Environment::with_prefix("SKYLANE").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
