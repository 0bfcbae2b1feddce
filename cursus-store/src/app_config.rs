use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub processor: ProcessorConfig,
    pub webhook: WebhookConfig,
    pub site: SiteConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProcessorConfig {
    pub secret_key: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_api_base() -> String {
    "https://api.stripe.com".to_string()
}

fn default_timeout_seconds() -> u64 {
    10
}

#[derive(Debug, Deserialize, Clone)]
pub struct WebhookConfig {
    pub secret: String,
    #[serde(default = "default_tolerance_seconds")]
    pub tolerance_seconds: i64,
}

fn default_tolerance_seconds() -> i64 {
    300
}

#[derive(Debug, Deserialize, Clone)]
pub struct SiteConfig {
    /// Public origin of the storefront, used for checkout return URLs.
    pub base_url: String,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Environment-specific file, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Eg. `CURSUS_SERVER__PORT=8080` sets server.port
            .add_source(config::Environment::with_prefix("CURSUS").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
