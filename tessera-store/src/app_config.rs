use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub kafka: KafkaConfig,
    pub auth: AuthConfig,
    pub booking: BookingRules,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BookingRules {
    pub max_tickets_per_booking: i32,
    #[serde(default = "default_retry_attempts")]
    pub store_retry_attempts: u32,
    #[serde(default = "default_retry_backoff_ms")]
    pub store_retry_backoff_ms: u64,
}

fn default_retry_attempts() -> u32 { 3 }
fn default_retry_backoff_ms() -> u64 { 50 }

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiration_seconds: u64,
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
pub struct KafkaConfig {
    pub brokers: String,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Add in the current environment file
            // Default to 'development' env
            // Note that this file is _optional_
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add in a local configuration file
            // This file shouldn't be checked in to git
            .add_source(config::File::with_name("config/local").required(false))
            // Add in settings from the environment (with a prefix of TESSERA)
            // Eg.. `TESSERA_SERVER__PORT=8081` would set the server port
            .add_source(config::Environment::with_prefix("TESSERA").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
