use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub kafka: KafkaConfig,
    pub auth: AuthConfig,
    pub business_rules: BusinessRules,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    /// How many times a version-checked seat write is retried before the
    /// request surfaces a conflict.
    #[serde(default = "default_reservation_retries")]
    pub reservation_max_retries: u32,
    /// How far ahead the materializer creates trips for active schedules.
    #[serde(default = "default_days_ahead")]
    pub materialize_days_ahead: u32,
    /// Seconds between materializer sweeps.
    #[serde(default = "default_materializer_interval")]
    pub materializer_interval_seconds: u64,
    /// Flat per-booking service fee, in the same minor currency unit as
    /// schedule prices. Added on top of seat price times seat count.
    #[serde(default)]
    pub booking_fee_amount: i32,
}

fn default_reservation_retries() -> u32 {
    5
}
fn default_days_ahead() -> u32 {
    30
}
fn default_materializer_interval() -> u64 {
    3600
}

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
    pub consumer_group: String,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Environment-specific overrides, optional.
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in.
            .add_source(config::File::with_name("config/local").required(false))
            // `VIARO__SERVER__PORT=9090` style env overrides.
            .add_source(config::Environment::with_prefix("VIARO").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
