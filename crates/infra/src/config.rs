//! Configuration loading.
//!
//! Sources, lowest precedence first:
//! 1. defaults in code
//! 2. `config/<environment>.toml` (optional)
//! 3. `MATCON__<SECTION>__<KEY>` environment variables

use config::{ConfigError, Environment, File};
use serde::Deserialize;

use crate::sequence::{CONSUMPTION_SEQUENCE, STOCK_MOVE_SEQUENCE, SequenceFormat, Sequences};

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    /// development, production, ...
    pub environment: String,
    pub server: ServerSettings,
    pub auth: AuthSettings,
    pub logging: LoggingSettings,
    pub consumption: ConsumptionSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthSettings {
    /// HS256 secret for bearer tokens.
    pub jwt_secret: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    /// `EnvFilter` directive, e.g. `info,matcon_infra=debug`.
    pub filter: String,
    pub format: LogFormat,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ConsumptionSettings {
    pub sequence: SequenceFormat,
    pub move_sequence: SequenceFormat,
}

impl ConsumptionSettings {
    pub fn sequences(&self) -> Sequences {
        Sequences::new()
            .with_format(CONSUMPTION_SEQUENCE, self.sequence.clone())
            .with_format(STOCK_MOVE_SEQUENCE, self.move_sequence.clone())
    }
}

impl Settings {
    /// Load for the environment named by `MATCON_ENVIRONMENT` (default: development).
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("MATCON_ENVIRONMENT").unwrap_or_else(|_| "development".into());
        Self::builder(&environment)?.build()?.try_deserialize()
    }

    fn builder(
        environment: &str,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Ok(config::Config::builder()
            .set_default("environment", environment)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("auth.jwt_secret", "change-me")?
            .set_default("logging.filter", "info")?
            .set_default("logging.format", "json")?
            .set_default("consumption.sequence.prefix", "MCR/")?
            .set_default("consumption.sequence.padding", 5)?
            .set_default("consumption.move_sequence.prefix", "INV/")?
            .set_default("consumption.move_sequence.padding", 5)?
            .add_source(File::with_name(&format!("config/{environment}")).required(false))
            .add_source(
                Environment::with_prefix("MATCON")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            ))
    }
}
