//! Configuration loading and representation.
//!
//! Layered, later sources win:
//! 1. defaults in code
//! 2. `config/default.toml`, then `config/{RUN_ENV}.toml` (both optional)
//! 3. environment variables prefixed `RETAILERP`, `__` as the section
//!    separator (e.g. `RETAILERP__DATABASE__URL`)
//!
//! A `.env` file is read first when present.

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;

use crate::reconstruction::ReconstructionOptions;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub reconstruction: ReconstructionConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Postgres connection URL. Unset means in-memory stores (dev only).
    pub url: Option<String>,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReconstructionConfig {
    /// Count received purchase-order lines as inbound stock.
    pub include_purchase_receipts: bool,
}

impl AppConfig {
    /// Load from `.env`, config files and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        let run_env = std::env::var("RUN_ENV").unwrap_or_else(|_| "development".into());

        Self::defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{run_env}")).required(false))
            .add_source(
                Environment::with_prefix("RETAILERP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Builder pre-populated with the in-code defaults.
    pub fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("database.max_connections", 5)?
            .set_default("reconstruction.include_purchase_receipts", false)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn reconstruction_options(&self) -> ReconstructionOptions {
        ReconstructionOptions {
            include_purchase_receipts: self.reconstruction.include_purchase_receipts,
        }
    }
}
