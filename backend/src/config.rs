//! Configuration management for the Branch Inventory Management System
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with BIM_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT authentication configuration
    pub jwt: JwtConfig,

    /// Stock ledger policy
    pub stock: StockConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    /// Secret key for validating JWT tokens issued by the identity
    /// provider
    pub secret: String,
}

/// Policy flags for the stock ledger.
///
/// The original workflow never enforced a stock floor or the
/// sent-vs-requested bounds; both are surfaced here as explicit choices
/// instead of hardcoded behavior.
#[derive(Debug, Deserialize, Clone)]
pub struct StockConfig {
    /// Permit OUT movements to drive a branch's quantity below zero
    pub allow_negative_stock: bool,

    /// min_stock assigned to lazily created branch stock rows
    pub default_min_stock: i64,

    /// Enforce quantity_sent <= quantity_requested and
    /// quantity_received <= quantity_sent on transfers
    pub enforce_transfer_quantities: bool,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("BIM_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("stock.allow_negative_stock", false)?
            .set_default("stock.default_min_stock", 5)?
            .set_default("stock.enforce_transfer_quantities", false)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (BIM_ prefix)
            .add_source(
                Environment::with_prefix("BIM")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl Default for StockConfig {
    fn default() -> Self {
        Self {
            allow_negative_stock: false,
            default_min_stock: 5,
            enforce_transfer_quantities: false,
        }
    }
}
