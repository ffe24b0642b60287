//! Configuration management for the Pour Choices server
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (config/development.toml, config/production.toml)
//! 3. Environment variable overrides with POUR_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;
use shared::RevealEngine;

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

    /// Blind tasting tuning
    pub tasting: TastingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,

    /// Allowed browser origin for CORS; any origin when unset
    pub frontend_url: Option<String>,
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
    /// Secret key for signing JWT tokens
    pub secret: String,

    /// Token lifetime in seconds
    pub token_expiry: i64,

    /// Token lifetime in seconds when the user chose to stay logged in
    pub extended_token_expiry: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TastingConfig {
    /// Percentile points a favorite must beat its community standing by
    pub upset_threshold: f64,

    /// Delay between slot reveals, in milliseconds
    pub reveal_step_delay_ms: u64,

    /// Delay before scores are shown after the last reveal, in milliseconds
    pub reveal_scores_delay_ms: u64,
}

impl TastingConfig {
    pub fn reveal_engine(&self) -> RevealEngine {
        RevealEngine::new()
            .with_upset_threshold(self.upset_threshold)
            .with_pacing(self.reveal_step_delay_ms, self.reveal_scores_delay_ms)
    }
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("POUR_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("jwt.token_expiry", 7 * 24 * 3600)?
            .set_default("jwt.extended_token_expiry", 30 * 24 * 3600)?
            .set_default("tasting.upset_threshold", shared::DEFAULT_UPSET_THRESHOLD)?
            .set_default("tasting.reveal_step_delay_ms", shared::DEFAULT_STEP_DELAY_MS)?
            .set_default("tasting.reveal_scores_delay_ms", shared::DEFAULT_SCORES_DELAY_MS)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (POUR_ prefix)
            .add_source(
                Environment::with_prefix("POUR")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl Default for TastingConfig {
    fn default() -> Self {
        Self {
            upset_threshold: shared::DEFAULT_UPSET_THRESHOLD,
            reveal_step_delay_ms: shared::DEFAULT_STEP_DELAY_MS,
            reveal_scores_delay_ms: shared::DEFAULT_SCORES_DELAY_MS,
        }
    }
}
