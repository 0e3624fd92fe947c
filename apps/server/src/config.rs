//! Server configuration module.
//!
//! Configuration is loaded from environment variables with fallback to
//! defaults suitable for a single-store development setup.

use std::env;

use rms_core::PricingPolicy;

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP listen port
    pub http_port: u16,

    /// Path to the SQLite database file
    pub database_path: String,

    /// Maximum connections in the SQLite pool
    pub db_max_connections: u32,

    /// Bounded write-lock wait in seconds before a statement fails
    pub db_busy_timeout_secs: u64,

    /// Billing price policy for every checkout
    pub pricing_policy: PricingPolicy,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let config = ServerConfig {
            http_port: env::var("RMS_HTTP_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("RMS_HTTP_PORT".to_string()))?,

            database_path: env::var("RMS_DATABASE_PATH").unwrap_or_else(|_| "rms.db".to_string()),

            db_max_connections: env::var("RMS_DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("RMS_DB_MAX_CONNECTIONS".to_string()))?,

            db_busy_timeout_secs: env::var("RMS_DB_BUSY_TIMEOUT_SECS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("RMS_DB_BUSY_TIMEOUT_SECS".to_string()))?,

            pricing_policy: env::var("RMS_PRICING_POLICY")
                .unwrap_or_else(|_| "discounted_retail".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("RMS_PRICING_POLICY".to_string()))?,
        };

        Ok(config)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
