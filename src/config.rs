//! Configuration management for the contact manager.
//!
//! This module handles loading and validating configuration from environment
//! variables, with an optional `.env` file read through `dotenvy`.

use crate::error::{ConfigError, ConfigResult};
use crate::repositories::DEFAULT_BATCH_SIZE;
use std::env;
use std::net::SocketAddr;

/// Configuration for the contact manager.
#[derive(Debug, Clone)]
pub struct Config {
    /// sqlx SQLite connection URL
    pub database_url: String,

    /// HTTP listen address (default: 127.0.0.1:8080)
    pub bind_addr: SocketAddr,

    /// Connection pool size (default: 5)
    pub db_max_connections: u32,

    /// Default chunk size for batched repository writes (default: 100)
    pub batch_size: usize,

    /// Minimum age in years enforced on date of birth (default: 0, disabled)
    pub min_age_years: u32,

    /// Largest accepted CSV upload in bytes (default: 1 MiB)
    pub max_upload_bytes: usize,

    /// Log level used when RUST_LOG is not set (default: "info")
    pub log_level: String,
}

const DEFAULT_DATABASE_URL: &str = "sqlite://contacts.db?mode=rwc";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

impl Config {
    /// Load configuration from environment variables.
    ///
    /// All variables are optional:
    /// - `DATABASE_URL`: SQLite URL (default: `sqlite://contacts.db?mode=rwc`)
    /// - `BIND_ADDR`: listen address (default: `127.0.0.1:8080`)
    /// - `DB_MAX_CONNECTIONS`: pool size, at least 1 (default: 5)
    /// - `BATCH_SIZE`: batch chunk size, at least 1 (default: 100)
    /// - `MIN_AGE_YEARS`: minimum contact age (default: 0)
    /// - `MAX_UPLOAD_BYTES`: upload size limit, at least 1 (default: 1048576)
    /// - `LOG_LEVEL`: logging level (default: "info")
    pub fn from_env() -> ConfigResult<Self> {
        // A missing .env file is fine; a malformed one is not
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(ConfigError::DotenvError(e.to_string()));
            }
        }

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());
        if database_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                var: "DATABASE_URL".to_string(),
                reason: "Cannot be empty".to_string(),
            });
        }

        let bind_addr = Self::parse_bind_addr()?;
        let db_max_connections = Self::parse_env_u32("DB_MAX_CONNECTIONS", 5)?;
        let batch_size = Self::parse_env_usize("BATCH_SIZE", DEFAULT_BATCH_SIZE)?;
        let min_age_years = Self::parse_env_u32("MIN_AGE_YEARS", 0)?;
        let max_upload_bytes = Self::parse_env_usize("MAX_UPLOAD_BYTES", 1024 * 1024)?;

        Self::require_positive("DB_MAX_CONNECTIONS", db_max_connections as usize)?;
        Self::require_positive("BATCH_SIZE", batch_size)?;
        Self::require_positive("MAX_UPLOAD_BYTES", max_upload_bytes)?;

        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Config {
            database_url,
            bind_addr,
            db_max_connections,
            batch_size,
            min_age_years,
            max_upload_bytes,
            log_level,
        })
    }

    fn parse_bind_addr() -> ConfigResult<SocketAddr> {
        let raw = env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
        raw.parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidValue {
                var: "BIND_ADDR".to_string(),
                reason: format!("Must be a socket address like 127.0.0.1:8080, got: {}", raw),
            })
    }

    fn require_positive(var_name: &str, value: usize) -> ConfigResult<()> {
        if value == 0 {
            return Err(ConfigError::InvalidValue {
                var: var_name.to_string(),
                reason: "Must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Parse an environment variable as u32 with a default value.
    fn parse_env_u32(var_name: &str, default: u32) -> ConfigResult<u32> {
        match env::var(var_name) {
            Ok(val) => val.parse::<u32>().map_err(|_| ConfigError::InvalidValue {
                var: var_name.to_string(),
                reason: format!("Must be a positive number, got: {}", val),
            }),
            Err(_) => Ok(default),
        }
    }

    /// Parse an environment variable as usize with a default value.
    fn parse_env_usize(var_name: &str, default: usize) -> ConfigResult<usize> {
        match env::var(var_name) {
            Ok(val) => val.parse::<usize>().map_err(|_| ConfigError::InvalidValue {
                var: var_name.to_string(),
                reason: format!("Must be a positive number, got: {}", val),
            }),
            Err(_) => Ok(default),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            db_max_connections: 5,
            batch_size: DEFAULT_BATCH_SIZE,
            min_age_years: 0,
            max_upload_bytes: 1024 * 1024,
            log_level: "info".to_string(),
        }
    }
}
