//! Contact Manager - Main entry point
//!
//! Loads configuration, opens the SQLite database and serves the HTTP API.

use anyhow::{Context, Result};
use contact_manager::repositories::schema::{create_connection_pool, init_schema};
use contact_manager::services::ContactService;
use contact_manager::{AppState, Config, ContactServiceImpl, SqliteRepository, ValidationRules};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration before logging so LOG_LEVEL can seed the filter
    let config = Config::from_env();

    let fallback = config
        .as_ref()
        .map(|cfg| cfg.log_level.clone())
        .unwrap_or_else(|_| "info".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = match config {
        Ok(cfg) => {
            info!("Configuration loaded successfully");
            cfg
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    let pool = create_connection_pool(&config.database_url, config.db_max_connections)
        .await
        .with_context(|| format!("Failed to connect to {}", config.database_url))?;
    init_schema(&pool)
        .await
        .context("Failed to initialize database schema")?;
    info!("Database ready at {}", config.database_url);

    let repository = SqliteRepository::new(pool.clone()).with_batch_size(config.batch_size);
    let contacts = Arc::new(ContactServiceImpl::new(repository)) as Arc<dyn ContactService>;

    let state = AppState::new(
        contacts,
        ValidationRules::with_minimum_age(config.min_age_years),
        config.max_upload_bytes,
    );

    contact_manager::server::run_server(config.bind_addr, state).await?;

    pool.close().await;
    info!("Contact Manager shutdown complete");
    Ok(())
}
