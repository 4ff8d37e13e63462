use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{Level, info};
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod lookup;
mod models;
mod repositories;
mod routes;
mod state;
mod stats;
#[cfg(test)]
mod test_support;

use common::{FirebaseConfig, FirebaseStore, MemoryStore, RecordStore};

use crate::{
    config::{AppConfig, StoreBackend},
    repositories::UserRepository,
    state::AppState,
};

/// Build the single store client shared by every request
fn init_store(config: &AppConfig) -> Result<Arc<dyn RecordStore>> {
    match config.store_backend {
        StoreBackend::Firebase => {
            let firebase_config = FirebaseConfig::from_env()?;
            Ok(Arc::new(FirebaseStore::new(&firebase_config)?))
        }
        StoreBackend::File => {
            let path = config
                .seed_file
                .as_deref()
                .context("DASHBOARD_SEED_FILE must be set for the file store backend")?;
            Ok(Arc::new(MemoryStore::from_json_file(path)?))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(Level::INFO.as_str())),
        )
        .init();

    info!("Starting dashboard service");

    let app_config = AppConfig::load()?;
    let settings = app_config.stats_settings()?;

    let store = init_store(&app_config)?;

    // Check store connectivity
    if store.health_check().await? {
        info!("Record store connection successful");
    } else {
        anyhow::bail!("Failed to reach the record store");
    }

    let user_repository = UserRepository::new(store);
    let app_state = AppState::new(user_repository, settings);

    info!("Dashboard service initialized successfully");

    // Start the web server
    let app = routes::create_router(app_state);

    let listener = tokio::net::TcpListener::bind(&app_config.bind_address).await?;
    info!("Dashboard service listening on {}", app_config.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
