use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

use crate::application::routes::app_router;
use crate::application::state::{AppState, AppStateConfig};
use crate::infrastructure::database::Database;
use crate::infrastructure::image_gen::IMAGE_GENERATION_URL;
use crate::infrastructure::object_store::{S3ObjectStore, StoreConfig};

pub struct ServerConfig {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub bucket: String,
    pub region: String,
    pub public_base_url: Option<String>,
    pub image_gen_api_key: String,
}

pub async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let database = Database::connect(&config.database_url)
        .await
        .context("failed to connect to database")?;

    let object_store = S3ObjectStore::from_env(StoreConfig {
        bucket: config.bucket,
        region: config.region,
        public_base_url: config.public_base_url,
    })
    .await;

    let state = AppState::from_database(
        &database,
        AppStateConfig {
            object_store: Arc::new(object_store),
            image_gen_url: IMAGE_GENERATION_URL.to_string(),
            image_gen_api_key: config.image_gen_api_key,
        },
    );

    let app = app_router(state);

    let listener = TcpListener::bind(config.bind_address)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_address))?;

    info!(address = %config.bind_address, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    #[allow(clippy::expect_used)] // startup-only: no signal handler means no clean shutdown
    signal::ctrl_c()
        .await
        .expect("failed to install ctrl-c handler");
    info!("shutdown signal received");
}
