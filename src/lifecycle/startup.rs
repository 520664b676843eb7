//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Start the metrics exporter when enabled
//! - Connect the experience store
//! - Bind the listener and serve until shutdown, then close the pool
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listener binds last (traffic only when the store is ready)

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;

use super::shutdown::Shutdown;
use super::signals::spawn_signal_handler;
use crate::config::loader::{load_config, load_from_env, ConfigError};
use crate::config::GatewayConfig;
use crate::delegates::UpstreamError;
use crate::http::HttpServer;
use crate::observability::metrics;
use crate::resilience::retries::RetryPolicy;
use crate::store::{MySqlExperienceStore, StoreError};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("experience store: {0}")]
    Store(#[from] StoreError),

    #[error("upstream client: {0}")]
    Upstream(#[from] UpstreamError),

    #[error("listener: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration from `path` when given, otherwise from the environment.
pub fn load_configuration(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    match path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "Loading configuration file");
            load_config(path)
        }
        None => load_from_env(),
    }
}

/// Run the gateway until a stop signal arrives.
pub async fn run(config: GatewayConfig) -> Result<(), StartupError> {
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let retry = RetryPolicy::from_config(&config.retries);
    let store = Arc::new(MySqlExperienceStore::connect(&config.database, retry).await?);

    let listener = TcpListener::bind(config.listen_address()).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(config, store.clone())?;

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    spawn_signal_handler(shutdown);

    server.run(listener, receiver).await?;

    store.close().await;
    tracing::info!("Experience store closed");
    Ok(())
}
