//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the client pair and prove the proxy works
//! - Start the metrics exporter when enabled
//! - Bind the listener and serve until shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - The listener binds last (traffic only when ready)

use std::net::SocketAddr;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::loader::ConfigError;
use crate::config::GatewayConfig;
use crate::http::middleware::InvalidHeader;
use crate::http::GatewayServer;
use crate::lifecycle::Shutdown;
use crate::observability::logging::LoggingError;
use crate::observability::metrics;
use crate::upstream::{ClientError, ClientPair};

/// Fatal errors raised before or while serving.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read configuration file; {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Logging(#[from] LoggingError),

    #[error(transparent)]
    Clients(#[from] ClientError),

    #[error(transparent)]
    Headers(#[from] InvalidHeader),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Build both clients and, when a proxy is configured, fetch the test URL
/// through it.
pub async fn build_clients(config: &GatewayConfig) -> Result<ClientPair, ClientError> {
    tracing::debug!("Configuring http clients");
    let clients = ClientPair::from_config(&config.clients).await?;
    clients.verify_proxy(&config.clients.proxy.test).await?;
    Ok(clients)
}

/// Bring the gateway up and serve until `shutdown` fires.
pub async fn start(config: GatewayConfig, shutdown: &Shutdown) -> Result<(), StartupError> {
    let clients = build_clients(&config).await?;

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let address = config.server.address.clone();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind { address, source })?;

    let server = GatewayServer::new(config, clients)?;
    tracing::debug!("Finished initializing successfully");

    server
        .run(listener, shutdown.subscribe())
        .await
        .map_err(StartupError::Serve)
}
