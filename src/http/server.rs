//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with the three gateway endpoints
//! - Wire up middleware (request ID, tracing, interceptors, timeout)
//! - Inject the shared client pair into handlers
//! - Serve until the shutdown signal fires

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    error_handling::HandleErrorLayer,
    http::Request,
    middleware,
    routing::get,
    BoxError, Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::{timeout::TimeoutLayer, ServiceBuilder};
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::http::handlers;
use crate::http::middleware::{intercept, InterceptorChain, InvalidHeader};
use crate::http::request::{UuidRequestId, X_REQUEST_ID};
use crate::upstream::ClientPair;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub clients: Arc<ClientPair>,
    pub ip_echo_url: Arc<str>,
}

/// HTTP server for the gateway.
pub struct GatewayServer {
    router: Router,
    config: GatewayConfig,
}

impl GatewayServer {
    /// Create a server around pre-built clients.
    pub fn new(config: GatewayConfig, clients: ClientPair) -> Result<Self, InvalidHeader> {
        let chain = Arc::new(InterceptorChain::from_config(&config.server)?);
        let state = AppState {
            clients: Arc::new(clients),
            ip_echo_url: Arc::from(config.clients.ip_echo_url.as_str()),
        };

        let router = Self::build_router(&config, state, chain);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GatewayConfig, state: AppState, chain: Arc<InterceptorChain>) -> Router {
        Router::new()
            .route("/custom", get(handlers::custom))
            .route("/get", get(handlers::get))
            .route("/ip", get(handlers::ip_address))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(HandleErrorLayer::new(timed_out))
                    .layer(TimeoutLayer::new(Duration::from_secs(
                        config.server.request_timeout_secs,
                    ))),
            )
            .layer(middleware::from_fn_with_state(chain, intercept))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get(X_REQUEST_ID)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    request_id = %request_id,
                )
            }))
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
    }

    /// A clone of the router, for serving in-process without a listener.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            whitelist = self.config.server.whitelist.enable,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

/// The timeout layer is the only fallible one; render it as an error envelope.
async fn timed_out(err: BoxError) -> GatewayError {
    tracing::debug!(error = %err, "Inbound request deadline elapsed");
    GatewayError::Timeout
}
