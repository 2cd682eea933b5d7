//! HTTP request gateway.
//!
//! Executes caller-described HTTP requests, directly or through a SOCKS5
//! proxy, and returns the upstream bytes or a JSON envelope.
//!
//! ```text
//!     Caller ──GET /custom?request={...}──▶ ┌─────────────────────────────┐
//!                                          │ header injection            │
//!                                          │ allow-list (optional)       │
//!                                          │ decode → build → execute    │──▶ upstream
//!     Caller ◀──── bytes or envelope ───── │ project                     │◀── (direct or SOCKS5)
//!                                          └─────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use request_gateway::config::loader::load_config;
use request_gateway::lifecycle::{startup, Shutdown};
use request_gateway::observability::logging;

#[derive(Parser)]
#[command(name = "request-gateway", version)]
#[command(about = "Execute caller-described HTTP requests, optionally through a SOCKS5 proxy", long_about = None)]
struct Args {
    /// Configuration file to use (.toml or .json).
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = load_config(&args.config).map_err(startup::StartupError::from)?;
    logging::init(&config.logging, config.server.mode)?;

    tracing::info!("request-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        address = %config.server.address,
        timeout_secs = config.clients.timeout_secs,
        proxy = ?config.clients.proxy.address,
        whitelist = config.server.whitelist.enable,
        "Configuration loaded"
    );

    let shutdown = Shutdown::new();
    let _signal_task = shutdown.trigger_on_signal();

    if let Err(e) = startup::start(config, &shutdown).await {
        tracing::error!(error = %e, "Gateway failed");
        return Err(e.into());
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
