//! HTTP request gateway library.
//!
//! Callers describe an outbound HTTP request as JSON; the gateway executes it,
//! directly or through a SOCKS5 proxy, and returns the raw upstream bytes or a
//! JSON envelope of the request and response.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod upstream;

pub use config::schema::GatewayConfig;
pub use error::GatewayError;
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
pub use upstream::ClientPair;
