//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing)
//!     → middleware/ (header injection, allow-list)
//!     → handlers.rs (/custom, /get, /ip)
//!     → upstream executor
//!     → response.rs (stream bytes or JSON envelope)
//!     → Send to client
//! ```

pub mod handlers;
pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use request::{QueryParams, UuidRequestId, X_REQUEST_ID};
pub use response::{IpAddress, Projection, ResponseEnvelope};
pub use server::{AppState, GatewayServer};
