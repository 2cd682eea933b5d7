//! Outbound request subsystem.
//!
//! # Data Flow
//! ```text
//! `request` query value
//!     → spec.rs (JSON → RequestSpec)
//!     → clients.rs (pick direct or proxied client)
//!     → builder.rs (RequestSpec → OutboundRequest)
//!     → executor.rs (send once, read body, project)
//! ```

pub mod builder;
pub mod clients;
pub mod executor;
pub mod spec;

pub use builder::OutboundRequest;
pub use clients::{ClientError, ClientPair, Transport};
pub use executor::ProxyOptions;
pub use spec::RequestSpec;
