//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML/JSON)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → handed to the server and client builders at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the allow-list and injected headers
//!   never change while serving
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::ClientsConfig;
pub use schema::GatewayConfig;
pub use schema::LoggingConfig;
pub use schema::ObservabilityConfig;
pub use schema::ServerConfig;
pub use schema::ServerMode;
pub use schema::SocksProxyConfig;
pub use schema::WhitelistConfig;
