//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Default endpoint used both to test the proxy and to echo the egress IP.
pub const DEFAULT_IP_ECHO_URL: &str = "https://icanhazip.com";

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Inbound server settings (bind address, injected headers, allow-list).
    pub server: ServerConfig,

    /// Log level and destinations.
    pub logging: LoggingConfig,

    /// Outbound HTTP clients.
    pub clients: ClientsConfig,

    /// Metrics exporter settings.
    pub observability: ObservabilityConfig,
}

/// Server run mode. Debug mode lowers the default log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ServerMode {
    #[default]
    Release,
    Debug,
    Test,
}

/// Inbound server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080"). Required.
    pub address: String,

    pub mode: ServerMode,

    /// Headers stamped on every response.
    pub headers: BTreeMap<String, String>,

    /// Caller allow-list.
    pub whitelist: WhitelistConfig,

    /// Upper bound on handling one inbound request, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: String::new(),
            mode: ServerMode::Release,
            headers: BTreeMap::new(),
            whitelist: WhitelistConfig::default(),
            request_timeout_secs: 60,
        }
    }
}

/// Caller allow-list configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct WhitelistConfig {
    /// Reject callers whose address is not listed.
    pub enable: bool,

    /// Exact caller addresses (no CIDR, no prefixes).
    pub addresses: Vec<String>,

    /// Resolve the caller from `X-Forwarded-For` / `X-Real-IP` when present.
    /// Only enable behind a trusted reverse proxy.
    pub trust_forwarded: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). Defaults from the server mode.
    pub level: Option<String>,

    /// Optional log file, opened in append mode.
    pub filepath: Option<String>,

    /// Keep logging to stderr when a file is configured.
    pub stderr: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: None,
            filepath: None,
            stderr: true,
        }
    }
}

impl LoggingConfig {
    /// Effective level: the configured one, else `debug` in debug mode, else `info`.
    pub fn effective_level(&self, mode: ServerMode) -> &str {
        match (&self.level, mode) {
            (Some(level), _) => level,
            (None, ServerMode::Debug) => "debug",
            (None, _) => "info",
        }
    }
}

/// Outbound client configuration shared by the direct and proxied clients.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientsConfig {
    /// Total timeout per outbound call, in seconds.
    pub timeout_secs: u64,

    /// Endpoint queried by `/ip`.
    pub ip_echo_url: String,

    pub proxy: SocksProxyConfig,

    pub cookies: CookiesConfig,
}

impl Default for ClientsConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            ip_echo_url: DEFAULT_IP_ECHO_URL.to_string(),
            proxy: SocksProxyConfig::default(),
            cookies: CookiesConfig::default(),
        }
    }
}

/// SOCKS5 proxy used by the proxied client.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SocksProxyConfig {
    /// Dial network: "tcp", "tcp4" or "tcp6".
    pub protocol: String,

    /// Proxy address ("host:port"). Without it the proxied client is the direct one.
    pub address: Option<String>,

    /// Resolve target hostnames on the proxy (socks5h).
    pub remote_dns: bool,

    /// URL fetched through the proxy at startup.
    pub test: String,
}

impl Default for SocksProxyConfig {
    fn default() -> Self {
        Self {
            protocol: "tcp".to_string(),
            address: None,
            remote_dns: false,
            test: DEFAULT_IP_ECHO_URL.to_string(),
        }
    }
}

/// Cookie persistence.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CookiesConfig {
    /// Keep a cookie jar shared by both clients across requests.
    /// Cookies set for one caller become visible to later callers.
    pub persist: bool,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Enable the Prometheus endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
