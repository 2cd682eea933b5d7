//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the server can bind and the proxy can be dialed
//! - Validate value ranges (timeouts > 0, outbound timeout inside the inbound one)
//! - Reject injected headers that could never be sent
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::{HeaderName, HeaderValue};
use thiserror::Error;

use crate::config::schema::GatewayConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("server.address must be specified")]
    MissingServerAddress,

    #[error("server.address '{0}' is not a socket address")]
    InvalidServerAddress(String),

    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error(
        "server.request_timeout_secs ({server}) must exceed clients.timeout_secs ({clients})"
    )]
    TimeoutOrder { server: u64, clients: u64 },

    #[error("server.headers contains an invalid header '{0}'")]
    InvalidHeader(String),

    #[error("server.whitelist is enabled but lists no addresses")]
    EmptyWhitelist,

    #[error("clients.proxy.protocol '{0}' is not one of tcp, tcp4, tcp6")]
    UnsupportedProxyProtocol(String),

    #[error("clients.proxy.address '{0}' is not host:port")]
    InvalidProxyAddress(String),

    #[error("{field} '{value}' is not an absolute http(s) URL")]
    InvalidUrl { field: &'static str, value: String },

    #[error("observability.metrics_address '{0}' is not a socket address")]
    InvalidMetricsAddress(String),
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let server = &config.server;
    if server.address.trim().is_empty() {
        errors.push(ValidationError::MissingServerAddress);
    } else if server.address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidServerAddress(server.address.clone()));
    }
    if server.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("server.request_timeout_secs"));
    }
    for (name, value) in &server.headers {
        let valid = HeaderName::from_bytes(name.as_bytes()).is_ok()
            && HeaderValue::from_str(value).is_ok();
        if !valid {
            errors.push(ValidationError::InvalidHeader(name.clone()));
        }
    }
    if server.whitelist.enable && server.whitelist.addresses.is_empty() {
        errors.push(ValidationError::EmptyWhitelist);
    }

    let clients = &config.clients;
    if clients.timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("clients.timeout_secs"));
    }
    if clients.timeout_secs > 0 && server.request_timeout_secs <= clients.timeout_secs {
        errors.push(ValidationError::TimeoutOrder {
            server: server.request_timeout_secs,
            clients: clients.timeout_secs,
        });
    }
    check_url("clients.ip_echo_url", &clients.ip_echo_url, &mut errors);

    let proxy = &clients.proxy;
    if !matches!(proxy.protocol.as_str(), "tcp" | "tcp4" | "tcp6") {
        errors.push(ValidationError::UnsupportedProxyProtocol(proxy.protocol.clone()));
    }
    if let Some(address) = &proxy.address {
        if !is_host_port(address) {
            errors.push(ValidationError::InvalidProxyAddress(address.clone()));
        }
        check_url("clients.proxy.test", &proxy.test, &mut errors);
    }

    let observability = &config.observability;
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(field: &'static str, value: &str, errors: &mut Vec<ValidationError>) {
    let valid = url::Url::parse(value)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.has_host())
        .unwrap_or(false);
    if !valid {
        errors.push(ValidationError::InvalidUrl {
            field,
            value: value.to_string(),
        });
    }
}

fn is_host_port(address: &str) -> bool {
    match address.rsplit_once(':') {
        Some((host, port)) => !host.is_empty() && port.parse::<u16>().is_ok(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> GatewayConfig {
        let mut config = GatewayConfig::default();
        config.server.address = "127.0.0.1:8080".into();
        config
    }

    #[test]
    fn test_valid_config() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = GatewayConfig::default();
        config.clients.timeout_secs = 0;
        config.clients.proxy.protocol = "udp".into();
        config.server.whitelist.enable = true;

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::MissingServerAddress));
        assert!(errors.contains(&ValidationError::ZeroTimeout("clients.timeout_secs")));
        assert!(errors.contains(&ValidationError::UnsupportedProxyProtocol("udp".into())));
        assert!(errors.contains(&ValidationError::EmptyWhitelist));
    }

    #[test]
    fn test_inbound_timeout_must_exceed_client_timeout() {
        let mut config = valid_config();
        config.server.request_timeout_secs = 1;
        config.clients.timeout_secs = 3;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::TimeoutOrder {
                server: 1,
                clients: 3
            }]
        );

        config.server.request_timeout_secs = 3;
        assert!(validate_config(&config).is_err());

        config.server.request_timeout_secs = 4;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_proxy_address() {
        let mut config = valid_config();
        config.clients.proxy.address = Some("127.0.0.1:1080".into());
        assert!(validate_config(&config).is_ok());

        config.clients.proxy.address = Some("localhost".into());
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::InvalidProxyAddress("localhost".into())]);
    }

    #[test]
    fn test_invalid_injected_header() {
        let mut config = valid_config();
        config.server.headers.insert("bad header".into(), "1".into());
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::InvalidHeader("bad header".into())]);
    }
}
