//! The direct and proxied outbound clients.
//!
//! # Responsibilities
//! - Build both clients from configuration with one shared timeout
//! - Route the proxied client through a SOCKS5 proxy when one is configured
//! - Pin the proxy to IPv4 or IPv6 when the protocol is `tcp4` or `tcp6`
//! - Alias the proxied client to the direct one when none is
//! - Verify the proxy at startup
//!
//! # Design Decisions
//! - Built once and shared behind an `Arc`; `reqwest::Client` is itself a
//!   cheap handle over a connection pool, safe for concurrent use
//! - Cookie persistence is off unless configured; when on, both clients share
//!   one jar, so cookies set for one caller are sent on behalf of later ones

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{cookie::Jar, Client, Proxy};
use thiserror::Error;
use tokio::net::lookup_host;

use crate::config::{ClientsConfig, SocksProxyConfig};

/// Errors raised while building or verifying the clients.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to build http client: {0}")]
    Build(#[source] reqwest::Error),

    #[error("failed to create proxy dialer for '{address}': {source}")]
    Proxy {
        address: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to resolve proxy '{address}': {source}")]
    Resolve {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("proxy '{address}' has no address usable over {protocol}")]
    NoAddressForProtocol { address: String, protocol: String },

    #[error("invalid proxy configuration; request to {url} failed: {source}")]
    Verify {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Which of the two clients serves a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Direct,
    Proxied,
}

impl Transport {
    /// `noproxy` present selects the direct path; proxied is the default.
    pub fn select(noproxy: bool) -> Self {
        if noproxy {
            Transport::Direct
        } else {
            Transport::Proxied
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transport::Direct => f.write_str("direct"),
            Transport::Proxied => f.write_str("proxied"),
        }
    }
}

/// The pair of outbound clients handed to every handler.
#[derive(Debug, Clone)]
pub struct ClientPair {
    normal: Client,
    proxied: Client,
    proxy_configured: bool,
}

impl ClientPair {
    /// Pair two pre-built clients. They should share a timeout.
    pub fn new(normal: Client, proxied: Client) -> Self {
        Self {
            normal,
            proxied,
            proxy_configured: true,
        }
    }

    /// A pair whose proxied member is the direct client.
    pub fn direct_only(normal: Client) -> Self {
        Self {
            proxied: normal.clone(),
            normal,
            proxy_configured: false,
        }
    }

    /// Build both clients from configuration.
    pub async fn from_config(config: &ClientsConfig) -> Result<Self, ClientError> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let jar = config.cookies.persist.then(|| Arc::new(Jar::default()));
        if jar.is_some() {
            tracing::warn!("Persisting client cookies between requests");
        }

        let normal = client_builder(timeout, jar.as_ref())
            .build()
            .map_err(ClientError::Build)?;

        let Some(address) = &config.proxy.address else {
            tracing::warn!("clients.proxy.address not specified, not creating a proxied client");
            return Ok(Self::direct_only(normal));
        };

        let dial = dial_address(&config.proxy, address).await?;
        let scheme = if config.proxy.remote_dns { "socks5h" } else { "socks5" };
        let proxy = Proxy::all(format!("{scheme}://{dial}")).map_err(|source| {
            ClientError::Proxy {
                address: address.clone(),
                source,
            }
        })?;
        let proxied = client_builder(timeout, jar.as_ref())
            .proxy(proxy)
            .build()
            .map_err(ClientError::Build)?;

        tracing::debug!(
            proxy = %address,
            dial = %dial,
            protocol = %config.proxy.protocol,
            timeout_secs = config.timeout_secs,
            "Configured proxied http client"
        );

        Ok(Self::new(normal, proxied))
    }

    /// The client serving the given transport.
    pub fn client(&self, transport: Transport) -> &Client {
        match transport {
            Transport::Direct => &self.normal,
            Transport::Proxied => &self.proxied,
        }
    }

    /// Whether the proxied client actually goes through a proxy.
    pub fn proxy_configured(&self) -> bool {
        self.proxy_configured
    }

    /// Fetch `test_url` through the proxied client. Only the transport outcome
    /// counts; any HTTP status is accepted.
    pub async fn verify_proxy(&self, test_url: &str) -> Result<(), ClientError> {
        if !self.proxy_configured {
            return Ok(());
        }

        tracing::debug!(url = %test_url, "Testing proxy");
        self.proxied
            .get(test_url)
            .send()
            .await
            .map(|_| ())
            .map_err(|source| ClientError::Verify {
                url: test_url.to_string(),
                source,
            })
    }
}

/// The `host:port` the proxied client dials. `tcp` leaves resolution to the
/// connector; `tcp4` and `tcp6` pin the proxy to its first address of that
/// family.
async fn dial_address(proxy: &SocksProxyConfig, address: &str) -> Result<String, ClientError> {
    let wants_v4 = match proxy.protocol.as_str() {
        "tcp4" => true,
        "tcp6" => false,
        _ => return Ok(address.to_string()),
    };

    let resolved = lookup_host(address)
        .await
        .map_err(|source| ClientError::Resolve {
            address: address.to_string(),
            source,
        })?
        .find(|addr| addr.is_ipv4() == wants_v4)
        .ok_or_else(|| ClientError::NoAddressForProtocol {
            address: address.to_string(),
            protocol: proxy.protocol.clone(),
        })?;
    Ok(resolved.to_string())
}

fn client_builder(timeout: Duration, jar: Option<&Arc<Jar>>) -> reqwest::ClientBuilder {
    let builder = Client::builder().timeout(timeout);
    match jar {
        Some(jar) => builder.cookie_provider(Arc::clone(jar)),
        None => builder,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_selection() {
        assert_eq!(Transport::select(true), Transport::Direct);
        assert_eq!(Transport::select(false), Transport::Proxied);
        assert_eq!(Transport::Proxied.to_string(), "proxied");
    }

    #[tokio::test]
    async fn test_without_proxy_aliases_direct() {
        let pair = ClientPair::from_config(&ClientsConfig::default()).await.unwrap();
        assert!(!pair.proxy_configured());
    }

    #[tokio::test]
    async fn test_with_proxy_address() {
        let mut config = ClientsConfig::default();
        config.proxy.address = Some("127.0.0.1:1080".into());
        config.cookies.persist = true;

        let pair = ClientPair::from_config(&config).await.unwrap();
        assert!(pair.proxy_configured());
    }

    #[tokio::test]
    async fn test_protocol_pins_address_family() {
        let mut proxy = SocksProxyConfig::default();

        proxy.protocol = "tcp".into();
        assert_eq!(dial_address(&proxy, "localhost:1080").await.unwrap(), "localhost:1080");

        proxy.protocol = "tcp4".into();
        assert_eq!(dial_address(&proxy, "127.0.0.1:1080").await.unwrap(), "127.0.0.1:1080");
        assert_eq!(
            dial_address(&proxy, "[::1]:1080").await.unwrap_err().to_string(),
            "proxy '[::1]:1080' has no address usable over tcp4"
        );

        proxy.protocol = "tcp6".into();
        assert_eq!(dial_address(&proxy, "[::1]:1080").await.unwrap(), "[::1]:1080");
        assert!(matches!(
            dial_address(&proxy, "127.0.0.1:1080").await,
            Err(ClientError::NoAddressForProtocol { .. })
        ));
    }

    #[tokio::test]
    async fn test_from_config_rejects_family_mismatch() {
        let mut config = ClientsConfig::default();
        config.proxy.address = Some("127.0.0.1:1080".into());
        config.proxy.protocol = "tcp6".into();

        let err = ClientPair::from_config(&config).await.unwrap_err();
        assert!(matches!(err, ClientError::NoAddressForProtocol { .. }));
    }

    #[tokio::test]
    async fn test_verify_fails_for_unreachable_proxy() {
        let mut config = ClientsConfig::default();
        config.timeout_secs = 2;
        // Nothing listens on port 9 of the loopback interface.
        config.proxy.address = Some("127.0.0.1:9".into());

        let pair = ClientPair::from_config(&config).await.unwrap();
        let err = pair.verify_proxy("http://127.0.0.1:9/").await.unwrap_err();
        assert!(matches!(err, ClientError::Verify { .. }));
    }

    #[tokio::test]
    async fn test_verify_skipped_without_proxy() {
        let pair = ClientPair::direct_only(Client::new());
        assert!(pair.verify_proxy("http://127.0.0.1:9/").await.is_ok());
    }
}
