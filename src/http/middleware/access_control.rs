//! Access Control Interceptor.
//! Admits only callers whose address is on the allow-list.

use std::collections::HashSet;
use std::net::SocketAddr;

use axum::{body::Body, extract::ConnectInfo, http::Request};

use crate::error::GatewayError;
use crate::http::middleware::{Exchange, Flow, Interceptor};
use crate::observability::metrics;

/// Exact-match caller allow-list. Fixed at startup.
#[derive(Debug, Clone)]
pub struct AllowList {
    addresses: HashSet<String>,
    trust_forwarded: bool,
}

impl AllowList {
    pub fn new(addresses: impl IntoIterator<Item = String>, trust_forwarded: bool) -> Self {
        Self {
            addresses: addresses.into_iter().collect(),
            trust_forwarded,
        }
    }

    pub fn permits(&self, address: &str) -> bool {
        self.addresses.contains(address)
    }
}

impl Interceptor for AllowList {
    fn intercept(&self, exchange: &mut Exchange<'_>) -> Flow {
        match client_ip(exchange.request(), self.trust_forwarded) {
            Some(ip) if self.permits(&ip) => Flow::Continue,
            caller => {
                tracing::warn!(client = ?caller, "Caller not on allow-list");
                metrics::record_rejected("allow_list");
                Flow::Reject(GatewayError::Unauthorized)
            }
        }
    }
}

/// Resolve the caller address.
///
/// With `trust_forwarded`, the first `X-Forwarded-For` entry, then
/// `X-Real-IP`, take precedence over the socket peer.
pub fn client_ip(request: &Request<Body>, trust_forwarded: bool) -> Option<String> {
    if trust_forwarded {
        let headers = request.headers();
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .or_else(|| headers.get("x-real-ip").and_then(|v| v.to_str().ok()))
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(ip) = forwarded {
            return Some(ip.to_string());
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
}
