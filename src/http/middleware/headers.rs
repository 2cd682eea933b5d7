//! Static response headers.

use std::collections::BTreeMap;

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use thiserror::Error;

use crate::http::middleware::{Exchange, Flow, Interceptor};

/// A configured header that cannot be sent.
#[derive(Debug, Error)]
#[error("invalid response header '{name}'")]
pub struct InvalidHeader {
    pub name: String,
}

/// Stamps a fixed set of headers on every response. Never rejects.
#[derive(Debug, Clone, Default)]
pub struct HeaderInjection {
    headers: HeaderMap,
}

impl HeaderInjection {
    pub fn new(headers: &BTreeMap<String, String>) -> Result<Self, InvalidHeader> {
        let mut map = HeaderMap::with_capacity(headers.len());
        for (name, value) in headers {
            let invalid = || InvalidHeader { name: name.clone() };
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
            let header_value = HeaderValue::from_str(value).map_err(|_| invalid())?;
            map.insert(header_name, header_value);
        }
        Ok(Self { headers: map })
    }
}

impl Interceptor for HeaderInjection {
    fn intercept(&self, exchange: &mut Exchange<'_>) -> Flow {
        let staged = exchange.response_headers_mut();
        for (name, value) in &self.headers {
            staged.insert(name.clone(), value.clone());
        }
        Flow::Continue
    }
}
