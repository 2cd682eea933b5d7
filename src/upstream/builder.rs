//! Turns a [`RequestSpec`] into a request bound to one client.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, COOKIE};
use reqwest::{Client, Method, Request};
use url::Url;

use crate::error::GatewayError;
use crate::upstream::spec::RequestSpec;

/// A ready-to-send outbound request. Built once per inbound call and consumed
/// by the single attempt made with it.
#[derive(Debug)]
pub struct OutboundRequest {
    inner: Request,
}

impl OutboundRequest {
    /// Build the request for `spec` on `client`.
    ///
    /// Fails with [`GatewayError::InvalidMethodOrUrl`] for an illegal method
    /// token, a URL that is not absolute http(s) with a host, or a header
    /// that cannot be represented on the wire.
    pub fn build(spec: &RequestSpec, client: &Client) -> Result<Self, GatewayError> {
        let method = parse_method(&spec.method)?;
        let url = parse_url(&spec.url)?;

        let mut headers = HeaderMap::with_capacity(spec.headers.len() + 1);
        for (name, value) in &spec.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
                GatewayError::InvalidMethodOrUrl(format!("invalid header field name {:?}", name))
            })?;
            let header_value = HeaderValue::from_bytes(value.as_bytes()).map_err(|_| {
                GatewayError::InvalidMethodOrUrl(format!(
                    "invalid header field value for {:?}",
                    name
                ))
            })?;
            headers.insert(header_name, header_value);
        }

        if !spec.cookies.is_empty() {
            let mut cookie = headers
                .get(COOKIE)
                .map(|v| v.as_bytes().to_vec())
                .unwrap_or_default();
            for (name, value) in &spec.cookies {
                if !is_cookie_name(name) {
                    return Err(GatewayError::InvalidMethodOrUrl(format!(
                        "invalid cookie name {:?}",
                        name
                    )));
                }
                if !cookie.is_empty() {
                    cookie.extend_from_slice(b"; ");
                }
                cookie.extend_from_slice(name.as_bytes());
                cookie.push(b'=');
                cookie.extend_from_slice(sanitize_cookie_value(value).as_bytes());
            }
            let value = HeaderValue::from_bytes(&cookie).map_err(|_| {
                GatewayError::InvalidMethodOrUrl("invalid cookie header".to_string())
            })?;
            headers.insert(COOKIE, value);
        }

        let mut builder = client.request(method, url).headers(headers);
        if !spec.body.is_empty() {
            builder = builder.body(spec.body.clone());
        }

        let inner = builder
            .build()
            .map_err(|e| GatewayError::InvalidMethodOrUrl(e.to_string()))?;
        Ok(Self { inner })
    }

    pub fn method(&self) -> &Method {
        self.inner.method()
    }

    pub fn url(&self) -> &Url {
        self.inner.url()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    pub fn into_inner(self) -> Request {
        self.inner
    }
}

fn parse_method(raw: &str) -> Result<Method, GatewayError> {
    if raw.is_empty() {
        return Ok(Method::GET);
    }
    Method::from_bytes(raw.as_bytes())
        .map_err(|_| GatewayError::InvalidMethodOrUrl(format!("invalid method {:?}", raw)))
}

fn parse_url(raw: &str) -> Result<Url, GatewayError> {
    let url = Url::parse(raw)
        .map_err(|e| GatewayError::InvalidMethodOrUrl(format!("parse {:?}: {}", raw, e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(GatewayError::InvalidMethodOrUrl(format!(
            "unsupported protocol scheme {:?}",
            url.scheme()
        )));
    }
    if !url.has_host() {
        return Err(GatewayError::InvalidMethodOrUrl(format!(
            "parse {:?}: missing host",
            raw
        )));
    }
    Ok(url)
}

/// RFC 6265 cookie-name: an RFC 7230 token.
fn is_cookie_name(name: &str) -> bool {
    !name.is_empty()
        && name.bytes().all(|b| {
            b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
        })
}

/// Drops bytes outside cookie-octet, then quotes the value if it still holds
/// a space or comma. A value can never introduce a second cookie.
fn sanitize_cookie_value(value: &str) -> String {
    let kept: String = value
        .chars()
        .filter(|&c| matches!(c, ' '..='~') && !matches!(c, '"' | ';' | '\\'))
        .collect();
    if kept.contains(|c| c == ' ' || c == ',') {
        format!("\"{}\"", kept)
    } else {
        kept
    }
}
