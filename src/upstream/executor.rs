//! The proxy pipeline: decode → select → build → execute → read → project.
//!
//! Each step aborts the call on failure; nothing is retried and exactly one
//! outbound attempt is made per call. The upstream response is owned by the
//! pipeline and dropped on every exit path, which releases its connection.

use std::time::Instant;

use reqwest::header::CONTENT_TYPE;

use crate::error::GatewayError;
use crate::http::response::{
    header_object, CookieView, IpAddress, Projection, RequestEcho, ResponseEcho, ResponseEnvelope,
};
use crate::observability::metrics;
use crate::upstream::builder::OutboundRequest;
use crate::upstream::clients::{ClientPair, Transport};
use crate::upstream::spec;

/// Per-call options taken from the inbound query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProxyOptions {
    pub transport: Transport,
    /// Return raw upstream bytes instead of the envelope.
    pub stream: bool,
}

/// Run a proxied call described by the raw `request` JSON.
pub async fn execute(
    clients: &ClientPair,
    raw_request: Option<&str>,
    options: ProxyOptions,
) -> Result<Projection, GatewayError> {
    let spec = spec::decode(raw_request)?;
    let client = clients.client(options.transport);
    let outbound = OutboundRequest::build(&spec, client)?;

    let method = outbound.method().clone();
    let url = outbound.url().clone();
    let echo = RequestEcho {
        url: url.to_string(),
        headers: header_object(outbound.headers()),
        cookies: CookieView::from_request_headers(outbound.headers()),
    };

    tracing::info!(
        method = %method,
        url = %url,
        transport = %options.transport,
        "Performing upstream request"
    );

    let start = Instant::now();
    let response = match client.execute(outbound.into_inner()).await {
        Ok(response) => response,
        Err(e) => {
            metrics::record_upstream("proxy", "error", start);
            return Err(GatewayError::Execution(e));
        }
    };

    let status = response.status();
    metrics::record_upstream("proxy", status.as_str(), start);
    tracing::info!(method = %method, url = %url, status = status.as_u16(), "Upstream responded");

    let headers = response.headers().clone();
    let cookies = CookieView::from_response(&response);
    let body = response.bytes().await.map_err(GatewayError::Read)?;

    if options.stream {
        return Ok(Projection::Stream {
            status,
            content_type: headers.get(CONTENT_TYPE).cloned(),
            body,
        });
    }

    Ok(Projection::Envelope(ResponseEnvelope {
        request: echo,
        response: ResponseEcho {
            headers: header_object(&headers),
            cookies,
        },
        status: status.as_u16(),
        data: String::from_utf8_lossy(&body).into_owned(),
    }))
}

/// Ask the IP echo endpoint which address the chosen transport egresses from.
pub async fn fetch_ip(
    clients: &ClientPair,
    transport: Transport,
    echo_url: &str,
) -> Result<IpAddress, GatewayError> {
    let client = clients.client(transport);
    tracing::debug!(url = %echo_url, transport = %transport, "Fetching egress address");

    let start = Instant::now();
    let response = match client.get(echo_url).send().await {
        Ok(response) => response,
        Err(e) => {
            metrics::record_upstream("ip", "error", start);
            return Err(GatewayError::Execution(e));
        }
    };
    metrics::record_upstream("ip", response.status().as_str(), start);

    let body = response.text().await.map_err(GatewayError::Read)?;
    Ok(IpAddress {
        status: 200,
        data: body.trim().to_string(),
    })
}
