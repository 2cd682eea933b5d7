//! Endpoint handlers: `/custom`, `/get`, `/ip`.

use axum::{
    extract::{RawQuery, State},
    Json,
};

use crate::error::GatewayError;
use crate::http::request::QueryParams;
use crate::http::response::{IpAddress, Projection};
use crate::http::server::AppState;
use crate::upstream::{executor, ProxyOptions, RequestSpec, Transport};

fn proxy_options(params: &QueryParams) -> ProxyOptions {
    ProxyOptions {
        transport: Transport::select(params.has("noproxy")),
        stream: params.has("stream"),
    }
}

/// `GET /custom?request=<json>[&noproxy][&stream]`
pub async fn custom(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Projection, GatewayError> {
    let params = QueryParams::parse(query.as_deref());
    executor::execute(&state.clients, params.first("request"), proxy_options(&params)).await
}

/// `GET /get?url=<url>[&noproxy][&stream]`
///
/// Shorthand for `/custom` with `{"method":"GET","url":<url>}`.
pub async fn get(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Projection, GatewayError> {
    let params = QueryParams::parse(query.as_deref());
    let url = params
        .first("url")
        .filter(|url| !url.is_empty())
        .ok_or(GatewayError::MissingParameter("url"))?;

    let request = serde_json::to_string(&RequestSpec::get(url)).map_err(GatewayError::Encode)?;
    executor::execute(&state.clients, Some(&request), proxy_options(&params)).await
}

/// `GET /ip[?noproxy]`
pub async fn ip_address(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Json<IpAddress>, GatewayError> {
    let params = QueryParams::parse(query.as_deref());
    let transport = Transport::select(params.has("noproxy"));
    executor::fetch_ip(&state.clients, transport, &state.ip_echo_url)
        .await
        .map(Json)
}
