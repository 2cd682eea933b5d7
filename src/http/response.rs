//! Response shaping for the gateway endpoints.
//!
//! # Responsibilities
//! - Describe the outbound request and upstream response as a JSON envelope
//! - Pass upstream bytes through untouched on the streaming path
//! - Render header maps and cookies in a stable, inspectable form
//!
//! # Design Decisions
//! - The envelope is always sent with 200; the upstream status lives in the
//!   `status` field
//! - Non-UTF-8 upstream bytes are replaced, never rejected, in the envelope

use std::collections::BTreeMap;

use axum::{
    body::{Body, Bytes},
    http::{header::CONTENT_TYPE, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use reqwest::header::COOKIE;
use serde::Serialize;

/// One cookie as seen on the outbound request or upstream response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CookieView {
    pub name: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_age: Option<u64>,
    pub secure: bool,
    pub http_only: bool,
}

impl CookieView {
    fn pair(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            path: None,
            domain: None,
            max_age: None,
            secure: false,
            http_only: false,
        }
    }

    /// Cookies carried in the `Cookie` header(s) of a request.
    pub fn from_request_headers(headers: &HeaderMap) -> Vec<Self> {
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|line| line.split(';'))
            .filter_map(|pair| {
                let (name, value) = pair.trim().split_once('=')?;
                let name = name.trim();
                (!name.is_empty()).then(|| Self::pair(name, value.trim()))
            })
            .collect()
    }

    /// Cookies set by an upstream response.
    pub fn from_response(response: &reqwest::Response) -> Vec<Self> {
        response
            .cookies()
            .map(|cookie| Self {
                name: cookie.name().to_string(),
                value: cookie.value().to_string(),
                path: cookie.path().map(str::to_string),
                domain: cookie.domain().map(str::to_string),
                max_age: cookie.max_age().map(|age| age.as_secs()),
                secure: cookie.secure(),
                http_only: cookie.http_only(),
            })
            .collect()
    }
}

/// Header map rendered as `{name: [values...]}`.
pub fn header_object(headers: &HeaderMap) -> BTreeMap<String, Vec<String>> {
    let mut object: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in headers {
        object
            .entry(name.as_str().to_string())
            .or_default()
            .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
    }
    object
}

/// What was sent upstream.
#[derive(Debug, Clone, Serialize)]
pub struct RequestEcho {
    pub url: String,
    pub headers: BTreeMap<String, Vec<String>>,
    pub cookies: Vec<CookieView>,
}

/// Metadata of what came back.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseEcho {
    pub headers: BTreeMap<String, Vec<String>>,
    pub cookies: Vec<CookieView>,
}

/// The non-streaming result of a proxied call.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseEnvelope {
    pub request: RequestEcho,
    pub response: ResponseEcho,
    /// Upstream status code.
    pub status: u16,
    /// Upstream body as text.
    pub data: String,
}

/// How a proxied call is returned to the caller.
#[derive(Debug)]
pub enum Projection {
    /// Upstream bytes, status and `Content-Type`, untouched.
    Stream {
        status: StatusCode,
        content_type: Option<HeaderValue>,
        body: Bytes,
    },
    /// JSON envelope, always 200.
    Envelope(ResponseEnvelope),
}

impl IntoResponse for Projection {
    fn into_response(self) -> Response {
        match self {
            Projection::Stream {
                status,
                content_type,
                body,
            } => {
                let mut response = Response::new(Body::from(body));
                *response.status_mut() = status;
                if let Some(content_type) = content_type {
                    response.headers_mut().insert(CONTENT_TYPE, content_type);
                }
                response
            }
            Projection::Envelope(envelope) => (StatusCode::OK, Json(envelope)).into_response(),
        }
    }
}

/// Body of a successful `/ip` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IpAddress {
    pub status: u16,
    pub data: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_cookies_parsed_from_header() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("a=1; b=2;  c = 3 ;junk"));

        let cookies = CookieView::from_request_headers(&headers);
        let pairs: Vec<_> = cookies
            .iter()
            .map(|c| (c.name.as_str(), c.value.as_str()))
            .collect();
        assert_eq!(pairs, vec![("a", "1"), ("b", "2"), ("c", "3")]);
    }

    #[test]
    fn test_header_object_groups_values() {
        let mut headers = HeaderMap::new();
        headers.append("x-multi", HeaderValue::from_static("1"));
        headers.append("x-multi", HeaderValue::from_static("2"));
        headers.insert("x-single", HeaderValue::from_static("v"));

        let object = header_object(&headers);
        assert_eq!(object["x-multi"], vec!["1", "2"]);
        assert_eq!(object["x-single"], vec!["v"]);
    }

    #[test]
    fn test_stream_projection_keeps_status_and_type() {
        let response = Projection::Stream {
            status: StatusCode::NOT_FOUND,
            content_type: Some(HeaderValue::from_static("text/plain")),
            body: Bytes::from_static(b"missing"),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()[CONTENT_TYPE], "text/plain");
    }

    #[test]
    fn test_envelope_projection_is_ok() {
        let envelope = ResponseEnvelope {
            request: RequestEcho {
                url: "http://a.test/".into(),
                headers: BTreeMap::new(),
                cookies: Vec::new(),
            },
            response: ResponseEcho {
                headers: BTreeMap::new(),
                cookies: Vec::new(),
            },
            status: 503,
            data: String::new(),
        };
        let response = Projection::Envelope(envelope).into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
