//! Request interceptors.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → headers.rs (stage configured response headers)
//!     → access_control.rs (allow-list check, may reject)
//!     → handler, or the rejection as an error envelope
//!     → staged headers applied to whichever response comes out
//! ```
//!
//! Interceptors run in order. The first one to reject ends the chain and no
//! later interceptor or handler runs.

pub mod access_control;
pub mod headers;

use std::fmt;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::config::ServerConfig;
use crate::error::GatewayError;

pub use access_control::AllowList;
pub use headers::{HeaderInjection, InvalidHeader};

/// Verdict of a single interceptor.
#[derive(Debug)]
pub enum Flow {
    Continue,
    Reject(GatewayError),
}

/// What an interceptor can see and touch.
pub struct Exchange<'a> {
    request: &'a Request<Body>,
    response_headers: HeaderMap,
}

impl<'a> Exchange<'a> {
    pub fn new(request: &'a Request<Body>) -> Self {
        Self {
            request,
            response_headers: HeaderMap::new(),
        }
    }

    pub fn request(&self) -> &Request<Body> {
        self.request
    }

    /// Headers to be written on the eventual response.
    pub fn response_headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.response_headers
    }

    pub fn into_response_headers(self) -> HeaderMap {
        self.response_headers
    }
}

/// A step that may observe, decorate or short-circuit a request.
pub trait Interceptor: Send + Sync + fmt::Debug {
    fn intercept(&self, exchange: &mut Exchange<'_>) -> Flow;
}

/// Ordered interceptors, shared read-only by all requests.
#[derive(Debug, Default)]
pub struct InterceptorChain {
    interceptors: Vec<Box<dyn Interceptor>>,
}

impl InterceptorChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Header injection first, then the allow-list when enabled.
    pub fn from_config(config: &ServerConfig) -> Result<Self, InvalidHeader> {
        let mut chain = Self::new().with(HeaderInjection::new(&config.headers)?);
        if config.whitelist.enable {
            chain = chain.with(AllowList::new(
                config.whitelist.addresses.iter().cloned(),
                config.whitelist.trust_forwarded,
            ));
        }
        Ok(chain)
    }

    pub fn with(mut self, interceptor: impl Interceptor + 'static) -> Self {
        self.interceptors.push(Box::new(interceptor));
        self
    }

    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    /// Run every interceptor until one rejects.
    pub fn run(&self, exchange: &mut Exchange<'_>) -> Flow {
        for interceptor in &self.interceptors {
            if let Flow::Reject(err) = interceptor.intercept(exchange) {
                return Flow::Reject(err);
            }
        }
        Flow::Continue
    }
}

/// Axum middleware driving an [`InterceptorChain`].
///
/// Staged headers are written on the final response, including rejections,
/// replacing any value the handler set under the same name.
pub async fn intercept(
    State(chain): State<Arc<InterceptorChain>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let (flow, staged) = evaluate(&chain, &request);

    let mut response = match flow {
        Flow::Continue => next.run(request).await,
        Flow::Reject(err) => err.into_response(),
    };

    for (name, value) in staged {
        if let Some(name) = name {
            response.headers_mut().insert(name, value);
        }
    }
    response
}

fn evaluate(chain: &InterceptorChain, request: &Request<Body>) -> (Flow, HeaderMap) {
    let mut exchange = Exchange::new(request);
    let flow = chain.run(&mut exchange);
    (flow, exchange.into_response_headers())
}
