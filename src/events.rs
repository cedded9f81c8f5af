// Observability hooks fired around every request

use reqwest::header::HeaderMap;
use reqwest::Method;
use serde_json::Value;
use std::time::Duration;

use crate::error::TransportErrorKind;

/// Fired before the request is sent
#[derive(Debug, Clone)]
pub struct RequestStarted {
    pub url: String,
    pub method: Method,
    /// Truncated copy of the request body
    pub data: Option<Value>,
    pub headers: HeaderMap,
}

/// Fired once a response has been received
#[derive(Debug, Clone)]
pub struct RequestFinished {
    pub url: String,
    pub method: Method,
    pub data: Option<Value>,
    pub headers: HeaderMap,
    pub status: u16,
    pub elapsed: Duration,
}

/// Fired on every error path, before the error is returned
#[derive(Debug, Clone)]
pub struct RequestErrored {
    pub url: String,
    pub method: Method,
    /// `None` when no response was obtained
    pub status: Option<u16>,
    /// Response headers, or request headers on transport failures
    pub headers: HeaderMap,
    pub transport_error: Option<TransportErrorKind>,
}

/// Receiver for request lifecycle events.
///
/// All methods default to no-ops; implement the ones you need.
pub trait RequestObserver: Send + Sync {
    fn request_started(&self, _event: &RequestStarted) {}

    fn request_finished(&self, _event: &RequestFinished) {}

    fn request_errored(&self, _event: &RequestErrored) {}
}

/// Observer that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl RequestObserver for NoopObserver {}
