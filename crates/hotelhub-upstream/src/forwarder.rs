//! HTTP forwarding to backing services.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, StatusCode};

use hotelhub_routing::HttpMethod;

use crate::error::{Result, UpstreamError};

/// Default forwarding timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// A request to relay to one backing service.
#[derive(Debug, Clone)]
pub struct ForwardRequest {
    /// Logical service name, for logs and errors.
    pub service: String,
    /// Service base URL without a trailing slash.
    pub base_url: String,
    /// HTTP method.
    pub method: HttpMethod,
    /// Upstream path with parameters substituted.
    pub path: String,
    /// Raw query string, without the leading `?`.
    pub query: Option<String>,
    /// Headers to send.
    pub headers: HeaderMap,
    /// Request body.
    pub body: Bytes,
}

impl ForwardRequest {
    /// The full upstream URL.
    #[must_use]
    pub fn url(&self) -> String {
        match self.query.as_deref() {
            Some(query) if !query.is_empty() => {
                format!("{}{}?{}", self.base_url, self.path, query)
            }
            _ => format!("{}{}", self.base_url, self.path),
        }
    }
}

/// A response received from a backing service, whatever its status.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    /// Upstream status code.
    pub status: StatusCode,
    /// Upstream `Content-Type`, if any.
    pub content_type: Option<HeaderValue>,
    /// Upstream body, unmodified.
    pub body: Bytes,
}

/// Relays requests to backing services.
///
/// Implementations must not retry: one call in, at most one upstream call out.
#[async_trait]
pub trait Forwarder: Send + Sync {
    /// Forward a request and return whatever the service answered.
    ///
    /// # Errors
    ///
    /// Returns an error only if no response was received.
    async fn forward(&self, request: ForwardRequest) -> Result<UpstreamResponse>;
}

/// reqwest-backed forwarder.
#[derive(Debug, Clone)]
pub struct HttpForwarder {
    client: reqwest::Client,
}

impl HttpForwarder {
    /// Create a forwarder with the given overall timeout.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be created.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(5)))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("Failed to create HTTP client");

        Self { client }
    }
}

impl Default for HttpForwarder {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

#[async_trait]
impl Forwarder for HttpForwarder {
    async fn forward(&self, request: ForwardRequest) -> Result<UpstreamResponse> {
        let url = request.url();
        tracing::debug!(
            service = %request.service,
            method = %request.method,
            url = %url,
            "Forwarding request"
        );

        let response = self
            .client
            .request(to_reqwest_method(request.method), &url)
            .headers(request.headers)
            .body(request.body)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(service = %request.service, error = %e, "Upstream request failed");
                UpstreamError::from_reqwest(&request.service, &e)
            })?;

        let status = response.status();
        let content_type = response.headers().get(CONTENT_TYPE).cloned();
        let body = response.bytes().await.map_err(|e| {
            tracing::warn!(service = %request.service, error = %e, "Upstream body read failed");
            UpstreamError::from_reqwest(&request.service, &e)
        })?;

        if status.is_success() {
            tracing::debug!(service = %request.service, status = %status, "Upstream responded");
        } else {
            tracing::warn!(
                service = %request.service,
                status = %status,
                body_len = body.len(),
                "Upstream returned non-success status"
            );
        }

        Ok(UpstreamResponse {
            status,
            content_type,
            body,
        })
    }
}
