//! The catch-all handler that proxies declared routes.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;

use hotelhub_auth::IdentityVerifier;
use hotelhub_upstream::{Forwarder, UpstreamResponse};

use crate::error::ApiError;
use crate::pipeline::{self, IncomingRequest};
use crate::state::GatewayState;

/// Run every non-health request through the pipeline.
///
/// Upstream responses are relayed with their status, content type and body
/// unchanged; gateway failures render the error envelope.
pub async fn proxy<V, F>(
    State(state): State<Arc<GatewayState<V, F>>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response
where
    V: IdentityVerifier + 'static,
    F: Forwarder + 'static,
{
    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            return body_error(&rejection, state.config.max_body_bytes).into_response();
        }
    };

    let request = IncomingRequest {
        method: method.as_str().to_string(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        headers,
        body,
    };

    match pipeline::run(&state, request).await {
        Ok(upstream) => relay(upstream),
        Err(err) => err.into_response(),
    }
}

fn body_error(rejection: &BytesRejection, limit: usize) -> ApiError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        tracing::warn!(limit, "Request body too large");
        ApiError::PayloadTooLarge { limit }
    } else {
        tracing::warn!(error = %rejection.body_text(), "Could not read request body");
        ApiError::InvalidBody
    }
}

fn relay(upstream: UpstreamResponse) -> Response {
    let mut response = Response::new(Body::from(upstream.body));
    *response.status_mut() = upstream.status;
    if let Some(content_type) = upstream.content_type {
        response.headers_mut().insert(CONTENT_TYPE, content_type);
    }
    response
}
