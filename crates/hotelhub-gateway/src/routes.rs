//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::{DefaultBodyLimit, Request, State};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use hotelhub_auth::IdentityVerifier;
use hotelhub_upstream::Forwarder;

use crate::error::ApiError;
use crate::handlers::{health, proxy};
use crate::rate_limit;
use crate::request_id::{request_id_of, MakeGatewayRequestId};
use crate::state::GatewayState;

/// Create the gateway router with all routes and middleware.
///
/// # Routes
///
/// - `GET /health` - Health check, answered locally
/// - everything else - resolved against the route table and proxied
///
/// # Middleware (outermost first)
///
/// request id → propagate request id → trace → CORS → rate limit →
/// timeout → body limit
///
/// Timeouts and oversized bodies render the JSON error envelope like every
/// other gateway failure.
pub fn create_router<V, F>(state: GatewayState<V, F>) -> Router
where
    V: IdentityVerifier + 'static,
    F: Forwarder + 'static,
{
    // Extract config values before moving state
    let cors = build_cors_layer(&state.config.cors_origins);
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout = state.config.request_timeout();
    let rate_limiter = Arc::clone(&state.rate_limiter);

    let outer = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeGatewayRequestId))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<Body>| {
                tracing::info_span!(
                    "request",
                    request_id = %request_id_of(request.headers()),
                    method = %request.method(),
                    path = %request.uri().path(),
                )
            }),
        )
        .layer(cors);

    // Each `Router::layer` call wraps the previous ones; the last is outermost.
    Router::new()
        .route("/health", get(health::health::<V, F>))
        .fallback(proxy::proxy::<V, F>)
        .with_state(Arc::new(state))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(middleware::from_fn_with_state(
            request_timeout,
            enforce_timeout,
        ))
        .layer(middleware::from_fn_with_state(
            rate_limiter,
            rate_limit::enforce,
        ))
        .layer(outer)
}

/// Abandon requests that outlive the configured timeout.
async fn enforce_timeout(
    State(timeout): State<Duration>,
    request: Request,
    next: Next,
) -> Response {
    match tokio::time::timeout(timeout, next.run(request)).await {
        Ok(response) => response,
        Err(_) => {
            tracing::warn!(timeout = ?timeout, "Request timed out");
            ApiError::RequestTimeout.into_response()
        }
    }
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
