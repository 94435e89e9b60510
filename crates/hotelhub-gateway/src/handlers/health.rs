//! Health check endpoint.
//!
//! Answered by the gateway itself; never forwarded.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use hotelhub_auth::IdentityVerifier;
use hotelhub_upstream::Forwarder;

use crate::error::timestamp;
use crate::state::GatewayState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `ok` while the process is serving.
    pub status: &'static str,
    /// Current time, RFC 3339.
    pub timestamp: String,
    /// Seconds since the gateway started.
    pub uptime: f64,
}

/// Health check handler.
///
/// # Example
///
/// ```text
/// GET /health
///
/// Response: 200 OK
/// {
///   "status": "ok",
///   "timestamp": "2024-05-01T10:00:00.000Z",
///   "uptime": 42.7
/// }
/// ```
pub async fn health<V, F>(State(state): State<Arc<GatewayState<V, F>>>) -> impl IntoResponse
where
    V: IdentityVerifier + 'static,
    F: Forwarder + 'static,
{
    let response = HealthResponse {
        status: "ok",
        timestamp: timestamp(),
        uptime: state.started_at.elapsed().as_secs_f64(),
    };

    (StatusCode::OK, Json(response))
}
