//! The per-request pipeline.
//!
//! Every proxied request walks an explicit state machine:
//!
//! ```text
//! Received ─┬─▶ Public ─────────────────────────────┐
//!           └─▶ Authenticating ─▶ Authorizing ──────┤
//!                                                   ▼
//!                                              Forwarding ─▶ Responded
//!
//! any state ─▶ Failed
//! ```
//!
//! A request that reaches `Failed` is answered with the error envelope and
//! never touches the backing service.

use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use bytes::Bytes;

use hotelhub_auth::{authorize, resolve_identity, IdentityVerifier, ResolvedIdentity};
use hotelhub_routing::{HttpMethod, RouteMatch};
use hotelhub_upstream::{
    forward_headers, ForwardIdentity, ForwardRequest, Forwarder, UpstreamResponse,
};

use crate::error::ApiError;
use crate::request_id::request_id_of;
use crate::state::GatewayState;

/// A request as received by the gateway.
#[derive(Debug, Clone)]
pub struct IncomingRequest {
    /// Method as received, e.g. `GET`.
    pub method: String,
    /// Request path without the query.
    pub path: String,
    /// Raw query string, if any.
    pub query: Option<String>,
    /// Request headers.
    pub headers: HeaderMap,
    /// Request body.
    pub body: Bytes,
}

enum RequestState<'r> {
    Received,
    Public(RouteMatch<'r>),
    Authenticating(RouteMatch<'r>),
    Authorizing(RouteMatch<'r>, ResolvedIdentity),
    Forwarding(ForwardRequest),
    Responded(UpstreamResponse),
    Failed(ApiError),
}

impl RequestState<'_> {
    const fn name(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Public(_) => "public",
            Self::Authenticating(_) => "authenticating",
            Self::Authorizing(..) => "authorizing",
            Self::Forwarding(_) => "forwarding",
            Self::Responded(_) => "responded",
            Self::Failed(_) => "failed",
        }
    }
}

/// Run a request through the pipeline.
///
/// # Errors
///
/// Returns the `ApiError` of the first stage that failed.
pub async fn run<V, F>(
    state: &GatewayState<V, F>,
    mut request: IncomingRequest,
) -> Result<UpstreamResponse, ApiError>
where
    V: IdentityVerifier,
    F: Forwarder,
{
    let request_id = request_id_of(&request.headers).to_string();
    tracing::info!(
        request_id = %request_id,
        method = %request.method,
        path = %request.path,
        "Incoming request"
    );

    let mut current = RequestState::Received;
    loop {
        current = match current {
            RequestState::Responded(response) => return Ok(response),
            RequestState::Failed(err) => {
                tracing::warn!(
                    request_id = %request_id,
                    code = err.code(),
                    error = %err,
                    "Request failed"
                );
                return Err(err);
            }
            other => {
                let from = other.name();
                let next = advance(state, &mut request, other).await;
                tracing::debug!(
                    request_id = %request_id,
                    from,
                    to = next.name(),
                    "Pipeline transition"
                );
                next
            }
        };
    }
}

async fn advance<'r, V, F>(
    state: &'r GatewayState<V, F>,
    request: &mut IncomingRequest,
    current: RequestState<'r>,
) -> RequestState<'r>
where
    V: IdentityVerifier,
    F: Forwarder,
{
    match current {
        RequestState::Received => resolve_route(state, request),

        RequestState::Public(matched) => forwarding(&matched, None, request),

        RequestState::Authenticating(matched) => {
            let authorization = request
                .headers
                .get(AUTHORIZATION)
                .and_then(|v| v.to_str().ok());
            match resolve_identity(state.verifier.as_ref(), authorization).await {
                Ok(identity) => RequestState::Authorizing(matched, identity),
                Err(err) => RequestState::Failed(err.into()),
            }
        }

        RequestState::Authorizing(matched, identity) => {
            match authorize(&identity, matched.route.roles()) {
                Ok(identity) => forwarding(&matched, Some(identity), request),
                Err(err) => RequestState::Failed(err.into()),
            }
        }

        RequestState::Forwarding(forward) => {
            let service = forward.service.clone();
            match state.forwarder.forward(forward).await {
                Ok(response) if !response.status.is_success() && response.body.is_empty() => {
                    RequestState::Failed(ApiError::UpstreamError {
                        service,
                        status: response.status,
                    })
                }
                Ok(response) => RequestState::Responded(response),
                Err(err) => RequestState::Failed(err.into()),
            }
        }

        done @ (RequestState::Responded(_) | RequestState::Failed(_)) => done,
    }
}

fn resolve_route<'r, V, F>(
    state: &'r GatewayState<V, F>,
    request: &IncomingRequest,
) -> RequestState<'r>
where
    V: IdentityVerifier,
    F: Forwarder,
{
    let not_found = || {
        RequestState::Failed(ApiError::NotFound {
            method: request.method.clone(),
            path: request.path.clone(),
        })
    };

    let Ok(method) = request.method.parse::<HttpMethod>() else {
        return not_found();
    };

    match state.routes.resolve(method, &request.path) {
        Some(matched) if matched.route.is_public() => RequestState::Public(matched),
        Some(matched) => RequestState::Authenticating(matched),
        None => not_found(),
    }
}

fn forwarding<'r>(
    matched: &RouteMatch<'_>,
    identity: Option<&ResolvedIdentity>,
    request: &mut IncomingRequest,
) -> RequestState<'r> {
    let identity = identity.map(|identity| ForwardIdentity {
        user_id: identity.subject_id.as_str(),
        email: identity.email.as_deref(),
        role: identity.role.as_str(),
    });

    match forward_headers(&request.headers, identity) {
        Ok(headers) => RequestState::Forwarding(ForwardRequest {
            service: matched.service.name.clone(),
            base_url: matched.service.base_url.clone(),
            method: matched.route.method(),
            path: matched.upstream_path.clone(),
            query: request.query.clone(),
            headers,
            body: std::mem::take(&mut request.body),
        }),
        Err(err) => RequestState::Failed(err.into()),
    }
}
