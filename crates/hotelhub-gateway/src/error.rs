//! API error types and responses.
//!
//! Every failure the gateway produces itself is rendered as
//! `{success:false, error:{code, message}, timestamp}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use thiserror::Error;

use hotelhub_auth::AuthError;
use hotelhub_core::Role;
use hotelhub_upstream::UpstreamError;

/// API error type that implements `IntoResponse`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No declared route matches.
    #[error("Route {method} {path} not found")]
    NotFound {
        /// Request method as received.
        method: String,
        /// Request path as received.
        path: String,
    },

    /// No usable bearer credential was supplied.
    #[error("Missing or malformed bearer token")]
    MissingCredential,

    /// The credential failed verification.
    #[error("Invalid or expired token")]
    InvalidCredential,

    /// The caller's role is not allowed on this route.
    #[error("Role '{role}' is not permitted to access this resource")]
    Forbidden {
        /// The caller's resolved role.
        role: Role,
    },

    /// The request outlived the gateway's overall timeout.
    #[error("Request timed out")]
    RequestTimeout,

    /// The request body exceeds the configured limit.
    #[error("Request body exceeds the {limit} byte limit")]
    PayloadTooLarge {
        /// Configured limit in bytes.
        limit: usize,
    },

    /// The request body could not be read.
    #[error("Invalid request body")]
    InvalidBody,

    /// Too many requests from this client in the current window.
    #[error("Too many requests, please try again later.")]
    RateLimited,

    /// The backing service could not be reached.
    #[error("Service '{service}' is unavailable")]
    UpstreamUnavailable {
        /// Logical service name.
        service: String,
    },

    /// The backing service did not answer in time.
    #[error("Service '{service}' did not respond in time")]
    UpstreamTimeout {
        /// Logical service name.
        service: String,
    },

    /// The backing service failed without a body to relay.
    #[error("Service '{service}' responded with {status}")]
    UpstreamError {
        /// Logical service name.
        service: String,
        /// The upstream status, relayed unchanged.
        status: StatusCode,
    },

    /// Internal server error.
    #[error("Internal server error")]
    Internal(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    success: bool,
    error: ErrorBody,
    timestamp: String,
}

/// Error details.
#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl ApiError {
    /// Get the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::MissingCredential | Self::InvalidCredential => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::RequestTimeout => StatusCode::REQUEST_TIMEOUT,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::InvalidBody => StatusCode::BAD_REQUEST,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::UpstreamUnavailable { .. } => StatusCode::BAD_GATEWAY,
            Self::UpstreamTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            Self::UpstreamError { status, .. } => *status,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code string for this error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::MissingCredential => "MISSING_CREDENTIAL",
            Self::InvalidCredential => "INVALID_CREDENTIAL",
            Self::Forbidden { .. } => "FORBIDDEN",
            Self::RequestTimeout => "REQUEST_TIMEOUT",
            Self::PayloadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
            Self::InvalidBody => "INVALID_BODY",
            Self::RateLimited => "RATE_LIMITED",
            Self::UpstreamUnavailable { .. } | Self::UpstreamTimeout { .. } => {
                "UPSTREAM_UNAVAILABLE"
            }
            Self::UpstreamError { .. } => "UPSTREAM_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

/// Current time in the envelope's RFC 3339 format.
#[must_use]
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();
        let message = self.to_string();

        let body = ErrorResponse {
            success: false,
            error: ErrorBody { code, message },
            timestamp: timestamp(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredential => Self::MissingCredential,
            AuthError::Forbidden { role } => Self::Forbidden { role },
            AuthError::TokenExpired
            | AuthError::InvalidSignature
            | AuthError::InvalidIssuer
            | AuthError::InvalidAudience
            | AuthError::InvalidSubject
            | AuthError::MissingClaim(_)
            | AuthError::InvalidToken(_)
            | AuthError::KeyNotFound(_)
            | AuthError::JwksFetchFailed(_) => Self::InvalidCredential,
        }
    }
}

impl From<UpstreamError> for ApiError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::Unavailable { service, .. } => Self::UpstreamUnavailable { service },
            UpstreamError::Timeout { service } => Self::UpstreamTimeout { service },
            UpstreamError::InvalidRequest(msg) => {
                tracing::error!(error = %msg, "Could not build forward request");
                Self::Internal(msg)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_status_codes() {
        assert_eq!(
            ApiError::MissingCredential.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::InvalidCredential.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Forbidden { role: Role::Guest }.status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::RateLimited.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ApiError::UpstreamTimeout {
                service: "room".into()
            }
            .status_code(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            ApiError::UpstreamError {
                service: "room".into(),
                status: StatusCode::SERVICE_UNAVAILABLE
            }
            .status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn error_codes() {
        assert_eq!(ApiError::MissingCredential.code(), "MISSING_CREDENTIAL");
        assert_eq!(ApiError::RateLimited.code(), "RATE_LIMITED");
        assert_eq!(ApiError::RequestTimeout.code(), "REQUEST_TIMEOUT");
        assert_eq!(
            ApiError::PayloadTooLarge { limit: 16 }.status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            ApiError::UpstreamUnavailable {
                service: "room".into()
            }
            .code(),
            "UPSTREAM_UNAVAILABLE"
        );
        assert_eq!(ApiError::Internal("x".into()).code(), "INTERNAL_ERROR");
    }

    #[test]
    fn not_found_message() {
        let err = ApiError::NotFound {
            method: "GET".into(),
            path: "/api/nonexistent".into(),
        };
        assert_eq!(err.to_string(), "Route GET /api/nonexistent not found");
    }

    #[test]
    fn auth_errors_map_to_credential_codes() {
        assert_eq!(
            ApiError::from(AuthError::JwksFetchFailed("down".into())).code(),
            "INVALID_CREDENTIAL"
        );
        assert_eq!(
            ApiError::from(AuthError::TokenExpired).code(),
            "INVALID_CREDENTIAL"
        );
        assert_eq!(
            ApiError::from(AuthError::MissingCredential).code(),
            "MISSING_CREDENTIAL"
        );
        assert_eq!(
            ApiError::from(AuthError::Forbidden { role: Role::Guest }).code(),
            "FORBIDDEN"
        );
    }

    #[tokio::test]
    async fn renders_envelope() {
        let response = ApiError::MissingCredential.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"]["code"], "MISSING_CREDENTIAL");
        assert!(json["timestamp"].is_string());
    }
}
