//! Forwarding error types.

use thiserror::Error;

/// A result type using `UpstreamError`.
pub type Result<T> = std::result::Result<T, UpstreamError>;

/// Errors raised when a backing service could not produce a response.
///
/// A response that arrives, whatever its status, is never an error here.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The backing service could not be reached or the exchange broke off.
    #[error("service '{service}' unavailable: {reason}")]
    Unavailable {
        /// Logical service name.
        service: String,
        /// Transport-level cause.
        reason: String,
    },

    /// The backing service did not answer within the forwarding timeout.
    #[error("service '{service}' timed out")]
    Timeout {
        /// Logical service name.
        service: String,
    },

    /// The forward request could not be built.
    #[error("invalid forward request: {0}")]
    InvalidRequest(String),
}

impl UpstreamError {
    /// Classify a reqwest failure.
    pub(crate) fn from_reqwest(service: &str, err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                service: service.to_string(),
            }
        } else if err.is_builder() {
            Self::InvalidRequest(err.to_string())
        } else {
            Self::Unavailable {
                service: service.to_string(),
                reason: err.to_string(),
            }
        }
    }

    /// Get the error code for API responses.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Unavailable { .. } | Self::Timeout { .. } => "UPSTREAM_UNAVAILABLE",
            Self::InvalidRequest(_) => "INTERNAL_ERROR",
        }
    }

    /// Get the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::Unavailable { .. } => 502,
            Self::Timeout { .. } => 504,
            Self::InvalidRequest(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_and_statuses() {
        let unavailable = UpstreamError::Unavailable {
            service: "room".into(),
            reason: "connection refused".into(),
        };
        assert_eq!(unavailable.code(), "UPSTREAM_UNAVAILABLE");
        assert_eq!(unavailable.http_status_code(), 502);

        let timeout = UpstreamError::Timeout {
            service: "room".into(),
        };
        assert_eq!(timeout.code(), "UPSTREAM_UNAVAILABLE");
        assert_eq!(timeout.http_status_code(), 504);

        let invalid = UpstreamError::InvalidRequest("bad header".into());
        assert_eq!(invalid.code(), "INTERNAL_ERROR");
        assert_eq!(invalid.http_status_code(), 500);
    }
}
