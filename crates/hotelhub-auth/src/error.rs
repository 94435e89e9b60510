//! Authentication and authorization error types.

use hotelhub_core::Role;
use thiserror::Error;

/// A result type using `AuthError`.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Errors that can occur while resolving or authorizing an identity.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The `Authorization` header is absent or not of the form `Bearer <token>`.
    #[error("missing or malformed bearer credential")]
    MissingCredential,

    /// The token has expired.
    #[error("token expired")]
    TokenExpired,

    /// The token signature is invalid.
    #[error("invalid signature")]
    InvalidSignature,

    /// The token issuer does not match the expected value.
    #[error("invalid issuer")]
    InvalidIssuer,

    /// The token audience does not match the expected value.
    #[error("invalid audience")]
    InvalidAudience,

    /// The subject in the token is missing or empty.
    #[error("invalid subject")]
    InvalidSubject,

    /// A required claim is missing from the token.
    #[error("missing required claim: {0}")]
    MissingClaim(String),

    /// The token format is invalid.
    #[error("invalid token format: {0}")]
    InvalidToken(String),

    /// The key ID named by the token is not in the provider's key set.
    #[error("key not found: {0}")]
    KeyNotFound(String),

    /// Failed to fetch the key set from the identity provider.
    #[error("JWKS fetch failed: {0}")]
    JwksFetchFailed(String),

    /// The identity's role is not in the route's allowed-role set.
    #[error("role '{role}' is not permitted for this route")]
    Forbidden {
        /// The role the identity holds.
        role: Role,
    },
}

impl AuthError {
    /// Returns `true` if the failure happened while verifying a presented credential.
    #[must_use]
    pub const fn is_verification_failure(&self) -> bool {
        matches!(
            self,
            Self::TokenExpired
                | Self::InvalidSignature
                | Self::InvalidIssuer
                | Self::InvalidAudience
                | Self::InvalidSubject
                | Self::MissingClaim(_)
                | Self::InvalidToken(_)
                | Self::KeyNotFound(_)
                | Self::JwksFetchFailed(_)
        )
    }

    /// Returns the stable error code reported to clients.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MissingCredential => "MISSING_CREDENTIAL",
            Self::Forbidden { .. } => "FORBIDDEN",
            _ => "INVALID_CREDENTIAL",
        }
    }

    /// Returns the appropriate HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::Forbidden { .. } => 403,
            _ => 401,
        }
    }
}
