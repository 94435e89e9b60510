//! Identity resolution and role authorization for hotelhub.
//!
//! This crate provides everything the gateway needs to decide who is calling
//! and whether they may call a route:
//!
//! - JWKS (JSON Web Key Set) fetching and caching
//! - `RS256` signature, issuer, audience, and expiry validation
//! - Bearer extraction and role resolution from verified claims
//! - The role guard applied to protected routes
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐     ┌──────────────────────┐
//! │   Gateway        │────▶│  resolve_identity    │──▶ authorize(role set)
//! │   pipeline       │     └──────────┬───────────┘
//! └──────────────────┘                │
//!                          ┌──────────▼───────────┐
//!                          │  IdentityVerifier    │
//!                          │  (trait)             │
//!                          └──────────┬───────────┘
//!                                     │
//!                          ┌──────────▼───────────┐
//!                          │  JwksVerifier        │
//!                          │  + JwksProvider      │
//!                          └──────────┬───────────┘
//!                                     │ HTTPS
//!                          ┌──────────▼───────────┐
//!                          │  Identity provider   │
//!                          │  JWKS endpoint       │
//!                          └──────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use hotelhub_auth::{authorize, resolve_identity, AuthConfig, JwksVerifier};
//! use hotelhub_core::Role;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let verifier = JwksVerifier::new(AuthConfig::for_project("hotelhub-prod"));
//!
//! // In a request handler:
//! let header = Some("Bearer eyJhbGciOiJSUzI1NiIsImtpZCI6Ij...");
//! let identity = resolve_identity(&verifier, header).await?;
//! authorize(&identity, &[Role::Admin, Role::Manager])?;
//!
//! println!("Subject: {} ({})", identity.subject_id, identity.role);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod guard;
pub mod jwks;
pub mod resolver;
pub mod verifier;

pub use error::{AuthError, Result};
pub use guard::authorize;
pub use resolver::{extract_bearer, resolve_identity, resolve_role, ResolvedIdentity};
pub use verifier::{IdentityVerifier, JwksVerifier, VerifiedToken};

#[cfg(any(test, feature = "test-utils"))]
pub use verifier::MockVerifier;

/// Key set published by Google for Firebase ID tokens.
pub const GOOGLE_SECURETOKEN_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

/// Configuration for verifying identity-provider tokens.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Identity-provider project ID; the expected `aud` claim.
    pub project_id: String,
    /// JWKS endpoint URL.
    pub jwks_url: String,
    /// How often to refresh the JWKS cache, in seconds.
    pub jwks_refresh_seconds: u64,
    /// Minimum spacing between refetches triggered by unknown key IDs.
    pub jwks_min_refetch_seconds: u64,
}

impl AuthConfig {
    /// Configuration for a Firebase project using Google's public key set.
    #[must_use]
    pub fn for_project(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            jwks_url: GOOGLE_SECURETOKEN_JWKS_URL.to_string(),
            jwks_refresh_seconds: 3600,
            jwks_min_refetch_seconds: 30,
        }
    }

    /// Get the expected token issuer.
    #[must_use]
    pub fn issuer(&self) -> String {
        format!("https://securetoken.google.com/{}", self.project_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hotelhub_core::Role;

    #[test]
    fn project_config() {
        let config = AuthConfig::for_project("hotelhub-prod");
        assert_eq!(config.project_id, "hotelhub-prod");
        assert_eq!(config.jwks_url, GOOGLE_SECURETOKEN_JWKS_URL);
        assert_eq!(config.jwks_refresh_seconds, 3600);
        assert_eq!(config.jwks_min_refetch_seconds, 30);
    }

    #[test]
    fn issuer_url() {
        let config = AuthConfig::for_project("hotelhub-prod");
        assert_eq!(
            config.issuer(),
            "https://securetoken.google.com/hotelhub-prod"
        );
    }

    #[test]
    fn auth_error_codes() {
        assert_eq!(AuthError::MissingCredential.code(), "MISSING_CREDENTIAL");
        assert_eq!(AuthError::TokenExpired.code(), "INVALID_CREDENTIAL");
        assert_eq!(AuthError::InvalidSignature.code(), "INVALID_CREDENTIAL");
        assert_eq!(
            AuthError::JwksFetchFailed("test".into()).code(),
            "INVALID_CREDENTIAL"
        );
        assert_eq!(
            AuthError::Forbidden { role: Role::Guest }.code(),
            "FORBIDDEN"
        );
    }

    #[test]
    fn auth_error_status_codes() {
        assert_eq!(AuthError::MissingCredential.http_status_code(), 401);
        assert_eq!(AuthError::TokenExpired.http_status_code(), 401);
        assert_eq!(AuthError::KeyNotFound("k".into()).http_status_code(), 401);
        assert_eq!(
            AuthError::Forbidden { role: Role::Guest }.http_status_code(),
            403
        );
    }

    #[test]
    fn verification_failures() {
        assert!(AuthError::TokenExpired.is_verification_failure());
        assert!(AuthError::JwksFetchFailed("x".into()).is_verification_failure());
        assert!(!AuthError::MissingCredential.is_verification_failure());
        assert!(!AuthError::Forbidden { role: Role::Guest }.is_verification_failure());
    }
}
