//! Token verification against the identity provider.
//!
//! The gateway treats the identity provider as an opaque collaborator: it
//! hands over a raw token and gets back the verified subject, email, and the
//! full claim set. [`JwksVerifier`] is the production implementation for
//! Firebase-style ID tokens.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, decode_header, Algorithm, Validation};
use serde_json::{Map, Value};

use hotelhub_core::SubjectId;

use crate::error::{AuthError, Result};
use crate::jwks::JwksProvider;
use crate::AuthConfig;

/// Claims extracted from a verified token.
#[derive(Debug, Clone)]
pub struct VerifiedToken {
    /// The subject (`sub` claim).
    pub subject_id: SubjectId,
    /// The email address, when the token carries one.
    pub email: Option<String>,
    /// Every claim in the token payload, including custom claims.
    pub claims: Map<String, Value>,
    /// When the token expires.
    pub expires_at: DateTime<Utc>,
}

/// Trait for verifying bearer tokens.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Verify a token and extract its claims.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is invalid, expired, or cannot be verified.
    async fn verify(&self, token: &str) -> Result<VerifiedToken>;
}

/// JWKS-based token verifier.
///
/// Fetches public keys from the provider's JWKS endpoint and validates the
/// `RS256` signature, issuer, audience, and expiry of Firebase ID tokens.
pub struct JwksVerifier {
    config: AuthConfig,
    jwks: JwksProvider,
}

impl JwksVerifier {
    /// Create a new JWKS-based verifier.
    #[must_use]
    pub fn new(config: AuthConfig) -> Self {
        let jwks = JwksProvider::new(config.clone());
        Self { config, jwks }
    }
}

#[async_trait]
impl IdentityVerifier for JwksVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedToken> {
        let header = decode_header(token).map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        if header.alg != Algorithm::RS256 {
            return Err(AuthError::InvalidToken(format!(
                "unsupported algorithm {:?}",
                header.alg
            )));
        }

        let kid = header
            .kid
            .ok_or_else(|| AuthError::MissingClaim("kid".to_string()))?;

        let key = self.jwks.get_key(&kid).await?;

        let issuer = self.config.issuer();
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[issuer.as_str()]);
        validation.set_audience(&[self.config.project_id.as_str()]);
        validation.set_required_spec_claims(&["exp", "sub", "aud", "iss"]);

        let token_data = decode::<Map<String, Value>>(token, &key, &validation).map_err(|e| {
            use jsonwebtoken::errors::ErrorKind;
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                ErrorKind::InvalidIssuer => AuthError::InvalidIssuer,
                ErrorKind::InvalidAudience => AuthError::InvalidAudience,
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                ErrorKind::MissingRequiredClaim(claim) => AuthError::MissingClaim(claim.clone()),
                _ => AuthError::InvalidToken(e.to_string()),
            }
        })?;

        let claims = token_data.claims;

        let subject_id = claims
            .get("sub")
            .and_then(Value::as_str)
            .ok_or(AuthError::InvalidSubject)
            .and_then(|sub| SubjectId::new(sub).map_err(|_| AuthError::InvalidSubject))?;

        let email = claims
            .get("email")
            .and_then(Value::as_str)
            .map(str::to_string);

        let exp = claims
            .get("exp")
            .and_then(Value::as_i64)
            .ok_or_else(|| AuthError::InvalidToken("invalid exp timestamp".to_string()))?;
        let expires_at = DateTime::from_timestamp(exp, 0)
            .ok_or_else(|| AuthError::InvalidToken("invalid exp timestamp".to_string()))?;

        Ok(VerifiedToken {
            subject_id,
            email,
            claims,
            expires_at,
        })
    }
}

/// A mock verifier for testing.
///
/// Accepts tokens of the form `test-token:<subject>` or
/// `test-token:<subject>:<role>`. The role, when present, is placed in the
/// top-level `role` claim; the email is `<subject>@hotelhub.test`.
#[cfg(any(test, feature = "test-utils"))]
#[derive(Debug, Default)]
pub struct MockVerifier;

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl IdentityVerifier for MockVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedToken> {
        let rest = token.strip_prefix("test-token:").ok_or_else(|| {
            AuthError::InvalidToken("expected test-token:<subject>[:<role>]".to_string())
        })?;

        let (subject, role) = match rest.split_once(':') {
            Some((subject, role)) => (subject, Some(role)),
            None => (rest, None),
        };

        let subject_id = SubjectId::new(subject).map_err(|_| AuthError::InvalidSubject)?;
        let email = format!("{subject}@hotelhub.test");

        let mut claims = Map::new();
        claims.insert("sub".to_string(), Value::String(subject.to_string()));
        claims.insert("email".to_string(), Value::String(email.clone()));
        if let Some(role) = role {
            claims.insert("role".to_string(), Value::String(role.to_string()));
        }

        Ok(VerifiedToken {
            subject_id,
            email: Some(email),
            claims,
            expires_at: Utc::now() + chrono::Duration::hours(1),
        })
    }
}
