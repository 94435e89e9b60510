//! Identity resolution from an inbound `Authorization` header.
//!
//! Resolution runs in three steps: bearer extraction, verification with the
//! identity provider, and role extraction from the verified claims.

use serde::Serialize;
use serde_json::{Map, Value};

use hotelhub_core::{Role, SubjectId};

use crate::error::{AuthError, Result};
use crate::verifier::{IdentityVerifier, VerifiedToken};

/// The identity behind a verified credential, scoped to one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedIdentity {
    /// The identity provider's subject ID.
    pub subject_id: SubjectId,
    /// The email address, if the credential carries one.
    pub email: Option<String>,
    /// The resolved role.
    pub role: Role,
}

impl ResolvedIdentity {
    /// Build an identity from a verified token.
    #[must_use]
    pub fn from_token(token: VerifiedToken) -> Self {
        let role = resolve_role(&token.claims);
        Self {
            subject_id: token.subject_id,
            email: token.email,
            role,
        }
    }
}

/// Extract the token from a `Bearer <token>` header value.
///
/// # Errors
///
/// Returns `AuthError::MissingCredential` if the header is absent, uses a
/// different scheme, or carries an empty token.
pub fn extract_bearer(authorization: Option<&str>) -> Result<&str> {
    let token = authorization
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .ok_or(AuthError::MissingCredential)?;

    if token.is_empty() {
        return Err(AuthError::MissingCredential);
    }

    Ok(token)
}

/// Resolve the role carried by a claim set.
///
/// Checked in order, first non-empty string wins:
/// `role`, `claims.role`, `customClaims.role`. Falls back to [`Role::Guest`].
#[must_use]
pub fn resolve_role(claims: &Map<String, Value>) -> Role {
    let nested = |container: &str| {
        claims
            .get(container)
            .and_then(Value::as_object)
            .and_then(|inner| inner.get("role"))
    };

    [claims.get("role"), nested("claims"), nested("customClaims")]
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .find(|role| !role.is_empty())
        .map_or(Role::DEFAULT, |role| Role::from(role.to_string()))
}

/// Resolve the identity behind an `Authorization` header value.
///
/// # Errors
///
/// Returns `AuthError::MissingCredential` for an absent or malformed header,
/// or the verifier's error when the token does not verify.
pub async fn resolve_identity<V>(
    verifier: &V,
    authorization: Option<&str>,
) -> Result<ResolvedIdentity>
where
    V: IdentityVerifier + ?Sized,
{
    let token = extract_bearer(authorization)?;

    let verified = verifier.verify(token).await.map_err(|err| {
        if matches!(err, AuthError::JwksFetchFailed(_)) {
            tracing::error!(error = %err, "Identity provider key set unavailable");
        } else {
            tracing::debug!(error = %err, "Token verification failed");
        }
        err
    })?;

    Ok(ResolvedIdentity::from_token(verified))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verifier::MockVerifier;
    use serde_json::json;

    fn claims(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn bearer_extraction() {
        assert_eq!(extract_bearer(Some("Bearer abc.def")).unwrap(), "abc.def");
    }

    #[test]
    fn bearer_missing_header() {
        assert!(matches!(
            extract_bearer(None),
            Err(AuthError::MissingCredential)
        ));
    }

    #[test]
    fn bearer_wrong_scheme() {
        assert!(matches!(
            extract_bearer(Some("Basic dXNlcjpwYXNz")),
            Err(AuthError::MissingCredential)
        ));
        assert!(matches!(
            extract_bearer(Some("bearer abc")),
            Err(AuthError::MissingCredential)
        ));
    }

    #[test]
    fn bearer_empty_token() {
        assert!(matches!(
            extract_bearer(Some("Bearer ")),
            Err(AuthError::MissingCredential)
        ));
        assert!(matches!(
            extract_bearer(Some("Bearer    ")),
            Err(AuthError::MissingCredential)
        ));
    }

    #[test]
    fn role_from_top_level_claim() {
        let role = resolve_role(&claims(json!({ "role": "admin" })));
        assert_eq!(role, Role::Admin);
    }

    #[test]
    fn role_from_nested_claims() {
        let role = resolve_role(&claims(json!({ "claims": { "role": "manager" } })));
        assert_eq!(role, Role::Manager);
    }

    #[test]
    fn role_from_custom_claims() {
        let role = resolve_role(&claims(json!({ "customClaims": { "role": "receptionist" } })));
        assert_eq!(role, Role::Receptionist);
    }

    #[test]
    fn role_fallback_order() {
        let role = resolve_role(&claims(json!({
            "role": "",
            "claims": { "role": "manager" },
            "customClaims": { "role": "admin" }
        })));
        assert_eq!(role, Role::Manager);
    }

    #[test]
    fn role_defaults_to_guest() {
        assert_eq!(resolve_role(&Map::new()), Role::Guest);
    }

    #[test]
    fn anonymous_provider_is_plain_guest() {
        let role = resolve_role(&claims(json!({
            "firebase": { "sign_in_provider": "anonymous" }
        })));
        assert_eq!(role, Role::Guest);
    }

    #[test]
    fn non_string_role_is_ignored() {
        let role = resolve_role(&claims(json!({ "role": 7, "customClaims": { "role": "admin" } })));
        assert_eq!(role, Role::Admin);
    }

    #[tokio::test]
    async fn resolves_identity() {
        let identity = resolve_identity(&MockVerifier, Some("Bearer test-token:uid-9:admin"))
            .await
            .unwrap();
        assert_eq!(identity.subject_id.as_str(), "uid-9");
        assert_eq!(identity.email.as_deref(), Some("uid-9@hotelhub.test"));
        assert_eq!(identity.role, Role::Admin);
    }

    #[tokio::test]
    async fn invalid_token_is_invalid_credential() {
        let err = resolve_identity(&MockVerifier, Some("Bearer forged"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_CREDENTIAL");
        assert_eq!(err.http_status_code(), 401);
    }

    #[tokio::test]
    async fn missing_header_is_missing_credential() {
        let err = resolve_identity(&MockVerifier, None).await.unwrap_err();
        assert_eq!(err.code(), "MISSING_CREDENTIAL");
        assert_eq!(err.http_status_code(), 401);
    }
}
