//! Role-based authorization.

use hotelhub_core::Role;

use crate::error::{AuthError, Result};
use crate::resolver::ResolvedIdentity;

/// Check a resolved identity against a route's allowed-role set.
///
/// An empty set admits any authenticated identity. The identity is handed
/// back unchanged on success.
///
/// # Errors
///
/// Returns `AuthError::Forbidden` if the set is non-empty and does not
/// contain the identity's role.
pub fn authorize<'a>(
    identity: &'a ResolvedIdentity,
    allowed: &[Role],
) -> Result<&'a ResolvedIdentity> {
    if allowed.is_empty() || allowed.contains(&identity.role) {
        Ok(identity)
    } else {
        Err(AuthError::Forbidden {
            role: identity.role.clone(),
        })
    }
}
