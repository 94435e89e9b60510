//! Which request headers reach a backing service.
//!
//! Only an allow-list of client headers is copied. Identity headers are
//! always rebuilt from the verified identity, never taken from the client.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};

use crate::error::{Result, UpstreamError};

/// Request correlation header.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");
/// Verified subject id, set on protected routes.
pub const X_USER_ID: HeaderName = HeaderName::from_static("x-user-id");
/// Verified email, set on protected routes when known.
pub const X_USER_EMAIL: HeaderName = HeaderName::from_static("x-user-email");
/// Resolved role, set on protected routes.
pub const X_USER_ROLE: HeaderName = HeaderName::from_static("x-user-role");

/// Client headers copied to the backing service.
pub const PROPAGATED_HEADERS: [HeaderName; 4] = [AUTHORIZATION, CONTENT_TYPE, ACCEPT, X_REQUEST_ID];

/// The verified identity attached to a protected forward.
#[derive(Debug, Clone, Copy)]
pub struct ForwardIdentity<'a> {
    /// Subject id.
    pub user_id: &'a str,
    /// Email, if the token carried one.
    pub email: Option<&'a str>,
    /// Resolved role name.
    pub role: &'a str,
}

/// Build the header set for a forwarded request.
///
/// # Errors
///
/// Returns `UpstreamError::InvalidRequest` if an identity value cannot be
/// carried in a header.
pub fn forward_headers(
    incoming: &HeaderMap,
    identity: Option<ForwardIdentity<'_>>,
) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();

    for name in &PROPAGATED_HEADERS {
        for value in incoming.get_all(name) {
            headers.append(name.clone(), value.clone());
        }
    }

    if let Some(identity) = identity {
        headers.insert(X_USER_ID, header_value(identity.user_id)?);
        headers.insert(X_USER_ROLE, header_value(identity.role)?);
        if let Some(email) = identity.email {
            headers.insert(X_USER_EMAIL, header_value(email)?);
        }
    }

    Ok(headers)
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| UpstreamError::InvalidRequest(format!("unrepresentable header value: {e}")))
}
