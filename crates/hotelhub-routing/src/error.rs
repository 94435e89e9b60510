//! Route configuration errors.
//!
//! Every variant is a startup failure: the gateway refuses to serve with a
//! route table that does not validate.

use std::path::PathBuf;

use thiserror::Error;

use crate::declaration::HttpMethod;

/// A result type using `RouteError`.
pub type Result<T> = std::result::Result<T, RouteError>;

/// Errors raised while loading or validating route configuration.
#[derive(Debug, Error)]
pub enum RouteError {
    /// A path pattern is malformed.
    #[error("invalid path pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The offending pattern.
        pattern: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// An HTTP method name is not supported.
    #[error("unsupported HTTP method '{0}'")]
    UnsupportedMethod(String),

    /// A public route declares an allowed-role set.
    #[error("route {method} {pattern} is public but declares roles")]
    PublicRouteWithRoles {
        /// The route's method.
        method: HttpMethod,
        /// The route's path pattern.
        pattern: String,
    },

    /// A service declares the same (method, path) pair twice.
    #[error("service '{service}' declares {method} {pattern} more than once")]
    DuplicateRoute {
        /// The declaring service.
        service: String,
        /// The duplicated method.
        method: HttpMethod,
        /// The duplicated path pattern.
        pattern: String,
    },

    /// Two services declare the same (method, path) pair.
    #[error("{method} {pattern} is declared by both '{first}' and '{second}'")]
    ConflictingRoute {
        /// The duplicated method.
        method: HttpMethod,
        /// The duplicated path pattern.
        pattern: String,
        /// The service that declared it first.
        first: String,
        /// The service that declared it again.
        second: String,
    },

    /// Two services share a logical name.
    #[error("service '{0}' is declared more than once")]
    DuplicateService(String),

    /// A service base URL is not an absolute `http(s)` URL.
    #[error("service '{service}' has an invalid base URL '{url}'")]
    InvalidBaseUrl {
        /// The service name.
        service: String,
        /// The rejected URL.
        url: String,
    },

    /// A route file could not be read.
    #[error("failed to read route file {path}: {source}")]
    Io {
        /// The route file.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A route file is not valid JSON for the route schema.
    #[error("failed to parse route file: {0}")]
    Parse(#[from] serde_json::Error),
}
