//! Route declarations and service descriptors.
//!
//! These are the static configuration types: created once at startup,
//! validated by [`RouteTable::new`](crate::RouteTable::new), immutable after.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use hotelhub_core::Role;

use crate::error::{Result, RouteError};
use crate::template::PathTemplate;

/// HTTP methods a route can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `PATCH`
    Patch,
    /// `DELETE`
    Delete,
}

impl HttpMethod {
    /// The method name as sent on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl FromStr for HttpMethod {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            _ => Err(RouteError::UnsupportedMethod(s.to_string())),
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a route requires a verified credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Forwarded without authentication.
    Public,
    /// Requires a verified bearer credential.
    Protected,
}

/// One declared gateway endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawRouteDeclaration")]
pub struct RouteDeclaration {
    method: HttpMethod,
    path: PathTemplate,
    visibility: Visibility,
    roles: Vec<Role>,
    upstream: Option<PathTemplate>,
}

impl RouteDeclaration {
    /// Declare a public route.
    ///
    /// # Errors
    ///
    /// Returns an error if the path pattern is malformed.
    pub fn public(method: HttpMethod, path: &str) -> Result<Self> {
        Ok(Self {
            method,
            path: PathTemplate::parse(path)?,
            visibility: Visibility::Public,
            roles: Vec::new(),
            upstream: None,
        })
    }

    /// Declare a protected route. An empty role set admits any
    /// authenticated identity.
    ///
    /// # Errors
    ///
    /// Returns an error if the path pattern is malformed.
    pub fn protected(method: HttpMethod, path: &str, roles: &[Role]) -> Result<Self> {
        Ok(Self {
            method,
            path: PathTemplate::parse(path)?,
            visibility: Visibility::Protected,
            roles: roles.to_vec(),
            upstream: None,
        })
    }

    /// Forward to a different upstream path than the gateway path.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern is malformed or uses a parameter the
    /// gateway path does not capture.
    pub fn with_upstream(mut self, upstream: &str) -> Result<Self> {
        let template = PathTemplate::parse(upstream)?;
        let declared: Vec<&str> = self.path.params().collect();
        if template.params().any(|name| !declared.contains(&name)) {
            return Err(RouteError::InvalidPattern {
                pattern: upstream.to_string(),
                reason: "uses a parameter the gateway path does not capture",
            });
        }
        self.upstream = Some(template);
        Ok(self)
    }

    /// The declared HTTP method.
    #[must_use]
    pub const fn method(&self) -> HttpMethod {
        self.method
    }

    /// The gateway path pattern.
    #[must_use]
    pub const fn path(&self) -> &PathTemplate {
        &self.path
    }

    /// The route's visibility.
    #[must_use]
    pub const fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Shorthand for `visibility() == Visibility::Public`.
    #[must_use]
    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    /// The allowed-role set; empty means any authenticated identity.
    #[must_use]
    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    /// The template used to build the upstream path.
    #[must_use]
    pub fn upstream(&self) -> &PathTemplate {
        self.upstream.as_ref().unwrap_or(&self.path)
    }
}

/// Route declaration as written in a route file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRouteDeclaration {
    method: String,
    path: String,
    #[serde(default)]
    public: bool,
    #[serde(default)]
    roles: Vec<Role>,
    #[serde(default)]
    upstream: Option<String>,
}

impl TryFrom<RawRouteDeclaration> for RouteDeclaration {
    type Error = RouteError;

    fn try_from(raw: RawRouteDeclaration) -> Result<Self> {
        let method = raw.method.parse()?;

        let route = if raw.public {
            if !raw.roles.is_empty() {
                return Err(RouteError::PublicRouteWithRoles {
                    method,
                    pattern: raw.path,
                });
            }
            Self::public(method, &raw.path)?
        } else {
            Self::protected(method, &raw.path, &raw.roles)?
        };

        match raw.upstream {
            Some(upstream) => route.with_upstream(&upstream),
            None => Ok(route),
        }
    }
}

/// One backing service and the routes it serves.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceDescriptor {
    /// Logical service name, e.g. `room`.
    pub name: String,
    /// Base URL requests are forwarded to, e.g. `http://room-service:3003`.
    #[serde(alias = "url")]
    pub base_url: String,
    /// Declared routes, in declaration order.
    pub routes: Vec<RouteDeclaration>,
}

impl ServiceDescriptor {
    /// Create a service descriptor.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        routes: Vec<RouteDeclaration>,
    ) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            routes,
        }
    }
}
