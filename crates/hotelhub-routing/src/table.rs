//! The validated, immutable route table.
//!
//! Resolution is a linear scan over every declared route. Route tables for
//! a gateway are small, so this stays cheap and is trivially correct.

use std::collections::HashMap;

use url::Url;

use crate::declaration::{HttpMethod, RouteDeclaration, ServiceDescriptor};
use crate::error::{Result, RouteError};

/// A successful route resolution.
#[derive(Debug, Clone)]
pub struct RouteMatch<'a> {
    /// The service that owns the route.
    pub service: &'a ServiceDescriptor,
    /// The matched declaration.
    pub route: &'a RouteDeclaration,
    /// Parameters captured from the request path.
    pub params: HashMap<String, String>,
    /// The upstream path with parameters substituted.
    pub upstream_path: String,
}

/// Static mapping from (method, path) to a backing service route.
#[derive(Debug, Clone)]
pub struct RouteTable {
    services: Vec<ServiceDescriptor>,
}

impl RouteTable {
    /// Validate and freeze a set of service descriptors.
    ///
    /// Base URLs have any trailing `/` removed.
    ///
    /// # Errors
    ///
    /// Returns an error if a service name repeats, a base URL is not an
    /// absolute `http(s)` URL, or a (method, path) pair is declared twice,
    /// either within one service or across services. Paths that differ only
    /// in parameter names count as the same path.
    pub fn new(services: Vec<ServiceDescriptor>) -> Result<Self> {
        let mut seen_services: Vec<&str> = Vec::new();
        let mut owners: HashMap<(HttpMethod, String), &str> = HashMap::new();

        for service in &services {
            if seen_services.contains(&service.name.as_str()) {
                return Err(RouteError::DuplicateService(service.name.clone()));
            }
            seen_services.push(&service.name);

            validate_base_url(service)?;

            for route in &service.routes {
                let key = (route.method(), route.path().shape());
                if let Some(owner) = owners.get(&key) {
                    return Err(if *owner == service.name {
                        RouteError::DuplicateRoute {
                            service: service.name.clone(),
                            method: route.method(),
                            pattern: route.path().to_string(),
                        }
                    } else {
                        RouteError::ConflictingRoute {
                            method: route.method(),
                            pattern: route.path().to_string(),
                            first: (*owner).to_string(),
                            second: service.name.clone(),
                        }
                    });
                }
                owners.insert(key, &service.name);
            }
        }

        let services = services
            .into_iter()
            .map(|mut service| {
                service.base_url = service.base_url.trim_end_matches('/').to_string();
                service
            })
            .collect::<Vec<_>>();

        tracing::debug!(
            services = services.len(),
            routes = services.iter().map(|s| s.routes.len()).sum::<usize>(),
            "Route table validated"
        );

        Ok(Self { services })
    }

    /// Resolve a request to its declared route.
    ///
    /// Method must match exactly. When several templates match the path,
    /// the one with more literal segments wins; among equals, the first
    /// declared wins.
    #[must_use]
    pub fn resolve(&self, method: HttpMethod, path: &str) -> Option<RouteMatch<'_>> {
        let mut best: Option<RouteMatch<'_>> = None;

        for service in &self.services {
            for route in service.routes.iter().filter(|r| r.method() == method) {
                let Some(params) = route.path().matches(path) else {
                    continue;
                };

                let more_specific = best.as_ref().map_or(true, |current| {
                    route.path().literal_count() > current.route.path().literal_count()
                });

                if more_specific {
                    let upstream_path = route.upstream().render(&params);
                    best = Some(RouteMatch {
                        service,
                        route,
                        params,
                        upstream_path,
                    });
                }
            }
        }

        best
    }

    /// All services, in declaration order.
    #[must_use]
    pub fn services(&self) -> &[ServiceDescriptor] {
        &self.services
    }

    /// Total number of declared routes.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.services.iter().map(|s| s.routes.len()).sum()
    }
}

fn validate_base_url(service: &ServiceDescriptor) -> Result<()> {
    let invalid = || RouteError::InvalidBaseUrl {
        service: service.name.clone(),
        url: service.base_url.clone(),
    };

    if service.base_url.contains(char::is_whitespace) {
        return Err(invalid());
    }

    let url = Url::parse(&service.base_url).map_err(|_| invalid())?;
    let usable = matches!(url.scheme(), "http" | "https")
        && url.host_str().is_some_and(|host| !host.is_empty())
        && url.query().is_none()
        && url.fragment().is_none();

    if usable {
        Ok(())
    } else {
        Err(invalid())
    }
}
