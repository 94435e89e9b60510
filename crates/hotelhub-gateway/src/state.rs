//! Gateway application state.
//!
//! This module defines the shared state that is available to all request handlers.

use std::sync::Arc;
use std::time::Instant;

use hotelhub_auth::IdentityVerifier;
use hotelhub_routing::RouteTable;
use hotelhub_upstream::Forwarder;

use crate::config::GatewayConfig;
use crate::rate_limit::{InMemoryRateLimiter, RateLimitStore};

/// Shared application state for the gateway.
///
/// The route table is immutable after construction; the rate limiter is the
/// only mutable shared structure and synchronises itself.
pub struct GatewayState<V, F>
where
    V: IdentityVerifier,
    F: Forwarder,
{
    /// Validated route table.
    pub routes: Arc<RouteTable>,
    /// Credential verifier for protected routes.
    pub verifier: Arc<V>,
    /// Forwarder to the backing services.
    pub forwarder: Arc<F>,
    /// Rate-limit counters.
    pub rate_limiter: Arc<dyn RateLimitStore>,
    /// Gateway configuration.
    pub config: GatewayConfig,
    /// When the gateway started; reported by `/health`.
    pub started_at: Instant,
}

impl<V, F> GatewayState<V, F>
where
    V: IdentityVerifier,
    F: Forwarder,
{
    /// Create gateway state with an in-memory rate limiter sized from `config`.
    #[must_use]
    pub fn new(
        routes: RouteTable,
        verifier: Arc<V>,
        forwarder: Arc<F>,
        config: GatewayConfig,
    ) -> Self {
        let rate_limiter = Arc::new(InMemoryRateLimiter::new(
            config.rate_limit_max_requests,
            config.rate_limit_window(),
        ));
        Self::with_rate_limiter(routes, verifier, forwarder, rate_limiter, config)
    }

    /// Create gateway state with a caller-supplied rate-limit store.
    #[must_use]
    pub fn with_rate_limiter(
        routes: RouteTable,
        verifier: Arc<V>,
        forwarder: Arc<F>,
        rate_limiter: Arc<dyn RateLimitStore>,
        config: GatewayConfig,
    ) -> Self {
        Self {
            routes: Arc::new(routes),
            verifier,
            forwarder,
            rate_limiter,
            config,
            started_at: Instant::now(),
        }
    }
}

impl<V, F> Clone for GatewayState<V, F>
where
    V: IdentityVerifier,
    F: Forwarder,
{
    fn clone(&self) -> Self {
        Self {
            routes: Arc::clone(&self.routes),
            verifier: Arc::clone(&self.verifier),
            forwarder: Arc::clone(&self.forwarder),
            rate_limiter: Arc::clone(&self.rate_limiter),
            config: self.config.clone(),
            started_at: self.started_at,
        }
    }
}
