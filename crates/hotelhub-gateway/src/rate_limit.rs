//! Per-client rate limiting.
//!
//! A fixed window per client key: each client gets `max_requests` requests
//! per window, and the counter resets when the window expires. The store is
//! a trait object so the in-memory counter can be replaced by a shared one.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use dashmap::DashMap;

use crate::error::ApiError;

const RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("ratelimit-limit");
const RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("ratelimit-remaining");
const RATELIMIT_RESET: HeaderName = HeaderName::from_static("ratelimit-reset");
const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// Key used when no client address is known.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Outcome of counting one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    /// Whether the request may proceed.
    pub allowed: bool,
    /// Requests allowed per window.
    pub limit: u32,
    /// Requests left in the current window.
    pub remaining: u32,
    /// Time until the window resets.
    pub reset_after: Duration,
}

/// Shared counter store for rate limiting.
pub trait RateLimitStore: Send + Sync {
    /// Count one request from `client_key` and decide whether it may proceed.
    fn hit(&self, client_key: &str) -> RateLimitDecision;

    /// Drop state for clients whose windows have long expired.
    fn purge_expired(&self) {}
}

struct ClientWindow {
    count: u32,
    started: Instant,
}

/// In-process fixed-window rate limiter.
pub struct InMemoryRateLimiter {
    clients: DashMap<String, ClientWindow>,
    max_requests: u32,
    window: Duration,
}

impl InMemoryRateLimiter {
    /// Create a limiter allowing `max_requests` per `window` per client.
    #[must_use]
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            clients: DashMap::new(),
            max_requests,
            window,
        }
    }

    /// Number of clients currently tracked.
    #[must_use]
    pub fn tracked_clients(&self) -> usize {
        self.clients.len()
    }
}

impl RateLimitStore for InMemoryRateLimiter {
    fn hit(&self, client_key: &str) -> RateLimitDecision {
        let now = Instant::now();

        let mut entry = self
            .clients
            .entry(client_key.to_string())
            .or_insert_with(|| ClientWindow {
                count: 0,
                started: now,
            });

        if now.duration_since(entry.started) >= self.window {
            entry.count = 0;
            entry.started = now;
        }

        let allowed = entry.count < self.max_requests;
        if allowed {
            entry.count += 1;
        }

        RateLimitDecision {
            allowed,
            limit: self.max_requests,
            remaining: self.max_requests.saturating_sub(entry.count),
            reset_after: self.window.saturating_sub(now.duration_since(entry.started)),
        }
    }

    fn purge_expired(&self) {
        let now = Instant::now();
        let before = self.clients.len();
        self.clients
            .retain(|_, state| now.duration_since(state.started) < self.window * 2);
        tracing::debug!(
            removed = before.saturating_sub(self.clients.len()),
            "Purged expired rate-limit windows"
        );
    }
}

/// Periodically purge expired windows until the runtime shuts down.
pub fn spawn_purge_task(
    store: Arc<dyn RateLimitStore>,
    every: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.tick().await;
        loop {
            interval.tick().await;
            store.purge_expired();
        }
    })
}

/// Identify the client: peer address, then first `X-Forwarded-For` entry.
#[must_use]
pub fn client_key(peer: Option<SocketAddr>, headers: &HeaderMap) -> String {
    if let Some(addr) = peer {
        return addr.ip().to_string();
    }

    headers
        .get(X_FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map_or_else(|| UNKNOWN_CLIENT.to_string(), str::to_string)
}

/// Middleware enforcing the limit and advertising it in `RateLimit-*` headers.
pub async fn enforce(
    State(store): State<Arc<dyn RateLimitStore>>,
    request: Request,
    next: Next,
) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let key = client_key(peer, request.headers());
    let decision = store.hit(&key);

    let mut response = if decision.allowed {
        next.run(request).await
    } else {
        tracing::warn!(client = %key, limit = decision.limit, "Rate limit exceeded");
        ApiError::RateLimited.into_response()
    };

    let headers = response.headers_mut();
    headers.insert(RATELIMIT_LIMIT, HeaderValue::from(decision.limit));
    headers.insert(RATELIMIT_REMAINING, HeaderValue::from(decision.remaining));
    headers.insert(
        RATELIMIT_RESET,
        HeaderValue::from(decision.reset_after.as_secs()),
    );

    response
}
