//! HTTP API gateway for the hotelhub hotel-management platform.
//!
//! The gateway is the single public entry point in front of the backing
//! services (auth, rooms, bookings, guests, staff, transactions). For every
//! request it:
//!
//! - resolves `(method, path)` against a static route table
//! - verifies the bearer token on protected routes and resolves a role
//! - enforces the route's allowed-role set
//! - forwards the request and relays the response verbatim
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Clients                            │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      hotelhub-gateway                       │
//! │  request id → trace → CORS → rate limit → timeout → limit   │
//! │  ┌──────────┐  ┌──────────────┐  ┌───────────┐  ┌────────┐  │
//! │  │ Route    │─▶│ Identity     │─▶│ Role      │─▶│Forward │  │
//! │  │ table    │  │ resolver     │  │ guard     │  │        │  │
//! │  └──────────┘  └──────────────┘  └───────────┘  └────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!     ┌────────┬────────┬──────┴──┬────────┬─────────────┐
//!     ▼        ▼        ▼         ▼        ▼             ▼
//!   auth     room    booking    guest    staff     transaction
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use hotelhub_auth::{AuthConfig, JwksVerifier};
//! use hotelhub_gateway::{create_router, GatewayConfig, GatewayState};
//! use hotelhub_upstream::HttpForwarder;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = GatewayConfig::from_env()?;
//! let routes = config.route_table()?;
//! let verifier = Arc::new(JwksVerifier::new(AuthConfig::for_project("hotelhub-prod")));
//! let forwarder = Arc::new(HttpForwarder::new(config.upstream_timeout()));
//!
//! let listen_addr = config.listen_addr();
//! let app = create_router(GatewayState::new(routes, verifier, forwarder, config));
//!
//! let listener = tokio::net::TcpListener::bind(listen_addr).await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod pipeline;
pub mod rate_limit;
pub mod request_id;
pub mod routes;
pub mod state;

pub use config::{ConfigError, GatewayConfig};
pub use error::ApiError;
pub use rate_limit::{InMemoryRateLimiter, RateLimitDecision, RateLimitStore};
pub use routes::create_router;
pub use state::GatewayState;
