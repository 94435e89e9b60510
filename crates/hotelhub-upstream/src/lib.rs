//! Request forwarding from the hotelhub gateway to backing services.
//!
//! The gateway hands a [`ForwardRequest`] to a [`Forwarder`] and relays
//! whatever comes back. A response with any status is a success here; only
//! the absence of a response is an [`UpstreamError`]:
//!
//! | Failure            | Error                          | Status |
//! |--------------------|--------------------------------|--------|
//! | connect / transport | `UpstreamError::Unavailable`  | 502    |
//! | timeout            | `UpstreamError::Timeout`       | 504    |
//!
//! Requests are never retried.
//!
//! # Example
//!
//! ```no_run
//! use bytes::Bytes;
//! use hotelhub_routing::HttpMethod;
//! use hotelhub_upstream::{forward_headers, ForwardRequest, Forwarder, HttpForwarder};
//! use reqwest::header::HeaderMap;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let forwarder = HttpForwarder::default();
//!
//! let response = forwarder
//!     .forward(ForwardRequest {
//!         service: "room".into(),
//!         base_url: "http://localhost:3003".into(),
//!         method: HttpMethod::Get,
//!         path: "/api/rooms".into(),
//!         query: Some("floor=2".into()),
//!         headers: forward_headers(&HeaderMap::new(), None)?,
//!         body: Bytes::new(),
//!     })
//!     .await?;
//!
//! println!("room service answered {}", response.status);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod forwarder;
pub mod headers;

pub use error::{Result, UpstreamError};
pub use forwarder::{ForwardRequest, Forwarder, HttpForwarder, UpstreamResponse, DEFAULT_TIMEOUT};
pub use headers::{
    forward_headers, ForwardIdentity, PROPAGATED_HEADERS, X_REQUEST_ID, X_USER_EMAIL, X_USER_ID,
    X_USER_ROLE,
};
