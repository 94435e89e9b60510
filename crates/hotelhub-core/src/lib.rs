//! Core types and utilities for hotelhub.
//!
//! This crate provides the foundational types shared by the gateway crates:
//!
//! - **Identifiers**: request correlation IDs and identity-provider subject IDs
//! - **Roles**: the staff/guest roles used for route authorization
//!
//! # Example
//!
//! ```
//! use hotelhub_core::{RequestId, Role, SubjectId};
//!
//! // Every inbound request gets a correlation ID
//! let request_id = RequestId::generate();
//!
//! // Roles parse from the lowercase claim value
//! let role: Role = "manager".parse().unwrap();
//! assert_eq!(role, Role::Manager);
//!
//! // Subject IDs come from the identity provider's `sub` claim
//! let subject = SubjectId::new("f3Yk2v9QpLq1").unwrap();
//! assert_eq!(subject.as_str(), "f3Yk2v9QpLq1");
//! # let _ = request_id;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod ids;
pub mod role;

pub use ids::{IdError, RequestId, SubjectId};
pub use role::Role;
