//! Static route table for the hotelhub gateway.
//!
//! Maps an incoming `(method, path)` to the backing service that owns it,
//! together with the route's access requirements:
//!
//! - [`RouteDeclaration`]: method, path template, public/protected, allowed roles
//! - [`ServiceDescriptor`]: a backing service's name, base URL and routes
//! - [`RouteTable`]: the validated, immutable set of all services
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────┐   ┌────────────────────┐
//! │  hotel_services()  │   │  ROUTES_FILE json  │
//! └─────────┬──────────┘   └─────────┬──────────┘
//!           └───────────┬────────────┘
//!                       ▼
//!            ┌────────────────────┐
//!            │ RouteTable::new    │  duplicate / conflict / URL checks
//!            └─────────┬──────────┘
//!                      ▼
//!            ┌────────────────────┐
//!            │ resolve(m, path)   │──▶ RouteMatch { service, route,
//!            └────────────────────┘                params, upstream_path }
//! ```
//!
//! # Example
//!
//! ```
//! use hotelhub_routing::{hotel_services, HttpMethod, RouteTable, ServiceUrls};
//!
//! let table = RouteTable::new(hotel_services(&ServiceUrls::default())?)?;
//!
//! let m = table.resolve(HttpMethod::Get, "/api/rooms/101").expect("declared");
//! assert_eq!(m.service.name, "room");
//! assert!(m.route.is_public());
//! assert_eq!(m.upstream_path, "/api/rooms/101");
//!
//! assert!(table.resolve(HttpMethod::Get, "/api/nonexistent").is_none());
//! # Ok::<(), hotelhub_routing::RouteError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod declaration;
pub mod error;
pub mod hotel;
pub mod table;
pub mod template;

pub use declaration::{HttpMethod, RouteDeclaration, ServiceDescriptor, Visibility};
pub use error::{Result, RouteError};
pub use hotel::{hotel_services, load_services_file, parse_services, ServiceUrls};
pub use table::{RouteMatch, RouteTable};
pub use template::PathTemplate;
