//! The hotel platform's route declarations.
//!
//! Each backing service mounts its API under the same `/api/...` prefix the
//! gateway exposes, so upstream paths equal gateway paths.

use std::path::Path;

use serde::Deserialize;

use hotelhub_core::Role;

use crate::declaration::{HttpMethod, RouteDeclaration, ServiceDescriptor};
use crate::error::{Result, RouteError};

/// Base URLs of the backing services.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceUrls {
    /// Auth service.
    pub auth: String,
    /// Room service.
    pub room: String,
    /// Booking service.
    pub booking: String,
    /// Guest service.
    pub guest: String,
    /// Staff service.
    pub staff: String,
    /// Transaction service.
    pub transaction: String,
}

impl Default for ServiceUrls {
    fn default() -> Self {
        Self {
            auth: "http://localhost:3002".to_string(),
            room: "http://localhost:3003".to_string(),
            booking: "http://localhost:3004".to_string(),
            guest: "http://localhost:3005".to_string(),
            staff: "http://localhost:3006".to_string(),
            transaction: "http://localhost:3007".to_string(),
        }
    }
}

/// Build the hotel platform's service descriptors.
///
/// # Errors
///
/// Only fails if a built-in pattern is malformed.
pub fn hotel_services(urls: &ServiceUrls) -> Result<Vec<ServiceDescriptor>> {
    use HttpMethod::{Delete, Get, Post, Put};

    const MANAGEMENT: &[Role] = &[Role::Admin, Role::Manager];
    const FRONT_DESK: &[Role] = &[Role::Admin, Role::Manager, Role::Receptionist];
    const ANY: &[Role] = &[];

    let public = RouteDeclaration::public;
    let protected = RouteDeclaration::protected;

    Ok(vec![
        ServiceDescriptor::new(
            "auth",
            &urls.auth,
            vec![
                public(Post, "/api/auth/register")?,
                public(Post, "/api/auth/login")?,
                protected(Post, "/api/auth/logout", ANY)?,
                public(Post, "/api/auth/refresh")?,
                protected(Get, "/api/auth/me", ANY)?,
            ],
        ),
        ServiceDescriptor::new(
            "room",
            &urls.room,
            vec![
                public(Get, "/api/rooms")?,
                protected(Post, "/api/rooms", MANAGEMENT)?,
                public(Get, "/api/rooms/:id")?,
                protected(Put, "/api/rooms/:id", MANAGEMENT)?,
                protected(Delete, "/api/rooms/:id", &[Role::Admin])?,
            ],
        ),
        ServiceDescriptor::new(
            "booking",
            &urls.booking,
            vec![
                protected(Get, "/api/bookings", ANY)?,
                protected(Post, "/api/bookings", ANY)?,
                protected(Get, "/api/bookings/:id", ANY)?,
                protected(Put, "/api/bookings/:id", ANY)?,
                protected(Post, "/api/bookings/:id/cancel", ANY)?,
            ],
        ),
        ServiceDescriptor::new(
            "guest",
            &urls.guest,
            vec![
                protected(Get, "/api/guests", FRONT_DESK)?,
                protected(Post, "/api/guests", ANY)?,
                protected(Get, "/api/guests/:id", ANY)?,
                protected(Put, "/api/guests/:id", ANY)?,
            ],
        ),
        ServiceDescriptor::new(
            "staff",
            &urls.staff,
            vec![
                protected(Get, "/api/staff", MANAGEMENT)?,
                protected(Post, "/api/staff", MANAGEMENT)?,
                protected(Get, "/api/staff/:id", MANAGEMENT)?,
                protected(Put, "/api/staff/:id", MANAGEMENT)?,
            ],
        ),
        ServiceDescriptor::new(
            "transaction",
            &urls.transaction,
            vec![
                protected(Get, "/api/transactions", MANAGEMENT)?,
                protected(Post, "/api/transactions", ANY)?,
                protected(Get, "/api/transactions/:id", ANY)?,
            ],
        ),
    ])
}

/// Route file layout: `{ "services": [ ... ] }`.
#[derive(Debug, Deserialize)]
struct RouteFile {
    services: Vec<ServiceDescriptor>,
}

/// Parse service descriptors from route-file JSON.
///
/// # Errors
///
/// Returns `RouteError::Parse` if the JSON does not match the route schema.
pub fn parse_services(json: &str) -> Result<Vec<ServiceDescriptor>> {
    let file: RouteFile = serde_json::from_str(json)?;
    Ok(file.services)
}

/// Read service descriptors from a route file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_services_file(path: &Path) -> Result<Vec<ServiceDescriptor>> {
    let json = std::fs::read_to_string(path).map_err(|source| RouteError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %path.display(), "Loading route file");
    parse_services(&json)
}
