//! Gateway configuration types.
//!
//! Values come from the process environment (optionally seeded from
//! `.env.gateway` / `.env` by the binary). Malformed values are startup
//! errors rather than silent fallbacks.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use hotelhub_routing::{hotel_services, load_services_file, RouteError, RouteTable, ServiceUrls};

/// Errors raised while reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed.
    #[error("invalid value for {name}: '{value}'")]
    InvalidValue {
        /// Variable name.
        name: &'static str,
        /// The rejected value.
        value: String,
    },

    /// A required variable is not set.
    #[error("{0} must be set")]
    Missing(&'static str),
}

/// Configuration for the gateway service.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Bind host.
    #[serde(default = "GatewayConfig::default_host")]
    pub host: String,

    /// Bind port.
    #[serde(default = "GatewayConfig::default_port")]
    pub port: u16,

    /// Allowed CORS origins; `*` allows any.
    #[serde(default = "GatewayConfig::default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Rate-limit window length in minutes.
    #[serde(default = "GatewayConfig::default_rate_limit_window")]
    pub rate_limit_window_minutes: u64,

    /// Requests allowed per client per window.
    #[serde(default = "GatewayConfig::default_rate_limit_max")]
    pub rate_limit_max_requests: u32,

    /// Forwarding timeout in seconds.
    #[serde(default = "GatewayConfig::default_upstream_timeout")]
    pub upstream_timeout_seconds: u64,

    /// Overall request timeout in seconds.
    #[serde(default = "GatewayConfig::default_request_timeout")]
    pub request_timeout_seconds: u64,

    /// Maximum request body size in bytes.
    #[serde(default = "GatewayConfig::default_max_body")]
    pub max_body_bytes: usize,

    /// Backing service base URLs for the built-in route table.
    #[serde(default)]
    pub services: ServiceUrls,

    /// JSON route file replacing the built-in table.
    #[serde(default)]
    pub routes_file: Option<PathBuf>,

    /// Identity-provider project; required unless running in dev mode.
    #[serde(default)]
    pub firebase_project_id: Option<String>,

    /// Override for the identity provider's JWKS endpoint.
    #[serde(default)]
    pub jwks_url: Option<String>,

    /// Use the mock verifier (binary built with `dev-mode` only).
    #[serde(default)]
    pub dev_mode: bool,
}

impl GatewayConfig {
    fn default_host() -> String {
        "0.0.0.0".to_string()
    }

    const fn default_port() -> u16 {
        3001
    }

    fn default_cors_origins() -> Vec<String> {
        vec!["*".to_string()]
    }

    const fn default_rate_limit_window() -> u64 {
        15
    }

    const fn default_rate_limit_max() -> u32 {
        100
    }

    const fn default_upstream_timeout() -> u64 {
        10
    }

    const fn default_request_timeout() -> u64 {
        30
    }

    const fn default_max_body() -> usize {
        1024 * 1024 // 1 MB
    }

    /// Read configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric or boolean variable is malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through an arbitrary variable lookup.
    ///
    /// Unset and empty variables take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric or boolean variable is malformed, or
    /// if a window, limit or timeout is zero or out of range.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();
        let service_defaults = ServiceUrls::default();

        let config = Self {
            host: get("HOST").unwrap_or(defaults.host),
            port: parse_var(&get, "PORT")?.unwrap_or(defaults.port),
            cors_origins: get("CORS_ORIGINS").map_or(defaults.cors_origins, |v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(str::to_string)
                    .collect()
            }),
            rate_limit_window_minutes: match parse_var(&get, "RATE_LIMIT_WINDOW_MINUTES")? {
                Some(minutes) => minutes,
                // Older deployments set the window in minutes under this name.
                None => parse_var(&get, "RATE_LIMIT_WINDOW_MS")?
                    .unwrap_or(defaults.rate_limit_window_minutes),
            },
            rate_limit_max_requests: parse_var(&get, "RATE_LIMIT_MAX_REQUESTS")?
                .unwrap_or(defaults.rate_limit_max_requests),
            upstream_timeout_seconds: parse_var(&get, "UPSTREAM_TIMEOUT_SECONDS")?
                .unwrap_or(defaults.upstream_timeout_seconds),
            request_timeout_seconds: parse_var(&get, "REQUEST_TIMEOUT_SECONDS")?
                .unwrap_or(defaults.request_timeout_seconds),
            max_body_bytes: parse_var(&get, "MAX_BODY_BYTES")?.unwrap_or(defaults.max_body_bytes),
            services: ServiceUrls {
                auth: get("AUTH_SERVICE_URL").unwrap_or(service_defaults.auth),
                room: get("ROOM_SERVICE_URL").unwrap_or(service_defaults.room),
                booking: get("BOOKING_SERVICE_URL").unwrap_or(service_defaults.booking),
                guest: get("GUEST_SERVICE_URL").unwrap_or(service_defaults.guest),
                staff: get("STAFF_SERVICE_URL").unwrap_or(service_defaults.staff),
                transaction: get("TRANSACTION_SERVICE_URL")
                    .unwrap_or(service_defaults.transaction),
            },
            routes_file: get("ROUTES_FILE").map(PathBuf::from),
            firebase_project_id: get("FIREBASE_PROJECT_ID"),
            jwks_url: get("JWKS_URL"),
            dev_mode: parse_bool(&get, "DEV_MODE")?.unwrap_or(false),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would disable a limit or fail every request.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the first offending variable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |name: &'static str, value: &dyn std::fmt::Display| {
            Err(ConfigError::InvalidValue {
                name,
                value: value.to_string(),
            })
        };

        let window = self.rate_limit_window_minutes;
        if window == 0 || window.checked_mul(60).is_none() {
            return invalid("RATE_LIMIT_WINDOW_MINUTES", &window);
        }
        if self.rate_limit_max_requests == 0 {
            return invalid("RATE_LIMIT_MAX_REQUESTS", &self.rate_limit_max_requests);
        }
        if self.upstream_timeout_seconds == 0 {
            return invalid("UPSTREAM_TIMEOUT_SECONDS", &self.upstream_timeout_seconds);
        }
        if self.request_timeout_seconds == 0 {
            return invalid("REQUEST_TIMEOUT_SECONDS", &self.request_timeout_seconds);
        }
        if self.max_body_bytes == 0 {
            return invalid("MAX_BODY_BYTES", &self.max_body_bytes);
        }
        Ok(())
    }

    /// The identity-provider project, required outside dev mode.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if `FIREBASE_PROJECT_ID` is unset.
    pub fn require_project_id(&self) -> Result<&str, ConfigError> {
        self.firebase_project_id
            .as_deref()
            .ok_or(ConfigError::Missing("FIREBASE_PROJECT_ID"))
    }

    /// The bind address, `host:port`.
    #[must_use]
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the rate-limit window as a `Duration`.
    #[must_use]
    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_minutes.saturating_mul(60))
    }

    /// Get the forwarding timeout as a `Duration`.
    #[must_use]
    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_seconds)
    }

    /// Get the request timeout as a `Duration`.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// Build and validate the route table this configuration describes.
    ///
    /// # Errors
    ///
    /// Returns an error if the route file cannot be loaded or the table
    /// fails validation.
    pub fn route_table(&self) -> Result<RouteTable, RouteError> {
        let services = match &self.routes_file {
            Some(path) => load_services_file(path)?,
            None => hotel_services(&self.services)?,
        };
        RouteTable::new(services)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            cors_origins: Self::default_cors_origins(),
            rate_limit_window_minutes: Self::default_rate_limit_window(),
            rate_limit_max_requests: Self::default_rate_limit_max(),
            upstream_timeout_seconds: Self::default_upstream_timeout(),
            request_timeout_seconds: Self::default_request_timeout(),
            max_body_bytes: Self::default_max_body(),
            services: ServiceUrls::default(),
            routes_file: None,
            firebase_project_id: None,
            jwks_url: None,
            dev_mode: false,
        }
    }
}

fn parse_var<T, G>(get: &G, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    G: Fn(&str) -> Option<String>,
{
    get(name)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue { name, value })
        })
        .transpose()
}

fn parse_bool<G>(get: &G, name: &'static str) -> Result<Option<bool>, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    get(name)
        .map(|value| match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidValue { name, value }),
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn from_vars(vars: &[(&str, &str)]) -> Result<GatewayConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        GatewayConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn default_config() {
        let config = GatewayConfig::default();
        assert_eq!(config.listen_addr(), "0.0.0.0:3001");
        assert_eq!(config.rate_limit_max_requests, 100);
        assert_eq!(config.rate_limit_window(), Duration::from_secs(15 * 60));
        assert_eq!(config.max_body_bytes, 1024 * 1024);
        assert_eq!(config.cors_origins, vec!["*"]);
        assert!(!config.dev_mode);
    }

    #[test]
    fn empty_environment_is_default() {
        let config = from_vars(&[]).unwrap();
        assert_eq!(config.port, 3001);
        assert_eq!(config.services, ServiceUrls::default());
        assert!(config.routes_file.is_none());
    }

    #[test]
    fn reads_variables() {
        let config = from_vars(&[
            ("PORT", "8080"),
            ("RATE_LIMIT_WINDOW_MINUTES", "1"),
            ("RATE_LIMIT_MAX_REQUESTS", "5"),
            ("UPSTREAM_TIMEOUT_SECONDS", "3"),
            ("CORS_ORIGINS", "https://app.hotel.test, https://admin.hotel.test"),
            ("ROOM_SERVICE_URL", "http://room-service:3003"),
            ("FIREBASE_PROJECT_ID", "hotelhub-prod"),
            ("DEV_MODE", "true"),
        ])
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.rate_limit_window(), Duration::from_secs(60));
        assert_eq!(config.rate_limit_max_requests, 5);
        assert_eq!(config.upstream_timeout(), Duration::from_secs(3));
        assert_eq!(
            config.cors_origins,
            vec!["https://app.hotel.test", "https://admin.hotel.test"]
        );
        assert_eq!(config.services.room, "http://room-service:3003");
        assert_eq!(config.services.auth, "http://localhost:3002");
        assert_eq!(config.require_project_id().unwrap(), "hotelhub-prod");
        assert!(config.dev_mode);
    }

    #[test]
    fn malformed_numbers_are_errors() {
        let err = from_vars(&[("PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { name: "PORT", .. }));

        let err = from_vars(&[("DEV_MODE", "maybe")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { name: "DEV_MODE", .. }));
    }

    #[test]
    fn zero_limits_are_errors() {
        for name in [
            "RATE_LIMIT_WINDOW_MINUTES",
            "RATE_LIMIT_MAX_REQUESTS",
            "UPSTREAM_TIMEOUT_SECONDS",
            "REQUEST_TIMEOUT_SECONDS",
            "MAX_BODY_BYTES",
        ] {
            let err = from_vars(&[(name, "0")]).unwrap_err();
            assert!(
                matches!(&err, ConfigError::InvalidValue { name: n, .. } if *n == name),
                "{name}: {err}"
            );
        }
    }

    #[test]
    fn oversized_window_is_an_error() {
        let huge = u64::MAX.to_string();
        let err = from_vars(&[("RATE_LIMIT_WINDOW_MINUTES", huge.as_str())]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                name: "RATE_LIMIT_WINDOW_MINUTES",
                ..
            }
        ));
    }

    #[test]
    fn legacy_window_variable() {
        let config = from_vars(&[("RATE_LIMIT_WINDOW_MS", "5")]).unwrap();
        assert_eq!(config.rate_limit_window(), Duration::from_secs(5 * 60));

        let config = from_vars(&[
            ("RATE_LIMIT_WINDOW_MS", "5"),
            ("RATE_LIMIT_WINDOW_MINUTES", "2"),
        ])
        .unwrap();
        assert_eq!(config.rate_limit_window_minutes, 2);
    }

    #[test]
    fn missing_project_id() {
        let config = GatewayConfig::default();
        assert!(matches!(
            config.require_project_id(),
            Err(ConfigError::Missing("FIREBASE_PROJECT_ID"))
        ));
    }

    #[test]
    fn builds_default_route_table() {
        let table = GatewayConfig::default().route_table().unwrap();
        assert_eq!(table.services().len(), 6);
    }
}
