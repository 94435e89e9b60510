//! JWKS (JSON Web Key Set) fetching and caching.
//!
//! This module handles fetching the identity provider's public signing keys
//! and caching them so that token verification does not hit the network on
//! every request.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use jsonwebtoken::DecodingKey;
use parking_lot::RwLock;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::error::{AuthError, Result};
use crate::AuthConfig;

/// JWKS response from the identity provider.
#[derive(Debug, Deserialize)]
pub struct JwksResponse {
    /// The list of keys.
    pub keys: Vec<JwkKey>,
}

/// A single JWK (JSON Web Key).
#[derive(Debug, Deserialize)]
pub struct JwkKey {
    /// Key type; only "RSA" keys are used.
    pub kty: String,
    /// Key ID.
    pub kid: Option<String>,
    /// Key use (e.g., "sig").
    #[serde(rename = "use")]
    pub key_use: Option<String>,
    /// Algorithm (e.g., `RS256`).
    pub alg: Option<String>,
    /// RSA modulus (base64url encoded).
    pub n: Option<String>,
    /// RSA public exponent (base64url encoded).
    pub e: Option<String>,
}

/// Cached JWKS keys with fetch time.
struct CachedKeys {
    keys: HashMap<String, DecodingKey>,
    fetched_at: Instant,
    /// Last fetch attempt, successful or not.
    attempted_at: Option<Instant>,
}

impl Default for CachedKeys {
    fn default() -> Self {
        Self {
            keys: HashMap::new(),
            // Far past so the first lookup triggers a fetch
            fetched_at: Instant::now()
                .checked_sub(Duration::from_secs(24 * 3600))
                .unwrap_or_else(Instant::now),
            attempted_at: None,
        }
    }
}

/// JWKS key provider that fetches and caches keys.
pub struct JwksProvider {
    config: AuthConfig,
    client: reqwest::Client,
    cache: RwLock<CachedKeys>,
    refresh: Mutex<()>,
}

impl JwksProvider {
    /// Create a new JWKS provider with the given configuration.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be created (should never happen with default TLS).
    #[must_use]
    pub fn new(config: AuthConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("failed to create HTTP client");

        Self {
            config,
            client,
            cache: RwLock::new(CachedKeys::default()),
            refresh: Mutex::new(()),
        }
    }

    /// Get a decoding key by key ID, fetching from JWKS if necessary.
    ///
    /// An unknown key ID triggers a refetch, so key rotation on the
    /// provider side is picked up without waiting for the refresh interval.
    /// Refetches are serialized and at most one happens per
    /// `jwks_min_refetch_seconds`; lookups inside that window are answered
    /// from the cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is not found or JWKS fetch fails.
    pub async fn get_key(&self, kid: &str) -> Result<DecodingKey> {
        let refresh_interval = Duration::from_secs(self.config.jwks_refresh_seconds);
        {
            let cache = self.cache.read();
            if cache.fetched_at.elapsed() < refresh_interval {
                if let Some(key) = cache.keys.get(kid) {
                    return Ok(key.clone());
                }
            }
        }

        let _refreshing = self.refresh.lock().await;

        let min_refetch = Duration::from_secs(self.config.jwks_min_refetch_seconds);
        let recently_attempted = self
            .cache
            .read()
            .attempted_at
            .is_some_and(|at| at.elapsed() < min_refetch);

        if recently_attempted {
            tracing::debug!(kid = %kid, "JWKS refetch suppressed by cooldown");
        } else {
            self.refresh_keys().await?;
        }

        self.cache
            .read()
            .keys
            .get(kid)
            .cloned()
            .ok_or_else(|| AuthError::KeyNotFound(kid.to_string()))
    }

    /// Number of keys currently cached.
    #[must_use]
    pub fn cached_key_count(&self) -> usize {
        self.cache.read().keys.len()
    }

    /// Refresh the JWKS cache by fetching from the provider.
    async fn refresh_keys(&self) -> Result<()> {
        let jwks_url = &self.config.jwks_url;
        tracing::debug!(url = %jwks_url, "Fetching JWKS");
        self.cache.write().attempted_at = Some(Instant::now());

        let response = self
            .client
            .get(jwks_url)
            .send()
            .await
            .map_err(|e| AuthError::JwksFetchFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::JwksFetchFailed(format!(
                "JWKS endpoint returned {}",
                response.status()
            )));
        }

        let jwks: JwksResponse = response
            .json()
            .await
            .map_err(|e| AuthError::JwksFetchFailed(e.to_string()))?;

        let mut new_keys = HashMap::new();

        for key in jwks.keys {
            if let Some(kid) = &key.kid {
                if let Some(decoding_key) = Self::parse_key(&key)? {
                    new_keys.insert(kid.clone(), decoding_key);
                }
            }
        }

        tracing::debug!(count = new_keys.len(), "Cached JWKS keys");

        let mut cache = self.cache.write();
        cache.keys = new_keys;
        cache.fetched_at = Instant::now();

        Ok(())
    }

    /// Parse a JWK into a `DecodingKey`.
    fn parse_key(key: &JwkKey) -> Result<Option<DecodingKey>> {
        match key.kty.as_str() {
            "RSA" => {
                let (Some(n), Some(e)) = (key.n.as_deref(), key.e.as_deref()) else {
                    return Err(AuthError::InvalidToken(
                        "RSA key missing n or e parameter".to_string(),
                    ));
                };

                DecodingKey::from_rsa_components(n, e)
                    .map(Some)
                    .map_err(|e| AuthError::InvalidToken(format!("invalid RSA key: {e}")))
            }
            other => {
                tracing::warn!(kty = other, "Unknown key type");
                Ok(None)
            }
        }
    }
}
