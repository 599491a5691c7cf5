// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWKS (JSON Web Key Set) fetching and caching.
//!
//! ## Security
//!
//! - Keys are cached with a configurable TTL
//! - Stale cache is NOT used on fetch failure; verification fails instead
//! - When no explicit key set URL is configured, it is discovered from the
//!   issuer's `/.well-known/openid-configuration` document

use std::sync::Arc;
use std::time::{Duration, Instant};

use jsonwebtoken::jwk::{AlgorithmParameters, Jwk, JwkSet, KeyAlgorithm};
use jsonwebtoken::{Algorithm, DecodingKey};
use serde::Deserialize;
use tokio::sync::RwLock;

use super::error::VerificationError;

/// Default JWKS cache TTL (5 minutes).
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// HTTP timeout for key set and discovery requests.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Where the key set URL comes from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeySetSource {
    /// Explicit JWKS endpoint.
    Url(String),
    /// Resolve `jwks_uri` from the issuer's discovery document.
    Discovery { issuer: String },
}

/// JWKS cache entry.
struct CacheEntry {
    jwks: JwkSet,
    fetched_at: Instant,
}

/// Subset of the OpenID provider metadata we need.
#[derive(Deserialize)]
struct ProviderMetadata {
    jwks_uri: String,
}

/// JWKS manager with caching.
#[derive(Clone)]
pub struct JwksManager {
    /// Key set location
    source: KeySetSource,
    /// Cache TTL
    cache_ttl: Duration,
    /// JWKS URL, once resolved
    resolved_url: Arc<RwLock<Option<String>>>,
    /// Cached JWKS
    cache: Arc<RwLock<Option<CacheEntry>>>,
    /// HTTP client
    client: reqwest::Client,
}

impl JwksManager {
    /// Create a new JWKS manager.
    pub fn new(source: KeySetSource, client: reqwest::Client) -> Self {
        let resolved_url = match &source {
            KeySetSource::Url(url) => Some(url.clone()),
            KeySetSource::Discovery { .. } => None,
        };
        Self {
            source,
            cache_ttl: DEFAULT_CACHE_TTL,
            resolved_url: Arc::new(RwLock::new(resolved_url)),
            cache: Arc::new(RwLock::new(None)),
            client,
        }
    }

    /// HTTP client shared by all managers.
    pub fn http_client() -> reqwest::Client {
        reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .unwrap_or_default()
    }

    /// Manager whose cache is pre-filled with `jwks` and never expires.
    #[cfg(test)]
    pub(crate) fn preloaded(source: KeySetSource, jwks: JwkSet) -> Self {
        let manager = Self::new(source, Self::http_client()).with_cache_ttl(Duration::MAX);
        *manager.cache.try_write().expect("fresh lock") = Some(CacheEntry {
            jwks,
            fetched_at: Instant::now(),
        });
        manager
    }

    /// Create with custom cache TTL.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Get the key set source.
    pub fn source(&self) -> &KeySetSource {
        &self.source
    }

    /// Resolve the JWKS URL, running discovery on first use.
    async fn jwks_url(&self) -> Result<String, VerificationError> {
        if let Some(url) = &*self.resolved_url.read().await {
            return Ok(url.clone());
        }

        let KeySetSource::Discovery { issuer } = &self.source else {
            return Err(VerificationError::Internal(
                "key set URL missing".to_string(),
            ));
        };

        let discovery_url = format!(
            "{}/.well-known/openid-configuration",
            issuer.trim_end_matches('/')
        );
        let metadata: ProviderMetadata = self.fetch_json(&discovery_url).await?;
        tracing::debug!(issuer = %issuer, jwks_uri = %metadata.jwks_uri, "Discovered JWKS endpoint");

        *self.resolved_url.write().await = Some(metadata.jwks_uri.clone());
        Ok(metadata.jwks_uri)
    }

    /// Fetch JWKS (with caching).
    async fn get_jwks(&self) -> Result<JwkSet, VerificationError> {
        // Check cache first
        {
            let cache = self.cache.read().await;
            if let Some(entry) = &*cache {
                if entry.fetched_at.elapsed() < self.cache_ttl {
                    return Ok(entry.jwks.clone());
                }
            }
        }

        let url = self.jwks_url().await?;
        let jwks: JwkSet = self.fetch_json(&url).await?;

        {
            let mut cache = self.cache.write().await;
            *cache = Some(CacheEntry {
                jwks: jwks.clone(),
                fetched_at: Instant::now(),
            });
        }

        Ok(jwks)
    }

    async fn fetch_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<T, VerificationError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| VerificationError::KeySetFetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(VerificationError::KeySetFetch(format!(
                "HTTP {} from {url}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| VerificationError::KeySetFetch(e.to_string()))
    }

    /// Get a decoding key for the given key ID.
    pub async fn get_decoding_key(
        &self,
        kid: &str,
    ) -> Result<(DecodingKey, Algorithm), VerificationError> {
        let jwks = self.get_jwks().await?;

        let jwk = jwks
            .keys
            .iter()
            .find(|k| k.common.key_id.as_deref() == Some(kid))
            .ok_or(VerificationError::NoMatchingKey)?;

        jwk_to_decoding_key(jwk)
    }

    /// Get any valid decoding key (for tokens without kid).
    pub async fn get_any_decoding_key(&self) -> Result<(DecodingKey, Algorithm), VerificationError> {
        let jwks = self.get_jwks().await?;

        jwks.keys
            .iter()
            .find_map(|jwk| jwk_to_decoding_key(jwk).ok())
            .ok_or(VerificationError::NoMatchingKey)
    }

    /// Force refresh the JWKS cache.
    pub async fn refresh(&self) -> Result<(), VerificationError> {
        let url = self.jwks_url().await?;
        let jwks = self.fetch_json(&url).await?;
        let mut cache = self.cache.write().await;
        *cache = Some(CacheEntry {
            jwks,
            fetched_at: Instant::now(),
        });
        Ok(())
    }

    /// Check if JWKS is currently cached and valid.
    pub async fn is_cached(&self) -> bool {
        let cache = self.cache.read().await;
        if let Some(entry) = &*cache {
            entry.fetched_at.elapsed() < self.cache_ttl
        } else {
            false
        }
    }
}

/// Convert a JWK to a DecodingKey.
fn jwk_to_decoding_key(jwk: &Jwk) -> Result<(DecodingKey, Algorithm), VerificationError> {
    match &jwk.algorithm {
        AlgorithmParameters::RSA(rsa) => {
            let key = DecodingKey::from_rsa_components(&rsa.n, &rsa.e).map_err(|e| {
                VerificationError::Internal(format!("Failed to create RSA key: {e}"))
            })?;

            let alg = match jwk.common.key_algorithm {
                Some(KeyAlgorithm::RS384) => Algorithm::RS384,
                Some(KeyAlgorithm::RS512) => Algorithm::RS512,
                Some(KeyAlgorithm::PS256) => Algorithm::PS256,
                Some(KeyAlgorithm::PS384) => Algorithm::PS384,
                Some(KeyAlgorithm::PS512) => Algorithm::PS512,
                _ => Algorithm::RS256,
            };

            Ok((key, alg))
        }
        AlgorithmParameters::EllipticCurve(ec) => {
            let key = DecodingKey::from_ec_components(&ec.x, &ec.y).map_err(|e| {
                VerificationError::Internal(format!("Failed to create EC key: {e}"))
            })?;

            let alg = match jwk.common.key_algorithm {
                Some(KeyAlgorithm::ES384) => Algorithm::ES384,
                _ => Algorithm::ES256,
            };

            Ok((key, alg))
        }
        _ => Err(VerificationError::Internal(
            "Unsupported key type in JWKS".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_url_is_resolved_up_front() {
        let manager = JwksManager::new(
            KeySetSource::Url("https://login.example.com/keys".into()),
            JwksManager::http_client(),
        );
        assert_eq!(
            manager.source(),
            &KeySetSource::Url("https://login.example.com/keys".into())
        );
    }

    #[tokio::test]
    async fn explicit_url_skips_discovery() {
        let manager = JwksManager::new(
            KeySetSource::Url("https://login.example.com/keys".into()),
            JwksManager::http_client(),
        );
        assert_eq!(
            manager.jwks_url().await.unwrap(),
            "https://login.example.com/keys"
        );
    }

    #[test]
    fn custom_cache_ttl() {
        let manager = JwksManager::new(
            KeySetSource::Discovery {
                issuer: "https://login.example.com".into(),
            },
            JwksManager::http_client(),
        )
        .with_cache_ttl(Duration::from_secs(60));
        assert_eq!(manager.cache_ttl, Duration::from_secs(60));
    }

    #[tokio::test]
    async fn cache_initially_empty() {
        let manager = JwksManager::new(
            KeySetSource::Url("https://login.example.com/keys".into()),
            JwksManager::http_client(),
        );
        assert!(!manager.is_cached().await);
    }

    #[test]
    fn rsa_jwk_converts_to_key() {
        let jwks: JwkSet = serde_json::from_value(serde_json::json!({
            "keys": [{
                "kty": "RSA",
                "kid": "k1",
                "alg": "RS256",
                "use": "sig",
                "n": "sXchDaQebHnPiGvyDOAT4saGEUetSyo9MKLOoWFsueri23bOdgWp4Dy1WlUzewbgBHod5pcM9H95GQRV3JDXboIRROSBigeC5yjU1hGzHHyXss8UDprecbAYxknTcQkhslANGRUZmdTOQ5qTRsLAt6BTYuyvVRdhS8exSZEy_c4gs_7svlJJQ4H9_NxsiIoLwAEk7-Q3UXERGYw_75IDrGA84-lA_-Ct4eTlXHBIY2EaV7t7LjJaynVJCpkv4LKjTTAumiGUIuQhrNhZLuF_RJLqHpM2kgWFLU7-VTdL1VbC2tejvcI2BlMkEpk1BzBZI0KQB0GaDWFLN-aEAw3vRw",
                "e": "AQAB"
            }]
        }))
        .unwrap();

        let (_, alg) = jwk_to_decoding_key(&jwks.keys[0]).unwrap();
        assert_eq!(alg, Algorithm::RS256);
    }
}
