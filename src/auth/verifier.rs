// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token verifier adapter.
//!
//! A [`TokenVerifier`] checks a raw JWT's signature against the issuer's key
//! material and validates the registered claims (issuer, audience, expiry).
//! It does NOT check `nbf`; the login flow owns that check.
//!
//! ## Verifiers
//!
//! - [`JwksVerifier`] - production: JWKS key lookup + `jsonwebtoken` signature check
//! - [`InsecureVerifier`] - decodes the payload without a signature check
//!   (tests and the `dev` feature only)

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, decode_header, Validation};
use tokio::sync::RwLock;

use super::claims::{RegisteredClaims, VerifiedToken};
use super::error::VerificationError;
use super::jwks::{JwksManager, KeySetSource};

/// Source of the current time. Injected so tests can pin it.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Wall-clock time source.
pub fn system_clock() -> Clock {
    Arc::new(Utc::now)
}

/// Clock frozen at `at`.
pub fn fixed_clock(at: DateTime<Utc>) -> Clock {
    Arc::new(move || at)
}

/// Default clock skew tolerance for `exp` (60 seconds).
pub const DEFAULT_LEEWAY: Duration = Duration::from_secs(60);

/// Parameters of a single verification.
#[derive(Clone)]
pub struct VerifierParams {
    /// Expected audience (the configured resource / client id).
    pub audience: String,
    /// Expected issuer.
    pub issuer: String,
    /// Explicit key set URL; discovered from the issuer when `None`.
    pub jwks_url: Option<String>,
    /// Clock skew tolerance applied to `exp`.
    pub leeway: Duration,
    pub skip_audience_check: bool,
    pub skip_expiry_check: bool,
    pub skip_issuer_check: bool,
    /// Current time.
    pub now: Clock,
}

impl VerifierParams {
    pub fn new(audience: impl Into<String>, issuer: impl Into<String>) -> Self {
        Self {
            audience: audience.into(),
            issuer: issuer.into(),
            jwks_url: None,
            leeway: DEFAULT_LEEWAY,
            skip_audience_check: false,
            skip_expiry_check: false,
            skip_issuer_check: false,
            now: system_clock(),
        }
    }

    pub fn with_clock(mut self, now: Clock) -> Self {
        self.now = now;
        self
    }

    pub fn with_jwks_url(mut self, jwks_url: Option<String>) -> Self {
        self.jwks_url = jwks_url;
        self
    }

    pub fn with_leeway(mut self, leeway: Duration) -> Self {
        self.leeway = leeway;
        self
    }

    /// Where the signing keys for this issuer are published.
    pub fn key_set_source(&self) -> KeySetSource {
        match &self.jwks_url {
            Some(url) => KeySetSource::Url(url.clone()),
            None => KeySetSource::Discovery {
                issuer: self.issuer.clone(),
            },
        }
    }
}

impl fmt::Debug for VerifierParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerifierParams")
            .field("audience", &self.audience)
            .field("issuer", &self.issuer)
            .field("jwks_url", &self.jwks_url)
            .field("leeway", &self.leeway)
            .field("skip_audience_check", &self.skip_audience_check)
            .field("skip_expiry_check", &self.skip_expiry_check)
            .field("skip_issuer_check", &self.skip_issuer_check)
            .finish_non_exhaustive()
    }
}

/// Verifies a raw token and yields its decoded claims.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(
        &self,
        raw_token: &str,
        params: &VerifierParams,
    ) -> Result<VerifiedToken, VerificationError>;

    /// Make sure the key material for `params` is reachable (readiness check).
    async fn check_key_set(&self, _params: &VerifierParams) -> Result<(), VerificationError> {
        Ok(())
    }
}

/// Check issuer, audience and expiry against `params`. Shared by every verifier.
pub fn validate_registered_claims(
    claims: &RegisteredClaims,
    params: &VerifierParams,
) -> Result<(), VerificationError> {
    if !params.skip_issuer_check && claims.iss != params.issuer {
        return Err(VerificationError::InvalidIssuer {
            expected: params.issuer.clone(),
            found: claims.iss.clone(),
        });
    }

    if !params.skip_audience_check {
        let matches = claims
            .aud
            .as_ref()
            .is_some_and(|aud| aud.contains(&params.audience));
        if !matches {
            return Err(VerificationError::InvalidAudience {
                expected: params.audience.clone(),
                found: claims.aud.as_ref().map(|a| a.to_vec()).unwrap_or_default(),
            });
        }
    }

    if !params.skip_expiry_check {
        let expiry = claims
            .exp
            .ok_or_else(|| VerificationError::MalformedToken("missing exp claim".to_string()))?
            .0;
        let deadline = chrono::Duration::from_std(params.leeway)
            .ok()
            .and_then(|leeway| expiry.checked_add_signed(leeway))
            .ok_or_else(|| {
                VerificationError::Internal(format!(
                    "leeway of {}s is out of range",
                    params.leeway.as_secs()
                ))
            })?;
        if deadline < (params.now)() {
            return Err(VerificationError::TokenExpired { expired_at: expiry });
        }
    }

    Ok(())
}

/// Production verifier: signature check against the issuer's JWKS.
///
/// Keeps one [`JwksManager`] (and its key cache) per key set source.
pub struct JwksVerifier {
    client: reqwest::Client,
    managers: RwLock<HashMap<KeySetSource, Arc<JwksManager>>>,
}

impl JwksVerifier {
    pub fn new() -> Self {
        Self {
            client: JwksManager::http_client(),
            managers: RwLock::new(HashMap::new()),
        }
    }

    /// Register a pre-built manager, e.g. one with a pre-loaded key set.
    pub async fn with_manager(self, manager: JwksManager) -> Self {
        self.managers
            .write()
            .await
            .insert(manager.source().clone(), Arc::new(manager));
        self
    }

    async fn manager(&self, params: &VerifierParams) -> Arc<JwksManager> {
        let source = params.key_set_source();
        if let Some(manager) = self.managers.read().await.get(&source) {
            return manager.clone();
        }

        let mut managers = self.managers.write().await;
        managers
            .entry(source.clone())
            .or_insert_with(|| Arc::new(JwksManager::new(source, self.client.clone())))
            .clone()
    }
}

impl Default for JwksVerifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenVerifier for JwksVerifier {
    async fn verify(
        &self,
        raw_token: &str,
        params: &VerifierParams,
    ) -> Result<VerifiedToken, VerificationError> {
        let header = decode_header(raw_token)
            .map_err(|e| VerificationError::MalformedToken(e.to_string()))?;

        let manager = self.manager(params).await;
        let (decoding_key, algorithm) = match &header.kid {
            Some(kid) => manager.get_decoding_key(kid).await?,
            None => manager.get_any_decoding_key().await?,
        };

        // Signature only; registered claims are checked below with the
        // injected clock, and nbf is left to the caller
        let mut validation = Validation::new(algorithm);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let token_data = decode::<serde_json::Value>(raw_token, &decoding_key, &validation)?;

        let token = VerifiedToken::from_payload(token_data.claims)?;
        validate_registered_claims(&token.claims, params)?;
        Ok(token)
    }

    async fn check_key_set(&self, params: &VerifierParams) -> Result<(), VerificationError> {
        let manager = self.manager(params).await;
        if manager.is_cached().await {
            return Ok(());
        }
        manager.refresh().await
    }
}

/// Decodes the payload without verifying the signature.
///
/// WARNING: development and tests only.
#[cfg(any(test, feature = "dev"))]
#[derive(Debug, Default, Clone, Copy)]
pub struct InsecureVerifier;

#[cfg(any(test, feature = "dev"))]
#[async_trait]
impl TokenVerifier for InsecureVerifier {
    async fn verify(
        &self,
        raw_token: &str,
        params: &VerifierParams,
    ) -> Result<VerifiedToken, VerificationError> {
        let token_data = jsonwebtoken::dangerous::insecure_decode::<serde_json::Value>(raw_token)
            .map_err(|e| VerificationError::MalformedToken(e.to_string()))?;

        let token = VerifiedToken::from_payload(token_data.claims)?;
        validate_registered_claims(&token.claims, params)?;
        Ok(token)
    }
}
