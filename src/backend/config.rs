// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Backend configuration: the trusted issuer and the expected audience.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;
use utoipa::ToSchema;

use crate::auth::{Clock, VerifierParams};
use crate::error::BackendError;
use crate::storage::Storage;

/// Storage key of the backend configuration.
pub const CONFIG_KEY: &str = "config";

/// Largest accepted clock skew tolerance (one hour).
pub const MAX_LEEWAY_SECS: u64 = 3600;

fn default_leeway_secs() -> u64 {
    60
}

/// Issuer trust settings, persisted at [`CONFIG_KEY`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BackendConfig {
    /// Token issuer URL; must match the `iss` claim.
    #[schema(example = "https://sts.windows.net/00000000-0000-0000-0000-000000000000/")]
    pub issuer: String,

    /// Expected audience (`aud` claim).
    #[schema(example = "https://management.azure.com/")]
    pub resource: String,

    /// Explicit JWKS endpoint. Discovered from the issuer when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jwks_url: Option<String>,

    /// Clock skew tolerance for `exp`, in seconds.
    #[serde(default = "default_leeway_secs")]
    pub leeway_secs: u64,
}

impl BackendConfig {
    pub fn new(issuer: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            resource: resource.into(),
            jwks_url: None,
            leeway_secs: default_leeway_secs(),
        }
    }

    /// Reject empty or unparsable values.
    pub fn validate(&self) -> Result<(), BackendError> {
        if self.issuer.trim().is_empty() {
            return Err(BackendError::invalid_request("issuer is required"));
        }
        Url::parse(&self.issuer)
            .map_err(|e| BackendError::invalid_request(format!("invalid issuer URL: {e}")))?;

        if self.resource.trim().is_empty() {
            return Err(BackendError::invalid_request("resource is required"));
        }

        if self.leeway_secs > MAX_LEEWAY_SECS {
            return Err(BackendError::invalid_request(format!(
                "leeway_secs must not exceed {MAX_LEEWAY_SECS}"
            )));
        }

        if let Some(jwks_url) = &self.jwks_url {
            let url = Url::parse(jwks_url)
                .map_err(|e| BackendError::invalid_request(format!("invalid jwks_url: {e}")))?;
            if !matches!(url.scheme(), "https" | "http") {
                return Err(BackendError::invalid_request(
                    "jwks_url must be an http(s) URL",
                ));
            }
        }
        Ok(())
    }

    /// Verifier parameters for a login: audience is the configured resource.
    pub fn verifier_params(&self, now: Clock) -> VerifierParams {
        VerifierParams::new(&self.resource, &self.issuer)
            .with_jwks_url(self.jwks_url.clone())
            .with_leeway(Duration::from_secs(self.leeway_secs))
            .with_clock(now)
    }
}

/// Repository for the single configuration record.
pub struct ConfigStore<'a> {
    storage: &'a dyn Storage,
}

impl<'a> ConfigStore<'a> {
    pub fn new(storage: &'a dyn Storage) -> Self {
        Self { storage }
    }

    /// Current configuration, `None` until one is written.
    pub fn get(&self) -> Result<Option<BackendConfig>, BackendError> {
        let Some(raw) = self.storage.get(CONFIG_KEY)? else {
            return Ok(None);
        };
        let config = serde_json::from_slice(&raw).map_err(|source| {
            BackendError::MalformedRecord {
                key: CONFIG_KEY.to_string(),
                source,
            }
        })?;
        Ok(Some(config))
    }

    /// Validate and store the configuration.
    pub fn put(&self, config: &BackendConfig) -> Result<(), BackendError> {
        config.validate()?;
        let raw = serde_json::to_vec(config).map_err(|source| BackendError::MalformedRecord {
            key: CONFIG_KEY.to_string(),
            source,
        })?;
        self.storage.put(CONFIG_KEY, &raw)?;
        tracing::info!(issuer = %config.issuer, resource = %config.resource, "Backend configuration written");
        Ok(())
    }
}
