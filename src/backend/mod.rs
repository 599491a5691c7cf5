// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Backend
//!
//! [`Backend`] ties the injected collaborators together (storage, token
//! verifier, system lease limits, clock) and exposes the operations served
//! over HTTP:
//!
//! | Operation | Description |
//! |-----------|-------------|
//! | [`login`](Backend::login) | Verify a JWT and issue an [`Authentication`](crate::auth::Authentication) |
//! | [`lookahead`](Backend::lookahead) | Verify a JWT and resolve the caller's alias only |
//! | [`renew`](Backend::renew) | Recompute the lease of a prior authentication |
//! | [`login_lease`](Backend::login_lease) / [`renew_lease`](Backend::renew_lease) | Login and renewal over server-held lease records |
//! | [`write_role`](Backend::write_role) | Create or update a role (existence check decides which) |
//! | [`read_role`](Backend::read_role) / [`list_roles`](Backend::list_roles) / [`delete_role`](Backend::delete_role) | Role CRUD |
//! | [`config`](Backend::config) / [`write_config`](Backend::write_config) | Issuer trust settings |
//!
//! Issued leases are the only per-caller state; see [`leases`].

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::auth::{system_clock, Clock, TokenVerifier};
use crate::error::BackendError;
use crate::roles::{RoleEntry, RoleStore, RoleUpdate, RoleWrite, WriteOperation};
use crate::storage::Storage;
use crate::system::SystemView;

pub mod config;
pub mod leases;
pub mod login;
pub mod renew;

pub use config::{BackendConfig, ConfigStore, CONFIG_KEY, MAX_LEEWAY_SECS};
pub use leases::{IssuedLease, LeaseEntry, LeaseStore, LEASE_PREFIX};
pub use login::{verify_not_before, LoginRequest};
pub use renew::RenewRequest;

/// Login and role backend.
#[derive(Clone)]
pub struct Backend {
    storage: Arc<dyn Storage>,
    verifier: Arc<dyn TokenVerifier>,
    system: SystemView,
    clock: Clock,
}

impl Backend {
    pub fn new(storage: Arc<dyn Storage>, verifier: Arc<dyn TokenVerifier>) -> Self {
        Self {
            storage,
            verifier,
            system: SystemView::default(),
            clock: system_clock(),
        }
    }

    pub fn with_system_view(mut self, system: SystemView) -> Self {
        self.system = system;
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn system(&self) -> &SystemView {
        &self.system
    }

    pub fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }

    fn roles(&self) -> RoleStore<'_> {
        RoleStore::new(self.storage.as_ref())
    }

    fn config_store(&self) -> ConfigStore<'_> {
        ConfigStore::new(self.storage.as_ref())
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    pub fn read_role(&self, name: &str) -> Result<Option<RoleEntry>, BackendError> {
        self.roles().get(name)
    }

    pub fn list_roles(&self) -> Result<Vec<String>, BackendError> {
        self.roles().list()
    }

    /// Create the role if it does not exist yet, otherwise update it.
    pub fn write_role(&self, name: &str, update: RoleUpdate) -> Result<RoleWrite, BackendError> {
        let op = if self.roles().exists(name)? {
            WriteOperation::Update
        } else {
            WriteOperation::Create
        };
        self.roles().upsert(name, op, update, &self.system)
    }

    pub fn delete_role(&self, name: &str) -> Result<(), BackendError> {
        self.roles().delete(name)
    }

    pub fn config(&self) -> Result<Option<BackendConfig>, BackendError> {
        self.config_store().get()
    }

    pub fn write_config(&self, config: &BackendConfig) -> Result<(), BackendError> {
        self.config_store().put(config)
    }

    /// Make sure the configured issuer's key set can be loaded.
    ///
    /// Returns `Ok(false)` while the backend is unconfigured.
    pub async fn check_key_set(&self) -> Result<bool, BackendError> {
        let Some(config) = self.config()? else {
            return Ok(false);
        };
        let params = config.verifier_params(self.clock.clone());
        self.verifier.check_key_set(&params).await?;
        Ok(true)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Backend fixtures shared by the login, renewal and API tests.

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::TimeZone;

    use super::*;
    use crate::auth::verifier::testing::{ISSUER, RESOURCE};
    use crate::auth::{
        fixed_clock, InsecureVerifier, VerificationError, VerifiedToken, VerifierParams,
    };
    use crate::storage::MemoryStorage;

    pub const HOUR: Duration = Duration::from_secs(3600);

    pub fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    /// Passes through to [`InsecureVerifier`] and counts invocations.
    #[derive(Default)]
    pub struct CountingVerifier {
        calls: AtomicUsize,
    }

    impl CountingVerifier {
        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TokenVerifier for CountingVerifier {
        async fn verify(
            &self,
            raw_token: &str,
            params: &VerifierParams,
        ) -> Result<VerifiedToken, VerificationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            InsecureVerifier.verify(raw_token, params).await
        }
    }

    /// Backend over in-memory storage, configured for the test issuer, with
    /// a clock pinned at [`now`].
    pub fn backend() -> (Backend, Arc<CountingVerifier>) {
        let verifier = Arc::new(CountingVerifier::default());
        let backend = Backend::new(Arc::new(MemoryStorage::new()), verifier.clone())
            .with_system_view(SystemView::new(HOUR * 24, HOUR * 48))
            .with_clock(fixed_clock(now()));
        backend
            .write_config(&BackendConfig::new(ISSUER, RESOURCE))
            .unwrap();
        (backend, verifier)
    }

    /// Claims of a token that passes every registered-claim check.
    pub fn valid_claims() -> serde_json::Value {
        serde_json::json!({
            "sub": "user_123",
            "iss": ISSUER,
            "aud": RESOURCE,
            "exp": now().timestamp() + 3600,
        })
    }
}
