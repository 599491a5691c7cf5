// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Role repository on top of the key/value [`Storage`].

use std::time::Duration;

use super::entry::{RoleEntry, RoleUpdate, RoleWrite, WriteOperation};
use crate::durations;
use crate::error::BackendError;
use crate::storage::Storage;
use crate::system::SystemView;

/// Storage prefix for role records.
pub const ROLE_PREFIX: &str = "role/";

/// Storage key of a role. Names are case-insensitive.
pub fn role_key(name: &str) -> String {
    format!("{ROLE_PREFIX}{}", name.to_lowercase())
}

/// Repository for role CRUD operations.
pub struct RoleStore<'a> {
    storage: &'a dyn Storage,
}

impl<'a> RoleStore<'a> {
    /// Create a new RoleStore.
    pub fn new(storage: &'a dyn Storage) -> Self {
        Self { storage }
    }

    /// Look up a role by name.
    ///
    /// Returns `Ok(None)` when the role does not exist. A stored record that
    /// cannot be decoded is an error, not an absent role.
    pub fn get(&self, name: &str) -> Result<Option<RoleEntry>, BackendError> {
        let key = role_key(name);
        let Some(raw) = self.storage.get(&key)? else {
            return Ok(None);
        };

        let role = serde_json::from_slice(&raw)
            .map_err(|source| BackendError::MalformedRecord { key, source })?;
        Ok(Some(role))
    }

    /// Check if a role exists. Decides create vs. update for writes.
    pub fn exists(&self, name: &str) -> Result<bool, BackendError> {
        Ok(self.get(name)?.is_some())
    }

    /// List all role names, in key order.
    pub fn list(&self) -> Result<Vec<String>, BackendError> {
        Ok(self.storage.list(ROLE_PREFIX)?)
    }

    /// Delete a role. Deleting a missing role succeeds.
    pub fn delete(&self, name: &str) -> Result<(), BackendError> {
        if name.is_empty() {
            return Err(BackendError::invalid_request("role name required"));
        }

        self.storage.delete(&role_key(name))?;
        tracing::info!(role = %name, "Role deleted");
        Ok(())
    }

    /// Create or update a role.
    ///
    /// Only fields present in `update` are applied. On [`WriteOperation::Create`]
    /// absent fields reset to their zero value; on [`WriteOperation::Update`]
    /// they keep the stored value.
    pub fn upsert(
        &self,
        name: &str,
        op: WriteOperation,
        update: RoleUpdate,
        system: &SystemView,
    ) -> Result<RoleWrite, BackendError> {
        if name.is_empty() {
            return Err(BackendError::invalid_request("missing role name"));
        }

        let mut role = match (self.get(name)?, op) {
            (Some(role), _) => role,
            (None, WriteOperation::Create) => RoleEntry::default(),
            (None, WriteOperation::Update) => return Err(BackendError::UpdateTargetMissing),
        };
        let creating = op == WriteOperation::Create;

        if let Some(policies) = update.policies {
            role.policies = super::parse_policies(policies);
        } else if creating {
            role.policies = Vec::new();
        }

        if let Some(period) = update.period.or(creating.then_some(Duration::ZERO)) {
            role.period = period;
        }
        if role.period > system.max_lease_ttl() {
            return Err(BackendError::invalid_request(format!(
                "'period' of '{}s' is greater than the backend's maximum lease TTL of '{}s'",
                role.period.as_secs(),
                system.max_lease_ttl().as_secs()
            )));
        }

        if let Some(num_uses) = update.num_uses.or(creating.then_some(0)) {
            role.num_uses = u64::try_from(num_uses)
                .map_err(|_| BackendError::invalid_request("num_uses cannot be negative"))?;
        }

        if let Some(ttl) = update.ttl.or(creating.then_some(Duration::ZERO)) {
            role.ttl = ttl;
        }

        if let Some(max_ttl) = update.max_ttl.or(creating.then_some(Duration::ZERO)) {
            role.max_ttl = max_ttl;
        }

        for (field, value) in [
            ("ttl", role.ttl),
            ("max_ttl", role.max_ttl),
            ("period", role.period),
        ] {
            if !durations::nanos::fits(value) {
                return Err(BackendError::invalid_request(format!(
                    "{field} of '{}s' exceeds the largest storable duration of '{}s'",
                    value.as_secs(),
                    durations::nanos::MAX.as_secs()
                )));
            }
        }

        // TTL and MaxTTL are sanitized again at issue time
        if !role.max_ttl.is_zero() && role.ttl > role.max_ttl {
            return Err(BackendError::invalid_request(
                "ttl should not be greater than max_ttl",
            ));
        }

        let mut warnings = Vec::new();
        if role.max_ttl > system.max_lease_ttl() {
            tracing::warn!(
                role = %name,
                max_ttl_secs = role.max_ttl.as_secs(),
                system_max_secs = system.max_lease_ttl().as_secs(),
                "Role max_ttl exceeds the system maximum"
            );
            warnings.push(
                "max_ttl is greater than the system or backend mount's maximum TTL value; \
                 issued tokens' max TTL value will be truncated"
                    .to_string(),
            );
        }

        let key = role_key(name);
        let raw = serde_json::to_vec(&role)
            .map_err(|source| BackendError::MalformedRecord { key: key.clone(), source })?;
        self.storage.put(&key, &raw)?;

        tracing::info!(role = %name, operation = ?op, "Role written");
        Ok(RoleWrite { role, warnings })
    }
}
