// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Issued leases, owned by the server.
//!
//! Login stores the issued [`Authentication`] under a random lease id and
//! hands the id to the caller. Renewal takes only that id; the pinned role
//! name, issue time and current TTL are read back from storage, never from
//! the request.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Backend, LoginRequest};
use crate::auth::Authentication;
use crate::error::BackendError;
use crate::storage::Storage;

/// Storage prefix for lease records.
pub const LEASE_PREFIX: &str = "lease/";

fn lease_key(id: Uuid) -> String {
    format!("{LEASE_PREFIX}{id}")
}

/// Persisted lease: the authentication as last issued and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaseEntry {
    pub auth: Authentication,
    /// Time of login or of the latest renewal.
    pub renewed_at: DateTime<Utc>,
}

impl LeaseEntry {
    /// `None` when the TTL is too large to place on the calendar.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.auth.lease.expires_at(self.renewed_at)
    }

    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|at| at < now)
    }
}

/// An authentication together with the id needed to renew it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedLease {
    pub lease_id: Uuid,
    pub auth: Authentication,
}

/// Repository for lease records.
pub struct LeaseStore<'a> {
    storage: &'a dyn Storage,
}

impl<'a> LeaseStore<'a> {
    pub fn new(storage: &'a dyn Storage) -> Self {
        Self { storage }
    }

    pub fn get(&self, id: Uuid) -> Result<Option<LeaseEntry>, BackendError> {
        let key = lease_key(id);
        let Some(raw) = self.storage.get(&key)? else {
            return Ok(None);
        };
        let entry = serde_json::from_slice(&raw)
            .map_err(|source| BackendError::MalformedRecord { key, source })?;
        Ok(Some(entry))
    }

    pub fn put(&self, id: Uuid, entry: &LeaseEntry) -> Result<(), BackendError> {
        let key = lease_key(id);
        let raw = serde_json::to_vec(entry)
            .map_err(|source| BackendError::MalformedRecord { key: key.clone(), source })?;
        self.storage.put(&key, &raw)?;
        Ok(())
    }

    pub fn delete(&self, id: Uuid) -> Result<(), BackendError> {
        Ok(self.storage.delete(&lease_key(id))?)
    }

    /// Ids of all stored leases. Keys that are not lease ids are skipped.
    pub fn list(&self) -> Result<Vec<Uuid>, BackendError> {
        Ok(self
            .storage
            .list(LEASE_PREFIX)?
            .iter()
            .filter_map(|id| Uuid::parse_str(id).ok())
            .collect())
    }
}

impl Backend {
    fn leases(&self) -> LeaseStore<'_> {
        LeaseStore::new(self.storage.as_ref())
    }

    /// Log in and record the issued authentication under a fresh lease id.
    pub async fn login_lease(&self, request: &LoginRequest) -> Result<IssuedLease, BackendError> {
        let auth = self.login(request).await?;
        let lease_id = Uuid::new_v4();
        self.leases().put(
            lease_id,
            &LeaseEntry {
                auth: auth.clone(),
                renewed_at: auth.lease.issue_time,
            },
        )?;
        tracing::debug!(%lease_id, ttl_secs = auth.lease.ttl.as_secs(), "Lease issued");
        Ok(IssuedLease { lease_id, auth })
    }

    /// Renew the stored lease `lease_id`.
    ///
    /// Unknown and lapsed leases are refused. A lease whose role is gone, or
    /// which reached its max TTL, is removed along with the refusal.
    pub fn renew_lease(
        &self,
        lease_id: Uuid,
        increment: Option<Duration>,
    ) -> Result<IssuedLease, BackendError> {
        let leases = self.leases();
        let entry = leases
            .get(lease_id)?
            .ok_or(BackendError::LeaseNotFound)
            .inspect_err(|_| tracing::warn!(%lease_id, "Renewal of unknown lease"))?;

        let now = self.now();
        if let Some(expired_at) = entry.expires_at().filter(|at| *at < now) {
            leases.delete(lease_id)?;
            tracing::warn!(%lease_id, %expired_at, "Renewal of lapsed lease");
            return Err(BackendError::LeaseExpired { expired_at });
        }

        let auth = match self.renew(entry.auth, increment) {
            Ok(auth) => auth,
            Err(
                e @ (BackendError::RoleNotFound(_)
                | BackendError::MissingRoleMetadata
                | BackendError::PastMaxTtl),
            ) => {
                leases.delete(lease_id)?;
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        leases.put(
            lease_id,
            &LeaseEntry {
                auth: auth.clone(),
                renewed_at: now,
            },
        )?;
        Ok(IssuedLease { lease_id, auth })
    }

    /// Remove leases that have lapsed. Returns how many were removed.
    pub fn tidy_leases(&self) -> Result<usize, BackendError> {
        let leases = self.leases();
        let now = self.now();
        let mut removed = 0;

        for lease_id in leases.list()? {
            match leases.get(lease_id) {
                Ok(Some(entry)) if entry.is_expired(now) => {
                    leases.delete(lease_id)?;
                    removed += 1;
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(%lease_id, error = %e, "Skipping unreadable lease"),
            }
        }
        Ok(removed)
    }
}
