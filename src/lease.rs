// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Lease options and the generic TTL-against-max-TTL extension helper.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::durations;
use crate::error::BackendError;
use crate::system::SystemView;

/// Lease attached to an issued authentication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LeaseOptions {
    /// Current lease lifetime, in seconds.
    #[serde(with = "durations::secs")]
    #[schema(value_type = u64)]
    pub ttl: Duration,

    /// Effective renewal ceiling measured from `issue_time`, in seconds.
    #[serde(default, with = "durations::secs")]
    #[schema(value_type = u64)]
    pub max_ttl: Duration,

    /// Whether the lease may be renewed.
    pub renewable: bool,

    /// Increment requested by the caller on renewal, in seconds.
    #[serde(default, with = "durations::secs")]
    #[schema(value_type = u64)]
    pub increment: Duration,

    /// When the lease was first issued; anchors max-TTL capping.
    pub issue_time: DateTime<Utc>,
}

impl LeaseOptions {
    pub fn renewable(ttl: Duration, issue_time: DateTime<Utc>) -> Self {
        Self {
            ttl,
            max_ttl: Duration::ZERO,
            renewable: true,
            increment: Duration::ZERO,
            issue_time,
        }
    }

    pub fn with_max_ttl(mut self, max_ttl: Duration) -> Self {
        self.max_ttl = max_ttl;
        self
    }

    /// When the lease lapses if it is not renewed again.
    ///
    /// `None` if the instant is not representable.
    pub fn expires_at(&self, renewed_at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        chrono::Duration::from_std(self.ttl)
            .ok()
            .and_then(|ttl| renewed_at.checked_add_signed(ttl))
    }
}

/// The system max, lowered to `backend_max` when that is set and smaller.
pub fn effective_max_ttl(backend_max: Duration, system: &SystemView) -> Duration {
    let max = system.max_lease_ttl();
    if !backend_max.is_zero() && backend_max < max {
        backend_max
    } else {
        max
    }
}

/// Extend a lease, capping it so its total age never exceeds the max TTL.
///
/// The ceiling is [`effective_max_ttl`] and is recorded in `lease.max_ttl`.
/// The new TTL is the caller's requested increment, else `backend_increment`,
/// else the system default, truncated to whatever time remains before
/// `issue_time + max`.
pub fn extend(
    lease: &mut LeaseOptions,
    backend_increment: Duration,
    backend_max: Duration,
    system: &SystemView,
    now: DateTime<Utc>,
) -> Result<(), BackendError> {
    let max = effective_max_ttl(backend_max, system);
    if max.is_zero() {
        return Err(BackendError::InvalidMaxTtl);
    }
    lease.max_ttl = max;

    let max_valid_time = chrono::Duration::from_std(max)
        .ok()
        .and_then(|max| lease.issue_time.checked_add_signed(max))
        .ok_or(BackendError::InvalidMaxTtl)?;
    if max_valid_time < now {
        return Err(BackendError::PastMaxTtl);
    }

    let mut increment = lease.increment;
    if increment.is_zero() {
        increment = if backend_increment.is_zero() {
            system.default_lease_ttl()
        } else {
            backend_increment
        };
    }

    // Whatever is left before the ceiling
    let remaining = (max_valid_time - now).to_std().unwrap_or(Duration::ZERO);
    if increment > remaining {
        tracing::debug!(
            requested_secs = increment.as_secs(),
            remaining_secs = remaining.as_secs(),
            "Lease increment capped by max TTL"
        );
        increment = remaining;
    }

    lease.ttl = increment;
    Ok(())
}
