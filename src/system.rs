// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Mount-wide lease limits.

use std::time::Duration;

/// Default and maximum lease TTL applied to every lease this backend issues
/// (768 hours).
pub const DEFAULT_SYSTEM_TTL: Duration = Duration::from_secs(768 * 60 * 60);

/// Lease limits of the surrounding system.
///
/// Role writes validate `period` against [`max_lease_ttl`](Self::max_lease_ttl)
/// and renewals fall back to these values when a role leaves its own TTLs at 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemView {
    default_lease_ttl: Duration,
    max_lease_ttl: Duration,
}

impl SystemView {
    pub fn new(default_lease_ttl: Duration, max_lease_ttl: Duration) -> Self {
        Self {
            default_lease_ttl,
            max_lease_ttl,
        }
    }

    pub fn default_lease_ttl(&self) -> Duration {
        self.default_lease_ttl
    }

    pub fn max_lease_ttl(&self) -> Duration {
        self.max_lease_ttl
    }
}

impl Default for SystemView {
    fn default() -> Self {
        Self::new(DEFAULT_SYSTEM_TTL, DEFAULT_SYSTEM_TTL)
    }
}
