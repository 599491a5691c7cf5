// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Role records and partial updates.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::durations;

/// Authorization profile persisted at `role/{name}`.
///
/// Durations are stored as integer nanoseconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleEntry {
    /// Policies attached to every authentication issued under this role.
    #[serde(default)]
    pub policies: Vec<String>,

    /// Number of times an issued token can be used (0 = unlimited).
    #[serde(default)]
    pub num_uses: u64,

    /// Initial lease lifetime.
    #[serde(default, with = "durations::nanos")]
    pub ttl: Duration,

    /// Renewal ceiling (0 = system/mount default).
    #[serde(default, with = "durations::nanos")]
    pub max_ttl: Duration,

    /// If set, issued leases never expire as long as they are renewed within
    /// this duration; each renewal resets the TTL to it. A changed period is
    /// picked up on the next renewal.
    #[serde(default, with = "durations::nanos")]
    pub period: Duration,
}

/// Fields to apply to a role. `None` leaves the stored value untouched on
/// update and takes the zero default on create.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleUpdate {
    pub policies: Option<Vec<String>>,
    /// Signed so that negative input can be rejected with a clear message.
    pub num_uses: Option<i64>,
    pub ttl: Option<Duration>,
    pub max_ttl: Option<Duration>,
    pub period: Option<Duration>,
}

/// Whether a write creates a new role or updates an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOperation {
    Create,
    Update,
}

/// Result of a successful role write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleWrite {
    pub role: RoleEntry,
    /// Non-fatal advisories for the operator.
    pub warnings: Vec<String>,
}

/// Normalize a policy list: trim, lower-case, drop empties, de-duplicate and
/// sort. A list containing `root` collapses to just `root`.
pub fn parse_policies<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut policies: Vec<String> = raw
        .into_iter()
        .flat_map(|item| {
            item.as_ref()
                .split(',')
                .map(|p| p.trim().to_lowercase())
                .collect::<Vec<_>>()
        })
        .filter(|p| !p.is_empty())
        .collect();

    if policies.iter().any(|p| p == "root") {
        return vec!["root".to_string()];
    }

    policies.sort();
    policies.dedup();
    policies
}
