// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication result issued by a successful login.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::durations;
use crate::lease::LeaseOptions;

/// Key of the role name in `internal_data` and `metadata`.
pub const ROLE_METADATA_KEY: &str = "role";

/// Stable identity label of the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Alias {
    /// Token subject.
    pub name: String,
}

/// Authentication issued to a caller.
///
/// The server keeps the authoritative copy in a lease record; callers get a
/// copy and renew by lease id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Authentication {
    /// Policies of the role at login (refreshed on renewal).
    pub policies: Vec<String>,

    /// Token subject.
    pub display_name: String,

    /// Role period in seconds (0 = not periodic).
    #[serde(default, with = "durations::secs")]
    #[schema(value_type = u64)]
    pub period: Duration,

    /// Allowed uses of the issued token (0 = unlimited).
    #[serde(default)]
    pub num_uses: u64,

    pub alias: Alias,

    /// Data pinned at login and consumed by renewal; carries the role name.
    #[serde(default)]
    pub internal_data: BTreeMap<String, String>,

    /// Informational metadata.
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,

    pub lease: LeaseOptions,
}

impl Authentication {
    /// Role name pinned at login, if any.
    pub fn role_name(&self) -> Option<&str> {
        self.internal_data
            .get(ROLE_METADATA_KEY)
            .map(String::as_str)
            .filter(|name| !name.is_empty())
    }
}
