// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies of the REST API. All types derive `ToSchema`
//! for the OpenAPI document.
//!
//! Durations are whole seconds on the wire. Persisted records use
//! nanoseconds; the conversion happens here.
//!
//! ## Model Categories
//!
//! - **Roles**: role writes (partial) and reads
//! - **Auth**: login, alias lookahead and renewal responses

use std::time::Duration;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::{Alias, Authentication};
use crate::backend::IssuedLease;
use crate::roles::{RoleEntry, RoleUpdate};

// =============================================================================
// Role Models
// =============================================================================

/// Policies as a JSON array or a comma-separated string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum PolicyList {
    List(Vec<String>),
    Csv(String),
}

impl PolicyList {
    fn into_raw(self) -> Vec<String> {
        match self {
            PolicyList::List(policies) => policies,
            PolicyList::Csv(policies) => vec![policies],
        }
    }
}

/// Role create/update request.
///
/// Omitted fields keep their stored value on update and default to zero on
/// create.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct WriteRoleRequest {
    /// Policies attached to tokens issued under the role.
    #[serde(default)]
    #[schema(example = json!(["default", "dev"]))]
    pub policies: Option<PolicyList>,

    /// Number of uses of issued tokens (0 = unlimited).
    #[serde(default)]
    pub num_uses: Option<i64>,

    /// Initial lease TTL in seconds.
    #[serde(default)]
    pub ttl: Option<u64>,

    /// Maximum lease TTL in seconds (0 = system default).
    #[serde(default)]
    pub max_ttl: Option<u64>,

    /// Renewal period in seconds (0 = not periodic).
    #[serde(default)]
    pub period: Option<u64>,
}

impl From<WriteRoleRequest> for RoleUpdate {
    fn from(request: WriteRoleRequest) -> Self {
        RoleUpdate {
            policies: request.policies.map(PolicyList::into_raw),
            num_uses: request.num_uses,
            ttl: request.ttl.map(Duration::from_secs),
            max_ttl: request.max_ttl.map(Duration::from_secs),
            period: request.period.map(Duration::from_secs),
        }
    }
}

/// A role as returned by the API (durations in seconds).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RoleResponse {
    pub policies: Vec<String>,
    pub num_uses: u64,
    pub ttl: u64,
    pub max_ttl: u64,
    pub period: u64,
}

impl From<RoleEntry> for RoleResponse {
    fn from(role: RoleEntry) -> Self {
        Self {
            policies: role.policies,
            num_uses: role.num_uses,
            ttl: role.ttl.as_secs(),
            max_ttl: role.max_ttl.as_secs(),
            period: role.period.as_secs(),
        }
    }
}

/// Role names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RoleListResponse {
    pub keys: Vec<String>,
}

/// Advisories attached to an accepted role write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct WarningsResponse {
    pub warnings: Vec<String>,
}

// =============================================================================
// Auth Models
// =============================================================================

/// Login or renewal result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    /// Id to present on renewal.
    pub lease_id: Uuid,
    pub auth: Authentication,
}

impl From<IssuedLease> for AuthResponse {
    fn from(issued: IssuedLease) -> Self {
        Self {
            lease_id: issued.lease_id,
            auth: issued.auth,
        }
    }
}

/// Alias lookahead result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AliasResponse {
    pub alias: Alias,
}
