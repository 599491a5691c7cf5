// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Roles
//!
//! A role is a named authorization profile: the policies attached to callers
//! that log in under it, a usage limit, and the lease settings (TTL, max TTL,
//! period) of the authentications it issues.
//!
//! ## Write Validation
//!
//! - `num_uses` must not be negative
//! - `ttl` must not exceed `max_ttl` when `max_ttl` is set
//! - `period` must not exceed the system's maximum lease TTL
//! - `max_ttl` above the system maximum is accepted with a warning

pub mod entry;
pub mod store;

pub use entry::{parse_policies, RoleEntry, RoleUpdate, RoleWrite, WriteOperation};
pub use store::{role_key, RoleStore, ROLE_PREFIX};
