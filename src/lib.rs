// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Relational Auth - Federated JWT Authentication Backend
//!
//! Accepts a signed identity token from a caller, verifies it against a
//! trusted OIDC issuer, maps the caller to a named role and issues a
//! renewable, time-bounded authentication.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Token verification (JWKS, registered claims) and the authentication result
//! - `backend` - Login orchestration, renewal, issued leases, backend configuration
//! - `roles` - Role records and the role store
//! - `lease` - Lease options and TTL capping
//! - `storage` - Key/value storage (redb, in-memory)
//! - `tidy` - Background removal of lapsed leases

pub mod api;
pub mod auth;
pub mod backend;
pub mod config;
pub mod durations;
pub mod error;
pub mod lease;
pub mod models;
pub mod roles;
pub mod state;
pub mod storage;
pub mod system;
pub mod tidy;
