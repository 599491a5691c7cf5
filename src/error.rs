// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Backend and HTTP error types.
//!
//! [`BackendError`] splits failures into two classes:
//!
//! - **User errors** (`is_user_error() == true`): the caller can fix the
//!   request and retry (missing field, unknown role, unconfigured backend,
//!   invalid role values). Reported as 400 responses.
//! - **Fatal errors**: authentication denials and internal faults (bad token,
//!   not-before violation, storage failure, renewal against a deleted role
//!   or of an unknown or lapsed lease).
//!   These are never downgraded to user errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::auth::VerificationError;
use crate::storage::StorageError;

/// Error type of the login, renewal and role operations.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Caller mistake; the request can be corrected and retried.
    #[error("{0}")]
    InvalidRequest(String),

    /// Signature or registered-claim verification failed.
    #[error(transparent)]
    Verification(#[from] VerificationError),

    /// The token's `nbf` claim lies in the future.
    #[error("token is not yet valid (Token Not Before: {not_before})")]
    NotYetValid { not_before: DateTime<Utc> },

    /// The verified payload could not be decoded into the expected claims.
    #[error("failed to decode token claims: {0}")]
    ClaimsDecode(#[source] serde_json::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A persisted record exists but cannot be decoded.
    #[error("malformed record at {key:?}: {source}")]
    MalformedRecord {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// An update targeted a role that vanished after the existence check.
    #[error("role entry not found during update operation")]
    UpdateTargetMissing,

    /// The authentication being renewed carries no role name.
    #[error("failed to fetch role_name during renewal")]
    MissingRoleMetadata,

    /// The role an authentication was issued under has been deleted.
    #[error("role {0} does not exist during renewal")]
    RoleNotFound(String),

    /// The lease is already older than its maximum TTL.
    #[error("past the max TTL, cannot renew")]
    PastMaxTtl,

    #[error("max TTL is invalid")]
    InvalidMaxTtl,

    /// No lease was issued under this id, or it has been removed.
    #[error("lease not found")]
    LeaseNotFound,

    /// The lease lapsed before it was renewed.
    #[error("lease expired at {expired_at}")]
    LeaseExpired { expired_at: DateTime<Utc> },
}

impl BackendError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// True for errors the caller can correct; false for authentication
    /// denials and internal faults.
    pub fn is_user_error(&self) -> bool {
        matches!(self, BackendError::InvalidRequest(_))
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            BackendError::InvalidRequest(_) => "invalid_request",
            BackendError::Verification(e) => e.error_code(),
            BackendError::NotYetValid { .. } => "token_not_yet_valid",
            BackendError::ClaimsDecode(_) => "malformed_claims",
            BackendError::Storage(_) => "storage_error",
            BackendError::MalformedRecord { .. } => "malformed_record",
            BackendError::UpdateTargetMissing => "role_not_found",
            BackendError::MissingRoleMetadata => "missing_role_metadata",
            BackendError::RoleNotFound(_) => "role_not_found",
            BackendError::PastMaxTtl => "past_max_ttl",
            BackendError::InvalidMaxTtl => "invalid_max_ttl",
            BackendError::LeaseNotFound => "lease_not_found",
            BackendError::LeaseExpired { .. } => "lease_expired",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            BackendError::InvalidRequest(_) | BackendError::MissingRoleMetadata => {
                StatusCode::BAD_REQUEST
            }
            BackendError::Verification(e) => e.status_code(),
            BackendError::NotYetValid { .. } | BackendError::ClaimsDecode(_) => {
                StatusCode::UNAUTHORIZED
            }
            BackendError::RoleNotFound(_)
            | BackendError::PastMaxTtl
            | BackendError::LeaseNotFound
            | BackendError::LeaseExpired { .. } => StatusCode::FORBIDDEN,
            BackendError::UpdateTargetMissing => StatusCode::NOT_FOUND,
            BackendError::Storage(_)
            | BackendError::MalformedRecord { .. }
            | BackendError::InvalidMaxTtl => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// HTTP error returned by the API handlers.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub code: Option<&'static str>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_code: Option<&'static str>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            code: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl From<BackendError> for ApiError {
    fn from(e: BackendError) -> Self {
        Self {
            status: e.status_code(),
            code: Some(e.error_code()),
            message: e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
            error_code: self.code,
        });
        (self.status, body).into_response()
    }
}

impl IntoResponse for BackendError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}
