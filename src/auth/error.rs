// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token verification errors.

use axum::http::StatusCode;
use chrono::{DateTime, Utc};

/// Failure of a signature or registered-claim check.
#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    /// Token is not a well-formed JWT, or a registered claim has the wrong shape
    #[error("token is malformed: {0}")]
    MalformedToken(String),

    /// Token signature is invalid
    #[error("token signature is invalid")]
    InvalidSignature,

    /// Token has expired
    #[error("token is expired (Token Expiry: {expired_at})")]
    TokenExpired { expired_at: DateTime<Utc> },

    /// Token issuer does not match the configured issuer
    #[error("id token issued by a different provider, expected {expected:?} got {found:?}")]
    InvalidIssuer { expected: String, found: String },

    /// Token audience does not contain the configured resource
    #[error("expected audience {expected:?} got {found:?}")]
    InvalidAudience { expected: String, found: Vec<String> },

    /// No matching key in the key set
    #[error("no matching key found in JWKS")]
    NoMatchingKey,

    /// Key set (or discovery document) fetch failed
    #[error("failed to fetch JWKS: {0}")]
    KeySetFetch(String),

    /// Internal error
    #[error("internal verification error: {0}")]
    Internal(String),
}

impl VerificationError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            VerificationError::MalformedToken(_) => "malformed_token",
            VerificationError::InvalidSignature => "invalid_signature",
            VerificationError::TokenExpired { .. } => "token_expired",
            VerificationError::InvalidIssuer { .. } => "invalid_issuer",
            VerificationError::InvalidAudience { .. } => "invalid_audience",
            VerificationError::NoMatchingKey => "no_matching_key",
            VerificationError::KeySetFetch(_) => "jwks_fetch_error",
            VerificationError::Internal(_) => "internal_error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            VerificationError::MalformedToken(_)
            | VerificationError::InvalidSignature
            | VerificationError::TokenExpired { .. }
            | VerificationError::InvalidIssuer { .. }
            | VerificationError::InvalidAudience { .. }
            | VerificationError::NoMatchingKey => StatusCode::UNAUTHORIZED,
            VerificationError::KeySetFetch(_) | VerificationError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<jsonwebtoken::errors::Error> for VerificationError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match e.kind() {
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                VerificationError::InvalidSignature
            }
            ErrorKind::InvalidKeyFormat => VerificationError::Internal(e.to_string()),
            _ => VerificationError::MalformedToken(e.to_string()),
        }
    }
}
