// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Operator access to the role and configuration routes.
//!
//! Operators authenticate with a static bearer token (`ADMIN_TOKEN`). Only
//! its SHA-256 digest is held in memory. When no token is configured every
//! operator route is refused.
//!
//! ```rust,ignore
//! async fn write_config(_: Operator, State(state): State<AppState>) -> ... {
//!     // only reached with a valid operator token
//! }
//! ```

use std::fmt;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    response::{IntoResponse, Response},
};
use sha2::{Digest, Sha256};

use crate::error::ApiError;
use crate::state::AppState;

/// Shortest accepted operator token.
pub const MIN_OPERATOR_TOKEN_LEN: usize = 32;

/// Digest of the configured operator token.
#[derive(Clone, PartialEq, Eq)]
pub struct OperatorCredential {
    digest: Vec<u8>,
}

impl OperatorCredential {
    pub fn new(token: &str) -> Self {
        Self {
            digest: Sha256::digest(token.as_bytes()).to_vec(),
        }
    }

    /// Whether `presented` is the configured token.
    pub fn matches(&self, presented: &str) -> bool {
        Sha256::digest(presented.as_bytes()).as_slice() == self.digest.as_slice()
    }
}

impl fmt::Debug for OperatorCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OperatorCredential(<redacted>)")
    }
}

/// Rejection of the [`Operator`] extractor.
#[derive(Debug, thiserror::Error)]
pub enum OperatorError {
    #[error("missing authorization header")]
    MissingAuthHeader,

    #[error("authorization header must be a bearer token")]
    InvalidAuthHeader,

    #[error("invalid operator token")]
    InvalidCredential,

    /// No operator token is configured.
    #[error("operator access is disabled")]
    Disabled,
}

impl OperatorError {
    pub fn error_code(&self) -> &'static str {
        match self {
            OperatorError::MissingAuthHeader => "missing_auth_header",
            OperatorError::InvalidAuthHeader => "invalid_auth_header",
            OperatorError::InvalidCredential => "invalid_operator_token",
            OperatorError::Disabled => "operator_access_disabled",
        }
    }
}

impl IntoResponse for OperatorError {
    fn into_response(self) -> Response {
        ApiError {
            status: StatusCode::UNAUTHORIZED,
            code: Some(self.error_code()),
            message: self.to_string(),
        }
        .into_response()
    }
}

/// Proof that the request carried the operator token.
///
/// Add it as the first argument of any handler that mutates or reveals
/// roles and issuer trust.
#[derive(Debug)]
pub struct Operator {
    _private: (),
}

impl Operator {
    #[cfg(test)]
    pub(crate) fn for_tests() -> Self {
        Self { _private: () }
    }
}

impl FromRequestParts<AppState> for Operator {
    type Rejection = OperatorError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let credential = state.operator.as_ref().ok_or(OperatorError::Disabled)?;

        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(OperatorError::MissingAuthHeader)?
            .to_str()
            .map_err(|_| OperatorError::InvalidAuthHeader)?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or(OperatorError::InvalidAuthHeader)?;

        if !credential.matches(token) {
            tracing::warn!(path = %parts.uri.path(), "Rejected operator token");
            return Err(OperatorError::InvalidCredential);
        }
        Ok(Operator { _private: () })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::backend;
    use axum::http::Request;

    const TOKEN: &str = "operator-token-0123456789abcdef0123";

    fn state() -> AppState {
        AppState::new(backend().0).with_operator(OperatorCredential::new(TOKEN))
    }

    async fn extract(state: &AppState, authorization: Option<&str>) -> Result<Operator, OperatorError> {
        let mut request = Request::builder().uri("/v1/config");
        if let Some(value) = authorization {
            request = request.header(AUTHORIZATION, value);
        }
        let (mut parts, _) = request.body(()).unwrap().into_parts();
        Operator::from_request_parts(&mut parts, state).await
    }

    #[test]
    fn credential_matches_only_its_token() {
        let credential = OperatorCredential::new(TOKEN);
        assert!(credential.matches(TOKEN));
        assert!(!credential.matches(""));
        assert!(!credential.matches(&TOKEN[1..]));
        assert_eq!(format!("{credential:?}"), "OperatorCredential(<redacted>)");
    }

    #[tokio::test]
    async fn valid_bearer_token_is_accepted() {
        let state = state();
        extract(&state, Some(&format!("Bearer {TOKEN}")))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn missing_or_wrong_credentials_are_rejected() {
        let state = state();

        let err = extract(&state, None).await.unwrap_err();
        assert!(matches!(err, OperatorError::MissingAuthHeader));

        let err = extract(&state, Some(TOKEN)).await.unwrap_err();
        assert!(matches!(err, OperatorError::InvalidAuthHeader));

        let err = extract(&state, Some("Bearer not-the-token")).await.unwrap_err();
        assert!(matches!(err, OperatorError::InvalidCredential));
        assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unconfigured_operator_access_is_refused() {
        let state = AppState::new(backend().0);
        let err = extract(&state, Some(&format!("Bearer {TOKEN}")))
            .await
            .unwrap_err();
        assert!(matches!(err, OperatorError::Disabled));
        assert_eq!(err.error_code(), "operator_access_disabled");
    }
}
