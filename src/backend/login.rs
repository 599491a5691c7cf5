// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Login: exchange a signed JWT for an [`Authentication`].
//!
//! ## Pipeline
//!
//! 1. `jwt` and `role` must be non-empty
//! 2. Backend configuration must exist
//! 3. Role must exist
//! 4. Token verifier checks signature, issuer, audience and expiry
//! 5. `nbf` must not lie in the future
//! 6. Authentication is built from the role's current settings
//!
//! Steps 1-3 fail with user errors and never reach the verifier. Failures
//! from step 4 on are authentication denials.

use std::collections::BTreeMap;

use serde::Deserialize;
use utoipa::ToSchema;

use super::Backend;
use crate::auth::{
    Alias, Authentication, NotBeforeClaims, NumericDate, VerifiedToken, VerifierParams,
    ROLE_METADATA_KEY,
};
use crate::error::BackendError;
use crate::lease::{self, LeaseOptions};

/// Login request body.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct LoginRequest {
    /// Name of the role to log in under.
    #[serde(default)]
    #[schema(example = "dev")]
    pub role: String,

    /// Signed JWT issued by the configured issuer.
    #[serde(default)]
    pub jwt: String,
}

impl Backend {
    /// Verify `request.jwt` and issue an authentication bound to the role.
    pub async fn login(&self, request: &LoginRequest) -> Result<Authentication, BackendError> {
        let result = self.authenticate(request).await;
        match &result {
            Ok(auth) => tracing::info!(
                role = %request.role,
                subject = %auth.display_name,
                "Login succeeded"
            ),
            Err(e) if e.is_user_error() => {
                tracing::debug!(role = %request.role, error = %e, "Login rejected")
            }
            Err(e) => tracing::warn!(
                role = %request.role,
                error = %e,
                error_code = e.error_code(),
                "Login denied"
            ),
        }
        result
    }

    async fn authenticate(&self, request: &LoginRequest) -> Result<Authentication, BackendError> {
        if request.jwt.is_empty() {
            return Err(BackendError::invalid_request("jwt is required"));
        }
        let role_name = request.role.as_str();
        if role_name.is_empty() {
            return Err(BackendError::invalid_request("role is required"));
        }

        let config = self
            .config()?
            .ok_or_else(|| BackendError::invalid_request("backend not configured"))?;

        let role = self.read_role(role_name)?.ok_or_else(|| {
            BackendError::invalid_request(format!("invalid role name {role_name:?}"))
        })?;

        let params = config.verifier_params(self.clock.clone());
        let token = self.verifier.verify(&request.jwt, &params).await?;
        verify_not_before(&token, &params)?;

        let pinned = BTreeMap::from([(ROLE_METADATA_KEY.to_string(), role_name.to_string())]);
        Ok(Authentication {
            policies: role.policies,
            display_name: token.subject.clone(),
            period: role.period,
            num_uses: role.num_uses,
            alias: Alias {
                name: token.subject,
            },
            internal_data: pinned.clone(),
            metadata: pinned,
            lease: LeaseOptions::renewable(role.ttl, (params.now)())
                .with_max_ttl(lease::effective_max_ttl(role.max_ttl, &self.system)),
        })
    }

    /// Verify `request.jwt` like [`login`](Self::login) but only resolve the
    /// caller's alias. Nothing is issued.
    pub async fn lookahead(&self, request: &LoginRequest) -> Result<Alias, BackendError> {
        let auth = self
            .authenticate(request)
            .await
            .inspect_err(|e| tracing::debug!(role = %request.role, error = %e, "Alias lookahead failed"))?;
        Ok(auth.alias)
    }
}

/// Reject a token whose `nbf` claim lies after `params.now()`.
///
/// An absent `nbf` places no constraint. A value that is not a numeric date
/// fails the login.
pub fn verify_not_before(
    token: &VerifiedToken,
    params: &VerifierParams,
) -> Result<(), BackendError> {
    let claims: NotBeforeClaims = token.decode_claims().map_err(BackendError::ClaimsDecode)?;

    if let Some(NumericDate(not_before)) = claims.nbf {
        if not_before > (params.now)() {
            return Err(BackendError::NotYetValid { not_before });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::verifier::testing::unsigned_jwt;
    use crate::auth::VerificationError;
    use crate::backend::testing::*;
    use crate::roles::RoleUpdate;
    use crate::storage::MemoryStorage;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn default_role() -> RoleUpdate {
        RoleUpdate {
            policies: Some(vec!["default".into()]),
            ttl: Some(HOUR),
            max_ttl: Some(HOUR * 2),
            period: Some(Duration::ZERO),
            ..Default::default()
        }
    }

    fn request(role: &str, claims: &serde_json::Value) -> LoginRequest {
        LoginRequest {
            role: role.into(),
            jwt: unsigned_jwt(claims),
        }
    }

    #[tokio::test]
    async fn login_issues_authentication_bound_to_role() {
        let (backend, verifier) = backend();
        backend.write_role("dev", default_role()).unwrap();

        let auth = backend
            .login(&request("dev", &valid_claims()))
            .await
            .unwrap();

        assert_eq!(auth.policies, vec!["default".to_string()]);
        assert_eq!(auth.display_name, "user_123");
        assert_eq!(auth.alias.name, "user_123");
        assert_eq!(auth.period, Duration::ZERO);
        assert_eq!(auth.num_uses, 0);
        assert_eq!(auth.role_name(), Some("dev"));
        assert_eq!(auth.metadata.get("role").map(String::as_str), Some("dev"));
        assert_eq!(auth.lease.ttl, HOUR);
        assert_eq!(auth.lease.max_ttl, HOUR * 2);
        assert!(auth.lease.renewable);
        assert_eq!(auth.lease.issue_time, now());
        assert_eq!(verifier.calls(), 1);
    }

    #[tokio::test]
    async fn lease_ceiling_falls_back_to_system_max() {
        let (backend, _) = backend();
        backend
            .write_role(
                "dev",
                RoleUpdate {
                    ttl: Some(HOUR),
                    ..Default::default()
                },
            )
            .unwrap();

        let auth = backend
            .login(&request("dev", &valid_claims()))
            .await
            .unwrap();
        // Test system max is 48h
        assert_eq!(auth.lease.max_ttl, HOUR * 48);
    }

    #[tokio::test]
    async fn lookahead_resolves_alias_only() {
        let (backend, verifier) = backend();
        backend.write_role("dev", default_role()).unwrap();

        let alias = backend
            .lookahead(&request("dev", &valid_claims()))
            .await
            .unwrap();
        assert_eq!(alias.name, "user_123");
        assert_eq!(verifier.calls(), 1);

        let mut expired = valid_claims();
        expired["exp"] = json!(now().timestamp() - 3600);
        let err = backend
            .lookahead(&request("dev", &expired))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Verification(_)));

        let err = backend
            .lookahead(&request("ghost", &valid_claims()))
            .await
            .unwrap_err();
        assert!(err.is_user_error());
    }

    #[tokio::test]
    async fn out_of_range_leeway_fails_without_panicking() {
        let (backend, _) = backend();
        backend.write_role("dev", default_role()).unwrap();

        // Bypasses ConfigStore validation
        let mut config = crate::backend::BackendConfig::new(
            crate::auth::verifier::testing::ISSUER,
            crate::auth::verifier::testing::RESOURCE,
        );
        config.leeway_secs = 9_000_000_000_000;
        backend
            .storage()
            .put(
                crate::backend::CONFIG_KEY,
                &serde_json::to_vec(&config).unwrap(),
            )
            .unwrap();

        let err = backend
            .login(&request("dev", &valid_claims()))
            .await
            .unwrap_err();
        assert!(!err.is_user_error());
        assert!(matches!(
            err,
            BackendError::Verification(VerificationError::Internal(_))
        ));
    }

    #[tokio::test]
    async fn missing_fields_are_soft_and_skip_verifier() {
        let (backend, verifier) = backend();
        backend.write_role("dev", default_role()).unwrap();

        let no_jwt = LoginRequest {
            role: "dev".into(),
            jwt: String::new(),
        };
        let err = backend.login(&no_jwt).await.unwrap_err();
        assert!(err.is_user_error());
        assert_eq!(err.to_string(), "jwt is required");

        let err = backend
            .login(&request("", &valid_claims()))
            .await
            .unwrap_err();
        assert!(err.is_user_error());
        assert_eq!(err.to_string(), "role is required");

        assert_eq!(verifier.calls(), 0);
    }

    #[tokio::test]
    async fn unknown_role_is_soft_and_skips_verifier() {
        let (backend, verifier) = backend();

        let err = backend
            .login(&request("ghost", &valid_claims()))
            .await
            .unwrap_err();
        assert!(err.is_user_error());
        assert_eq!(err.to_string(), r#"invalid role name "ghost""#);
        assert_eq!(verifier.calls(), 0);
    }

    #[tokio::test]
    async fn unconfigured_backend_is_soft() {
        let backend = Backend::new(
            Arc::new(MemoryStorage::new()),
            Arc::new(crate::auth::InsecureVerifier),
        );
        backend.write_role("dev", default_role()).unwrap();

        let err = backend
            .login(&request("dev", &valid_claims()))
            .await
            .unwrap_err();
        assert!(err.is_user_error());
        assert_eq!(err.to_string(), "backend not configured");
    }

    #[tokio::test]
    async fn role_lookup_is_case_insensitive() {
        let (backend, _) = backend();
        backend.write_role("dev", default_role()).unwrap();

        let auth = backend
            .login(&request("DEV", &valid_claims()))
            .await
            .unwrap();
        assert_eq!(auth.role_name(), Some("DEV"));
    }

    #[tokio::test]
    async fn future_not_before_is_rejected() {
        let (backend, _) = backend();
        backend.write_role("dev", default_role()).unwrap();

        let mut claims = valid_claims();
        claims["nbf"] = json!(now().timestamp() + 3600);
        let err = backend.login(&request("dev", &claims)).await.unwrap_err();

        assert!(!err.is_user_error());
        assert!(matches!(err, BackendError::NotYetValid { .. }));
        assert!(err.to_string().starts_with("token is not yet valid"));
    }

    #[tokio::test]
    async fn past_or_present_not_before_is_accepted() {
        let (backend, _) = backend();
        backend.write_role("dev", default_role()).unwrap();

        for nbf in [now().timestamp() - 60, now().timestamp()] {
            let mut claims = valid_claims();
            claims["nbf"] = json!(nbf);
            backend.login(&request("dev", &claims)).await.unwrap();
        }

        let mut claims = valid_claims();
        claims["nbf"] = serde_json::Value::Null;
        backend.login(&request("dev", &claims)).await.unwrap();
    }

    #[tokio::test]
    async fn malformed_not_before_is_fatal() {
        let (backend, _) = backend();
        backend.write_role("dev", default_role()).unwrap();

        let mut claims = valid_claims();
        claims["nbf"] = json!("soon");
        let err = backend.login(&request("dev", &claims)).await.unwrap_err();
        assert!(!err.is_user_error());
        assert!(matches!(err, BackendError::ClaimsDecode(_)));
    }

    #[tokio::test]
    async fn verification_failures_are_fatal() {
        let (backend, _) = backend();
        backend.write_role("dev", default_role()).unwrap();

        let mut expired = valid_claims();
        expired["exp"] = json!(now().timestamp() - 3600);
        let mut wrong_audience = valid_claims();
        wrong_audience["aud"] = json!("https://other.example.com/");
        let mut wrong_issuer = valid_claims();
        wrong_issuer["iss"] = json!("https://evil.example.com/");

        for claims in [expired, wrong_audience, wrong_issuer] {
            let err = backend.login(&request("dev", &claims)).await.unwrap_err();
            assert!(!err.is_user_error(), "{claims}");
            assert!(matches!(err, BackendError::Verification(_)), "{claims}");
        }

        let garbage = LoginRequest {
            role: "dev".into(),
            jwt: "garbage".into(),
        };
        let err = backend.login(&garbage).await.unwrap_err();
        assert!(matches!(
            err,
            BackendError::Verification(VerificationError::MalformedToken(_))
        ));
    }

    #[tokio::test]
    async fn login_reflects_current_role_settings() {
        let (backend, _) = backend();
        backend
            .write_role(
                "ops",
                RoleUpdate {
                    policies: Some(vec!["ops,Audit".into()]),
                    num_uses: Some(10),
                    ttl: Some(HOUR / 2),
                    period: Some(Duration::from_secs(600)),
                    ..Default::default()
                },
            )
            .unwrap();

        let auth = backend
            .login(&request("ops", &valid_claims()))
            .await
            .unwrap();
        assert_eq!(auth.policies, vec!["audit".to_string(), "ops".to_string()]);
        assert_eq!(auth.num_uses, 10);
        assert_eq!(auth.period, Duration::from_secs(600));
        assert_eq!(auth.lease.ttl, HOUR / 2);
    }
}
