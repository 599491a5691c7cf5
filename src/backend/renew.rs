// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Renewal of a previously issued authentication.
//!
//! No token is presented on renewal. The role name pinned at login is used
//! to re-read the role, so role changes apply from the next renewal on.
//! Over HTTP the authentication being renewed is looked up by lease id
//! ([`Backend::renew_lease`]); callers never hand it back themselves.

use std::time::Duration;

use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::Backend;
use crate::auth::Authentication;
use crate::durations;
use crate::error::BackendError;
use crate::lease;

/// Renewal request body.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct RenewRequest {
    /// Lease id returned by login.
    pub lease_id: Uuid,

    /// Requested lease extension in seconds. Defaults to the role's TTL.
    #[serde(default, with = "durations::secs")]
    #[schema(value_type = u64)]
    pub increment: Duration,
}

impl Backend {
    /// Recompute the lease of `auth`.
    ///
    /// Fails closed when the pinned role name is missing or the role has been
    /// deleted. A periodic role resets the TTL to its period; otherwise the
    /// lease is extended and capped by the role's (or system) max TTL.
    pub fn renew(
        &self,
        mut auth: Authentication,
        increment: Option<Duration>,
    ) -> Result<Authentication, BackendError> {
        let role_name = auth
            .role_name()
            .ok_or(BackendError::MissingRoleMetadata)?
            .to_string();

        let role = self
            .read_role(&role_name)?
            .ok_or_else(|| BackendError::RoleNotFound(role_name.clone()))
            .inspect_err(|e| tracing::warn!(role = %role_name, error = %e, "Renewal denied"))?;

        auth.policies = role.policies;
        auth.period = role.period;
        auth.lease.max_ttl = lease::effective_max_ttl(role.max_ttl, &self.system);

        if !role.period.is_zero() {
            auth.lease.ttl = role.period;
            tracing::debug!(
                role = %role_name,
                period_secs = role.period.as_secs(),
                "Periodic lease renewed"
            );
            return Ok(auth);
        }

        auth.lease.increment = increment.unwrap_or(Duration::ZERO);
        lease::extend(
            &mut auth.lease,
            role.ttl,
            role.max_ttl,
            &self.system,
            self.now(),
        )
        .inspect_err(|e| tracing::warn!(role = %role_name, error = %e, "Renewal denied"))?;

        tracing::debug!(
            role = %role_name,
            ttl_secs = auth.lease.ttl.as_secs(),
            "Lease renewed"
        );
        Ok(auth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::verifier::testing::unsigned_jwt;
    use crate::auth::{fixed_clock, ROLE_METADATA_KEY};
    use crate::backend::testing::*;
    use crate::backend::LoginRequest;
    use crate::roles::RoleUpdate;

    async fn login(backend: &Backend, role: &str) -> Authentication {
        backend
            .login(&LoginRequest {
                role: role.into(),
                jwt: unsigned_jwt(&valid_claims()),
            })
            .await
            .unwrap()
    }

    fn minutes(n: i64) -> chrono::Duration {
        chrono::Duration::minutes(n)
    }

    #[tokio::test]
    async fn periodic_role_renews_to_exact_period() {
        let (backend, _) = backend();
        let period = Duration::from_secs(600);
        backend
            .write_role(
                "svc",
                RoleUpdate {
                    ttl: Some(HOUR),
                    period: Some(period),
                    ..Default::default()
                },
            )
            .unwrap();

        let auth = login(&backend, "svc").await;
        assert_eq!(auth.lease.ttl, HOUR);

        // Much later, and with an explicit increment; period still wins
        let later = backend
            .clone()
            .with_clock(fixed_clock(now() + chrono::Duration::days(30)));
        let first = later.renew(auth, Some(HOUR * 5)).unwrap();
        assert_eq!(first.lease.ttl, period);
        assert_eq!(first.lease.max_ttl, HOUR * 48);
        let second = later.renew(first, None).unwrap();
        assert_eq!(second.lease.ttl, period);
    }

    #[tokio::test]
    async fn changed_period_applies_on_next_renewal() {
        let (backend, _) = backend();
        backend
            .write_role(
                "svc",
                RoleUpdate {
                    period: Some(Duration::from_secs(600)),
                    policies: Some(vec!["default".into()]),
                    ..Default::default()
                },
            )
            .unwrap();
        let auth = login(&backend, "svc").await;

        backend
            .write_role(
                "svc",
                RoleUpdate {
                    period: Some(Duration::from_secs(900)),
                    policies: Some(vec!["default".into(), "extra".into()]),
                    ..Default::default()
                },
            )
            .unwrap();

        let renewed = backend.renew(auth, None).unwrap();
        assert_eq!(renewed.lease.ttl, Duration::from_secs(900));
        assert_eq!(renewed.period, Duration::from_secs(900));
        assert_eq!(
            renewed.policies,
            vec!["default".to_string(), "extra".to_string()]
        );
    }

    #[tokio::test]
    async fn renewal_is_capped_by_role_max_ttl() {
        let (backend, _) = backend();
        let max_ttl = HOUR * 2;
        backend
            .write_role(
                "dev",
                RoleUpdate {
                    ttl: Some(HOUR),
                    max_ttl: Some(max_ttl),
                    ..Default::default()
                },
            )
            .unwrap();

        let mut auth = login(&backend, "dev").await;
        let ceiling = now() + chrono::Duration::from_std(max_ttl).unwrap();

        for offset in [0, 30, 70, 100, 119] {
            let at = now() + minutes(offset);
            let renewer = backend.clone().with_clock(fixed_clock(at));
            auth = renewer.renew(auth, None).unwrap();
            let expires = at + chrono::Duration::from_std(auth.lease.ttl).unwrap();
            assert!(expires <= ceiling, "renewal at +{offset}m exceeds max_ttl");
        }

        let at = now() + minutes(100);
        let renewed = backend
            .clone()
            .with_clock(fixed_clock(at))
            .renew(auth.clone(), None)
            .unwrap();
        assert_eq!(renewed.lease.ttl, Duration::from_secs(20 * 60));

        let too_late = backend.clone().with_clock(fixed_clock(now() + minutes(121)));
        let err = too_late.renew(auth, None).unwrap_err();
        assert!(matches!(err, BackendError::PastMaxTtl));
        assert!(!err.is_user_error());
    }

    #[test]
    fn renew_request_carries_only_a_lease_id() {
        let id = Uuid::new_v4();
        let request: RenewRequest =
            serde_json::from_value(serde_json::json!({"lease_id": id, "increment": 600}))
                .unwrap();
        assert_eq!(request.lease_id, id);
        assert_eq!(request.increment, Duration::from_secs(600));

        let forged = serde_json::json!({
            "lease_id": id,
            "auth": {"internal_data": {"role": "admin"}},
        });
        assert!(serde_json::from_value::<RenewRequest>(forged).is_err());
    }

    #[tokio::test]
    async fn zero_max_ttl_defers_to_system_max() {
        let (backend, _) = backend();
        backend
            .write_role(
                "dev",
                RoleUpdate {
                    ttl: Some(HOUR * 4),
                    ..Default::default()
                },
            )
            .unwrap();
        let auth = login(&backend, "dev").await;

        // System max is 48h
        let at = now() + chrono::Duration::hours(46);
        let renewed = backend
            .clone()
            .with_clock(fixed_clock(at))
            .renew(auth, None)
            .unwrap();
        assert_eq!(renewed.lease.ttl, HOUR * 2);
    }

    #[tokio::test]
    async fn requested_increment_is_honoured() {
        let (backend, _) = backend();
        backend
            .write_role(
                "dev",
                RoleUpdate {
                    ttl: Some(HOUR),
                    max_ttl: Some(HOUR * 10),
                    ..Default::default()
                },
            )
            .unwrap();
        let auth = login(&backend, "dev").await;

        let renewed = backend.renew(auth, Some(HOUR * 3)).unwrap();
        assert_eq!(renewed.lease.ttl, HOUR * 3);
    }

    #[tokio::test]
    async fn deleted_role_fails_closed() {
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
        let auth = login(&backend, "dev").await;

        backend.delete_role("dev").unwrap();
        let err = backend.renew(auth, None).unwrap_err();
        assert!(matches!(err, BackendError::RoleNotFound(_)));
        assert!(!err.is_user_error());
        assert_eq!(err.to_string(), "role dev does not exist during renewal");
    }

    #[tokio::test]
    async fn missing_role_metadata_is_fatal() {
        let (backend, _) = backend();
        backend
            .write_role("dev", RoleUpdate::default())
            .unwrap();
        let mut auth = login(&backend, "dev").await;

        auth.internal_data.remove(ROLE_METADATA_KEY);
        let err = backend.renew(auth.clone(), None).unwrap_err();
        assert!(matches!(err, BackendError::MissingRoleMetadata));
        assert!(!err.is_user_error());

        auth.internal_data
            .insert(ROLE_METADATA_KEY.to_string(), String::new());
        assert!(backend.renew(auth, None).is_err());
    }
}
