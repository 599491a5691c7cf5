// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Process settings are loaded from the environment at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `DATA_DIR` | Directory holding `auth.redb` | `/data` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |
//! | `DEFAULT_LEASE_TTL` | Default lease TTL in seconds | `2764800` (768h) |
//! | `MAX_LEASE_TTL` | Maximum lease TTL in seconds | `2764800` (768h) |
//! | `OIDC_ISSUER` | Seed: trusted token issuer | Optional |
//! | `OIDC_RESOURCE` | Seed: expected audience | Optional |
//! | `OIDC_JWKS_URL` | Seed: explicit JWKS endpoint | Optional |
//! | `OIDC_LEEWAY_SECS` | Seed: clock skew tolerance | `60` |
//! | `ADMIN_TOKEN` | Operator bearer token for `/v1/roles` and `/v1/config` (at least 32 characters) | Optional; operator routes refused when unset |
//!
//! The `OIDC_*` variables only seed the backend configuration when none is
//! stored yet; afterwards `/v1/config` is authoritative.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use crate::auth::{OperatorCredential, MIN_OPERATOR_TOKEN_LEN};
use crate::backend::BackendConfig;
use crate::system::{SystemView, DEFAULT_SYSTEM_TTL};

/// Environment variable name for the data directory path.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

/// Database file inside the data directory.
pub const DATABASE_FILE: &str = "auth.redb";

const DEFAULT_DATA_DIR: &str = "/data";
const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

/// Error raised while reading the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {name}: {reason}")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0} is set but {1} is missing")]
    Incomplete(&'static str, &'static str),
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

/// Process settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_addr: SocketAddr,
    pub data_dir: PathBuf,
    pub log_format: LogFormat,
    pub system: SystemView,
    /// Backend configuration to store on first start.
    pub seed_config: Option<BackendConfig>,
    pub operator: Option<OperatorCredential>,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build settings from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port: u16 = parse_var(&lookup, "PORT")?.unwrap_or(8080);
        let bind_addr: SocketAddr = format!("{host}:{port}")
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::InvalidValue {
                name: "HOST",
                value: host.clone(),
                reason: e.to_string(),
            })?;

        let data_dir = PathBuf::from(
            lookup(DATA_DIR_ENV).unwrap_or_else(|| DEFAULT_DATA_DIR.to_string()),
        );

        let log_format = match lookup("LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        let default_ttl = parse_var::<u64, _>(&lookup, "DEFAULT_LEASE_TTL")?
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_SYSTEM_TTL);
        let max_ttl = parse_var::<u64, _>(&lookup, "MAX_LEASE_TTL")?
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_SYSTEM_TTL);
        if max_ttl.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: "MAX_LEASE_TTL",
                value: "0".to_string(),
                reason: "must be positive".to_string(),
            });
        }

        let seed_config = match (lookup("OIDC_ISSUER"), lookup("OIDC_RESOURCE")) {
            (Some(issuer), Some(resource)) => {
                let mut config = BackendConfig::new(issuer, resource);
                config.jwks_url = lookup("OIDC_JWKS_URL");
                if let Some(leeway) = parse_var(&lookup, "OIDC_LEEWAY_SECS")? {
                    config.leeway_secs = leeway;
                }
                Some(config)
            }
            (Some(_), None) => return Err(ConfigError::Incomplete("OIDC_ISSUER", "OIDC_RESOURCE")),
            (None, Some(_)) => return Err(ConfigError::Incomplete("OIDC_RESOURCE", "OIDC_ISSUER")),
            (None, None) => None,
        };

        let operator = match lookup("ADMIN_TOKEN") {
            Some(token) if token.len() < MIN_OPERATOR_TOKEN_LEN => {
                return Err(ConfigError::InvalidValue {
                    name: "ADMIN_TOKEN",
                    value: "<redacted>".to_string(),
                    reason: format!("must be at least {MIN_OPERATOR_TOKEN_LEN} characters"),
                });
            }
            Some(token) => Some(OperatorCredential::new(&token)),
            None => None,
        };

        Ok(Self {
            bind_addr,
            data_dir,
            log_format,
            system: SystemView::new(default_ttl, max_ttl),
            seed_config,
            operator,
        })
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE)
    }
}

fn parse_var<T, F>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = lookup(name) else {
        return Ok(None);
    };
    value
        .parse()
        .map(Some)
        .map_err(|e: T::Err| ConfigError::InvalidValue {
            name,
            value,
            reason: e.to_string(),
        })
}

/// Install the global tracing subscriber.
pub fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults() {
        let settings = settings(&[]).unwrap();
        assert_eq!(settings.bind_addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(settings.database_path(), PathBuf::from("/data/auth.redb"));
        assert_eq!(settings.log_format, LogFormat::Pretty);
        assert_eq!(settings.system, SystemView::default());
        assert!(settings.seed_config.is_none());
        assert!(settings.operator.is_none());
    }

    #[test]
    fn operator_token() {
        let token = "x".repeat(MIN_OPERATOR_TOKEN_LEN);
        let settings = settings(&[("ADMIN_TOKEN", token.as_str())]).unwrap();
        assert!(settings.operator.unwrap().matches(&token));

        let err = self::settings(&[("ADMIN_TOKEN", "short")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { name: "ADMIN_TOKEN", .. }));
        assert!(!err.to_string().contains("short"));
    }

    #[test]
    fn overrides() {
        let settings = settings(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "9000"),
            ("DATA_DIR", "/tmp/auth"),
            ("LOG_FORMAT", "json"),
            ("DEFAULT_LEASE_TTL", "3600"),
            ("MAX_LEASE_TTL", "86400"),
        ])
        .unwrap();
        assert_eq!(settings.bind_addr, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(settings.database_path(), PathBuf::from("/tmp/auth/auth.redb"));
        assert_eq!(settings.log_format, LogFormat::Json);
        assert_eq!(
            settings.system,
            SystemView::new(Duration::from_secs(3600), Duration::from_secs(86400))
        );
    }

    #[test]
    fn seed_config_from_oidc_vars() {
        let settings = settings(&[
            ("OIDC_ISSUER", "https://sts.example.com/tenant/"),
            ("OIDC_RESOURCE", "https://management.example.com/"),
            ("OIDC_LEEWAY_SECS", "30"),
        ])
        .unwrap();
        let seed = settings.seed_config.unwrap();
        assert_eq!(seed.issuer, "https://sts.example.com/tenant/");
        assert_eq!(seed.leeway_secs, 30);
        assert_eq!(seed.jwks_url, None);

        assert!(matches!(
            self::settings(&[("OIDC_ISSUER", "https://sts.example.com/")]),
            Err(ConfigError::Incomplete(..))
        ));
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        assert!(matches!(
            settings(&[("PORT", "http")]),
            Err(ConfigError::InvalidValue { name: "PORT", .. })
        ));
        assert!(settings(&[("MAX_LEASE_TTL", "0")]).is_err());
        assert!(settings(&[("DEFAULT_LEASE_TTL", "-5")]).is_err());
    }
}
