// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWT claims and the verified token representation.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::{self, DeserializeOwned, Visitor};
use serde::{Deserialize, Deserializer};

use super::error::VerificationError;

/// A JWT NumericDate (seconds since the Unix epoch).
///
/// Accepts integers, floats (fractional seconds are dropped) and strings
/// holding either. Anything else fails to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct NumericDate(pub DateTime<Utc>);

impl NumericDate {
    fn from_secs<E: de::Error>(secs: i64) -> Result<Self, E> {
        DateTime::from_timestamp(secs, 0)
            .map(NumericDate)
            .ok_or_else(|| E::custom(format!("timestamp {secs} out of range")))
    }
}

impl<'de> Deserialize<'de> for NumericDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct NumericDateVisitor;

        impl Visitor<'_> for NumericDateVisitor {
            type Value = NumericDate;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a numeric date in seconds")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                NumericDate::from_secs(v)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                let secs = i64::try_from(v).map_err(E::custom)?;
                NumericDate::from_secs(secs)
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
                if !v.is_finite() {
                    return Err(E::custom("timestamp is not finite"));
                }
                NumericDate::from_secs(v.trunc() as i64)
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                if let Ok(secs) = v.parse::<i64>() {
                    return self.visit_i64(secs);
                }
                match v.parse::<f64>() {
                    Ok(secs) => self.visit_f64(secs),
                    Err(_) => Err(E::invalid_value(de::Unexpected::Str(v), &self)),
                }
            }
        }

        deserializer.deserialize_any(NumericDateVisitor)
    }
}

/// The `aud` claim: a single string or a list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    One(String),
    Many(Vec<String>),
}

impl Audience {
    pub fn contains(&self, audience: &str) -> bool {
        match self {
            Audience::One(aud) => aud == audience,
            Audience::Many(auds) => auds.iter().any(|aud| aud == audience),
        }
    }

    pub fn to_vec(&self) -> Vec<String> {
        match self {
            Audience::One(aud) => vec![aud.clone()],
            Audience::Many(auds) => auds.clone(),
        }
    }
}

/// Registered claims checked by every verifier.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisteredClaims {
    /// Subject - the caller identity
    #[serde(default)]
    pub sub: String,

    /// Issuer
    #[serde(default)]
    pub iss: String,

    /// Audience
    #[serde(default)]
    pub aud: Option<Audience>,

    /// Expiration time
    #[serde(default)]
    pub exp: Option<NumericDate>,
}

/// Not-before claim, decoded separately from the registered claims since the
/// verifiers leave it unchecked.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotBeforeClaims {
    #[serde(default)]
    pub nbf: Option<NumericDate>,
}

/// A token whose signature and registered claims have been verified.
#[derive(Debug, Clone)]
pub struct VerifiedToken {
    /// Subject (`sub`) of the token.
    pub subject: String,
    /// Registered claims, decoded.
    pub claims: RegisteredClaims,
    payload: serde_json::Value,
}

impl VerifiedToken {
    /// Build from a decoded JWT payload.
    pub fn from_payload(payload: serde_json::Value) -> Result<Self, VerificationError> {
        let claims = RegisteredClaims::deserialize(&payload)
            .map_err(|e| VerificationError::MalformedToken(format!("invalid claims: {e}")))?;
        Ok(Self {
            subject: claims.sub.clone(),
            claims,
            payload,
        })
    }

    /// Decode an arbitrary claim set from the payload.
    pub fn decode_claims<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.payload)
    }
}
