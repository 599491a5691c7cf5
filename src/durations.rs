// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Serde adapters for [`Duration`] fields.
//!
//! - [`nanos`] - integer nanoseconds, used by persisted records
//! - [`secs`] - whole seconds, used on the HTTP surface

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serializer};

/// Integer nanoseconds (persisted role records).
pub mod nanos {
    use super::*;

    /// Largest duration representable as `u64` nanoseconds (about 584 years).
    pub const MAX: Duration = Duration::from_nanos(u64::MAX);

    /// Whether `value` can be persisted by [`serialize`].
    pub fn fits(value: Duration) -> bool {
        value <= MAX
    }

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let nanos = u64::try_from(value.as_nanos()).map_err(serde::ser::Error::custom)?;
        serializer.serialize_u64(nanos)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_nanos)
    }
}

/// Whole seconds (API payloads). Sub-second precision is truncated.
pub mod secs {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Sample {
        #[serde(with = "nanos")]
        stored: Duration,
        #[serde(with = "secs")]
        wire: Duration,
    }

    #[test]
    fn formats_nanos_and_secs() {
        let sample = Sample {
            stored: Duration::from_secs(3600),
            wire: Duration::from_secs(600),
        };
        let json = serde_json::to_value(&sample).unwrap();
        assert_eq!(json["stored"], 3_600_000_000_000u64);
        assert_eq!(json["wire"], 600);

        let back: Sample = serde_json::from_value(json).unwrap();
        assert_eq!(back, sample);
    }

    #[test]
    fn nanos_limit() {
        assert!(nanos::fits(nanos::MAX));
        assert!(!nanos::fits(nanos::MAX + Duration::from_nanos(1)));
        assert!(!nanos::fits(Duration::from_secs(20_000_000_000)));

        let too_long = Sample {
            stored: Duration::from_secs(20_000_000_000),
            wire: Duration::ZERO,
        };
        assert!(serde_json::to_value(&too_long).is_err());
    }

    #[test]
    fn negative_values_are_rejected() {
        let result: Result<Sample, _> =
            serde_json::from_str(r#"{"stored": -1, "wire": 10}"#);
        assert!(result.is_err());
    }
}
