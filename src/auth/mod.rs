// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Token Verification
//!
//! Everything needed to turn a raw identity token into verified claims.
//!
//! ## Verification Flow
//!
//! 1. Parse the JWT header (`kid`, `alg`)
//! 2. Resolve the signing key from the issuer's JWKS (cached, HTTPS)
//! 3. Verify the signature
//! 4. Check issuer, audience and expiry against [`VerifierParams`]
//!
//! `nbf` is NOT checked here. The login flow decodes and enforces it
//! separately so the cryptographic verifier can be swapped out on its own.
//!
//! ## Security
//!
//! - Stale key sets are never used after a failed refresh
//! - Clock skew tolerance defaults to 60 seconds
//! - [`InsecureVerifier`] only exists in tests and `dev` builds
//!
//! Role and configuration routes are guarded separately by the [`Operator`]
//! extractor, which checks a static operator token.

pub mod claims;
pub mod error;
pub mod jwks;
pub mod operator;
pub mod result;
pub mod verifier;

pub use claims::{NotBeforeClaims, NumericDate, RegisteredClaims, VerifiedToken};
pub use error::VerificationError;
pub use jwks::{JwksManager, KeySetSource};
pub use operator::{Operator, OperatorCredential, OperatorError, MIN_OPERATOR_TOKEN_LEN};
pub use result::{Alias, Authentication, ROLE_METADATA_KEY};
#[cfg(any(test, feature = "dev"))]
pub use verifier::InsecureVerifier;
pub use verifier::{
    fixed_clock, system_clock, validate_registered_claims, Clock, JwksVerifier, TokenVerifier,
    VerifierParams,
};
