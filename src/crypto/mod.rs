//! Cryptographic primitives for the ecash client
//!
//! This module provides:
//! - secp256k1 point/scalar helpers
//! - Hash-to-curve with the Cashu domain separator
//! - Blinding, unblinding and output generation
//! - DLEQ verification
//! - Deterministic BIP-32 secret derivation
//! - Keyset ID derivation

pub mod blind;
pub mod curve;
pub mod derivation;
pub mod dleq;
pub mod hash_to_curve;
pub mod keyset_id;

pub use blind::{
    blind, generate_outputs, unblind, unblind_promises, unblind_with_outputs, DeterministicSource,
    OutputSet,
};
pub use curve::{
    add_points, mul_generator, mul_point, negate_point, parse_point, parse_scalar, point_to_hex,
    random_scalar, scalar_to_hex, sub_points,
};
pub use derivation::{child_scalar, derive_secret_and_blinding_factor, keyset_numeric_id};
pub use dleq::{
    check_promise_dleq, check_proof_dleq, hash_e, verify_dleq, verify_proof_dleq,
    verify_proofs_dleq, DleqCheck, DleqPolicy, DleqReport,
};
pub use hash_to_curve::{hash_to_curve, hash_to_curve_str};
pub use keyset_id::{derive_keyset_id, KeysetIdVersion};
