//! secp256k1 point and scalar helpers
//!
//! Thin layer over `bitcoin::secp256k1` so the protocol code reads in
//! terms of point addition, negation and scalar multiplication. All hex
//! parsing of wire points and scalars goes through here.

use bitcoin::secp256k1::{All, PublicKey, Scalar, Secp256k1, SecretKey};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroize;

use crate::error::{CashuError, CashuResult};

lazy_static::lazy_static! {
    /// Shared verification + signing context
    pub(crate) static ref SECP: Secp256k1<All> = Secp256k1::new();
}

/// Parse a compressed (or uncompressed) point from hex
pub fn parse_point(hex_str: &str) -> CashuResult<PublicKey> {
    let bytes = hex::decode(hex_str)?;
    PublicKey::from_slice(&bytes)
        .map_err(|e| CashuError::crypto(format!("Invalid curve point: {}", e)))
}

/// Parse a non-zero scalar from 32-byte hex
pub fn parse_scalar(hex_str: &str) -> CashuResult<SecretKey> {
    let bytes = hex::decode(hex_str)?;
    SecretKey::from_slice(&bytes)
        .map_err(|e| CashuError::crypto(format!("Invalid scalar: {}", e)))
}

/// Parse a 32-byte hex value that may be any field scalar, zero included
pub fn parse_tweak(hex_str: &str) -> CashuResult<([u8; 32], Scalar)> {
    let bytes: [u8; 32] = hex::decode(hex_str)?
        .try_into()
        .map_err(|_| CashuError::crypto("Expected 32-byte scalar"))?;
    let scalar = Scalar::from_be_bytes(bytes)
        .map_err(|_| CashuError::crypto("Scalar out of range"))?;
    Ok((bytes, scalar))
}

/// Compressed hex encoding of a point
pub fn point_to_hex(point: &PublicKey) -> String {
    hex::encode(point.serialize())
}

pub fn scalar_to_hex(scalar: &SecretKey) -> String {
    hex::encode(scalar.secret_bytes())
}

/// `P + Q`; fails only when the sum is the point at infinity
pub fn add_points(p: &PublicKey, q: &PublicKey) -> CashuResult<PublicKey> {
    Ok(p.combine(q)?)
}

pub fn negate_point(p: &PublicKey) -> PublicKey {
    p.negate(&SECP)
}

/// `P - Q`
pub fn sub_points(p: &PublicKey, q: &PublicKey) -> CashuResult<PublicKey> {
    add_points(p, &negate_point(q))
}

/// `k·P`
pub fn mul_point(p: &PublicKey, k: &SecretKey) -> CashuResult<PublicKey> {
    Ok(p.mul_tweak(&SECP, &Scalar::from(*k))?)
}

/// `k·G`
pub fn mul_generator(k: &SecretKey) -> PublicKey {
    PublicKey::from_secret_key(&SECP, k)
}

/// Uniformly random non-zero scalar from the OS RNG
pub fn random_scalar() -> SecretKey {
    let mut bytes = [0u8; 32];
    loop {
        OsRng.fill_bytes(&mut bytes);
        if let Ok(key) = SecretKey::from_slice(&bytes) {
            bytes.zeroize();
            return key;
        }
    }
}
