//! Hash-to-curve
//!
//! Maps an arbitrary message to a secp256k1 point with an even-y
//! compressed encoding:
//!
//! ```text
//! msg_hash = SHA256(DOMAIN_SEPARATOR || message)
//! for counter in 0..2^16:
//!     candidate = 0x02 || SHA256(msg_hash || le32(counter))
//!     if candidate parses as a point: return it
//! ```

use bitcoin::secp256k1::PublicKey;
use sha2::{Digest, Sha256};

use crate::error::{CashuError, CashuResult, ErrorCode};

pub const DOMAIN_SEPARATOR: &[u8] = b"Secp256k1_HashToCurve_Cashu_";

/// Counter ceiling for the try-and-increment loop
pub const MAX_ITERATIONS: u32 = 1 << 16;

/// Hash raw bytes to a curve point
pub fn hash_to_curve(message: &[u8]) -> CashuResult<PublicKey> {
    hash_to_curve_bounded(message, MAX_ITERATIONS)
}

/// Hash the UTF-8 bytes of a secret to a curve point
pub fn hash_to_curve_str(message: &str) -> CashuResult<PublicKey> {
    hash_to_curve(message.as_bytes())
}

pub(crate) fn hash_to_curve_bounded(message: &[u8], max_iterations: u32) -> CashuResult<PublicKey> {
    let msg_hash = {
        let mut hasher = Sha256::new();
        hasher.update(DOMAIN_SEPARATOR);
        hasher.update(message);
        hasher.finalize()
    };

    let mut candidate = [0u8; 33];
    candidate[0] = 0x02;

    for counter in 0..max_iterations {
        let mut hasher = Sha256::new();
        hasher.update(msg_hash);
        hasher.update(counter.to_le_bytes());
        candidate[1..].copy_from_slice(&hasher.finalize());

        if let Ok(point) = PublicKey::from_slice(&candidate) {
            return Ok(point);
        }
    }

    Err(CashuError::new(
        ErrorCode::HashToCurveExhausted,
        format!("No valid point found after {} iterations", max_iterations),
    ))
}
