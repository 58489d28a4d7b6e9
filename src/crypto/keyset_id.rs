//! Keyset ID derivation
//!
//! A keyset ID commits to the mint's public keys sorted by amount:
//! - hex form: `"00" || hex(SHA256(concat(compressed pubkeys)))[..14]`
//! - legacy form: `base64(SHA256(concat(pubkey hex strings)))[..12]`

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use super::curve::parse_point;
use crate::error::{CashuError, CashuResult};
use crate::types::Keyset;

/// Version byte prefix of hex keyset IDs
pub const KEYSET_ID_VERSION_PREFIX: &str = "00";

/// Length of legacy base64 keyset IDs
pub const LEGACY_ID_LENGTH: usize = 12;

/// Keyset ID encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeysetIdVersion {
    /// 12-char base64 IDs from pre-versioned mints
    Legacy,
    /// Hex IDs with a version byte prefix
    Hex,
}

impl KeysetIdVersion {
    pub fn detect(keyset_id: &str) -> Self {
        let is_hex = keyset_id.len() >= 16
            && keyset_id.len() % 2 == 0
            && keyset_id.chars().all(|c| c.is_ascii_hexdigit());
        if is_hex {
            KeysetIdVersion::Hex
        } else {
            KeysetIdVersion::Legacy
        }
    }
}

/// Keys sorted by numeric amount; malformed amounts are errors
fn sorted_keys(keys: &BTreeMap<String, String>) -> CashuResult<Vec<(u64, &String)>> {
    let mut sorted = keys
        .iter()
        .map(|(amount, key)| {
            amount
                .parse::<u64>()
                .map(|a| (a, key))
                .map_err(|_| CashuError::invalid_input(format!("Invalid keyset amount '{}'", amount)))
        })
        .collect::<CashuResult<Vec<_>>>()?;
    sorted.sort_by_key(|(amount, _)| *amount);
    Ok(sorted)
}

/// Compute the keyset ID for a set of keys
pub fn derive_keyset_id(keys: &BTreeMap<String, String>, version: KeysetIdVersion) -> CashuResult<String> {
    let sorted = sorted_keys(keys)?;
    let mut hasher = Sha256::new();

    match version {
        KeysetIdVersion::Hex => {
            for (_, key) in &sorted {
                hasher.update(parse_point(key)?.serialize());
            }
            let digest = hex::encode(hasher.finalize());
            Ok(format!("{}{}", KEYSET_ID_VERSION_PREFIX, &digest[..14]))
        }
        KeysetIdVersion::Legacy => {
            for (_, key) in &sorted {
                hasher.update(key.as_bytes());
            }
            let encoded = STANDARD.encode(hasher.finalize());
            Ok(encoded[..LEGACY_ID_LENGTH].to_string())
        }
    }
}

impl Keyset {
    /// Check that `keyset_id` matches the keys it claims to commit to
    pub fn verify_id(&self) -> CashuResult<()> {
        let version = KeysetIdVersion::detect(&self.keyset_id);
        let expected = derive_keyset_id(&self.keys, version)?;
        if expected != self.keyset_id {
            return Err(CashuError::crypto(format!(
                "Keyset ID mismatch: claimed {}, derived {}",
                self.keyset_id, expected
            )));
        }
        Ok(())
    }
}
