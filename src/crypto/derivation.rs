//! Deterministic Secret Derivation
//!
//! Regenerates secrets and blinding factors from a BIP39 seed so that
//! proofs can be restored after local state is lost. Derivation is plain
//! BIP32 over the path
//!
//! ```text
//! secret:          m/129372'/0'/{keyset_int}'/{counter}'/0
//! blinding factor: m/129372'/0'/{keyset_int}'/{counter}'/1
//! ```
//!
//! where `keyset_int` is the keyset ID reduced modulo `2^31 - 1`.
//!
//! SECURITY: Seeds are borrowed, never stored; callers should keep them in
//! `Zeroizing` buffers (see [`crate::wallet::seed_from_mnemonic`]).

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bitcoin::bip32::{ChildNumber, DerivationPath, Xpriv};
use bitcoin::secp256k1::SecretKey;
use bitcoin::Network;

use super::curve::SECP;
use super::keyset_id::KeysetIdVersion;
use crate::error::{CashuError, CashuResult};

/// Purpose component of every ecash derivation path
pub const DERIVATION_PURPOSE: u32 = 129372;

/// Hardened offset for BIP-32 derivation
pub const HARDENED: u32 = 0x8000_0000;

/// Deepest path accepted by [`parse_derivation_path`]
pub const MAX_PATH_DEPTH: usize = 7;

const KEYSET_INT_MODULUS: u64 = (1 << 31) - 1;

/// Parse `m/a'/b/...` into child numbers
///
/// A leading non-hardened `m` is stripped. Components suffixed with `'`
/// or `h` are hardened. Paths with zero or more than
/// [`MAX_PATH_DEPTH`] components are rejected.
pub fn parse_derivation_path(path: &str) -> CashuResult<Vec<ChildNumber>> {
    let mut tokens: Vec<&str> = path.trim().split('/').collect();
    if tokens.first().map(|t| *t == "m").unwrap_or(false) {
        tokens.remove(0);
    }

    if tokens.is_empty() || tokens.len() > MAX_PATH_DEPTH {
        return Err(CashuError::invalid_input(format!(
            "Derivation path must have 1 to {} components, got {}",
            MAX_PATH_DEPTH,
            tokens.len()
        )));
    }

    tokens
        .into_iter()
        .map(|token| {
            let (digits, hardened) = match token.strip_suffix('\'').or_else(|| token.strip_suffix('h')) {
                Some(stripped) => (stripped, true),
                None => (token, false),
            };
            let index: u32 = digits.parse().map_err(|_| {
                CashuError::invalid_input(format!("Invalid path component '{}'", token))
            })?;
            if index >= HARDENED {
                return Err(CashuError::invalid_input(format!(
                    "Path index {} out of range",
                    index
                )));
            }
            let child = if hardened {
                ChildNumber::from_hardened_idx(index)?
            } else {
                ChildNumber::from_normal_idx(index)?
            };
            Ok(child)
        })
        .collect()
}

/// Derive the child private key at `path` from `seed`
pub fn child_scalar(seed: &[u8], path: &str) -> CashuResult<SecretKey> {
    let components = parse_derivation_path(path)?;
    let master = Xpriv::new_master(Network::Bitcoin, seed)?;
    let child = master.derive_priv(&SECP, &DerivationPath::from(components))?;
    Ok(child.private_key)
}

/// Keyset ID as an integer modulo `2^31 - 1`
pub fn keyset_numeric_id(keyset_id: &str) -> CashuResult<u32> {
    let bytes = match KeysetIdVersion::detect(keyset_id) {
        KeysetIdVersion::Legacy => STANDARD.decode(keyset_id)?,
        KeysetIdVersion::Hex => hex::decode(keyset_id)?,
    };

    let reduced = bytes
        .iter()
        .fold(0u64, |acc, byte| (acc * 256 + u64::from(*byte)) % KEYSET_INT_MODULUS);

    u32::try_from(reduced).map_err(|_| CashuError::internal("Keyset integer exceeds 31 bits"))
}

pub fn secret_path(keyset_int: u32, counter: u32) -> String {
    format!("m/{}'/0'/{}'/{}'/0", DERIVATION_PURPOSE, keyset_int, counter)
}

pub fn blinding_factor_path(keyset_int: u32, counter: u32) -> String {
    format!("m/{}'/0'/{}'/{}'/1", DERIVATION_PURPOSE, keyset_int, counter)
}

/// Secret (hex of the derived key) and blinding factor for one counter position
pub fn derive_secret_and_blinding_factor(
    seed: &[u8],
    keyset_id: &str,
    counter: u32,
) -> CashuResult<(String, SecretKey)> {
    let keyset_int = keyset_numeric_id(keyset_id)?;
    let secret_key = child_scalar(seed, &secret_path(keyset_int, counter))?;
    let blinding_factor = child_scalar(seed, &blinding_factor_path(keyset_int, counter))?;
    Ok((hex::encode(secret_key.secret_bytes()), blinding_factor))
}
