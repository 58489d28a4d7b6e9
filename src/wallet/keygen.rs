//! Seed Generation
//!
//! Creates and restores BIP39 seeds used for deterministic secrets.
//!
//! SECURITY: All sensitive data (entropy, seeds) is zeroized on drop.

use bip39::Mnemonic;
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroizing;

use crate::error::{CashuError, CashuResult, ErrorCode};

/// Generate a fresh 12-word mnemonic
///
/// SECURITY: Entropy is securely zeroized after mnemonic generation
pub fn generate_mnemonic() -> CashuResult<Zeroizing<String>> {
    let mut entropy = Zeroizing::new([0u8; 16]); // 128 bits = 12 words
    OsRng.fill_bytes(entropy.as_mut());

    let mnemonic = Mnemonic::from_entropy(entropy.as_ref())
        .map_err(|e| CashuError::new(ErrorCode::InvalidMnemonic, format!("Failed to create mnemonic: {}", e)))?;

    Ok(Zeroizing::new(mnemonic.to_string()))
}

/// 64-byte BIP39 seed for a mnemonic and optional passphrase
pub fn seed_from_mnemonic(phrase: &str, passphrase: &str) -> CashuResult<Zeroizing<[u8; 64]>> {
    let mnemonic = Mnemonic::parse(phrase)?;
    Ok(Zeroizing::new(mnemonic.to_seed(passphrase)))
}

/// Validate a mnemonic phrase
pub fn is_valid_mnemonic(phrase: &str) -> bool {
    Mnemonic::parse(phrase).is_ok()
}
