//! Shared types for the ecash client core
//!
//! All data structures that cross module boundaries are defined here
//! for consistent serialization. Field names follow the mint's JSON wire
//! format; Rust-side names are spelled out.

use bitcoin::secp256k1::PublicKey;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use crate::crypto::{hash_to_curve_str, parse_point, KeysetIdVersion};
use crate::error::{CashuError, CashuResult};

// =============================================================================
// Blind Signature Values
// =============================================================================

/// Blinded message sent to the mint for signing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    pub amount: u64,
    #[serde(rename = "id")]
    pub keyset_id: String,
    /// Compressed point hex
    #[serde(rename = "B_")]
    pub blinded_message: String,
}

/// DLEQ pair attached to a promise by the mint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromiseDleq {
    pub e: String,
    pub s: String,
}

/// Blind signature returned by the mint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Promise {
    #[serde(rename = "id")]
    pub keyset_id: String,
    pub amount: u64,
    #[serde(rename = "C_")]
    pub blinded_signature: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dleq: Option<PromiseDleq>,
}

/// DLEQ data carried by a proof; `r` is the wallet's blinding factor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofDleq {
    pub e: String,
    pub s: String,
    pub r: String,
}

/// Unblinded, spendable token unit
///
/// Equality and hashing only look at `(C, keyset_id, amount)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proof {
    #[serde(rename = "id")]
    pub keyset_id: String,
    pub amount: u64,
    pub secret: String,
    #[serde(rename = "C")]
    pub signature: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dleq: Option<ProofDleq>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub witness: Option<String>,
}

impl Proof {
    /// Hash-to-curve image of the secret, as used by the spend-state endpoint
    pub fn y(&self) -> CashuResult<PublicKey> {
        hash_to_curve_str(&self.secret)
    }

    pub fn signature_point(&self) -> CashuResult<PublicKey> {
        parse_point(&self.signature)
    }
}

/// Hex keyset IDs compare without regard to case; legacy base64 IDs are exact
fn same_keyset_id(a: &str, b: &str) -> bool {
    match KeysetIdVersion::detect(a) {
        KeysetIdVersion::Hex => a.eq_ignore_ascii_case(b),
        KeysetIdVersion::Legacy => a == b,
    }
}

fn keyset_id_identity(keyset_id: &str) -> Cow<'_, str> {
    match KeysetIdVersion::detect(keyset_id) {
        KeysetIdVersion::Hex => Cow::Owned(keyset_id.to_ascii_lowercase()),
        KeysetIdVersion::Legacy => Cow::Borrowed(keyset_id),
    }
}

/// Identity is the signature point, keyset and amount. Hex fields are
/// case-insensitive so a token survives a V4 round trip unchanged.
impl PartialEq for Proof {
    fn eq(&self, other: &Self) -> bool {
        self.signature.eq_ignore_ascii_case(&other.signature)
            && same_keyset_id(&self.keyset_id, &other.keyset_id)
            && self.amount == other.amount
    }
}

impl Eq for Proof {}

impl Hash for Proof {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.signature.to_ascii_lowercase().hash(state);
        keyset_id_identity(&self.keyset_id).hash(state);
        self.amount.hash(state);
    }
}

/// Capability shared by anything that behaves like a proof
///
/// Fee, sum and selection helpers are generic over this trait so callers
/// can pass their own persisted proof records.
pub trait ProofLike {
    fn amount(&self) -> u64;
    fn keyset_id(&self) -> &str;
    fn secret(&self) -> &str;
    fn signature(&self) -> &str;
}

impl ProofLike for Proof {
    fn amount(&self) -> u64 {
        self.amount
    }

    fn keyset_id(&self) -> &str {
        &self.keyset_id
    }

    fn secret(&self) -> &str {
        &self.secret
    }

    fn signature(&self) -> &str {
        &self.signature
    }
}

/// Sum of proof amounts, saturating
pub fn sum_amounts<P: ProofLike>(proofs: &[P]) -> u64 {
    proofs
        .iter()
        .fold(0u64, |acc, p| acc.saturating_add(p.amount()))
}

// =============================================================================
// Keysets
// =============================================================================

/// A mint keyset plus the caller-owned derivation counter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyset {
    pub keyset_id: String,
    /// Amount (decimal string) to compressed public key hex
    pub keys: BTreeMap<String, String>,
    pub derivation_counter: u32,
    pub active: bool,
    pub unit: String,
    #[serde(default)]
    pub input_fee_ppk: u64,
}

impl Keyset {
    /// Mint public key `A` for an amount
    pub fn public_key_for(&self, amount: u64) -> CashuResult<PublicKey> {
        let hex = self
            .keys
            .get(&amount.to_string())
            .ok_or_else(|| CashuError::missing_mint_key(amount, &self.keyset_id))?;
        parse_point(hex)
    }

    /// Copy of this keyset with the counter advanced to `counter`
    pub fn with_counter(&self, counter: u32) -> Self {
        Self {
            derivation_counter: counter,
            ..self.clone()
        }
    }
}

/// Find a keyset by ID
pub fn find_keyset<'a>(keysets: &'a [Keyset], keyset_id: &str) -> CashuResult<&'a Keyset> {
    keysets
        .iter()
        .find(|k| k.keyset_id == keyset_id)
        .ok_or_else(|| CashuError::unknown_keyset(keyset_id))
}

/// The active keyset for a unit, preferring the cheapest input fee
pub fn active_keyset_for_unit<'a>(keysets: &'a [Keyset], unit: &str) -> CashuResult<&'a Keyset> {
    keysets
        .iter()
        .filter(|k| k.active && k.unit == unit)
        .min_by_key(|k| k.input_fee_ppk)
        .ok_or_else(|| {
            CashuError::new(
                crate::error::ErrorCode::NoActiveKeyset,
                format!("No active keyset for unit {}", unit),
            )
        })
}

/// Output of a restore scan for one keyset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeysetRestoreResult {
    pub keyset_id: String,
    pub derivation_counter: u32,
    pub unit: String,
    pub proofs: Vec<Proof>,
    pub input_fee_ppk: u64,
}

// =============================================================================
// States
// =============================================================================

/// Spend state of a proof as reported by the mint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProofState {
    Unspent,
    Pending,
    Spent,
}

/// Payment state of a mint or melt quote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuoteState {
    Unpaid,
    Pending,
    Paid,
    Issued,
}

impl QuoteState {
    /// Legacy `paid` booleans take priority over the `state` field
    ///
    /// `paid` decides paid versus unpaid. A `state` on the same side only
    /// refines it: `Pending` with `paid: false`, `Issued` with `paid: true`.
    pub fn resolve(paid: Option<bool>, state: Option<QuoteState>) -> Option<QuoteState> {
        match (paid, state) {
            (Some(true), Some(QuoteState::Issued)) => Some(QuoteState::Issued),
            (Some(true), _) => Some(QuoteState::Paid),
            (Some(false), Some(QuoteState::Pending)) => Some(QuoteState::Pending),
            (Some(false), _) => Some(QuoteState::Unpaid),
            (None, state) => state,
        }
    }

    pub fn is_paid(&self) -> bool {
        matches!(self, QuoteState::Paid | QuoteState::Issued)
    }
}
