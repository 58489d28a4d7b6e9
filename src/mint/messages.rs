//! Mint API request and response bodies (`/v1`)

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::{Output, Promise, Proof, ProofState, QuoteState};

// =============================================================================
// Keysets
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct KeysetsResponse {
    pub keysets: Vec<KeysetInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct KeysetInfo {
    pub id: String,
    pub unit: String,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub input_fee_ppk: u64,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct KeysResponse {
    pub keysets: Vec<KeysetKeys>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct KeysetKeys {
    pub id: String,
    pub unit: String,
    pub keys: BTreeMap<String, String>,
}

// =============================================================================
// Quotes
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub(crate) struct MintQuoteRequest<'a> {
    pub amount: u64,
    pub unit: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct MintQuoteResponse {
    pub quote: String,
    pub request: String,
    #[serde(default)]
    pub paid: Option<bool>,
    #[serde(default)]
    pub state: Option<QuoteState>,
    #[serde(default)]
    pub expiry: Option<u64>,
}

/// Mint quote: a Lightning invoice that, once paid, entitles issuance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintQuote {
    pub quote: String,
    /// bolt11 invoice to pay
    pub request: String,
    pub amount: u64,
    pub unit: String,
    pub state: QuoteState,
    pub expiry: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct MeltQuoteRequest<'a> {
    pub request: &'a str,
    pub unit: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct MeltQuoteResponse {
    pub quote: String,
    pub amount: u64,
    pub fee_reserve: u64,
    #[serde(default)]
    pub paid: Option<bool>,
    #[serde(default)]
    pub state: Option<QuoteState>,
    #[serde(default)]
    pub expiry: Option<u64>,
    #[serde(default)]
    pub payment_preimage: Option<String>,
    #[serde(default)]
    pub change: Option<Vec<Promise>>,
}

/// Melt quote: what paying an invoice with ecash will cost
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeltQuote {
    pub quote: String,
    pub request: String,
    pub unit: String,
    pub amount: u64,
    /// Upper bound on the Lightning routing fee
    pub fee_reserve: u64,
    pub state: QuoteState,
    pub expiry: Option<u64>,
    pub payment_preimage: Option<String>,
}

// =============================================================================
// Operations
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub(crate) struct MintRequest<'a> {
    pub quote: &'a str,
    pub outputs: &'a [Output],
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SignaturesResponse {
    pub signatures: Vec<Promise>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct MeltRequest<'a> {
    pub quote: &'a str,
    pub inputs: &'a [Proof],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outputs: Option<&'a [Output]>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct SwapRequest<'a> {
    pub inputs: &'a [Proof],
    pub outputs: &'a [Output],
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct RestoreRequest<'a> {
    pub outputs: &'a [Output],
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RestoreResponse {
    #[serde(default)]
    pub outputs: Vec<Output>,
    // older mints call these promises
    #[serde(default, alias = "promises")]
    pub signatures: Vec<Promise>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct CheckStateRequest {
    #[serde(rename = "Ys")]
    pub ys: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CheckStateResponse {
    pub states: Vec<ProofStateEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ProofStateEntry {
    #[serde(rename = "Y")]
    pub y: String,
    pub state: ProofState,
    #[serde(default)]
    #[allow(dead_code)]
    pub witness: Option<String>,
}
