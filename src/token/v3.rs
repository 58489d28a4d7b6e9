//! V3 token body: JSON
//!
//! ```json
//! {"token": [{"mint": "...", "proofs": [...]}], "memo": "...", "unit": "sat"}
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{Token, DEFAULT_UNIT};
use crate::error::{CashuError, CashuResult};
use crate::types::Proof;

#[derive(Debug, Serialize, Deserialize)]
struct TokenV3 {
    token: Vec<TokenV3Entry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    memo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    unit: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TokenV3Entry {
    mint: String,
    proofs: Vec<Proof>,
}

pub(super) fn to_bytes(token: &Token) -> CashuResult<Vec<u8>> {
    let body = TokenV3 {
        token: token
            .proofs_by_mint
            .iter()
            .map(|(mint, proofs)| TokenV3Entry {
                mint: mint.clone(),
                proofs: proofs.clone(),
            })
            .collect(),
        memo: token.memo.clone(),
        unit: Some(token.unit.clone()),
    };
    Ok(serde_json::to_vec(&body)?)
}

pub(super) fn from_bytes(bytes: &[u8]) -> CashuResult<Token> {
    let body: TokenV3 = serde_json::from_slice(bytes)
        .map_err(|e| CashuError::token_decoding(format!("Invalid V3 token JSON: {}", e)))?;

    // Repeated mint entries are merged
    let mut proofs_by_mint: BTreeMap<String, Vec<Proof>> = BTreeMap::new();
    for entry in body.token {
        proofs_by_mint.entry(entry.mint).or_default().extend(entry.proofs);
    }

    Ok(Token {
        unit: body.unit.unwrap_or_else(|| DEFAULT_UNIT.to_string()),
        memo: body.memo,
        proofs_by_mint,
    })
}
