//! V4 token body: CBOR with single-letter keys
//!
//! ```text
//! { m: mint, u: unit, d?: memo,
//!   t: [ { i: keyset_id bytes,
//!          p: [ { a: amount, s: secret, c: C bytes,
//!                 d?: { e, s, r bytes }, w?: witness } ] } ] }
//! ```
//!
//! Proofs are grouped by keyset in first-seen order.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::Token;
use crate::error::{CashuError, CashuResult, ErrorCode};
use crate::serde_bytes::hex_bytes;
use crate::types::{Proof, ProofDleq};

#[derive(Debug, Serialize, Deserialize)]
struct TokenV4 {
    m: String,
    u: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    d: Option<String>,
    t: Vec<KeysetProofsV4>,
}

#[derive(Debug, Serialize, Deserialize)]
struct KeysetProofsV4 {
    #[serde(with = "hex_bytes")]
    i: String,
    p: Vec<ProofV4>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ProofV4 {
    a: u64,
    s: String,
    #[serde(with = "hex_bytes")]
    c: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    d: Option<DleqV4>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    w: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct DleqV4 {
    #[serde(with = "hex_bytes")]
    e: String,
    #[serde(with = "hex_bytes")]
    s: String,
    #[serde(with = "hex_bytes")]
    r: String,
}

/// Caller must have checked single-mint and hex IDs
pub(super) fn to_bytes(token: &Token) -> CashuResult<Vec<u8>> {
    let (mint, proofs) = token
        .proofs_by_mint
        .iter()
        .next()
        .ok_or_else(|| CashuError::token_encoding("Token has no mint"))?;

    let mut groups: Vec<KeysetProofsV4> = Vec::new();
    for proof in proofs {
        let entry = ProofV4 {
            a: proof.amount,
            s: proof.secret.clone(),
            c: proof.signature.clone(),
            d: proof.dleq.as_ref().map(|d| DleqV4 {
                e: d.e.clone(),
                s: d.s.clone(),
                r: d.r.clone(),
            }),
            w: proof.witness.clone(),
        };
        match groups.iter_mut().find(|g| g.i.eq_ignore_ascii_case(&proof.keyset_id)) {
            Some(group) => group.p.push(entry),
            None => groups.push(KeysetProofsV4 {
                i: proof.keyset_id.clone(),
                p: vec![entry],
            }),
        }
    }

    let body = TokenV4 {
        m: mint.clone(),
        u: token.unit.clone(),
        d: token.memo.clone(),
        t: groups,
    };

    let mut buf = Vec::new();
    ciborium::into_writer(&body, &mut buf)
        .map_err(|e| CashuError::new(ErrorCode::CborError, e.to_string()))?;
    Ok(buf)
}

pub(super) fn from_bytes(bytes: &[u8]) -> CashuResult<Token> {
    let body: TokenV4 = ciborium::from_reader(bytes)
        .map_err(|e| CashuError::token_decoding(format!("Invalid V4 token CBOR: {}", e)))?;

    let proofs = body
        .t
        .into_iter()
        .flat_map(|group| {
            let keyset_id = group.i;
            group.p.into_iter().map(move |p| Proof {
                keyset_id: keyset_id.clone(),
                amount: p.a,
                secret: p.s,
                signature: p.c,
                dleq: p.d.map(|d| ProofDleq { e: d.e, s: d.s, r: d.r }),
                witness: p.w,
            })
        })
        .collect();

    let mut proofs_by_mint = BTreeMap::new();
    proofs_by_mint.insert(body.m, proofs);

    Ok(Token {
        unit: body.u,
        memo: body.d,
        proofs_by_mint,
    })
}
