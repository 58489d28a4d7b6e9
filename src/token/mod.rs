//! Token Serialization
//!
//! A token bundles proofs per mint so they can be handed to another wallet
//! as a single string. Two encodings exist:
//! - V3: `cashuA` + base64url(JSON)
//! - V4: `cashuB` + base64url(CBOR), single mint and hex keyset IDs only

mod v3;
mod v4;

use base64::engine::general_purpose::{STANDARD, URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::crypto::KeysetIdVersion;
use crate::error::{CashuError, CashuResult};
use crate::types::{sum_amounts, Proof};

pub const V3_PREFIX: &str = "cashuA";
pub const V4_PREFIX: &str = "cashuB";

/// URI scheme some wallets put in front of a token
const URI_SCHEME: &str = "cashu:";

/// Unit assumed for V3 tokens that omit it
pub const DEFAULT_UNIT: &str = "sat";

/// Wire format of a serialized token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenVersion {
    V3,
    V4,
}

impl TokenVersion {
    pub fn prefix(&self) -> &'static str {
        match self {
            TokenVersion::V3 => V3_PREFIX,
            TokenVersion::V4 => V4_PREFIX,
        }
    }
}

/// Version-agnostic token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub unit: String,
    pub memo: Option<String>,
    /// Mint URL to the proofs it issued
    pub proofs_by_mint: BTreeMap<String, Vec<Proof>>,
}

impl Token {
    /// Single-mint token
    pub fn new(mint_url: impl Into<String>, proofs: Vec<Proof>, unit: impl Into<String>, memo: Option<String>) -> Self {
        let mut proofs_by_mint = BTreeMap::new();
        proofs_by_mint.insert(mint_url.into(), proofs);
        Self {
            unit: unit.into(),
            memo,
            proofs_by_mint,
        }
    }

    pub fn mints(&self) -> Vec<&str> {
        self.proofs_by_mint.keys().map(String::as_str).collect()
    }

    pub fn proofs(&self) -> Vec<&Proof> {
        self.proofs_by_mint.values().flatten().collect()
    }

    pub fn total_amount(&self) -> u64 {
        self.proofs_by_mint
            .values()
            .fold(0u64, |acc, proofs| acc.saturating_add(sum_amounts(proofs)))
    }

    /// Why this token cannot be written as V4, if it cannot
    fn v4_blocker(&self) -> Option<String> {
        if self.proofs_by_mint.len() != 1 {
            return Some(format!(
                "V4 tokens hold exactly one mint, found {}",
                self.proofs_by_mint.len()
            ));
        }
        self.proofs()
            .into_iter()
            .find(|p| KeysetIdVersion::detect(&p.keyset_id) == KeysetIdVersion::Legacy)
            .map(|p| format!("V4 tokens need hex keyset IDs, found legacy ID {}", p.keyset_id))
    }

    pub fn is_v4_encodable(&self) -> bool {
        self.v4_blocker().is_none()
    }

    /// Serialize with an explicit version
    pub fn encode(&self, version: TokenVersion) -> CashuResult<String> {
        let payload = match version {
            TokenVersion::V3 => v3::to_bytes(self)?,
            TokenVersion::V4 => {
                if let Some(reason) = self.v4_blocker() {
                    return Err(CashuError::token_encoding(reason));
                }
                v4::to_bytes(self)?
            }
        };
        Ok(format!("{}{}", version.prefix(), URL_SAFE_NO_PAD.encode(payload)))
    }

    /// Parse a `cashuA`/`cashuB` string
    pub fn decode(encoded: &str) -> CashuResult<Self> {
        let trimmed = encoded.trim();
        let trimmed = trimmed.strip_prefix(URI_SCHEME).unwrap_or(trimmed);

        if trimmed.len() < V3_PREFIX.len() || !trimmed.is_char_boundary(V3_PREFIX.len()) {
            return Err(CashuError::token_decoding("Token is too short"));
        }
        let (prefix, body) = trimmed.split_at(V3_PREFIX.len());

        match prefix {
            V3_PREFIX => v3::from_bytes(&decode_base64(body)?),
            V4_PREFIX => v4::from_bytes(&decode_base64(body)?),
            other => Err(CashuError::token_decoding(format!("Unknown token prefix '{}'", other))),
        }
    }

    /// Version a serialized token was written with
    pub fn detect_version(encoded: &str) -> Option<TokenVersion> {
        let trimmed = encoded.trim();
        let trimmed = trimmed.strip_prefix(URI_SCHEME).unwrap_or(trimmed);
        if trimmed.starts_with(V3_PREFIX) {
            Some(TokenVersion::V3)
        } else if trimmed.starts_with(V4_PREFIX) {
            Some(TokenVersion::V4)
        } else {
            None
        }
    }
}

/// Prefers V4 and falls back to V3 when the token cannot be V4
impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let version = if self.is_v4_encodable() { TokenVersion::V4 } else { TokenVersion::V3 };
        let encoded = self.encode(version).map_err(|_| fmt::Error)?;
        f.write_str(&encoded)
    }
}

impl FromStr for Token {
    type Err = CashuError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Token::decode(s)
    }
}

/// Base64 body with optional padding, url-safe or standard alphabet
fn decode_base64(body: &str) -> CashuResult<Vec<u8>> {
    let mut padded = body.trim_end_matches('=').to_string();
    while padded.len() % 4 != 0 {
        padded.push('=');
    }
    URL_SAFE
        .decode(&padded)
        .or_else(|_| STANDARD.decode(&padded))
        .map_err(|e| CashuError::token_decoding(format!("Invalid base64: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::types::ProofDleq;

    const MINT: &str = "https://8333.space:3338";

    fn proof(id: &str, amount: u64, secret: &str) -> Proof {
        Proof {
            keyset_id: id.to_string(),
            amount,
            secret: secret.to_string(),
            signature: "02bc9097997d81afb2cc7346b5e4345a9346bd2a506eb7958598a72f0cf85163ea".to_string(),
            dleq: None,
            witness: None,
        }
    }

    fn sample() -> Token {
        Token::new(
            MINT,
            vec![
                proof("009a1f293253e41e", 2, "407915bc212be61a77e3e6d2aeb4c727980bda51cd06a6afc29e2861768a7837"),
                proof("009a1f293253e41e", 8, "fe15109314e61d7756b0f8ee0f23a624acaa3f4e042f61433c728c7057b931be"),
            ],
            "sat",
            Some("Thank you.".to_string()),
        )
    }

    #[test]
    fn test_v3_roundtrip() {
        let token = sample();
        let encoded = token.encode(TokenVersion::V3).unwrap();
        assert!(encoded.starts_with("cashuA"));
        assert_eq!(Token::decode(&encoded).unwrap(), token);
    }

    #[test]
    fn test_v4_roundtrip_with_dleq_and_witness() {
        let mut token = sample();
        if let Some(proofs) = token.proofs_by_mint.get_mut(MINT) {
            proofs[0].dleq = Some(ProofDleq {
                e: "b0bb".repeat(16),
                s: "c1cc".repeat(16),
                r: "d2dd".repeat(16),
            });
            proofs[1].witness = Some("{\"signatures\":[]}".to_string());
        }

        let encoded = token.encode(TokenVersion::V4).unwrap();
        assert!(encoded.starts_with("cashuB"));
        let decoded: Token = encoded.parse().unwrap();
        assert_eq!(decoded, token);

        let decoded_proofs = decoded.proofs();
        assert_eq!(decoded_proofs[0].dleq, token.proofs()[0].dleq);
        assert_eq!(decoded_proofs[1].witness, token.proofs()[1].witness);
    }

    #[test]
    fn test_v4_rejects_multiple_mints() {
        let mut token = sample();
        token
            .proofs_by_mint
            .insert("https://other.mint".to_string(), vec![proof("009a1f293253e41e", 1, "x")]);
        let err = token.encode(TokenVersion::V4).unwrap_err();
        assert_eq!(err.code, ErrorCode::TokenEncoding);
        assert!(token.encode(TokenVersion::V3).is_ok());
    }

    #[test]
    fn test_v4_rejects_legacy_ids() {
        let token = Token::new(MINT, vec![proof("I2yN+iRYfkzT", 1, "x")], "sat", None);
        let err = token.encode(TokenVersion::V4).unwrap_err();
        assert_eq!(err.code, ErrorCode::TokenEncoding);
        // Display falls back to V3
        assert!(token.to_string().starts_with("cashuA"));
    }

    #[test]
    fn test_unknown_prefix() {
        let err = Token::decode("cashuCabcdef").unwrap_err();
        assert_eq!(err.code, ErrorCode::TokenDecoding);
        assert!(Token::decode("cash").is_err());
    }

    #[test]
    fn test_decode_tolerates_padding_and_scheme() {
        let encoded = sample().encode(TokenVersion::V3).unwrap();
        let mut padded = encoded.clone();
        while (padded.len() - V3_PREFIX.len()) % 4 != 0 {
            padded.push('=');
        }
        assert_eq!(Token::decode(&padded).unwrap(), sample());
        assert_eq!(Token::decode(&format!("cashu:{}", encoded)).unwrap(), sample());
    }

    #[test]
    fn test_helpers() {
        let token = sample();
        assert_eq!(token.total_amount(), 10);
        assert_eq!(token.mints(), vec![MINT]);
        assert_eq!(token.proofs().len(), 2);
        assert_eq!(Token::detect_version("cashuBxyz"), Some(TokenVersion::V4));
        assert_eq!(Token::detect_version("nope"), None);
    }
}
