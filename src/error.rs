//! Unified error types for the ecash client core
//!
//! Every fallible operation returns [`CashuResult`]. Errors carry an
//! [`ErrorCode`] that maps onto one of the coarse [`ErrorCategory`] buckets
//! callers branch on, and mint-reported failures additionally carry the
//! decoded [`MintErrorKind`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Main error type for all client operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashuError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<String>,
    /// Set when the mint answered with a numeric error code
    pub mint_error: Option<MintErrorKind>,
}

impl CashuError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            mint_error: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn category(&self) -> ErrorCategory {
        self.code.category()
    }

    // Convenience constructors
    pub fn network(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::NetworkError, msg)
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Timeout, msg)
    }

    pub fn crypto(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::CryptoError, msg)
    }

    pub fn array_length_mismatch(promises: usize, factors: usize, secrets: usize) -> Self {
        Self::new(
            ErrorCode::ArrayLengthMismatch,
            format!(
                "Cannot unblind {} promises with {} blinding factors and {} secrets",
                promises, factors, secrets
            ),
        )
    }

    pub fn missing_mint_key(amount: u64, keyset_id: &str) -> Self {
        Self::new(
            ErrorCode::MissingMintKey,
            format!("Keyset {} has no public key for amount {}", keyset_id, amount),
        )
    }

    pub fn token_encoding(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::TokenEncoding, msg)
    }

    pub fn token_decoding(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::TokenDecoding, msg)
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, msg)
    }

    pub fn invalid_split(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidSplit, msg)
    }

    pub fn insufficient_funds(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InsufficientFunds, msg)
    }

    pub fn unit_mismatch(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::UnitMismatch, msg)
    }

    pub fn unknown_keyset(keyset_id: &str) -> Self {
        Self::new(ErrorCode::UnknownKeyset, format!("Unknown keyset {}", keyset_id))
    }

    pub fn restore_state_mismatch(sent: usize, received: usize) -> Self {
        Self::new(
            ErrorCode::RestoreStateMismatch,
            format!("Sent {} proofs for state check but received {} states", sent, received),
        )
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, msg)
    }

    /// Error reported by the mint itself
    pub fn mint(kind: MintErrorKind, detail: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::MintError,
            message: detail.into(),
            details: None,
            mint_error: Some(kind),
        }
    }
}

impl fmt::Display for CashuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)?;
        if let Some(ref kind) = self.mint_error {
            write!(f, " <{}>", kind)?;
        }
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for CashuError {}

/// Error codes for categorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // Network errors
    NetworkError,
    Timeout,

    // Crypto errors
    CryptoError,
    HashToCurveExhausted,
    ArrayLengthMismatch,
    MissingMintKey,

    // Encoding errors
    TokenEncoding,
    TokenDecoding,
    JsonError,
    HexError,
    CborError,
    Base64Error,

    // Protocol errors
    MintError,

    // Validation errors
    InvalidInput,
    InvalidSplit,
    InsufficientFunds,
    UnitMismatch,
    UnknownKeyset,
    NoActiveKeyset,
    DistributionMismatch,
    InvalidMnemonic,

    // Restore errors
    RestoreStateMismatch,

    // Internal
    Internal,
}

/// Coarse error taxonomy callers branch on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Network,
    Crypto,
    Encoding,
    Protocol,
    Validation,
    Restore,
    Internal,
}

impl ErrorCode {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ErrorCode::NetworkError | ErrorCode::Timeout => ErrorCategory::Network,
            ErrorCode::CryptoError
            | ErrorCode::HashToCurveExhausted
            | ErrorCode::ArrayLengthMismatch
            | ErrorCode::MissingMintKey => ErrorCategory::Crypto,
            ErrorCode::TokenEncoding
            | ErrorCode::TokenDecoding
            | ErrorCode::JsonError
            | ErrorCode::HexError
            | ErrorCode::CborError
            | ErrorCode::Base64Error => ErrorCategory::Encoding,
            ErrorCode::MintError => ErrorCategory::Protocol,
            ErrorCode::InvalidInput
            | ErrorCode::InvalidSplit
            | ErrorCode::InsufficientFunds
            | ErrorCode::UnitMismatch
            | ErrorCode::UnknownKeyset
            | ErrorCode::NoActiveKeyset
            | ErrorCode::DistributionMismatch
            | ErrorCode::InvalidMnemonic => ErrorCategory::Validation,
            ErrorCode::RestoreStateMismatch => ErrorCategory::Restore,
            ErrorCode::Internal => ErrorCategory::Internal,
        }
    }
}

/// Numeric error codes reported by the mint
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum MintErrorKind {
    #[error("blinded message already signed")]
    BlindedMessageAlreadySigned,

    #[error("proofs already spent")]
    AlreadySpent,

    #[error("transaction is not balanced")]
    TransactionUnbalanced,

    #[error("unit is not supported")]
    UnitIsNotSupported,

    #[error("amount outside of limit range")]
    AmountOutsideOfLimitRange,

    #[error("keyset is inactive")]
    KeysetInactive,

    #[error("quote not paid")]
    QuoteNotPaid,

    #[error("proofs already issued for quote")]
    ProofsAlreadyIssuedForQuote,

    #[error("minting is disabled")]
    MintingDisabled,

    #[error("quote is pending")]
    QuoteIsPending,

    #[error("invoice already paid")]
    InvoiceAlreadyPaid,

    #[error("quote is expired")]
    QuoteIsExpired,

    #[error("unknown mint error: {0}")]
    UnknownError(String),
}

impl MintErrorKind {
    /// Translate a mint error code; `raw` is kept for codes outside the table
    pub fn from_code(code: i64, raw: &str) -> Self {
        match code {
            10002 => MintErrorKind::BlindedMessageAlreadySigned,
            11001 => MintErrorKind::AlreadySpent,
            11002 => MintErrorKind::TransactionUnbalanced,
            11005 => MintErrorKind::UnitIsNotSupported,
            11006 => MintErrorKind::AmountOutsideOfLimitRange,
            12002 => MintErrorKind::KeysetInactive,
            // 2001 is a typo some mints shipped
            20001 | 2001 => MintErrorKind::QuoteNotPaid,
            20002 => MintErrorKind::ProofsAlreadyIssuedForQuote,
            20003 => MintErrorKind::MintingDisabled,
            20005 => MintErrorKind::QuoteIsPending,
            20006 => MintErrorKind::InvoiceAlreadyPaid,
            20007 => MintErrorKind::QuoteIsExpired,
            _ => MintErrorKind::UnknownError(raw.to_string()),
        }
    }
}

/// Result type alias for client operations
pub type CashuResult<T> = Result<T, CashuError>;

// Conversions from common error types

impl From<serde_json::Error> for CashuError {
    fn from(e: serde_json::Error) -> Self {
        CashuError::new(ErrorCode::JsonError, e.to_string())
    }
}

impl From<hex::FromHexError> for CashuError {
    fn from(e: hex::FromHexError) -> Self {
        CashuError::new(ErrorCode::HexError, e.to_string())
    }
}

impl From<base64::DecodeError> for CashuError {
    fn from(e: base64::DecodeError) -> Self {
        CashuError::new(ErrorCode::Base64Error, e.to_string())
    }
}

impl From<reqwest::Error> for CashuError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            CashuError::timeout("Request timed out")
        } else if e.is_connect() {
            CashuError::network("Connection failed")
        } else {
            CashuError::network(e.to_string())
        }
    }
}

impl From<bitcoin::bip32::Error> for CashuError {
    fn from(e: bitcoin::bip32::Error) -> Self {
        CashuError::crypto(format!("BIP32 error: {}", e))
    }
}

impl From<bitcoin::secp256k1::Error> for CashuError {
    fn from(e: bitcoin::secp256k1::Error) -> Self {
        CashuError::crypto(format!("Secp256k1 error: {}", e))
    }
}

impl From<bip39::Error> for CashuError {
    fn from(e: bip39::Error) -> Self {
        CashuError::new(ErrorCode::InvalidMnemonic, format!("BIP39 error: {}", e))
    }
}
