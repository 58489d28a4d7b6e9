//! Cashu Client Core
//!
//! Client-side core for blind Diffie-Hellman ecash.
//!
//! # Architecture
//!
//! This crate provides:
//! - **crypto**: Hash-to-curve, blinding, DLEQ verification, deterministic derivation
//! - **wallet**: Seeds, denomination planning, proof selection and fees
//! - **token**: V3 (`cashuA`) and V4 (`cashuB`) token codecs
//! - **mint**: Swap, issue, melt and restore against a mint
//! - **utils**: Configuration, logging, HTTP transport
//!
//! # State
//!
//! Nothing is persisted here. Keysets and their derivation counters are
//! passed into every operation and updated counters are handed back in
//! the operation's outcome.
//!
//! # Security
//!
//! This crate uses `zeroize` to clear seeds and entropy from memory, and
//! its logger redacts secrets, blinding factors and tokens.
//!
//! # Example
//!
//! ```rust,ignore
//! use cashu_client_core::{ClientConfig, MintClient, Token, TokenVersion};
//!
//! let client = MintClient::connect("https://mint.example.com", ClientConfig::default())?;
//! let keysets = client.load_keysets()?;
//! let quote = client.request_mint_quote(100, "sat")?;
//! // pay quote.request, then
//! let issued = client.issue(&client.check_mint_quote(&quote)?, &keysets, None, None)?;
//! let token = Token::new(client.url(), issued.proofs, "sat", None);
//! println!("{}", token.encode(TokenVersion::V4)?);
//! ```

pub mod crypto;
pub mod error;
pub mod mint;
mod serde_bytes;
pub mod token;
pub mod types;
pub mod utils;
pub mod wallet;

// Re-export key types for convenience
pub use error::{CashuError, CashuResult, ErrorCategory, ErrorCode, MintErrorKind};
pub use mint::{CounterUpdate, MintClient, MintTransport};
pub use token::{Token, TokenVersion};
pub use types::*;
pub use utils::{ClientConfig, HttpTransport};
