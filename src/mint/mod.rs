//! Mint Protocol Client
//!
//! Orchestrates the mint operations on top of the crypto, wallet and
//! token modules:
//! - keysets and info
//! - mint/melt quotes
//! - swap, issue, melt and restore
//! - spend-state checks
//!
//! The client holds no wallet state. Keysets (and their derivation
//! counters) come in as arguments and advanced counters come back as
//! [`CounterUpdate`]s for the caller to persist.

mod issue;
mod keysets;
mod melt;
pub mod messages;
mod restore;
mod state;
mod swap;
pub mod transport;

pub use melt::{prepare_blank_outputs, BlankOutputs, MeltOutcome};
pub use messages::{MeltQuote, MintQuote};
pub use issue::IssueOutcome;
pub use restore::resumable_counter;
pub use swap::{SwapOptions, SwapOutcome};
pub use transport::MintTransport;

use serde::{Deserialize, Serialize};

use crate::error::CashuResult;
use crate::types::ProofLike;
use crate::utils::config::{normalize_mint_url, ClientConfig};
use crate::utils::HttpTransport;
use crate::wallet::select_proofs_to_sum_target;

/// New derivation counter for a keyset after deterministic generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterUpdate {
    pub keyset_id: String,
    pub derivation_counter: u32,
}

/// Client for one mint
pub struct MintClient<T: MintTransport> {
    url: String,
    transport: T,
    config: ClientConfig,
}

impl MintClient<HttpTransport> {
    /// HTTP client for `mint_url`
    pub fn connect(mint_url: &str, config: ClientConfig) -> CashuResult<Self> {
        let transport = HttpTransport::new(mint_url, &config.user_agent)?;
        Self::new(mint_url, transport, config)
    }
}

impl<T: MintTransport> MintClient<T> {
    pub fn new(mint_url: &str, transport: T, config: ClientConfig) -> CashuResult<Self> {
        config.validate()?;
        Ok(Self {
            url: normalize_mint_url(mint_url)?,
            transport,
            config,
        })
    }

    /// Normalized mint URL, as used for token mint keys
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Exact-amount selection capped at the configured input ceiling
    pub fn select_exact<P: ProofLike + Clone>(&self, proofs: &[P], target: u64) -> CashuResult<Option<(Vec<P>, Vec<P>)>> {
        select_proofs_to_sum_target(proofs, target, self.config.max_subset_sum_inputs)
    }
}
