//! Client Configuration
//!
//! Tunables for mint operations:
//! - Per-operation network timeouts
//! - Restore batch size
//! - DLEQ policy for missing proofs
//! - Input ceiling for exact subset-sum selection

use std::time::Duration;
use url::Url;

use crate::crypto::DleqPolicy;
use crate::error::{CashuError, CashuResult};
use crate::wallet::selection::SUBSET_SUM_HARD_LIMIT;

/// Network timeout per mint operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationTimeouts {
    /// Keysets, info and quote lookups
    pub default: Duration,
    pub swap: Duration,
    pub issue: Duration,
    /// Lightning settlement can take a while
    pub melt: Duration,
    pub restore: Duration,
    pub check_state: Duration,
}

impl Default for OperationTimeouts {
    fn default() -> Self {
        let standard = Duration::from_secs(30);
        Self {
            default: standard,
            swap: standard,
            issue: standard,
            melt: Duration::from_secs(120),
            restore: standard,
            check_state: standard,
        }
    }
}

impl OperationTimeouts {
    fn all(&self) -> [Duration; 6] {
        [self.default, self.swap, self.issue, self.melt, self.restore, self.check_state]
    }
}

/// Settings shared by every operation of a [`crate::mint::MintClient`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub timeouts: OperationTimeouts,
    /// Outputs generated per restore request
    pub restore_batch_size: u32,
    pub dleq_policy: DleqPolicy,
    /// Largest proof count accepted by exact subset-sum selection
    pub max_subset_sum_inputs: usize,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::standard()
    }
}

impl ClientConfig {
    /// Lenient DLEQ handling for interoperability with older mints
    pub fn standard() -> Self {
        Self {
            timeouts: OperationTimeouts::default(),
            restore_batch_size: 25,
            dleq_policy: DleqPolicy::Lenient,
            max_subset_sum_inputs: 20,
            user_agent: format!("cashu-client-core/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Missing DLEQ data fails verification
    pub fn strict() -> Self {
        Self {
            dleq_policy: DleqPolicy::Strict,
            ..Self::standard()
        }
    }

    /// Reject settings no operation can run with
    pub fn validate(&self) -> CashuResult<()> {
        if self.restore_batch_size == 0 {
            return Err(CashuError::invalid_input("Restore batch size must be at least 1"));
        }

        if self.timeouts.all().iter().any(Duration::is_zero) {
            return Err(CashuError::invalid_input("Timeouts must be non-zero"));
        }

        if self.max_subset_sum_inputs > SUBSET_SUM_HARD_LIMIT {
            return Err(CashuError::invalid_input(format!(
                "Subset-sum ceiling {} exceeds hard limit {}",
                self.max_subset_sum_inputs, SUBSET_SUM_HARD_LIMIT
            )));
        }

        Ok(())
    }
}

/// Parse a mint URL, allow only http(s), strip trailing slashes
pub fn normalize_mint_url(raw: &str) -> CashuResult<String> {
    let parsed = Url::parse(raw.trim())
        .map_err(|e| CashuError::invalid_input(format!("Invalid mint URL: {}", e)))?;

    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(CashuError::invalid_input(format!(
                "Unsupported mint URL scheme '{}'",
                other
            )))
        }
    }

    if parsed.host_str().is_none() {
        return Err(CashuError::invalid_input("Mint URL has no host"));
    }

    Ok(parsed.as_str().trim_end_matches('/').to_string())
}
