//! Proof Selection
//!
//! Coin selection over ecash proofs: a fee-aware greedy pass for
//! payments and an exact subset-sum search for offline sends.

use serde::{Deserialize, Serialize};

use crate::error::{CashuError, CashuResult};
use crate::types::{find_keyset, sum_amounts, Keyset, ProofLike};

/// Hard ceiling for exact subset-sum selection (2^24 subsets)
pub const SUBSET_SUM_HARD_LIMIT: usize = 24;

// =============================================================================
// Fees
// =============================================================================

/// Round parts-per-thousand up to whole units
pub fn ppk_to_fee(total_ppk: u64) -> u64 {
    total_ppk.div_ceil(1000)
}

/// Summed input fee (ppk) of `proofs`
pub fn input_fee_ppk<P: ProofLike>(proofs: &[P], keysets: &[Keyset]) -> CashuResult<u64> {
    proofs.iter().try_fold(0u64, |acc, proof| {
        let keyset = find_keyset(keysets, proof.keyset_id())?;
        Ok(acc.saturating_add(keyset.input_fee_ppk))
    })
}

/// Input fee for spending `proofs`: `ceil(Σ input_fee_ppk / 1000)`
pub fn calculate_fee<P: ProofLike>(proofs: &[P], keysets: &[Keyset]) -> CashuResult<u64> {
    Ok(ppk_to_fee(input_fee_ppk(proofs, keysets)?))
}

// =============================================================================
// Greedy Selection
// =============================================================================

/// Result of a greedy pick
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofSelection<P> {
    pub selected: Vec<P>,
    pub remaining: Vec<P>,
    /// Input fee for `selected`
    pub fee: u64,
    /// `sum(selected) - amount - fee`
    pub change: u64,
}

/// Pick proofs, largest first, until they cover `amount` plus their own fee
///
/// Returns `None` when even all proofs fall short.
pub fn pick<P: ProofLike + Clone>(
    proofs: &[P],
    amount: u64,
    keysets: &[Keyset],
    ignore_fees: bool,
) -> CashuResult<Option<ProofSelection<P>>> {
    let mut sorted: Vec<&P> = proofs.iter().collect();
    sorted.sort_by(|a, b| b.amount().cmp(&a.amount()));

    let mut total = 0u64;
    let mut ppk = 0u64;

    for (i, proof) in sorted.iter().enumerate() {
        total = total.saturating_add(proof.amount());
        if !ignore_fees {
            ppk = ppk.saturating_add(find_keyset(keysets, proof.keyset_id())?.input_fee_ppk);
        }

        let fee = ppk_to_fee(ppk);
        let required = amount.saturating_add(fee);
        if total >= required {
            let selected = sorted[..=i].iter().map(|p| (*p).clone()).collect();
            let remaining = sorted[i + 1..].iter().map(|p| (*p).clone()).collect();
            return Ok(Some(ProofSelection {
                selected,
                remaining,
                fee,
                change: total - required,
            }));
        }
    }

    Ok(None)
}

// =============================================================================
// Exact Selection
// =============================================================================

/// Find a subset summing exactly to `target`
///
/// Enumerates all `2^n` subsets in mask order and returns the first match
/// as `(selected, remaining)`. Inputs longer than `max_inputs` (itself
/// capped at [`SUBSET_SUM_HARD_LIMIT`]) are rejected rather than searched.
pub fn select_proofs_to_sum_target<P: ProofLike + Clone>(
    proofs: &[P],
    target: u64,
    max_inputs: usize,
) -> CashuResult<Option<(Vec<P>, Vec<P>)>> {
    let ceiling = max_inputs.min(SUBSET_SUM_HARD_LIMIT);
    if proofs.len() > ceiling {
        return Err(CashuError::invalid_input(format!(
            "Exact selection over {} proofs exceeds the limit of {}",
            proofs.len(),
            ceiling
        )));
    }

    if sum_amounts(proofs) < target {
        return Ok(None);
    }

    let n = proofs.len();
    for mask in 0u32..(1u32 << n) {
        let sum = (0..n)
            .filter(|bit| mask & (1 << bit) != 0)
            .fold(0u64, |acc, bit| acc.saturating_add(proofs[bit].amount()));
        if sum != target {
            continue;
        }

        let (selected, remaining): (Vec<_>, Vec<_>) = proofs
            .iter()
            .enumerate()
            .partition(|(bit, _)| mask & (1 << bit) != 0);
        return Ok(Some((
            selected.into_iter().map(|(_, p)| p.clone()).collect(),
            remaining.into_iter().map(|(_, p)| p.clone()).collect(),
        )));
    }

    Ok(None)
}
