//! Swap: exchange proofs for fresh ones of chosen denominations

use serde::{Deserialize, Serialize};

use super::messages::{SignaturesResponse, SwapRequest};
use super::transport::{post_json, MintTransport};
use super::{CounterUpdate, MintClient};
use crate::crypto::{generate_outputs, unblind_promises, verify_proofs_dleq, DeterministicSource};
use crate::error::{CashuError, CashuResult};
use crate::types::{active_keyset_for_unit, find_keyset, sum_amounts, Keyset, Proof};
use crate::wallet::{calculate_fee, plan_distribution, split};

/// Optional knobs for [`MintClient::swap`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SwapOptions<'a> {
    /// Amount to split off for sending; `None` swaps everything
    pub amount: Option<u64>,
    pub send_distribution: Option<&'a [u64]>,
    pub change_distribution: Option<&'a [u64]>,
    /// Derive outputs deterministically from this seed
    pub seed: Option<&'a [u8]>,
}

/// New proofs split into the requested amount and the change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapOutcome {
    pub send: Vec<Proof>,
    pub change: Vec<Proof>,
    pub fee: u64,
    pub counter_update: Option<CounterUpdate>,
}

/// The single unit all `proofs` are denominated in
fn common_unit<'a>(proofs: &[Proof], keysets: &'a [Keyset]) -> CashuResult<&'a str> {
    let mut unit: Option<&str> = None;
    for proof in proofs {
        let keyset = find_keyset(keysets, &proof.keyset_id)?;
        match unit {
            None => unit = Some(keyset.unit.as_str()),
            Some(u) if u == keyset.unit => {}
            Some(u) => {
                return Err(CashuError::unit_mismatch(format!(
                    "Proofs mix units {} and {}",
                    u, keyset.unit
                )))
            }
        }
    }
    unit.ok_or_else(|| CashuError::invalid_input("No proofs to swap"))
}

/// Split `proofs` into those matching the `send` denominations and the rest
///
/// Each planned send amount claims one proof of that amount.
pub(crate) fn partition_by_distribution(proofs: Vec<Proof>, send: &[u64]) -> (Vec<Proof>, Vec<Proof>) {
    let mut wanted = send.to_vec();
    let mut sent = Vec::new();
    let mut kept = Vec::new();

    for proof in proofs {
        match wanted.iter().position(|a| *a == proof.amount) {
            Some(i) => {
                wanted.swap_remove(i);
                sent.push(proof);
            }
            None => kept.push(proof),
        }
    }

    (sent, kept)
}

impl<T: MintTransport> MintClient<T> {
    /// Swap `proofs` for new proofs
    ///
    /// With `options.amount` the inputs must cover `amount + fee`; the
    /// remainder comes back as change. Without it the whole input value
    /// minus fee is returned as `send`.
    pub fn swap(&self, proofs: &[Proof], keysets: &[Keyset], options: SwapOptions<'_>) -> CashuResult<SwapOutcome> {
        let unit = common_unit(proofs, keysets)?;
        let fee = calculate_fee(proofs, keysets)?;
        let total = sum_amounts(proofs);

        let required = options.amount.unwrap_or(0).saturating_add(fee);
        if total < required {
            return Err(CashuError::insufficient_funds(format!(
                "Inputs worth {} cannot cover {} plus fee {}",
                total,
                options.amount.unwrap_or(0),
                fee
            )));
        }
        let (send_amount, change_amount) = split(total, options.amount, fee)?;

        let keyset = active_keyset_for_unit(keysets, unit)?;
        let send_distribution = plan_distribution(send_amount, options.send_distribution)?;
        let change_distribution = plan_distribution(change_amount, options.change_distribution)?;

        let mut swap_distribution: Vec<u64> = send_distribution
            .iter()
            .chain(change_distribution.iter())
            .copied()
            .collect();
        swap_distribution.sort_unstable();

        let source = options
            .seed
            .map(|s| DeterministicSource::new(s, keyset.derivation_counter));
        let outputs = generate_outputs(&swap_distribution, &keyset.keyset_id, source)?;

        let response: SignaturesResponse = post_json(
            &self.transport,
            "/v1/swap",
            &SwapRequest {
                inputs: proofs,
                outputs: &outputs.outputs,
            },
            self.config.timeouts.swap,
        )?;

        let new_proofs = unblind_promises(
            &response.signatures,
            &outputs.blinding_factors,
            &outputs.secrets,
            keyset,
        )?;

        // Inputs are already spent at this point, so a bad DLEQ is reported, not raised
        let dleq = verify_proofs_dleq(&new_proofs, keysets, self.config.dleq_policy);
        if !dleq.all_valid() {
            crate::log_warn!("mint", "Swap returned proofs failing DLEQ", invalid = dleq.invalid());
        }

        let (send, change) = partition_by_distribution(new_proofs, &send_distribution);

        crate::log_info!(
            "mint",
            "Swap complete",
            inputs = proofs.len(),
            send = send_amount,
            change = change_amount,
            fee = fee
        );

        Ok(SwapOutcome {
            send,
            change,
            fee,
            counter_update: options.seed.map(|_| CounterUpdate {
                keyset_id: keyset.keyset_id.clone(),
                derivation_counter: keyset.derivation_counter.saturating_add(outputs.len() as u32),
            }),
        })
    }
}
