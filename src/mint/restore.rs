//! Restore: recover proofs from a seed
//!
//! For every keyset, batches of deterministic amount-1 outputs are sent to
//! `/v1/restore`. The mint answers with the outputs it has signed before.
//! The scan stops after two consecutive batches without a match, then
//! rewinds the counter to just past the last matched position.

use super::messages::{RestoreRequest, RestoreResponse};
use super::transport::{post_json, MintTransport};
use super::MintClient;
use crate::crypto::{generate_outputs, unblind_promises, DeterministicSource};
use crate::error::CashuResult;
use crate::types::{Keyset, KeysetRestoreResult, Proof, ProofState};

/// Consecutive empty batches that end a scan
pub const EMPTY_BATCHES_TO_STOP: u32 = 2;

/// Counter position of the last match, from the scan's end state
///
/// `counter - (empty_runs + 1) * batch_size + last_match_batch_index`,
/// clamped at zero.
pub fn resumable_counter(counter: u32, empty_runs: u32, batch_size: u32, last_match_batch_index: u32) -> u32 {
    let rewind = empty_runs.saturating_add(1).saturating_mul(batch_size);
    counter.saturating_sub(rewind).saturating_add(last_match_batch_index)
}

/// Proofs recovered from one batch plus the highest matched index
struct BatchMatch {
    proofs: Vec<Proof>,
    last_index: Option<u32>,
}

impl<T: MintTransport> MintClient<T> {
    /// Scan every keyset for proofs derived from `seed`
    ///
    /// Only proofs the mint reports as unspent are returned.
    pub fn restore(&self, keysets: &[Keyset], seed: &[u8]) -> CashuResult<Vec<KeysetRestoreResult>> {
        keysets
            .iter()
            .map(|keyset| self.restore_keyset(keyset, seed))
            .collect()
    }

    /// Scan a single keyset starting at its current counter
    pub fn restore_keyset(&self, keyset: &Keyset, seed: &[u8]) -> CashuResult<KeysetRestoreResult> {
        let batch_size = self.config.restore_batch_size;
        let start = keyset.derivation_counter;

        let mut counter = start;
        let mut empty_runs = 0u32;
        let mut last_match_batch_index: Option<u32> = None;
        let mut recovered: Vec<Proof> = Vec::new();

        while empty_runs < EMPTY_BATCHES_TO_STOP {
            let batch = self.restore_batch(keyset, seed, counter, batch_size)?;

            match batch.last_index {
                Some(index) => {
                    empty_runs = 0;
                    last_match_batch_index = Some(index);
                    recovered.extend(batch.proofs);
                }
                None => empty_runs += 1,
            }

            crate::log_debug!(
                "restore",
                "Batch scanned",
                keyset_id = keyset.keyset_id,
                counter = counter,
                empty_runs = empty_runs
            );
            counter = counter.saturating_add(batch_size);
        }

        let derivation_counter = match last_match_batch_index {
            Some(index) => resumable_counter(counter, empty_runs, batch_size, index).saturating_add(1),
            None => start,
        };

        let proofs = self.retain_unspent(recovered)?;

        crate::log_info!(
            "restore",
            "Keyset restored",
            keyset_id = keyset.keyset_id,
            proofs = proofs.len(),
            derivation_counter = derivation_counter
        );

        Ok(KeysetRestoreResult {
            keyset_id: keyset.keyset_id.clone(),
            derivation_counter,
            unit: keyset.unit.clone(),
            proofs,
            input_fee_ppk: keyset.input_fee_ppk,
        })
    }

    fn restore_batch(&self, keyset: &Keyset, seed: &[u8], counter: u32, batch_size: u32) -> CashuResult<BatchMatch> {
        let amounts = vec![1u64; batch_size as usize];
        let generated = generate_outputs(
            &amounts,
            &keyset.keyset_id,
            Some(DeterministicSource::new(seed, counter)),
        )?;

        let response: RestoreResponse = post_json(
            &self.transport,
            "/v1/restore",
            &RestoreRequest {
                outputs: &generated.outputs,
            },
            self.config.timeouts.restore,
        )?;

        if response.signatures.is_empty() {
            return Ok(BatchMatch { proofs: Vec::new(), last_index: None });
        }

        let mut promises = Vec::new();
        let mut factors = Vec::new();
        let mut secrets = Vec::new();
        let mut last_index = None;

        for (returned, promise) in response.outputs.iter().zip(&response.signatures) {
            let position = generated
                .outputs
                .iter()
                .position(|o| o.blinded_message == returned.blinded_message);
            if let Some(i) = position {
                promises.push(promise.clone());
                factors.push(generated.blinding_factors[i]);
                secrets.push(generated.secrets[i].clone());
                last_index = last_index.max(Some(i as u32));
            }
        }

        let proofs = unblind_promises(&promises, &factors, &secrets, keyset)?;
        Ok(BatchMatch { proofs, last_index })
    }

    fn retain_unspent(&self, proofs: Vec<Proof>) -> CashuResult<Vec<Proof>> {
        let states = self.check_state(&proofs)?;
        Ok(proofs
            .into_iter()
            .zip(states)
            .filter(|(_, state)| *state == ProofState::Unspent)
            .map(|(proof, _)| proof)
            .collect())
    }
}
