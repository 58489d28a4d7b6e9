//! Spend-state checks

use std::collections::HashMap;

use super::messages::{CheckStateRequest, CheckStateResponse};
use super::transport::{post_json, MintTransport};
use super::MintClient;
use crate::crypto::{hash_to_curve_str, point_to_hex};
use crate::error::{CashuError, CashuResult};
use crate::types::{ProofLike, ProofState};

impl<T: MintTransport> MintClient<T> {
    /// Spend state of each proof, in input order
    ///
    /// The mint is queried by `Y = hash_to_curve(secret)`; a response that
    /// does not cover every proof is a restore error.
    pub fn check_state<P: ProofLike>(&self, proofs: &[P]) -> CashuResult<Vec<ProofState>> {
        if proofs.is_empty() {
            return Ok(Vec::new());
        }

        let ys = proofs
            .iter()
            .map(|p| hash_to_curve_str(p.secret()).map(|y| point_to_hex(&y)))
            .collect::<CashuResult<Vec<_>>>()?;

        let response: CheckStateResponse = post_json(
            &self.transport,
            "/v1/checkstate",
            &CheckStateRequest { ys: ys.clone() },
            self.config.timeouts.check_state,
        )?;

        if response.states.len() != ys.len() {
            return Err(CashuError::restore_state_mismatch(ys.len(), response.states.len()));
        }

        let by_y: HashMap<String, ProofState> = response
            .states
            .into_iter()
            .map(|entry| (entry.y.to_lowercase(), entry.state))
            .collect();

        ys.iter()
            .map(|y| {
                by_y.get(y)
                    .copied()
                    .ok_or_else(|| CashuError::restore_state_mismatch(ys.len(), by_y.len()))
            })
            .collect()
    }
}
