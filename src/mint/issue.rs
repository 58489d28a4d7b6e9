//! Mint quotes and issuance

use serde::{Deserialize, Serialize};

use super::messages::{MintQuote, MintQuoteRequest, MintQuoteResponse, MintRequest, SignaturesResponse};
use super::transport::{get_json, post_json, MintTransport};
use super::{CounterUpdate, MintClient};
use crate::crypto::{generate_outputs, unblind_promises, verify_proofs_dleq, DeterministicSource, DleqReport};
use crate::error::{CashuError, CashuResult};
use crate::types::{active_keyset_for_unit, Keyset, Proof, QuoteState};
use crate::wallet::plan_distribution;

/// Proofs minted for a paid quote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueOutcome {
    pub proofs: Vec<Proof>,
    pub dleq: DleqReport,
    pub counter_update: Option<CounterUpdate>,
}

impl IssueOutcome {
    /// Aggregate DLEQ verdict under the client's policy
    pub fn dleq_valid(&self) -> bool {
        self.dleq.all_valid()
    }
}

impl<T: MintTransport> MintClient<T> {
    /// Ask for an invoice worth `amount` of `unit`
    pub fn request_mint_quote(&self, amount: u64, unit: &str) -> CashuResult<MintQuote> {
        if amount == 0 {
            return Err(CashuError::invalid_input("Mint quote amount must be positive"));
        }

        let response: MintQuoteResponse = post_json(
            &self.transport,
            "/v1/mint/quote/bolt11",
            &MintQuoteRequest { amount, unit },
            self.config.timeouts.default,
        )?;

        crate::log_info!("mint", "Mint quote created", quote = response.quote, amount = amount);
        Ok(mint_quote_from_response(response, amount, unit))
    }

    /// Refresh a quote's payment state
    pub fn check_mint_quote(&self, quote: &MintQuote) -> CashuResult<MintQuote> {
        let response: MintQuoteResponse = get_json(
            &self.transport,
            &format!("/v1/mint/quote/bolt11/{}", quote.quote),
            self.config.timeouts.default,
        )?;
        Ok(mint_quote_from_response(response, quote.amount, &quote.unit))
    }

    /// Redeem a paid quote for proofs
    ///
    /// Outputs are made against the active keyset for the quote's unit,
    /// deterministically when `seed` is given. `preferred` overrides the
    /// canonical power-of-two split and must sum to the quote amount.
    pub fn issue(
        &self,
        quote: &MintQuote,
        keysets: &[Keyset],
        preferred: Option<&[u64]>,
        seed: Option<&[u8]>,
    ) -> CashuResult<IssueOutcome> {
        let keyset = active_keyset_for_unit(keysets, &quote.unit)?;
        let distribution = plan_distribution(quote.amount, preferred)?;

        let source = seed.map(|s| DeterministicSource::new(s, keyset.derivation_counter));
        let outputs = generate_outputs(&distribution, &keyset.keyset_id, source)?;

        let response: SignaturesResponse = post_json(
            &self.transport,
            "/v1/mint/bolt11",
            &MintRequest {
                quote: &quote.quote,
                outputs: &outputs.outputs,
            },
            self.config.timeouts.issue,
        )?;

        let proofs = unblind_promises(
            &response.signatures,
            &outputs.blinding_factors,
            &outputs.secrets,
            keyset,
        )?;

        let dleq = verify_proofs_dleq(&proofs, keysets, self.config.dleq_policy);

        crate::log_info!(
            "mint",
            "Issued proofs",
            quote = quote.quote,
            amount = quote.amount,
            outputs = proofs.len(),
            dleq_valid = dleq.all_valid()
        );

        Ok(IssueOutcome {
            proofs,
            dleq,
            counter_update: seed.map(|_| CounterUpdate {
                keyset_id: keyset.keyset_id.clone(),
                derivation_counter: keyset.derivation_counter.saturating_add(outputs.len() as u32),
            }),
        })
    }
}

fn mint_quote_from_response(response: MintQuoteResponse, amount: u64, unit: &str) -> MintQuote {
    MintQuote {
        quote: response.quote,
        request: response.request,
        amount,
        unit: unit.to_string(),
        state: QuoteState::resolve(response.paid, response.state).unwrap_or(QuoteState::Unpaid),
        expiry: response.expiry,
    }
}
