//! Melt quotes and Lightning payouts

use serde::{Deserialize, Serialize};

use super::messages::{MeltQuote, MeltQuoteRequest, MeltQuoteResponse, MeltRequest};
use super::transport::{get_json, post_json, MintTransport};
use super::{CounterUpdate, MintClient};
use crate::crypto::{generate_outputs, unblind_with_outputs, DeterministicSource, OutputSet};
use crate::error::{CashuError, CashuResult};
use crate::types::{sum_amounts, Keyset, Proof, QuoteState};
use crate::wallet::{calculate_fee, calculate_number_of_blank_outputs};

/// Zero-amount outputs the mint may sign to refund unused fee reserve
#[derive(Debug, Clone)]
pub struct BlankOutputs {
    pub outputs: OutputSet,
    pub keyset: Keyset,
    pub counter_update: Option<CounterUpdate>,
}

/// Result of a melt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeltOutcome {
    pub state: QuoteState,
    pub paid: bool,
    pub preimage: Option<String>,
    /// Unblinded fee-reserve refund; empty if none or unblinding failed
    pub change: Vec<Proof>,
}

/// Blank outputs for a melt with `fee_reserve` overpayment
///
/// Deterministic outputs advance the keyset counter; the new value is in
/// [`BlankOutputs::counter_update`].
pub fn prepare_blank_outputs(fee_reserve: u64, keyset: &Keyset, seed: Option<&[u8]>) -> CashuResult<BlankOutputs> {
    let count = calculate_number_of_blank_outputs(fee_reserve);
    let amounts = vec![0u64; count];
    let source = seed.map(|s| DeterministicSource::new(s, keyset.derivation_counter));
    let outputs = generate_outputs(&amounts, &keyset.keyset_id, source)?;

    Ok(BlankOutputs {
        counter_update: seed.map(|_| CounterUpdate {
            keyset_id: keyset.keyset_id.clone(),
            derivation_counter: keyset.derivation_counter.saturating_add(count as u32),
        }),
        outputs,
        keyset: keyset.clone(),
    })
}

impl<T: MintTransport> MintClient<T> {
    /// Quote for paying a bolt11 invoice with `unit` ecash
    pub fn request_melt_quote(&self, bolt11: &str, unit: &str) -> CashuResult<MeltQuote> {
        let response: MeltQuoteResponse = post_json(
            &self.transport,
            "/v1/melt/quote/bolt11",
            &MeltQuoteRequest { request: bolt11, unit },
            self.config.timeouts.default,
        )?;

        crate::log_info!(
            "mint",
            "Melt quote created",
            quote = response.quote,
            amount = response.amount,
            fee_reserve = response.fee_reserve
        );
        Ok(melt_quote_from_response(response, bolt11, unit))
    }

    pub fn check_melt_quote(&self, quote: &MeltQuote) -> CashuResult<MeltQuote> {
        let response: MeltQuoteResponse = get_json(
            &self.transport,
            &format!("/v1/melt/quote/bolt11/{}", quote.quote),
            self.config.timeouts.default,
        )?;
        Ok(melt_quote_from_response(response, &quote.request, &quote.unit))
    }

    /// Pay a melt quote with `proofs`
    ///
    /// Inputs must cover quote amount, fee reserve and input fee. Change
    /// promises are unblinded against `blank_outputs`; failures there are
    /// logged and the melt still succeeds.
    pub fn melt(
        &self,
        quote: &MeltQuote,
        proofs: &[Proof],
        keysets: &[Keyset],
        blank_outputs: Option<&BlankOutputs>,
    ) -> CashuResult<MeltOutcome> {
        let input_fee = calculate_fee(proofs, keysets)?;
        let target = quote
            .amount
            .saturating_add(quote.fee_reserve)
            .saturating_add(input_fee);
        let total = sum_amounts(proofs);
        if total < target {
            return Err(CashuError::insufficient_funds(format!(
                "Inputs worth {} cannot cover {} (amount {}, fee reserve {}, input fee {})",
                total, target, quote.amount, quote.fee_reserve, input_fee
            )));
        }

        let response: MeltQuoteResponse = post_json(
            &self.transport,
            "/v1/melt/bolt11",
            &MeltRequest {
                quote: &quote.quote,
                inputs: proofs,
                outputs: blank_outputs.map(|b| b.outputs.outputs.as_slice()),
            },
            self.config.timeouts.melt,
        )?;

        let state = QuoteState::resolve(response.paid, response.state).unwrap_or(QuoteState::Unpaid);
        let change = match (response.change.as_deref(), blank_outputs) {
            (Some(promises), Some(blanks)) if !promises.is_empty() => {
                unblind_change(promises, blanks)
            }
            _ => Vec::new(),
        };

        crate::log_info!(
            "mint",
            "Melt finished",
            quote = quote.quote,
            state = format!("{:?}", state),
            change = sum_amounts(&change)
        );

        Ok(MeltOutcome {
            paid: state.is_paid(),
            state,
            preimage: response.payment_preimage,
            change,
        })
    }
}

/// Best-effort refund: the payment already went through
fn unblind_change(promises: &[crate::types::Promise], blanks: &BlankOutputs) -> Vec<Proof> {
    match unblind_with_outputs(promises, &blanks.outputs, &blanks.keyset) {
        Ok(proofs) => proofs,
        Err(e) => {
            crate::log_error!(
                "mint",
                "Could not unblind melt change",
                error = e,
                promises = promises.len(),
                blanks = blanks.outputs.len()
            );
            Vec::new()
        }
    }
}

fn melt_quote_from_response(response: MeltQuoteResponse, bolt11: &str, unit: &str) -> MeltQuote {
    MeltQuote {
        quote: response.quote,
        request: bolt11.to_string(),
        unit: unit.to_string(),
        amount: response.amount,
        fee_reserve: response.fee_reserve,
        state: QuoteState::resolve(response.paid, response.state).unwrap_or(QuoteState::Unpaid),
        expiry: response.expiry,
        payment_preimage: response.payment_preimage,
    }
}
