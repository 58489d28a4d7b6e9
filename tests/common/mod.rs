//! In-process mint for protocol tests
//!
//! Implements the `/v1` endpoints the client uses with real blind
//! signatures and DLEQ proofs. Protocol failures are returned as
//! `{detail, code}` bodies, just like a live mint.

#![allow(dead_code)]

use bitcoin::secp256k1::{PublicKey, Scalar, SecretKey};
use cashu_client_core::crypto::{
    derive_keyset_id, hash_e, hash_to_curve_str, mul_generator, mul_point, parse_point, point_to_hex,
    random_scalar, scalar_to_hex, KeysetIdVersion,
};
use cashu_client_core::wallet::split_into_base2_numbers;
use cashu_client_core::{
    CashuError, CashuResult, ClientConfig, MintClient, MintTransport, Output, Promise, PromiseDleq, Proof,
};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

pub const MINT_URL: &str = "https://mint.test";
pub const MNEMONIC: &str = "half depart obvious quality work element tank gorilla view sugar picture humble";

/// Lightning fee the mock actually pays on every melt
pub const LN_FEE_PAID: u64 = 1;
pub const FEE_RESERVE: u64 = 8;

struct MintQuoteEntry {
    amount: u64,
    paid: bool,
    issued: bool,
}

struct MeltQuoteEntry {
    amount: u64,
    paid: bool,
}

#[derive(Default)]
struct MockState {
    /// B_ hex to the promise issued for it
    signed: HashMap<String, (Output, Promise)>,
    spent: HashSet<String>,
    mint_quotes: HashMap<String, MintQuoteEntry>,
    melt_quotes: HashMap<String, MeltQuoteEntry>,
    next_quote: u32,
    restore_calls: u32,
    swap_calls: u32,
}

pub struct MockMint {
    keyset_id: String,
    keys: BTreeMap<u64, SecretKey>,
    input_fee_ppk: u64,
    with_dleq: bool,
    state: Mutex<MockState>,
}

fn error_body(code: i64, detail: &str) -> Value {
    json!({ "detail": detail, "code": code })
}

impl MockMint {
    pub fn new(input_fee_ppk: u64) -> Self {
        let keys: BTreeMap<u64, SecretKey> = (0..16).map(|bit| (1u64 << bit, random_scalar())).collect();
        let public: BTreeMap<String, String> = keys
            .iter()
            .map(|(amount, k)| (amount.to_string(), point_to_hex(&mul_generator(k))))
            .collect();
        let keyset_id = derive_keyset_id(&public, KeysetIdVersion::Hex).unwrap();

        Self {
            keyset_id,
            keys,
            input_fee_ppk,
            with_dleq: true,
            state: Mutex::new(MockState::default()),
        }
    }

    pub fn without_dleq(mut self) -> Self {
        self.with_dleq = false;
        self
    }

    pub fn keyset_id(&self) -> &str {
        &self.keyset_id
    }

    pub fn restore_calls(&self) -> u32 {
        self.state.lock().unwrap().restore_calls
    }

    pub fn swap_calls(&self) -> u32 {
        self.state.lock().unwrap().swap_calls
    }

    /// Pretend the invoice for `quote` was paid
    pub fn pay_mint_quote(&self, quote: &str) {
        if let Some(entry) = self.state.lock().unwrap().mint_quotes.get_mut(quote) {
            entry.paid = true;
        }
    }

    fn public_keys(&self) -> BTreeMap<String, String> {
        self.keys
            .iter()
            .map(|(amount, k)| (amount.to_string(), point_to_hex(&mul_generator(k))))
            .collect()
    }

    fn sign(&self, output: &Output, state: &mut MockState) -> Result<Promise, Value> {
        if state.signed.contains_key(&output.blinded_message) {
            return Err(error_body(10002, "Blinded message already signed"));
        }
        let k = self
            .keys
            .get(&output.amount)
            .ok_or_else(|| error_body(11006, "Amount has no key"))?;
        let b_ = parse_point(&output.blinded_message).map_err(|_| error_body(0, "Bad B_"))?;
        let c_ = mul_point(&b_, k).unwrap();

        let dleq = self.with_dleq.then(|| {
            let (e, s) = dleq_proof(k, &b_, &c_);
            PromiseDleq {
                e: scalar_to_hex(&e),
                s: scalar_to_hex(&s),
            }
        });

        let promise = Promise {
            keyset_id: self.keyset_id.clone(),
            amount: output.amount,
            blinded_signature: point_to_hex(&c_),
            dleq,
        };
        state
            .signed
            .insert(output.blinded_message.clone(), (output.clone(), promise.clone()));
        Ok(promise)
    }

    /// Check signatures and double spends; returns the input fee
    fn verify_inputs(&self, inputs: &[Proof], state: &MockState) -> Result<u64, Value> {
        for proof in inputs {
            let y = hash_to_curve_str(&proof.secret).unwrap();
            if state.spent.contains(&point_to_hex(&y)) {
                return Err(error_body(11001, "Token already spent."));
            }
            let k = self.keys.get(&proof.amount).ok_or_else(|| error_body(0, "Unknown amount"))?;
            if point_to_hex(&mul_point(&y, k).unwrap()) != proof.signature {
                return Err(error_body(0, "Invalid proof"));
            }
        }
        let ppk = self.input_fee_ppk * inputs.len() as u64;
        Ok((ppk + 999) / 1000)
    }

    fn spend(&self, inputs: &[Proof], state: &mut MockState) {
        for proof in inputs {
            let y = hash_to_curve_str(&proof.secret).unwrap();
            state.spent.insert(point_to_hex(&y));
        }
    }

    fn route_get(&self, path: &str) -> Value {
        let state = self.state.lock().unwrap();
        match path {
            "/v1/keysets" => json!({
                "keysets": [{
                    "id": self.keyset_id,
                    "unit": "sat",
                    "active": true,
                    "input_fee_ppk": self.input_fee_ppk,
                }]
            }),
            "/v1/info" => json!({ "name": "mock mint", "version": "mock/0.1" }),
            p if p.starts_with("/v1/keys/") => json!({
                "keysets": [{ "id": self.keyset_id, "unit": "sat", "keys": self.public_keys() }]
            }),
            p if p.starts_with("/v1/mint/quote/bolt11/") => {
                let id = p.trim_start_matches("/v1/mint/quote/bolt11/");
                match state.mint_quotes.get(id) {
                    Some(q) => json!({
                        "quote": id,
                        "request": format!("lnbc-mock-{}", q.amount),
                        // legacy boolean alongside state
                        "paid": q.paid,
                        "state": if q.issued { "ISSUED" } else if q.paid { "PAID" } else { "UNPAID" },
                        "expiry": 1_900_000_000u64,
                    }),
                    None => error_body(0, "Unknown quote"),
                }
            }
            p if p.starts_with("/v1/melt/quote/bolt11/") => {
                let id = p.trim_start_matches("/v1/melt/quote/bolt11/");
                match state.melt_quotes.get(id) {
                    Some(q) => json!({
                        "quote": id,
                        "amount": q.amount,
                        "fee_reserve": FEE_RESERVE,
                        "state": if q.paid { "PAID" } else { "UNPAID" },
                        "expiry": 1_900_000_000u64,
                    }),
                    None => error_body(0, "Unknown quote"),
                }
            }
            _ => error_body(0, "Not found"),
        }
    }

    fn route_post(&self, path: &str, body: &Value) -> Value {
        let mut state = self.state.lock().unwrap();
        let result = match path {
            "/v1/mint/quote/bolt11" => {
                state.next_quote += 1;
                let id = format!("mint-quote-{}", state.next_quote);
                let amount = body["amount"].as_u64().unwrap_or(0);
                state.mint_quotes.insert(
                    id.clone(),
                    MintQuoteEntry {
                        amount,
                        paid: false,
                        issued: false,
                    },
                );
                Ok(json!({
                    "quote": id,
                    "request": format!("lnbc-mock-{}", amount),
                    "state": "UNPAID",
                    "expiry": 1_900_000_000u64,
                }))
            }
            "/v1/mint/bolt11" => self.mint(body, &mut state),
            "/v1/melt/quote/bolt11" => {
                state.next_quote += 1;
                let id = format!("melt-quote-{}", state.next_quote);
                let amount = body["request"]
                    .as_str()
                    .and_then(|r| r.strip_prefix("lnbc-mock-"))
                    .and_then(|a| a.parse::<u64>().ok())
                    .unwrap_or(0);
                state.melt_quotes.insert(id.clone(), MeltQuoteEntry { amount, paid: false });
                Ok(json!({
                    "quote": id,
                    "amount": amount,
                    "fee_reserve": FEE_RESERVE,
                    "paid": false,
                    "expiry": 1_900_000_000u64,
                }))
            }
            "/v1/melt/bolt11" => self.melt(body, &mut state),
            "/v1/swap" => self.swap(body, &mut state),
            "/v1/restore" => Ok(self.restore(body, &mut state)),
            "/v1/checkstate" => {
                let ys: Vec<String> = serde_json::from_value(body["Ys"].clone()).unwrap();
                let states: Vec<Value> = ys
                    .iter()
                    .map(|y| {
                        let s = if state.spent.contains(y) { "SPENT" } else { "UNSPENT" };
                        json!({ "Y": y, "state": s, "witness": null })
                    })
                    .collect();
                Ok(json!({ "states": states }))
            }
            _ => Err(error_body(0, "Not found")),
        };
        result.unwrap_or_else(|err| err)
    }

    fn mint(&self, body: &Value, state: &mut MockState) -> Result<Value, Value> {
        let id = body["quote"].as_str().unwrap_or_default().to_string();
        let outputs: Vec<Output> = serde_json::from_value(body["outputs"].clone()).unwrap();

        let (amount, paid, issued) = match state.mint_quotes.get(&id) {
            Some(q) => (q.amount, q.paid, q.issued),
            None => return Err(error_body(0, "Unknown quote")),
        };
        if issued {
            return Err(error_body(20002, "Quote already issued"));
        }
        if !paid {
            return Err(error_body(20001, "Quote not paid"));
        }
        if outputs.iter().map(|o| o.amount).sum::<u64>() != amount {
            return Err(error_body(11002, "Outputs do not match quote"));
        }

        let signatures = outputs
            .iter()
            .map(|o| self.sign(o, state))
            .collect::<Result<Vec<_>, _>>()?;
        if let Some(q) = state.mint_quotes.get_mut(&id) {
            q.issued = true;
        }
        Ok(json!({ "signatures": signatures }))
    }

    fn swap(&self, body: &Value, state: &mut MockState) -> Result<Value, Value> {
        state.swap_calls += 1;
        let inputs: Vec<Proof> = serde_json::from_value(body["inputs"].clone()).unwrap();
        let outputs: Vec<Output> = serde_json::from_value(body["outputs"].clone()).unwrap();

        let fee = self.verify_inputs(&inputs, state)?;
        let input_total: u64 = inputs.iter().map(|p| p.amount).sum();
        let output_total: u64 = outputs.iter().map(|o| o.amount).sum();
        if input_total != output_total + fee {
            return Err(error_body(11002, "Transaction is not balanced"));
        }

        self.spend(&inputs, state);
        let signatures = outputs
            .iter()
            .map(|o| self.sign(o, state))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(json!({ "signatures": signatures }))
    }

    fn melt(&self, body: &Value, state: &mut MockState) -> Result<Value, Value> {
        let id = body["quote"].as_str().unwrap_or_default().to_string();
        let inputs: Vec<Proof> = serde_json::from_value(body["inputs"].clone()).unwrap();
        let blanks: Vec<Output> = match body.get("outputs") {
            Some(v) if !v.is_null() => serde_json::from_value(v.clone()).unwrap(),
            _ => Vec::new(),
        };

        let amount = match state.melt_quotes.get(&id) {
            Some(q) => q.amount,
            None => return Err(error_body(0, "Unknown quote")),
        };
        let input_fee = self.verify_inputs(&inputs, state)?;
        let input_total: u64 = inputs.iter().map(|p| p.amount).sum();
        if input_total < amount + FEE_RESERVE + input_fee {
            return Err(error_body(11002, "Insufficient inputs"));
        }

        self.spend(&inputs, state);
        if let Some(q) = state.melt_quotes.get_mut(&id) {
            q.paid = true;
        }

        let overpaid = input_total - amount - input_fee - LN_FEE_PAID;
        let mut change = Vec::new();
        for (blank, value) in blanks.iter().zip(split_into_base2_numbers(overpaid)) {
            let assigned = Output {
                amount: value,
                ..blank.clone()
            };
            change.push(self.sign(&assigned, state)?);
        }

        Ok(json!({
            "quote": id,
            "amount": amount,
            "fee_reserve": FEE_RESERVE,
            "paid": true,
            "state": "PAID",
            "payment_preimage": "0000000000000000000000000000000000000000000000000000000000000000",
            "change": change,
        }))
    }

    fn restore(&self, body: &Value, state: &mut MockState) -> Value {
        state.restore_calls += 1;
        let outputs: Vec<Output> = serde_json::from_value(body["outputs"].clone()).unwrap();
        let (found_outputs, signatures): (Vec<Output>, Vec<Promise>) = outputs
            .iter()
            .filter_map(|o| state.signed.get(&o.blinded_message).cloned())
            .unzip();
        json!({ "outputs": found_outputs, "signatures": signatures })
    }
}

/// Mint-side DLEQ: `e = hash(p·G, p·B_, A, C_)`, `s = p + e·k`
pub fn dleq_proof(k: &SecretKey, b_: &PublicKey, c_: &PublicKey) -> (SecretKey, SecretKey) {
    let p = random_scalar();
    let r1 = mul_generator(&p);
    let r2 = mul_point(b_, &p).unwrap();
    let e = SecretKey::from_slice(&hash_e(&[r1, r2, mul_generator(k), *c_])).unwrap();
    let ek = k.mul_tweak(&Scalar::from(e)).unwrap();
    let s = p.add_tweak(&Scalar::from(ek)).unwrap();
    (e, s)
}

impl MintTransport for MockMint {
    fn get(&self, path: &str, _timeout: Duration) -> CashuResult<Value> {
        Ok(self.route_get(path))
    }

    fn post(&self, path: &str, body: &Value, _timeout: Duration) -> CashuResult<Value> {
        Ok(self.route_post(path, body))
    }
}

/// Transport whose every request fails the way a dropped connection does
pub struct OfflineTransport;

impl MintTransport for OfflineTransport {
    fn get(&self, _path: &str, _timeout: Duration) -> CashuResult<Value> {
        Err(CashuError::network("Connection failed"))
    }

    fn post(&self, _path: &str, _body: &Value, _timeout: Duration) -> CashuResult<Value> {
        Err(CashuError::timeout("Request timed out"))
    }
}

pub fn client(mint: MockMint) -> MintClient<MockMint> {
    client_with(mint, ClientConfig::default())
}

pub fn client_with(mint: MockMint, config: ClientConfig) -> MintClient<MockMint> {
    MintClient::new(MINT_URL, mint, config).unwrap()
}

/// Mock mint whose POST responses are edited before the client sees them
pub struct RewritingMint<F> {
    pub inner: MockMint,
    rewrite: F,
}

impl<F> MintTransport for RewritingMint<F>
where
    F: Fn(&str, &mut Value) + Send + Sync,
{
    fn get(&self, path: &str, timeout: Duration) -> CashuResult<Value> {
        self.inner.get(path, timeout)
    }

    fn post(&self, path: &str, body: &Value, timeout: Duration) -> CashuResult<Value> {
        let mut response = self.inner.post(path, body, timeout)?;
        (self.rewrite)(path, &mut response);
        Ok(response)
    }
}

pub fn rewriting_client<F>(mint: MockMint, rewrite: F) -> MintClient<RewritingMint<F>>
where
    F: Fn(&str, &mut Value) + Send + Sync,
{
    MintClient::new(MINT_URL, RewritingMint { inner: mint, rewrite }, ClientConfig::default()).unwrap()
}
