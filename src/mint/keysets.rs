//! Keyset and info endpoints

use serde_json::Value;

use super::messages::{KeysResponse, KeysetsResponse};
use super::transport::{get_json, MintTransport};
use super::MintClient;
use crate::error::{CashuError, CashuResult};
use crate::types::Keyset;

impl<T: MintTransport> MintClient<T> {
    /// Fetch every keyset with its keys
    ///
    /// Each keyset ID is checked against its keys. Counters start at 0;
    /// callers merge in their persisted counters.
    pub fn load_keysets(&self) -> CashuResult<Vec<Keyset>> {
        let timeout = self.config.timeouts.default;
        let listing: KeysetsResponse = get_json(&self.transport, "/v1/keysets", timeout)?;

        let mut keysets = Vec::with_capacity(listing.keysets.len());
        for info in listing.keysets {
            let keys: KeysResponse = get_json(&self.transport, &format!("/v1/keys/{}", info.id), timeout)?;
            let entry = keys
                .keysets
                .into_iter()
                .find(|k| k.id == info.id)
                .ok_or_else(|| CashuError::unknown_keyset(&info.id))?;

            let keyset = Keyset {
                keyset_id: info.id,
                keys: entry.keys,
                derivation_counter: 0,
                active: info.active,
                unit: info.unit,
                input_fee_ppk: info.input_fee_ppk,
            };
            keyset.verify_id()?;
            keysets.push(keyset);
        }

        crate::log_info!("mint", "Loaded keysets", count = keysets.len());
        Ok(keysets)
    }

    /// Raw `/v1/info` document
    pub fn info(&self) -> CashuResult<Value> {
        get_json(&self.transport, "/v1/info", self.config.timeouts.default)
    }
}
