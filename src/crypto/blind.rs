//! Blind Diffie-Hellman Key Exchange (wallet side)
//!
//! ```text
//! Y  = hash_to_curve(secret)
//! B_ = Y + r·G            (blind)
//! C_ = k·B_               (mint)
//! C  = C_ - r·K           (unblind, K = k·G)
//! ```

use bitcoin::secp256k1::{PublicKey, SecretKey};
use rand::rngs::OsRng;
use rand::RngCore;

use super::curve::{add_points, mul_generator, mul_point, parse_point, point_to_hex, random_scalar, scalar_to_hex, sub_points};
use super::derivation::derive_secret_and_blinding_factor;
use super::hash_to_curve::hash_to_curve_str;
use crate::error::{CashuError, CashuResult};
use crate::types::{Keyset, Output, Promise, Proof, ProofDleq};

/// `B_ = Y + r·G`
pub fn blind(y: &PublicKey, r: &SecretKey) -> CashuResult<PublicKey> {
    add_points(y, &mul_generator(r))
}

/// `C = C_ - r·A`
pub fn unblind(c_: &PublicKey, r: &SecretKey, a: &PublicKey) -> CashuResult<PublicKey> {
    sub_points(c_, &mul_point(a, r)?)
}

/// Seed and starting counter for reproducible outputs
#[derive(Debug, Clone, Copy)]
pub struct DeterministicSource<'a> {
    pub seed: &'a [u8],
    pub counter: u32,
}

impl<'a> DeterministicSource<'a> {
    pub fn new(seed: &'a [u8], counter: u32) -> Self {
        Self { seed, counter }
    }
}

/// Outputs plus the private values needed to unblind their promises
///
/// The three vectors are index-aligned.
#[derive(Debug, Clone)]
pub struct OutputSet {
    pub outputs: Vec<Output>,
    pub blinding_factors: Vec<SecretKey>,
    pub secrets: Vec<String>,
}

impl OutputSet {
    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    pub fn amounts(&self) -> Vec<u64> {
        self.outputs.iter().map(|o| o.amount).collect()
    }

    /// Append another set, keeping the three vectors aligned
    pub fn extend(&mut self, other: OutputSet) {
        self.outputs.extend(other.outputs);
        self.blinding_factors.extend(other.blinding_factors);
        self.secrets.extend(other.secrets);
    }
}

fn random_secret() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Build one blinded output per amount
///
/// With a [`DeterministicSource`] the output at index `i` uses
/// `counter + i`; otherwise secrets and blinding factors are random.
pub fn generate_outputs(
    amounts: &[u64],
    keyset_id: &str,
    deterministic: Option<DeterministicSource<'_>>,
) -> CashuResult<OutputSet> {
    let mut set = OutputSet {
        outputs: Vec::with_capacity(amounts.len()),
        blinding_factors: Vec::with_capacity(amounts.len()),
        secrets: Vec::with_capacity(amounts.len()),
    };

    for (i, amount) in amounts.iter().enumerate() {
        let (secret, r) = match deterministic {
            Some(source) => {
                let offset = u32::try_from(i)
                    .ok()
                    .and_then(|i| source.counter.checked_add(i))
                    .ok_or_else(|| CashuError::invalid_input("Derivation counter overflow"))?;
                derive_secret_and_blinding_factor(source.seed, keyset_id, offset)?
            }
            None => (random_secret(), random_scalar()),
        };

        let y = hash_to_curve_str(&secret)?;
        let b_ = blind(&y, &r)?;

        set.outputs.push(Output {
            amount: *amount,
            keyset_id: keyset_id.to_string(),
            blinded_message: point_to_hex(&b_),
        });
        set.blinding_factors.push(r);
        set.secrets.push(secret);
    }

    Ok(set)
}

/// Turn mint promises into proofs
///
/// Arrays are paired by position. A promise DLEQ is carried over to the
/// proof together with the blinding factor so it can be re-verified later.
/// Proofs carry the ID of `keyset`, whose key unblinded them, whatever ID
/// the mint echoed back.
pub fn unblind_promises(
    promises: &[Promise],
    blinding_factors: &[SecretKey],
    secrets: &[String],
    keyset: &Keyset,
) -> CashuResult<Vec<Proof>> {
    if promises.len() != blinding_factors.len() || promises.len() != secrets.len() {
        return Err(CashuError::array_length_mismatch(
            promises.len(),
            blinding_factors.len(),
            secrets.len(),
        ));
    }

    promises
        .iter()
        .zip(blinding_factors)
        .zip(secrets)
        .map(|((promise, r), secret)| {
            let a = keyset.public_key_for(promise.amount)?;
            let c_ = parse_point(&promise.blinded_signature)?;
            let c = unblind(&c_, r, &a)?;

            if !promise.keyset_id.eq_ignore_ascii_case(&keyset.keyset_id) {
                crate::log_warn!(
                    "blind",
                    "Promise labelled with a different keyset",
                    labelled = promise.keyset_id,
                    keyset_id = keyset.keyset_id
                );
            }

            Ok(Proof {
                keyset_id: keyset.keyset_id.clone(),
                amount: promise.amount,
                secret: secret.clone(),
                signature: point_to_hex(&c),
                dleq: promise.dleq.as_ref().map(|d| ProofDleq {
                    e: d.e.clone(),
                    s: d.s.clone(),
                    r: scalar_to_hex(r),
                }),
                witness: None,
            })
        })
        .collect()
}

/// [`unblind_promises`] over an [`OutputSet`], truncated to the promise count
pub fn unblind_with_outputs(promises: &[Promise], outputs: &OutputSet, keyset: &Keyset) -> CashuResult<Vec<Proof>> {
    let n = promises.len().min(outputs.len());
    unblind_promises(
        &promises[..n],
        &outputs.blinding_factors[..n],
        &outputs.secrets[..n],
        keyset,
    )
}
