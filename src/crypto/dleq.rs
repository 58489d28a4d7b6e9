//! DLEQ proof verification
//!
//! The mint proves that `C_ = k·B_` used the same `k` as its public key
//! `A = k·G` by publishing `(e, s)` such that
//!
//! ```text
//! R1 = s·G  - e·A
//! R2 = s·B_ - e·C_
//! e  = SHA256(hex(R1) || hex(R2) || hex(A) || hex(C_))   (uncompressed hex)
//! ```
//!
//! A wallet holding a proof `(x, C, r)` can rebuild `B_` and `C_` and run
//! the same check offline.

use bitcoin::secp256k1::{PublicKey, SecretKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use super::curve::{add_points, mul_generator, mul_point, parse_point, parse_scalar, sub_points};
use super::hash_to_curve::hash_to_curve_str;
use super::blind::blind;
use crate::error::CashuResult;
use crate::types::{find_keyset, Keyset, Output, Promise, Proof};

/// How a missing DLEQ is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DleqPolicy {
    /// Missing data counts as a pass
    #[default]
    Lenient,
    /// Missing data counts as a failure
    Strict,
}

/// Outcome of checking one promise or proof
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DleqCheck {
    Valid,
    Invalid,
    /// Mint did not attach a DLEQ; verification was skipped
    Missing,
}

impl DleqCheck {
    pub fn passes(&self, policy: DleqPolicy) -> bool {
        match self {
            DleqCheck::Valid => true,
            DleqCheck::Invalid => false,
            DleqCheck::Missing => policy == DleqPolicy::Lenient,
        }
    }
}

/// Challenge hash over uncompressed hex encodings of `points`
pub fn hash_e(points: &[PublicKey]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for point in points {
        hasher.update(hex::encode(point.serialize_uncompressed()).as_bytes());
    }
    hasher.finalize().into()
}

fn recompute_challenge(
    a: &PublicKey,
    b_: &PublicKey,
    c_: &PublicKey,
    e: &SecretKey,
    s: &SecretKey,
) -> CashuResult<[u8; 32]> {
    let r1 = sub_points(&mul_generator(s), &mul_point(a, e)?)?;
    let r2 = sub_points(&mul_point(b_, s)?, &mul_point(c_, e)?)?;
    Ok(hash_e(&[r1, r2, *a, *c_]))
}

/// Verify a promise DLEQ `(e, s)` for `C_` over `B_` under key `A`
///
/// Degenerate inputs (points at infinity along the way) verify as false.
pub fn verify_dleq(a: &PublicKey, b_: &PublicKey, c_: &PublicKey, e: &SecretKey, s: &SecretKey) -> bool {
    match recompute_challenge(a, b_, c_, e, s) {
        Ok(challenge) => challenge.ct_eq(&e.secret_bytes()).into(),
        Err(_) => false,
    }
}

/// Verify the DLEQ carried by an unblinded proof
///
/// Rebuilds `Y = hash_to_curve(secret)`, `C_ = C + r·A` and `B_ = Y + r·G`.
pub fn verify_proof_dleq(
    a: &PublicKey,
    c: &PublicKey,
    secret: &str,
    e: &SecretKey,
    s: &SecretKey,
    r: &SecretKey,
) -> bool {
    let rebuilt = hash_to_curve_str(secret).and_then(|y| {
        let c_ = add_points(c, &mul_point(a, r)?)?;
        let b_ = blind(&y, r)?;
        Ok((b_, c_))
    });
    match rebuilt {
        Ok((b_, c_)) => verify_dleq(a, &b_, &c_, e, s),
        Err(_) => false,
    }
}

/// Check a promise against the output it answers
///
/// An unknown amount key is an error; malformed DLEQ hex is `Invalid`.
pub fn check_promise_dleq(promise: &Promise, output: &Output, keyset: &Keyset) -> CashuResult<DleqCheck> {
    let dleq = match &promise.dleq {
        Some(d) => d,
        None => return Ok(DleqCheck::Missing),
    };
    let a = keyset.public_key_for(promise.amount)?;

    let parsed = (|| {
        Ok::<_, crate::error::CashuError>((
            parse_point(&output.blinded_message)?,
            parse_point(&promise.blinded_signature)?,
            parse_scalar(&dleq.e)?,
            parse_scalar(&dleq.s)?,
        ))
    })();

    Ok(match parsed {
        Ok((b_, c_, e, s)) if verify_dleq(&a, &b_, &c_, &e, &s) => DleqCheck::Valid,
        _ => DleqCheck::Invalid,
    })
}

/// Check the DLEQ data embedded in a proof
pub fn check_proof_dleq(proof: &Proof, keyset: &Keyset) -> CashuResult<DleqCheck> {
    let dleq = match &proof.dleq {
        Some(d) => d,
        None => return Ok(DleqCheck::Missing),
    };
    let a = keyset.public_key_for(proof.amount)?;

    let parsed = (|| {
        Ok::<_, crate::error::CashuError>((
            parse_point(&proof.signature)?,
            parse_scalar(&dleq.e)?,
            parse_scalar(&dleq.s)?,
            parse_scalar(&dleq.r)?,
        ))
    })();

    Ok(match parsed {
        Ok((c, e, s, r)) if verify_proof_dleq(&a, &c, &proof.secret, &e, &s, &r) => DleqCheck::Valid,
        _ => DleqCheck::Invalid,
    })
}

/// Per-proof DLEQ results and their aggregate under a policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DleqReport {
    pub checks: Vec<DleqCheck>,
    pub policy: DleqPolicy,
}

impl DleqReport {
    pub fn all_valid(&self) -> bool {
        self.checks.iter().all(|c| c.passes(self.policy))
    }

    pub fn missing(&self) -> usize {
        self.checks.iter().filter(|c| **c == DleqCheck::Missing).count()
    }

    pub fn invalid(&self) -> usize {
        self.checks.iter().filter(|c| **c == DleqCheck::Invalid).count()
    }
}

/// Verify every proof's DLEQ against the keyset it names
///
/// Never fails: a proof whose keyset or mint key cannot be found counts as
/// [`DleqCheck::Invalid`], so callers holding freshly signed proofs keep them.
pub fn verify_proofs_dleq(proofs: &[Proof], keysets: &[Keyset], policy: DleqPolicy) -> DleqReport {
    let checks = proofs
        .iter()
        .map(|proof| {
            find_keyset(keysets, &proof.keyset_id)
                .and_then(|keyset| check_proof_dleq(proof, keyset))
                .unwrap_or_else(|e| {
                    crate::log_warn!("dleq", "Proof cannot be checked", keyset_id = proof.keyset_id, error = e);
                    DleqCheck::Invalid
                })
        })
        .collect();

    let report = DleqReport { checks, policy };

    if report.missing() > 0 {
        crate::log_warn!(
            "dleq",
            "Proofs without DLEQ data, verification skipped",
            missing = report.missing(),
            policy = format!("{:?}", policy)
        );
    }
    if report.invalid() > 0 {
        crate::log_error!("dleq", "DLEQ verification failed", invalid = report.invalid());
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::curve::{point_to_hex, random_scalar, scalar_to_hex};
    use crate::types::{PromiseDleq, ProofDleq};
    use bitcoin::secp256k1::Scalar;
    use std::collections::BTreeMap;

    const MINT_KEY: &str = "07c4d130a4506d00cf97ef0a0ed90d07bbe042570d34126470bf725a2330a04a";
    const E: &str = "fda8420633c9bda2c33bd0db1d1e862ed89e839c4a264201018f99488b1cb665";
    const S: &str = "2d5c280af921a8aede75a9dd02e94a111c34b6b2ff1f92fa6c0fa5f207ffa634";
    const B_: &str = "025cc16fe33b953e2ace39653efb3e7a7049711ae1d8a2f7a9108753f1cdea742b";
    const C_: &str = "02172d78ed683fc145c1357ff8c88261861cd380ed039200439117297811c75374";
    const C: &str = "02fb82e61c96212d220a96998cf2e2bd0d74de5035b734d6cadbe7ed761eabbd3e";

    fn one_hex() -> String {
        format!("{}01", "00".repeat(31))
    }

    fn keyset() -> Keyset {
        let k = parse_scalar(MINT_KEY).unwrap();
        let mut keys = BTreeMap::new();
        keys.insert("8".to_string(), point_to_hex(&mul_generator(&k)));
        Keyset {
            keyset_id: "009a1f293253e41e".to_string(),
            keys,
            derivation_counter: 0,
            active: true,
            unit: "sat".to_string(),
            input_fee_ppk: 0,
        }
    }

    /// Mint-side proof generation, test only
    fn sign_dleq(k: &SecretKey, b_: &PublicKey, c_: &PublicKey) -> (SecretKey, SecretKey) {
        let p = random_scalar();
        let r1 = mul_generator(&p);
        let r2 = mul_point(b_, &p).unwrap();
        let e = SecretKey::from_slice(&hash_e(&[r1, r2, mul_generator(k), *c_])).unwrap();
        let ek = k.mul_tweak(&Scalar::from(e)).unwrap();
        let s = p.add_tweak(&Scalar::from(ek)).unwrap();
        (e, s)
    }

    #[test]
    fn test_reference_vector() {
        let a = mul_generator(&parse_scalar(MINT_KEY).unwrap());
        let ok = verify_dleq(
            &a,
            &parse_point(B_).unwrap(),
            &parse_point(C_).unwrap(),
            &parse_scalar(E).unwrap(),
            &parse_scalar(S).unwrap(),
        );
        assert!(ok);
    }

    #[test]
    fn test_proof_form_vector() {
        let a = mul_generator(&parse_scalar(MINT_KEY).unwrap());
        let ok = verify_proof_dleq(
            &a,
            &parse_point(C).unwrap(),
            "test_message",
            &parse_scalar(E).unwrap(),
            &parse_scalar(S).unwrap(),
            &parse_scalar(&one_hex()).unwrap(),
        );
        assert!(ok);
    }

    #[test]
    fn test_tampered_s_fails() {
        let a = mul_generator(&parse_scalar(MINT_KEY).unwrap());
        let s = parse_scalar(S).unwrap().add_tweak(&Scalar::ONE).unwrap();
        assert!(!verify_dleq(
            &a,
            &parse_point(B_).unwrap(),
            &parse_point(C_).unwrap(),
            &parse_scalar(E).unwrap(),
            &s,
        ));
    }

    #[test]
    fn test_generated_proof_verifies() {
        let k = random_scalar();
        let y = hash_to_curve_str("fresh").unwrap();
        let b_ = blind(&y, &random_scalar()).unwrap();
        let c_ = mul_point(&b_, &k).unwrap();
        let (e, s) = sign_dleq(&k, &b_, &c_);
        assert!(verify_dleq(&mul_generator(&k), &b_, &c_, &e, &s));
        assert!(!verify_dleq(&mul_generator(&random_scalar()), &b_, &c_, &e, &s));
    }

    #[test]
    fn test_check_promise() {
        let output = Output {
            amount: 8,
            keyset_id: "009a1f293253e41e".into(),
            blinded_message: B_.into(),
        };
        let mut promise = Promise {
            keyset_id: "009a1f293253e41e".into(),
            amount: 8,
            blinded_signature: C_.into(),
            dleq: Some(PromiseDleq { e: E.into(), s: S.into() }),
        };
        assert_eq!(check_promise_dleq(&promise, &output, &keyset()).unwrap(), DleqCheck::Valid);

        promise.dleq = Some(PromiseDleq { e: S.into(), s: E.into() });
        assert_eq!(check_promise_dleq(&promise, &output, &keyset()).unwrap(), DleqCheck::Invalid);

        promise.dleq = None;
        assert_eq!(check_promise_dleq(&promise, &output, &keyset()).unwrap(), DleqCheck::Missing);
    }

    #[test]
    fn test_report_respects_policy() {
        let with_dleq = Proof {
            keyset_id: "009a1f293253e41e".into(),
            amount: 8,
            secret: "test_message".into(),
            signature: C.into(),
            dleq: Some(ProofDleq { e: E.into(), s: S.into(), r: one_hex() }),
            witness: None,
        };
        let without = Proof { dleq: None, ..with_dleq.clone() };
        let keysets = [keyset()];

        let lenient = verify_proofs_dleq(&[with_dleq.clone(), without.clone()], &keysets, DleqPolicy::Lenient);
        assert_eq!(lenient.checks, vec![DleqCheck::Valid, DleqCheck::Missing]);
        assert!(lenient.all_valid());

        let strict = verify_proofs_dleq(&[with_dleq, without], &keysets, DleqPolicy::Strict);
        assert!(!strict.all_valid());
    }

    #[test]
    fn test_garbage_dleq_is_invalid_not_error() {
        let proof = Proof {
            keyset_id: "009a1f293253e41e".into(),
            amount: 8,
            secret: "test_message".into(),
            signature: C.into(),
            dleq: Some(ProofDleq { e: "zz".into(), s: S.into(), r: scalar_to_hex(&random_scalar()) }),
            witness: None,
        };
        assert_eq!(check_proof_dleq(&proof, &keyset()).unwrap(), DleqCheck::Invalid);
    }

    #[test]
    fn test_unknown_keyset_counts_as_invalid() {
        let proof = Proof {
            keyset_id: "00deadbeefdeadbe".into(),
            amount: 8,
            secret: "test_message".into(),
            signature: C.into(),
            dleq: Some(ProofDleq { e: E.into(), s: S.into(), r: one_hex() }),
            witness: None,
        };
        let report = verify_proofs_dleq(&[proof], &[keyset()], DleqPolicy::Lenient);
        assert_eq!(report.checks, vec![DleqCheck::Invalid]);
        assert!(!report.all_valid());
    }
}
