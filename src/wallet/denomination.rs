//! Denomination Planning
//!
//! Mint keysets sign powers of two, so every amount leaving the wallet is
//! broken into power-of-two outputs. Send/keep splits and the number of
//! blank outputs for fee-reserve refunds are planned here.

use crate::error::{CashuError, CashuResult, ErrorCode};

/// Bits of `n` as ascending powers of two
pub fn split_into_base2_numbers(n: u64) -> Vec<u64> {
    (0..64)
        .map(|bit| 1u64 << bit)
        .filter(|power| n & power != 0)
        .collect()
}

/// Split `total` into `(send, keep)` after paying `fee`
///
/// Without a target everything but the fee is sent.
pub fn split(total: u64, target: Option<u64>, fee: u64) -> CashuResult<(u64, u64)> {
    let spendable = total.checked_sub(fee).ok_or_else(|| {
        CashuError::invalid_split(format!("Fee {} exceeds total {}", fee, total))
    })?;

    match target {
        None => Ok((spendable, 0)),
        Some(send) if send <= spendable => Ok((send, spendable - send)),
        Some(send) => Err(CashuError::invalid_split(format!(
            "Target {} exceeds total {} minus fee {}",
            send, total, fee
        ))),
    }
}

/// Blank outputs needed to receive any refund up to `overpaid`
///
/// `max(ceil(log2(overpaid)), 1)`, or 0 when nothing is overpaid.
pub fn calculate_number_of_blank_outputs(overpaid: u64) -> usize {
    if overpaid == 0 {
        return 0;
    }
    let ceil_log2 = 64 - (overpaid - 1).leading_zeros();
    ceil_log2.max(1) as usize
}

/// Denominations for `amount`, preferring the caller's split when given
///
/// A preferred distribution must sum to exactly `amount` and may only
/// contain powers of two.
pub fn plan_distribution(amount: u64, preferred: Option<&[u64]>) -> CashuResult<Vec<u64>> {
    let preferred = match preferred {
        Some(p) => p,
        None => return Ok(split_into_base2_numbers(amount)),
    };

    if let Some(bad) = preferred.iter().find(|d| !d.is_power_of_two()) {
        return Err(CashuError::new(
            ErrorCode::DistributionMismatch,
            format!("Denomination {} is not a power of two", bad),
        ));
    }

    let sum = preferred
        .iter()
        .try_fold(0u64, |acc, d| acc.checked_add(*d))
        .ok_or_else(|| CashuError::new(ErrorCode::DistributionMismatch, "Distribution sum overflows"))?;

    if sum != amount {
        return Err(CashuError::new(
            ErrorCode::DistributionMismatch,
            format!("Distribution sums to {} but amount is {}", sum, amount),
        ));
    }

    Ok(preferred.to_vec())
}
