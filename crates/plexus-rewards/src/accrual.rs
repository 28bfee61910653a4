//! # Reward Accrual
//!
//! Pure reward math over consumed lots:
//!
//! ```text
//! reward(lot) = floor(amount * apr * (now - deposited_at) / (APR_PRECISION * SECONDS_PER_YEAR))
//! ```
//!
//! `apr` is the rate in effect at withdrawal and applies to the whole lot. A
//! deposit withdrawn in the same block earns nothing. Multiplication is exact
//! over the full 128-bit range; a result that does not fit fails with
//! `Overflow` instead of wrapping.

use crate::apr::AprRate;
use crate::ledger::ConsumedLot;
use plexus_core::{Amount, Result, RewardsError, Timestamp, APR_PRECISION, SECONDS_PER_YEAR};

/// Denominator of the reward formula
pub const REWARD_DENOMINATOR: u128 = APR_PRECISION * SECONDS_PER_YEAR;

/// `floor(x * y / d)` without intermediate overflow
///
/// Requires `d <= u64::MAX` so the remainder product `r * r2 < d^2` fits in
/// 128 bits.
pub fn mul_div_floor(x: u128, y: u128, d: u128) -> Result<u128> {
    if d == 0 {
        return Err(RewardsError::InvalidInput("division by zero".to_string()));
    }
    if let Some(product) = x.checked_mul(y) {
        return Ok(product / d);
    }
    if d > u64::MAX as u128 {
        return Err(RewardsError::Overflow("mul_div"));
    }

    // x = q*d + r  =>  x*y/d = q*y + r*y/d
    // y = q2*d + r2 =>  r*y/d = r*q2 + r*r2/d
    let (q, r) = (x / d, x % d);
    let (q2, r2) = (y / d, y % d);

    let whole = q.checked_mul(y).ok_or(RewardsError::Overflow("mul_div"))?;
    let cross = r.checked_mul(q2).ok_or(RewardsError::Overflow("mul_div"))?;
    let tail = r * r2 / d;

    whole
        .checked_add(cross)
        .and_then(|v| v.checked_add(tail))
        .ok_or(RewardsError::Overflow("mul_div"))
}

/// Seconds between deposit and withdrawal, never negative
pub fn elapsed_secs(deposited_at: Timestamp, now: Timestamp) -> u64 {
    now.saturating_sub(deposited_at).max(0) as u64
}

/// Reward for one lot held for `elapsed` seconds
pub fn lot_reward(amount: Amount, apr: AprRate, elapsed: u64) -> Result<Amount> {
    if amount == 0 || apr == 0 || elapsed == 0 {
        return Ok(0);
    }
    // u64 * u64 always fits in u128
    mul_div_floor(amount, apr as u128 * elapsed as u128, REWARD_DENOMINATOR)
}

/// Sum of lot rewards at withdrawal time `now`
pub fn compute_reward(lots: &[ConsumedLot], apr: AprRate, now: Timestamp) -> Result<Amount> {
    lots.iter().try_fold(0u128, |total, lot| {
        let elapsed = elapsed_secs(lot.deposited_at, now);
        let reward = lot_reward(lot.amount, apr, elapsed)?;
        tracing::debug!(
            "Lot {} @{} held {}s at APR {} -> reward {}",
            lot.amount,
            lot.deposited_at,
            elapsed,
            apr,
            reward
        );
        total
            .checked_add(reward)
            .ok_or(RewardsError::Overflow("reward sum"))
    })
}
