//! # Plexus Rewards
//!
//! Time-weighted reward accrual for whitelisted deposit tokens.
//!
//! | Component        | Purpose                                      |
//! |------------------|----------------------------------------------|
//! | `Whitelist`      | Tokens eligible for deposits and rewards     |
//! | `AprTable`       | Per-token APR, scaled by `APR_PRECISION`     |
//! | `PositionLedger` | Principal per (owner, token) as FIFO lots    |
//! | `accrual`        | Pure reward math over consumed lots          |
//! | `RewardsEngine`  | Admin surface, settlement, treasury payouts  |
//!
//! ## Reward Formula
//!
//! ```text
//! reward = Σ floor(lot.amount × apr × (now − lot.deposited_at)
//!                  / (100_000 × 31_536_000))
//! ```
//!
//! An APR of `40_000` is 40% per year. The APR in effect at withdrawal applies
//! to the whole holding period of every lot. Rewards are paid in the reward token
//! from the engine's treasury account, and only when the treasury covers the
//! full amount.

pub mod accrual;
pub mod apr;
pub mod engine;
pub mod events;
pub mod ledger;
pub mod whitelist;

pub use accrual::{compute_reward, elapsed_secs, lot_reward, mul_div_floor, REWARD_DENOMINATOR};
pub use apr::{apr_percent, AprRate, AprTable};
pub use engine::{RewardOutcome, RewardsEngine};
pub use events::RewardEvent;
pub use ledger::{ConsumedLot, Lot, Position, PositionLedger};
pub use whitelist::Whitelist;

