//! # Plexus Core
//!
//! Shared building blocks for the Plexus token rewards system:
//! - `AccountId` / `TokenId` - 32-byte identities for accounts and tokens
//! - `RewardsError` - the error taxonomy every state transition reports
//! - `Clock` - block height and block time (`BlockClock` for simulations)
//! - `TokenLedger` - fungible token balances and allowances
//!
//! ## Flow
//!
//! ```text
//!   user ──approve──► TokenLedger ◄──transfer_from── Coordinator
//!                         ▲                              │
//!                         │ custody                      ▼
//!                    Tier adapters              Reward Accrual Engine
//!                                                (treasury payouts)
//! ```

pub mod clock;
pub mod error;
pub mod token;
pub mod types;

pub use clock::*;
pub use error::*;
pub use token::*;
pub use types::*;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::clock::{BlockClock, Clock, SystemClock};
    pub use crate::error::{Result, RewardsError};
    pub use crate::token::TokenLedger;
    pub use crate::types::*;
}
