//! Events emitted by state transitions
//!
//! Events are buffered on the engine and drained into the receipt of the
//! operation that produced them. A rolled-back transition drops its events
//! together with the rest of the restored state.

use crate::apr::AprRate;
use plexus_core::{AccountId, Amount, TokenId};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RewardEvent {
    /// Token added to the whitelist
    TokenWhitelisted { token: TokenId },

    /// Token removed from the whitelist
    TokenDelisted { token: TokenId },

    /// APR changed
    AprUpdated {
        token: TokenId,
        previous: AprRate,
        rate: AprRate,
    },

    /// Administrator handed over
    AdminTransferred {
        previous: AccountId,
        admin: AccountId,
    },

    /// Principal deposited into a tier
    Deposited {
        owner: AccountId,
        token: TokenId,
        tier: String,
        amount: Amount,
    },

    /// Principal returned to its owner
    Withdrawn {
        owner: AccountId,
        token: TokenId,
        tier: String,
        amount: Amount,
    },

    /// Reward transferred from the treasury
    RewardPaid {
        owner: AccountId,
        token: TokenId,
        amount: Amount,
    },

    /// Reward owed but not paid
    RewardSkipped {
        owner: AccountId,
        token: TokenId,
        owed: Amount,
        available: Amount,
    },

    /// Reward not computed because the token is off the whitelist
    RewardSuspended { owner: AccountId, token: TokenId },

    /// Native value converted into tokens
    Converted {
        owner: AccountId,
        value: Amount,
        outputs: Vec<(TokenId, Amount)>,
    },
}

impl RewardEvent {
    /// Short event name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::TokenWhitelisted { .. } => "TokenWhitelisted",
            Self::TokenDelisted { .. } => "TokenDelisted",
            Self::AprUpdated { .. } => "AprUpdated",
            Self::AdminTransferred { .. } => "AdminTransferred",
            Self::Deposited { .. } => "Deposited",
            Self::Withdrawn { .. } => "Withdrawn",
            Self::RewardPaid { .. } => "RewardPaid",
            Self::RewardSkipped { .. } => "RewardSkipped",
            Self::RewardSuspended { .. } => "RewardSuspended",
            Self::Converted { .. } => "Converted",
        }
    }
}
