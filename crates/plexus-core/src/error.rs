//! Error types for Plexus rewards operations

use crate::types::{Amount, TokenId, Timestamp};
use thiserror::Error;

/// Result type alias for Plexus operations
pub type Result<T> = std::result::Result<T, RewardsError>;

/// Errors that can abort a Plexus state transition
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RewardsError {
    // === Access Control ===
    /// Caller is not the administrator
    #[error("Unauthorized: caller is not the administrator")]
    Unauthorized,

    // === Configuration ===
    /// Token is not on the reward whitelist
    #[error("Token not whitelisted: {0}")]
    NotWhitelisted(TokenId),

    /// APR cannot be set for this token
    #[error("Invalid rate for token {0}: token is not whitelisted")]
    InvalidRate(TokenId),

    // === Positions ===
    /// Zero amounts are rejected
    #[error("Amount must be greater than zero")]
    InvalidAmount,

    /// Withdrawal exceeds recorded principal or a debit exceeds a balance
    #[error("Insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance { requested: Amount, available: Amount },

    // === Collaborators ===
    /// Underlying token transfer was rejected
    #[error("Transfer failed: {0}")]
    TransferFailed(String),

    /// No tier adapter registered under this name
    #[error("Unknown tier: {0}")]
    UnknownTier(String),

    /// A tier adapter is already registered under this name
    #[error("Tier already registered: {0}")]
    DuplicateTier(String),

    /// Deadline is not in the future
    #[error("Deadline {deadline} expired at block time {now}")]
    Expired { deadline: Timestamp, now: Timestamp },

    // === Rewards ===
    /// Reward treasury cannot cover the payout
    #[error("Insufficient treasury: required {required}, available {available}")]
    InsufficientTreasury { required: Amount, available: Amount },

    /// Arithmetic result does not fit in 128 bits
    #[error("Arithmetic overflow in {0}")]
    Overflow(&'static str),

    // === Execution ===
    /// Nested call into an entry point while a transition is running
    #[error("Reentrant call rejected")]
    Reentrancy,

    /// Malformed request
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl RewardsError {
    /// Stable numeric code for receipts and CLI output
    pub fn code(&self) -> u32 {
        match self {
            Self::Unauthorized => 1001,
            Self::NotWhitelisted(_) => 1002,
            Self::InvalidRate(_) => 1003,
            Self::InvalidAmount => 1004,
            Self::InsufficientBalance { .. } => 1005,
            Self::TransferFailed(_) => 1006,
            Self::UnknownTier(_) | Self::DuplicateTier(_) => 1007,
            Self::Expired { .. } => 1008,
            Self::InsufficientTreasury { .. } => 1009,
            Self::Overflow(_) => 1010,
            Self::Reentrancy => 1011,
            Self::InvalidInput(_) => 9999,
        }
    }

    /// Errors the caller may resolve by retrying later or topping up
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::InsufficientTreasury { .. } | Self::Expired { .. } | Self::Reentrancy
        )
    }
}
