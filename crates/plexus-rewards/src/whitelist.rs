//! # Whitelist Registry
//!
//! Set of tokens eligible for deposits and reward accrual. Mutation is gated
//! by the engine's administrator check; this type only holds membership.

use plexus_core::{Result, RewardsError, TokenId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Reward-eligible tokens
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Whitelist {
    tokens: BTreeSet<TokenId>,
}

impl Whitelist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a token; returns false if it was already present
    pub fn add(&mut self, token: TokenId) -> bool {
        self.tokens.insert(token)
    }

    /// Remove a token; returns false if it was not present
    pub fn remove(&mut self, token: &TokenId) -> bool {
        self.tokens.remove(token)
    }

    pub fn contains(&self, token: &TokenId) -> bool {
        self.tokens.contains(token)
    }

    /// Fail with `NotWhitelisted` unless the token is eligible
    pub fn ensure(&self, token: &TokenId) -> Result<()> {
        if self.contains(token) {
            Ok(())
        } else {
            Err(RewardsError::NotWhitelisted(*token))
        }
    }

    pub fn tokens(&self) -> impl Iterator<Item = &TokenId> {
        self.tokens.iter()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
