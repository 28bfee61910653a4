//! # APR Table
//!
//! Per-token annual reward rate with 100_000 precision:
//!
//! | Stored | Meaning |
//! |--------|---------|
//! | 100_000 | 100% |
//! | 40_000 | 40% |
//! | 500 | 0.5% |
//!
//! Rewards are computed with the rate in effect at withdrawal, applied to the
//! whole holding period of every consumed lot.

use plexus_core::{TokenId, APR_PRECISION};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// APR in 1/100_000 units
pub type AprRate = u64;

/// Per-token APR
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AprTable {
    rates: HashMap<TokenId, AprRate>,
}

impl AprTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the rate for a token, returning the previous one
    pub fn set(&mut self, token: TokenId, rate: AprRate) -> AprRate {
        self.rates.insert(token, rate).unwrap_or(0)
    }

    /// Rate currently in effect; 0 when never set
    pub fn rate_of(&self, token: &TokenId) -> AprRate {
        self.rates.get(token).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

/// Rate as a percentage, for display only
pub fn apr_percent(rate: AprRate) -> f64 {
    rate as f64 * 100.0 / APR_PRECISION as f64
}
