//! # Conversion Router
//!
//! Converts native currency into deposit tokens along caller-supplied swap
//! paths. The coordinator debits the caller's native value into its own
//! account and hands a [`ConvertRequest`] to the router; the router moves the
//! native value out of that account and credits outputs to the recipient.
//!
//! ```text
//!   value ──split──► [WETH → FARM]   ──► recipient
//!                    [WETH → DAI]    ──► recipient
//!                    [WETH → PICKLE] ──► recipient
//! ```

use plexus_core::{AccountId, Amount, Result, RewardsError, Timestamp, TokenId, TokenLedger};
use plexus_rewards::mul_div_floor;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Highest accepted slippage tolerance, in percent
pub const MAX_SLIPPAGE_PERCENT: u32 = 100;

/// One conversion call
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConvertRequest {
    /// Account the native value is taken from
    pub payer: AccountId,

    /// Account the outputs are credited to
    pub recipient: AccountId,

    /// Tokens to buy, one path each
    pub targets: Vec<TokenId>,

    /// Swap path per target, starting at the wrapped native token
    pub paths: Vec<Vec<TokenId>>,

    /// Expected output hint; recorded, not enforced
    pub amount_placeholder: Amount,

    /// Slippage tolerance in percent
    pub slippage_tolerance: u32,

    pub deadline: Timestamp,

    /// Native value to convert
    pub value: Amount,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConversionStatus {
    Filled,
}

/// Result of a conversion
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionReceipt {
    pub status: ConversionStatus,

    /// Amount credited per target, in request order
    pub outputs: Vec<(TokenId, Amount)>,

    /// Echo of the request's advisory amount
    pub amount_placeholder: Amount,
}

/// Routing collaborator
pub trait Router: Send + Sync {
    fn name(&self) -> &str;

    fn convert(&self, ledger: &TokenLedger, request: &ConvertRequest, now: Timestamp) -> Result<ConversionReceipt>;
}

/// Router quoting every token at a fixed rate against the native currency
///
/// Rates are whole tokens per native unit; the wrapped native token trades
/// at 1. A hop `a → b` yields `amount * rate(b) / rate(a)`.
pub struct FixedRateRouter {
    wrapped_native: TokenId,
    liquidity: AccountId,
    rates: HashMap<TokenId, u128>,
}

impl FixedRateRouter {
    pub fn new(wrapped_native: TokenId, liquidity: AccountId) -> Self {
        let mut rates = HashMap::new();
        rates.insert(wrapped_native, 1);
        Self {
            wrapped_native,
            liquidity,
            rates,
        }
    }

    /// Quote `token` at `rate` tokens per native unit
    pub fn with_rate(mut self, token: TokenId, rate: u128) -> Self {
        self.set_rate(token, rate);
        self
    }

    pub fn set_rate(&mut self, token: TokenId, rate: u128) {
        if token != self.wrapped_native {
            self.rates.insert(token, rate);
        }
    }

    pub fn wrapped_native(&self) -> TokenId {
        self.wrapped_native
    }

    /// Account the router pays outputs from
    pub fn liquidity_account(&self) -> AccountId {
        self.liquidity
    }

    fn rate_of(&self, token: &TokenId) -> Result<u128> {
        match self.rates.get(token) {
            Some(&rate) if rate > 0 => Ok(rate),
            _ => Err(RewardsError::InvalidInput(format!("no route through {}", token))),
        }
    }

    /// Output of `amount` pushed along `path`
    pub fn quote_path(&self, path: &[TokenId], amount: Amount) -> Result<Amount> {
        path.windows(2).try_fold(amount, |acc, hop| {
            let from = self.rate_of(&hop[0])?;
            let to = self.rate_of(&hop[1])?;
            mul_div_floor(acc, to, from)
        })
    }

    fn validate(&self, request: &ConvertRequest) -> Result<()> {
        if request.value == 0 {
            return Err(RewardsError::InvalidAmount);
        }
        if request.targets.is_empty() {
            return Err(RewardsError::InvalidInput("no target tokens".to_string()));
        }
        if request.paths.len() != request.targets.len() {
            return Err(RewardsError::InvalidInput(format!(
                "{} targets but {} paths",
                request.targets.len(),
                request.paths.len()
            )));
        }
        if request.slippage_tolerance > MAX_SLIPPAGE_PERCENT {
            return Err(RewardsError::InvalidInput(format!(
                "slippage tolerance {}% above {}%",
                request.slippage_tolerance, MAX_SLIPPAGE_PERCENT
            )));
        }

        for (target, path) in request.targets.iter().zip(&request.paths) {
            if path.len() < 2 {
                return Err(RewardsError::InvalidInput("path needs at least two hops".to_string()));
            }
            if path[0] != self.wrapped_native {
                return Err(RewardsError::InvalidInput(format!(
                    "path must start at wrapped native, starts at {}",
                    path[0]
                )));
            }
            if path.last() != Some(target) {
                return Err(RewardsError::InvalidInput(format!(
                    "path for {} ends elsewhere",
                    target
                )));
            }
        }
        Ok(())
    }
}

impl Router for FixedRateRouter {
    fn name(&self) -> &str {
        "fixed-rate"
    }

    fn convert(&self, ledger: &TokenLedger, request: &ConvertRequest, now: Timestamp) -> Result<ConversionReceipt> {
        if request.deadline <= now {
            return Err(RewardsError::Expired {
                deadline: request.deadline,
                now,
            });
        }
        self.validate(request)?;

        let count = request.targets.len() as u128;
        let share = request.value / count;
        let remainder = request.value % count;

        ledger.transfer(&TokenId::NATIVE, &request.payer, &self.liquidity, request.value)?;

        let mut outputs = Vec::with_capacity(request.targets.len());
        for (i, (target, path)) in request.targets.iter().zip(&request.paths).enumerate() {
            let input = if i == 0 { share + remainder } else { share };
            let output = self.quote_path(path, input)?;
            ledger.transfer(target, &self.liquidity, &request.recipient, output)?;
            tracing::debug!("Routed {} native through {} hops -> {} of {}", input, path.len() - 1, output, target);
            outputs.push((*target, output));
        }

        Ok(ConversionReceipt {
            status: ConversionStatus::Filled,
            outputs,
            amount_placeholder: request.amount_placeholder,
        })
    }
}
