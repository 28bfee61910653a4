//! # Position Ledger
//!
//! Principal held per (owner, token). Every deposit call opens a discrete
//! lot stamped with the block time; withdrawals consume lots oldest-first and
//! hand the consumed slices to the accrual engine.
//!
//! ```text
//!  deposit 5 @t0   deposit 3 @t1        withdraw 6 @t2
//!  [5@t0]          [5@t0, 3@t1]   ──►   consumed [5@t0, 1@t1]
//!                                       remaining [2@t1]
//! ```

use crate::whitelist::Whitelist;
use plexus_core::{AccountId, Amount, Result, RewardsError, Timestamp, TokenId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

/// One deposit
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lot {
    /// Remaining principal of this deposit
    pub amount: Amount,

    /// Block time of the deposit
    pub deposited_at: Timestamp,
}

/// Slice of a lot removed by a withdrawal
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumedLot {
    pub amount: Amount,
    pub deposited_at: Timestamp,
}

/// Principal of one owner in one token
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Position {
    pub owner: AccountId,
    pub token: TokenId,

    /// Open lots, oldest first
    pub lots: VecDeque<Lot>,

    /// Sum of lot amounts
    pub principal: Amount,
}

impl Position {
    fn new(owner: AccountId, token: TokenId) -> Self {
        Self {
            owner,
            token,
            lots: VecDeque::new(),
            principal: 0,
        }
    }

    /// Remove `amount` from the oldest lots, splitting the last one touched
    fn consume(&mut self, mut amount: Amount) -> Vec<ConsumedLot> {
        let mut consumed = Vec::new();

        while amount > 0 {
            let Some(front) = self.lots.front_mut() else {
                break;
            };
            let take = front.amount.min(amount);
            consumed.push(ConsumedLot {
                amount: take,
                deposited_at: front.deposited_at,
            });
            front.amount -= take;
            amount -= take;
            self.principal -= take;

            if front.amount == 0 {
                self.lots.pop_front();
            }
        }

        consumed
    }

    /// View all lots as if the whole position were withdrawn
    pub fn as_consumed(&self) -> Vec<ConsumedLot> {
        self.lots
            .iter()
            .map(|lot| ConsumedLot {
                amount: lot.amount,
                deposited_at: lot.deposited_at,
            })
            .collect()
    }
}

/// All open positions
#[derive(Clone, Debug, Default)]
pub struct PositionLedger {
    positions: HashMap<(AccountId, TokenId), Position>,

    /// Total principal per token
    totals: HashMap<TokenId, Amount>,
}

impl PositionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new lot for `owner`
    ///
    /// Returns the owner's principal after the deposit.
    pub fn record_deposit(
        &mut self,
        whitelist: &Whitelist,
        owner: AccountId,
        token: TokenId,
        amount: Amount,
        now: Timestamp,
    ) -> Result<Amount> {
        whitelist.ensure(&token)?;
        if amount == 0 {
            return Err(RewardsError::InvalidAmount);
        }

        let total = self.totals.get(&token).copied().unwrap_or(0);
        let new_total = total
            .checked_add(amount)
            .ok_or(RewardsError::Overflow("total principal"))?;

        let position = self
            .positions
            .entry((owner, token))
            .or_insert_with(|| Position::new(owner, token));
        position.principal = position
            .principal
            .checked_add(amount)
            .ok_or(RewardsError::Overflow("principal"))?;
        position.lots.push_back(Lot {
            amount,
            deposited_at: now,
        });
        let principal = position.principal;

        self.totals.insert(token, new_total);
        Ok(principal)
    }

    /// Consume `amount` of principal FIFO
    ///
    /// Fails without mutating anything when the position cannot cover it.
    pub fn record_withdrawal(
        &mut self,
        owner: AccountId,
        token: TokenId,
        amount: Amount,
    ) -> Result<Vec<ConsumedLot>> {
        if amount == 0 {
            return Err(RewardsError::InvalidAmount);
        }

        let available = self.principal_of(&owner, &token);
        if amount > available {
            return Err(RewardsError::InsufficientBalance {
                requested: amount,
                available,
            });
        }

        let key = (owner, token);
        let Some(position) = self.positions.get_mut(&key) else {
            return Err(RewardsError::InsufficientBalance {
                requested: amount,
                available: 0,
            });
        };
        let consumed = position.consume(amount);
        if position.principal == 0 {
            self.positions.remove(&key);
        }

        if let Some(total) = self.totals.get_mut(&token) {
            *total = total.saturating_sub(amount);
        }

        Ok(consumed)
    }

    pub fn principal_of(&self, owner: &AccountId, token: &TokenId) -> Amount {
        self.positions
            .get(&(*owner, *token))
            .map(|p| p.principal)
            .unwrap_or(0)
    }

    pub fn position(&self, owner: &AccountId, token: &TokenId) -> Option<&Position> {
        self.positions.get(&(*owner, *token))
    }

    pub fn lots_of(&self, owner: &AccountId, token: &TokenId) -> Vec<Lot> {
        self.positions
            .get(&(*owner, *token))
            .map(|p| p.lots.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn total_principal(&self, token: &TokenId) -> Amount {
        self.totals.get(token).copied().unwrap_or(0)
    }

    pub fn position_count(&self) -> usize {
        self.positions.len()
    }
}
