//! # Rewards Engine
//!
//! Owns the administrator identity, the whitelist, the APR table and the
//! position ledger, and pays rewards out of its treasury account on the
//! token ledger.
//!
//! The engine is a plain value: the coordinator clones it before a
//! transition and puts the clone back if the transition fails.

use crate::accrual::compute_reward;
use crate::apr::{AprRate, AprTable};
use crate::events::RewardEvent;
use crate::ledger::{ConsumedLot, Lot, PositionLedger};
use crate::whitelist::Whitelist;
use plexus_core::{AccountId, Amount, Result, RewardsError, Timestamp, TokenId, TokenLedger};

/// What happened to the reward of a withdrawal
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RewardOutcome {
    /// Reward transferred in full
    Paid { amount: Amount },

    /// Nothing accrued (zero APR or zero elapsed time)
    NothingAccrued,

    /// Token is off the whitelist; accrual suspended
    Suspended,

    /// Reward could not be paid; principal was still returned
    Skipped { error: RewardsError },
}

impl RewardOutcome {
    pub fn paid(&self) -> Amount {
        match self {
            Self::Paid { amount } => *amount,
            _ => 0,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }
}

/// Reward accrual state
#[derive(Clone, Debug)]
pub struct RewardsEngine {
    /// Administrator allowed to change the whitelist and APRs
    admin: AccountId,

    /// Token paid as reward
    reward_token: TokenId,

    /// Ledger account holding the reward treasury
    treasury: AccountId,

    whitelist: Whitelist,
    aprs: AprTable,
    positions: PositionLedger,

    /// Events not yet drained into a receipt
    pending_events: Vec<RewardEvent>,
}

impl RewardsEngine {
    pub fn new(admin: AccountId, reward_token: TokenId, treasury: AccountId) -> Self {
        Self {
            admin,
            reward_token,
            treasury,
            whitelist: Whitelist::new(),
            aprs: AprTable::new(),
            positions: PositionLedger::new(),
            pending_events: Vec::new(),
        }
    }

    pub fn admin(&self) -> AccountId {
        self.admin
    }

    pub fn reward_token(&self) -> TokenId {
        self.reward_token
    }

    pub fn treasury_account(&self) -> AccountId {
        self.treasury
    }

    fn ensure_admin(&self, caller: &AccountId) -> Result<()> {
        if *caller == self.admin {
            Ok(())
        } else {
            Err(RewardsError::Unauthorized)
        }
    }

    // === Administration ===

    /// Make a token reward-eligible; repeating the call is a no-op
    pub fn add_token_to_whitelist(&mut self, caller: &AccountId, token: TokenId) -> Result<()> {
        self.ensure_admin(caller)?;
        if self.whitelist.add(token) {
            tracing::info!("Token {} whitelisted", token);
            self.pending_events.push(RewardEvent::TokenWhitelisted { token });
        }
        Ok(())
    }

    /// Remove a token from the whitelist
    ///
    /// Open positions stay withdrawable; their reward is suspended.
    pub fn remove_token_from_whitelist(&mut self, caller: &AccountId, token: TokenId) -> Result<()> {
        self.ensure_admin(caller)?;
        if self.whitelist.remove(&token) {
            tracing::info!(
                "Token {} removed from whitelist ({} principal still open)",
                token,
                self.positions.total_principal(&token)
            );
            self.pending_events.push(RewardEvent::TokenDelisted { token });
        }
        Ok(())
    }

    /// Set the APR for a whitelisted token
    pub fn update_apr(&mut self, caller: &AccountId, rate: AprRate, token: TokenId) -> Result<()> {
        self.ensure_admin(caller)?;
        if !self.whitelist.contains(&token) {
            return Err(RewardsError::InvalidRate(token));
        }
        let previous = self.aprs.set(token, rate);
        tracing::info!("APR for {} updated: {} -> {}", token, previous, rate);
        self.pending_events.push(RewardEvent::AprUpdated {
            token,
            previous,
            rate,
        });
        Ok(())
    }

    pub fn transfer_admin(&mut self, caller: &AccountId, new_admin: AccountId) -> Result<()> {
        self.ensure_admin(caller)?;
        let previous = self.admin;
        self.admin = new_admin;
        tracing::info!("Administrator transferred from {} to {}", previous, new_admin);
        self.pending_events.push(RewardEvent::AdminTransferred {
            previous,
            admin: new_admin,
        });
        Ok(())
    }

    pub fn is_whitelisted(&self, token: &TokenId) -> bool {
        self.whitelist.contains(token)
    }

    pub fn whitelisted_tokens(&self) -> Vec<TokenId> {
        self.whitelist.tokens().copied().collect()
    }

    pub fn token_apr(&self, token: &TokenId) -> AprRate {
        self.aprs.rate_of(token)
    }

    // === Positions ===

    pub fn record_deposit(
        &mut self,
        owner: AccountId,
        token: TokenId,
        amount: Amount,
        now: Timestamp,
    ) -> Result<Amount> {
        self.positions
            .record_deposit(&self.whitelist, owner, token, amount, now)
    }

    pub fn record_withdrawal(
        &mut self,
        owner: AccountId,
        token: TokenId,
        amount: Amount,
    ) -> Result<Vec<ConsumedLot>> {
        self.positions.record_withdrawal(owner, token, amount)
    }

    pub fn principal_of(&self, owner: &AccountId, token: &TokenId) -> Amount {
        self.positions.principal_of(owner, token)
    }

    pub fn lots_of(&self, owner: &AccountId, token: &TokenId) -> Vec<Lot> {
        self.positions.lots_of(owner, token)
    }

    pub fn total_principal(&self, token: &TokenId) -> Amount {
        self.positions.total_principal(token)
    }

    pub fn positions(&self) -> &PositionLedger {
        &self.positions
    }

    // === Rewards ===

    /// Reward for lots consumed from `token`, or `None` while suspended
    pub fn compute_reward(
        &self,
        token: &TokenId,
        consumed: &[ConsumedLot],
        now: Timestamp,
    ) -> Result<Option<Amount>> {
        if !self.whitelist.contains(token) {
            return Ok(None);
        }
        compute_reward(consumed, self.aprs.rate_of(token), now).map(Some)
    }

    /// Reward the full position would earn if withdrawn at `now`
    pub fn pending_reward(&self, owner: &AccountId, token: &TokenId, now: Timestamp) -> Result<Amount> {
        let Some(position) = self.positions.position(owner, token) else {
            return Ok(0);
        };
        Ok(self
            .compute_reward(token, &position.as_consumed(), now)?
            .unwrap_or(0))
    }

    pub fn treasury_balance(&self, ledger: &TokenLedger) -> Amount {
        ledger.balance_of(&self.treasury, &self.reward_token)
    }

    /// Transfer `amount` reward tokens from the treasury to `owner`
    ///
    /// Fails with `InsufficientTreasury` and transfers nothing when the
    /// treasury cannot cover the full amount.
    pub fn pay_reward(&self, ledger: &TokenLedger, owner: &AccountId, amount: Amount) -> Result<()> {
        let available = self.treasury_balance(ledger);
        if available < amount {
            return Err(RewardsError::InsufficientTreasury {
                required: amount,
                available,
            });
        }
        ledger.transfer(&self.reward_token, &self.treasury, owner, amount)
    }

    /// Compute and pay the reward for a withdrawal
    ///
    /// Never fails: every reward problem is reported in the outcome so the
    /// principal return that preceded it stands.
    pub fn settle_reward(
        &mut self,
        ledger: &TokenLedger,
        owner: AccountId,
        token: TokenId,
        consumed: &[ConsumedLot],
        now: Timestamp,
    ) -> RewardOutcome {
        let owed = match self.compute_reward(&token, consumed, now) {
            Ok(Some(0)) => return RewardOutcome::NothingAccrued,
            Ok(Some(owed)) => owed,
            Ok(None) => {
                tracing::info!("Reward for {} on {} suspended (token delisted)", owner, token);
                self.pending_events
                    .push(RewardEvent::RewardSuspended { owner, token });
                return RewardOutcome::Suspended;
            }
            Err(error) => {
                tracing::warn!("Reward computation for {} on {} failed: {}", owner, token, error);
                return RewardOutcome::Skipped { error };
            }
        };

        match self.pay_reward(ledger, &owner, owed) {
            Ok(()) => {
                tracing::info!("Paid reward {} to {} for {}", owed, owner, token);
                self.pending_events.push(RewardEvent::RewardPaid {
                    owner,
                    token,
                    amount: owed,
                });
                RewardOutcome::Paid { amount: owed }
            }
            Err(error) => {
                let available = self.treasury_balance(ledger);
                tracing::warn!(
                    "Reward payout of {} to {} skipped: {}",
                    owed,
                    owner,
                    error
                );
                self.pending_events.push(RewardEvent::RewardSkipped {
                    owner,
                    token,
                    owed,
                    available,
                });
                RewardOutcome::Skipped { error }
            }
        }
    }

    // === Events ===

    pub fn emit(&mut self, event: RewardEvent) {
        self.pending_events.push(event);
    }

    /// Drain buffered events
    pub fn take_events(&mut self) -> Vec<RewardEvent> {
        std::mem::take(&mut self.pending_events)
    }
}
