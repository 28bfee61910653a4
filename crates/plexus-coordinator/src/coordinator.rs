//! # Deposit/Withdraw Coordinator
//!
//! Entry point for every state-changing call. Each call:
//!
//! 1. enters the reentrancy guard
//! 2. snapshots the token ledger and the rewards engine
//! 3. runs the transition, restoring both snapshots on any error
//! 4. drains the engine's events into a [`Receipt`]
//!
//! ## Position lifecycle
//!
//! ```text
//!            deposit                 withdraw (partial)
//!   EMPTY ───────────► HAS_PRINCIPAL ◄────────────┐
//!     ▲                    │  │                   │
//!     └────────────────────┘  └───────────────────┘
//!       withdraw (full)
//! ```
//!
//! Withdrawals move principal before rewards. A reward that cannot be paid
//! is reported on the receipt and never reverts the principal.

use crate::guard::ReentrancyGuard;
use crate::router::{ConversionReceipt, ConvertRequest, Router};
use crate::tier::{TierAdapter, TierRegistry};
use parking_lot::{Mutex, RwLock};
use plexus_core::{
    AccountId, Amount, BlockNumber, Clock, Result, RewardsError, Timestamp, TokenId, TokenLedger,
};
use plexus_rewards::{AprRate, ConsumedLot, Lot, RewardEvent, RewardOutcome, RewardsEngine};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Final state of a committed call
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionStatus {
    /// Every step succeeded
    Confirmed,

    /// Principal moved but the reward payout was skipped
    RewardSkipped,
}

/// Record of a committed call
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Receipt<T> {
    /// BLAKE3 over operation, caller, nonce and block
    pub tx_hash: String,
    pub block_number: BlockNumber,
    pub timestamp: Timestamp,
    pub status: TransactionStatus,
    pub events: Vec<RewardEvent>,

    /// Operation-specific result
    pub output: T,
}

/// Result of a withdrawal
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Withdrawal {
    /// Principal returned to the caller
    pub principal: Amount,

    /// Lots the principal was taken from
    pub consumed: Vec<ConsumedLot>,

    pub reward: RewardOutcome,
}

/// Caller-facing part of a conversion
#[derive(Clone, Debug)]
pub struct ConvertOrder {
    pub targets: Vec<TokenId>,
    pub paths: Vec<Vec<TokenId>>,
    pub amount_placeholder: Amount,
    pub slippage_tolerance: u32,
    pub deadline: Timestamp,
}

/// Deposit/withdraw coordinator
pub struct Coordinator {
    /// Ledger account the coordinator pulls deposits into
    account: AccountId,
    ledger: Arc<TokenLedger>,
    engine: Mutex<RewardsEngine>,
    tiers: RwLock<TierRegistry>,
    router: Arc<dyn Router>,
    clock: Arc<dyn Clock>,
    guard: ReentrancyGuard,
    nonce: AtomicU64,
}

impl Coordinator {
    pub fn new(
        account: AccountId,
        ledger: Arc<TokenLedger>,
        engine: RewardsEngine,
        router: Arc<dyn Router>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            account,
            ledger,
            engine: Mutex::new(engine),
            tiers: RwLock::new(TierRegistry::new()),
            router,
            clock,
            guard: ReentrancyGuard::new(),
            nonce: AtomicU64::new(0),
        }
    }

    /// Ledger account users approve before depositing
    pub fn account(&self) -> AccountId {
        self.account
    }

    pub fn ledger(&self) -> &Arc<TokenLedger> {
        &self.ledger
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn router(&self) -> &Arc<dyn Router> {
        &self.router
    }

    // === Deposits and withdrawals ===

    /// Pull `amount` of `token` from the caller into the tier `tier_name`
    ///
    /// The caller must have approved the coordinator account for `amount`.
    /// Returns the caller's principal after the deposit.
    pub fn deposit(
        &self,
        caller: &AccountId,
        tier_name: &str,
        token: &TokenId,
        amount: Amount,
    ) -> Result<Receipt<Amount>> {
        self.transact("deposit", caller, |engine, now| {
            let tier = self.tier(tier_name, token)?;
            let principal = engine.record_deposit(*caller, *token, amount, now)?;

            self.ledger
                .transfer_from(token, &self.account, caller, &self.account, amount)?;
            tier.deposit(&self.ledger, &self.account, token, amount)?;

            tracing::info!(
                "Deposit: {} put {} of {} into tier {} (principal {})",
                caller,
                amount,
                self.ledger.symbol_of(token),
                tier_name,
                principal
            );
            engine.emit(RewardEvent::Deposited {
                owner: *caller,
                token: *token,
                tier: tier_name.to_string(),
                amount,
            });
            Ok((principal, TransactionStatus::Confirmed))
        })
    }

    /// Return `amount` of principal from `tier_name`, then pay the reward
    pub fn withdraw(
        &self,
        caller: &AccountId,
        tier_name: &str,
        token: &TokenId,
        amount: Amount,
    ) -> Result<Receipt<Withdrawal>> {
        self.transact("withdraw", caller, |engine, now| {
            let tier = self.tier(tier_name, token)?;
            let consumed = engine.record_withdrawal(*caller, *token, amount)?;

            tier.withdraw(&self.ledger, &self.account, token, amount)?;
            self.ledger.transfer(token, &self.account, caller, amount)?;
            engine.emit(RewardEvent::Withdrawn {
                owner: *caller,
                token: *token,
                tier: tier_name.to_string(),
                amount,
            });

            let reward = engine.settle_reward(&self.ledger, *caller, *token, &consumed, now);
            tracing::info!(
                "Withdraw: {} took {} of {} from tier {} (reward {:?})",
                caller,
                amount,
                self.ledger.symbol_of(token),
                tier_name,
                reward
            );

            let status = if reward.is_skipped() {
                TransactionStatus::RewardSkipped
            } else {
                TransactionStatus::Confirmed
            };
            Ok((
                Withdrawal {
                    principal: amount,
                    consumed,
                    reward,
                },
                status,
            ))
        })
    }

    /// Convert `value` native currency into the order's target tokens
    pub fn convert(
        &self,
        caller: &AccountId,
        order: ConvertOrder,
        value: Amount,
    ) -> Result<Receipt<ConversionReceipt>> {
        self.transact("convert", caller, |engine, now| {
            if order.deadline <= now {
                return Err(RewardsError::Expired {
                    deadline: order.deadline,
                    now,
                });
            }

            self.ledger
                .transfer(&TokenId::NATIVE, caller, &self.account, value)?;

            let request = ConvertRequest {
                payer: self.account,
                recipient: *caller,
                targets: order.targets,
                paths: order.paths,
                amount_placeholder: order.amount_placeholder,
                slippage_tolerance: order.slippage_tolerance,
                deadline: order.deadline,
                value,
            };
            let conversion = self.router.convert(&self.ledger, &request, now)?;

            tracing::info!(
                "Convert: {} swapped {} native via {} into {} tokens",
                caller,
                value,
                self.router.name(),
                conversion.outputs.len()
            );
            engine.emit(RewardEvent::Converted {
                owner: *caller,
                value,
                outputs: conversion.outputs.clone(),
            });
            Ok((conversion, TransactionStatus::Confirmed))
        })
    }

    /// Move reward tokens from `caller` into the treasury
    pub fn fund_treasury(&self, caller: &AccountId, amount: Amount) -> Result<Receipt<Amount>> {
        self.transact("fund_treasury", caller, |engine, _| {
            if amount == 0 {
                return Err(RewardsError::InvalidAmount);
            }
            self.ledger.transfer(
                &engine.reward_token(),
                caller,
                &engine.treasury_account(),
                amount,
            )?;
            let balance = engine.treasury_balance(&self.ledger);
            tracing::info!("Treasury funded with {} by {} (balance {})", amount, caller, balance);
            Ok((balance, TransactionStatus::Confirmed))
        })
    }

    // === Administration ===

    pub fn add_token_to_whitelist(&self, caller: &AccountId, token: &TokenId) -> Result<Receipt<()>> {
        self.transact("add_token_to_whitelist", caller, |engine, _| {
            engine.add_token_to_whitelist(caller, *token)?;
            Ok(((), TransactionStatus::Confirmed))
        })
    }

    pub fn remove_token_from_whitelist(&self, caller: &AccountId, token: &TokenId) -> Result<Receipt<()>> {
        self.transact("remove_token_from_whitelist", caller, |engine, _| {
            engine.remove_token_from_whitelist(caller, *token)?;
            Ok(((), TransactionStatus::Confirmed))
        })
    }

    pub fn update_apr(&self, caller: &AccountId, rate: AprRate, token: &TokenId) -> Result<Receipt<()>> {
        self.transact("update_apr", caller, |engine, _| {
            engine.update_apr(caller, rate, *token)?;
            Ok(((), TransactionStatus::Confirmed))
        })
    }

    pub fn transfer_admin(&self, caller: &AccountId, new_admin: &AccountId) -> Result<Receipt<()>> {
        self.transact("transfer_admin", caller, |engine, _| {
            engine.transfer_admin(caller, *new_admin)?;
            Ok(((), TransactionStatus::Confirmed))
        })
    }

    /// Register a tier adapter (administrator only)
    pub fn register_tier(&self, caller: &AccountId, tier: Arc<dyn TierAdapter>) -> Result<()> {
        let _entered = self.guard.enter()?;
        if *caller != self.engine.lock().admin() {
            return Err(RewardsError::Unauthorized);
        }
        self.tiers.write().register(tier)
    }

    // === Views ===
    //
    // Views take the guard too: a collaborator reading state in the middle
    // of a transition gets `Reentrancy` instead of a deadlock.

    pub fn token_apr(&self, token: &TokenId) -> Result<AprRate> {
        self.view(|engine| Ok(engine.token_apr(token)))
    }

    pub fn is_whitelisted(&self, token: &TokenId) -> Result<bool> {
        self.view(|engine| Ok(engine.is_whitelisted(token)))
    }

    pub fn whitelisted_tokens(&self) -> Result<Vec<TokenId>> {
        self.view(|engine| Ok(engine.whitelisted_tokens()))
    }

    pub fn admin(&self) -> Result<AccountId> {
        self.view(|engine| Ok(engine.admin()))
    }

    pub fn principal_of(&self, owner: &AccountId, token: &TokenId) -> Result<Amount> {
        self.view(|engine| Ok(engine.principal_of(owner, token)))
    }

    pub fn lots_of(&self, owner: &AccountId, token: &TokenId) -> Result<Vec<Lot>> {
        self.view(|engine| Ok(engine.lots_of(owner, token)))
    }

    pub fn total_principal(&self, token: &TokenId) -> Result<Amount> {
        self.view(|engine| Ok(engine.total_principal(token)))
    }

    /// Reward the full position would earn if withdrawn now
    pub fn pending_reward(&self, owner: &AccountId, token: &TokenId) -> Result<Amount> {
        let now = self.clock.now();
        self.view(|engine| engine.pending_reward(owner, token, now))
    }

    pub fn treasury_balance(&self) -> Result<Amount> {
        self.view(|engine| Ok(engine.treasury_balance(&self.ledger)))
    }

    pub fn reward_token(&self) -> Result<TokenId> {
        self.view(|engine| Ok(engine.reward_token()))
    }

    pub fn tier_names(&self) -> Vec<String> {
        self.tiers.read().names()
    }

    // === Internal helpers ===

    fn tier(&self, name: &str, token: &TokenId) -> Result<Arc<dyn TierAdapter>> {
        self.tiers.read().get_for(name, token)
    }

    fn view<T>(&self, f: impl FnOnce(&RewardsEngine) -> Result<T>) -> Result<T> {
        let _entered = self.guard.enter()?;
        let engine = self.engine.lock();
        f(&engine)
    }

    fn transact<T>(
        &self,
        operation: &'static str,
        caller: &AccountId,
        f: impl FnOnce(&mut RewardsEngine, Timestamp) -> Result<(T, TransactionStatus)>,
    ) -> Result<Receipt<T>> {
        let _entered = self.guard.enter()?;
        let now = self.clock.now();
        let block_number = self.clock.block_number();

        let mut engine = self.engine.lock();
        let engine_snapshot = engine.clone();
        let ledger_snapshot = self.ledger.snapshot();

        match f(&mut engine, now) {
            Ok((output, status)) => {
                let events = engine.take_events();
                let nonce = self.nonce.fetch_add(1, Ordering::SeqCst);
                let tx_hash = transaction_hash(operation, caller, nonce, block_number, now);
                tracing::debug!(
                    "{} committed in block {} (events [{}], tx {})",
                    operation,
                    block_number,
                    events.iter().map(RewardEvent::name).collect::<Vec<_>>().join(", "),
                    &tx_hash[..16]
                );
                Ok(Receipt {
                    tx_hash,
                    block_number,
                    timestamp: now,
                    status,
                    events,
                    output,
                })
            }
            Err(error) => {
                *engine = engine_snapshot;
                self.ledger.restore(ledger_snapshot);
                tracing::warn!("{} by {} rolled back: {}", operation, caller, error);
                Err(error)
            }
        }
    }
}

fn transaction_hash(
    operation: &str,
    caller: &AccountId,
    nonce: u64,
    block_number: BlockNumber,
    timestamp: Timestamp,
) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(operation.as_bytes());
    hasher.update(caller.as_bytes());
    hasher.update(&nonce.to_le_bytes());
    hasher.update(&block_number.to_le_bytes());
    hasher.update(&timestamp.to_le_bytes());
    hex::encode(hasher.finalize().as_bytes())
}
