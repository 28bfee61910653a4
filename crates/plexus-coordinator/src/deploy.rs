//! In-memory deployment of the full system from a [`PlexusConfig`]

use crate::config::PlexusConfig;
use crate::coordinator::Coordinator;
use crate::router::FixedRateRouter;
use crate::tier::CustodyTier;
use plexus_core::{
    AccountId, Amount, BlockClock, Result, RewardsError, TokenId, TokenLedger, ONE_TOKEN,
};
use plexus_rewards::RewardsEngine;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Labels of the system accounts
pub const TREASURY_LABEL: &str = "token-rewards";
pub const COORDINATOR_LABEL: &str = "deposit-helper";
pub const LIQUIDITY_LABEL: &str = "router-liquidity";

/// Everything a simulation or test needs to drive the system
pub struct Deployment {
    pub ledger: Arc<TokenLedger>,
    pub clock: Arc<BlockClock>,
    pub coordinator: Arc<Coordinator>,
    pub admin: AccountId,
    pub reward_token: TokenId,
    pub wrapped_native: TokenId,

    /// Deposit tokens by symbol
    pub tokens: BTreeMap<String, TokenId>,
}

impl Deployment {
    /// Build ledger, router, engine, coordinator and tiers
    ///
    /// The administrator receives the reward token's genesis supply; the
    /// router's liquidity account receives `router.liquidity` of every
    /// deposit token. Whitelisting, APRs and treasury funding are left to
    /// the caller.
    pub fn setup(config: &PlexusConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| RewardsError::InvalidInput(e.to_string()))?;

        let ledger = Arc::new(TokenLedger::new());
        let clock = Arc::new(BlockClock::new(
            config.chain.genesis_timestamp,
            config.chain.block_interval,
        ));
        let admin = AccountId::from_label(&config.rewards.admin);

        let reward_token = ledger.register_token(
            &config.rewards.reward_token,
            &config.rewards.reward_token_name,
            18,
        );
        ledger.mint(&reward_token, &admin, whole(config.rewards.genesis_supply)?)?;

        let wrapped_native = ledger.register_token(&config.router.wrapped_native, "Wrapped Native", 18);
        let liquidity = AccountId::from_label(LIQUIDITY_LABEL);
        let mut router = FixedRateRouter::new(wrapped_native, liquidity);

        let mut tokens = BTreeMap::new();
        for token in &config.tokens {
            let name = if token.name.is_empty() { &token.symbol } else { &token.name };
            let id = ledger.register_token(&token.symbol, name, 18);
            ledger.mint(&id, &liquidity, whole(config.router.liquidity)?)?;
            router.set_rate(id, token.native_rate as u128);
            tokens.insert(token.symbol.to_ascii_uppercase(), id);
        }

        let engine = RewardsEngine::new(admin, reward_token, AccountId::from_label(TREASURY_LABEL));
        let coordinator = Arc::new(Coordinator::new(
            AccountId::from_label(COORDINATOR_LABEL),
            ledger.clone(),
            engine,
            Arc::new(router),
            clock.clone(),
        ));

        for tier in &config.tiers {
            let held = tier
                .tokens
                .iter()
                .filter_map(|symbol| tokens.get(&symbol.to_ascii_uppercase()).copied());
            coordinator.register_tier(&admin, Arc::new(CustodyTier::new(&tier.name, held)))?;
        }

        tracing::info!(
            "Deployed {} tokens and {} tiers (reward token {}, admin {})",
            tokens.len(),
            config.tiers.len(),
            config.rewards.reward_token,
            admin
        );

        Ok(Self {
            ledger,
            clock,
            coordinator,
            admin,
            reward_token,
            wrapped_native,
            tokens,
        })
    }

    /// Deposit token by symbol
    pub fn token(&self, symbol: &str) -> Result<TokenId> {
        self.tokens
            .get(&symbol.to_ascii_uppercase())
            .copied()
            .ok_or_else(|| RewardsError::InvalidInput(format!("unknown token {}", symbol)))
    }

    /// Credit native currency to an account (test signers start funded)
    pub fn fund_native(&self, account: &AccountId, amount: Amount) -> Result<()> {
        self.ledger.mint(&TokenId::NATIVE, account, amount)
    }
}

fn whole(tokens: u64) -> Result<Amount> {
    (tokens as u128)
        .checked_mul(ONE_TOKEN)
        .ok_or(RewardsError::Overflow("config amount"))
}
