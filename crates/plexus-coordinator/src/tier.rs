//! # Tier Adapters
//!
//! A tier is a named custody component holding deposited principal. The
//! coordinator never touches tier internals: it hands tokens over with
//! `deposit` and asks for them back with `withdraw`.
//!
//! ## Registered Tiers
//!
//! - **FARM**, **DAI**, **PICKLE**: `CustodyTier`s keyed by the token they hold
//! - Any other `TierAdapter` can be registered under a fresh name
//!
//! Each token is held by at most one tier, so principal of a token can only
//! be deposited into and withdrawn from the tier that custodies it.

use plexus_core::{AccountId, Amount, Result, RewardsError, TokenId, TokenLedger};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Custody component interface
pub trait TierAdapter: Send + Sync {
    /// Name deposits and withdrawals refer to
    fn name(&self) -> &str;

    /// Ledger account holding this tier's principal
    fn custody_account(&self) -> AccountId;

    /// Tokens this tier takes into custody
    fn tokens(&self) -> Vec<TokenId>;

    /// Take `amount` of `token` from `from` into custody
    fn deposit(&self, ledger: &TokenLedger, from: &AccountId, token: &TokenId, amount: Amount) -> Result<()>;

    /// Release `amount` of `token` from custody to `to`
    fn withdraw(&self, ledger: &TokenLedger, to: &AccountId, token: &TokenId, amount: Amount) -> Result<()>;

    /// Principal currently in custody
    fn custodied(&self, ledger: &TokenLedger, token: &TokenId) -> Amount {
        ledger.balance_of(&self.custody_account(), token)
    }
}

/// Tier adapters by name, with the custodian of every token
#[derive(Default, Clone)]
pub struct TierRegistry {
    tiers: BTreeMap<String, Arc<dyn TierAdapter>>,
    custodians: BTreeMap<TokenId, String>,
}

impl TierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter under its own name
    ///
    /// Fails when the name is taken or one of its tokens already has a
    /// custodian; nothing is registered in either case.
    pub fn register(&mut self, tier: Arc<dyn TierAdapter>) -> Result<()> {
        let name = tier.name().to_string();
        if self.tiers.contains_key(&name) {
            return Err(RewardsError::DuplicateTier(name));
        }
        let tokens = tier.tokens();
        for token in &tokens {
            if let Some(holder) = self.custodians.get(token) {
                return Err(RewardsError::InvalidInput(format!(
                    "token {} is already held by tier {}",
                    token, holder
                )));
            }
        }

        tracing::debug!("Registered tier {} (custody {})", name, tier.custody_account());
        for token in tokens {
            self.custodians.insert(token, name.clone());
        }
        self.tiers.insert(name, tier);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn TierAdapter>> {
        self.tiers
            .get(name)
            .cloned()
            .ok_or_else(|| RewardsError::UnknownTier(name.to_string()))
    }

    /// Tier `name`, provided it is the custodian of `token`
    pub fn get_for(&self, name: &str, token: &TokenId) -> Result<Arc<dyn TierAdapter>> {
        let tier = self.get(name)?;
        match self.custodians.get(token) {
            Some(holder) if holder == name => Ok(tier),
            _ => Err(RewardsError::TransferFailed(format!(
                "tier {} does not hold token {}",
                name, token
            ))),
        }
    }

    /// Name of the tier holding `token`
    pub fn custodian(&self, token: &TokenId) -> Option<&str> {
        self.custodians.get(token).map(String::as_str)
    }

    pub fn names(&self) -> Vec<String> {
        self.tiers.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }
}

/// Tier that keeps principal in its own ledger account
pub struct CustodyTier {
    name: String,
    custody: AccountId,
    tokens: BTreeSet<TokenId>,
}

impl CustodyTier {
    pub fn new(name: &str, tokens: impl IntoIterator<Item = TokenId>) -> Self {
        Self {
            name: name.to_string(),
            custody: AccountId::from_label(&format!("tier:{}", name)),
            tokens: tokens.into_iter().collect(),
        }
    }

    pub fn accepts(&self, token: &TokenId) -> bool {
        self.tokens.contains(token)
    }

    fn ensure_accepts(&self, token: &TokenId) -> Result<()> {
        if self.accepts(token) {
            Ok(())
        } else {
            Err(RewardsError::TransferFailed(format!(
                "tier {} does not hold token {}",
                self.name, token
            )))
        }
    }
}

impl TierAdapter for CustodyTier {
    fn name(&self) -> &str {
        &self.name
    }

    fn custody_account(&self) -> AccountId {
        self.custody
    }

    fn tokens(&self) -> Vec<TokenId> {
        self.tokens.iter().copied().collect()
    }

    fn deposit(&self, ledger: &TokenLedger, from: &AccountId, token: &TokenId, amount: Amount) -> Result<()> {
        self.ensure_accepts(token)?;
        ledger.transfer(token, from, &self.custody, amount)
    }

    fn withdraw(&self, ledger: &TokenLedger, to: &AccountId, token: &TokenId, amount: Amount) -> Result<()> {
        self.ensure_accepts(token)?;
        ledger.transfer(token, &self.custody, to, amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_lookup() {
        let farm = TokenId::from_symbol("FARM");
        let mut registry = TierRegistry::new();
        registry.register(Arc::new(CustodyTier::new("FARM", [farm]))).unwrap();

        assert_eq!(registry.get("FARM").unwrap().name(), "FARM");
        assert!(matches!(
            registry.get("PICKLE"),
            Err(RewardsError::UnknownTier(name)) if name == "PICKLE"
        ));
    }

    #[test]
    fn test_duplicate_tier_rejected() {
        let mut registry = TierRegistry::new();
        registry.register(Arc::new(CustodyTier::new("DAI", Vec::<TokenId>::new()))).unwrap();
        assert_eq!(
            registry.register(Arc::new(CustodyTier::new("DAI", Vec::<TokenId>::new()))),
            Err(RewardsError::DuplicateTier("DAI".to_string()))
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_token_has_single_custodian() {
        let farm = TokenId::from_symbol("FARM");
        let dai = TokenId::from_symbol("DAI");
        let mut registry = TierRegistry::new();
        registry.register(Arc::new(CustodyTier::new("FARM", [farm]))).unwrap();

        assert!(matches!(
            registry.register(Arc::new(CustodyTier::new("FARM2", [dai, farm]))),
            Err(RewardsError::InvalidInput(_))
        ));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.custodian(&farm), Some("FARM"));
        assert_eq!(registry.custodian(&dai), None);
    }

    #[test]
    fn test_get_for_checks_custodian() {
        let farm = TokenId::from_symbol("FARM");
        let dai = TokenId::from_symbol("DAI");
        let mut registry = TierRegistry::new();
        registry.register(Arc::new(CustodyTier::new("FARM", [farm]))).unwrap();
        registry.register(Arc::new(CustodyTier::new("DAI", [dai]))).unwrap();

        assert_eq!(registry.get_for("FARM", &farm).unwrap().name(), "FARM");
        assert!(matches!(
            registry.get_for("DAI", &farm),
            Err(RewardsError::TransferFailed(_))
        ));
        assert!(matches!(
            registry.get_for("SUSHI", &farm),
            Err(RewardsError::UnknownTier(_))
        ));
    }

    #[test]
    fn test_custody_round_trip() {
        let ledger = TokenLedger::new();
        let dai = ledger.register_token("DAI", "Dai Stablecoin", 18);
        let core = AccountId::from_label("core");
        ledger.mint(&dai, &core, 10).unwrap();

        let tier = CustodyTier::new("DAI", [dai]);
        tier.deposit(&ledger, &core, &dai, 7).unwrap();
        assert_eq!(tier.custodied(&ledger, &dai), 7);
        assert_eq!(ledger.balance_of(&core, &dai), 3);

        tier.withdraw(&ledger, &core, &dai, 7).unwrap();
        assert_eq!(tier.custodied(&ledger, &dai), 0);
        assert_eq!(ledger.balance_of(&core, &dai), 10);
    }

    #[test]
    fn test_foreign_token_rejected() {
        let ledger = TokenLedger::new();
        let dai = ledger.register_token("DAI", "Dai Stablecoin", 18);
        let farm = ledger.register_token("FARM", "Harvest Farm", 18);
        let core = AccountId::from_label("core");
        ledger.mint(&farm, &core, 10).unwrap();

        let tier = CustodyTier::new("DAI", [dai]);
        assert!(matches!(
            tier.deposit(&ledger, &core, &farm, 5),
            Err(RewardsError::TransferFailed(_))
        ));
        assert_eq!(ledger.balance_of(&core, &farm), 10);
    }
}
