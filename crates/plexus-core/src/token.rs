//! # Token Ledger
//!
//! In-process fungible token ledger implementing the standard token surface
//! (`balance_of`, `transfer`, `approve`, `allowance`, `transfer_from`) for
//! every token in the system, including the native currency and the reward
//! token.
//!
//! The whole ledger lives behind one lock so a caller can take a
//! [`LedgerSnapshot`] before a multi-step transition and restore it if any
//! step fails.

use crate::error::{Result, RewardsError};
use crate::types::{AccountId, Amount, TokenId};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Token definition
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Token {
    /// Unique token identifier
    pub id: TokenId,

    /// Token symbol (e.g., "DAI", "PLX")
    pub symbol: String,

    /// Full name
    pub name: String,

    /// Decimal places
    pub decimals: u8,

    /// Total supply (current)
    pub total_supply: Amount,
}

/// Account with token balances and granted allowances
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Account {
    /// Token balances
    pub balances: HashMap<TokenId, Amount>,

    /// Allowances: token -> spender -> amount
    pub allowances: HashMap<TokenId, HashMap<AccountId, Amount>>,
}

impl Account {
    pub fn balance(&self, token: &TokenId) -> Amount {
        self.balances.get(token).copied().unwrap_or(0)
    }

    pub fn allowance(&self, token: &TokenId, spender: &AccountId) -> Amount {
        self.allowances
            .get(token)
            .and_then(|s| s.get(spender))
            .copied()
            .unwrap_or(0)
    }
}

#[derive(Clone, Debug, Default)]
struct LedgerState {
    tokens: HashMap<TokenId, Token>,
    accounts: HashMap<AccountId, Account>,
}

/// Opaque copy of the ledger state
#[derive(Clone, Debug)]
pub struct LedgerSnapshot(LedgerState);

/// Multi-token balance ledger
pub struct TokenLedger {
    state: RwLock<LedgerState>,
}

impl TokenLedger {
    /// Create a ledger with the native currency registered
    pub fn new() -> Self {
        let mut tokens = HashMap::new();
        tokens.insert(
            TokenId::NATIVE,
            Token {
                id: TokenId::NATIVE,
                symbol: "ETH".to_string(),
                name: "Native Currency".to_string(),
                decimals: 18,
                total_supply: 0,
            },
        );

        Self {
            state: RwLock::new(LedgerState {
                tokens,
                accounts: HashMap::new(),
            }),
        }
    }

    /// Register a token; returns its id. Registering twice is a no-op.
    pub fn register_token(&self, symbol: &str, name: &str, decimals: u8) -> TokenId {
        let id = TokenId::from_symbol(symbol);
        self.state.write().tokens.entry(id).or_insert_with(|| Token {
            id,
            symbol: symbol.to_ascii_uppercase(),
            name: name.to_string(),
            decimals,
            total_supply: 0,
        });
        id
    }

    /// Create new supply (genesis distribution, test funding)
    ///
    /// Supply and balance are both checked before either is written.
    pub fn mint(&self, token: &TokenId, to: &AccountId, amount: Amount) -> Result<()> {
        let mut state = self.state.write();
        let supply = state
            .tokens
            .get(token)
            .ok_or_else(|| RewardsError::TransferFailed(format!("unknown token {}", token)))?
            .total_supply
            .checked_add(amount)
            .ok_or(RewardsError::Overflow("total supply"))?;
        let balance = state
            .accounts
            .get(to)
            .and_then(|acc| acc.balances.get(token))
            .copied()
            .unwrap_or(0)
            .checked_add(amount)
            .ok_or(RewardsError::Overflow("balance"))?;

        if let Some(info) = state.tokens.get_mut(token) {
            info.total_supply = supply;
        }
        state.accounts.entry(*to).or_default().balances.insert(*token, balance);
        Ok(())
    }

    /// Move tokens between accounts
    pub fn transfer(
        &self,
        token: &TokenId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<()> {
        let mut state = self.state.write();
        Self::move_balance(&mut state, token, from, to, amount)
    }

    /// Grant `spender` the right to move up to `amount` of the owner's tokens
    pub fn approve(
        &self,
        token: &TokenId,
        owner: &AccountId,
        spender: &AccountId,
        amount: Amount,
    ) -> Result<()> {
        let mut state = self.state.write();
        if !state.tokens.contains_key(token) {
            return Err(RewardsError::TransferFailed(format!("unknown token {}", token)));
        }
        state
            .accounts
            .entry(*owner)
            .or_default()
            .allowances
            .entry(*token)
            .or_default()
            .insert(*spender, amount);
        Ok(())
    }

    /// Move tokens on behalf of `from`, consuming allowance granted to `spender`
    pub fn transfer_from(
        &self,
        token: &TokenId,
        spender: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<()> {
        let mut state = self.state.write();

        let allowance = state
            .accounts
            .get(from)
            .map(|acc| acc.allowance(token, spender))
            .unwrap_or(0);
        if allowance < amount {
            return Err(RewardsError::TransferFailed(format!(
                "insufficient allowance: approved {}, requested {}",
                allowance, amount
            )));
        }

        Self::move_balance(&mut state, token, from, to, amount)?;

        if let Some(spenders) = state
            .accounts
            .get_mut(from)
            .and_then(|acc| acc.allowances.get_mut(token))
        {
            spenders.insert(*spender, allowance - amount);
        }
        Ok(())
    }

    pub fn balance_of(&self, account: &AccountId, token: &TokenId) -> Amount {
        self.state
            .read()
            .accounts
            .get(account)
            .map(|acc| acc.balance(token))
            .unwrap_or(0)
    }

    pub fn allowance(&self, token: &TokenId, owner: &AccountId, spender: &AccountId) -> Amount {
        self.state
            .read()
            .accounts
            .get(owner)
            .map(|acc| acc.allowance(token, spender))
            .unwrap_or(0)
    }

    pub fn total_supply(&self, token: &TokenId) -> Amount {
        self.state
            .read()
            .tokens
            .get(token)
            .map(|t| t.total_supply)
            .unwrap_or(0)
    }

    pub fn get_token(&self, token: &TokenId) -> Option<Token> {
        self.state.read().tokens.get(token).cloned()
    }

    pub fn symbol_of(&self, token: &TokenId) -> String {
        self.state
            .read()
            .tokens
            .get(token)
            .map(|t| t.symbol.clone())
            .unwrap_or_else(|| token.to_string())
    }

    /// Copy the full ledger state
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot(self.state.read().clone())
    }

    /// Replace the ledger state with an earlier snapshot
    pub fn restore(&self, snapshot: LedgerSnapshot) {
        *self.state.write() = snapshot.0;
    }

    // === Internal helpers ===

    fn move_balance(
        state: &mut LedgerState,
        token: &TokenId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<()> {
        if !state.tokens.contains_key(token) {
            return Err(RewardsError::TransferFailed(format!("unknown token {}", token)));
        }

        let available = state
            .accounts
            .get(from)
            .map(|acc| acc.balance(token))
            .unwrap_or(0);
        if available < amount {
            return Err(RewardsError::TransferFailed(format!(
                "insufficient balance: {} has {}, requested {}",
                from, available, amount
            )));
        }
        if from == to || amount == 0 {
            return Ok(());
        }

        let credited = state
            .accounts
            .get(to)
            .map(|acc| acc.balance(token))
            .unwrap_or(0)
            .checked_add(amount)
            .ok_or(RewardsError::Overflow("balance"))?;

        state
            .accounts
            .entry(*from)
            .or_default()
            .balances
            .insert(*token, available - amount);
        state
            .accounts
            .entry(*to)
            .or_default()
            .balances
            .insert(*token, credited);
        Ok(())
    }
}

impl Default for TokenLedger {
    fn default() -> Self {
        Self::new()
    }
}
