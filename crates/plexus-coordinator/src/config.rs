//! Deployment configuration
//!
//! Amounts are whole tokens (18 decimals are applied at setup).

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to render config: {0}")]
    Render(#[from] toml::ser::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Complete deployment configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlexusConfig {
    /// Block clock
    #[serde(default)]
    pub chain: ChainConfig,

    /// Reward engine
    #[serde(default)]
    pub rewards: RewardsConfig,

    /// Conversion router
    #[serde(default)]
    pub router: RouterConfig,

    /// Deposit tokens
    #[serde(default = "default_tokens")]
    pub tokens: Vec<TokenConfig>,

    /// Custody tiers
    #[serde(default = "default_tiers")]
    pub tiers: Vec<TierConfig>,

    /// Logging
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for PlexusConfig {
    fn default() -> Self {
        Self {
            chain: ChainConfig::default(),
            rewards: RewardsConfig::default(),
            router: RouterConfig::default(),
            tokens: default_tokens(),
            tiers: default_tiers(),
            logging: LoggingConfig::default(),
        }
    }
}

impl PlexusConfig {
    /// Read, parse and validate a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chain.block_interval == 0 {
            return Err(ConfigError::Invalid("block_interval must be positive".to_string()));
        }
        if self.rewards.treasury_funding > self.rewards.genesis_supply {
            return Err(ConfigError::Invalid(format!(
                "treasury_funding {} exceeds genesis_supply {}",
                self.rewards.treasury_funding, self.rewards.genesis_supply
            )));
        }

        let reserved = [
            self.rewards.reward_token.to_ascii_uppercase(),
            self.router.wrapped_native.to_ascii_uppercase(),
        ];
        let mut symbols = HashSet::new();
        for token in &self.tokens {
            let symbol = token.symbol.to_ascii_uppercase();
            if symbol.is_empty() {
                return Err(ConfigError::Invalid("token symbol is empty".to_string()));
            }
            if reserved.contains(&symbol) {
                return Err(ConfigError::Invalid(format!("token {} shadows a system token", symbol)));
            }
            if token.native_rate == 0 {
                return Err(ConfigError::Invalid(format!("token {} has zero native_rate", symbol)));
            }
            if !symbols.insert(symbol.clone()) {
                return Err(ConfigError::Invalid(format!("duplicate token {}", symbol)));
            }
        }

        let mut tiers = HashSet::new();
        let mut custodians: HashMap<String, &str> = HashMap::new();
        for tier in &self.tiers {
            if !tiers.insert(tier.name.as_str()) {
                return Err(ConfigError::Invalid(format!("duplicate tier {}", tier.name)));
            }
            for symbol in &tier.tokens {
                let symbol = symbol.to_ascii_uppercase();
                if !symbols.contains(&symbol) {
                    return Err(ConfigError::Invalid(format!(
                        "tier {} references unknown token {}",
                        tier.name, symbol
                    )));
                }
                if let Some(holder) = custodians.insert(symbol.clone(), tier.name.as_str()) {
                    if holder != tier.name {
                        return Err(ConfigError::Invalid(format!(
                            "token {} is held by both tier {} and tier {}",
                            symbol, holder, tier.name
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Block time of block 0 (unix seconds)
    #[serde(default = "default_genesis_timestamp")]
    pub genesis_timestamp: i64,

    /// Seconds per mined block
    #[serde(default = "default_block_interval")]
    pub block_interval: u64,
}

fn default_genesis_timestamp() -> i64 {
    1_600_000_000
}

fn default_block_interval() -> u64 {
    plexus_core::DEFAULT_BLOCK_INTERVAL_SECS
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            genesis_timestamp: default_genesis_timestamp(),
            block_interval: default_block_interval(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RewardsConfig {
    /// Label the administrator account is derived from
    #[serde(default = "default_admin")]
    pub admin: String,

    /// Symbol of the reward token
    #[serde(default = "default_reward_token")]
    pub reward_token: String,

    #[serde(default = "default_reward_token_name")]
    pub reward_token_name: String,

    /// Reward tokens minted to the administrator
    #[serde(default = "default_genesis_supply")]
    pub genesis_supply: u64,

    /// Reward tokens the simulation moves into the treasury
    #[serde(default = "default_treasury_funding")]
    pub treasury_funding: u64,

    /// APR applied by the simulation (100_000 = 100%)
    #[serde(default = "default_apr")]
    pub default_apr: u64,
}

fn default_admin() -> String {
    "owner".to_string()
}

fn default_reward_token() -> String {
    "PLX".to_string()
}

fn default_reward_token_name() -> String {
    "Plexus Coin".to_string()
}

fn default_genesis_supply() -> u64 {
    1_000_000
}

fn default_treasury_funding() -> u64 {
    950_000
}

fn default_apr() -> u64 {
    40_000
}

impl Default for RewardsConfig {
    fn default() -> Self {
        Self {
            admin: default_admin(),
            reward_token: default_reward_token(),
            reward_token_name: default_reward_token_name(),
            genesis_supply: default_genesis_supply(),
            treasury_funding: default_treasury_funding(),
            default_apr: default_apr(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Symbol every conversion path starts at
    #[serde(default = "default_wrapped_native")]
    pub wrapped_native: String,

    /// Router liquidity minted per deposit token
    #[serde(default = "default_liquidity")]
    pub liquidity: u64,
}

fn default_wrapped_native() -> String {
    "WETH".to_string()
}

fn default_liquidity() -> u64 {
    10_000_000
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            wrapped_native: default_wrapped_native(),
            liquidity: default_liquidity(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenConfig {
    pub symbol: String,

    #[serde(default)]
    pub name: String,

    /// Whole tokens per native unit
    pub native_rate: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TierConfig {
    pub name: String,

    /// Symbols this tier holds
    pub tokens: Vec<String>,
}

fn default_tokens() -> Vec<TokenConfig> {
    [("FARM", "Harvest Farm", 20), ("DAI", "Dai Stablecoin", 2_000), ("PICKLE", "Pickle Token", 150)]
        .into_iter()
        .map(|(symbol, name, native_rate)| TokenConfig {
            symbol: symbol.to_string(),
            name: name.to_string(),
            native_rate,
        })
        .collect()
}

fn default_tiers() -> Vec<TierConfig> {
    ["FARM", "DAI", "PICKLE"]
        .into_iter()
        .map(|symbol| TierConfig {
            name: symbol.to_string(),
            tokens: vec![symbol.to_string()],
        })
        .collect()
}

/// Logging configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format ("text" or "json")
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}
