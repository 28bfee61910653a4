//! # Plexus Coordinator
//!
//! Orchestrates deposits, withdrawals and conversions across the token
//! ledger, the tier adapters, the conversion router and the rewards engine.
//!
//! ## Modules
//!
//! - `coordinator` - atomic entry points and receipts
//! - `tier` - custody adapters and their registry
//! - `router` - native-to-token conversion
//! - `guard` - reentrancy guard
//! - `config` / `deploy` - TOML configuration and in-memory deployment
//! - `scenario` - end-to-end lifecycle used by the CLI

pub mod config;
pub mod coordinator;
pub mod deploy;
pub mod guard;
pub mod router;
pub mod scenario;
pub mod tier;

pub use config::{ConfigError, PlexusConfig};
pub use coordinator::{ConvertOrder, Coordinator, Receipt, TransactionStatus, Withdrawal};
pub use deploy::Deployment;
pub use guard::ReentrancyGuard;
pub use router::{ConversionReceipt, ConvertRequest, FixedRateRouter, Router};
pub use scenario::{ScenarioParams, ScenarioReport};
pub use tier::{CustodyTier, TierAdapter, TierRegistry};
