//! Core type definitions for Plexus
//!
//! Identifiers are 32-byte values, the same width as an on-chain address
//! hash, so accounts and tokens can be derived deterministically from a
//! human-readable label in tests and configuration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Token amount in smallest units (wei-like)
pub type Amount = u128;

/// Unix timestamp in seconds
pub type Timestamp = i64;

/// Block height
pub type BlockNumber = u64;

/// One whole token with 18 decimals
pub const ONE_TOKEN: Amount = 1_000_000_000_000_000_000;

/// Fixed-point precision of APR values: 100_000 = 100%
pub const APR_PRECISION: u128 = 100_000;

/// 365 days, no leap adjustment
pub const SECONDS_PER_YEAR: u128 = 365 * 24 * 3600;

/// AccountId - identity of a user, contract or custody account
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct AccountId {
    id: [u8; 32],
}

impl AccountId {
    pub fn new(id: [u8; 32]) -> Self {
        Self { id }
    }

    /// Derive an account from a label using BLAKE3
    pub fn from_label(label: &str) -> Self {
        let hash = blake3::hash(label.as_bytes());
        Self {
            id: *hash.as_bytes(),
        }
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.id
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.id)
    }

    /// Parse from hex string
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut id = [0u8; 32];
        id.copy_from_slice(&bytes);
        Ok(Self { id })
    }

    pub const ZERO: Self = Self { id: [0u8; 32] };
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({})", &self.to_hex()[..12])
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", &self.to_hex()[..12])
    }
}

/// TokenId - identifier of a fungible token
///
/// The all-zero id is reserved for the native currency.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct TokenId {
    id: [u8; 32],
}

impl TokenId {
    pub fn new(id: [u8; 32]) -> Self {
        Self { id }
    }

    /// Derive a token id from its symbol
    pub fn from_symbol(symbol: &str) -> Self {
        let mut input = b"plexus-token:".to_vec();
        input.extend_from_slice(symbol.to_ascii_uppercase().as_bytes());
        Self {
            id: *blake3::hash(&input).as_bytes(),
        }
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.id
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.id)
    }

    pub fn is_native(&self) -> bool {
        *self == Self::NATIVE
    }

    /// Native currency (ETH-like value sent with a call)
    pub const NATIVE: Self = Self { id: [0u8; 32] };
}

impl fmt::Debug for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_native() {
            write!(f, "TokenId(native)")
        } else {
            write!(f, "TokenId({})", &self.to_hex()[..12])
        }
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_native() {
            write!(f, "native")
        } else {
            write!(f, "0x{}", &self.to_hex()[..12])
        }
    }
}

/// Format an amount as whole tokens with 18 decimals, trimming zeros
pub fn format_units(amount: Amount) -> String {
    let whole = amount / ONE_TOKEN;
    let frac = amount % ONE_TOKEN;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{:018}", frac);
    format!("{}.{}", whole, frac.trim_end_matches('0'))
}

/// Parse whole-token units ("2", "0.5") into smallest units
pub fn parse_units(s: &str) -> Option<Amount> {
    let (whole, frac) = match s.split_once('.') {
        Some((w, f)) => (w, f),
        None => (s, ""),
    };
    if frac.len() > 18 || (whole.is_empty() && frac.is_empty()) {
        return None;
    }
    let whole: Amount = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let frac_value: Amount = if frac.is_empty() {
        0
    } else {
        format!("{:0<18}", frac).parse().ok()?
    };
    whole.checked_mul(ONE_TOKEN)?.checked_add(frac_value)
}
