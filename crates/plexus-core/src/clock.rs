//! Block clock
//!
//! Reward accrual is lazy: nothing ticks in the background, every operation
//! reads the current block time from a [`Clock`] and stores it on the lots it
//! creates. Tests and simulations use [`BlockClock`] and mine blocks by hand.

use crate::types::{BlockNumber, Timestamp};
use serde::{Deserialize, Serialize};

/// Default seconds between blocks (Ethereum mainnet average)
pub const DEFAULT_BLOCK_INTERVAL_SECS: u64 = 13;

/// Source of block height and block time
pub trait Clock: Send + Sync {
    /// Current block time in unix seconds
    fn now(&self) -> Timestamp;

    /// Current block height
    fn block_number(&self) -> BlockNumber;
}

/// Wall-clock time, block number derived from the interval
#[derive(Clone, Debug)]
pub struct SystemClock {
    genesis: Timestamp,
    block_interval: u64,
}

impl SystemClock {
    pub fn new(genesis: Timestamp, block_interval: u64) -> Self {
        Self {
            genesis,
            block_interval: block_interval.max(1),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new(chrono::Utc::now().timestamp(), DEFAULT_BLOCK_INTERVAL_SECS)
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        chrono::Utc::now().timestamp()
    }

    fn block_number(&self) -> BlockNumber {
        let elapsed = (self.now() - self.genesis).max(0) as u64;
        elapsed / self.block_interval
    }
}

/// Snapshot of the manual clock
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub number: BlockNumber,
    pub timestamp: Timestamp,
}

/// Manually driven clock
///
/// Each mined block advances time by the block interval.
pub struct BlockClock {
    head: parking_lot::Mutex<BlockHeader>,
    block_interval: u64,
}

impl BlockClock {
    /// Create a clock at block 0 with the given genesis time
    pub fn new(genesis: Timestamp, block_interval: u64) -> Self {
        Self {
            head: parking_lot::Mutex::new(BlockHeader {
                number: 0,
                timestamp: genesis,
            }),
            block_interval,
        }
    }

    pub fn head(&self) -> BlockHeader {
        *self.head.lock()
    }

    pub fn block_interval(&self) -> u64 {
        self.block_interval
    }

    /// Mine `count` empty blocks
    pub fn mine_blocks(&self, count: u64) -> BlockHeader {
        let mut head = self.head.lock();
        let elapsed = count.saturating_mul(self.block_interval);
        head.number = head.number.saturating_add(count);
        head.timestamp = head
            .timestamp
            .saturating_add(Timestamp::try_from(elapsed).unwrap_or(Timestamp::MAX));
        tracing::debug!(
            "Mined {} blocks, head #{} at {}",
            count,
            head.number,
            head.timestamp
        );
        *head
    }

    /// Jump forward in time without changing the height
    pub fn advance_time(&self, seconds: u64) -> BlockHeader {
        let mut head = self.head.lock();
        head.timestamp = head
            .timestamp
            .saturating_add(Timestamp::try_from(seconds).unwrap_or(Timestamp::MAX));
        *head
    }
}

impl Default for BlockClock {
    fn default() -> Self {
        Self::new(0, DEFAULT_BLOCK_INTERVAL_SECS)
    }
}

impl Clock for BlockClock {
    fn now(&self) -> Timestamp {
        self.head.lock().timestamp
    }

    fn block_number(&self) -> BlockNumber {
        self.head.lock().number
    }
}
