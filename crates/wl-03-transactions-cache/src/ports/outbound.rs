//! Outbound (Driven) ports for the transactions cache.
//!
//! These traits define what the cache needs from the embedding wallet:
//! currency rules, a snapshot encoding and a place to keep the bytes.

use shared_types::BlockHeight;

use crate::domain::{CacheSnapshot, CodecError, StoreError};

/// Currency-specific deposit and display rules.
pub trait CurrencyRules: Send + Sync {
    /// Interest earned by a deposit of `amount` locked for `term` blocks,
    /// created at `height`.
    fn calculate_interest(&self, amount: u64, term: u32, height: BlockHeight) -> u64;

    /// Renders an amount in whole units for logs and UIs.
    fn format_amount(&self, amount: i64) -> String;
}

/// Turns a cache snapshot into bytes and back.
pub trait SnapshotCodec: Send + Sync {
    /// Short codec name for logs.
    fn name(&self) -> &'static str;

    /// Serializes `snapshot`.
    fn encode(&self, snapshot: &CacheSnapshot) -> Result<Vec<u8>, CodecError>;

    /// Parses bytes written by [`encode`](Self::encode).
    fn decode(&self, bytes: &[u8]) -> Result<CacheSnapshot, CodecError>;
}

/// Durable home of the encoded snapshot.
pub trait SnapshotStore: Send + Sync {
    /// Replaces the stored snapshot.
    fn save(&self, bytes: &[u8]) -> Result<(), StoreError>;

    /// Returns the stored snapshot, or `None` if nothing was saved yet.
    fn load(&self) -> Result<Option<Vec<u8>>, StoreError>;
}

/// Interest of one unit per started thousand, for unit tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MockCurrency;

#[cfg(test)]
impl CurrencyRules for MockCurrency {
    fn calculate_interest(&self, amount: u64, _term: u32, _height: BlockHeight) -> u64 {
        amount.div_ceil(1_000)
    }

    fn format_amount(&self, amount: i64) -> String {
        amount.to_string()
    }
}
