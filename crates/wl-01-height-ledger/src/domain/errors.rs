//! # Domain Errors
//!
//! Every variant is an invariant violation: callers only push deltas that
//! were already validated against the chain.

use thiserror::Error;

/// Height-indexed ledger error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// `pop_block` on a ledger with no blocks.
    #[error("Cannot pop a block from an empty ledger")]
    Empty,

    /// The running cumulative amount would drop below zero.
    #[error("Cumulative amount would become negative at height {height}: {balance}")]
    NegativeBalance {
        /// Block height of the offending delta
        height: u32,
        /// Resulting cumulative amount
        balance: i64,
    },

    /// The running cumulative amount would overflow i64.
    #[error("Cumulative amount overflow at height {height} (delta {delta})")]
    AmountOverflow {
        /// Block height of the offending delta
        height: u32,
        /// Delta being applied
        delta: i64,
    },

    /// The auxiliary aggregate would overflow u64.
    #[error("Auxiliary overflow at height {height}")]
    AuxiliaryOverflow {
        /// Block height of the offending value
        height: u32,
    },

    /// The block count cannot grow past `u32::MAX`.
    #[error("Block count overflow")]
    HeightOverflow,

    /// A height-addressed update targeted a block older than the tip.
    #[error("Height {height} is behind the ledger tip {tip}")]
    HeightBehindTip {
        /// Requested height
        height: u32,
        /// Current tip block
        tip: u32,
    },

    /// Snapshot entries are not strictly increasing by height.
    #[error("Snapshot entry {position} is not above the previous height")]
    UnorderedEntries {
        /// Offset of the offending entry
        position: usize,
    },

    /// Snapshot entry lies at or beyond the snapshot's block count.
    #[error("Snapshot entry at height {height} is beyond block count {block_count}")]
    EntryBeyondBlockCount {
        /// Entry height
        height: u32,
        /// Declared block count
        block_count: u32,
    },

    /// Snapshot entry carries a negative cumulative amount.
    #[error("Snapshot entry at height {height} has negative amount {amount}")]
    NegativeEntry {
        /// Entry height
        height: u32,
        /// Stored cumulative amount
        amount: i64,
    },
}
