//! # Ledger Entities
//!
//! The stored entry and the persisted snapshot layout.

use serde::{Deserialize, Serialize};

/// Cumulative values as of the end of block `height`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    /// Block height this entry closes.
    pub height: u32,
    /// Running sum of every amount delta up to and including `height`.
    pub cumulative_amount: i64,
    /// Aggregated auxiliary value (interest sum or latest asset id).
    pub cumulative_auxiliary: u64,
}

/// Persisted layout of a ledger: `blockCount` followed by the entries in
/// height order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSnapshot {
    /// Number of blocks accounted for.
    pub block_count: u32,
    /// Stored entries, ascending by height.
    pub index: Vec<LedgerEntry>,
}
