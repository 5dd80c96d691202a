//! # WL-01 Height-Indexed Ledger
//!
//! Sparse, rollback-capable cumulative index over block height.
//!
//! **Component ID:** 1
//! **Architecture:** Pure domain crate (no ports, no I/O)
//! **Status:** Production-Ready
//!
//! ## Purpose
//!
//! Answers "what was the cumulative locked amount, and the accrued interest,
//! as of the end of block H". Blockchains only append or truncate a suffix,
//! so the ledger supports exactly that: push one block, pop one block, or
//! pop every block from a fork height.
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement Location |
//! |-----------|---------------------|
//! | Entries strictly ascending by height | `push_block()`, `from_snapshot()` |
//! | Entry heights below `block_count` | `pop_block()`, `pop_blocks()` |
//! | Cumulative amount never negative | `next_entry()`, `plan_record()` |
//! | Failed mutation leaves state untouched | validate-then-write in every mutator |
//!
//! ## Operations
//!
//! | Operation | Cost | Effect |
//! |-----------|------|--------|
//! | `push_block(delta, aux)` | O(1) amortized | Append one block |
//! | `pop_block()` | O(1) | Revert the last block |
//! | `pop_blocks(from)` | O(log n + k) | Truncate the suffix from `from` |
//! | `record_at(height, delta, aux)` | O(1) amortized | Pad or fold into the tip |
//! | `amount_at_height(h)` | O(log n) | Point-in-time query |
//!
//! ## Ledger Flavours
//!
//! ```text
//! HeightIndexedLedger<R: AuxiliaryRule>
//!        │
//!        ├── DepositLedger = <AccumulateAuxiliary>   interest sums
//!        └── AssetLedger   = <LatestAuxiliary>       last asset id wins
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod domain;

// Re-exports
pub use domain::{
    AccumulateAuxiliary, AssetLedger, AuxiliaryRule, DepositLedger, HeightIndexedLedger,
    LatestAuxiliary, LedgerEntry, LedgerError, LedgerSnapshot,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
