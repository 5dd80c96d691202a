//! # WL-02 Unconfirmed Transaction Set
//!
//! Locally originated transactions that the chain has not confirmed yet.
//!
//! **Component ID:** 2
//! **Architecture:** Hexagonal (domain + outbound time port)
//! **Status:** Production-Ready
//!
//! ## Purpose
//!
//! Keeps a locally built transaction's consumed outputs reserved until the
//! transaction confirms, fails, or ages out, so that no second local
//! transaction can spend them. Also records the deposits a pending
//! transaction will create or withdraw, so pending balances reflect them
//! before confirmation.
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement Location |
//! |-----------|---------------------|
//! | An output is reserved by at most one entry | `domain/set.rs` - `insert()` |
//! | Entry removal releases its outputs in the same step | `domain/set.rs` - `release()` |
//! | Eviction is pull-based, each entry evicted once | `delete_outdated_transactions()` |
//!
//! ## Entry Lifecycle
//!
//! ```text
//! add() ──→ [PENDING] ──erase()──────────────────→ (released)
//!               │
//!               └── delete_outdated_transactions() ──→ (released, id returned)
//! ```
//!
//! ## Module Structure
//!
//! ```text
//! wl-02-unconfirmed-set/
//! ├── domain/          # PendingTransaction, UnconfirmedTransactionSet, errors
//! ├── ports/           # TimeSource (SystemTimeSource, ManualTimeSource)
//! └── config.rs        # UnconfirmedSetConfig
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod domain;
pub mod ports;

// Re-exports
pub use config::{UnconfirmedSetConfig, DEFAULT_LIVE_TIME_SECS};
pub use domain::{
    PendingCreatedDeposit, PendingDepositSpending, PendingTransaction, SpentDepositDetails,
    UnconfirmedError, UnconfirmedSnapshot, UnconfirmedTransactionSet,
};
pub use ports::{ManualTimeSource, SystemTimeSource, TimeSource};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
