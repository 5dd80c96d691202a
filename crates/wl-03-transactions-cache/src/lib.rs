//! # WL-03 Transactions Cache
//!
//! **Component ID:** 3
//! **Architecture:** Hexagonal (domain, ports, adapters, application)
//! **Status:** Production-Ready
//!
//! ## Purpose
//!
//! Owns the wallet's transaction history: locally sent transactions,
//! external transactions discovered on chain, their transfers, and the term
//! deposits they create or withdraw. Chain-sync notifications are reconciled
//! against this state, including reorgs, and every change is reported back
//! as an ordered queue of [`CacheEvent`]s.
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement Location |
//! |-----------|---------------------|
//! | Ids are stable array offsets, never reused | `domain/cache.rs` - records are never removed |
//! | Failed notifications mutate nothing | `domain/reconcile.rs` - plan, validate, then apply |
//! | Deposit output resolves to one deposit | `domain/cache.rs` - `deposit_index` |
//! | Repeated deletions are no-ops | `domain/reconcile.rs` - `on_transaction_deleted()` |
//! | Ledgers only roll back on detach | `domain/reconcile.rs` - `on_blocks_detached()` |
//!
//! ## Transaction Lifecycle
//!
//! ```text
//! add_new_transaction() ──→ [SENDING] ──update_transaction()──→ (outputs reserved)
//!                               │
//!          update_transaction_sending_state()
//!                   ├── Ok  ──→ [ACTIVE] ──on_transaction_updated()──→ [ACTIVE @ h]
//!                   └── Err ──→ [FAILED] / [CANCELLED]                     │
//!                                                                           │
//!          [DELETED] ←── on_transaction_deleted() / TTL ────────────────────┘
//! ```
//!
//! | Notification | Method | Effect |
//! |--------------|--------|--------|
//! | Confirmed | `on_transaction_updated()` | Record active, deposits created/spent, ledgers extended |
//! | Removed | `on_transaction_deleted()` | Record deleted, deposit states corrected |
//! | Reorg | `on_blocks_detached()` | Ledgers popped, records above the fork unconfirmed |
//! | Sync done | `on_synchronization_completed()` | Outdated pending transactions deleted |
//!
//! ## Outbound Dependencies
//!
//! | Trait | Purpose | Adapters |
//! |-------|---------|----------|
//! | `CurrencyRules` | Deposit interest, amount formatting | `SimpleInterestCurrency` |
//! | `SnapshotCodec` | Snapshot encoding | `BincodeCodec`, `JsonCodec` |
//! | `SnapshotStore` | Snapshot bytes | `InMemorySnapshotStore`, `FileSnapshotStore` |
//! | `TimeSource` | Send and eviction times | `SystemTimeSource`, `ManualTimeSource` |
//!
//! ## Module Structure
//!
//! ```text
//! wl-03-transactions-cache/
//! ├── domain/          # records, TransactionsCache, reconciliation, snapshot
//! ├── ports/           # ChainObserver; CurrencyRules, SnapshotCodec, SnapshotStore
//! ├── adapters/        # codecs, stores, simple-interest currency
//! ├── application/     # SharedTransactionsCache (RwLock service)
//! └── config.rs        # CacheConfig
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports
pub use adapters::{
    BincodeCodec, FileSnapshotStore, InMemorySnapshotStore, JsonCodec, SimpleInterestCurrency,
};
pub use application::SharedTransactionsCache;
pub use config::{CacheConfig, DEFAULT_LEDGER_CAPACITY_HINT};
pub use domain::{
    AssetDelta, CacheError, CacheEvent, CacheSnapshot, CodecError, Deposit, DepositBalance,
    DepositKey, DepositOutput, DepositState, PaymentIndex, Payments, PendingBalance, SendFailure,
    StoreError, TransactionInfo, TransactionRecord, TransactionState, TransactionsCache,
    TransferRecord, CACHE_SNAPSHOT_VERSION,
};
pub use ports::{ChainObserver, CurrencyRules, SnapshotCodec, SnapshotStore};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
