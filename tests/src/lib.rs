//! # Deposit Wallet Ledger Test Suite
//!
//! Cross-component flows driven through the transactions cache the way a
//! wallet's sync loop would drive it.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs       # Tracing setup, deterministic hashes, chain builders
//! └── integration/
//!     ├── lifecycle.rs  # Incoming payments, local sends, deposit create/withdraw
//!     ├── reorg.rs      # Detach, delete, re-mine
//!     └── persistence.rs# Snapshot save/restore across restarts
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p wl-tests
//!
//! # By flow
//! cargo test -p wl-tests integration::reorg::
//!
//! # With logs
//! RUST_LOG=debug cargo test -p wl-tests -- --nocapture
//! ```

pub mod fixtures;
pub mod integration;
