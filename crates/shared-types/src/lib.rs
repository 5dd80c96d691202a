//! # Shared Types Crate
//!
//! Types shared by every wallet-ledger crate.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: ids, hashes and transaction variants are
//!   defined once, here.
//! - **Stable Ids**: `TransactionId`, `TransferId` and `DepositId` are
//!   offsets into append-only collections and are never reused.
//! - **Closed Variants**: transaction inputs and output targets are enums,
//!   matched exhaustively.

pub mod entities;
pub mod errors;
pub mod extra;
pub mod transaction;

pub use entities::*;
pub use errors::*;
pub use extra::{payment_id_from_extra, ExtraField};
pub use transaction::*;
