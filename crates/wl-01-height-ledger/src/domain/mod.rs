//! # Domain Layer - Height-Indexed Ledger
//!
//! ## Components
//!
//! - `entities`: LedgerEntry, LedgerSnapshot
//! - `aggregation`: AuxiliaryRule with the accumulate and latest-wins rules
//! - `ledger`: HeightIndexedLedger, DepositLedger, AssetLedger
//! - `errors`: LedgerError enumeration

pub mod aggregation;
pub mod entities;
pub mod errors;
pub mod ledger;

pub use aggregation::*;
pub use entities::*;
pub use errors::*;
pub use ledger::*;
