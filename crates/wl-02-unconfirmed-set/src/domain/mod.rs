//! # Domain Layer - Unconfirmed Transaction Set
//!
//! ## Components
//!
//! - `entities`: PendingTransaction, PendingDepositSpending, UnconfirmedSnapshot
//! - `set`: UnconfirmedTransactionSet with output reservation and TTL eviction
//! - `errors`: UnconfirmedError enumeration

pub mod entities;
pub mod errors;
pub mod set;

pub use entities::*;
pub use errors::*;
pub use set::*;
