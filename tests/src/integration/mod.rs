//! # Integration Flows
//!
//! Each module drives one [`SharedTransactionsCache`] through a sequence of
//! local calls and chain notifications and checks the events, records,
//! balances and ledgers that come out the other side.
//!
//! [`SharedTransactionsCache`]: wl_03_transactions_cache::SharedTransactionsCache

pub mod lifecycle;
pub mod persistence;
pub mod reorg;
