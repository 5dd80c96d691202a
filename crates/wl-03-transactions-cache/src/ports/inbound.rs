//! # Inbound Ports (Driving Ports)
//!
//! Notifications delivered by the chain synchronizer.

use std::collections::VecDeque;

use shared_types::{BlockHeight, Hash};

use crate::domain::{CacheError, CacheEvent, DepositOutput, TransactionInfo};

/// Receiver of chain-sync notifications.
///
/// Implementations serialize calls internally; every method takes `&self`
/// so one observer can be shared between the sync loop and the UI.
pub trait ChainObserver: Send + Sync {
    /// A transaction touching the wallet was confirmed (or re-reported).
    ///
    /// ## Errors
    ///
    /// - `UnknownDepositOutput`: a withdrawn deposit is not indexed
    /// - `DepositAlreadySpent`: another transaction already withdrew it
    /// - `Ledger`: the deposit or asset ledger rejected the effects
    ///
    /// A failed call leaves the cache untouched.
    fn on_transaction_updated(
        &self,
        info: &TransactionInfo,
        balance_delta: i64,
        new_deposits: &[DepositOutput],
        spent_deposits: &[DepositOutput],
    ) -> Result<VecDeque<CacheEvent>, CacheError>;

    /// A transaction left the chain or the pool. Unknown hashes and repeated
    /// deletions yield no events.
    fn on_transaction_deleted(&self, hash: &Hash) -> VecDeque<CacheEvent>;

    /// Blocks at or above `from_height` were detached. Returns the number of
    /// deposit-ledger blocks rolled back.
    fn on_blocks_detached(&self, from_height: BlockHeight) -> u32;

    /// A sync round finished; outdated pending transactions are evicted.
    fn on_synchronization_completed(&self) -> VecDeque<CacheEvent>;
}
