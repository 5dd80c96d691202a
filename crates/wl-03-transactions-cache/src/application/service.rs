//! # Shared Transactions Cache
//!
//! Thread-safe facade over [`TransactionsCache`]. Queries take the read
//! lock; every mutating call holds the write lock for its whole duration,
//! so observers never see half-applied notifications.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::RwLock;
use shared_types::{BlockHeight, DepositId, Hash, PaymentId, Transaction, TransactionId, UsedOutput};
use tracing::{debug, info};
use wl_02_unconfirmed_set::{SpentDepositDetails, TimeSource};

use crate::config::CacheConfig;
use crate::domain::{
    CacheError, CacheEvent, DepositBalance, DepositKey, DepositOutput, Payments, PendingBalance,
    SendFailure, TransactionInfo, TransactionRecord, TransactionsCache, TransferRecord,
};
use crate::ports::{ChainObserver, CurrencyRules, SnapshotCodec, SnapshotStore};

/// Transactions cache behind a `parking_lot::RwLock`.
pub struct SharedTransactionsCache {
    inner: RwLock<TransactionsCache>,
    currency: Arc<dyn CurrencyRules>,
}

impl SharedTransactionsCache {
    /// Creates an empty shared cache.
    pub fn new(
        config: CacheConfig,
        time_source: Arc<dyn TimeSource>,
        currency: Arc<dyn CurrencyRules>,
    ) -> Self {
        Self::from_cache(TransactionsCache::new(config, time_source), currency)
    }

    /// Wraps an existing cache, e.g. one restored from a snapshot.
    pub fn from_cache(cache: TransactionsCache, currency: Arc<dyn CurrencyRules>) -> Self {
        Self {
            inner: RwLock::new(cache),
            currency,
        }
    }

    /// Unwraps the cache.
    pub fn into_inner(self) -> TransactionsCache {
        self.inner.into_inner()
    }

    /// Runs `f` under the read lock.
    pub fn read<R>(&self, f: impl FnOnce(&TransactionsCache) -> R) -> R {
        f(&self.inner.read())
    }

    /// Runs `f` under the write lock.
    pub fn write<R>(&self, f: impl FnOnce(&mut TransactionsCache) -> R) -> R {
        f(&mut self.inner.write())
    }

    // =========================================================================
    // LOCAL SENDS
    // =========================================================================

    /// See [`TransactionsCache::add_new_transaction`].
    pub fn add_new_transaction(
        &self,
        amount: u64,
        fee: u64,
        extra: Vec<u8>,
        transfers: &[TransferRecord],
        unlock_time: u64,
        messages: Vec<String>,
    ) -> Result<TransactionId, CacheError> {
        self.inner
            .write()
            .add_new_transaction(amount, fee, extra, transfers, unlock_time, messages)
    }

    /// See [`TransactionsCache::update_transaction`].
    pub fn update_transaction(
        &self,
        transaction_id: TransactionId,
        transaction: &Transaction,
        amount: u64,
        used_outputs: &[UsedOutput],
    ) -> Result<(), CacheError> {
        self.inner
            .write()
            .update_transaction(transaction_id, transaction, amount, used_outputs)
    }

    /// See [`TransactionsCache::update_transaction_sending_state`].
    pub fn update_transaction_sending_state(
        &self,
        transaction_id: TransactionId,
        result: Result<(), SendFailure>,
    ) -> Result<VecDeque<CacheEvent>, CacheError> {
        self.inner
            .write()
            .update_transaction_sending_state(transaction_id, result)
    }

    /// See [`TransactionsCache::add_created_deposit`].
    pub fn add_created_deposit(
        &self,
        transaction_id: TransactionId,
        total_amount: u64,
    ) -> Result<(), CacheError> {
        self.inner
            .write()
            .add_created_deposit(transaction_id, total_amount)
    }

    /// See [`TransactionsCache::add_deposit_spending_transaction`].
    pub fn add_deposit_spending_transaction(
        &self,
        hash: Hash,
        details: SpentDepositDetails,
    ) -> Result<(), CacheError> {
        self.inner
            .write()
            .add_deposit_spending_transaction(hash, details)
    }

    /// See [`TransactionsCache::lock_deposits`].
    pub fn lock_deposits(&self, outputs: &[DepositKey]) -> Vec<DepositId> {
        self.inner.write().lock_deposits(outputs)
    }

    /// See [`TransactionsCache::unlock_deposits`].
    pub fn unlock_deposits(&self, outputs: &[DepositKey]) -> Vec<DepositId> {
        self.inner.write().unlock_deposits(outputs)
    }

    /// See [`TransactionsCache::delete_outdated_transactions`].
    pub fn delete_outdated_transactions(&self) -> Vec<TransactionId> {
        self.inner.write().delete_outdated_transactions()
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Copy of the record with `transaction_id`.
    pub fn transaction(&self, transaction_id: TransactionId) -> Option<TransactionRecord> {
        self.inner.read().transaction(transaction_id).cloned()
    }

    /// Copy of the record carrying `hash`.
    pub fn find_transaction_by_hash(&self, hash: &Hash) -> Option<TransactionRecord> {
        self.inner.read().find_transaction_by_hash(hash).cloned()
    }

    /// Deposit created by output `output_index` of `hash`.
    pub fn get_deposit_id(&self, hash: &Hash, output_index: u32) -> Option<DepositId> {
        self.inner.read().get_deposit_id(hash, output_index)
    }

    /// See [`TransactionsCache::get_transactions_by_payment_ids`].
    pub fn get_transactions_by_payment_ids(&self, payment_ids: &[PaymentId]) -> Vec<Payments> {
        self.inner.read().get_transactions_by_payment_ids(payment_ids)
    }

    /// Locked and unlocked deposit value.
    pub fn deposit_balance(&self) -> DepositBalance {
        self.inner.read().deposit_balance()
    }

    /// Value tied up in unconfirmed transactions.
    pub fn pending_balance(&self) -> PendingBalance {
        self.inner.read().pending_balance()
    }

    /// Number of records, deleted ones included.
    pub fn transaction_count(&self) -> usize {
        self.inner.read().transaction_count()
    }

    // =========================================================================
    // PERSISTENCE
    // =========================================================================

    /// Encodes the cache with `codec` and hands the bytes to `store`.
    /// Returns the encoded size.
    pub fn save(&self, store: &dyn SnapshotStore, codec: &dyn SnapshotCodec) -> Result<usize, CacheError> {
        let snapshot = self.inner.read().snapshot();
        let bytes = codec.encode(&snapshot)?;
        store.save(&bytes)?;
        info!(
            codec = codec.name(),
            bytes = bytes.len(),
            transactions = snapshot.transactions.len(),
            "Transactions cache saved"
        );
        Ok(bytes.len())
    }

    /// Restores a cache saved by [`save`](Self::save). Returns `None` when
    /// the store is empty.
    pub fn load(
        store: &dyn SnapshotStore,
        codec: &dyn SnapshotCodec,
        config: CacheConfig,
        time_source: Arc<dyn TimeSource>,
        currency: Arc<dyn CurrencyRules>,
    ) -> Result<Option<Self>, CacheError> {
        let Some(bytes) = store.load()? else {
            debug!(codec = codec.name(), "No stored snapshot");
            return Ok(None);
        };
        let snapshot = codec.decode(&bytes)?;
        let cache = TransactionsCache::restore(snapshot, config, time_source)?;
        Ok(Some(Self::from_cache(cache, currency)))
    }
}

impl ChainObserver for SharedTransactionsCache {
    fn on_transaction_updated(
        &self,
        info: &TransactionInfo,
        balance_delta: i64,
        new_deposits: &[DepositOutput],
        spent_deposits: &[DepositOutput],
    ) -> Result<VecDeque<CacheEvent>, CacheError> {
        self.inner.write().on_transaction_updated(
            info,
            balance_delta,
            new_deposits,
            spent_deposits,
            self.currency.as_ref(),
        )
    }

    fn on_transaction_deleted(&self, hash: &Hash) -> VecDeque<CacheEvent> {
        self.inner.write().on_transaction_deleted(hash)
    }

    fn on_blocks_detached(&self, from_height: BlockHeight) -> u32 {
        self.inner.write().on_blocks_detached(from_height)
    }

    fn on_synchronization_completed(&self) -> VecDeque<CacheEvent> {
        self.inner.write().on_synchronization_completed()
    }
}

impl std::fmt::Debug for SharedTransactionsCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedTransactionsCache")
            .field("inner", &*self.inner.read())
            .finish_non_exhaustive()
    }
}
