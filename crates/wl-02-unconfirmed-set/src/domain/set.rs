//! # Unconfirmed Transaction Set
//!
//! Tracks locally built transactions until the chain confirms them, the
//! send fails, or they age past the live time.
//!
//! ## Reservation
//!
//! Every output consumed by a pending transaction is reserved with its
//! owner's hash. `add` refuses outputs that are already reserved, and every
//! removal path (`erase`, `delete_outdated_transactions`, `reset`) releases
//! the reservations in the same step that removes the entry.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use shared_types::{
    short_hash, AssetId, Hash, OutputRef, TransactionId, UsedOutput, NATIVE_ASSET_ID,
};
use tracing::{debug, info};

use super::entities::{
    PendingCreatedDeposit, PendingDepositSpending, PendingTransaction, SpentDepositDetails,
    UnconfirmedSnapshot,
};
use super::errors::UnconfirmedError;
use crate::config::UnconfirmedSetConfig;
use crate::ports::TimeSource;

/// Locally originated transactions awaiting confirmation.
pub struct UnconfirmedTransactionSet {
    config: UnconfirmedSetConfig,
    time_source: Arc<dyn TimeSource>,
    /// Primary storage: hash -> pending transaction.
    transactions: BTreeMap<Hash, PendingTransaction>,
    /// Pending deposit withdrawals by hash.
    deposit_spendings: BTreeMap<Hash, PendingDepositSpending>,
    /// Pending deposit creations by creating transaction.
    created_deposits: BTreeMap<TransactionId, u64>,
    /// Reserved output -> owning transaction hash.
    reserved_outputs: HashMap<OutputRef, Hash>,
}

impl UnconfirmedTransactionSet {
    /// Creates an empty set.
    pub fn new(config: UnconfirmedSetConfig, time_source: Arc<dyn TimeSource>) -> Self {
        Self {
            config,
            time_source,
            transactions: BTreeMap::new(),
            deposit_spendings: BTreeMap::new(),
            created_deposits: BTreeMap::new(),
            reserved_outputs: HashMap::new(),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &UnconfirmedSetConfig {
        &self.config
    }

    /// Current time according to the set's clock.
    pub fn now(&self) -> shared_types::Timestamp {
        self.time_source.now()
    }

    /// Number of pending transactions.
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty() && self.deposit_spendings.is_empty()
    }

    /// Pending transaction with `hash`.
    pub fn get(&self, hash: &Hash) -> Option<&PendingTransaction> {
        self.transactions.get(hash)
    }

    /// Pending transactions, ordered by hash.
    pub fn transactions(&self) -> impl Iterator<Item = &PendingTransaction> {
        self.transactions.values()
    }

    // =========================================================================
    // REGISTRATION
    // =========================================================================

    /// Registers a native-currency transaction and reserves its outputs.
    pub fn add(
        &mut self,
        hash: Hash,
        transaction_id: TransactionId,
        amount: u64,
        used_outputs: &[UsedOutput],
    ) -> Result<(), UnconfirmedError> {
        self.add_asset_transfer(hash, transaction_id, amount, NATIVE_ASSET_ID, used_outputs)
    }

    /// Registers a transaction moving `amount` of `asset_id`.
    pub fn add_asset_transfer(
        &mut self,
        hash: Hash,
        transaction_id: TransactionId,
        amount: u64,
        asset_id: AssetId,
        used_outputs: &[UsedOutput],
    ) -> Result<(), UnconfirmedError> {
        let entry = PendingTransaction {
            hash,
            transaction_id,
            sent_time: self.time_source.now(),
            amount,
            asset_id,
            used_outputs: used_outputs.to_vec(),
        };
        self.insert(entry)?;

        debug!(
            tx = %short_hash(&hash),
            id = %transaction_id,
            amount,
            asset_id,
            reserved = used_outputs.len(),
            "Pending transaction registered"
        );
        Ok(())
    }

    fn insert(&mut self, entry: PendingTransaction) -> Result<(), UnconfirmedError> {
        if self.transactions.contains_key(&entry.hash) {
            return Err(UnconfirmedError::DuplicateTransaction(entry.hash));
        }

        let mut seen = std::collections::HashSet::with_capacity(entry.used_outputs.len());
        for used in &entry.used_outputs {
            if self.reserved_outputs.contains_key(&used.output) || !seen.insert(used.output) {
                return Err(UnconfirmedError::reserved(&used.output));
            }
        }

        for used in &entry.used_outputs {
            self.reserved_outputs.insert(used.output, entry.hash);
        }
        self.transactions.insert(entry.hash, entry);
        Ok(())
    }

    /// Records that the pending transaction `transaction_id` will create
    /// deposits worth `total_amount`.
    pub fn add_created_deposit(&mut self, transaction_id: TransactionId, total_amount: u64) {
        self.created_deposits.insert(transaction_id, total_amount);
    }

    /// Forgets a pending deposit creation.
    pub fn erase_created_deposit(&mut self, transaction_id: TransactionId) -> bool {
        self.created_deposits.remove(&transaction_id).is_some()
    }

    /// Records a pending deposit withdrawal.
    pub fn add_deposit_spending_transaction(
        &mut self,
        hash: Hash,
        details: SpentDepositDetails,
    ) -> Result<(), UnconfirmedError> {
        if self.deposit_spendings.contains_key(&hash) {
            return Err(UnconfirmedError::DuplicateDepositSpending(hash));
        }
        let sent_time = self.time_source.now();
        self.deposit_spendings.insert(
            hash,
            PendingDepositSpending {
                hash,
                details,
                sent_time,
            },
        );
        Ok(())
    }

    // =========================================================================
    // REMOVAL
    // =========================================================================

    /// Removes the pending transaction or deposit withdrawal with `hash`,
    /// releasing its outputs and its pending deposit creation.
    pub fn erase(&mut self, hash: &Hash) -> bool {
        let spending = self.deposit_spendings.remove(hash).is_some();
        if let Some(entry) = self.transactions.remove(hash) {
            self.release(&entry);
            debug!(tx = %short_hash(hash), id = %entry.transaction_id, "Pending transaction erased");
            return true;
        }
        spending
    }

    fn release(&mut self, entry: &PendingTransaction) {
        for used in &entry.used_outputs {
            if self.reserved_outputs.get(&used.output) == Some(&entry.hash) {
                self.reserved_outputs.remove(&used.output);
            }
        }
        self.created_deposits.remove(&entry.transaction_id);
    }

    /// Evicts every entry at least `live_time_secs` old, releasing its
    /// outputs. Returns the evicted transaction ids, ascending.
    pub fn delete_outdated_transactions(&mut self) -> Vec<TransactionId> {
        let now = self.time_source.now();
        let live_time = self.config.live_time_secs;

        let outdated: Vec<Hash> = self
            .transactions
            .values()
            .filter(|entry| entry.age(now) >= live_time)
            .map(|entry| entry.hash)
            .collect();
        let outdated_spendings: Vec<Hash> = self
            .deposit_spendings
            .values()
            .filter(|spending| now.saturating_sub(spending.sent_time) >= live_time)
            .map(|spending| spending.hash)
            .collect();

        let mut evicted = Vec::with_capacity(outdated.len() + outdated_spendings.len());
        for hash in outdated {
            if let Some(entry) = self.transactions.remove(&hash) {
                self.release(&entry);
                evicted.push(entry.transaction_id);
            }
        }
        for hash in outdated_spendings {
            if let Some(spending) = self.deposit_spendings.remove(&hash) {
                evicted.push(spending.details.transaction_id);
            }
        }
        evicted.sort_unstable();
        evicted.dedup();

        if !evicted.is_empty() {
            info!(evicted = evicted.len(), live_time, "Outdated pending transactions evicted");
        }
        evicted
    }

    /// Drops every pending entry and reservation.
    pub fn reset(&mut self) {
        self.transactions.clear();
        self.deposit_spendings.clear();
        self.created_deposits.clear();
        self.reserved_outputs.clear();
    }

    // =========================================================================
    // LOOKUPS
    // =========================================================================

    /// Transaction id bound to `hash`, in either pending collection.
    pub fn find_transaction_id(&self, hash: &Hash) -> Option<TransactionId> {
        self.transactions
            .get(hash)
            .map(|entry| entry.transaction_id)
            .or_else(|| {
                self.deposit_spendings
                    .get(hash)
                    .map(|spending| spending.details.transaction_id)
            })
    }

    /// Rebinds the entry for `hash` to `transaction_id`.
    pub fn update_transaction_id(
        &mut self,
        hash: &Hash,
        transaction_id: TransactionId,
    ) -> Result<(), UnconfirmedError> {
        let previous = if let Some(entry) = self.transactions.get_mut(hash) {
            std::mem::replace(&mut entry.transaction_id, transaction_id)
        } else if let Some(spending) = self.deposit_spendings.get_mut(hash) {
            std::mem::replace(&mut spending.details.transaction_id, transaction_id)
        } else {
            return Err(UnconfirmedError::UnknownTransaction(*hash));
        };

        if previous != transaction_id {
            if let Some(total) = self.created_deposits.remove(&previous) {
                self.created_deposits.insert(transaction_id, total);
            }
        }
        Ok(())
    }

    /// Rebinds every entry whose hash `resolve` maps to an id.
    pub fn rebind_transaction_ids<F>(&mut self, mut resolve: F)
    where
        F: FnMut(&Hash) -> Option<TransactionId>,
    {
        let hashes: Vec<Hash> = self
            .transactions
            .keys()
            .chain(self.deposit_spendings.keys())
            .copied()
            .collect();
        for hash in hashes {
            if let Some(id) = resolve(&hash) {
                // hash was just read from the set
                let _ = self.update_transaction_id(&hash, id);
            }
        }
    }

    /// Whether a pending transaction already consumes `output`.
    pub fn is_used(&self, output: &OutputRef) -> bool {
        self.reserved_outputs.contains_key(output)
    }

    // =========================================================================
    // AGGREGATES
    // =========================================================================

    /// Sum of reserved output amounts carrying `asset_id`.
    pub fn count_unconfirmed_outs_amount(&self, asset_id: AssetId) -> u64 {
        self.transactions
            .values()
            .fold(0u64, |sum, entry| sum.saturating_add(entry.outs_amount(asset_id)))
    }

    /// Sum of pending transaction amounts denominated in `asset_id`.
    pub fn count_unconfirmed_transactions_amount(&self, asset_id: AssetId) -> u64 {
        self.transactions
            .values()
            .filter(|entry| entry.asset_id == asset_id)
            .fold(0u64, |sum, entry| sum.saturating_add(entry.amount))
    }

    /// Total amount locked by pending deposit creations.
    pub fn count_created_deposits_sum(&self) -> u64 {
        self.created_deposits
            .values()
            .fold(0u64, |sum, amount| sum.saturating_add(*amount))
    }

    /// Net value pending deposit withdrawals will release.
    pub fn count_spent_deposits_profit(&self) -> u64 {
        self.deposit_spendings
            .values()
            .fold(0u64, |sum, spending| sum.saturating_add(spending.profit()))
    }

    /// Gross value pending deposit withdrawals will release.
    pub fn count_spent_deposits_total_amount(&self) -> u64 {
        self.deposit_spendings.values().fold(0u64, |sum, spending| {
            sum.saturating_add(spending.details.deposits_sum)
        })
    }

    // =========================================================================
    // PERSISTENCE
    // =========================================================================

    /// Copies the set into its persisted layout.
    pub fn snapshot(&self) -> UnconfirmedSnapshot {
        UnconfirmedSnapshot {
            transactions: self.transactions.values().cloned().collect(),
            deposit_spendings: self.deposit_spendings.values().cloned().collect(),
            created_deposits: self
                .created_deposits
                .iter()
                .map(|(transaction_id, total_amount)| PendingCreatedDeposit {
                    transaction_id: *transaction_id,
                    total_amount: *total_amount,
                })
                .collect(),
        }
    }

    /// Rebuilds a set from its persisted layout, recollecting reserved
    /// outputs. Conflicting reservations reject the snapshot.
    pub fn from_snapshot(
        snapshot: UnconfirmedSnapshot,
        config: UnconfirmedSetConfig,
        time_source: Arc<dyn TimeSource>,
    ) -> Result<Self, UnconfirmedError> {
        let mut set = Self::new(config, time_source);
        for entry in snapshot.transactions {
            set.insert(entry)?;
        }
        for spending in snapshot.deposit_spendings {
            if set.deposit_spendings.contains_key(&spending.hash) {
                return Err(UnconfirmedError::DuplicateDepositSpending(spending.hash));
            }
            set.deposit_spendings.insert(spending.hash, spending);
        }
        for created in snapshot.created_deposits {
            set.created_deposits
                .insert(created.transaction_id, created.total_amount);
        }
        Ok(set)
    }
}

impl std::fmt::Debug for UnconfirmedTransactionSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnconfirmedTransactionSet")
            .field("config", &self.config)
            .field("transactions", &self.transactions.len())
            .field("deposit_spendings", &self.deposit_spendings.len())
            .field("created_deposits", &self.created_deposits.len())
            .field("reserved_outputs", &self.reserved_outputs.len())
            .finish()
    }
}
