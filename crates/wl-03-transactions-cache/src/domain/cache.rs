//! # Transactions Cache
//!
//! Append-only stores of transactions, transfers and deposits addressed by
//! stable ids, plus the indices and ledgers derived from them.
//!
//! ## Data Structures
//!
//! - `transactions` / `transfers` / `deposits`: stable-id arrays
//! - `hash_index`: O(1) transaction lookup by hash
//! - `deposit_index`: O(1) deposit lookup by chain coordinates
//! - `payment_index`: payment id → incoming transactions
//! - `deposit_ledger`: locked deposit amount and interest by height
//! - `asset_ledgers`: one latest-wins ledger per auxiliary asset
//!
//! Local sends are handled here; chain notifications live in
//! `reconcile.rs`, persistence in `snapshot.rs`.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;

use shared_types::{
    short_hash, AssetId, BlockHeight, DepositId, Hash, OutputRef, PaymentId, Transaction,
    TransactionId, TransferId, UsedOutput,
};
use tracing::{debug, info};
use wl_01_height_ledger::{AssetLedger, DepositLedger};
use wl_02_unconfirmed_set::{SpentDepositDetails, TimeSource, UnconfirmedTransactionSet};

use super::entities::{
    Deposit, DepositKey, DepositState, TransactionRecord, TransactionState, TransferRecord,
};
use super::errors::{CacheError, SendFailure};
use super::events::CacheEvent;
use super::payment_index::PaymentIndex;
use super::value_objects::{DepositBalance, PendingBalance, Payments};
use crate::config::CacheConfig;

/// Wallet transaction history and deposit book.
pub struct TransactionsCache {
    pub(super) config: CacheConfig,
    pub(super) transactions: Vec<TransactionRecord>,
    pub(super) transfers: Vec<TransferRecord>,
    /// Owner of each transfer, parallel to `transfers`.
    pub(super) transfer_owners: Vec<TransactionId>,
    pub(super) deposits: Vec<Deposit>,
    pub(super) unconfirmed: UnconfirmedTransactionSet,
    pub(super) payment_index: PaymentIndex,
    pub(super) hash_index: HashMap<Hash, TransactionId>,
    pub(super) deposit_index: HashMap<DepositKey, DepositId>,
    pub(super) deposit_ledger: DepositLedger,
    pub(super) asset_ledgers: BTreeMap<AssetId, AssetLedger>,
}

impl TransactionsCache {
    /// Creates an empty cache.
    pub fn new(config: CacheConfig, time_source: Arc<dyn TimeSource>) -> Self {
        let unconfirmed = UnconfirmedTransactionSet::new(config.unconfirmed.clone(), time_source);
        let deposit_ledger = DepositLedger::with_capacity(config.ledger_capacity_hint);
        Self {
            config,
            transactions: Vec::new(),
            transfers: Vec::new(),
            transfer_owners: Vec::new(),
            deposits: Vec::new(),
            unconfirmed,
            payment_index: PaymentIndex::new(),
            hash_index: HashMap::new(),
            deposit_index: HashMap::new(),
            deposit_ledger,
            asset_ledgers: BTreeMap::new(),
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    // =========================================================================
    // LOCAL SENDS
    // =========================================================================

    /// Records a new outgoing transaction and its transfers.
    ///
    /// The record starts in `Sending` with no hash; the pending entry is
    /// registered by [`update_transaction`](Self::update_transaction).
    pub fn add_new_transaction(
        &mut self,
        amount: u64,
        fee: u64,
        extra: Vec<u8>,
        transfers: &[TransferRecord],
        unlock_time: u64,
        messages: Vec<String>,
    ) -> Result<TransactionId, CacheError> {
        let outgoing = i64::try_from(amount).map_err(|_| CacheError::AmountOverflow {
            context: "transaction amount",
        })?;

        let id = TransactionId(self.transactions.len());
        let first_transfer_id = if transfers.is_empty() {
            None
        } else {
            Some(TransferId(self.transfers.len()))
        };

        self.transactions.push(TransactionRecord {
            id,
            hash: None,
            state: TransactionState::Sending,
            block_height: None,
            timestamp: 0,
            sent_time: self.unconfirmed.now(),
            total_amount: -outgoing,
            balance_delta: 0,
            fee,
            first_transfer_id,
            transfer_count: transfers.len(),
            first_deposit_id: None,
            deposit_count: 0,
            unlock_time,
            extra,
            messages,
            is_coinbase: false,
        });
        self.transfers.extend_from_slice(transfers);
        self.transfer_owners
            .extend(std::iter::repeat(id).take(transfers.len()));

        info!(id = %id, amount, fee, transfers = transfers.len(), "Outgoing transaction created");
        Ok(id)
    }

    /// Attaches the signed transaction to a `Sending` record and reserves
    /// the outputs it consumes.
    pub fn update_transaction(
        &mut self,
        transaction_id: TransactionId,
        transaction: &Transaction,
        amount: u64,
        used_outputs: &[UsedOutput],
    ) -> Result<(), CacheError> {
        let record = self.record(transaction_id)?;
        if record.state != TransactionState::Sending {
            return Err(CacheError::InvalidState {
                transaction_id,
                state: record.state,
            });
        }
        if let Some(existing) = record.hash {
            return Err(CacheError::HashAlreadyAssigned {
                transaction_id,
                hash: existing,
            });
        }
        let hash = transaction.hash;
        if let Some(&existing) = self.hash_index.get(&hash) {
            return Err(CacheError::DuplicateHash { hash, existing });
        }

        self.unconfirmed
            .add(hash, transaction_id, amount, used_outputs)?;

        let record = &mut self.transactions[transaction_id.index()];
        record.hash = Some(hash);
        record.extra = transaction.extra.clone();
        record.unlock_time = transaction.unlock_time;
        self.hash_index.insert(hash, transaction_id);

        debug!(id = %transaction_id, tx = %short_hash(&hash), "Transaction signed");
        Ok(())
    }

    /// Notes that the pending transaction will lock `total_amount` in
    /// new deposits.
    pub fn add_created_deposit(
        &mut self,
        transaction_id: TransactionId,
        total_amount: u64,
    ) -> Result<(), CacheError> {
        self.record(transaction_id)?;
        self.unconfirmed
            .add_created_deposit(transaction_id, total_amount);
        Ok(())
    }

    /// Registers a pending deposit withdrawal.
    pub fn add_deposit_spending_transaction(
        &mut self,
        hash: Hash,
        details: SpentDepositDetails,
    ) -> Result<(), CacheError> {
        self.record(details.transaction_id)?;
        self.unconfirmed
            .add_deposit_spending_transaction(hash, details)?;
        Ok(())
    }

    /// Records the outcome of broadcasting a `Sending` transaction.
    ///
    /// A record that already left `Sending` is not touched, but the
    /// completion event is still emitted.
    pub fn update_transaction_sending_state(
        &mut self,
        transaction_id: TransactionId,
        result: Result<(), SendFailure>,
    ) -> Result<VecDeque<CacheEvent>, CacheError> {
        let record = self.record(transaction_id)?;
        if record.state == TransactionState::Sending {
            let hash = record.hash;
            let now = self.unconfirmed.now();
            match &result {
                Ok(()) => {
                    let record = &mut self.transactions[transaction_id.index()];
                    record.state = TransactionState::Active;
                    record.sent_time = now;
                    info!(id = %transaction_id, "Transaction sent");
                }
                Err(failure) => {
                    if let Some(hash) = hash {
                        self.unconfirmed.erase(&hash);
                    }
                    self.unconfirmed.erase_created_deposit(transaction_id);
                    let state = match failure {
                        SendFailure::Cancelled => TransactionState::Cancelled,
                        SendFailure::Rejected { .. } => TransactionState::Failed,
                    };
                    self.transactions[transaction_id.index()].state = state;
                    info!(id = %transaction_id, %failure, "Transaction send failed");
                }
            }
        }

        Ok(VecDeque::from([CacheEvent::SendTransactionCompleted {
            transaction_id,
            result,
        }]))
    }

    // =========================================================================
    // DEPOSIT LOCKS
    // =========================================================================

    /// Moves `Active` deposits at `outputs` to `Locked`. Returns the ids
    /// that changed.
    pub fn lock_deposits(&mut self, outputs: &[DepositKey]) -> Vec<DepositId> {
        self.toggle_deposits(outputs, DepositState::Active, DepositState::Locked)
    }

    /// Moves `Locked` deposits at `outputs` to `Active`. Returns the ids
    /// that changed.
    pub fn unlock_deposits(&mut self, outputs: &[DepositKey]) -> Vec<DepositId> {
        self.toggle_deposits(outputs, DepositState::Locked, DepositState::Active)
    }

    fn toggle_deposits(
        &mut self,
        outputs: &[DepositKey],
        from: DepositState,
        to: DepositState,
    ) -> Vec<DepositId> {
        let mut changed = Vec::new();
        for key in outputs {
            let Some(&deposit_id) = self.deposit_index.get(key) else {
                continue;
            };
            let deposit = &mut self.deposits[deposit_id.index()];
            if deposit.state == from {
                deposit.state = to;
                changed.push(deposit_id);
            }
        }
        if !changed.is_empty() {
            debug!(count = changed.len(), state = ?to, "Deposits toggled");
        }
        changed
    }

    // =========================================================================
    // RECORD QUERIES
    // =========================================================================

    /// Number of records, deleted ones included.
    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    /// Number of transfers across all records.
    pub fn transfer_count(&self) -> usize {
        self.transfers.len()
    }

    /// Number of deposits, deleted ones included.
    pub fn deposit_count(&self) -> usize {
        self.deposits.len()
    }

    /// Record with `transaction_id`.
    pub fn transaction(&self, transaction_id: TransactionId) -> Option<&TransactionRecord> {
        self.transactions.get(transaction_id.index())
    }

    /// All records in id order.
    pub fn transactions(&self) -> &[TransactionRecord] {
        &self.transactions
    }

    /// Transfer with `transfer_id`.
    pub fn transfer(&self, transfer_id: TransferId) -> Option<&TransferRecord> {
        self.transfers.get(transfer_id.index())
    }

    /// Transfers of one transaction, in creation order.
    pub fn transfers_of(&self, transaction_id: TransactionId) -> Result<&[TransferRecord], CacheError> {
        let range = self.record(transaction_id)?.transfer_range();
        Ok(&self.transfers[range])
    }

    /// Deposit with `deposit_id`.
    pub fn deposit(&self, deposit_id: DepositId) -> Option<&Deposit> {
        self.deposits.get(deposit_id.index())
    }

    /// All deposits in id order.
    pub fn deposits(&self) -> &[Deposit] {
        &self.deposits
    }

    /// Record carrying `hash`, local or external.
    pub fn find_transaction_by_hash(&self, hash: &Hash) -> Option<&TransactionRecord> {
        self.hash_index
            .get(hash)
            .and_then(|id| self.transactions.get(id.index()))
    }

    /// Transaction owning `transfer_id`.
    pub fn find_transaction_by_transfer_id(
        &self,
        transfer_id: TransferId,
    ) -> Result<TransactionId, CacheError> {
        self.transfer_owners
            .get(transfer_id.index())
            .copied()
            .ok_or(CacheError::UnknownTransfer(transfer_id))
    }

    /// Deposit created at output `output_index` of `hash`.
    pub fn get_deposit_id(&self, hash: &Hash, output_index: u32) -> Option<DepositId> {
        self.deposit_index
            .get(&DepositKey::new(*hash, output_index))
            .copied()
    }

    /// Chain coordinates of a deposit.
    pub fn deposit_key(&self, deposit_id: DepositId) -> Result<DepositKey, CacheError> {
        let deposit = self
            .deposit(deposit_id)
            .ok_or(CacheError::UnknownDeposit(deposit_id))?;
        let hash = self
            .transactions
            .get(deposit.creating_transaction_id.index())
            .and_then(|record| record.hash)
            .ok_or(CacheError::UnknownTransaction(deposit.creating_transaction_id))?;
        Ok(DepositKey::new(hash, deposit.output_in_transaction))
    }

    /// Confirmed transactions carrying each payment id, in request order.
    ///
    /// Ids that match nothing yield an empty `transactions` list.
    pub fn get_transactions_by_payment_ids(&self, payment_ids: &[PaymentId]) -> Vec<Payments> {
        payment_ids
            .iter()
            .map(|payment_id| Payments {
                payment_id: *payment_id,
                transactions: self
                    .payment_index
                    .get(payment_id)
                    .iter()
                    .filter_map(|id| self.transactions.get(id.index()))
                    .filter(|record| record.is_confirmed())
                    .cloned()
                    .collect(),
            })
            .collect()
    }

    // =========================================================================
    // BALANCES
    // =========================================================================

    /// Live deposit value, split by lock state.
    pub fn deposit_balance(&self) -> DepositBalance {
        self.deposits
            .iter()
            .fold(DepositBalance::default(), |mut balance, deposit| {
                match deposit.state {
                    DepositState::Locked => {
                        balance.locked = balance.locked.saturating_add(deposit.total())
                    }
                    DepositState::Active => {
                        balance.unlocked = balance.unlocked.saturating_add(deposit.total())
                    }
                    DepositState::Spent | DepositState::Deleted => {}
                }
                balance
            })
    }

    /// Native value held up by unconfirmed transactions.
    pub fn pending_balance(&self) -> PendingBalance {
        PendingBalance {
            outs_amount: self
                .unconfirmed
                .count_unconfirmed_outs_amount(shared_types::NATIVE_ASSET_ID),
            transactions_amount: self
                .unconfirmed
                .count_unconfirmed_transactions_amount(shared_types::NATIVE_ASSET_ID),
            created_deposits: self.unconfirmed.count_created_deposits_sum(),
            spent_deposits_profit: self.unconfirmed.count_spent_deposits_profit(),
        }
    }

    /// Reserved amount of `asset_id` outputs.
    pub fn unconfirmed_outs_amount(&self, asset_id: AssetId) -> u64 {
        self.unconfirmed.count_unconfirmed_outs_amount(asset_id)
    }

    /// Whether a pending transaction already consumes `output`.
    pub fn is_used(&self, output: &OutputRef) -> bool {
        self.unconfirmed.is_used(output)
    }

    /// The pending set.
    pub fn unconfirmed(&self) -> &UnconfirmedTransactionSet {
        &self.unconfirmed
    }

    // =========================================================================
    // LEDGERS
    // =========================================================================

    /// Locked deposit amount and interest by height.
    pub fn deposit_ledger(&self) -> &DepositLedger {
        &self.deposit_ledger
    }

    /// Ledger of `asset_id`, if any block touched it.
    pub fn asset_ledger(&self, asset_id: AssetId) -> Option<&AssetLedger> {
        self.asset_ledgers.get(&asset_id)
    }

    /// Locked deposit amount as of block `height`.
    pub fn deposit_amount_at_height(&self, height: BlockHeight) -> i64 {
        self.deposit_ledger.amount_at_height(height)
    }

    /// Interest accrued by deposits created up to block `height`.
    pub fn deposit_interest_at_height(&self, height: BlockHeight) -> u64 {
        self.deposit_ledger.auxiliary_at_height(height)
    }

    /// Locked deposit amount at the ledger tip.
    pub fn full_deposit_amount(&self) -> i64 {
        self.deposit_ledger.full_amount()
    }

    /// Interest of every deposit in the ledger.
    pub fn full_deposit_interest(&self) -> u64 {
        self.deposit_ledger.full_auxiliary()
    }

    /// Balance change of `asset_id` up to block `height`.
    pub fn asset_amount_at_height(&self, asset_id: AssetId, height: BlockHeight) -> i64 {
        self.asset_ledgers
            .get(&asset_id)
            .map_or(0, |ledger| ledger.amount_at_height(height))
    }

    /// Balance change of `asset_id` at the ledger tip.
    pub fn full_asset_amount(&self, asset_id: AssetId) -> i64 {
        self.asset_ledgers
            .get(&asset_id)
            .map_or(0, AssetLedger::full_amount)
    }

    pub(super) fn record(&self, transaction_id: TransactionId) -> Result<&TransactionRecord, CacheError> {
        self.transactions
            .get(transaction_id.index())
            .ok_or(CacheError::UnknownTransaction(transaction_id))
    }
}

impl std::fmt::Debug for TransactionsCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionsCache")
            .field("transactions", &self.transactions.len())
            .field("transfers", &self.transfers.len())
            .field("deposits", &self.deposits.len())
            .field("unconfirmed", &self.unconfirmed)
            .field("deposit_ledger_blocks", &self.deposit_ledger.block_count())
            .field("asset_ledgers", &self.asset_ledgers.len())
            .finish()
    }
}
