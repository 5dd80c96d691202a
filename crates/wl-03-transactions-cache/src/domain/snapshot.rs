//! # Cache Snapshot
//!
//! Persisted layout of the whole cache. Records are stored in id order;
//! the hash, deposit and payment indices are derived and rebuilt on
//! restore, as are the reserved outputs of the pending set.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use shared_types::{AssetId, TransactionId};
use tracing::info;
use wl_01_height_ledger::{AssetLedger, DepositLedger, LedgerSnapshot};
use wl_02_unconfirmed_set::{TimeSource, UnconfirmedSnapshot, UnconfirmedTransactionSet};

use super::cache::TransactionsCache;
use super::entities::{Deposit, DepositKey, TransactionRecord, TransferRecord};
use super::errors::CacheError;
use super::payment_index::PaymentIndex;
use crate::config::CacheConfig;

/// Current snapshot format version.
pub const CACHE_SNAPSHOT_VERSION: u32 = 2;

/// One asset ledger with its asset id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetLedgerSnapshot {
    /// Asset the ledger tracks.
    pub asset_id: AssetId,
    /// Ledger entries.
    pub ledger: LedgerSnapshot,
}

/// Everything needed to rebuild a [`TransactionsCache`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheSnapshot {
    /// Format version, [`CACHE_SNAPSHOT_VERSION`] when written.
    pub version: u32,
    /// Records in id order.
    pub transactions: Vec<TransactionRecord>,
    /// Transfers in id order.
    pub transfers: Vec<TransferRecord>,
    /// Deposits in id order.
    pub deposits: Vec<Deposit>,
    /// Pending set, including send times.
    pub unconfirmed: UnconfirmedSnapshot,
    /// Deposit ledger entries.
    pub deposit_ledger: LedgerSnapshot,
    /// Non-empty asset ledgers, ascending by asset id.
    pub asset_ledgers: Vec<AssetLedgerSnapshot>,
}

fn corrupt(message: impl Into<String>) -> CacheError {
    CacheError::CorruptSnapshot(message.into())
}

impl TransactionsCache {
    /// Copies the cache into its persisted layout.
    pub fn snapshot(&self) -> CacheSnapshot {
        CacheSnapshot {
            version: CACHE_SNAPSHOT_VERSION,
            transactions: self.transactions.clone(),
            transfers: self.transfers.clone(),
            deposits: self.deposits.clone(),
            unconfirmed: self.unconfirmed.snapshot(),
            deposit_ledger: self.deposit_ledger.snapshot(),
            asset_ledgers: self
                .asset_ledgers
                .iter()
                .map(|(asset_id, ledger)| AssetLedgerSnapshot {
                    asset_id: *asset_id,
                    ledger: ledger.snapshot(),
                })
                .collect(),
        }
    }

    /// Rebuilds a cache from a snapshot, validating every stored id and
    /// rebuilding the derived indices.
    pub fn restore(
        snapshot: CacheSnapshot,
        config: CacheConfig,
        time_source: Arc<dyn TimeSource>,
    ) -> Result<Self, CacheError> {
        if snapshot.version != CACHE_SNAPSHOT_VERSION {
            return Err(CacheError::UnsupportedSnapshotVersion {
                found: snapshot.version,
                expected: CACHE_SNAPSHOT_VERSION,
            });
        }
        let CacheSnapshot {
            transactions,
            transfers,
            deposits,
            unconfirmed,
            deposit_ledger,
            asset_ledgers: asset_snapshots,
            ..
        } = snapshot;

        let hash_index = index_hashes(&transactions)?;
        let transfer_owners = collect_transfer_owners(&transactions, transfers.len())?;
        let deposit_index = index_deposits(&transactions, &deposits)?;

        let known = |id: TransactionId| id.index() < transactions.len();
        let pending_ids_known = unconfirmed.transactions.iter().all(|entry| known(entry.transaction_id))
            && unconfirmed
                .deposit_spendings
                .iter()
                .all(|spending| known(spending.details.transaction_id))
            && unconfirmed
                .created_deposits
                .iter()
                .all(|created| known(created.transaction_id));
        if !pending_ids_known {
            return Err(corrupt("pending entry refers to an unknown transaction"));
        }
        let mut unconfirmed =
            UnconfirmedTransactionSet::from_snapshot(unconfirmed, config.unconfirmed.clone(), time_source)?;
        unconfirmed.rebind_transaction_ids(|hash| hash_index.get(hash).copied());

        let mut deposit_ledger = DepositLedger::from_snapshot(deposit_ledger)?;
        deposit_ledger.reserve(config.ledger_capacity_hint);
        let mut asset_ledgers = BTreeMap::new();
        for AssetLedgerSnapshot { asset_id, ledger } in asset_snapshots {
            if asset_ledgers
                .insert(asset_id, AssetLedger::from_snapshot(ledger)?)
                .is_some()
            {
                return Err(corrupt(format!("asset {asset_id} stored twice")));
            }
        }

        let mut payment_index = PaymentIndex::new();
        payment_index.rebuild(&transactions);

        info!(
            transactions = transactions.len(),
            transfers = transfers.len(),
            deposits = deposits.len(),
            pending = unconfirmed.len(),
            "Transactions cache restored"
        );
        Ok(Self {
            config,
            transactions,
            transfers,
            transfer_owners,
            deposits,
            unconfirmed,
            payment_index,
            hash_index,
            deposit_index,
            deposit_ledger,
            asset_ledgers,
        })
    }
}

fn index_hashes(
    transactions: &[TransactionRecord],
) -> Result<HashMap<shared_types::Hash, TransactionId>, CacheError> {
    let mut index = HashMap::with_capacity(transactions.len());
    for (position, record) in transactions.iter().enumerate() {
        if record.id.index() != position {
            return Err(corrupt(format!(
                "transaction at position {position} has id {}",
                record.id
            )));
        }
        if let Some(hash) = record.hash {
            if index.insert(hash, record.id).is_some() {
                return Err(corrupt(format!("hash of transaction {} stored twice", record.id)));
            }
        }
    }
    Ok(index)
}

fn collect_transfer_owners(
    transactions: &[TransactionRecord],
    transfer_count: usize,
) -> Result<Vec<TransactionId>, CacheError> {
    let mut owners: Vec<Option<TransactionId>> = vec![None; transfer_count];
    for record in transactions {
        if record.first_transfer_id.is_none() && record.transfer_count > 0 {
            return Err(corrupt(format!("transaction {} has transfers but no offset", record.id)));
        }
        let range = record.transfer_range();
        if range.end > transfer_count {
            return Err(corrupt(format!("transfers of transaction {} out of range", record.id)));
        }
        for owner in &mut owners[range] {
            if owner.replace(record.id).is_some() {
                return Err(corrupt(format!("transfer shared by transaction {}", record.id)));
            }
        }
    }
    owners
        .into_iter()
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| corrupt("transfer without owning transaction"))
}

fn index_deposits(
    transactions: &[TransactionRecord],
    deposits: &[Deposit],
) -> Result<HashMap<DepositKey, shared_types::DepositId>, CacheError> {
    let mut index = HashMap::with_capacity(deposits.len());
    for (position, deposit) in deposits.iter().enumerate() {
        if deposit.id.index() != position {
            return Err(corrupt(format!("deposit at position {position} has id {}", deposit.id)));
        }
        if deposit
            .spending_transaction_id
            .is_some_and(|id| id.index() >= transactions.len())
        {
            return Err(corrupt(format!("deposit {} spent by unknown transaction", deposit.id)));
        }
        let hash = transactions
            .get(deposit.creating_transaction_id.index())
            .and_then(|record| record.hash)
            .ok_or_else(|| corrupt(format!("deposit {} has no creating hash", deposit.id)))?;
        let key = DepositKey::new(hash, deposit.output_in_transaction);
        if index.insert(key, deposit.id).is_some() {
            return Err(corrupt(format!("deposit output of {} stored twice", deposit.id)));
        }
    }
    Ok(index)
}
