//! # Domain Entities
//!
//! Pending transactions and the deposit side records that travel with them.

use serde::{Deserialize, Serialize};
use shared_types::{AssetId, Hash, Timestamp, TransactionId, UsedOutput};

/// A locally built transaction awaiting confirmation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingTransaction {
    /// Hash of the signed transaction.
    pub hash: Hash,
    /// Cache record this entry belongs to.
    pub transaction_id: TransactionId,
    /// When the transaction was registered or last re-sent.
    pub sent_time: Timestamp,
    /// Amount leaving the wallet.
    pub amount: u64,
    /// Asset the amount is denominated in.
    pub asset_id: AssetId,
    /// Outputs consumed, reserved until the entry is erased.
    pub used_outputs: Vec<UsedOutput>,
}

impl PendingTransaction {
    /// Sum of consumed output amounts carrying `asset_id`.
    pub fn outs_amount(&self, asset_id: AssetId) -> u64 {
        self.used_outputs
            .iter()
            .filter(|used| used.asset_id == asset_id)
            .fold(0u64, |sum, used| sum.saturating_add(used.amount))
    }

    /// Seconds elapsed since `sent_time`.
    pub fn age(&self, now: Timestamp) -> u64 {
        now.saturating_sub(self.sent_time)
    }
}

/// What a pending deposit withdrawal will release once confirmed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpentDepositDetails {
    /// Cache record of the withdrawal transaction.
    pub transaction_id: TransactionId,
    /// Amount plus interest of every deposit withdrawn.
    pub deposits_sum: u64,
    /// Fee paid by the withdrawal.
    pub fee: u64,
}

/// A pending deposit withdrawal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingDepositSpending {
    /// Hash of the withdrawal transaction.
    pub hash: Hash,
    /// What the withdrawal releases.
    pub details: SpentDepositDetails,
    /// When the withdrawal was registered.
    pub sent_time: Timestamp,
}

impl PendingDepositSpending {
    /// Value the withdrawal adds to the balance, net of fee.
    pub fn profit(&self) -> u64 {
        self.details.deposits_sum.saturating_sub(self.details.fee)
    }
}

/// A deposit a pending transaction will create once confirmed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingCreatedDeposit {
    /// Cache record of the creating transaction.
    pub transaction_id: TransactionId,
    /// Total amount locked by the new deposits.
    pub total_amount: u64,
}

/// Persisted layout of the set.
///
/// Reserved outputs are not stored; they are recollected from
/// `transactions` on load.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnconfirmedSnapshot {
    /// Pending transactions, ordered by hash.
    pub transactions: Vec<PendingTransaction>,
    /// Pending deposit withdrawals, ordered by hash.
    pub deposit_spendings: Vec<PendingDepositSpending>,
    /// Pending deposit creations, ordered by transaction id.
    pub created_deposits: Vec<PendingCreatedDeposit>,
}
