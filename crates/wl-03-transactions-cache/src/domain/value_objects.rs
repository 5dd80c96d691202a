//! # Value Objects
//!
//! Inputs delivered by the sync layer and aggregates handed to observers.

use serde::{Deserialize, Serialize};
use shared_types::{AssetId, BlockHeight, Hash, PaymentId, Timestamp};

use super::entities::{DepositKey, TransactionRecord};

/// A confirmed transaction as reported by the sync layer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionInfo {
    /// Transaction hash.
    pub hash: Hash,
    /// Height of the including block.
    pub block_height: BlockHeight,
    /// Timestamp of the including block.
    pub timestamp: Timestamp,
    /// Unlock time carried by the transaction.
    pub unlock_time: u64,
    /// Sum of all inputs. 0 for coinbase.
    pub total_amount_in: u64,
    /// Sum of all outputs.
    pub total_amount_out: u64,
    /// Raw extra field.
    pub extra: Vec<u8>,
    /// Attached text messages.
    pub messages: Vec<String>,
    /// Per-asset balance changes carried by the transaction.
    pub asset_deltas: Vec<AssetDelta>,
}

impl TransactionInfo {
    /// A block reward has no inputs.
    pub fn is_coinbase(&self) -> bool {
        self.total_amount_in == 0
    }

    /// Fee paid (zero for coinbase).
    pub fn fee(&self) -> u64 {
        if self.is_coinbase() {
            0
        } else {
            self.total_amount_in.saturating_sub(self.total_amount_out)
        }
    }
}

/// Balance change of one auxiliary asset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetDelta {
    /// Affected asset.
    pub asset_id: AssetId,
    /// Signed change.
    pub amount: i64,
}

/// A deposit output observed on chain, either created or withdrawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositOutput {
    /// Hash of the transaction that created the output.
    pub transaction_hash: Hash,
    /// Output index inside that transaction.
    pub output_in_transaction: u32,
    /// Locked principal.
    pub amount: u64,
    /// Term in blocks.
    pub term: u32,
}

impl DepositOutput {
    /// Index key of this output.
    pub fn key(&self) -> DepositKey {
        DepositKey::new(self.transaction_hash, self.output_in_transaction)
    }
}

/// Confirmed transactions carrying one payment id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Payments {
    /// Requested payment id.
    pub payment_id: PaymentId,
    /// Matching confirmed records, in insertion order.
    pub transactions: Vec<TransactionRecord>,
}

/// Deposit value split by availability, interest included.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositBalance {
    /// `Locked` deposits.
    pub locked: u64,
    /// `Active` deposits, withdrawable now.
    pub unlocked: u64,
}

/// Value tied up in transactions the chain has not confirmed yet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingBalance {
    /// Reserved native outputs.
    pub outs_amount: u64,
    /// Native amount being sent.
    pub transactions_amount: u64,
    /// Amount pending deposit creations will lock.
    pub created_deposits: u64,
    /// Net amount pending withdrawals will release.
    pub spent_deposits_profit: u64,
}
