//! # Domain Entities
//!
//! Transaction, transfer and deposit records. Records are never removed;
//! state changes are flips of the `state` field so every stable id stays
//! resolvable.
//!
//! ## Transaction State Machine
//!
//! ```text
//! [SENDING] ──send ok──→ [ACTIVE] ──confirmed──→ [ACTIVE @ height]
//!     │                     │                          │
//!     ├── send failed ──→ [FAILED] / [CANCELLED]       │
//!     │                     │                          │
//!     └──── TTL ────────→ [DELETED] ←──── reorg ───────┘
//! ```
//!
//! ## Deposit State Machine
//!
//! ```text
//! [LOCKED] ⇄ [ACTIVE] ──withdrawal confirmed──→ [SPENT]
//!     │          │                                 │
//!     └──────────┴── creator reorged ──→ [DELETED] │
//!                                                  │
//!     withdrawal reorged: back to `spent_from` ←───┘
//! ```

use std::ops::Range;

use serde::{Deserialize, Serialize};
use shared_types::{BlockHeight, DepositId, Hash, Timestamp, TransactionId, TransferId};

/// Lifecycle state of a transaction record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionState {
    /// Built locally, not yet accepted by the network.
    Sending,
    /// Accepted by the network or confirmed on chain.
    Active,
    /// Reorged out, dropped, or evicted by TTL.
    Deleted,
    /// Broadcast failed.
    Failed,
    /// Cancelled by the user before broadcast.
    Cancelled,
}

impl TransactionState {
    /// Whether the record can no longer change state through local calls.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Failed | Self::Cancelled)
    }
}

/// A wallet transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    /// Position in the record list.
    pub id: TransactionId,
    /// Unknown until a local transaction is signed.
    pub hash: Option<Hash>,
    /// Lifecycle state.
    pub state: TransactionState,
    /// `None` while unconfirmed or after its block was detached.
    pub block_height: Option<BlockHeight>,
    /// Block timestamp, 0 until confirmed.
    pub timestamp: Timestamp,
    /// Wall-clock time the broadcast was accepted. 0 for external records.
    pub sent_time: Timestamp,
    /// Net amount as the wallet sees it (negative for outgoing).
    pub total_amount: i64,
    /// Balance change reported by the chain when the record was confirmed.
    pub balance_delta: i64,
    /// Network fee. Always 0 for coinbase transactions.
    pub fee: u64,
    /// First of this record's transfers, if any.
    pub first_transfer_id: Option<TransferId>,
    /// Number of consecutive transfers starting at `first_transfer_id`.
    pub transfer_count: usize,
    /// First deposit created by this transaction, if any.
    pub first_deposit_id: Option<DepositId>,
    /// Number of deposits created by this transaction.
    pub deposit_count: usize,
    /// Unlock time carried by the transaction.
    pub unlock_time: u64,
    /// Raw extra field.
    pub extra: Vec<u8>,
    /// Attached text messages.
    pub messages: Vec<String>,
    /// Whether the transaction has no inputs.
    pub is_coinbase: bool,
}

impl TransactionRecord {
    /// Whether the chain currently holds this transaction.
    pub fn is_confirmed(&self) -> bool {
        self.state == TransactionState::Active && self.block_height.is_some()
    }

    /// Whether observers were told about `balance_delta` and no deletion
    /// has taken it back. Stays true while the record waits to be
    /// re-mined after a detach.
    pub fn balance_applied(&self) -> bool {
        self.state == TransactionState::Active && self.balance_delta != 0
    }

    /// Offsets of this record's transfers.
    pub fn transfer_range(&self) -> Range<usize> {
        match self.first_transfer_id {
            Some(first) => first.index()..first.index() + self.transfer_count,
            None => 0..0,
        }
    }
}

/// One destination of an outgoing transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRecord {
    /// Destination address.
    pub address: String,
    /// Amount sent to `address`.
    pub amount: i64,
}

impl TransferRecord {
    /// Creates a transfer to `address`.
    pub fn new(address: impl Into<String>, amount: i64) -> Self {
        Self {
            address: address.into(),
            amount,
        }
    }
}

/// Lifecycle state of a deposit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DepositState {
    /// Term not yet reported as matured.
    Locked,
    /// Withdrawable.
    Active,
    /// Withdrawn by a confirmed transaction.
    Spent,
    /// Creating transaction is no longer in the chain.
    Deleted,
}

impl DepositState {
    /// Whether the deposit currently holds value.
    pub fn is_live(self) -> bool {
        matches!(self, Self::Locked | Self::Active)
    }
}

/// A term deposit created by a wallet transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deposit {
    /// Position in the deposit list.
    pub id: DepositId,
    /// Transaction that created the deposit output.
    pub creating_transaction_id: TransactionId,
    /// Confirmed withdrawal, if any.
    pub spending_transaction_id: Option<TransactionId>,
    /// Output index inside the creating transaction.
    pub output_in_transaction: u32,
    /// Locked principal.
    pub amount: u64,
    /// Interest paid on withdrawal.
    pub interest: u64,
    /// Term in blocks.
    pub term: u32,
    /// Height of the creating block.
    pub height: BlockHeight,
    /// `height + term`.
    pub unlock_height: BlockHeight,
    /// Lifecycle state.
    pub state: DepositState,
    /// State the deposit was in when its withdrawal was confirmed.
    /// Restored if the withdrawal is deleted.
    #[serde(default)]
    pub spent_from: Option<DepositState>,
}

impl Deposit {
    /// Amount plus accrued interest.
    pub fn total(&self) -> u64 {
        self.amount.saturating_add(self.interest)
    }
}

/// Chain coordinates of a deposit output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositKey {
    /// Hash of the creating transaction.
    pub transaction_hash: Hash,
    /// Output index inside it.
    pub output_index: u32,
}

impl DepositKey {
    /// Key of output `output_index` of `transaction_hash`.
    pub fn new(transaction_hash: Hash, output_index: u32) -> Self {
        Self {
            transaction_hash,
            output_index,
        }
    }
}
