//! # Domain Errors
//!
//! Error types for the transactions cache. Every `CacheError` is an
//! invariant violation: the failing call mutated nothing.

use shared_types::{DepositId, Hash, TransactionId, TransferId};
use thiserror::Error;
use wl_01_height_ledger::LedgerError;
use wl_02_unconfirmed_set::UnconfirmedError;

use super::entities::{DepositState, TransactionState};

/// Transactions cache error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// Transaction id was never issued.
    #[error("Unknown transaction id {0}")]
    UnknownTransaction(TransactionId),

    /// Transfer id was never issued.
    #[error("Unknown transfer id {0}")]
    UnknownTransfer(TransferId),

    /// Deposit id was never issued.
    #[error("Unknown deposit id {0}")]
    UnknownDeposit(DepositId),

    /// A withdrawn deposit output is not indexed.
    #[error("Unknown deposit output {output_index} of transaction {hash:?}")]
    UnknownDepositOutput {
        /// Creating transaction of the output
        hash: Hash,
        /// Output index inside it
        output_index: u32,
    },

    /// A deposit output claims a creating transaction other than the one
    /// being reported.
    #[error("Deposit output belongs to {output_hash:?}, not {transaction_hash:?}")]
    DepositOutputMismatch {
        /// Transaction being reported
        transaction_hash: Hash,
        /// Transaction named by the output
        output_hash: Hash,
    },

    /// Deposit outputs must carry a non-zero term.
    #[error("Deposit output {output_index} of {hash:?} has zero term")]
    InvalidDepositTerm {
        /// Transaction being reported
        hash: Hash,
        /// Offending output
        output_index: u32,
    },

    /// A deposit was already withdrawn by another transaction.
    #[error("Deposit {deposit_id} already spent by transaction {spent_by:?}")]
    DepositAlreadySpent {
        /// Deposit being withdrawn
        deposit_id: DepositId,
        /// Recorded withdrawal
        spent_by: Option<TransactionId>,
    },

    /// A deposit cannot be withdrawn in its current state.
    #[error("Deposit {deposit_id} is {state:?} and cannot be spent")]
    DepositNotSpendable {
        /// Deposit being withdrawn
        deposit_id: DepositId,
        /// Its current state
        state: DepositState,
    },

    /// The operation is not valid for the record's current state.
    #[error("Transaction {transaction_id} is {state:?}")]
    InvalidState {
        /// Record the call targeted
        transaction_id: TransactionId,
        /// Its current state
        state: TransactionState,
    },

    /// Another record already owns this hash.
    #[error("Hash {hash:?} already bound to transaction {existing}")]
    DuplicateHash {
        /// Hash being assigned
        hash: Hash,
        /// Record that already owns it
        existing: TransactionId,
    },

    /// A record's hash is set once, when it is signed.
    #[error("Transaction {transaction_id} already signed as {hash:?}")]
    HashAlreadyAssigned {
        /// Record being signed
        transaction_id: TransactionId,
        /// Hash it already carries
        hash: Hash,
    },

    /// Amount arithmetic overflowed.
    #[error("Amount overflow in {context}")]
    AmountOverflow {
        /// Sum that overflowed
        context: &'static str,
    },

    /// Snapshot was written by an unsupported format version.
    #[error("Unsupported snapshot version {found} (expected {expected})")]
    UnsupportedSnapshotVersion {
        /// Version stored in the snapshot
        found: u32,
        /// Version this build writes
        expected: u32,
    },

    /// Snapshot contents break a cache invariant.
    #[error("Corrupt snapshot: {0}")]
    CorruptSnapshot(String),

    /// Height-indexed ledger rejected an update.
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Pending set rejected an update.
    #[error("Unconfirmed set error: {0}")]
    Unconfirmed(#[from] UnconfirmedError),

    /// Snapshot encoding failed.
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// Snapshot storage failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Why a local send did not complete.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendFailure {
    /// The user cancelled the send.
    #[error("Cancelled by user")]
    Cancelled,

    /// The network or node rejected the transaction.
    #[error("Rejected: {reason}")]
    Rejected {
        /// Node-provided reason
        reason: String,
    },
}

/// Snapshot codec errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Serializing the snapshot failed.
    #[error("{codec} encode failed: {message}")]
    Encode {
        /// Codec name
        codec: &'static str,
        /// Underlying error
        message: String,
    },

    /// The stored bytes are not a valid snapshot.
    #[error("{codec} decode failed: {message}")]
    Decode {
        /// Codec name
        codec: &'static str,
        /// Underlying error
        message: String,
    },
}

/// Snapshot store errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("I/O error on {path}: {message}")]
    Io {
        /// File involved
        path: String,
        /// Underlying error
        message: String,
    },
}
