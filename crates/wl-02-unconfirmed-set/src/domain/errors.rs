//! # Domain Errors
//!
//! Error types for the unconfirmed transaction set.

use shared_types::{Hash, OutputRef};
use thiserror::Error;

/// Unconfirmed transaction set error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnconfirmedError {
    /// A pending transaction with this hash already exists.
    #[error("Transaction already pending: {0:?}")]
    DuplicateTransaction(Hash),

    /// A pending deposit withdrawal with this hash already exists.
    #[error("Deposit withdrawal already pending: {0:?}")]
    DuplicateDepositSpending(Hash),

    /// The output is already reserved by another pending transaction.
    #[error("Output {index} of transaction key {key:?} is already reserved")]
    OutputAlreadyReserved {
        /// Transaction public key of the output
        key: [u8; 32],
        /// Index of the output in its transaction
        index: u32,
    },

    /// No pending entry carries this hash.
    #[error("No pending transaction with hash {0:?}")]
    UnknownTransaction(Hash),
}

impl UnconfirmedError {
    pub(crate) fn reserved(output: &OutputRef) -> Self {
        Self::OutputAlreadyReserved {
            key: output.transaction_public_key,
            index: output.index_in_transaction,
        }
    }
}
