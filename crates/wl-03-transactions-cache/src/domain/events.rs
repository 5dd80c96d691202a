//! # Observer Events
//!
//! Every mutating notification returns the externally visible changes it
//! made, in a stable order: the transaction event first, then the balance
//! event, then deposit events in the order the notification listed them.

use shared_types::{DepositId, TransactionId};

use super::errors::SendFailure;

/// A change observers may want to render.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CacheEvent {
    /// A transaction not originated by this wallet was seen on chain.
    ExternalTransactionCreated {
        /// Newly assigned id
        transaction_id: TransactionId,
    },
    /// A known transaction changed state, height or timestamp.
    TransactionUpdated {
        /// Changed record
        transaction_id: TransactionId,
    },
    /// The confirmed balance moved by `delta`.
    BalanceChanged {
        /// Record that caused the change
        transaction_id: TransactionId,
        /// Signed change in atomic units
        delta: i64,
    },
    /// A deposit was created or reactivated.
    DepositCreated {
        /// Created deposit
        deposit_id: DepositId,
    },
    /// A deposit was withdrawn.
    DepositSpent {
        /// Withdrawn deposit
        deposit_id: DepositId,
    },
    /// Several deposits changed at once (reorg corrections).
    DepositsUpdated {
        /// Changed deposits, ascending
        deposit_ids: Vec<DepositId>,
    },
    /// A local send finished, successfully or not.
    SendTransactionCompleted {
        /// Record that was sent
        transaction_id: TransactionId,
        /// Broadcast outcome
        result: Result<(), SendFailure>,
    },
}
