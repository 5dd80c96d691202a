//! # Core Wallet Entities
//!
//! Identifier and value types used across the wallet-ledger crates.
//!
//! ## Clusters
//!
//! - **Chain primitives**: `Hash`, `PublicKey`, `PaymentId`, `BlockHeight`
//! - **Stable ids**: `TransactionId`, `TransferId`, `DepositId`
//! - **Outputs**: `OutputRef`, `UsedOutput`

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// CHAIN PRIMITIVES
// =============================================================================

/// A 32-byte transaction hash.
pub type Hash = [u8; 32];

/// A 32-byte public key (transaction key or output key).
pub type PublicKey = [u8; 32];

/// A 32-byte key image proving an output was spent.
pub type KeyImage = [u8; 32];

/// A 32-byte payment id embedded in a transaction's extra field.
pub type PaymentId = [u8; 32];

/// Block height (index of the block in the chain).
pub type BlockHeight = u32;

/// Unix timestamp in seconds.
pub type Timestamp = u64;

/// Auxiliary asset identifier.
pub type AssetId = u64;

/// Asset id denoting the chain's native currency.
pub const NATIVE_ASSET_ID: AssetId = 0;

// =============================================================================
// STABLE IDS
// =============================================================================

macro_rules! stable_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub usize);

        impl $name {
            /// Offset of the referenced element in its owning collection.
            pub const fn index(self) -> usize {
                self.0
            }
        }

        impl From<usize> for $name {
            fn from(index: usize) -> Self {
                Self(index)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

stable_id! {
    /// Offset of a transaction record. Never reused once issued.
    TransactionId
}

stable_id! {
    /// Offset of a transfer record within the contiguous transfer list.
    TransferId
}

stable_id! {
    /// Offset of a deposit record. Never reused once issued.
    DepositId
}

// =============================================================================
// OUTPUTS
// =============================================================================

/// Coordinates of a transaction output owned by the wallet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputRef {
    /// Public key of the transaction that created the output.
    pub transaction_public_key: PublicKey,
    /// Position of the output inside that transaction.
    pub index_in_transaction: u32,
}

impl OutputRef {
    /// Creates an output reference.
    pub fn new(transaction_public_key: PublicKey, index_in_transaction: u32) -> Self {
        Self {
            transaction_public_key,
            index_in_transaction,
        }
    }
}

/// An owned output consumed by a locally built transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsedOutput {
    /// Where the output lives.
    pub output: OutputRef,
    /// Amount carried by the output.
    pub amount: u64,
    /// Asset carried by the output (`NATIVE_ASSET_ID` for the native currency).
    pub asset_id: AssetId,
}

impl UsedOutput {
    /// A native-currency output.
    pub fn native(output: OutputRef, amount: u64) -> Self {
        Self {
            output,
            amount,
            asset_id: NATIVE_ASSET_ID,
        }
    }
}

/// Abbreviated hex form of a hash for log fields.
pub fn short_hash(hash: &Hash) -> String {
    hash[..4].iter().map(|b| format!("{:02x}", b)).collect()
}
