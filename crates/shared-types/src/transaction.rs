//! # Transaction Variants
//!
//! Inputs and output targets are closed enums. Amount and signature-count
//! extraction is one exhaustive match per variant, so a new variant cannot be
//! added without every consumer being revisited.

use serde::{Deserialize, Serialize};

use crate::entities::{AssetId, Hash, KeyImage, PaymentId, PublicKey, NATIVE_ASSET_ID};
use crate::errors::TransactionError;
use crate::extra::payment_id_from_extra;

/// A transaction input.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransactionInput {
    /// Block reward input (coinbase).
    Coinbase { block_index: u32 },
    /// Ring-signature spend of a key output.
    Key {
        amount: u64,
        output_indexes: Vec<u32>,
        key_image: KeyImage,
    },
    /// Spend of a multisignature output, including deposit withdrawals.
    Multisignature {
        amount: u64,
        signature_count: u8,
        output_index: u32,
        term: u32,
    },
    /// Ring-signature spend of an asset output.
    AssetKey {
        asset_id: AssetId,
        amount: u64,
        output_indexes: Vec<u32>,
        key_image: KeyImage,
    },
}

impl TransactionInput {
    /// Amount consumed by this input (zero for coinbase).
    pub fn amount(&self) -> u64 {
        match self {
            Self::Coinbase { .. } => 0,
            Self::Key { amount, .. }
            | Self::Multisignature { amount, .. }
            | Self::AssetKey { amount, .. } => *amount,
        }
    }

    /// Number of signatures the input must carry.
    pub fn required_signatures(&self) -> usize {
        match self {
            Self::Coinbase { .. } => 0,
            Self::Key { output_indexes, .. } | Self::AssetKey { output_indexes, .. } => {
                output_indexes.len()
            }
            Self::Multisignature {
                signature_count, ..
            } => usize::from(*signature_count),
        }
    }

    /// Asset consumed by this input.
    pub fn asset_id(&self) -> AssetId {
        match self {
            Self::AssetKey { asset_id, .. } => *asset_id,
            Self::Coinbase { .. } | Self::Key { .. } | Self::Multisignature { .. } => {
                NATIVE_ASSET_ID
            }
        }
    }

    /// Whether this input withdraws a term deposit.
    pub fn is_deposit_withdrawal(&self) -> bool {
        matches!(self, Self::Multisignature { term, .. } if *term > 0)
    }
}

/// Where an output's value goes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransactionOutputTarget {
    /// Single-key output.
    Key { key: PublicKey },
    /// M-of-N output. A non-zero `term` makes it a term deposit.
    Multisignature {
        keys: Vec<PublicKey>,
        required_signatures: u8,
        term: u32,
    },
    /// Single-key output carrying an auxiliary asset.
    AssetKey { key: PublicKey, asset_id: AssetId },
}

impl TransactionOutputTarget {
    /// Signatures needed to spend this output.
    pub fn required_signatures(&self) -> usize {
        match self {
            Self::Key { .. } | Self::AssetKey { .. } => 1,
            Self::Multisignature {
                required_signatures,
                ..
            } => usize::from(*required_signatures),
        }
    }

    /// Deposit term in blocks, if this output is a term deposit.
    pub fn deposit_term(&self) -> Option<u32> {
        match self {
            Self::Multisignature { term, .. } if *term > 0 => Some(*term),
            Self::Key { .. } | Self::AssetKey { .. } | Self::Multisignature { .. } => None,
        }
    }

    /// Asset carried by this output.
    pub fn asset_id(&self) -> AssetId {
        match self {
            Self::AssetKey { asset_id, .. } => *asset_id,
            Self::Key { .. } | Self::Multisignature { .. } => NATIVE_ASSET_ID,
        }
    }
}

/// A transaction output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionOutput {
    pub amount: u64,
    pub target: TransactionOutputTarget,
}

/// A signed transaction as handed over by the transaction builder.
///
/// Signatures are not carried; the bookkeeping layer only needs the hash,
/// the amounts and the extra field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub hash: Hash,
    pub version: u8,
    pub unlock_time: u64,
    pub inputs: Vec<TransactionInput>,
    pub outputs: Vec<TransactionOutput>,
    pub extra: Vec<u8>,
}

impl Transaction {
    /// Sum of all input amounts.
    pub fn input_amount(&self) -> Result<u64, TransactionError> {
        self.inputs
            .iter()
            .try_fold(0u64, |sum, input| sum.checked_add(input.amount()))
            .ok_or(TransactionError::AmountOverflow { side: "inputs" })
    }

    /// Sum of all output amounts.
    pub fn output_amount(&self) -> Result<u64, TransactionError> {
        self.outputs
            .iter()
            .try_fold(0u64, |sum, output| sum.checked_add(output.amount))
            .ok_or(TransactionError::AmountOverflow { side: "outputs" })
    }

    /// Whether the only input is a block reward.
    pub fn is_coinbase(&self) -> bool {
        matches!(self.inputs.as_slice(), [TransactionInput::Coinbase { .. }])
    }

    /// Fee paid by the transaction (zero for coinbase).
    pub fn fee(&self) -> Result<u64, TransactionError> {
        if self.is_coinbase() {
            return Ok(0);
        }
        Ok(self.input_amount()?.saturating_sub(self.output_amount()?))
    }

    /// Payment id embedded in the extra field, if any.
    pub fn payment_id(&self) -> Option<PaymentId> {
        payment_id_from_extra(&self.extra)
    }

    /// Total number of signatures the inputs must carry.
    pub fn required_signatures(&self) -> usize {
        self.inputs
            .iter()
            .map(TransactionInput::required_signatures)
            .sum()
    }
}
