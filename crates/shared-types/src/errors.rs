//! # Error Types
//!
//! Errors raised while decoding shared transaction data.

use thiserror::Error;

/// Errors raised while parsing a transaction's extra field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtraError {
    /// The field ended before a tag's payload was complete.
    #[error("Truncated extra field: tag {tag:#04x} at offset {offset}")]
    Truncated { tag: u8, offset: usize },

    /// A tag this parser does not know.
    #[error("Unknown extra tag {tag:#04x} at offset {offset}")]
    UnknownTag { tag: u8, offset: usize },

    /// Padding contained a non-zero byte or exceeded the maximum size.
    #[error("Invalid padding at offset {offset}")]
    InvalidPadding { offset: usize },

    /// A varint did not fit into 64 bits.
    #[error("Varint overflow at offset {offset}")]
    VarintOverflow { offset: usize },

    /// A nested field was malformed.
    #[error("Malformed {field} field")]
    Malformed { field: &'static str },
}

/// Errors raised while inspecting a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransactionError {
    /// Summing input or output amounts overflowed u64.
    #[error("Amount overflow while summing {side}")]
    AmountOverflow { side: &'static str },

    /// Extra field could not be parsed.
    #[error(transparent)]
    Extra(#[from] ExtraError),
}
