//! # Auxiliary Aggregation Rules
//!
//! The interest ledger and the asset ledger differ only in how the auxiliary
//! column folds a new block into the running value.

/// How a ledger folds a block's auxiliary input into the running value.
pub trait AuxiliaryRule {
    /// Rule name used in log fields.
    const NAME: &'static str;

    /// Combines the previous aggregate with a block's input.
    /// `None` signals overflow.
    fn combine(previous: u64, incoming: u64) -> Option<u64>;
}

/// Running sum (accrued deposit interest).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AccumulateAuxiliary;

impl AuxiliaryRule for AccumulateAuxiliary {
    const NAME: &'static str = "accumulate";

    fn combine(previous: u64, incoming: u64) -> Option<u64> {
        previous.checked_add(incoming)
    }
}

/// Latest value wins (last-seen asset identifier).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LatestAuxiliary;

impl AuxiliaryRule for LatestAuxiliary {
    const NAME: &'static str = "latest";

    fn combine(_previous: u64, incoming: u64) -> Option<u64> {
        Some(incoming)
    }
}
