//! Payment id → transactions index.
//!
//! Derived state: never persisted, rebuilt from the records after a load.

use std::collections::HashMap;

use shared_types::{payment_id_from_extra, PaymentId, TransactionId};

use super::entities::TransactionRecord;

/// Incoming transactions grouped by the payment id in their extra field.
#[derive(Clone, Debug, Default)]
pub struct PaymentIndex {
    by_payment_id: HashMap<PaymentId, Vec<TransactionId>>,
}

impl PaymentIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Indexes `record` if it is incoming and carries a payment id.
    /// Returns whether the index changed.
    pub fn index(&mut self, record: &TransactionRecord) -> bool {
        if record.total_amount <= 0 {
            return false;
        }
        match payment_id_from_extra(&record.extra) {
            Some(payment_id) => self.insert(payment_id, record.id),
            None => false,
        }
    }

    /// Adds `transaction_id` under `payment_id` unless already present.
    pub fn insert(&mut self, payment_id: PaymentId, transaction_id: TransactionId) -> bool {
        let ids = self.by_payment_id.entry(payment_id).or_default();
        if ids.contains(&transaction_id) {
            return false;
        }
        ids.push(transaction_id);
        true
    }

    /// Ids indexed under `payment_id`, in insertion order.
    pub fn get(&self, payment_id: &PaymentId) -> &[TransactionId] {
        self.by_payment_id
            .get(payment_id)
            .map_or(&[], Vec::as_slice)
    }

    /// Number of distinct payment ids.
    pub fn len(&self) -> usize {
        self.by_payment_id.len()
    }

    /// Whether nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.by_payment_id.is_empty()
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.by_payment_id.clear();
    }

    /// Replaces the index with one built from `records`.
    pub fn rebuild<'a>(&mut self, records: impl IntoIterator<Item = &'a TransactionRecord>) {
        self.clear();
        for record in records {
            self.index(record);
        }
    }
}
