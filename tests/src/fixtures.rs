//! # Test Fixtures
//!
//! Deterministic hashes, chain inputs and a wallet harness shared by the
//! integration flows.

use std::sync::{Arc, Once};

use sha2::{Digest, Sha256};
use shared_types::extra::append_payment_id;
use shared_types::{
    BlockHeight, Hash, OutputRef, PaymentId, Timestamp, Transaction, TransactionInput, UsedOutput,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use wl_02_unconfirmed_set::ManualTimeSource;
use wl_03_transactions_cache::{
    CacheConfig, DepositOutput, SharedTransactionsCache, SimpleInterestCurrency, TransactionInfo,
};

/// Fee every fixture transaction pays.
pub const FIXTURE_FEE: u64 = 10;

/// Wall-clock time the harness starts at.
pub const GENESIS_TIME: Timestamp = 1_700_000_000;

static TRACING: Once = Once::new();

/// Installs a test-writer subscriber once per process. `RUST_LOG`
/// overrides the default `warn` filter.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_test_writer())
            .try_init();
    });
}

/// Stable 32-byte hash for a human-readable label.
pub fn tx_hash(label: &str) -> Hash {
    Sha256::digest(label.as_bytes()).into()
}

/// Payment id derived from a label, distinct from any `tx_hash`.
pub fn payment_id(label: &str) -> PaymentId {
    Sha256::digest(format!("payment-id:{label}").as_bytes()).into()
}

/// Extra field carrying only `payment_id`.
pub fn extra_with_payment_id(payment_id: &PaymentId) -> Vec<u8> {
    let mut extra = Vec::new();
    append_payment_id(&mut extra, payment_id);
    extra
}

/// A native output owned by the wallet, named by the transaction that
/// created it.
pub fn owned_output(label: &str, index: u32, amount: u64) -> UsedOutput {
    UsedOutput::native(OutputRef::new(tx_hash(label), index), amount)
}

/// A signed transaction spending `inputs_amount` through one key input.
pub fn signed_transaction(label: &str, inputs_amount: u64, extra: Vec<u8>) -> Transaction {
    Transaction {
        hash: tx_hash(label),
        version: 1,
        unlock_time: 0,
        inputs: vec![TransactionInput::Key {
            amount: inputs_amount,
            output_indexes: vec![0],
            key_image: tx_hash(&format!("{label}/key-image")),
        }],
        outputs: Vec::new(),
        extra,
    }
}

/// Chain view of a transaction moving `amount` plus the fixture fee.
pub fn confirmed(hash: Hash, height: BlockHeight, amount: u64) -> TransactionInfo {
    TransactionInfo {
        hash,
        block_height: height,
        timestamp: GENESIS_TIME + u64::from(height) * 120,
        total_amount_in: amount + FIXTURE_FEE,
        total_amount_out: amount,
        ..Default::default()
    }
}

/// Term deposit output at `index` of the transaction `hash`.
pub fn deposit_output(hash: Hash, index: u32, amount: u64, term: u32) -> DepositOutput {
    DepositOutput {
        transaction_hash: hash,
        output_in_transaction: index,
        amount,
        term,
    }
}

/// A wallet's cache wired to a manual clock and the default currency.
pub struct TestWallet {
    pub cache: SharedTransactionsCache,
    pub clock: Arc<ManualTimeSource>,
    pub currency: Arc<SimpleInterestCurrency>,
}

impl TestWallet {
    pub fn new() -> Self {
        init_tracing();
        let clock = Arc::new(ManualTimeSource::new(GENESIS_TIME));
        let currency = Arc::new(SimpleInterestCurrency::default());
        let cache = SharedTransactionsCache::new(
            CacheConfig::for_testing(),
            clock.clone(),
            currency.clone(),
        );
        tracing::debug!(now = GENESIS_TIME, "Test wallet created");
        Self {
            cache,
            clock,
            currency,
        }
    }
}

impl Default for TestWallet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::payment_id_from_extra;

    #[test]
    fn test_hashes_are_stable_and_distinct() {
        assert_eq!(tx_hash("a"), tx_hash("a"));
        assert_ne!(tx_hash("a"), tx_hash("b"));
        assert_ne!(tx_hash("a"), payment_id("a"));
    }

    #[test]
    fn test_extra_round_trips_payment_id() {
        let id = payment_id("invoice-7");
        assert_eq!(payment_id_from_extra(&extra_with_payment_id(&id)), Some(id));
    }

    #[test]
    fn test_confirmed_fee() {
        let info = confirmed(tx_hash("x"), 3, 500);
        assert_eq!(info.fee(), FIXTURE_FEE);
        assert!(!info.is_coinbase());
    }
}
