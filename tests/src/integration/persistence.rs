//! # Persistence Flows
//!
//! The cache is saved through a [`SnapshotStore`] and reloaded into a fresh
//! process. Pending reservations, deposit state and ledgers must survive;
//! TTL eviction must keep counting from the original send time.
//!
//! [`SnapshotStore`]: wl_03_transactions_cache::SnapshotStore

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use shared_types::{Hash, OutputRef, TransactionId};
    use wl_02_unconfirmed_set::ManualTimeSource;
    use wl_03_transactions_cache::{
        BincodeCodec, CacheConfig, CacheError, CacheEvent, ChainObserver, CodecError,
        FileSnapshotStore, JsonCodec, SharedTransactionsCache, SimpleInterestCurrency,
        SnapshotCodec, SnapshotStore, TransactionState, CACHE_SNAPSHOT_VERSION,
    };

    use crate::fixtures::{
        confirmed, deposit_output, owned_output, signed_transaction, tx_hash, TestWallet,
        FIXTURE_FEE, GENESIS_TIME,
    };

    /// One confirmed external deposit (id 0) and one broadcast but
    /// unconfirmed local send (id 1).
    fn wallet_with_pending_send() -> anyhow::Result<(TestWallet, Hash)> {
        let wallet = TestWallet::new();
        let creator = tx_hash("persist/deposit");
        wallet.cache.on_transaction_updated(
            &confirmed(creator, 40, 8_000),
            -8_010,
            &[deposit_output(creator, 0, 8_000, 300)],
            &[],
        )?;

        let id = wallet
            .cache
            .add_new_transaction(600, FIXTURE_FEE, Vec::new(), &[], 0, Vec::new())?;
        let transaction = signed_transaction("persist/send", 610, Vec::new());
        wallet.cache.update_transaction(
            id,
            &transaction,
            600,
            &[owned_output("persist/coin", 0, 610)],
        )?;
        wallet.cache.update_transaction_sending_state(id, Ok(()))?;
        Ok((wallet, transaction.hash))
    }

    fn reload(
        store: &dyn SnapshotStore,
        codec: &dyn SnapshotCodec,
        clock: Arc<ManualTimeSource>,
    ) -> anyhow::Result<SharedTransactionsCache> {
        SharedTransactionsCache::load(
            store,
            codec,
            CacheConfig::for_testing(),
            clock,
            Arc::new(SimpleInterestCurrency::default()),
        )?
        .ok_or_else(|| anyhow::anyhow!("store is empty"))
    }

    // =========================================================================
    // RESTART
    // =========================================================================

    #[test]
    fn test_restart_keeps_reservations_and_deposits() -> anyhow::Result<()> {
        let (wallet, send_hash) = wallet_with_pending_send()?;
        let dir = tempfile::tempdir()?;
        let store = FileSnapshotStore::new(dir.path().join("wallet").join("cache.json"));
        let codec = JsonCodec { pretty: true };
        wallet.cache.save(&store, &codec)?;

        let document: serde_json::Value = serde_json::from_slice(&std::fs::read(store.path())?)?;
        assert_eq!(document["version"].as_u64(), Some(u64::from(CACHE_SNAPSHOT_VERSION)));
        assert_eq!(document["transactions"].as_array().map(Vec::len), Some(2));

        let restored = reload(&store, &codec, Arc::new(ManualTimeSource::new(GENESIS_TIME + 30)))?;
        let coin = OutputRef::new(tx_hash("persist/coin"), 0);
        assert_eq!(restored.transaction_count(), 2);
        assert!(restored.read(|c| c.is_used(&coin)));
        assert_eq!(restored.pending_balance(), wallet.cache.pending_balance());
        assert_eq!(restored.deposit_balance(), wallet.cache.deposit_balance());
        assert_eq!(
            restored.get_deposit_id(&tx_hash("persist/deposit"), 0),
            wallet.cache.get_deposit_id(&tx_hash("persist/deposit"), 0)
        );
        assert_eq!(restored.read(|c| c.full_deposit_amount()), 8_000);

        // The pending entry still resolves to the local record.
        let events = restored.on_transaction_updated(&confirmed(send_hash, 45, 600), -610, &[], &[])?;
        assert_eq!(
            events.front(),
            Some(&CacheEvent::TransactionUpdated {
                transaction_id: TransactionId(1)
            })
        );
        assert_eq!(restored.transaction_count(), 2);
        assert!(!restored.read(|c| c.is_used(&coin)));
        Ok(())
    }

    #[test]
    fn test_eviction_counts_from_original_send_time() -> anyhow::Result<()> {
        let (wallet, send_hash) = wallet_with_pending_send()?;
        let dir = tempfile::tempdir()?;
        let store = FileSnapshotStore::new(dir.path().join("cache.bin"));
        wallet.cache.save(&store, &BincodeCodec)?;

        let clock = Arc::new(ManualTimeSource::new(GENESIS_TIME + 59));
        let restored = reload(&store, &BincodeCodec, clock.clone())?;
        assert!(restored.on_synchronization_completed().is_empty());

        clock.advance(1);
        let events = restored.on_synchronization_completed();
        assert_eq!(
            Vec::from(events),
            vec![CacheEvent::TransactionUpdated {
                transaction_id: TransactionId(1)
            }]
        );
        assert_eq!(
            restored.transaction(TransactionId(1)).map(|r| r.state),
            Some(TransactionState::Deleted)
        );
        assert!(!restored.read(|c| c.is_used(&OutputRef::new(tx_hash("persist/coin"), 0))));
        assert_eq!(restored.pending_balance().outs_amount, 0);

        // A late confirmation still lands on the evicted record.
        let events = restored.on_transaction_updated(&confirmed(send_hash, 46, 600), -610, &[], &[])?;
        assert_eq!(events.len(), 2);
        assert_eq!(
            restored.transaction(TransactionId(1)).map(|r| r.state),
            Some(TransactionState::Active)
        );
        Ok(())
    }

    // =========================================================================
    // DAMAGED STORES
    // =========================================================================

    #[test]
    fn test_missing_snapshot_loads_nothing() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let store = FileSnapshotStore::new(dir.path().join("absent.json"));
        let loaded = SharedTransactionsCache::load(
            &store,
            &JsonCodec::default(),
            CacheConfig::for_testing(),
            Arc::new(ManualTimeSource::new(GENESIS_TIME)),
            Arc::new(SimpleInterestCurrency::default()),
        )?;
        assert!(loaded.is_none());
        Ok(())
    }

    #[test]
    fn test_truncated_snapshot_is_rejected() -> anyhow::Result<()> {
        let (wallet, _) = wallet_with_pending_send()?;
        let dir = tempfile::tempdir()?;
        let store = FileSnapshotStore::new(dir.path().join("cache.json"));
        let codec = JsonCodec::default();
        let written = wallet.cache.save(&store, &codec)?;

        let bytes = std::fs::read(store.path())?;
        store.save(&bytes[..written / 2])?;

        let result = SharedTransactionsCache::load(
            &store,
            &codec,
            CacheConfig::for_testing(),
            Arc::new(ManualTimeSource::new(GENESIS_TIME)),
            Arc::new(SimpleInterestCurrency::default()),
        );
        assert!(matches!(
            result,
            Err(CacheError::Codec(CodecError::Decode { codec: "json", .. }))
        ));
        Ok(())
    }
}
