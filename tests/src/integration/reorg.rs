//! # Reorg Flows
//!
//! A reorg reaches the cache as `on_blocks_detached(fork_height)` followed
//! by one `on_transaction_deleted` per dropped transaction, then fresh
//! `on_transaction_updated` calls for whatever the new branch mines.
//!
//! 1. **Shallow reorg**: only the withdrawal is dropped; the deposit becomes
//!    withdrawable again and the withdrawal is re-mined on the new branch.
//! 2. **Deep reorg**: creator and withdrawal are both dropped; the deposit is
//!    deleted, then reactivated under its original id when re-mined.
//! 3. **Re-mined branch**: nothing is deleted; both transactions land
//!    higher on the new branch and the deposit ledger is rebuilt there.
//! 4. **Asset ledgers**: auxiliary asset balances roll back with the chain.

#[cfg(test)]
mod tests {
    use shared_types::{BlockHeight, DepositId, Hash, TransactionId};
    use wl_03_transactions_cache::{
        AssetDelta, CacheEvent, ChainObserver, CurrencyRules, Deposit, DepositKey, DepositOutput,
        DepositState, TransactionState,
    };

    use crate::fixtures::{confirmed, deposit_output, tx_hash, TestWallet};

    const DEPOSIT: u64 = 20_000;
    const TERM: u32 = 500;
    const CREATED_AT: BlockHeight = 100;
    const WITHDRAWN_AT: BlockHeight = 700;

    struct DepositChain {
        wallet: TestWallet,
        creator: Hash,
        withdrawal: Hash,
        output: DepositOutput,
        interest: u64,
    }

    /// External deposit confirmed at `CREATED_AT`, unlocked, then withdrawn
    /// at `WITHDRAWN_AT`.
    fn withdrawn_deposit() -> anyhow::Result<DepositChain> {
        let wallet = TestWallet::new();
        let creator = tx_hash("reorg/creator");
        let withdrawal = tx_hash("reorg/withdrawal");
        let output = deposit_output(creator, 0, DEPOSIT, TERM);

        wallet.cache.on_transaction_updated(
            &confirmed(creator, CREATED_AT, DEPOSIT),
            -i64::try_from(DEPOSIT)?,
            &[output],
            &[],
        )?;
        wallet.cache.unlock_deposits(&[DepositKey::new(creator, 0)]);

        let interest = wallet.currency.calculate_interest(DEPOSIT, TERM, CREATED_AT);
        wallet.cache.on_transaction_updated(
            &confirmed(withdrawal, WITHDRAWN_AT, DEPOSIT + interest),
            i64::try_from(DEPOSIT + interest)?,
            &[],
            &[output],
        )?;
        Ok(DepositChain {
            wallet,
            creator,
            withdrawal,
            output,
            interest,
        })
    }

    fn deposit(chain: &DepositChain) -> anyhow::Result<Deposit> {
        chain
            .wallet
            .cache
            .read(|c| c.deposit(DepositId(0)).cloned())
            .ok_or_else(|| anyhow::anyhow!("deposit missing"))
    }

    // =========================================================================
    // SHALLOW REORG
    // =========================================================================

    #[test]
    fn test_dropped_withdrawal_reopens_deposit() -> anyhow::Result<()> {
        let chain = withdrawn_deposit()?;
        let cache = &chain.wallet.cache;
        let withdrawal_id = TransactionId(1);
        assert_eq!(deposit(&chain)?.state, DepositState::Spent);

        assert_eq!(cache.on_blocks_detached(650), WITHDRAWN_AT + 1 - 650);
        let delta = i64::try_from(DEPOSIT + chain.interest)?;
        let events = cache.on_transaction_deleted(&chain.withdrawal);
        assert_eq!(
            Vec::from(events),
            vec![
                CacheEvent::TransactionUpdated {
                    transaction_id: withdrawal_id
                },
                CacheEvent::BalanceChanged {
                    transaction_id: withdrawal_id,
                    delta: -delta
                },
                CacheEvent::DepositsUpdated {
                    deposit_ids: vec![DepositId(0)]
                },
            ]
        );

        let reopened = deposit(&chain)?;
        assert_eq!(reopened.state, DepositState::Active);
        assert_eq!(reopened.spending_transaction_id, None);
        assert_eq!(cache.deposit_balance().unlocked, DEPOSIT + chain.interest);
        assert_eq!(cache.read(|c| c.full_deposit_amount()), i64::try_from(DEPOSIT)?);
        assert!(cache.on_transaction_deleted(&chain.withdrawal).is_empty());

        // The new branch mines the same withdrawal a few blocks later.
        let events = cache.on_transaction_updated(
            &confirmed(chain.withdrawal, 660, DEPOSIT + chain.interest),
            delta,
            &[],
            &[chain.output],
        )?;
        assert_eq!(
            events.back(),
            Some(&CacheEvent::DepositSpent {
                deposit_id: DepositId(0)
            })
        );
        assert_eq!(cache.transaction_count(), 2);
        assert_eq!(
            cache.transaction(withdrawal_id).and_then(|r| r.block_height),
            Some(660)
        );
        assert_eq!(deposit(&chain)?.spending_transaction_id, Some(withdrawal_id));
        assert_eq!(cache.read(|c| c.full_deposit_amount()), 0);
        Ok(())
    }

    // =========================================================================
    // DEEP REORG
    // =========================================================================

    #[test]
    fn test_deep_reorg_deletes_then_reactivates_deposit() -> anyhow::Result<()> {
        let chain = withdrawn_deposit()?;
        let cache = &chain.wallet.cache;

        cache.on_blocks_detached(50);
        assert_eq!(cache.read(|c| c.deposit_ledger().block_count()), 50);

        // Deleting the creator first leaves the spent deposit alone.
        let events = cache.on_transaction_deleted(&chain.creator);
        assert_eq!(events.len(), 2);
        assert_eq!(deposit(&chain)?.state, DepositState::Spent);

        let events = cache.on_transaction_deleted(&chain.withdrawal);
        assert_eq!(
            events.back(),
            Some(&CacheEvent::DepositsUpdated {
                deposit_ids: vec![DepositId(0)]
            })
        );
        assert_eq!(deposit(&chain)?.state, DepositState::Deleted);
        assert_eq!(cache.deposit_balance().locked, 0);
        assert_eq!(cache.deposit_balance().unlocked, 0);
        assert_eq!(cache.read(|c| c.full_deposit_amount()), 0);
        assert_eq!(
            cache.transaction(TransactionId(0)).map(|r| r.state),
            Some(TransactionState::Deleted)
        );

        // The creator lands lower on the new branch.
        let events = cache.on_transaction_updated(
            &confirmed(chain.creator, 80, DEPOSIT),
            -i64::try_from(DEPOSIT)?,
            &[chain.output],
            &[],
        )?;
        assert_eq!(
            Vec::from(events),
            vec![
                CacheEvent::TransactionUpdated {
                    transaction_id: TransactionId(0)
                },
                CacheEvent::BalanceChanged {
                    transaction_id: TransactionId(0),
                    delta: -i64::try_from(DEPOSIT)?
                },
                CacheEvent::DepositCreated {
                    deposit_id: DepositId(0)
                },
            ]
        );

        let reactivated = deposit(&chain)?;
        let interest = chain.wallet.currency.calculate_interest(DEPOSIT, TERM, 80);
        assert_eq!(reactivated.state, DepositState::Locked);
        assert_eq!(reactivated.height, 80);
        assert_eq!(reactivated.unlock_height, 80 + TERM);
        assert_eq!(reactivated.interest, interest);
        assert_eq!(cache.read(|c| c.deposit_count()), 1);
        assert_eq!(cache.get_deposit_id(&chain.creator, 0), Some(DepositId(0)));
        assert_eq!(cache.deposit_balance().locked, DEPOSIT + interest);
        assert_eq!(cache.read(|c| c.deposit_amount_at_height(80)), i64::try_from(DEPOSIT)?);
        Ok(())
    }

    #[test]
    fn test_spending_deleted_deposit_is_rejected() -> anyhow::Result<()> {
        let chain = withdrawn_deposit()?;
        let cache = &chain.wallet.cache;
        cache.on_blocks_detached(50);
        cache.on_transaction_deleted(&chain.withdrawal);
        cache.on_transaction_deleted(&chain.creator);

        let before = cache.read(|c| c.snapshot());
        let result = cache.on_transaction_updated(
            &confirmed(chain.withdrawal, 90, DEPOSIT),
            1,
            &[],
            &[chain.output],
        );
        assert!(result.is_err());
        assert_eq!(cache.read(|c| c.snapshot()), before);
        Ok(())
    }

    // =========================================================================
    // RE-MINED BRANCH
    // =========================================================================

    #[test]
    fn test_branch_remines_without_deletions() -> anyhow::Result<()> {
        let chain = withdrawn_deposit()?;
        let cache = &chain.wallet.cache;

        cache.on_blocks_detached(CREATED_AT);
        assert_eq!(cache.read(|c| c.full_deposit_amount()), 0);
        assert_eq!(cache.transaction(TransactionId(0)).and_then(|r| r.block_height), None);
        assert_eq!(deposit(&chain)?.state, DepositState::Spent);

        let events = cache.on_transaction_updated(
            &confirmed(chain.creator, 120, DEPOSIT),
            -i64::try_from(DEPOSIT)?,
            &[chain.output],
            &[],
        )?;
        assert_eq!(
            Vec::from(events),
            vec![
                CacheEvent::TransactionUpdated {
                    transaction_id: TransactionId(0)
                },
                CacheEvent::DepositsUpdated {
                    deposit_ids: vec![DepositId(0)]
                },
            ]
        );
        assert_eq!(cache.read(|c| c.full_deposit_amount()), i64::try_from(DEPOSIT)?);

        let interest = chain.wallet.currency.calculate_interest(DEPOSIT, TERM, 120);
        let events = cache.on_transaction_updated(
            &confirmed(chain.withdrawal, 720, DEPOSIT + chain.interest),
            i64::try_from(DEPOSIT + chain.interest)?,
            &[],
            &[chain.output],
        )?;
        assert_eq!(
            Vec::from(events),
            vec![
                CacheEvent::TransactionUpdated {
                    transaction_id: TransactionId(1)
                },
                CacheEvent::DepositSpent {
                    deposit_id: DepositId(0)
                },
            ]
        );
        cache.read(|c| {
            assert_eq!(c.full_deposit_amount(), 0);
            assert_eq!(c.deposit_amount_at_height(719), DEPOSIT as i64);
            assert_eq!(c.full_deposit_interest(), interest);
        });

        let moved = deposit(&chain)?;
        assert_eq!(moved.height, 120);
        assert_eq!(moved.unlock_height, 120 + TERM);
        assert_eq!(moved.interest, interest);
        assert_eq!(moved.spending_transaction_id, Some(TransactionId(1)));
        assert_eq!(cache.transaction_count(), 2);
        Ok(())
    }

    // =========================================================================
    // ASSET LEDGERS
    // =========================================================================

    #[test]
    fn test_asset_balances_follow_the_chain() -> anyhow::Result<()> {
        let wallet = TestWallet::new();
        let cache = &wallet.cache;
        const TOKEN: u64 = 7;

        for (label, height, amount) in [("asset-a", 10, 300i64), ("asset-b", 20, 200)] {
            let mut info = confirmed(tx_hash(label), height, 0);
            info.asset_deltas = vec![AssetDelta {
                asset_id: TOKEN,
                amount,
            }];
            cache.on_transaction_updated(&info, 0, &[], &[])?;
        }
        cache.read(|c| {
            assert_eq!(c.full_asset_amount(TOKEN), 500);
            assert_eq!(c.asset_amount_at_height(TOKEN, 15), 300);
        });

        cache.on_blocks_detached(15);
        cache.on_transaction_deleted(&tx_hash("asset-b"));
        cache.read(|c| {
            assert_eq!(c.full_asset_amount(TOKEN), 300);
            assert!(c.asset_ledger(TOKEN).is_some());
        });

        cache.on_blocks_detached(5);
        cache.read(|c| {
            assert_eq!(c.full_asset_amount(TOKEN), 0);
            assert!(c.asset_ledger(TOKEN).is_none());
        });
        Ok(())
    }
}
