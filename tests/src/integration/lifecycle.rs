//! # Lifecycle Flows
//!
//! Happy-path journeys through the cache:
//!
//! 1. **Incoming payment**: an external transaction with a payment id is
//!    confirmed and becomes queryable by that id.
//! 2. **Local send**: create, sign, broadcast, confirm. Reserved outputs and
//!    pending aggregates are released on confirmation.
//! 3. **Failed send**: a rejected broadcast frees its outputs for reuse.
//! 4. **Deposit round trip**: create a term deposit, unlock it, withdraw it.

#[cfg(test)]
mod tests {
    use shared_types::{DepositId, OutputRef, TransactionId};
    use wl_02_unconfirmed_set::SpentDepositDetails;
    use wl_03_transactions_cache::{
        CacheEvent, ChainObserver, CurrencyRules, DepositKey, DepositState, PendingBalance,
        SendFailure, TransactionState, TransferRecord,
    };

    use crate::fixtures::{
        confirmed, deposit_output, extra_with_payment_id, owned_output, payment_id,
        signed_transaction, tx_hash, TestWallet, FIXTURE_FEE,
    };

    // =========================================================================
    // INCOMING PAYMENTS
    // =========================================================================

    #[test]
    fn test_incoming_payment_is_found_by_payment_id() -> anyhow::Result<()> {
        let wallet = TestWallet::new();
        let invoice = payment_id("invoice-42");

        let mut info = confirmed(tx_hash("incoming-1"), 10, 5_000);
        info.extra = extra_with_payment_id(&invoice);
        let events = wallet.cache.on_transaction_updated(&info, 5_000, &[], &[])?;
        assert_eq!(
            Vec::from(events),
            vec![
                CacheEvent::ExternalTransactionCreated {
                    transaction_id: TransactionId(0)
                },
                CacheEvent::BalanceChanged {
                    transaction_id: TransactionId(0),
                    delta: 5_000
                },
            ]
        );

        // Outgoing transactions carrying the same id are not payments.
        let mut refund = confirmed(tx_hash("refund-1"), 11, 300);
        refund.extra = extra_with_payment_id(&invoice);
        wallet.cache.on_transaction_updated(&refund, -310, &[], &[])?;

        let unknown = payment_id("never-used");
        let payments = wallet
            .cache
            .get_transactions_by_payment_ids(&[unknown, invoice]);
        assert_eq!(payments.len(), 2);
        assert_eq!(payments[0].payment_id, unknown);
        assert!(payments[0].transactions.is_empty());
        assert_eq!(payments[1].payment_id, invoice);
        assert_eq!(payments[1].transactions.len(), 1);

        let payment = &payments[1].transactions[0];
        assert_eq!(payment.hash, Some(tx_hash("incoming-1")));
        assert_eq!(payment.total_amount, 5_000);
        assert_eq!(payment.fee, FIXTURE_FEE);
        assert_eq!(payment.block_height, Some(10));
        Ok(())
    }

    // =========================================================================
    // LOCAL SENDS
    // =========================================================================

    #[test]
    fn test_local_send_until_confirmed() -> anyhow::Result<()> {
        let wallet = TestWallet::new();
        let cache = &wallet.cache;

        let id = cache.add_new_transaction(
            1_000,
            FIXTURE_FEE,
            Vec::new(),
            &[TransferRecord::new("recipient", 1_000)],
            0,
            vec!["thanks".to_string()],
        )?;
        assert_eq!(cache.transaction(id).map(|r| r.state), Some(TransactionState::Sending));

        let transaction = signed_transaction("send-1", 1_100, Vec::new());
        let inputs = [owned_output("coin-a", 0, 700), owned_output("coin-b", 1, 400)];
        cache.update_transaction(id, &transaction, 1_000, &inputs)?;
        assert_eq!(
            cache.pending_balance(),
            PendingBalance {
                outs_amount: 1_100,
                transactions_amount: 1_000,
                created_deposits: 0,
                spent_deposits_profit: 0,
            }
        );
        assert!(cache.read(|c| c.is_used(&OutputRef::new(tx_hash("coin-a"), 0))));

        let events = cache.update_transaction_sending_state(id, Ok(()))?;
        assert_eq!(
            Vec::from(events),
            vec![CacheEvent::SendTransactionCompleted {
                transaction_id: id,
                result: Ok(())
            }]
        );
        let record = cache.transaction(id).ok_or_else(|| anyhow::anyhow!("record missing"))?;
        assert_eq!(record.state, TransactionState::Active);
        assert_eq!(record.block_height, None);

        wallet.clock.advance(90);
        let info = confirmed(transaction.hash, 20, 1_090);
        let events = cache.on_transaction_updated(&info, -1_100, &[], &[])?;
        assert_eq!(
            Vec::from(events),
            vec![
                CacheEvent::TransactionUpdated { transaction_id: id },
                CacheEvent::BalanceChanged {
                    transaction_id: id,
                    delta: -1_100
                },
            ]
        );

        let record = cache.transaction(id).ok_or_else(|| anyhow::anyhow!("record missing"))?;
        assert!(record.is_confirmed());
        assert_eq!(record.messages, vec!["thanks".to_string()]);
        assert_eq!(record.total_amount, -1_000);
        assert_eq!(cache.transaction_count(), 1);
        assert_eq!(cache.pending_balance(), PendingBalance::default());
        assert!(!cache.read(|c| c.is_used(&OutputRef::new(tx_hash("coin-a"), 0))));
        assert_eq!(
            cache.read(|c| c.transfers_of(id).map(|t| t.to_vec()))?,
            vec![TransferRecord::new("recipient", 1_000)]
        );

        // The sync layer may report the same block again.
        assert!(cache.on_transaction_updated(&info, -1_100, &[], &[])?.is_empty());
        Ok(())
    }

    #[test]
    fn test_rejected_send_frees_outputs() -> anyhow::Result<()> {
        let wallet = TestWallet::new();
        let cache = &wallet.cache;
        let inputs = [owned_output("coin-c", 0, 2_000)];

        let first = cache.add_new_transaction(1_500, FIXTURE_FEE, Vec::new(), &[], 0, Vec::new())?;
        cache.update_transaction(first, &signed_transaction("send-a", 2_000, Vec::new()), 1_500, &inputs)?;

        let second = cache.add_new_transaction(1_500, FIXTURE_FEE, Vec::new(), &[], 0, Vec::new())?;
        let double_spend =
            cache.update_transaction(second, &signed_transaction("send-b", 2_000, Vec::new()), 1_500, &inputs);
        assert!(double_spend.is_err());

        let failure = SendFailure::Rejected {
            reason: "fee too low".to_string(),
        };
        let events = cache.update_transaction_sending_state(first, Err(failure.clone()))?;
        assert_eq!(
            events.front(),
            Some(&CacheEvent::SendTransactionCompleted {
                transaction_id: first,
                result: Err(failure)
            })
        );
        assert_eq!(cache.transaction(first).map(|r| r.state), Some(TransactionState::Failed));
        assert_eq!(cache.pending_balance(), PendingBalance::default());

        cache.update_transaction(second, &signed_transaction("send-b", 2_000, Vec::new()), 1_500, &inputs)?;
        assert_eq!(cache.pending_balance().outs_amount, 2_000);
        Ok(())
    }

    // =========================================================================
    // DEPOSITS
    // =========================================================================

    #[test]
    fn test_deposit_create_unlock_withdraw() -> anyhow::Result<()> {
        let wallet = TestWallet::new();
        let cache = &wallet.cache;

        // Create
        let creator = cache.add_new_transaction(50_000, FIXTURE_FEE, Vec::new(), &[], 0, Vec::new())?;
        let create_tx = signed_transaction("deposit-create", 50_010, Vec::new());
        cache.update_transaction(creator, &create_tx, 50_000, &[owned_output("coin-d", 0, 50_010)])?;
        cache.add_created_deposit(creator, 50_000)?;
        assert_eq!(cache.pending_balance().created_deposits, 50_000);
        cache.update_transaction_sending_state(creator, Ok(()))?;

        let output = deposit_output(create_tx.hash, 0, 50_000, 1_000);
        let events = cache.on_transaction_updated(&confirmed(create_tx.hash, 100, 50_000), -50_010, &[output], &[])?;
        assert_eq!(
            events.back(),
            Some(&CacheEvent::DepositCreated {
                deposit_id: DepositId(0)
            })
        );
        assert_eq!(cache.pending_balance(), PendingBalance::default());

        let interest = wallet.currency.calculate_interest(50_000, 1_000, 100);
        let deposit = cache
            .read(|c| c.deposit(DepositId(0)).cloned())
            .ok_or_else(|| anyhow::anyhow!("deposit missing"))?;
        assert_eq!(deposit.state, DepositState::Locked);
        assert_eq!(deposit.interest, interest);
        assert_eq!(deposit.unlock_height, 1_100);
        assert_eq!(deposit.creating_transaction_id, creator);
        assert_eq!(cache.deposit_balance().locked, 50_000 + interest);
        assert_eq!(cache.get_deposit_id(&create_tx.hash, 0), Some(DepositId(0)));

        // Unlock
        let key = DepositKey::new(create_tx.hash, 0);
        assert_eq!(cache.unlock_deposits(&[key]), vec![DepositId(0)]);
        assert!(cache.unlock_deposits(&[key]).is_empty());
        assert_eq!(cache.deposit_balance().unlocked, 50_000 + interest);

        // Withdraw
        let withdrawal = cache.add_new_transaction(0, FIXTURE_FEE, Vec::new(), &[], 0, Vec::new())?;
        let withdraw_tx = signed_transaction("deposit-withdraw", 50_000 + interest, Vec::new());
        cache.update_transaction(withdrawal, &withdraw_tx, 0, &[])?;
        cache.add_deposit_spending_transaction(
            withdraw_tx.hash,
            SpentDepositDetails {
                transaction_id: withdrawal,
                deposits_sum: 50_000 + interest,
                fee: FIXTURE_FEE,
            },
        )?;
        assert_eq!(
            cache.pending_balance().spent_deposits_profit,
            50_000 + interest - FIXTURE_FEE
        );
        cache.update_transaction_sending_state(withdrawal, Ok(()))?;

        let profit = i64::try_from(50_000 + interest - FIXTURE_FEE)?;
        let info = confirmed(withdraw_tx.hash, 1_200, 50_000 + interest - FIXTURE_FEE);
        let events = cache.on_transaction_updated(&info, profit, &[], &[output])?;
        assert_eq!(
            Vec::from(events),
            vec![
                CacheEvent::TransactionUpdated {
                    transaction_id: withdrawal
                },
                CacheEvent::BalanceChanged {
                    transaction_id: withdrawal,
                    delta: profit
                },
                CacheEvent::DepositSpent {
                    deposit_id: DepositId(0)
                },
            ]
        );

        let deposit = cache
            .read(|c| c.deposit(DepositId(0)).cloned())
            .ok_or_else(|| anyhow::anyhow!("deposit missing"))?;
        assert_eq!(deposit.state, DepositState::Spent);
        assert_eq!(deposit.spending_transaction_id, Some(withdrawal));
        assert_eq!(cache.pending_balance(), PendingBalance::default());
        assert_eq!(cache.deposit_balance().locked + cache.deposit_balance().unlocked, 0);

        cache.read(|c| {
            assert_eq!(c.full_deposit_amount(), 0);
            assert_eq!(c.deposit_amount_at_height(1_199), 50_000);
            assert_eq!(c.deposit_amount_at_height(99), 0);
            assert_eq!(c.full_deposit_interest(), interest);
        });
        Ok(())
    }
}
