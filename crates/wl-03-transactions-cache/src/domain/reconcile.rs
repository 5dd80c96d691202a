//! # Chain Reconciliation
//!
//! Applies chain-sync notifications to the cache.
//!
//! `on_transaction_updated` runs in two phases: every lookup, deposit
//! transition and ledger effect is planned and validated first, then the
//! plan is applied. An error from the first phase leaves the cache as it
//! was.

use std::collections::{BTreeMap, HashSet, VecDeque};

use shared_types::{short_hash, AssetId, BlockHeight, DepositId, Hash, TransactionId, NATIVE_ASSET_ID};
use tracing::{debug, info, warn};
use wl_01_height_ledger::AssetLedger;

use super::cache::TransactionsCache;
use super::entities::{Deposit, DepositState, TransactionRecord, TransactionState};
use super::errors::CacheError;
use super::events::CacheEvent;
use super::value_objects::{DepositOutput, TransactionInfo};
use crate::ports::CurrencyRules;

enum CreatedDeposit {
    New {
        output: DepositOutput,
        interest: u64,
        unlock_height: BlockHeight,
    },
    Reactivated {
        deposit_id: DepositId,
        interest: u64,
        unlock_height: BlockHeight,
    },
    /// Creator re-mined after a detach; the deposit keeps its state.
    Moved {
        deposit_id: DepositId,
        interest: u64,
        unlock_height: BlockHeight,
    },
}

#[derive(Default)]
struct DepositPlan {
    created: Vec<CreatedDeposit>,
    spent: Vec<DepositId>,
    created_amount: u64,
    spent_amount: u64,
    interest: u64,
}

impl DepositPlan {
    fn is_empty(&self) -> bool {
        self.created.is_empty() && self.spent.is_empty()
    }

    fn ledger_delta(&self) -> Result<i64, CacheError> {
        let overflow = CacheError::AmountOverflow {
            context: "deposit ledger delta",
        };
        let created = i64::try_from(self.created_amount).map_err(|_| overflow.clone())?;
        let spent = i64::try_from(self.spent_amount).map_err(|_| overflow.clone())?;
        created.checked_sub(spent).ok_or(overflow)
    }
}

fn add_amount(sum: u64, amount: u64, context: &'static str) -> Result<u64, CacheError> {
    sum.checked_add(amount)
        .ok_or(CacheError::AmountOverflow { context })
}

impl TransactionsCache {
    // =========================================================================
    // CONFIRMATION
    // =========================================================================

    /// Applies a confirmed (or re-reported) transaction.
    ///
    /// Unseen hashes become external records. Deposits listed in
    /// `new_deposits` are created, or reactivated if a reorg deleted them;
    /// those in `spent_deposits` are withdrawn. Repeated notifications are
    /// absorbed without effects. A record whose block was detached is
    /// confirmed again and its ledger effects are recorded at the new
    /// height, but its balance change is not reported twice.
    pub fn on_transaction_updated(
        &mut self,
        info: &TransactionInfo,
        balance_delta: i64,
        new_deposits: &[DepositOutput],
        spent_deposits: &[DepositOutput],
        currency: &dyn CurrencyRules,
    ) -> Result<VecDeque<CacheEvent>, CacheError> {
        let height = info.block_height;
        let target = self.resolve_hash(&info.hash)?;
        let (previously_confirmed, balance_applied) = match target {
            Some(id) => {
                let record = &self.transactions[id.index()];
                (record.is_confirmed(), record.is_confirmed() || record.balance_applied())
            }
            None => (false, false),
        };

        let plan = self.plan_deposits(
            info,
            target,
            previously_confirmed,
            new_deposits,
            spent_deposits,
            currency,
        )?;
        if !plan.is_empty() {
            self.deposit_ledger
                .check_record_at(height, plan.ledger_delta()?, plan.interest)?;
        }
        let asset_deltas = if previously_confirmed {
            BTreeMap::new()
        } else {
            self.plan_asset_deltas(info)?
        };

        // Every ledger call below was checked above.
        self.unconfirmed.erase(&info.hash);
        let (transaction_id, transaction_event) = match target {
            Some(id) => {
                let changed = self.confirm_record(id, info, balance_delta, balance_applied);
                (id, changed.then_some(CacheEvent::TransactionUpdated { transaction_id: id }))
            }
            None => {
                let id = self.insert_external(info, balance_delta);
                (id, Some(CacheEvent::ExternalTransactionCreated { transaction_id: id }))
            }
        };
        self.payment_index
            .index(&self.transactions[transaction_id.index()]);

        let mut events = VecDeque::new();
        events.extend(transaction_event);
        if !balance_applied && balance_delta != 0 {
            events.push_back(CacheEvent::BalanceChanged {
                transaction_id,
                delta: balance_delta,
            });
        }

        if !plan.is_empty() {
            self.deposit_ledger
                .record_at(height, plan.ledger_delta()?, plan.interest)?;
            self.apply_deposits(transaction_id, height, plan, &mut events);
        }
        for (asset_id, delta) in asset_deltas {
            let hint = self.config.ledger_capacity_hint;
            self.asset_ledgers
                .entry(asset_id)
                .or_insert_with(|| AssetLedger::with_capacity(hint))
                .record_at(height, delta, asset_id)?;
        }

        if previously_confirmed {
            debug!(id = %transaction_id, tx = %short_hash(&info.hash), height, "Transaction re-reported");
        } else {
            info!(
                id = %transaction_id,
                tx = %short_hash(&info.hash),
                height,
                delta = %currency.format_amount(balance_delta),
                external = target.is_none(),
                "Transaction confirmed"
            );
        }
        Ok(events)
    }

    fn resolve_hash(&self, hash: &Hash) -> Result<Option<TransactionId>, CacheError> {
        let id = self
            .unconfirmed
            .find_transaction_id(hash)
            .or_else(|| self.hash_index.get(hash).copied());
        match id {
            Some(id) if id.index() >= self.transactions.len() => {
                Err(CacheError::UnknownTransaction(id))
            }
            other => Ok(other),
        }
    }

    fn plan_deposits(
        &self,
        info: &TransactionInfo,
        target: Option<TransactionId>,
        previously_confirmed: bool,
        new_deposits: &[DepositOutput],
        spent_deposits: &[DepositOutput],
        currency: &dyn CurrencyRules,
    ) -> Result<DepositPlan, CacheError> {
        let height = info.block_height;
        let mut plan = DepositPlan::default();

        let mut seen = HashSet::with_capacity(new_deposits.len());
        for output in new_deposits {
            let key = output.key();
            if !seen.insert(key) {
                continue;
            }
            if output.transaction_hash != info.hash {
                return Err(CacheError::DepositOutputMismatch {
                    transaction_hash: info.hash,
                    output_hash: output.transaction_hash,
                });
            }
            if output.term == 0 {
                return Err(CacheError::InvalidDepositTerm {
                    hash: info.hash,
                    output_index: output.output_in_transaction,
                });
            }

            let existing = self.deposit_index.get(&key).map(|id| &self.deposits[id.index()]);
            let moved = existing.is_some_and(|deposit| deposit.state != DepositState::Deleted);
            if moved && previously_confirmed {
                continue;
            }

            let unlock_height =
                height
                    .checked_add(output.term)
                    .ok_or(CacheError::AmountOverflow {
                        context: "deposit unlock height",
                    })?;
            let amount = existing.map_or(output.amount, |deposit| deposit.amount);
            let interest = currency.calculate_interest(amount, output.term, height);
            plan.created_amount = add_amount(plan.created_amount, amount, "created deposits")?;
            plan.interest = add_amount(plan.interest, interest, "deposit interest")?;
            plan.created.push(match existing {
                Some(deposit) if moved => CreatedDeposit::Moved {
                    deposit_id: deposit.id,
                    interest,
                    unlock_height,
                },
                Some(deposit) => CreatedDeposit::Reactivated {
                    deposit_id: deposit.id,
                    interest,
                    unlock_height,
                },
                None => CreatedDeposit::New {
                    output: *output,
                    interest,
                    unlock_height,
                },
            });
        }

        let mut seen = HashSet::with_capacity(spent_deposits.len());
        for output in spent_deposits {
            let key = output.key();
            if !seen.insert(key) {
                continue;
            }
            let deposit_id =
                self.deposit_index
                    .get(&key)
                    .copied()
                    .ok_or(CacheError::UnknownDepositOutput {
                        hash: key.transaction_hash,
                        output_index: key.output_index,
                    })?;
            let deposit = &self.deposits[deposit_id.index()];
            match deposit.state {
                DepositState::Locked | DepositState::Active => {}
                DepositState::Spent if target.is_some() && deposit.spending_transaction_id == target => {
                    if previously_confirmed {
                        continue;
                    }
                }
                DepositState::Spent => {
                    return Err(CacheError::DepositAlreadySpent {
                        deposit_id,
                        spent_by: deposit.spending_transaction_id,
                    });
                }
                DepositState::Deleted => {
                    return Err(CacheError::DepositNotSpendable {
                        deposit_id,
                        state: deposit.state,
                    });
                }
            }
            plan.spent_amount = add_amount(plan.spent_amount, deposit.amount, "spent deposits")?;
            plan.spent.push(deposit_id);
        }

        Ok(plan)
    }

    fn plan_asset_deltas(&self, info: &TransactionInfo) -> Result<BTreeMap<AssetId, i64>, CacheError> {
        let mut deltas: BTreeMap<AssetId, i64> = BTreeMap::new();
        for delta in &info.asset_deltas {
            if delta.asset_id == NATIVE_ASSET_ID || delta.amount == 0 {
                continue;
            }
            let sum = deltas.entry(delta.asset_id).or_default();
            *sum = sum
                .checked_add(delta.amount)
                .ok_or(CacheError::AmountOverflow {
                    context: "asset delta",
                })?;
        }
        deltas.retain(|_, amount| *amount != 0);

        let empty = AssetLedger::new();
        for (&asset_id, &amount) in &deltas {
            self.asset_ledgers
                .get(&asset_id)
                .unwrap_or(&empty)
                .check_record_at(info.block_height, amount, asset_id)?;
        }
        Ok(deltas)
    }

    /// Returns whether anything observable changed.
    fn confirm_record(
        &mut self,
        transaction_id: TransactionId,
        info: &TransactionInfo,
        balance_delta: i64,
        balance_applied: bool,
    ) -> bool {
        let record = &mut self.transactions[transaction_id.index()];
        let changed = record.state != TransactionState::Active
            || record.block_height != Some(info.block_height)
            || record.timestamp != info.timestamp;

        record.state = TransactionState::Active;
        record.block_height = Some(info.block_height);
        record.timestamp = info.timestamp;
        if !balance_applied {
            record.balance_delta = balance_delta;
        }
        if record.extra.is_empty() {
            record.extra = info.extra.clone();
        }
        if record.messages.is_empty() {
            record.messages = info.messages.clone();
        }
        if record.hash.is_none() {
            record.hash = Some(info.hash);
            self.hash_index.insert(info.hash, transaction_id);
        }
        changed
    }

    fn insert_external(&mut self, info: &TransactionInfo, balance_delta: i64) -> TransactionId {
        let id = TransactionId(self.transactions.len());
        self.transactions.push(TransactionRecord {
            id,
            hash: Some(info.hash),
            state: TransactionState::Active,
            block_height: Some(info.block_height),
            timestamp: info.timestamp,
            sent_time: 0,
            total_amount: balance_delta,
            balance_delta,
            fee: info.fee(),
            first_transfer_id: None,
            transfer_count: 0,
            first_deposit_id: None,
            deposit_count: 0,
            unlock_time: info.unlock_time,
            extra: info.extra.clone(),
            messages: info.messages.clone(),
            is_coinbase: info.is_coinbase(),
        });
        self.hash_index.insert(info.hash, id);
        id
    }

    fn apply_deposits(
        &mut self,
        transaction_id: TransactionId,
        height: BlockHeight,
        plan: DepositPlan,
        events: &mut VecDeque<CacheEvent>,
    ) {
        let mut moved = Vec::new();
        for created in plan.created {
            let deposit_id = match created {
                CreatedDeposit::New {
                    output,
                    interest,
                    unlock_height,
                } => {
                    let deposit_id = DepositId(self.deposits.len());
                    self.deposits.push(Deposit {
                        id: deposit_id,
                        creating_transaction_id: transaction_id,
                        spending_transaction_id: None,
                        output_in_transaction: output.output_in_transaction,
                        amount: output.amount,
                        interest,
                        term: output.term,
                        height,
                        unlock_height,
                        state: DepositState::Locked,
                        spent_from: None,
                    });
                    self.deposit_index.insert(output.key(), deposit_id);

                    let record = &mut self.transactions[transaction_id.index()];
                    record.first_deposit_id.get_or_insert(deposit_id);
                    record.deposit_count += 1;
                    deposit_id
                }
                CreatedDeposit::Reactivated {
                    deposit_id,
                    interest,
                    unlock_height,
                } => {
                    let deposit = &mut self.deposits[deposit_id.index()];
                    deposit.state = DepositState::Locked;
                    deposit.spent_from = None;
                    deposit.interest = interest;
                    deposit.height = height;
                    deposit.unlock_height = unlock_height;
                    deposit_id
                }
                CreatedDeposit::Moved {
                    deposit_id,
                    interest,
                    unlock_height,
                } => {
                    let deposit = &mut self.deposits[deposit_id.index()];
                    deposit.interest = interest;
                    deposit.height = height;
                    deposit.unlock_height = unlock_height;
                    moved.push(deposit_id);
                    continue;
                }
            };
            events.push_back(CacheEvent::DepositCreated { deposit_id });
        }
        if !moved.is_empty() {
            events.push_back(CacheEvent::DepositsUpdated { deposit_ids: moved });
        }

        for deposit_id in plan.spent {
            let deposit = &mut self.deposits[deposit_id.index()];
            if deposit.state != DepositState::Spent {
                deposit.spent_from = Some(deposit.state);
            }
            deposit.state = DepositState::Spent;
            deposit.spending_transaction_id = Some(transaction_id);
            events.push_back(CacheEvent::DepositSpent { deposit_id });
        }
    }

    // =========================================================================
    // DELETION
    // =========================================================================

    /// Marks the transaction with `hash` as deleted and rolls back the
    /// deposit states it caused. The ledgers are left to
    /// [`on_blocks_detached`](Self::on_blocks_detached).
    pub fn on_transaction_deleted(&mut self, hash: &Hash) -> VecDeque<CacheEvent> {
        let pending_id = self.unconfirmed.find_transaction_id(hash);
        self.unconfirmed.erase(hash);

        let mut events = VecDeque::new();
        let Some(transaction_id) = pending_id.or_else(|| self.hash_index.get(hash).copied()) else {
            debug!(tx = %short_hash(hash), "Deletion of unknown transaction ignored");
            return events;
        };
        let record = self.transactions.get_mut(transaction_id.index());
        debug_assert!(record.is_some(), "transaction {transaction_id} has no record");
        let Some(record) = record else {
            warn!(id = %transaction_id, "Index points past the record list");
            return events;
        };
        if record.state == TransactionState::Deleted || record.state.is_terminal() {
            return events;
        }

        let balance_applied = record.balance_applied();
        let balance_delta = record.balance_delta;
        record.state = TransactionState::Deleted;
        record.block_height = None;
        record.timestamp = 0;

        events.push_back(CacheEvent::TransactionUpdated { transaction_id });
        if balance_applied {
            events.push_back(CacheEvent::BalanceChanged {
                transaction_id,
                delta: balance_delta.saturating_neg(),
            });
        }

        let mut updated = Vec::new();
        for deposit in &mut self.deposits {
            if deposit.creating_transaction_id == transaction_id && deposit.state.is_live() {
                deposit.state = DepositState::Deleted;
                updated.push(deposit.id);
            } else if deposit.spending_transaction_id == Some(transaction_id) {
                let creator_deleted = self
                    .transactions
                    .get(deposit.creating_transaction_id.index())
                    .is_some_and(|creator| creator.state == TransactionState::Deleted);
                deposit.state = if creator_deleted {
                    DepositState::Deleted
                } else {
                    deposit.spent_from.unwrap_or(DepositState::Active)
                };
                deposit.spent_from = None;
                deposit.spending_transaction_id = None;
                updated.push(deposit.id);
            }
        }

        info!(
            id = %transaction_id,
            tx = %short_hash(hash),
            balance_applied,
            deposits = updated.len(),
            "Transaction deleted"
        );
        if !updated.is_empty() {
            events.push_back(CacheEvent::DepositsUpdated {
                deposit_ids: updated,
            });
        }
        events
    }

    /// Rolls every ledger back to `from_height` and unconfirms the records
    /// mined at or above it. Returns the number of deposit-ledger blocks
    /// removed.
    ///
    /// Detached records stay `Active` with their deposits untouched until
    /// the chain either re-mines them, which records their ledger effects
    /// again, or deletes them.
    pub fn on_blocks_detached(&mut self, from_height: BlockHeight) -> u32 {
        let mut unconfirmed = 0usize;
        for record in &mut self.transactions {
            if record.is_confirmed() && record.block_height.is_some_and(|height| height >= from_height) {
                record.block_height = None;
                unconfirmed += 1;
            }
        }

        let removed = self.deposit_ledger.pop_blocks(from_height);
        for ledger in self.asset_ledgers.values_mut() {
            ledger.pop_blocks(from_height);
        }
        self.asset_ledgers
            .retain(|_, ledger| !ledger.entries().is_empty());
        info!(from_height, removed, unconfirmed, "Blocks detached");
        removed
    }

    // =========================================================================
    // TTL
    // =========================================================================

    /// Evicts pending entries older than the live time and flips their
    /// unconfirmed records to `Deleted`. Returns the flipped ids.
    pub fn delete_outdated_transactions(&mut self) -> Vec<TransactionId> {
        let mut deleted = Vec::new();
        for transaction_id in self.unconfirmed.delete_outdated_transactions() {
            let record = self.transactions.get_mut(transaction_id.index());
            debug_assert!(record.is_some(), "evicted transaction {transaction_id} has no record");
            let Some(record) = record else {
                warn!(id = %transaction_id, "Evicted entry points past the record list");
                continue;
            };
            let live = !(record.state == TransactionState::Deleted || record.state.is_terminal());
            if live && !record.is_confirmed() {
                record.state = TransactionState::Deleted;
                deleted.push(transaction_id);
            }
        }
        if !deleted.is_empty() {
            info!(count = deleted.len(), "Outdated transactions deleted");
        }
        deleted
    }

    /// Runs TTL eviction after a sync round.
    pub fn on_synchronization_completed(&mut self) -> VecDeque<CacheEvent> {
        self.delete_outdated_transactions()
            .into_iter()
            .map(|transaction_id| CacheEvent::TransactionUpdated { transaction_id })
            .collect()
    }
}
