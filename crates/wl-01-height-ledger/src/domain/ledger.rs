//! # Height-Indexed Ledger
//!
//! Sparse prefix sums over block height. An entry is stored only for blocks
//! whose amount delta was non-zero, so point-in-time queries are a binary
//! search and rollback is a truncation of the suffix.
//!
//! ## Invariants
//!
//! - entries strictly ascending by `height`
//! - every entry height is `< block_count`
//! - every cumulative amount is `>= 0`
//!
//! Each mutation validates before it writes; a failed call leaves the
//! ledger untouched.

use std::fmt;
use std::marker::PhantomData;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;

use super::aggregation::{AccumulateAuxiliary, AuxiliaryRule, LatestAuxiliary};
use super::entities::{LedgerEntry, LedgerSnapshot};
use super::errors::LedgerError;

/// Ledger of locked deposit amounts with accrued interest.
pub type DepositLedger = HeightIndexedLedger<AccumulateAuxiliary>;

/// Ledger of one auxiliary asset's balance, tagged with its asset id.
pub type AssetLedger = HeightIndexedLedger<LatestAuxiliary>;

/// Sparse cumulative-amount index over block height.
pub struct HeightIndexedLedger<R> {
    entries: Vec<LedgerEntry>,
    block_count: u32,
    _rule: PhantomData<R>,
}

/// Resolved effect of a height-addressed update.
enum Recording {
    /// Pad up to the target height, then close it with `entry`.
    Append {
        block_count: u32,
        entry: Option<LedgerEntry>,
    },
    /// Fold into the tip block. `entry` replaces the tip entry, if any.
    MergeTip {
        had_entry: bool,
        entry: Option<LedgerEntry>,
    },
}

impl<R: AuxiliaryRule> HeightIndexedLedger<R> {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            block_count: 0,
            _rule: PhantomData,
        }
    }

    /// Creates an empty ledger pre-sized for `expected_height` blocks.
    pub fn with_capacity(expected_height: u32) -> Self {
        let mut ledger = Self::new();
        ledger.reserve(expected_height);
        ledger
    }

    /// Reserves room for entries up to `expected_height`.
    pub fn reserve(&mut self, expected_height: u32) {
        let wanted = (expected_height as usize).saturating_add(1);
        self.entries
            .reserve(wanted.saturating_sub(self.entries.len()));
    }

    /// Number of blocks currently accounted for.
    pub fn block_count(&self) -> u32 {
        self.block_count
    }

    /// Stored entries, ascending by height.
    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    /// Whether no block has been pushed.
    pub fn is_empty(&self) -> bool {
        self.block_count == 0
    }

    // =========================================================================
    // MUTATION
    // =========================================================================

    /// Appends the effect of exactly one new block.
    ///
    /// An entry is stored only when `delta != 0`; the block count always
    /// grows by one.
    pub fn push_block(&mut self, delta: i64, auxiliary: u64) -> Result<(), LedgerError> {
        let height = self.block_count;
        let block_count = height.checked_add(1).ok_or(LedgerError::HeightOverflow)?;
        if delta != 0 {
            let entry = self.next_entry(height, delta, auxiliary)?;
            self.entries.push(entry);
        }
        self.block_count = block_count;
        Ok(())
    }

    /// Reverts the most recent `push_block`.
    pub fn pop_block(&mut self) -> Result<(), LedgerError> {
        if self.block_count == 0 {
            return Err(LedgerError::Empty);
        }
        self.block_count -= 1;
        if self
            .entries
            .last()
            .is_some_and(|entry| entry.height == self.block_count)
        {
            self.entries.pop();
        }
        Ok(())
    }

    /// Rolls back every block at or above `from`.
    ///
    /// Returns the number of blocks removed, or 0 when `from >= block_count`.
    pub fn pop_blocks(&mut self, from: u32) -> u32 {
        if from >= self.block_count {
            return 0;
        }
        let keep = self.entries.partition_point(|entry| entry.height < from);
        let dropped_entries = self.entries.len() - keep;
        self.entries.truncate(keep);

        let removed = self.block_count - from;
        self.block_count = from;
        debug!(
            rule = R::NAME,
            from,
            removed,
            dropped_entries,
            "Ledger rolled back"
        );
        removed
    }

    /// Applies one block's net effect at an explicit height.
    ///
    /// Heights above the tip are padded with empty blocks first. The tip
    /// block itself absorbs further deltas; if its net delta returns to zero
    /// its entry is dropped. Older heights are rejected.
    pub fn record_at(&mut self, height: u32, delta: i64, auxiliary: u64) -> Result<(), LedgerError> {
        match self.plan_record(height, delta, auxiliary)? {
            Recording::Append { block_count, entry } => {
                self.entries.extend(entry);
                self.block_count = block_count;
            }
            Recording::MergeTip { had_entry, entry } => {
                if had_entry {
                    self.entries.pop();
                }
                self.entries.extend(entry);
            }
        }
        Ok(())
    }

    /// Validates a `record_at` call without applying it.
    pub fn check_record_at(&self, height: u32, delta: i64, auxiliary: u64) -> Result<(), LedgerError> {
        self.plan_record(height, delta, auxiliary).map(|_| ())
    }

    fn plan_record(&self, height: u32, delta: i64, auxiliary: u64) -> Result<Recording, LedgerError> {
        if height >= self.block_count {
            let block_count = height.checked_add(1).ok_or(LedgerError::HeightOverflow)?;
            let entry = if delta != 0 {
                Some(self.next_entry(height, delta, auxiliary)?)
            } else {
                None
            };
            return Ok(Recording::Append { block_count, entry });
        }

        let tip = self.block_count - 1;
        if height < tip {
            return Err(LedgerError::HeightBehindTip { height, tip });
        }

        let tip_entry = self.entries.last().filter(|entry| entry.height == height);
        let base = match tip_entry {
            Some(_) => self.entries.len().checked_sub(2).map(|i| self.entries[i]),
            None => self.entries.last().copied(),
        };
        let base_amount = base.map_or(0, |entry| entry.cumulative_amount);
        let (current_amount, current_auxiliary) = tip_entry
            .or(base.as_ref())
            .map_or((0, 0), |entry| (entry.cumulative_amount, entry.cumulative_auxiliary));

        let amount = current_amount
            .checked_add(delta)
            .ok_or(LedgerError::AmountOverflow { height, delta })?;
        if amount < 0 {
            return Err(LedgerError::NegativeBalance {
                height,
                balance: amount,
            });
        }

        let entry = if amount != base_amount {
            let cumulative_auxiliary = R::combine(current_auxiliary, auxiliary)
                .ok_or(LedgerError::AuxiliaryOverflow { height })?;
            Some(LedgerEntry {
                height,
                cumulative_amount: amount,
                cumulative_auxiliary,
            })
        } else {
            None
        };

        Ok(Recording::MergeTip {
            had_entry: tip_entry.is_some(),
            entry,
        })
    }

    fn next_entry(&self, height: u32, delta: i64, auxiliary: u64) -> Result<LedgerEntry, LedgerError> {
        let cumulative_amount = self
            .full_amount()
            .checked_add(delta)
            .ok_or(LedgerError::AmountOverflow { height, delta })?;
        if cumulative_amount < 0 {
            return Err(LedgerError::NegativeBalance {
                height,
                balance: cumulative_amount,
            });
        }
        let cumulative_auxiliary = R::combine(self.full_auxiliary(), auxiliary)
            .ok_or(LedgerError::AuxiliaryOverflow { height })?;
        Ok(LedgerEntry {
            height,
            cumulative_amount,
            cumulative_auxiliary,
        })
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Cumulative amount as of the end of block `height`.
    pub fn amount_at_height(&self, height: u32) -> i64 {
        self.entry_at_height(height)
            .map_or(0, |entry| entry.cumulative_amount)
    }

    /// Auxiliary aggregate as of the end of block `height`.
    pub fn auxiliary_at_height(&self, height: u32) -> u64 {
        self.entry_at_height(height)
            .map_or(0, |entry| entry.cumulative_auxiliary)
    }

    /// Cumulative amount at the tip.
    pub fn full_amount(&self) -> i64 {
        self.entries.last().map_or(0, |entry| entry.cumulative_amount)
    }

    /// Auxiliary aggregate at the tip.
    pub fn full_auxiliary(&self) -> u64 {
        self.entries
            .last()
            .map_or(0, |entry| entry.cumulative_auxiliary)
    }

    fn entry_at_height(&self, height: u32) -> Option<&LedgerEntry> {
        let upper = self.entries.partition_point(|entry| entry.height <= height);
        upper.checked_sub(1).map(|i| &self.entries[i])
    }

    // =========================================================================
    // PERSISTENCE
    // =========================================================================

    /// Copies the ledger into its persisted layout.
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            block_count: self.block_count,
            index: self.entries.clone(),
        }
    }

    /// Rebuilds a ledger from its persisted layout, rejecting any snapshot
    /// that breaks the ordering invariants.
    pub fn from_snapshot(snapshot: LedgerSnapshot) -> Result<Self, LedgerError> {
        let LedgerSnapshot { block_count, index } = snapshot;
        for (position, entry) in index.iter().enumerate() {
            if position > 0 && entry.height <= index[position - 1].height {
                return Err(LedgerError::UnorderedEntries { position });
            }
            if entry.height >= block_count {
                return Err(LedgerError::EntryBeyondBlockCount {
                    height: entry.height,
                    block_count,
                });
            }
            if entry.cumulative_amount < 0 {
                return Err(LedgerError::NegativeEntry {
                    height: entry.height,
                    amount: entry.cumulative_amount,
                });
            }
        }
        Ok(Self {
            entries: index,
            block_count,
            _rule: PhantomData,
        })
    }
}

impl<R: AuxiliaryRule> Default for HeightIndexedLedger<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> Clone for HeightIndexedLedger<R> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            block_count: self.block_count,
            _rule: PhantomData,
        }
    }
}

impl<R> PartialEq for HeightIndexedLedger<R> {
    fn eq(&self, other: &Self) -> bool {
        self.block_count == other.block_count && self.entries == other.entries
    }
}

impl<R> Eq for HeightIndexedLedger<R> {}

impl<R: AuxiliaryRule> fmt::Debug for HeightIndexedLedger<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeightIndexedLedger")
            .field("rule", &R::NAME)
            .field("block_count", &self.block_count)
            .field("entries", &self.entries)
            .finish()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LedgerSnapshotRef<'a> {
    block_count: u32,
    index: &'a [LedgerEntry],
}

impl<R> Serialize for HeightIndexedLedger<R> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        LedgerSnapshotRef {
            block_count: self.block_count,
            index: &self.entries,
        }
        .serialize(serializer)
    }
}

impl<'de, R: AuxiliaryRule> Deserialize<'de> for HeightIndexedLedger<R> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let snapshot = LedgerSnapshot::deserialize(deserializer)?;
        Self::from_snapshot(snapshot).map_err(serde::de::Error::custom)
    }
}
