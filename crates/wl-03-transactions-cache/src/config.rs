//! # Transactions Cache Configuration

use serde::{Deserialize, Serialize};
use wl_02_unconfirmed_set::UnconfirmedSetConfig;

/// Default number of ledger entries reserved up front.
pub const DEFAULT_LEDGER_CAPACITY_HINT: u32 = 1_024;

/// Transactions cache configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CacheConfig {
    /// Pending set settings (transaction live time).
    pub unconfirmed: UnconfirmedSetConfig,
    /// Expected chain height, used to pre-size the ledgers.
    pub ledger_capacity_hint: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            unconfirmed: UnconfirmedSetConfig::default(),
            ledger_capacity_hint: DEFAULT_LEDGER_CAPACITY_HINT,
        }
    }
}

impl CacheConfig {
    /// Create a config for testing (short live time, no preallocation).
    pub fn for_testing() -> Self {
        Self {
            unconfirmed: UnconfirmedSetConfig::for_testing(),
            ledger_capacity_hint: 0,
        }
    }
}
