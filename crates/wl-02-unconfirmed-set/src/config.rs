//! # Unconfirmed Set Configuration

use serde::{Deserialize, Serialize};

/// Default live time of a pending transaction: one day.
pub const DEFAULT_LIVE_TIME_SECS: u64 = 60 * 60 * 24;

/// Unconfirmed transaction set configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnconfirmedSetConfig {
    /// Maximum age, in seconds, of a pending transaction before eviction.
    pub live_time_secs: u64,
}

impl Default for UnconfirmedSetConfig {
    fn default() -> Self {
        Self {
            live_time_secs: DEFAULT_LIVE_TIME_SECS,
        }
    }
}

impl UnconfirmedSetConfig {
    /// Create a config for testing (short live time).
    pub fn for_testing() -> Self {
        Self { live_time_secs: 60 }
    }
}
