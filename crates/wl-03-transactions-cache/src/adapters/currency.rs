//! Simple-interest currency rules.

use serde::{Deserialize, Serialize};
use shared_types::BlockHeight;

use crate::ports::CurrencyRules;

/// Linear interest: `amount * rate * term / blocks_per_year`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleInterestCurrency {
    /// Annual rate in basis points (1/100 of a percent).
    pub annual_rate_bps: u32,
    /// Blocks mined per year.
    pub blocks_per_year: u32,
    /// Atomic units per whole coin, as a power of ten.
    pub decimal_places: u8,
}

impl Default for SimpleInterestCurrency {
    fn default() -> Self {
        Self {
            annual_rate_bps: 500,
            blocks_per_year: 262_800,
            decimal_places: 6,
        }
    }
}

impl CurrencyRules for SimpleInterestCurrency {
    fn calculate_interest(&self, amount: u64, term: u32, _height: BlockHeight) -> u64 {
        if self.blocks_per_year == 0 {
            return 0;
        }
        let numerator = u128::from(amount) * u128::from(self.annual_rate_bps) * u128::from(term);
        let denominator = 10_000u128 * u128::from(self.blocks_per_year);
        u64::try_from(numerator / denominator).unwrap_or(u64::MAX)
    }

    fn format_amount(&self, amount: i64) -> String {
        let sign = if amount < 0 { "-" } else { "" };
        let magnitude = amount.unsigned_abs();
        if self.decimal_places == 0 {
            return format!("{sign}{magnitude}");
        }
        let unit = 10u128.pow(u32::from(self.decimal_places));
        let whole = u128::from(magnitude) / unit;
        let fraction = u128::from(magnitude) % unit;
        format!(
            "{sign}{whole}.{fraction:0width$}",
            width = usize::from(self.decimal_places)
        )
    }
}
