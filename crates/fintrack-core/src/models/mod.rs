//! Data models for fintrack

mod daily_entry;
mod digital_asset;
mod equity_asset;
mod monthly_income;

pub use daily_entry::{BudgetBucket, DailyEntry, NewDailyEntry};
pub use digital_asset::{DigitalAsset, Metal, NewDigitalAsset, DIGITAL_METAL_GST_RATE};
pub use equity_asset::{EquityAsset, NewEquityAsset};
pub use monthly_income::{month_of, normalize_month, MonthlyIncome, NewMonthlyIncome};

use serde::{Deserialize, Serialize};

/// Number of rows a user owns in each synced table of one store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordCounts {
    pub daily_entries: usize,
    pub monthly_incomes: usize,
    pub digital_assets: usize,
    pub equity_assets: usize,
}

impl RecordCounts {
    /// Sum across all tables
    #[must_use]
    pub const fn total(&self) -> usize {
        self.daily_entries + self.monthly_incomes + self.digital_assets + self.equity_assets
    }
}
