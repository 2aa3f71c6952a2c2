//! Daily expense entry model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Budget bucket an expense is charged against (50/30/20 style budgeting)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BudgetBucket {
    /// Essentials: rent, groceries, utilities
    #[default]
    Needs,
    /// Discretionary spending
    Wants,
    /// Savings and investments
    Savings,
}

impl BudgetBucket {
    /// All buckets in display order
    pub const ALL: [Self; 3] = [Self::Needs, Self::Wants, Self::Savings];

    /// Stored string form
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Needs => "needs",
            Self::Wants => "wants",
            Self::Savings => "savings",
        }
    }

    /// Target share of monthly income for this bucket
    #[must_use]
    pub const fn target_share(self) -> f64 {
        match self {
            Self::Needs => 0.5,
            Self::Wants => 0.3,
            Self::Savings => 0.2,
        }
    }
}

impl fmt::Display for BudgetBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for BudgetBucket {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "needs" | "need" => Ok(Self::Needs),
            "wants" | "want" => Ok(Self::Wants),
            "savings" | "saving" => Ok(Self::Savings),
            other => Err(Error::InvalidInput(format!("unknown budget bucket '{other}'"))),
        }
    }
}

/// A dated expense
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyEntry {
    /// Auto-assigned identifier
    pub id: i64,
    /// Owning user
    pub user_id: String,
    /// Day the expense happened
    pub date: DateTime<Utc>,
    /// Spending category (e.g., "groceries")
    pub category: String,
    /// Free-form description
    pub description: Option<String>,
    /// Amount spent
    pub amount: f64,
    /// Budget bucket tag
    pub bucket: BudgetBucket,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a daily entry
#[derive(Debug, Clone, PartialEq)]
pub struct NewDailyEntry {
    pub user_id: String,
    pub date: DateTime<Utc>,
    pub category: String,
    pub description: Option<String>,
    pub amount: f64,
    pub bucket: BudgetBucket,
}

impl NewDailyEntry {
    /// Check the fields a stored entry must satisfy.
    pub fn validate(&self) -> Result<()> {
        if self.user_id.trim().is_empty() {
            return Err(Error::InvalidInput("user id cannot be empty".into()));
        }
        if self.category.trim().is_empty() {
            return Err(Error::InvalidInput("category cannot be empty".into()));
        }
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(Error::InvalidInput(format!(
                "amount must be positive (got {})",
                self.amount
            )));
        }
        Ok(())
    }
}
