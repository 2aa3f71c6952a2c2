//! Equity transaction model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::util::round2;

/// A dated stock or fund purchase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityAsset {
    pub id: i64,
    pub user_id: String,
    pub date: DateTime<Utc>,
    pub company: String,
    /// Listing exchange (e.g., "NSE")
    pub exchange: String,
    pub price_per_share: f64,
    pub shares: f64,
    /// `price_per_share * shares`
    pub total_amount: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for recording an equity purchase
#[derive(Debug, Clone, PartialEq)]
pub struct NewEquityAsset {
    pub user_id: String,
    pub date: DateTime<Utc>,
    pub company: String,
    pub exchange: String,
    pub price_per_share: f64,
    pub shares: f64,
}

impl NewEquityAsset {
    #[must_use]
    pub fn total_amount(&self) -> f64 {
        round2(self.price_per_share * self.shares)
    }

    pub fn validate(&self) -> Result<()> {
        if self.user_id.trim().is_empty() {
            return Err(Error::InvalidInput("user id cannot be empty".into()));
        }
        if self.company.trim().is_empty() {
            return Err(Error::InvalidInput("company cannot be empty".into()));
        }
        if !self.price_per_share.is_finite() || self.price_per_share <= 0.0 {
            return Err(Error::InvalidInput("price per share must be positive".into()));
        }
        if !self.shares.is_finite() || self.shares <= 0.0 {
            return Err(Error::InvalidInput("share count must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_amount() {
        let purchase = NewEquityAsset {
            user_id: "u".to_string(),
            date: Utc::now(),
            company: "Infosys".to_string(),
            exchange: "NSE".to_string(),
            price_per_share: 1_523.35,
            shares: 4.0,
        };
        assert!((purchase.total_amount() - 6_093.4).abs() < 1e-9);
        assert!(purchase.validate().is_ok());
    }
}
