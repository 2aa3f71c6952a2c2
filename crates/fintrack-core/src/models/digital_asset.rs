//! Digital gold/silver purchase model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::util::round2;

/// GST charged on digital metal purchases; the platform takes it out of the amount paid.
pub const DIGITAL_METAL_GST_RATE: f64 = 0.03;

/// Precious metal bought through a digital platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metal {
    Gold,
    Silver,
}

impl Metal {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gold => "gold",
            Self::Silver => "silver",
        }
    }
}

impl fmt::Display for Metal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Metal {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gold" => Ok(Self::Gold),
            "silver" => Ok(Self::Silver),
            other => Err(Error::InvalidInput(format!("unknown metal '{other}'"))),
        }
    }
}

/// A dated digital metal purchase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DigitalAsset {
    pub id: i64,
    pub user_id: String,
    pub date: DateTime<Utc>,
    pub metal: Metal,
    /// Platform the purchase was made on
    pub platform: String,
    /// Price per gram at purchase time
    pub rate_per_gram: f64,
    /// Gross amount paid, GST included
    pub amount_paid: f64,
    /// Grams credited
    pub weight_grams: f64,
    /// Value of the metal after GST
    pub net_value: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for recording a digital metal purchase
#[derive(Debug, Clone, PartialEq)]
pub struct NewDigitalAsset {
    pub user_id: String,
    pub date: DateTime<Utc>,
    pub metal: Metal,
    pub platform: String,
    pub rate_per_gram: f64,
    pub amount_paid: f64,
}

impl NewDigitalAsset {
    /// Value of the metal once GST is taken out of the amount paid
    #[must_use]
    pub fn net_value(&self) -> f64 {
        round2(self.amount_paid / (1.0 + DIGITAL_METAL_GST_RATE))
    }

    /// Grams credited for the net value, to four decimal places
    #[must_use]
    pub fn weight_grams(&self) -> f64 {
        let grams = self.net_value() / self.rate_per_gram;
        (grams * 10_000.0).round() / 10_000.0
    }

    pub fn validate(&self) -> Result<()> {
        if self.user_id.trim().is_empty() {
            return Err(Error::InvalidInput("user id cannot be empty".into()));
        }
        if self.platform.trim().is_empty() {
            return Err(Error::InvalidInput("platform cannot be empty".into()));
        }
        if !self.rate_per_gram.is_finite() || self.rate_per_gram <= 0.0 {
            return Err(Error::InvalidInput("rate per gram must be positive".into()));
        }
        if !self.amount_paid.is_finite() || self.amount_paid <= 0.0 {
            return Err(Error::InvalidInput("amount paid must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn purchase() -> NewDigitalAsset {
        NewDigitalAsset {
            user_id: "u".to_string(),
            date: Utc::now(),
            metal: Metal::Gold,
            platform: "SafeGold".to_string(),
            rate_per_gram: 6_000.0,
            amount_paid: 1_030.0,
        }
    }

    #[test]
    fn test_net_value_excludes_gst() {
        assert!((purchase().net_value() - 1_000.0).abs() < 1e-9);
    }

    #[test]
    fn test_weight_rounded_to_four_places() {
        assert!((purchase().weight_grams() - 0.1667).abs() < 1e-9);
    }

    #[test]
    fn test_validate_rejects_zero_rate() {
        let mut asset = purchase();
        asset.rate_per_gram = 0.0;
        assert!(asset.validate().is_err());
        assert!("platinum".parse::<Metal>().is_err());
    }
}
