//! Monthly income model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::util::round2;

/// Income recorded for one calendar month. At most one per (user, month).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyIncome {
    pub id: i64,
    pub user_id: String,
    /// Calendar month as `YYYY-MM`
    pub month: String,
    pub salary: f64,
    pub other_income: f64,
    /// `salary + other_income`
    pub total_income: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for recording a month's income
#[derive(Debug, Clone, PartialEq)]
pub struct NewMonthlyIncome {
    pub user_id: String,
    pub month: String,
    pub salary: f64,
    pub other_income: f64,
}

impl NewMonthlyIncome {
    /// Total income for the month
    #[must_use]
    pub fn total_income(&self) -> f64 {
        round2(self.salary + self.other_income)
    }

    /// Check the fields a stored income must satisfy, normalizing the month.
    pub fn validate(&mut self) -> Result<()> {
        if self.user_id.trim().is_empty() {
            return Err(Error::InvalidInput("user id cannot be empty".into()));
        }
        self.month = normalize_month(&self.month)?;
        for (name, value) in [("salary", self.salary), ("other income", self.other_income)] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidInput(format!(
                    "{name} must be zero or positive (got {value})"
                )));
            }
        }
        Ok(())
    }
}

/// Normalize a `YYYY-MM` (or `YYYY-M`) month label.
pub fn normalize_month(month: &str) -> Result<String> {
    let trimmed = month.trim();
    NaiveDate::parse_from_str(&format!("{trimmed}-01"), "%Y-%m-%d")
        .map(|date| date.format("%Y-%m").to_string())
        .map_err(|_| Error::InvalidInput(format!("month must be YYYY-MM (got '{trimmed}')")))
}

/// Month label (`YYYY-MM`) for a timestamp.
pub fn month_of(date: DateTime<Utc>) -> String {
    date.format("%Y-%m").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_month() {
        assert_eq!(normalize_month("2024-5").unwrap(), "2024-05");
        assert_eq!(normalize_month(" 2024-12 ").unwrap(), "2024-12");
        assert!(normalize_month("2024-13").is_err());
        assert!(normalize_month("May 2024").is_err());
    }

    #[test]
    fn test_total_income() {
        let income = NewMonthlyIncome {
            user_id: "u".to_string(),
            month: "2024-05".to_string(),
            salary: 85_000.0,
            other_income: 4_250.5,
        };
        assert!((income.total_income() - 89_250.5).abs() < 1e-9);
    }

    #[test]
    fn test_validate_rejects_negative_values() {
        let mut income = NewMonthlyIncome {
            user_id: "u".to_string(),
            month: "2024-5".to_string(),
            salary: -1.0,
            other_income: 0.0,
        };
        assert!(income.validate().is_err());

        income.salary = 10.0;
        income.validate().unwrap();
        assert_eq!(income.month, "2024-05");
    }
}
