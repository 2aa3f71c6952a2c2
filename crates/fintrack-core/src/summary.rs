//! Derived views over the ledger: monthly budget split and portfolio mix.

use serde::Serialize;

use crate::models::{month_of, BudgetBucket, DailyEntry, DigitalAsset, EquityAsset, Metal, MonthlyIncome};
use crate::util::round2;

/// Spending in one budget bucket for a month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketLine {
    pub bucket: BudgetBucket,
    pub spent: f64,
    /// Bucket's target share of income (0.5 / 0.3 / 0.2)
    pub target_share: f64,
    /// Target amount, when the month's income is known
    pub target_amount: Option<f64>,
    /// Spent as a share of income, when the month's income is known
    pub share_of_income: Option<f64>,
}

impl BucketLine {
    /// Over target, when there is a target to compare against
    pub fn over_target(&self) -> bool {
        self.target_amount.is_some_and(|target| self.spent > target)
    }
}

/// Budget view for one month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetSummary {
    pub month: String,
    pub income: Option<f64>,
    pub total_spent: f64,
    pub buckets: Vec<BucketLine>,
}

/// Split a month's expenses across budget buckets.
///
/// Entries outside `month` are ignored, so callers may pass a user's full
/// history.
pub fn budget_summary(
    month: &str,
    entries: &[DailyEntry],
    income: Option<&MonthlyIncome>,
) -> BudgetSummary {
    let income = income
        .filter(|income| income.month == month)
        .map(|income| income.total_income)
        .filter(|total| *total > 0.0);

    let in_month: Vec<&DailyEntry> = entries
        .iter()
        .filter(|entry| month_of(entry.date) == month)
        .collect();

    let buckets = BudgetBucket::ALL
        .into_iter()
        .map(|bucket| {
            let spent: f64 = in_month
                .iter()
                .filter(|entry| entry.bucket == bucket)
                .map(|entry| entry.amount)
                .sum();
            BucketLine {
                bucket,
                spent: round2(spent),
                target_share: bucket.target_share(),
                target_amount: income.map(|total| round2(total * bucket.target_share())),
                share_of_income: income.map(|total| spent / total),
            }
        })
        .collect::<Vec<_>>();

    BudgetSummary {
        month: month.to_string(),
        income,
        total_spent: round2(in_month.iter().map(|entry| entry.amount).sum()),
        buckets,
    }
}

/// Investment classes shown in the portfolio view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetClass {
    Gold,
    Silver,
    Equity,
}

impl AssetClass {
    pub const ALL: [Self; 3] = [Self::Gold, Self::Silver, Self::Equity];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gold => "gold",
            Self::Silver => "silver",
            Self::Equity => "equity",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationLine {
    pub class: AssetClass,
    /// Money put in, including GST on digital metals
    pub invested: f64,
    /// Fraction of the total invested; 0 when nothing is invested
    pub share: f64,
    /// Grams held, for metals
    pub weight_grams: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Portfolio {
    pub total_invested: f64,
    pub lines: Vec<AllocationLine>,
}

/// Allocation of a user's investments across asset classes.
pub fn portfolio_allocation(metals: &[DigitalAsset], equities: &[EquityAsset]) -> Portfolio {
    let metal_totals = |metal: Metal| {
        metals
            .iter()
            .filter(|asset| asset.metal == metal)
            .fold((0.0, 0.0), |(paid, grams), asset| {
                (paid + asset.amount_paid, grams + asset.weight_grams)
            })
    };
    let (gold, gold_grams) = metal_totals(Metal::Gold);
    let (silver, silver_grams) = metal_totals(Metal::Silver);
    let equity: f64 = equities.iter().map(|asset| asset.total_amount).sum();
    let total = gold + silver + equity;

    let lines = AssetClass::ALL
        .into_iter()
        .map(|class| {
            let (invested, weight_grams) = match class {
                AssetClass::Gold => (gold, Some(gold_grams)),
                AssetClass::Silver => (silver, Some(silver_grams)),
                AssetClass::Equity => (equity, None),
            };
            AllocationLine {
                class,
                invested: round2(invested),
                share: if total > 0.0 { invested / total } else { 0.0 },
                weight_grams: weight_grams.map(|grams| (grams * 10_000.0).round() / 10_000.0),
            }
        })
        .collect();

    Portfolio {
        total_invested: round2(total),
        lines,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn entry(month: u32, bucket: BudgetBucket, amount: f64) -> DailyEntry {
        let at = Utc.with_ymd_and_hms(2024, month, 10, 0, 0, 0).unwrap();
        DailyEntry {
            id: 1,
            user_id: "alice".to_string(),
            date: at,
            category: "misc".to_string(),
            description: None,
            amount,
            bucket,
            created_at: at,
            updated_at: at,
        }
    }

    fn income(month: &str, total: f64) -> MonthlyIncome {
        let at = Utc::now();
        MonthlyIncome {
            id: 1,
            user_id: "alice".to_string(),
            month: month.to_string(),
            salary: total,
            other_income: 0.0,
            total_income: total,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn budget_summary_splits_month_by_bucket() {
        let entries = vec![
            entry(5, BudgetBucket::Needs, 30_000.0),
            entry(5, BudgetBucket::Wants, 20_000.0),
            entry(5, BudgetBucket::Needs, 5_000.0),
            entry(4, BudgetBucket::Wants, 99_999.0),
        ];
        let summary = budget_summary("2024-05", &entries, Some(&income("2024-05", 60_000.0)));

        assert_eq!(summary.total_spent, 55_000.0);
        assert_eq!(summary.income, Some(60_000.0));
        let needs = &summary.buckets[0];
        assert_eq!(needs.spent, 35_000.0);
        assert_eq!(needs.target_amount, Some(30_000.0));
        assert!(needs.over_target());
        let wants = &summary.buckets[1];
        assert_eq!(wants.target_amount, Some(18_000.0));
        assert!(wants.over_target());
        assert!(!summary.buckets[2].over_target());
    }

    #[test]
    fn budget_summary_without_income_has_no_targets() {
        let entries = vec![entry(5, BudgetBucket::Savings, 100.0)];
        let summary = budget_summary("2024-05", &entries, Some(&income("2024-04", 1_000.0)));

        assert_eq!(summary.income, None);
        assert!(summary
            .buckets
            .iter()
            .all(|line| line.target_amount.is_none() && !line.over_target()));
    }

    #[test]
    fn portfolio_allocation_shares_sum_to_one() {
        let at = Utc::now();
        let gold = DigitalAsset {
            id: 1,
            user_id: "alice".to_string(),
            date: at,
            metal: Metal::Gold,
            platform: "SafeGold".to_string(),
            rate_per_gram: 6_000.0,
            amount_paid: 3_000.0,
            weight_grams: 0.4854,
            net_value: 2_912.62,
            created_at: at,
            updated_at: at,
        };
        let equity = EquityAsset {
            id: 1,
            user_id: "alice".to_string(),
            date: at,
            company: "Infosys".to_string(),
            exchange: "NSE".to_string(),
            price_per_share: 1_000.0,
            shares: 1.0,
            total_amount: 1_000.0,
            created_at: at,
            updated_at: at,
        };

        let portfolio = portfolio_allocation(&[gold], &[equity]);
        assert_eq!(portfolio.total_invested, 4_000.0);
        assert!((portfolio.lines[0].share - 0.75).abs() < 1e-9);
        assert_eq!(portfolio.lines[1].invested, 0.0);
        assert_eq!(portfolio.lines[1].weight_grams, Some(0.0));
        assert!((portfolio.lines[2].share - 0.25).abs() < 1e-9);
        let total: f64 = portfolio.lines.iter().map(|line| line.share).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn empty_portfolio_has_zero_shares() {
        let portfolio = portfolio_allocation(&[], &[]);
        assert_eq!(portfolio.total_invested, 0.0);
        assert!(portfolio.lines.iter().all(|line| line.share == 0.0));
    }
}
