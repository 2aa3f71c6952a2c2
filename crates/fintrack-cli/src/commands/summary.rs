use std::path::Path;

use chrono::Utc;
use fintrack_core::models::month_of;
use fintrack_core::summary::{BudgetSummary, Portfolio};
use serde::Serialize;

use crate::commands::common::{format_amount, open_database};
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct SummaryOutput {
    budget: BudgetSummary,
    portfolio: Portfolio,
}

pub async fn run_summary(
    month: Option<&str>,
    as_json: bool,
    user_id: &str,
    db_path: &Path,
) -> Result<(), CliError> {
    let month = month.map_or_else(|| month_of(Utc::now()), str::to_string);
    let db = open_database(db_path).await?;
    let budget = db.budget_summary(user_id, &month).await?;
    let portfolio = db.portfolio(user_id).await?;

    if as_json {
        let output = SummaryOutput { budget, portfolio };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    for line in format_budget_lines(&budget) {
        println!("{line}");
    }
    println!();
    for line in format_portfolio_lines(&portfolio) {
        println!("{line}");
    }
    Ok(())
}

pub fn format_budget_lines(budget: &BudgetSummary) -> Vec<String> {
    let mut lines = vec![match budget.income {
        Some(income) => format!("Budget {}  income {}", budget.month, format_amount(income)),
        None => format!("Budget {}  (no income recorded)", budget.month),
    }];

    for line in &budget.buckets {
        let target = line.target_amount.map_or_else(
            || format!("{:.0}%", line.target_share * 100.0),
            |amount| format!("{} ({:.0}%)", format_amount(amount), line.target_share * 100.0),
        );
        let marker = if line.over_target() { "  over" } else { "" };
        lines.push(format!(
            "  {:<8} {:>12}  target {target}{marker}",
            line.bucket,
            format_amount(line.spent)
        ));
    }
    lines.push(format!("  {:<8} {:>12}", "total", format_amount(budget.total_spent)));
    lines
}

pub fn format_portfolio_lines(portfolio: &Portfolio) -> Vec<String> {
    let mut lines = vec![format!(
        "Portfolio  invested {}",
        format_amount(portfolio.total_invested)
    )];
    for line in &portfolio.lines {
        let grams = line
            .weight_grams
            .map(|grams| format!("  {grams:.4} g"))
            .unwrap_or_default();
        lines.push(format!(
            "  {:<8} {:>12}  {:>5.1}%{grams}",
            line.class.as_str(),
            format_amount(line.invested),
            line.share * 100.0
        ));
    }
    lines
}
