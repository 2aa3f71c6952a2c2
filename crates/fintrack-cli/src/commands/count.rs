use std::path::Path;

use fintrack_core::models::RecordCounts;

use crate::commands::common::open_database;
use crate::error::CliError;

pub async fn run_count(as_json: bool, user_id: &str, db_path: &Path) -> Result<(), CliError> {
    let db = open_database(db_path).await?;
    let counts = db.local_record_count(user_id).await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&counts)?);
    } else {
        for line in format_count_lines(&counts) {
            println!("{line}");
        }
    }
    Ok(())
}

pub fn format_count_lines(counts: &RecordCounts) -> Vec<String> {
    vec![
        format!("daily_entries    {:>6}", counts.daily_entries),
        format!("monthly_incomes  {:>6}", counts.monthly_incomes),
        format!("digital_assets   {:>6}", counts.digital_assets),
        format!("equity_assets    {:>6}", counts.equity_assets),
        format!("total            {:>6}", counts.total()),
    ]
}
