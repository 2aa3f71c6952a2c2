use std::path::Path;

use crate::cli::TableArg;
use crate::commands::common::{
    format_equity_lines, format_expense_lines, format_income_lines, format_metal_lines,
    open_database,
};
use crate::error::CliError;

pub async fn run_list(
    table: TableArg,
    limit: usize,
    as_json: bool,
    user_id: &str,
    db_path: &Path,
) -> Result<(), CliError> {
    let db = open_database(db_path).await?;

    let (json, lines) = match table {
        TableArg::Expenses => {
            let entries = db.list_daily_entries(user_id, limit, 0).await?;
            (serde_json::to_string_pretty(&entries)?, format_expense_lines(&entries))
        }
        TableArg::Incomes => {
            let incomes = db.list_monthly_incomes(user_id, limit).await?;
            (serde_json::to_string_pretty(&incomes)?, format_income_lines(&incomes))
        }
        TableArg::Metals => {
            let assets = db.list_digital_assets(user_id, limit).await?;
            (serde_json::to_string_pretty(&assets)?, format_metal_lines(&assets))
        }
        TableArg::Equities => {
            let assets = db.list_equity_assets(user_id, limit).await?;
            (serde_json::to_string_pretty(&assets)?, format_equity_lines(&assets))
        }
    };

    if as_json {
        println!("{json}");
    } else if lines.is_empty() {
        println!("No {} recorded.", table.key());
    } else {
        for line in lines {
            println!("{line}");
        }
    }

    Ok(())
}
