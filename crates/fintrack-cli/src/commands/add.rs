use std::path::Path;

use fintrack_core::models::{
    BudgetBucket, Metal, NewDailyEntry, NewDigitalAsset, NewEquityAsset, NewMonthlyIncome,
};

use crate::cli::{AddCommands, MetalArg};
use crate::commands::common::{format_amount, open_database, parse_date_arg};
use crate::error::CliError;

pub async fn run_add(record: AddCommands, user_id: &str, db_path: &Path) -> Result<(), CliError> {
    let db = open_database(db_path).await?;

    match record {
        AddCommands::Expense {
            amount,
            category,
            bucket,
            description,
            date,
        } => {
            let bucket = bucket.parse::<BudgetBucket>()?;
            let entry = db
                .create_daily_entry(&NewDailyEntry {
                    user_id: user_id.to_string(),
                    date: parse_date_arg(date.as_deref())?,
                    category,
                    description,
                    amount,
                    bucket,
                })
                .await?;
            println!(
                "Expense #{} recorded: {} ({})",
                entry.id,
                format_amount(entry.amount),
                entry.bucket
            );
        }
        AddCommands::Income {
            month,
            salary,
            other,
        } => {
            let income = db
                .upsert_monthly_income(&NewMonthlyIncome {
                    user_id: user_id.to_string(),
                    month,
                    salary,
                    other_income: other,
                })
                .await?;
            println!(
                "Income for {} recorded: {}",
                income.month,
                format_amount(income.total_income)
            );
        }
        AddCommands::Metal {
            metal,
            amount_paid,
            rate,
            platform,
            date,
        } => {
            let metal = match metal {
                MetalArg::Gold => Metal::Gold,
                MetalArg::Silver => Metal::Silver,
            };
            let asset = db
                .create_digital_asset(&NewDigitalAsset {
                    user_id: user_id.to_string(),
                    date: parse_date_arg(date.as_deref())?,
                    metal,
                    platform,
                    rate_per_gram: rate,
                    amount_paid,
                })
                .await?;
            println!(
                "Digital {} #{} recorded: {:.4} g (net value {})",
                asset.metal,
                asset.id,
                asset.weight_grams,
                format_amount(asset.net_value)
            );
        }
        AddCommands::Equity {
            company,
            shares,
            price,
            exchange,
            date,
        } => {
            let asset = db
                .create_equity_asset(&NewEquityAsset {
                    user_id: user_id.to_string(),
                    date: parse_date_arg(date.as_deref())?,
                    company,
                    exchange,
                    price_per_share: price,
                    shares,
                })
                .await?;
            println!(
                "Equity #{} recorded: {} {} shares, {}",
                asset.id,
                asset.shares,
                asset.company,
                format_amount(asset.total_amount)
            );
        }
    }

    Ok(())
}
