//! fintrack CLI - personal finance ledger with multi-device sync
//!
//! Records expenses, income and investments locally and syncs them with a
//! remote libSQL replica.

mod cli;
mod commands;
mod config_profiles;
mod error;

use clap::Parser;

use crate::cli::{Cli, Commands, SyncCommands};
use crate::commands::add::run_add;
use crate::commands::common::{require_user_id, resolve_db_path};
use crate::commands::completions::run_completions;
use crate::commands::config::run_config;
use crate::commands::count::run_count;
use crate::commands::delete::run_delete;
use crate::commands::list::run_list;
use crate::commands::summary::run_summary;
use crate::commands::sync::{run_sync, run_sync_status};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    if let Ok(directive) = "fintrack=info".parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let profile = cli.profile.as_deref();
    let user = cli.user.as_deref();

    match cli.command {
        Commands::Add { record } => {
            let user_id = require_user_id(user, profile)?;
            run_add(record, &user_id, &resolve_db_path(cli.db_path)?).await?;
        }
        Commands::List { table, limit, json } => {
            let user_id = require_user_id(user, profile)?;
            run_list(table, limit, json, &user_id, &resolve_db_path(cli.db_path)?).await?;
        }
        Commands::Delete { table, id } => {
            let user_id = require_user_id(user, profile)?;
            run_delete(table, id, &user_id, &resolve_db_path(cli.db_path)?).await?;
        }
        Commands::Summary { month, json } => {
            let user_id = require_user_id(user, profile)?;
            run_summary(
                month.as_deref(),
                json,
                &user_id,
                &resolve_db_path(cli.db_path)?,
            )
            .await?;
        }
        Commands::Sync { command, json } => {
            let db_path = resolve_db_path(cli.db_path)?;
            match command {
                Some(SyncCommands::Status { json: status_json }) => {
                    run_sync_status(json || status_json, user, profile, &db_path).await?;
                }
                None => run_sync(json, user, profile, &db_path).await?,
            }
        }
        Commands::Count { json } => {
            let user_id = require_user_id(user, profile)?;
            run_count(json, &user_id, &resolve_db_path(cli.db_path)?).await?;
        }
        Commands::Config { command } => run_config(command, profile)?,
        Commands::Completions { shell, output } => {
            run_completions(shell, output.as_deref())?;
        }
    }

    Ok(())
}
