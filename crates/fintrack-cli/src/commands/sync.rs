use std::path::Path;

use chrono::Utc;
use fintrack_core::config::RemoteConfig;
use fintrack_core::db::RemoteDatabase;
use fintrack_core::models::RecordCounts;
use fintrack_core::sync::{StaticIdentity, SyncAction, SyncHealth, SyncReport, SyncService};
use serde::Serialize;

use crate::commands::common::{
    format_relative_time, format_sync_timestamp, open_database, resolve_remote_config,
    resolve_user_id,
};
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct SyncOutput<'a> {
    report: &'a SyncReport,
    health: SyncHealth,
}

#[derive(Debug, Serialize)]
pub struct SyncStatus {
    pub user_id: Option<String>,
    pub remote_configured: bool,
    pub remote_url: Option<String>,
    pub remote_migrated: bool,
    pub last_sync_at: Option<String>,
    pub local_records: Option<RecordCounts>,
}

pub async fn run_sync(
    as_json: bool,
    explicit_user: Option<&str>,
    profile: Option<&str>,
    db_path: &Path,
) -> Result<(), CliError> {
    let remote_config = resolve_remote_config(profile)?.ok_or(CliError::SyncNotConfigured)?;
    let identity = StaticIdentity(resolve_user_id(explicit_user, profile)?);

    let db = open_database(db_path).await?;
    let remote = RemoteDatabase::connect(&remote_config).await?;
    let service = SyncService::new(db, remote, identity);

    let Some(report) = service.perform_sync().await? else {
        println!("No user configured; nothing to sync.");
        return Ok(());
    };

    if as_json {
        let output = SyncOutput {
            report: &report,
            health: service.health(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    for line in format_sync_report_lines(&report) {
        println!("{line}");
    }
    if let SyncHealth::Degraded { failed_tables } = service.health() {
        println!("Sync finished with {} failed table(s)", failed_tables.len());
    } else if report.restored() {
        println!("Sync completed; data was restored from the remote replica");
    } else {
        println!("Sync completed");
    }
    Ok(())
}

pub async fn run_sync_status(
    as_json: bool,
    explicit_user: Option<&str>,
    profile: Option<&str>,
    db_path: &Path,
) -> Result<(), CliError> {
    let remote_config = resolve_remote_config(profile)?;
    let user_id = resolve_user_id(explicit_user, profile)?;
    let db = open_database(db_path).await?;

    let last_sync_at = db.last_sync_time().await?;
    let local_records = match user_id.as_deref() {
        Some(user) => Some(db.local_record_count(user).await?),
        None => None,
    };
    let status = SyncStatus {
        user_id,
        remote_configured: remote_config.as_ref().is_some_and(RemoteConfig::is_configured),
        remote_url: remote_config.and_then(|config| config.url),
        remote_migrated: db.remote_migrated().await?,
        last_sync_at: last_sync_at.map(fintrack_core::sync::format_timestamp),
        local_records,
    };

    if as_json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!(
        "Remote:       {}",
        status.remote_url.as_deref().unwrap_or("not configured")
    );
    println!(
        "User:         {}",
        status.user_id.as_deref().unwrap_or("not configured")
    );
    println!(
        "Schema:       {}",
        if status.remote_migrated {
            "migrated"
        } else {
            "not migrated from this device"
        }
    );
    match last_sync_at {
        Some(at) => println!(
            "Last sync:    {} ({})",
            format_sync_timestamp(at),
            format_relative_time(at.timestamp_millis(), Utc::now().timestamp_millis())
        ),
        None => println!("Last sync:    never"),
    }
    if let Some(counts) = status.local_records {
        println!("Local rows:   {}", counts.total());
    }
    Ok(())
}

pub fn format_sync_report_lines(report: &SyncReport) -> Vec<String> {
    let mut lines = Vec::with_capacity(report.tables.len() + 1);
    let applied = report.readiness.applied();
    if !applied.is_empty() {
        lines.push(format!("Remote schema migrated: {}", applied.join(", ")));
    }

    for table in &report.tables {
        let line = match &table.result {
            Ok(outcome) => {
                let action = match outcome.action {
                    SyncAction::Restore => format!("restored {}", outcome.written),
                    SyncAction::Push => format!("pushed {}", outcome.written),
                    SyncAction::Skip => "nothing to sync".to_string(),
                };
                let warning = if outcome.remote_snapshot_failed {
                    "  (remote unreadable)"
                } else {
                    ""
                };
                format!(
                    "{:<16} local {:>5}  remote {:>5}  {action}{warning}",
                    table.table, outcome.local_rows, outcome.remote_rows
                )
            }
            Err(error) => format!("{:<16} failed: {error}", table.table),
        };
        lines.push(line);
    }
    lines
}
