use std::env;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fintrack_core::config::RemoteConfig;
use fintrack_core::models::{DailyEntry, DigitalAsset, EquityAsset, MonthlyIncome};
use fintrack_core::sync::parse_timestamp;
use fintrack_core::util::normalize_text_option;
use fintrack_core::DatabaseService;

use crate::config_profiles::CliProfilesConfig;
use crate::error::CliError;

pub const DB_PATH_ENV: &str = "FINTRACK_DB_PATH";
pub const USER_ID_ENV: &str = "FINTRACK_USER_ID";

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> Result<PathBuf, CliError> {
    if let Some(path) = cli_db_path.or_else(|| env::var_os(DB_PATH_ENV).map(PathBuf::from)) {
        return Ok(path);
    }
    default_db_path()
}

pub fn default_db_path() -> Result<PathBuf, CliError> {
    dirs::data_dir()
        .map(|dir| dir.join("fintrack").join("fintrack.db"))
        .ok_or_else(|| CliError::Config("Failed to resolve CLI data directory".to_string()))
}

pub async fn open_database(path: &Path) -> Result<DatabaseService, CliError> {
    Ok(DatabaseService::open_path(path.to_path_buf()).await?)
}

/// User to act as: `--user`, then `FINTRACK_USER_ID`, then the profile.
pub fn resolve_user_id(
    explicit: Option<&str>,
    profile_name: Option<&str>,
) -> Result<Option<String>, CliError> {
    if let Some(user) = normalize_text_option(explicit.map(str::to_string)) {
        return Ok(Some(user));
    }
    if let Some(user) = normalize_text_option(env::var(USER_ID_ENV).ok()) {
        return Ok(Some(user));
    }

    let config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(profile_name);
    Ok(config.profile(&profile_name).and_then(|profile| profile.user_id()))
}

pub fn require_user_id(
    explicit: Option<&str>,
    profile_name: Option<&str>,
) -> Result<String, CliError> {
    resolve_user_id(explicit, profile_name)?.ok_or(CliError::UserNotConfigured)
}

/// Remote replica settings: the profile first, then the environment.
pub fn resolve_remote_config(profile_name: Option<&str>) -> Result<Option<RemoteConfig>, CliError> {
    let config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(profile_name);
    if let Some(remote) = config
        .profile(&profile_name)
        .and_then(|profile| profile.remote_config())
    {
        tracing::debug!("Using remote settings from profile '{profile_name}'");
        return Ok(Some(remote));
    }
    Ok(RemoteConfig::from_env())
}

/// Parse a `--date` argument; `None` means now.
pub fn parse_date_arg(value: Option<&str>) -> Result<DateTime<Utc>, CliError> {
    match normalize_text_option(value.map(str::to_string)) {
        None => Ok(Utc::now()),
        Some(text) => parse_timestamp(&text).ok_or(CliError::InvalidDate(text)),
    }
}

pub fn format_sync_timestamp(instant: DateTime<Utc>) -> String {
    instant.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}

/// Money with thousands separators: `1,234,567.50`.
pub fn format_amount(value: f64) -> String {
    let formatted = format!("{:.2}", value.abs());
    let (whole, fraction) = formatted.split_once('.').unwrap_or((&formatted, "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (index, digit) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}{grouped}.{fraction}")
}

pub fn truncate(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let mut truncated = collapsed
            .chars()
            .take(max_chars.saturating_sub(3))
            .collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn format_expense_lines(entries: &[DailyEntry]) -> Vec<String> {
    entries
        .iter()
        .map(|entry| {
            let label = entry.description.as_deref().map_or_else(
                || entry.category.clone(),
                |description| format!("{} - {description}", entry.category),
            );
            format!(
                "{:>6}  {}  {:>12}  {:<7}  {}",
                entry.id,
                entry.date.format("%Y-%m-%d"),
                format_amount(entry.amount),
                entry.bucket,
                truncate(&label, 40)
            )
        })
        .collect()
}

pub fn format_income_lines(incomes: &[MonthlyIncome]) -> Vec<String> {
    incomes
        .iter()
        .map(|income| {
            format!(
                "{:>6}  {}  salary {:>12}  other {:>10}  total {:>12}",
                income.id,
                income.month,
                format_amount(income.salary),
                format_amount(income.other_income),
                format_amount(income.total_income)
            )
        })
        .collect()
}

pub fn format_metal_lines(assets: &[DigitalAsset]) -> Vec<String> {
    assets
        .iter()
        .map(|asset| {
            format!(
                "{:>6}  {}  {:<6}  {:>9.4} g @ {:>10}  paid {:>12}  {}",
                asset.id,
                asset.date.format("%Y-%m-%d"),
                asset.metal,
                asset.weight_grams,
                format_amount(asset.rate_per_gram),
                format_amount(asset.amount_paid),
                truncate(&asset.platform, 20)
            )
        })
        .collect()
}

pub fn format_equity_lines(assets: &[EquityAsset]) -> Vec<String> {
    assets
        .iter()
        .map(|asset| {
            format!(
                "{:>6}  {}  {:<24}  {:<5}  {:>8} x {:>10}  = {:>12}",
                asset.id,
                asset.date.format("%Y-%m-%d"),
                truncate(&asset.company, 24),
                asset.exchange,
                asset.shares,
                format_amount(asset.price_per_share),
                format_amount(asset.total_amount)
            )
        })
        .collect()
}
