//! Ledger repository implementation

#![allow(clippy::cast_possible_wrap)] // SQLite uses i64 for LIMIT/OFFSET

use chrono::{DateTime, Utc};
use libsql::params::Params;
use libsql::{Connection, Value};

use crate::error::{Error, Result};
use crate::models::{
    DailyEntry, DigitalAsset, EquityAsset, MonthlyIncome, NewDailyEntry, NewDigitalAsset,
    NewEquityAsset, NewMonthlyIncome, RecordCounts,
};
use crate::sync::{TableKey, REGISTRY};
use crate::util::normalize_text_option;

use super::sql;

/// Trait for ledger storage operations (async)
#[allow(async_fn_in_trait)]
pub trait LedgerRepository {
    /// Record an expense
    async fn create_daily_entry(&self, entry: &NewDailyEntry) -> Result<DailyEntry>;

    /// List a user's expenses, newest first
    async fn list_daily_entries(
        &self,
        user_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<DailyEntry>>;

    /// Record a month's income, replacing an existing record for that month
    async fn upsert_monthly_income(&self, income: &NewMonthlyIncome) -> Result<MonthlyIncome>;

    /// List a user's monthly incomes, newest month first
    async fn list_monthly_incomes(&self, user_id: &str, limit: usize)
        -> Result<Vec<MonthlyIncome>>;

    /// Record a digital metal purchase
    async fn create_digital_asset(&self, asset: &NewDigitalAsset) -> Result<DigitalAsset>;

    /// List a user's digital metal purchases, newest first
    async fn list_digital_assets(&self, user_id: &str, limit: usize) -> Result<Vec<DigitalAsset>>;

    /// Record an equity purchase
    async fn create_equity_asset(&self, asset: &NewEquityAsset) -> Result<EquityAsset>;

    /// List a user's equity purchases, newest first
    async fn list_equity_assets(&self, user_id: &str, limit: usize) -> Result<Vec<EquityAsset>>;

    /// Hard delete a record; there are no tombstones
    async fn delete(&self, table: TableKey, user_id: &str, id: i64) -> Result<()>;

    /// Rows the user owns in each table
    async fn count_for_user(&self, user_id: &str) -> Result<RecordCounts>;
}

/// libSQL implementation of `LedgerRepository`
pub struct LibSqlLedgerRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlLedgerRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    async fn insert_returning_id(&self, sql: &str, values: Vec<Value>) -> Result<i64> {
        self.conn.execute(sql, Params::Positional(values)).await?;
        Ok(self.conn.last_insert_rowid())
    }

    async fn query(&self, sql: &str, values: Vec<Value>) -> Result<libsql::Rows> {
        Ok(self.conn.query(sql, Params::Positional(values)).await?)
    }

    fn parse_daily_entry(row: &libsql::Row) -> Result<DailyEntry> {
        Ok(DailyEntry {
            id: row.get(0)?,
            user_id: row.get(1)?,
            date: millis_to_datetime(row.get(2)?),
            category: row.get(3)?,
            description: optional_text(row.get_value(4)?),
            amount: row.get(5)?,
            bucket: row.get::<String>(6)?.parse()?,
            created_at: millis_to_datetime(row.get(7)?),
            updated_at: millis_to_datetime(row.get(8)?),
        })
    }

    fn parse_monthly_income(row: &libsql::Row) -> Result<MonthlyIncome> {
        Ok(MonthlyIncome {
            id: row.get(0)?,
            user_id: row.get(1)?,
            month: row.get(2)?,
            salary: row.get(3)?,
            other_income: row.get(4)?,
            total_income: row.get(5)?,
            created_at: millis_to_datetime(row.get(6)?),
            updated_at: millis_to_datetime(row.get(7)?),
        })
    }

    fn parse_digital_asset(row: &libsql::Row) -> Result<DigitalAsset> {
        Ok(DigitalAsset {
            id: row.get(0)?,
            user_id: row.get(1)?,
            date: millis_to_datetime(row.get(2)?),
            metal: row.get::<String>(3)?.parse()?,
            platform: row.get(4)?,
            rate_per_gram: row.get(5)?,
            amount_paid: row.get(6)?,
            weight_grams: row.get(7)?,
            net_value: row.get(8)?,
            created_at: millis_to_datetime(row.get(9)?),
            updated_at: millis_to_datetime(row.get(10)?),
        })
    }

    fn parse_equity_asset(row: &libsql::Row) -> Result<EquityAsset> {
        Ok(EquityAsset {
            id: row.get(0)?,
            user_id: row.get(1)?,
            date: millis_to_datetime(row.get(2)?),
            company: row.get(3)?,
            exchange: row.get(4)?,
            price_per_share: row.get(5)?,
            shares: row.get(6)?,
            total_amount: row.get(7)?,
            created_at: millis_to_datetime(row.get(8)?),
            updated_at: millis_to_datetime(row.get(9)?),
        })
    }
}

const DAILY_ENTRY_COLUMNS: &str =
    "id, user_id, date, category, description, amount, bucket, created_at, updated_at";
const MONTHLY_INCOME_COLUMNS: &str =
    "id, user_id, month, salary, other_income, total_income, created_at, updated_at";
const DIGITAL_ASSET_COLUMNS: &str = "id, user_id, date, metal, platform, rate_per_gram, \
     amount_paid, weight_grams, net_value, created_at, updated_at";
const EQUITY_ASSET_COLUMNS: &str = "id, user_id, date, company, exchange, price_per_share, \
     shares, total_amount, created_at, updated_at";

impl LedgerRepository for LibSqlLedgerRepository<'_> {
    async fn create_daily_entry(&self, entry: &NewDailyEntry) -> Result<DailyEntry> {
        entry.validate()?;
        let now = now_millis();
        let date = truncate_millis(entry.date);
        let description = normalize_text_option(entry.description.clone());

        let id = self
            .insert_returning_id(
                "INSERT INTO daily_entries
                 (user_id, date, category, description, amount, bucket, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                vec![
                    Value::Text(entry.user_id.clone()),
                    Value::Integer(date.timestamp_millis()),
                    Value::Text(entry.category.trim().to_string()),
                    description.clone().map_or(Value::Null, Value::Text),
                    Value::Real(entry.amount),
                    Value::Text(entry.bucket.as_str().to_string()),
                    Value::Integer(now.timestamp_millis()),
                    Value::Integer(now.timestamp_millis()),
                ],
            )
            .await?;

        Ok(DailyEntry {
            id,
            user_id: entry.user_id.clone(),
            date,
            category: entry.category.trim().to_string(),
            description,
            amount: entry.amount,
            bucket: entry.bucket,
            created_at: now,
            updated_at: now,
        })
    }

    async fn list_daily_entries(
        &self,
        user_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<DailyEntry>> {
        let mut rows = self
            .query(
                &format!(
                    "SELECT {DAILY_ENTRY_COLUMNS} FROM daily_entries
                     WHERE user_id = ?
                     ORDER BY date DESC, id DESC
                     LIMIT ? OFFSET ?"
                ),
                vec![
                    Value::Text(user_id.to_string()),
                    Value::Integer(limit as i64),
                    Value::Integer(offset as i64),
                ],
            )
            .await?;

        let mut entries = Vec::new();
        while let Some(row) = rows.next().await? {
            entries.push(Self::parse_daily_entry(&row)?);
        }
        Ok(entries)
    }

    async fn upsert_monthly_income(&self, income: &NewMonthlyIncome) -> Result<MonthlyIncome> {
        let mut income = income.clone();
        income.validate()?;
        let now = now_millis().timestamp_millis();
        let total = income.total_income();

        self.conn
            .execute(
                "INSERT INTO monthly_incomes
                 (user_id, month, salary, other_income, total_income, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?)
                 ON CONFLICT(user_id, month) DO UPDATE SET
                     salary = excluded.salary,
                     other_income = excluded.other_income,
                     total_income = excluded.total_income,
                     updated_at = excluded.updated_at",
                Params::Positional(vec![
                    Value::Text(income.user_id.clone()),
                    Value::Text(income.month.clone()),
                    Value::Real(income.salary),
                    Value::Real(income.other_income),
                    Value::Real(total),
                    Value::Integer(now),
                    Value::Integer(now),
                ]),
            )
            .await?;

        let mut rows = self
            .query(
                &format!(
                    "SELECT {MONTHLY_INCOME_COLUMNS} FROM monthly_incomes
                     WHERE user_id = ? AND month = ?"
                ),
                vec![
                    Value::Text(income.user_id.clone()),
                    Value::Text(income.month.clone()),
                ],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Self::parse_monthly_income(&row),
            None => Err(Error::NotFound(format!(
                "monthly income {} for {}",
                income.month, income.user_id
            ))),
        }
    }

    async fn list_monthly_incomes(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<MonthlyIncome>> {
        let mut rows = self
            .query(
                &format!(
                    "SELECT {MONTHLY_INCOME_COLUMNS} FROM monthly_incomes
                     WHERE user_id = ?
                     ORDER BY month DESC
                     LIMIT ?"
                ),
                vec![Value::Text(user_id.to_string()), Value::Integer(limit as i64)],
            )
            .await?;

        let mut incomes = Vec::new();
        while let Some(row) = rows.next().await? {
            incomes.push(Self::parse_monthly_income(&row)?);
        }
        Ok(incomes)
    }

    async fn create_digital_asset(&self, asset: &NewDigitalAsset) -> Result<DigitalAsset> {
        asset.validate()?;
        let now = now_millis();
        let date = truncate_millis(asset.date);
        let net_value = asset.net_value();
        let weight_grams = asset.weight_grams();

        let id = self
            .insert_returning_id(
                "INSERT INTO digital_assets
                 (user_id, date, metal, platform, rate_per_gram, amount_paid,
                  weight_grams, net_value, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                vec![
                    Value::Text(asset.user_id.clone()),
                    Value::Integer(date.timestamp_millis()),
                    Value::Text(asset.metal.as_str().to_string()),
                    Value::Text(asset.platform.trim().to_string()),
                    Value::Real(asset.rate_per_gram),
                    Value::Real(asset.amount_paid),
                    Value::Real(weight_grams),
                    Value::Real(net_value),
                    Value::Integer(now.timestamp_millis()),
                    Value::Integer(now.timestamp_millis()),
                ],
            )
            .await?;

        Ok(DigitalAsset {
            id,
            user_id: asset.user_id.clone(),
            date,
            metal: asset.metal,
            platform: asset.platform.trim().to_string(),
            rate_per_gram: asset.rate_per_gram,
            amount_paid: asset.amount_paid,
            weight_grams,
            net_value,
            created_at: now,
            updated_at: now,
        })
    }

    async fn list_digital_assets(&self, user_id: &str, limit: usize) -> Result<Vec<DigitalAsset>> {
        let mut rows = self
            .query(
                &format!(
                    "SELECT {DIGITAL_ASSET_COLUMNS} FROM digital_assets
                     WHERE user_id = ?
                     ORDER BY date DESC, id DESC
                     LIMIT ?"
                ),
                vec![Value::Text(user_id.to_string()), Value::Integer(limit as i64)],
            )
            .await?;

        let mut assets = Vec::new();
        while let Some(row) = rows.next().await? {
            assets.push(Self::parse_digital_asset(&row)?);
        }
        Ok(assets)
    }

    async fn create_equity_asset(&self, asset: &NewEquityAsset) -> Result<EquityAsset> {
        asset.validate()?;
        let now = now_millis();
        let date = truncate_millis(asset.date);
        let total_amount = asset.total_amount();
        let exchange = asset.exchange.trim().to_ascii_uppercase();

        let id = self
            .insert_returning_id(
                "INSERT INTO equity_assets
                 (user_id, date, company, exchange, price_per_share, shares,
                  total_amount, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
                vec![
                    Value::Text(asset.user_id.clone()),
                    Value::Integer(date.timestamp_millis()),
                    Value::Text(asset.company.trim().to_string()),
                    Value::Text(exchange.clone()),
                    Value::Real(asset.price_per_share),
                    Value::Real(asset.shares),
                    Value::Real(total_amount),
                    Value::Integer(now.timestamp_millis()),
                    Value::Integer(now.timestamp_millis()),
                ],
            )
            .await?;

        Ok(EquityAsset {
            id,
            user_id: asset.user_id.clone(),
            date,
            company: asset.company.trim().to_string(),
            exchange,
            price_per_share: asset.price_per_share,
            shares: asset.shares,
            total_amount,
            created_at: now,
            updated_at: now,
        })
    }

    async fn list_equity_assets(&self, user_id: &str, limit: usize) -> Result<Vec<EquityAsset>> {
        let mut rows = self
            .query(
                &format!(
                    "SELECT {EQUITY_ASSET_COLUMNS} FROM equity_assets
                     WHERE user_id = ?
                     ORDER BY date DESC, id DESC
                     LIMIT ?"
                ),
                vec![Value::Text(user_id.to_string()), Value::Integer(limit as i64)],
            )
            .await?;

        let mut assets = Vec::new();
        while let Some(row) = rows.next().await? {
            assets.push(Self::parse_equity_asset(&row)?);
        }
        Ok(assets)
    }

    async fn delete(&self, table: TableKey, user_id: &str, id: i64) -> Result<()> {
        let spec = table.spec();
        let rows = self
            .conn
            .execute(
                &format!(
                    "DELETE FROM {} WHERE id = ? AND {} = ?",
                    sql::quote_ident(spec.local_table),
                    sql::quote_ident(spec.owner_column)
                ),
                Params::Positional(vec![Value::Integer(id), Value::Text(user_id.to_string())]),
            )
            .await?;

        if rows == 0 {
            return Err(Error::NotFound(format!("{table} #{id}")));
        }
        Ok(())
    }

    async fn count_for_user(&self, user_id: &str) -> Result<RecordCounts> {
        let mut counts = RecordCounts::default();
        for spec in &REGISTRY {
            let count =
                sql::count_by_owner(self.conn, spec.local_table, spec.owner_column, user_id)
                    .await?;
            match spec.key {
                TableKey::DailyEntries => counts.daily_entries = count,
                TableKey::MonthlyIncomes => counts.monthly_incomes = count,
                TableKey::DigitalAssets => counts.digital_assets = count,
                TableKey::EquityAssets => counts.equity_assets = count,
            }
        }
        Ok(counts)
    }
}

fn now_millis() -> DateTime<Utc> {
    truncate_millis(Utc::now())
}

/// Drop sub-millisecond precision so values match what storage returns.
fn truncate_millis(instant: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(instant.timestamp_millis()).unwrap_or(instant)
}

fn millis_to_datetime(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or_default()
}

fn optional_text(value: Value) -> Option<String> {
    match value {
        Value::Text(text) => Some(text),
        _ => None,
    }
}
