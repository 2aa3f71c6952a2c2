//! Shared database service wrapper used across clients.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, MutexGuard};

use crate::db::{Database, FlagStore, LedgerRepository, LibSqlFlagsRepository, LibSqlLedgerRepository};
use crate::models::{
    DailyEntry, DigitalAsset, EquityAsset, MonthlyIncome, NewDailyEntry, NewDigitalAsset,
    NewEquityAsset, NewMonthlyIncome, RecordCounts,
};
use crate::summary::{budget_summary, portfolio_allocation, BudgetSummary, Portfolio};
use crate::sync::TableKey;
use crate::Result;

/// SQLite treats any LIMIT above the row count as "everything"
const ALL_ROWS: usize = i64::MAX as usize;

/// Thread-safe service for DB and repository operations.
///
/// Every operation takes the same lock, and so does a running sync session,
/// so writes made during a sync wait for it to finish.
#[derive(Clone)]
pub struct DatabaseService {
    db: Arc<Mutex<Database>>,
    db_path: Option<PathBuf>,
}

impl DatabaseService {
    /// Open a database service at the given filesystem path.
    pub async fn open_path(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        tracing::debug!("Opening local database at {}", db_path.display());
        let db = Database::open(&db_path).await?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            db_path: Some(db_path),
        })
    }

    /// Open an in-memory database service (primarily for tests).
    pub async fn open_in_memory() -> Result<Self> {
        let db = Database::open_in_memory().await?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            db_path: None,
        })
    }

    /// Filesystem location, `None` for in-memory databases.
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Exclusive access to the database for the duration of a sync session.
    pub(crate) async fn lock(&self) -> MutexGuard<'_, Database> {
        self.db.lock().await
    }

    /// Record an expense.
    pub async fn create_daily_entry(&self, entry: &NewDailyEntry) -> Result<DailyEntry> {
        let db = self.db.lock().await;
        let repo = LibSqlLedgerRepository::new(db.connection());
        repo.create_daily_entry(entry).await
    }

    /// List expenses newest-first.
    pub async fn list_daily_entries(
        &self,
        user_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<DailyEntry>> {
        let db = self.db.lock().await;
        let repo = LibSqlLedgerRepository::new(db.connection());
        repo.list_daily_entries(user_id, limit, offset).await
    }

    /// Record or replace a month's income.
    pub async fn upsert_monthly_income(&self, income: &NewMonthlyIncome) -> Result<MonthlyIncome> {
        let db = self.db.lock().await;
        let repo = LibSqlLedgerRepository::new(db.connection());
        repo.upsert_monthly_income(income).await
    }

    pub async fn list_monthly_incomes(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<MonthlyIncome>> {
        let db = self.db.lock().await;
        let repo = LibSqlLedgerRepository::new(db.connection());
        repo.list_monthly_incomes(user_id, limit).await
    }

    /// Record a digital gold or silver purchase.
    pub async fn create_digital_asset(&self, asset: &NewDigitalAsset) -> Result<DigitalAsset> {
        let db = self.db.lock().await;
        let repo = LibSqlLedgerRepository::new(db.connection());
        repo.create_digital_asset(asset).await
    }

    pub async fn list_digital_assets(&self, user_id: &str, limit: usize) -> Result<Vec<DigitalAsset>> {
        let db = self.db.lock().await;
        let repo = LibSqlLedgerRepository::new(db.connection());
        repo.list_digital_assets(user_id, limit).await
    }

    /// Record a share purchase.
    pub async fn create_equity_asset(&self, asset: &NewEquityAsset) -> Result<EquityAsset> {
        let db = self.db.lock().await;
        let repo = LibSqlLedgerRepository::new(db.connection());
        repo.create_equity_asset(asset).await
    }

    pub async fn list_equity_assets(&self, user_id: &str, limit: usize) -> Result<Vec<EquityAsset>> {
        let db = self.db.lock().await;
        let repo = LibSqlLedgerRepository::new(db.connection());
        repo.list_equity_assets(user_id, limit).await
    }

    /// Hard-delete a record the user owns.
    pub async fn delete_record(&self, table: TableKey, user_id: &str, id: i64) -> Result<()> {
        let db = self.db.lock().await;
        let repo = LibSqlLedgerRepository::new(db.connection());
        repo.delete(table, user_id, id).await
    }

    /// Per-table row counts for a user.
    pub async fn local_record_count(&self, user_id: &str) -> Result<RecordCounts> {
        let db = self.db.lock().await;
        let repo = LibSqlLedgerRepository::new(db.connection());
        repo.count_for_user(user_id).await
    }

    /// Budget split for `month` (`YYYY-MM`).
    pub async fn budget_summary(&self, user_id: &str, month: &str) -> Result<BudgetSummary> {
        let month = crate::models::normalize_month(month)?;
        let db = self.db.lock().await;
        let repo = LibSqlLedgerRepository::new(db.connection());
        let entries = repo.list_daily_entries(user_id, ALL_ROWS, 0).await?;
        let incomes = repo.list_monthly_incomes(user_id, ALL_ROWS).await?;
        let income = incomes.iter().find(|income| income.month == month);
        Ok(budget_summary(&month, &entries, income))
    }

    /// Allocation across gold, silver and equity.
    pub async fn portfolio(&self, user_id: &str) -> Result<Portfolio> {
        let db = self.db.lock().await;
        let repo = LibSqlLedgerRepository::new(db.connection());
        let metals = repo.list_digital_assets(user_id, ALL_ROWS).await?;
        let equities = repo.list_equity_assets(user_id, ALL_ROWS).await?;
        Ok(portfolio_allocation(&metals, &equities))
    }

    /// When the last sync session finished.
    pub async fn last_sync_time(&self) -> Result<Option<DateTime<Utc>>> {
        let db = self.db.lock().await;
        LibSqlFlagsRepository::new(db.connection()).last_sync_at().await
    }

    /// Whether this install has migrated the remote schema.
    pub async fn remote_migrated(&self) -> Result<bool> {
        let db = self.db.lock().await;
        LibSqlFlagsRepository::new(db.connection())
            .remote_migrated()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BudgetBucket;
    use tempfile::tempdir;

    fn expense(user: &str) -> NewDailyEntry {
        NewDailyEntry {
            user_id: user.to_string(),
            date: Utc::now(),
            category: "rent".to_string(),
            description: None,
            amount: 15_000.0,
            bucket: BudgetBucket::Needs,
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn in_memory_create_and_list_roundtrip() {
        let service = DatabaseService::open_in_memory().await.unwrap();

        service.create_daily_entry(&expense("alice")).await.unwrap();
        let entries = service.list_daily_entries("alice", 10, 0).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].category, "rent");
        assert!(service.db_path().is_none());
        assert_eq!(service.last_sync_time().await.unwrap(), None);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn open_path_creates_parent_directories() {
        let tmp = tempdir().unwrap();
        let db_path = tmp.path().join("nested").join("fintrack.db");

        let service = DatabaseService::open_path(&db_path).await.unwrap();
        service.create_daily_entry(&expense("alice")).await.unwrap();
        assert!(db_path.exists());

        let counts = service.local_record_count("alice").await.unwrap();
        assert_eq!(counts.daily_entries, 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn budget_summary_reads_month_from_storage() {
        let service = DatabaseService::open_in_memory().await.unwrap();
        let mut entry = expense("alice");
        entry.date = chrono::TimeZone::with_ymd_and_hms(&Utc, 2024, 5, 2, 0, 0, 0).unwrap();
        service.create_daily_entry(&entry).await.unwrap();
        service
            .upsert_monthly_income(&NewMonthlyIncome {
                user_id: "alice".to_string(),
                month: "2024-05".to_string(),
                salary: 40_000.0,
                other_income: 0.0,
            })
            .await
            .unwrap();

        let summary = service.budget_summary("alice", "2024-5").await.unwrap();
        assert_eq!(summary.month, "2024-05");
        assert_eq!(summary.income, Some(40_000.0));
        assert_eq!(summary.buckets[0].spent, 15_000.0);
        assert_eq!(summary.buckets[0].target_amount, Some(20_000.0));

        let portfolio = service.portfolio("alice").await.unwrap();
        assert_eq!(portfolio.total_invested, 0.0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn clones_share_one_database() {
        let service = DatabaseService::open_in_memory().await.unwrap();
        let clone = service.clone();

        clone.create_daily_entry(&expense("alice")).await.unwrap();
        let entry = &service.list_daily_entries("alice", 1, 0).await.unwrap()[0];
        service
            .delete_record(TableKey::DailyEntries, "alice", entry.id)
            .await
            .unwrap();
        assert_eq!(clone.local_record_count("alice").await.unwrap().total(), 0);
    }
}
