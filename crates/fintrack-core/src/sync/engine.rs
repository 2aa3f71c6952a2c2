//! Per-table reconciliation between the on-device database and the replica.
//!
//! For each registered table the engine compares how many rows the user holds
//! on each side and picks one direction:
//!
//! | local | remote | action    |
//! |-------|--------|-----------|
//! | 0     | > 0    | `Restore` |
//! | > 0   | any    | `Push`    |
//! | 0     | 0      | `Skip`    |
//!
//! A push replaces the user's remote rows wholesale, so when both sides hold
//! data the device that syncs last wins.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::util::compact_text;

use super::codec::{to_local_row, to_remote_row};
use super::registry::{TableKey, TableSpec, REGISTRY};
use super::row::{Row, Value};
use super::store::{ConflictPolicy, RemoteStore, RowStore};

/// Rows per INSERT statement when pushing to the replica
pub const PUSH_BATCH_SIZE: usize = 100;

const ID_COLUMN: &str = "id";

/// Direction chosen for one table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncAction {
    /// Copy remote rows into the empty local table
    Restore,
    /// Replace the user's remote rows with the local ones
    Push,
    /// Nothing on either side
    Skip,
}

/// Pick the sync direction from row counts.
pub const fn decide(local_count: usize, remote_count: usize) -> SyncAction {
    match (local_count, remote_count) {
        (0, 0) => SyncAction::Skip,
        (0, _) => SyncAction::Restore,
        _ => SyncAction::Push,
    }
}

/// What happened to one table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableOutcome {
    pub action: SyncAction,
    pub local_rows: usize,
    pub remote_rows: usize,
    /// Rows inserted on the destination side
    pub written: u64,
    /// The remote read failed and was treated as empty
    pub remote_snapshot_failed: bool,
}

/// Per-table entry of a sync report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableReport {
    pub table: TableKey,
    pub result: std::result::Result<TableOutcome, String>,
}

impl TableReport {
    pub const fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    /// Whether rows were restored from the replica into this table
    pub fn restored(&self) -> bool {
        matches!(
            &self.result,
            Ok(TableOutcome { action: SyncAction::Restore, written, .. }) if *written > 0
        )
    }
}

/// Reconcile one table for `user_id`.
pub async fn reconcile_table<L, R>(
    local: &L,
    remote: &R,
    spec: &TableSpec,
    user_id: &str,
) -> Result<TableOutcome>
where
    L: RowStore,
    R: RemoteStore,
{
    let local_rows = local
        .select_by_owner(spec.local_table, spec.owner_column, user_id)
        .await?;

    let (remote_rows, remote_snapshot_failed) = match remote
        .select_by_owner(spec.remote_table, spec.owner_column, user_id)
        .await
    {
        Ok(rows) => (rows, false),
        Err(error) => {
            tracing::warn!(
                "Could not read remote {} for {user_id}, treating it as empty: {error}",
                spec.remote_table
            );
            (Vec::new(), true)
        }
    };

    let action = decide(local_rows.len(), remote_rows.len());
    let mut outcome = TableOutcome {
        action,
        local_rows: local_rows.len(),
        remote_rows: remote_rows.len(),
        written: 0,
        remote_snapshot_failed,
    };

    match action {
        SyncAction::Skip => {}
        SyncAction::Restore => {
            let decoded: Vec<_> = remote_rows.into_iter().map(to_local_row).collect();
            outcome.written = restore_rows(local, spec, user_id, decoded).await?;
            if outcome.written < row_count(outcome.remote_rows) {
                return Err(Error::Database(format!(
                    "restored only {} of {} rows into {}",
                    outcome.written, outcome.remote_rows, spec.local_table
                )));
            }
            tracing::info!(
                "Restored {} of {} rows into {}",
                outcome.written,
                outcome.remote_rows,
                spec.local_table
            );
        }
        SyncAction::Push => {
            let encoded: Vec<_> = local_rows.into_iter().map(to_remote_row).collect();
            outcome.written = remote
                .replace_owner_rows(
                    spec.remote_table,
                    spec.owner_column,
                    user_id,
                    &encoded,
                    PUSH_BATCH_SIZE,
                )
                .await?;
            tracing::info!(
                "Pushed {} rows to {} (replaced {})",
                outcome.written,
                spec.remote_table,
                outcome.remote_rows
            );
        }
    }

    Ok(outcome)
}

/// Insert restored rows into an empty local table.
///
/// Local ids are unique per device while the replica keys rows on
/// `(owner, id)`, so on a shared device another user may already hold a
/// restored row's id. Those rows are inserted again without their id and get
/// a fresh local one.
async fn restore_rows<L: RowStore>(
    local: &L,
    spec: &TableSpec,
    user_id: &str,
    rows: Vec<Row>,
) -> Result<u64> {
    let mut written = local
        .insert_rows(spec.local_table, &rows, ConflictPolicy::Ignore)
        .await?;
    if written >= row_count(rows.len()) {
        return Ok(written);
    }

    let kept: BTreeSet<i64> = local
        .select_by_owner(spec.local_table, spec.owner_column, user_id)
        .await?
        .iter()
        .filter_map(row_id)
        .collect();
    let reassigned: Vec<Row> = rows
        .into_iter()
        .filter(|row| !matches!(row_id(row), Some(id) if kept.contains(&id)))
        .map(|mut row| {
            row.remove(ID_COLUMN);
            row
        })
        .collect();

    tracing::warn!(
        "{} restored rows in {} collide with local ids; assigning new ids",
        reassigned.len(),
        spec.local_table
    );
    written += local
        .insert_rows(spec.local_table, &reassigned, ConflictPolicy::Abort)
        .await?;
    Ok(written)
}

fn row_count(len: usize) -> u64 {
    u64::try_from(len).unwrap_or(u64::MAX)
}

fn row_id(row: &Row) -> Option<i64> {
    match row.get(ID_COLUMN) {
        Some(Value::Integer(id)) => Some(*id),
        _ => None,
    }
}

/// Reconcile every registered table in order.
///
/// A failing table is logged and recorded; the rest still run.
pub async fn reconcile_all<L, R>(local: &L, remote: &R, user_id: &str) -> Vec<TableReport>
where
    L: RowStore,
    R: RemoteStore,
{
    let mut reports = Vec::with_capacity(REGISTRY.len());
    for spec in &REGISTRY {
        let result = reconcile_table(local, remote, spec, user_id)
            .await
            .map_err(|error| {
                tracing::warn!("Sync of {} failed: {error}", spec.key);
                compact_text(&error.to_string())
            });
        reports.push(TableReport {
            table: spec.key,
            result,
        });
    }
    reports
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{ChangeSet, Database, LocalTables, RemoteDatabase, REMOTE_CHANGE_SETS};
    use crate::error::Error;
    use crate::sync::{row_from, to_remote_row, Row, Value};
    use chrono::DateTime;
    use pretty_assertions::assert_eq;

    async fn remote() -> RemoteDatabase {
        let remote = RemoteDatabase::open_in_memory().await.unwrap();
        for set in REMOTE_CHANGE_SETS {
            remote.apply_change_set(set).await.unwrap();
        }
        remote
    }

    fn expense(id: i64, user: &str, amount: f64) -> Row {
        let at = DateTime::from_timestamp_millis(1_714_550_400_000 + id).unwrap();
        row_from([
            ("id", Value::Integer(id)),
            ("user_id", Value::from(user)),
            ("date", Value::Timestamp(at)),
            ("category", Value::from("food")),
            ("description", Value::Null),
            ("amount", Value::Real(amount)),
            ("bucket", Value::from("needs")),
            ("created_at", Value::Timestamp(at)),
            ("updated_at", Value::Timestamp(at)),
        ])
    }

    fn remote_expense(id: i64, user: &str, amount: f64) -> Row {
        to_remote_row(expense(id, user, amount))
    }

    async fn local_expenses(local: &LocalTables<'_>, user: &str) -> Vec<Row> {
        local
            .select_by_owner("daily_entries", "user_id", user)
            .await
            .unwrap()
    }

    async fn remote_expenses(remote: &RemoteDatabase, user: &str) -> Vec<Row> {
        remote
            .select_by_owner("daily_entries", "user_id", user)
            .await
            .unwrap()
    }

    #[test]
    fn decide_covers_every_count_combination() {
        assert_eq!(decide(0, 0), SyncAction::Skip);
        assert_eq!(decide(0, 7), SyncAction::Restore);
        assert_eq!(decide(3, 0), SyncAction::Push);
        assert_eq!(decide(3, 7), SyncAction::Push);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn restore_is_idempotent() {
        let db = Database::open_in_memory().await.unwrap();
        let local = LocalTables::new(db.connection());
        let remote = remote().await;
        remote
            .insert_rows(
                "daily_entries",
                &[remote_expense(1, "alice", 10.0), remote_expense(2, "alice", 20.0)],
                ConflictPolicy::Abort,
            )
            .await
            .unwrap();

        let spec = TableKey::DailyEntries.spec();
        let first = reconcile_table(&local, &remote, spec, "alice").await.unwrap();
        assert_eq!(first.action, SyncAction::Restore);
        assert_eq!(first.written, 2);
        let restored = local_expenses(&local, "alice").await;
        assert_eq!(
            restored,
            vec![expense(1, "alice", 10.0), expense(2, "alice", 20.0)]
        );

        // replaying the same remote rows into the local table changes nothing
        let decoded: Vec<Row> = remote_expenses(&remote, "alice")
            .await
            .into_iter()
            .map(to_local_row)
            .collect();
        local
            .insert_rows("daily_entries", &decoded, ConflictPolicy::Ignore)
            .await
            .unwrap();
        assert_eq!(local_expenses(&local, "alice").await, restored);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn push_replaces_remote_rows_for_user_only() {
        let db = Database::open_in_memory().await.unwrap();
        let local = LocalTables::new(db.connection());
        let remote = remote().await;
        remote
            .insert_rows(
                "daily_entries",
                &[
                    remote_expense(1, "alice", 1.0),
                    remote_expense(2, "alice", 2.0),
                    remote_expense(3, "alice", 3.0),
                    remote_expense(1, "bob", 9.0),
                ],
                ConflictPolicy::Abort,
            )
            .await
            .unwrap();
        local
            .insert_rows(
                "daily_entries",
                &[expense(10, "alice", 100.0)],
                ConflictPolicy::Abort,
            )
            .await
            .unwrap();

        let outcome = reconcile_table(&local, &remote, TableKey::DailyEntries.spec(), "alice")
            .await
            .unwrap();
        assert_eq!(outcome.action, SyncAction::Push);
        assert_eq!(outcome.remote_rows, 3);
        assert_eq!(outcome.written, 1);

        assert_eq!(
            remote_expenses(&remote, "alice").await,
            vec![remote_expense(10, "alice", 100.0)]
        );
        assert_eq!(
            remote_expenses(&remote, "bob").await,
            vec![remote_expense(1, "bob", 9.0)]
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn push_batches_large_tables() {
        let db = Database::open_in_memory().await.unwrap();
        let local = LocalTables::new(db.connection());
        let remote = remote().await;
        let rows: Vec<Row> = (1..=250).map(|id| expense(id, "alice", 1.0)).collect();
        local
            .insert_rows("daily_entries", &rows, ConflictPolicy::Abort)
            .await
            .unwrap();

        let outcome = reconcile_table(&local, &remote, TableKey::DailyEntries.spec(), "alice")
            .await
            .unwrap();
        assert_eq!(outcome.written, 250);
        assert_eq!(
            remote
                .count_by_owner("daily_entries", "user_id", "alice")
                .await
                .unwrap(),
            250
        );
    }

    /// Replica whose reads of one table fail
    struct UnreadableTable {
        inner: RemoteDatabase,
        table: &'static str,
    }

    impl RowStore for UnreadableTable {
        async fn select_by_owner(&self, table: &str, column: &str, owner: &str) -> Result<Vec<Row>> {
            if table == self.table {
                return Err(Error::Database(format!("no such table: {table}")));
            }
            self.inner.select_by_owner(table, column, owner).await
        }

        async fn insert_rows(&self, table: &str, rows: &[Row], policy: ConflictPolicy) -> Result<u64> {
            self.inner.insert_rows(table, rows, policy).await
        }
    }

    impl RemoteStore for UnreadableTable {
        async fn replace_owner_rows(
            &self,
            table: &str,
            column: &str,
            owner: &str,
            rows: &[Row],
            batch_size: usize,
        ) -> Result<u64> {
            if table == self.table {
                return Err(Error::Database(format!("no such table: {table}")));
            }
            self.inner
                .replace_owner_rows(table, column, owner, rows, batch_size)
                .await
        }

        async fn missing_tables(&self, tables: &[&str]) -> Result<Vec<String>> {
            self.inner.missing_tables(tables).await
        }

        async fn applied_migration_tags(&self) -> Result<Vec<String>> {
            self.inner.applied_migration_tags().await
        }

        async fn apply_change_set(&self, change_set: &ChangeSet) -> Result<()> {
            self.inner.apply_change_set(change_set).await
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn snapshot_failure_is_flagged_and_skips_empty_local() {
        let db = Database::open_in_memory().await.unwrap();
        let local = LocalTables::new(db.connection());
        let remote = UnreadableTable {
            inner: remote().await,
            table: "daily_entries",
        };
        remote
            .inner
            .insert_rows(
                "daily_entries",
                &[remote_expense(1, "alice", 5.0)],
                ConflictPolicy::Abort,
            )
            .await
            .unwrap();

        let outcome = reconcile_table(&local, &remote, TableKey::DailyEntries.spec(), "alice")
            .await
            .unwrap();
        assert_eq!(outcome.action, SyncAction::Skip);
        assert!(outcome.remote_snapshot_failed);
        assert!(local_expenses(&local, "alice").await.is_empty());
    }

    fn equity(id: i64, user: &str) -> Row {
        let at = DateTime::from_timestamp_millis(1_714_550_400_000).unwrap();
        row_from([
            ("id", Value::Integer(id)),
            ("user_id", Value::from(user)),
            ("date", Value::Timestamp(at)),
            ("company", Value::from("Infosys")),
            ("exchange", Value::from("NSE")),
            ("price_per_share", Value::Real(1_500.0)),
            ("shares", Value::Real(2.0)),
            ("total_amount", Value::Real(3_000.0)),
            ("created_at", Value::Timestamp(at)),
            ("updated_at", Value::Timestamp(at)),
        ])
    }

    fn income(id: i64, user: &str) -> Row {
        let at = DateTime::from_timestamp_millis(1_714_550_400_000).unwrap();
        row_from([
            ("id", Value::Integer(id)),
            ("user_id", Value::from(user)),
            ("month", Value::from("2024-05")),
            ("salary", Value::Real(50_000.0)),
            ("other_income", Value::Real(0.0)),
            ("total_income", Value::Real(50_000.0)),
            ("created_at", Value::Timestamp(at)),
            ("updated_at", Value::Timestamp(at)),
        ])
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failing_table_does_not_stop_the_others() {
        let db = Database::open_in_memory().await.unwrap();
        let local = LocalTables::new(db.connection());
        let remote = UnreadableTable {
            inner: remote().await,
            table: "monthly_incomes",
        };
        local
            .insert_rows("daily_entries", &[expense(1, "alice", 5.0)], ConflictPolicy::Abort)
            .await
            .unwrap();
        local
            .insert_rows("monthly_incomes", &[income(1, "alice")], ConflictPolicy::Abort)
            .await
            .unwrap();
        local
            .insert_rows("equity_assets", &[equity(1, "alice")], ConflictPolicy::Abort)
            .await
            .unwrap();

        let reports = reconcile_all(&local, &remote, "alice").await;
        let tables: Vec<TableKey> = reports.iter().map(|report| report.table).collect();
        assert_eq!(tables, TableKey::ALL.to_vec());

        let failed: Vec<TableKey> = reports
            .iter()
            .filter(|report| !report.is_ok())
            .map(|report| report.table)
            .collect();
        assert_eq!(failed, vec![TableKey::MonthlyIncomes]);

        // tables before and after the failing one reach their end state
        assert_eq!(reports[0].result.as_ref().unwrap().action, SyncAction::Push);
        assert_eq!(
            remote_expenses(&remote.inner, "alice").await,
            vec![remote_expense(1, "alice", 5.0)]
        );
        assert_eq!(reports[2].result.as_ref().unwrap().action, SyncAction::Skip);
        assert_eq!(reports[3].result.as_ref().unwrap().written, 1);
        assert_eq!(
            remote
                .inner
                .select_by_owner("equity_assets", "user_id", "alice")
                .await
                .unwrap(),
            vec![to_remote_row(equity(1, "alice"))]
        );
        assert_eq!(
            remote
                .inner
                .count_by_owner("monthly_incomes", "user_id", "alice")
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn restore_on_shared_device_keeps_every_row() {
        let db = Database::open_in_memory().await.unwrap();
        let local = LocalTables::new(db.connection());
        let remote = remote().await;
        let spec = TableKey::DailyEntries.spec();

        // bob pushed ids 1..=3 from his own device
        remote
            .insert_rows(
                "daily_entries",
                &[
                    remote_expense(1, "bob", 10.0),
                    remote_expense(2, "bob", 20.0),
                    remote_expense(3, "bob", 30.0),
                ],
                ConflictPolicy::Abort,
            )
            .await
            .unwrap();
        // alice already holds ids 1 and 2 on this device
        let alice = vec![expense(1, "alice", 1.0), expense(2, "alice", 2.0)];
        local
            .insert_rows("daily_entries", &alice, ConflictPolicy::Abort)
            .await
            .unwrap();

        let restored = reconcile_table(&local, &remote, spec, "bob").await.unwrap();
        assert_eq!(restored.action, SyncAction::Restore);
        assert_eq!(restored.written, 3);
        assert_eq!(local_expenses(&local, "alice").await, alice);

        let mut bob: Vec<f64> = local_expenses(&local, "bob")
            .await
            .iter()
            .filter_map(|row| match row.get("amount") {
                Some(Value::Real(amount)) => Some(*amount),
                _ => None,
            })
            .collect();
        bob.sort_by(f64::total_cmp);
        assert_eq!(bob, vec![10.0, 20.0, 30.0]);

        // the next session pushes bob's full table back
        let pushed = reconcile_table(&local, &remote, spec, "bob").await.unwrap();
        assert_eq!(pushed.action, SyncAction::Push);
        assert_eq!(pushed.written, 3);
        assert_eq!(
            remote
                .count_by_owner("daily_entries", "user_id", "bob")
                .await
                .unwrap(),
            3
        );
    }

    /// Local store that accepts inserts without writing anything
    struct DroppingLocal<'a>(LocalTables<'a>);

    impl RowStore for DroppingLocal<'_> {
        async fn select_by_owner(&self, table: &str, column: &str, owner: &str) -> Result<Vec<Row>> {
            self.0.select_by_owner(table, column, owner).await
        }

        async fn insert_rows(&self, _table: &str, _rows: &[Row], _policy: ConflictPolicy) -> Result<u64> {
            Ok(0)
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn partial_restore_fails_the_table() {
        let db = Database::open_in_memory().await.unwrap();
        let local = DroppingLocal(LocalTables::new(db.connection()));
        let remote = remote().await;
        remote
            .insert_rows(
                "daily_entries",
                &[remote_expense(1, "alice", 10.0)],
                ConflictPolicy::Abort,
            )
            .await
            .unwrap();

        let reports = reconcile_all(&local, &remote, "alice").await;
        assert!(!reports[0].is_ok());
        assert!(!reports[0].restored());
        assert!(reports[0]
            .result
            .as_ref()
            .unwrap_err()
            .contains("restored only 0 of 1 rows"));
    }
}
