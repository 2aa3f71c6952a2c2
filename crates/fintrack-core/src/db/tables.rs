//! Row-level access to the local ledger tables for the sync engine.

use chrono::DateTime;
use libsql::Connection;

use crate::error::Result;
use crate::sync::{is_timestamp_field, ConflictPolicy, Row, RowStore, Value};

use super::sql;

/// Insert batch size for local writes
const LOCAL_BATCH_SIZE: usize = 100;

/// Local store view over a borrowed connection.
///
/// Timestamp columns are stored as Unix milliseconds and surface as
/// `Value::Timestamp`.
pub struct LocalTables<'a> {
    conn: &'a Connection,
}

impl<'a> LocalTables<'a> {
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

fn decode_stored_timestamps(row: Row) -> Row {
    row.into_iter()
        .map(|(name, value)| {
            let value = match value {
                Value::Integer(ms) if is_timestamp_field(&name) => DateTime::from_timestamp_millis(ms)
                    .map_or(Value::Integer(ms), Value::Timestamp),
                other => other,
            };
            (name, value)
        })
        .collect()
}

impl RowStore for LocalTables<'_> {
    async fn select_by_owner(
        &self,
        table: &str,
        owner_column: &str,
        owner: &str,
    ) -> Result<Vec<Row>> {
        let rows = sql::select_by_owner(self.conn, table, owner_column, owner).await?;
        Ok(rows.into_iter().map(decode_stored_timestamps).collect())
    }

    async fn insert_rows(&self, table: &str, rows: &[Row], policy: ConflictPolicy) -> Result<u64> {
        sql::insert_rows(self.conn, table, rows, policy, LOCAL_BATCH_SIZE).await
    }

    async fn count_by_owner(&self, table: &str, owner_column: &str, owner: &str) -> Result<usize> {
        sql::count_by_owner(self.conn, table, owner_column, owner).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::sync::row_from;
    use chrono::Utc;

    #[tokio::test(flavor = "multi_thread")]
    async fn timestamps_round_trip_through_local_storage() {
        let db = Database::open_in_memory().await.unwrap();
        let tables = LocalTables::new(db.connection());
        let at = DateTime::from_timestamp_millis(1_714_550_400_123).unwrap_or_else(Utc::now);

        let row = row_from([
            ("id", Value::Integer(3)),
            ("user_id", Value::from("alice")),
            ("month", Value::from("2024-05")),
            ("salary", Value::Real(50_000.0)),
            ("other_income", Value::Real(0.0)),
            ("total_income", Value::Real(50_000.0)),
            ("created_at", Value::Timestamp(at)),
            ("updated_at", Value::Timestamp(at)),
        ]);
        tables
            .insert_rows("monthly_incomes", &[row.clone()], ConflictPolicy::Abort)
            .await
            .unwrap();

        let fetched = tables
            .select_by_owner("monthly_incomes", "user_id", "alice")
            .await
            .unwrap();
        assert_eq!(fetched, vec![row]);
        assert_eq!(
            tables
                .count_by_owner("monthly_incomes", "user_id", "alice")
                .await
                .unwrap(),
            1
        );
    }
}
