//! Store interfaces the sync engine runs against.
//!
//! The engine never sees SQL; it reads and writes [`Row`]s through these
//! traits. `crate::db` provides the libSQL implementations.

use crate::db::ChangeSet;
use crate::error::Result;

use super::row::Row;

/// Behaviour when an inserted row collides with a uniqueness constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictPolicy {
    /// Fail the statement
    Abort,
    /// Skip the colliding row
    Ignore,
}

/// Row access shared by both stores.
#[allow(async_fn_in_trait)]
pub trait RowStore {
    /// All rows of `table` whose `owner_column` equals `owner`, ordered by id
    async fn select_by_owner(&self, table: &str, owner_column: &str, owner: &str)
        -> Result<Vec<Row>>;

    /// Insert rows, returning how many were written
    async fn insert_rows(&self, table: &str, rows: &[Row], policy: ConflictPolicy) -> Result<u64>;

    /// Number of rows `owner` holds in `table`
    async fn count_by_owner(&self, table: &str, owner_column: &str, owner: &str) -> Result<usize> {
        Ok(self.select_by_owner(table, owner_column, owner).await?.len())
    }
}

/// The remote replica: row access plus owner-scoped replace and schema management.
#[allow(async_fn_in_trait)]
pub trait RemoteStore: RowStore {
    /// Replace `owner`'s rows in `table` with `rows` inside one transaction.
    ///
    /// Inserts run in batches of `batch_size`; the transaction is atomic as a
    /// whole, so readers never see a partially deleted table.
    async fn replace_owner_rows(
        &self,
        table: &str,
        owner_column: &str,
        owner: &str,
        rows: &[Row],
        batch_size: usize,
    ) -> Result<u64>;

    /// Names from `tables` that do not exist in the remote catalog
    async fn missing_tables(&self, tables: &[&str]) -> Result<Vec<String>>;

    /// Tags recorded in the migration ledger; empty when the ledger is absent
    async fn applied_migration_tags(&self) -> Result<Vec<String>>;

    /// Apply one change set and record its tag in the ledger, atomically
    async fn apply_change_set(&self, change_set: &ChangeSet) -> Result<()>;
}
