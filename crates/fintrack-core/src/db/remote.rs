//! Remote replica connection

use chrono::Utc;
use libsql::params::Params;
use libsql::{Builder, Connection, Database as LibSqlDatabase};

use crate::config::{RemoteConfig, RemoteTarget};
use crate::error::{Error, Result};
use crate::sync::{format_timestamp, ConflictPolicy, RemoteStore, Row, RowStore};

use super::remote_schema::{ledger_ddl, ChangeSet, MIGRATION_LEDGER_TABLE};
use super::sql;

/// Insert batch size used outside of `replace_owner_rows`
const REMOTE_BATCH_SIZE: usize = 100;

/// Connection to the remote replica.
///
/// Hosted targets talk to Turso over the network; file and in-memory targets
/// use a plain local libSQL database, which is how tests stand up a replica.
pub struct RemoteDatabase {
    _db: LibSqlDatabase,
    conn: Connection,
    target: RemoteTarget,
}

impl RemoteDatabase {
    /// Connect using a validated remote configuration
    pub async fn connect(config: &RemoteConfig) -> Result<Self> {
        let target = config.target()?;
        let db = match &target {
            RemoteTarget::Hosted { url, auth_token } => {
                tracing::info!("Connecting to remote replica at {url}");
                Builder::new_remote(url.clone(), auth_token.clone())
                    .build()
                    .await?
            }
            RemoteTarget::File(path) => {
                tracing::info!("Using local file {path} as remote replica");
                Builder::new_local(path).build().await?
            }
            RemoteTarget::Memory => Builder::new_local(":memory:").build().await?,
        };
        let conn = db.connect()?;
        Ok(Self {
            _db: db,
            conn,
            target,
        })
    }

    /// Open an empty in-memory replica (useful for testing)
    pub async fn open_in_memory() -> Result<Self> {
        let db = Builder::new_local(":memory:").build().await?;
        let conn = db.connect()?;
        Ok(Self {
            _db: db,
            conn,
            target: RemoteTarget::Memory,
        })
    }

    /// Where this replica lives
    pub const fn target(&self) -> &RemoteTarget {
        &self.target
    }

    /// Get a reference to the underlying connection
    pub const fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl RowStore for RemoteDatabase {
    async fn select_by_owner(
        &self,
        table: &str,
        owner_column: &str,
        owner: &str,
    ) -> Result<Vec<Row>> {
        sql::select_by_owner(&self.conn, table, owner_column, owner).await
    }

    async fn insert_rows(&self, table: &str, rows: &[Row], policy: ConflictPolicy) -> Result<u64> {
        sql::insert_rows(&self.conn, table, rows, policy, REMOTE_BATCH_SIZE).await
    }

    async fn count_by_owner(&self, table: &str, owner_column: &str, owner: &str) -> Result<usize> {
        sql::count_by_owner(&self.conn, table, owner_column, owner).await
    }
}

impl RemoteStore for RemoteDatabase {
    async fn replace_owner_rows(
        &self,
        table: &str,
        owner_column: &str,
        owner: &str,
        rows: &[Row],
        batch_size: usize,
    ) -> Result<u64> {
        self.conn.execute("BEGIN TRANSACTION", ()).await?;

        let replaced = async {
            let deleted = sql::delete_by_owner(&self.conn, table, owner_column, owner).await?;
            let inserted =
                sql::insert_rows(&self.conn, table, rows, ConflictPolicy::Abort, batch_size)
                    .await?;
            tracing::debug!("Replaced {deleted} remote rows in {table} with {inserted}");
            Ok::<u64, Error>(inserted)
        }
        .await;

        match replaced {
            Ok(inserted) => {
                if let Err(e) = self.conn.execute("COMMIT", ()).await {
                    self.conn.execute("ROLLBACK", ()).await.ok();
                    return Err(e.into());
                }
                Ok(inserted)
            }
            Err(e) => {
                self.conn.execute("ROLLBACK", ()).await.ok();
                Err(e)
            }
        }
    }

    async fn missing_tables(&self, tables: &[&str]) -> Result<Vec<String>> {
        let existing = sql::table_names(&self.conn).await?;
        Ok(tables
            .iter()
            .filter(|name| !existing.contains(**name))
            .map(|name| (*name).to_string())
            .collect())
    }

    async fn applied_migration_tags(&self) -> Result<Vec<String>> {
        let existing = sql::table_names(&self.conn).await?;
        if !existing.contains(MIGRATION_LEDGER_TABLE) {
            return Ok(Vec::new());
        }

        let mut rows = self
            .conn
            .query(
                &format!("SELECT tag FROM {MIGRATION_LEDGER_TABLE} ORDER BY tag"),
                (),
            )
            .await?;
        let mut tags = Vec::new();
        while let Some(row) = rows.next().await? {
            tags.push(row.get::<String>(0)?);
        }
        Ok(tags)
    }

    async fn apply_change_set(&self, change_set: &ChangeSet) -> Result<()> {
        let mut statements: Vec<(String, Params)> = vec![(ledger_ddl(), Params::None)];
        statements.extend(
            change_set
                .statements
                .iter()
                .map(|statement| ((*statement).to_string(), Params::None)),
        );
        statements.push((
            format!("INSERT OR IGNORE INTO {MIGRATION_LEDGER_TABLE} (tag, applied_at) VALUES (?, ?)"),
            Params::Positional(vec![
                libsql::Value::Text(change_set.tag.to_string()),
                libsql::Value::Text(format_timestamp(Utc::now())),
            ]),
        ));

        sql::execute_in_transaction(&self.conn, statements)
            .await
            .map_err(|error| Error::Migration {
                tag: change_set.tag.to_string(),
                message: error.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::REMOTE_CHANGE_SETS;
    use crate::sync::{row_from, Value};

    async fn migrated() -> RemoteDatabase {
        let remote = RemoteDatabase::open_in_memory().await.unwrap();
        for set in REMOTE_CHANGE_SETS {
            remote.apply_change_set(set).await.unwrap();
        }
        remote
    }

    fn entry(id: i64, user: &str) -> Row {
        row_from([
            ("id", Value::Integer(id)),
            ("user_id", Value::from(user)),
            ("date", Value::from("2024-05-01T00:00:00.000Z")),
            ("category", Value::from("food")),
            ("description", Value::Null),
            ("amount", Value::Real(10.0)),
            ("bucket", Value::from("needs")),
            ("created_at", Value::from("2024-05-01T08:00:00.000Z")),
            ("updated_at", Value::from("2024-05-01T08:00:00.000Z")),
        ])
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn connect_memory_target_from_config() {
        let config = RemoteConfig {
            url: Some(":memory:".to_string()),
            auth_token: None,
        };
        let remote = RemoteDatabase::connect(&config).await.unwrap();
        assert_eq!(remote.target(), &RemoteTarget::Memory);
        assert_eq!(
            remote.missing_tables(&["daily_entries"]).await.unwrap(),
            vec!["daily_entries".to_string()]
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn apply_change_set_records_ledger_once() {
        let remote = migrated().await;
        remote.apply_change_set(&REMOTE_CHANGE_SETS[0]).await.unwrap();

        let tags = remote.applied_migration_tags().await.unwrap();
        assert_eq!(tags.len(), REMOTE_CHANGE_SETS.len());
        assert!(remote
            .missing_tables(&["daily_entries", "equity_assets"])
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn replace_owner_rows_keeps_other_users() {
        let remote = migrated().await;
        remote
            .insert_rows(
                "daily_entries",
                &[entry(1, "alice"), entry(2, "alice"), entry(1, "bob")],
                ConflictPolicy::Abort,
            )
            .await
            .unwrap();

        let inserted = remote
            .replace_owner_rows("daily_entries", "user_id", "alice", &[entry(9, "alice")], 100)
            .await
            .unwrap();
        assert_eq!(inserted, 1);

        let alice = remote
            .select_by_owner("daily_entries", "user_id", "alice")
            .await
            .unwrap();
        assert_eq!(alice, vec![entry(9, "alice")]);
        assert_eq!(
            remote
                .count_by_owner("daily_entries", "user_id", "bob")
                .await
                .unwrap(),
            1
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failed_replace_rolls_back_delete() {
        let remote = migrated().await;
        remote
            .insert_rows("daily_entries", &[entry(1, "alice")], ConflictPolicy::Abort)
            .await
            .unwrap();

        // duplicate primary key inside the batch aborts the insert
        let result = remote
            .replace_owner_rows(
                "daily_entries",
                "user_id",
                "alice",
                &[entry(5, "alice"), entry(5, "alice")],
                100,
            )
            .await;
        assert!(result.is_err());

        let alice = remote
            .select_by_owner("daily_entries", "user_id", "alice")
            .await
            .unwrap();
        assert_eq!(alice, vec![entry(1, "alice")]);
    }
}
