//! Persisted sync flags stored in the local settings table

use chrono::{DateTime, Utc};
use libsql::Connection;

use crate::error::Result;
use crate::sync::{format_timestamp, parse_timestamp};

/// Set once the remote schema has been migrated from this install
pub const REMOTE_MIGRATED_KEY: &str = "remote_migrated";
/// Completion time of the last successful sync session
pub const LAST_SYNC_AT_KEY: &str = "last_sync_at";

/// Key/value flag storage (async)
#[allow(async_fn_in_trait)]
pub trait FlagStore {
    /// Read a flag, `None` when unset
    async fn get_flag(&self, key: &str) -> Result<Option<String>>;

    /// Write a flag
    async fn set_flag(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a flag
    async fn clear_flag(&self, key: &str) -> Result<()>;

    async fn remote_migrated(&self) -> Result<bool> {
        Ok(self
            .get_flag(REMOTE_MIGRATED_KEY)
            .await?
            .is_some_and(|value| {
                matches!(
                    value.trim().to_ascii_lowercase().as_str(),
                    "1" | "true" | "yes" | "on"
                )
            }))
    }

    async fn set_remote_migrated(&self, migrated: bool) -> Result<()> {
        if migrated {
            self.set_flag(REMOTE_MIGRATED_KEY, "true").await
        } else {
            self.clear_flag(REMOTE_MIGRATED_KEY).await
        }
    }

    async fn last_sync_at(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self
            .get_flag(LAST_SYNC_AT_KEY)
            .await?
            .and_then(|value| parse_timestamp(&value)))
    }

    async fn set_last_sync_at(&self, at: DateTime<Utc>) -> Result<()> {
        self.set_flag(LAST_SYNC_AT_KEY, &format_timestamp(at)).await
    }
}

/// libSQL implementation of `FlagStore`
pub struct LibSqlFlagsRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlFlagsRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl FlagStore for LibSqlFlagsRepository<'_> {
    async fn get_flag(&self, key: &str) -> Result<Option<String>> {
        let mut rows = self
            .conn
            .query("SELECT value FROM settings WHERE key = ?", [key])
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(row.get::<String>(0)?))
        } else {
            Ok(None)
        }
    }

    async fn set_flag(&self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO settings (key, value) VALUES (?, ?)",
                [key, value],
            )
            .await?;
        Ok(())
    }

    async fn clear_flag(&self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM settings WHERE key = ?", [key])
            .await?;
        Ok(())
    }
}
