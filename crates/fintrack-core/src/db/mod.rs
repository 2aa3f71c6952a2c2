//! Database layer for fintrack
//!
//! The local on-device database and the remote replica both speak libSQL.

mod connection;
mod flags_repository;
mod migrations;
mod remote;
mod remote_schema;
mod repository;
pub(crate) mod sql;
mod tables;

pub use connection::Database;
pub use flags_repository::{FlagStore, LibSqlFlagsRepository, LAST_SYNC_AT_KEY, REMOTE_MIGRATED_KEY};
pub use remote::RemoteDatabase;
pub use remote_schema::{ChangeSet, MIGRATION_LEDGER_TABLE, REMOTE_CHANGE_SETS};
pub use repository::{LedgerRepository, LibSqlLedgerRepository};
pub use tables::LocalTables;
