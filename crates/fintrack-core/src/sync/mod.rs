//! Account sync between the on-device database and the remote replica.
//!
//! A session runs in three steps: make sure the replica schema exists
//! ([`ReadinessGuard`]), reconcile every registered table
//! ([`reconcile_all`]), then record the completion time. [`SyncService`]
//! drives a session; everything below it is store-agnostic and talks to the
//! databases through [`RowStore`] and [`RemoteStore`].

mod codec;
mod engine;
mod readiness;
mod registry;
mod row;
mod service;
mod store;

pub use codec::{
    format_timestamp, is_timestamp_field, parse_timestamp, to_local_row, to_remote_row,
    TIMESTAMP_FIELDS,
};
pub use engine::{
    decide, reconcile_all, reconcile_table, SyncAction, TableOutcome, TableReport,
    PUSH_BATCH_SIZE,
};
pub use readiness::{Readiness, ReadinessGuard, SchemaState};
pub use registry::{remote_table_names, TableKey, TableSpec, REGISTRY};
pub use row::{row_from, Row, Value};
pub use service::{IdentityProvider, StaticIdentity, SyncHealth, SyncReport, SyncService};
pub use store::{ConflictPolicy, RemoteStore, RowStore};
