//! Sync session orchestration.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::{FlagStore, LibSqlFlagsRepository, LocalTables};
use crate::error::{Error, Result};
use crate::models::RecordCounts;
use crate::services::DatabaseService;

use super::engine::{reconcile_all, TableReport};
use super::readiness::{Readiness, ReadinessGuard, SchemaState};
use super::registry::TableKey;
use super::store::RemoteStore;

/// Source of the signed-in user's id
pub trait IdentityProvider {
    /// `None` when nobody is signed in
    fn current_user_id(&self) -> Option<String>;
}

/// Fixed identity, used by the CLI profile and by tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticIdentity(pub Option<String>);

impl StaticIdentity {
    pub fn user(user_id: impl Into<String>) -> Self {
        Self(Some(user_id.into()))
    }

    pub const fn anonymous() -> Self {
        Self(None)
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_user_id(&self) -> Option<String> {
        self.0
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
    }
}

/// Result of one sync session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub user_id: String,
    pub readiness: Readiness,
    pub tables: Vec<TableReport>,
    pub finished_at: DateTime<Utc>,
}

impl SyncReport {
    /// Whether any table was refilled from the replica
    pub fn restored(&self) -> bool {
        self.tables.iter().any(TableReport::restored)
    }

    pub fn failed_tables(&self) -> Vec<TableKey> {
        self.tables
            .iter()
            .filter(|report| !report.is_ok())
            .map(|report| report.table)
            .collect()
    }
}

/// Outcome of the most recent session in this process
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyncHealth {
    /// No session has run yet
    #[default]
    Never,
    Healthy,
    /// The session finished but some tables failed
    Degraded { failed_tables: Vec<TableKey> },
    /// The session aborted before reconciling
    Failed { message: String },
}

impl SyncHealth {
    fn from_report(report: &SyncReport) -> Self {
        let failed_tables = report.failed_tables();
        if failed_tables.is_empty() {
            Self::Healthy
        } else {
            Self::Degraded { failed_tables }
        }
    }
}

/// Marks a session as running; cleared on drop, including on early return.
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Runs sync sessions between the local database and one remote replica.
pub struct SyncService<R, I> {
    db: DatabaseService,
    remote: R,
    identity: I,
    readiness: ReadinessGuard,
    in_flight: AtomicBool,
    health: Mutex<SyncHealth>,
}

impl<R, I> SyncService<R, I>
where
    R: RemoteStore,
    I: IdentityProvider,
{
    pub fn new(db: DatabaseService, remote: R, identity: I) -> Self {
        Self {
            db,
            remote,
            identity,
            readiness: ReadinessGuard::new(),
            in_flight: AtomicBool::new(false),
            health: Mutex::new(SyncHealth::Never),
        }
    }

    pub const fn remote(&self) -> &R {
        &self.remote
    }

    pub const fn database(&self) -> &DatabaseService {
        &self.db
    }

    /// Remote schema state as last observed by this service
    pub fn schema_state(&self) -> SchemaState {
        self.readiness.state()
    }

    pub fn health(&self) -> SyncHealth {
        self.health
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    pub fn is_syncing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    fn set_health(&self, health: SyncHealth) {
        *self
            .health
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = health;
    }

    /// Sync the signed-in user, if any.
    pub async fn perform_sync(&self) -> Result<Option<SyncReport>> {
        let Some(user_id) = self.identity.current_user_id() else {
            tracing::info!("No signed-in user; skipping sync");
            return Ok(None);
        };
        self.smart_sync(&user_id).await.map(Some)
    }

    /// Run one sync session for `user_id`.
    ///
    /// Fails with `Error::SyncInProgress` when a session is already running.
    /// Readiness failures abort the session; per-table failures are recorded
    /// in the report.
    pub async fn smart_sync(&self, user_id: &str) -> Result<SyncReport> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(Error::InvalidInput("user id cannot be empty".to_string()));
        }

        let Some(_in_flight) = InFlightGuard::acquire(&self.in_flight) else {
            tracing::warn!("Sync requested while another session is running");
            return Err(Error::SyncInProgress);
        };

        let db = self.db.lock().await;
        let flags = LibSqlFlagsRepository::new(db.connection());

        let readiness = match self.readiness.ensure_ready(&self.remote, &flags).await {
            Ok(readiness) => readiness,
            Err(error) => {
                tracing::warn!("Remote schema is not ready: {error}");
                self.set_health(SyncHealth::Failed {
                    message: error.to_string(),
                });
                return Err(error);
            }
        };

        let local = LocalTables::new(db.connection());
        let tables = reconcile_all(&local, &self.remote, user_id).await;

        // stored with millisecond precision
        let now = Utc::now();
        let finished_at = DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now);
        if let Err(error) = flags.set_last_sync_at(finished_at).await {
            tracing::warn!("Could not record sync completion: {error}");
            self.set_health(SyncHealth::Failed {
                message: error.to_string(),
            });
            return Err(error);
        }

        let report = SyncReport {
            user_id: user_id.to_string(),
            readiness,
            tables,
            finished_at,
        };
        let health = SyncHealth::from_report(&report);
        match &health {
            SyncHealth::Degraded { failed_tables } => tracing::warn!(
                "Sync finished with {} failed table(s)",
                failed_tables.len()
            ),
            _ => tracing::info!(
                "Sync finished for {user_id}{}",
                if report.restored() { " (data restored)" } else { "" }
            ),
        }
        self.set_health(health);
        Ok(report)
    }

    /// When the last session finished.
    pub async fn last_sync_time(&self) -> Result<Option<DateTime<Utc>>> {
        self.db.last_sync_time().await
    }

    /// Per-table local row counts for `user_id`.
    pub async fn local_record_count(&self, user_id: &str) -> Result<RecordCounts> {
        self.db.local_record_count(user_id).await
    }
}
