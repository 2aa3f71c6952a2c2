//! Makes sure the remote replica has the ledger tables before any sync runs.

use std::collections::BTreeSet;
use std::sync::Mutex;

use serde::Serialize;

use crate::db::{FlagStore, REMOTE_CHANGE_SETS};
use crate::error::Result;

use super::registry::remote_table_names;
use super::store::RemoteStore;

/// What this process knows about the remote schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaState {
    /// Not checked yet
    #[default]
    Unknown,
    /// Every synced table is present
    Verified,
    /// The persisted flag claimed migration but tables were missing
    Stale,
}

/// How `ensure_ready` got the remote into shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Readiness {
    /// Flag set and the catalog confirmed it; nothing ran
    FastPath,
    /// Migration ran; `applied` lists the change-set tags executed
    Migrated { applied: Vec<String> },
}

impl Readiness {
    pub fn applied(&self) -> &[String] {
        match self {
            Self::FastPath => &[],
            Self::Migrated { applied } => applied,
        }
    }
}

/// Guards every sync session with a schema check.
#[derive(Debug, Default)]
pub struct ReadinessGuard {
    state: Mutex<SchemaState>,
}

impl ReadinessGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SchemaState {
        *self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn set_state(&self, state: SchemaState) {
        *self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = state;
    }

    /// Verify or migrate the remote schema.
    ///
    /// Any migration error propagates and the persisted flag stays cleared.
    pub async fn ensure_ready<R, F>(&self, remote: &R, flags: &F) -> Result<Readiness>
    where
        R: RemoteStore,
        F: FlagStore,
    {
        let tables = remote_table_names();
        let mut reapply_all = false;

        if flags.remote_migrated().await? {
            let missing = remote.missing_tables(&tables).await?;
            if missing.is_empty() {
                self.set_state(SchemaState::Verified);
                return Ok(Readiness::FastPath);
            }

            tracing::warn!(
                "Remote was marked migrated but is missing {}; re-running migrations",
                missing.join(", ")
            );
            flags.set_remote_migrated(false).await?;
            self.set_state(SchemaState::Stale);
            reapply_all = true;
        } else if !remote.missing_tables(&tables).await?.is_empty() {
            // ledger rows may have survived the tables they describe
            reapply_all = true;
        }

        let already_applied: BTreeSet<String> = if reapply_all {
            BTreeSet::new()
        } else {
            remote.applied_migration_tags().await?.into_iter().collect()
        };

        let mut applied = Vec::new();
        for change_set in REMOTE_CHANGE_SETS {
            if already_applied.contains(change_set.tag) {
                continue;
            }
            tracing::info!("Applying remote change set {}", change_set.tag);
            remote.apply_change_set(change_set).await?;
            applied.push(change_set.tag.to_string());
        }

        flags.set_remote_migrated(true).await?;
        self.set_state(SchemaState::Verified);
        if applied.is_empty() {
            tracing::info!("Remote schema already up to date");
        } else {
            tracing::info!("Remote schema migrated ({} change sets)", applied.len());
        }
        Ok(Readiness::Migrated { applied })
    }
}
