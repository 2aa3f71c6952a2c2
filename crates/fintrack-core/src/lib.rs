//! fintrack-core - Core library for fintrack
//!
//! This crate contains the ledger models, the on-device database, and the
//! sync engine that keeps it in step with a remote libSQL replica. The CLI
//! and any other client build on it.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod summary;
pub mod sync;
pub mod util;

pub use error::{Error, Result};
pub use services::DatabaseService;
pub use sync::{SyncReport, SyncService};
