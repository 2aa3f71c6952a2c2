use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] fintrack_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error(
        "No user configured. Pass --user, set FINTRACK_USER_ID, or run `fintrack config init --user-id <id>`."
    )]
    UserNotConfigured,
    #[error(
        "Sync is not configured. Run `fintrack config init --remote-url <url> --remote-auth-token <token>`, or set FINTRACK_REMOTE_URL and FINTRACK_REMOTE_TOKEN."
    )]
    SyncNotConfigured,
}
