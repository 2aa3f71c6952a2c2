//! Remote replica configuration.
//!
//! A `RemoteConfig` describes where the remote replica lives. Clients build it
//! from environment variables or from a stored CLI profile; the core only
//! validates it and hands it to `RemoteDatabase::connect`.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::util::{is_http_url, normalize_text_option};

/// Environment variable holding the remote database URL.
pub const REMOTE_URL_ENV: &str = "FINTRACK_REMOTE_URL";
/// Environment variable holding the remote auth token.
pub const REMOTE_TOKEN_ENV: &str = "FINTRACK_REMOTE_TOKEN";

/// Where the remote replica lives and how to authenticate against it.
#[derive(Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoteConfig {
    /// Remote database URL (e.g., `libsql://your-db.turso.io`)
    pub url: Option<String>,
    /// Authentication token for remote database
    pub auth_token: Option<String>,
}

impl std::fmt::Debug for RemoteConfig {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("RemoteConfig")
            .field("url", &self.url)
            .field(
                "auth_token",
                &self.auth_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// Resolved location of the remote replica.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteTarget {
    /// Hosted libSQL / Turso database
    Hosted { url: String, auth_token: String },
    /// Local file acting as the replica (offline development)
    File(String),
    /// Throwaway in-memory replica
    Memory,
}

impl RemoteConfig {
    /// Create a new remote configuration
    pub fn new(url: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            auth_token: Some(auth_token.into()),
        }
    }

    /// Read the configuration from `FINTRACK_REMOTE_URL` / `FINTRACK_REMOTE_TOKEN`.
    ///
    /// Returns `None` when no URL is set.
    pub fn from_env() -> Option<Self> {
        let url = normalize_text_option(std::env::var(REMOTE_URL_ENV).ok())?;
        let auth_token = normalize_text_option(std::env::var(REMOTE_TOKEN_ENV).ok());
        Some(Self {
            url: Some(url),
            auth_token,
        })
    }

    /// Check if a remote URL is present
    pub fn is_configured(&self) -> bool {
        normalize_text_option(self.url.clone()).is_some()
    }

    /// Validate the configuration and resolve the concrete target.
    ///
    /// Hosted URLs (`libsql://`, `http://`, `https://`) require an auth token.
    /// `file:` URLs and `:memory:` open an unauthenticated local replica.
    pub fn target(&self) -> Result<RemoteTarget> {
        let url = normalize_text_option(self.url.clone())
            .ok_or_else(|| Error::Config("remote URL is required".into()))?;

        if url == ":memory:" {
            return Ok(RemoteTarget::Memory);
        }
        if let Some(path) = url.strip_prefix("file:") {
            let path = path.trim_start_matches("//");
            if path.is_empty() {
                return Err(Error::Config("file: remote URL needs a path".into()));
            }
            return Ok(RemoteTarget::File(path.to_string()));
        }
        if !(url.starts_with("libsql://") || is_http_url(&url)) {
            return Err(Error::Config(format!(
                "remote URL must start with libsql://, https://, http:// or file: (got '{url}')"
            )));
        }

        let auth_token = normalize_text_option(self.auth_token.clone()).ok_or_else(|| {
            Error::Config("auth token is required for a hosted remote database".into())
        })?;

        Ok(RemoteTarget::Hosted {
            url: url.trim_end_matches('/').to_string(),
            auth_token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hosted_target_requires_token() {
        let config = RemoteConfig {
            url: Some("libsql://ledger.turso.io".to_string()),
            auth_token: None,
        };
        let error = config.target().unwrap_err();
        assert!(error.to_string().contains("auth token"));
    }

    #[test]
    fn hosted_target_trims_trailing_slash() {
        let config = RemoteConfig::new("https://ledger.turso.io/", " token ");
        assert_eq!(
            config.target().unwrap(),
            RemoteTarget::Hosted {
                url: "https://ledger.turso.io".to_string(),
                auth_token: "token".to_string(),
            }
        );
    }

    #[test]
    fn file_and_memory_targets_skip_token() {
        let file = RemoteConfig {
            url: Some("file:/tmp/replica.db".to_string()),
            auth_token: None,
        };
        assert_eq!(
            file.target().unwrap(),
            RemoteTarget::File("/tmp/replica.db".to_string())
        );

        let memory = RemoteConfig {
            url: Some(":memory:".to_string()),
            auth_token: None,
        };
        assert_eq!(memory.target().unwrap(), RemoteTarget::Memory);
    }

    #[test]
    fn rejects_unknown_scheme() {
        let config = RemoteConfig::new("ftp://ledger", "token");
        assert!(config.target().is_err());
        assert!(!RemoteConfig::default().is_configured());
    }

    #[test]
    fn debug_redacts_token() {
        let config = RemoteConfig::new("libsql://ledger.turso.io", "secret");
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
