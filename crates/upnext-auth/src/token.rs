//! Token persistence.
//!
//! The cache is a single JSON file owned by this process for the duration
//! of a run. Its path comes from `$CONF` when set and non-empty, otherwise
//! `~/.credentials/` with the directory and file kept owner-only.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::AuthError;

/// Environment variable overriding the token cache path.
pub const CACHE_PATH_ENV: &str = "CONF";

/// Cache file name under `~/.credentials`, URL-escaped on disk.
const CACHE_FILE_NAME: &str = "upnext-google.json";

/// Token set for OAuth2 authentication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSet {
    /// Access token for API requests
    pub access_token: String,

    /// Optional refresh token for token renewal
    pub refresh_token: Option<String>,

    /// Token expiration timestamp (Unix timestamp)
    pub expires_at: i64,

    /// Scopes granted to this token
    pub scopes: Vec<String>,
}

impl TokenSet {
    /// Check if the token needs refresh (within 5 minutes of expiry)
    pub fn needs_refresh(&self) -> bool {
        let now = chrono::Utc::now().timestamp();
        now >= self.expires_at - 300 // 5 minute buffer
    }

    /// Check if the token is expired
    pub fn is_expired(&self) -> bool {
        let now = chrono::Utc::now().timestamp();
        now >= self.expires_at
    }
}

/// File-backed token cache.
#[derive(Debug, Clone)]
pub struct TokenCache {
    path: PathBuf,
}

impl TokenCache {
    /// Resolve the cache location: `$CONF` verbatim when set and non-empty,
    /// else `~/.credentials/<escaped name>`, creating the directory if
    /// absent.
    pub fn resolve() -> Result<Self, AuthError> {
        if let Some(path) = std::env::var(CACHE_PATH_ENV).ok().filter(|v| !v.is_empty()) {
            return Ok(Self { path: PathBuf::from(path) });
        }

        let dir = dirs::home_dir()
            .ok_or(AuthError::NoHomeDirectory)?
            .join(".credentials");
        create_private_dir(&dir)?;

        Ok(Self {
            path: dir.join(urlencoding::encode(CACHE_FILE_NAME).into_owned()),
        })
    }

    /// A cache at an explicit path, bypassing resolution.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and decode the stored token. Every failure propagates; the
    /// caller treats missing and corrupt files the same way.
    pub fn load(&self) -> Result<TokenSet, AuthError> {
        let json = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Create or truncate the cache file and write the token as JSON.
    pub fn save(&self, token: &TokenSet) -> Result<(), AuthError> {
        let file = open_private(&self.path)?;
        serde_json::to_writer_pretty(file, token)?;
        tracing::info!("Saved token cache to {}", self.path.display());
        Ok(())
    }
}

/// Create `dir` (and parents) readable by the owner only.
fn create_private_dir(dir: &Path) -> std::io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder.create(dir)
}

/// Open `path` for writing, created/truncated, owner read/write only.
fn open_private(path: &Path) -> std::io::Result<fs::File> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options.open(path)
}
