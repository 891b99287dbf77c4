//! Token storage
//!
//! One JSON file holds the current token set. It is the single source of
//! truth for authentication: every `get_access_token` call re-reads it, so a
//! refresh performed by another process is picked up on the next call.
//!
//! Writes go to a temp file in the same directory and are renamed over the
//! target, so readers see either the old or the new token set, never a torn
//! write. Two processes refreshing at the same time race; the last rename
//! wins and the loser's in-memory copy goes stale. There is no cross-process
//! lock.

use std::fmt;
use std::path::{Path, PathBuf};

use rand::RngExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::token::TokenResponse;

/// The persisted token set.
///
/// `expires_at` is a unix timestamp in milliseconds (absolute, not a delta),
/// computed from `TokenResponse.expires_in` at exchange/refresh time.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    pub access_token: String,
    pub token_type: String,
    pub expires_at: u64,
    pub scope: String,
    pub refresh_token: String,
}

impl TokenSet {
    /// Build the first token set from a code-exchange response.
    ///
    /// Fails if the provider issued no refresh token, since nothing could
    /// renew the access token after it expires.
    pub fn from_exchange(response: TokenResponse, now_millis: u64) -> Result<Self> {
        let refresh_token = response
            .refresh_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                Error::Protocol(
                    "code exchange returned no refresh_token (is offline.access granted?)".into(),
                )
            })?;
        Ok(Self {
            access_token: response.access_token,
            token_type: response.token_type,
            expires_at: expiry(now_millis, response.expires_in),
            scope: response.scope,
            refresh_token,
        })
    }

    /// Build the successor token set from a refresh response.
    ///
    /// Keeps `previous_refresh` unless the provider rotated it.
    pub fn from_refresh(response: TokenResponse, previous_refresh: &str, now_millis: u64) -> Self {
        let refresh_token = response
            .refresh_token
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| previous_refresh.to_string());
        Self {
            access_token: response.access_token,
            token_type: response.token_type,
            expires_at: expiry(now_millis, response.expires_in),
            scope: response.scope,
            refresh_token,
        }
    }

    /// Milliseconds of validity left at `now_millis` (zero once expired).
    pub fn remaining_millis(&self, now_millis: u64) -> u64 {
        self.expires_at.saturating_sub(now_millis)
    }
}

fn expiry(now_millis: u64, expires_in_secs: u64) -> u64 {
    now_millis.saturating_add(expires_in_secs.saturating_mul(1000))
}

impl fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSet")
            .field("access_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("expires_at", &self.expires_at)
            .field("scope", &self.scope)
            .field("refresh_token", &"[REDACTED]")
            .finish()
    }
}

/// Current unix time in milliseconds.
pub fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Owner of the token file.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the current token set.
    ///
    /// A missing, unreadable, or unparseable file all mean "no token": the
    /// caller falls through to the refresh path instead of failing.
    pub async fn load(&self) -> Option<TokenSet> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no token file");
                return None;
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "token file unreadable, treating as absent");
                return None;
            }
        };
        match serde_json::from_str::<TokenSet>(&contents) {
            Ok(tokens) => Some(tokens),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "token file corrupt, treating as absent");
                None
            }
        }
    }

    /// Replace the stored token set.
    ///
    /// Creates the parent directory if needed. Any failure is a `Storage`
    /// error and leaves the previous file in place.
    pub async fn save(&self, tokens: &TokenSet) -> Result<()> {
        let json = serde_json::to_string_pretty(tokens)
            .map_err(|e| Error::Storage(format!("serializing tokens: {e}")))?;

        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| Error::Storage(format!("creating {}: {e}", dir.display())))?;

        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| Error::Storage("token path has no file name".into()))?;
        let tmp_path = dir.join(format!(".{file_name}.tmp.{}", temp_suffix()));

        if let Err(e) = write_private(&tmp_path, json.as_bytes()).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e);
        }

        if let Err(e) = tokio::fs::rename(&tmp_path, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(Error::Storage(format!("renaming temp token file: {e}")));
        }

        debug!(path = %self.path.display(), "persisted tokens");
        Ok(())
    }
}

/// Write `data` to `path` and restrict it to 0600 (unix only) since the
/// file contains OAuth tokens.
async fn write_private(path: &Path, data: &[u8]) -> Result<()> {
    tokio::fs::write(path, data)
        .await
        .map_err(|e| Error::Storage(format!("writing temp token file: {e}")))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        tokio::fs::set_permissions(path, perms)
            .await
            .map_err(|e| Error::Storage(format!("setting token file permissions: {e}")))?;
    }

    Ok(())
}

/// Unique per write: pid for cross-process, random for concurrent writes
/// within one process.
fn temp_suffix() -> String {
    let mut bytes = [0u8; 6];
    rand::rng().fill(&mut bytes);
    let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    format!("{}.{hex}", std::process::id())
}
