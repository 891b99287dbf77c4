//! Post audit trail
//!
//! Every post attempt, successful or not, appends one entry to a JSON array
//! file. The whole file is rewritten through a temp file and rename, so a
//! crash mid-write leaves the previous log intact.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Outcome recorded for a post attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditStatus {
    Posted,
    Failed,
}

/// One immutable audit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Unix milliseconds
    pub timestamp: u64,
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tweet_id: Option<String>,
    #[serde(default)]
    pub in_reply_to: Option<String>,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub media: Vec<String>,
    pub status: AuditStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub auth_method: String,
}

/// Append-only JSON array file.
#[derive(Debug, Clone)]
pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Existing entries, kept as raw JSON so records written by other
    /// versions survive a rewrite. Missing or unparseable means empty.
    async fn read_all(&self) -> Vec<serde_json::Value> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "audit log unreadable, starting a new one");
                return Vec::new();
            }
        };
        match serde_json::from_str::<Vec<serde_json::Value>>(&contents) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "audit log corrupt, starting a new one");
                Vec::new()
            }
        }
    }

    /// Append one entry and atomically replace the file.
    pub async fn append(&self, entry: &AuditEntry) -> common::Result<()> {
        let mut entries = self.read_all().await;
        let value = serde_json::to_value(entry)
            .map_err(|e| common::Error::Config(format!("serializing audit entry: {e}")))?;
        entries.push(value);
        let json = serde_json::to_string_pretty(&entries)
            .map_err(|e| common::Error::Config(format!("serializing audit log: {e}")))?;

        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        tokio::fs::create_dir_all(&dir).await?;
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| common::Error::Config("audit log path has no file name".into()))?;
        let tmp_path = dir.join(format!(
            ".{file_name}.tmp.{}.{}",
            std::process::id(),
            uuid::Uuid::new_v4().simple()
        ));

        if let Err(e) = tokio::fs::write(&tmp_path, json.as_bytes()).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }
        if let Err(e) = tokio::fs::rename(&tmp_path, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }

        debug!(path = %self.path.display(), entries = entries.len(), "audit entry written");
        Ok(())
    }
}
