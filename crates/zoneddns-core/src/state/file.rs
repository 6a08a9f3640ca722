// # File State Store
//
// File-based implementation of StateStore with crash safety.
//
// ## Purpose
//
// Persists the last-known public IP across daemon restarts so a restart
// with an unchanged IP does not trigger a reconciliation.
//
// ## Crash Safety
//
// - Atomic writes: the value is written to `<path>.tmp`, synced, then
//   renamed over the target
// - Read failures (missing, unreadable, empty) are reported as "never
//   persisted", costing one extra reconciliation instead of a crash
//
// ## File Format
//
// A single plaintext line:
//
// ```text
// 203.0.113.7
// ```

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::Error;
use crate::traits::ip_source::PublicIp;
use crate::traits::state_store::StateStore;

/// Default state file, relative to the working directory
pub const DEFAULT_STATE_FILE: &str = "ip.lock";

/// File-based state store
///
/// # Example
///
/// ```rust,no_run
/// use zoneddns_core::state::FileStateStore;
/// use zoneddns_core::traits::{PublicIp, StateStore};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileStateStore::new("/var/lib/zoneddns/ip.lock");
///
///     store.save_ip(&PublicIp::new("1.2.3.4")).await?;
///     assert_eq!(store.saved_ip().await, Some(PublicIp::new("1.2.3.4")));
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    /// Create a store backed by `path`
    ///
    /// Nothing is touched on disk until the first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the path to the state file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path used for the write-then-rename step
    ///
    /// Appends `.tmp` rather than replacing the extension, so `ip.lock`
    /// becomes `ip.lock.tmp`.
    fn temp_path(&self) -> PathBuf {
        PathBuf::from(format!("{}.tmp", self.path.display()))
    }

    async fn read_value(&self) -> Result<Option<PublicIp>, Error> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("State file does not exist: {}", self.path.display());
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let ip = PublicIp::new(content);
        if ip.is_empty() {
            return Ok(None);
        }
        Ok(Some(ip))
    }

    async fn write_value(&self, ip: &PublicIp) -> Result<(), Error> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    Error::state_store(format!(
                        "Failed to create state directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let temp_path = self.temp_path();
        if let Err(e) = self.replace_via(&temp_path, ip).await {
            // Best effort; the temp file may not exist yet
            let _ = fs::remove_file(&temp_path).await;
            return Err(e);
        }

        tracing::trace!("State written to file: {}", self.path.display());
        Ok(())
    }

    /// Write `ip` to `temp_path`, sync it, then rename it over the state file
    async fn replace_via(&self, temp_path: &Path, ip: &PublicIp) -> Result<(), Error> {
        {
            let mut file = fs::File::create(temp_path).await.map_err(|e| {
                Error::state_store(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.write_all(ip.as_str().as_bytes()).await.map_err(|e| {
                Error::state_store(format!(
                    "Failed to write to temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.sync_all().await.map_err(|e| {
                Error::state_store(format!(
                    "Failed to sync temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        fs::rename(temp_path, &self.path).await.map_err(|e| {
            Error::state_store(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })
    }
}

impl Default for FileStateStore {
    fn default() -> Self {
        Self::new(DEFAULT_STATE_FILE)
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn saved_ip(&self) -> Option<PublicIp> {
        match self.read_value().await {
            Ok(ip) => ip,
            Err(e) => {
                tracing::warn!(
                    "Failed to read state file {}: {}. Treating as never persisted.",
                    self.path.display(),
                    e
                );
                None
            }
        }
    }

    async fn save_ip(&self, ip: &PublicIp) -> Result<(), Error> {
        self.write_value(ip).await
    }
}
