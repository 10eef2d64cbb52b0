// # File Store
//
// File-backed implementation of LastKnownStore.
//
// ## File Format
//
// One file per record target holding the raw IP text, e.g.
//
// ```text
// 198.51.100.7
// ```
//
// Surrounding whitespace is ignored on read, so a hand-edited file with a
// trailing newline reads back the same value.
//
// ## Durability
//
// - Atomic writes: new value written to `<file>.tmp`, then renamed over the slot
// - Missing file reads as `""` (first run), not as an error
// - Files are created with mode 0600 on Unix

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;

use crate::cancel::run_cancellable;
use crate::error::{Error, Result};
use crate::traits::LastKnownStore;

/// File-backed store for one record target
///
/// # Example
///
/// ```rust,no_run
/// use dns_updater_core::state::FileStore;
/// use dns_updater_core::{CancellationToken, LastKnownStore};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let cancel = CancellationToken::new();
///     let store = FileStore::for_record("/var/lib/dns-updater", "home.example.com");
///
///     store.write(&cancel, "198.51.100.7").await?;
///     assert_eq!(store.read(&cancel).await?, "198.51.100.7");
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Store backed by the file at `path`
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Store for `record_name` inside the storage directory `dir`
    pub fn for_record<P: AsRef<Path>>(dir: P, record_name: &str) -> Self {
        Self::new(dir.as_ref().join(record_name))
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling temp file used for atomic replacement
    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    async fn read_value(&self) -> Result<String> {
        match fs::read_to_string(&self.path).await {
            Ok(content) => Ok(content.trim().to_string()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("No stored value yet at {}", self.path.display());
                Ok(String::new())
            }
            Err(e) => Err(Error::storage(format!(
                "Failed to read {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    async fn write_value(&self, ip: &str) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::storage(format!(
                    "Failed to create storage directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let temp_path = self.temp_path();
        {
            let mut options = fs::OpenOptions::new();
            options.write(true).create(true).truncate(true);
            #[cfg(unix)]
            options.mode(0o600);

            let mut file = options.open(&temp_path).await.map_err(|e| {
                Error::storage(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.write_all(ip.as_bytes()).await.map_err(|e| {
                Error::storage(format!(
                    "Failed to write to temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.sync_all().await.map_err(|e| {
                Error::storage(format!(
                    "Failed to sync temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::storage(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::trace!("Stored {} in {}", ip, self.path.display());
        Ok(())
    }
}

#[async_trait]
impl LastKnownStore for FileStore {
    async fn read(&self, cancel: &CancellationToken) -> Result<String> {
        run_cancellable(cancel, self.read_value()).await
    }

    async fn write(&self, cancel: &CancellationToken, ip: &str) -> Result<()> {
        run_cancellable(cancel, self.write_value(ip)).await
    }
}
