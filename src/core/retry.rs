//! core::retry
//!
//! Per-remote "needs retry" markers.
//!
//! # Architecture
//!
//! When a push to one remote fails during auto-fix, the orchestrator sets
//! that remote's marker. The next detection reads the markers into the
//! snapshot, and the fix suggester proposes a push to that remote only.
//! A successful push clears the marker.
//!
//! # Storage
//!
//! [`FileRetryStore`] keeps markers in `<common_dir>/syncdoctor/retry.toml`.
//! Every read-modify-write runs under an exclusive `fs2` lock on
//! `retry.lock`, so two processes never lose each other's updates. Writes
//! go through a temp file and rename.
//!
//! [`MemoryRetryStore`] backs tests and `--dry-run`.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use fs2::FileExt;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::paths::DoctorPaths;
use crate::core::types::RemoteRole;

/// Errors from retry marker storage.
#[derive(Debug, Error)]
pub enum RetryStoreError {
    #[error("retry store i/o error at '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to lock retry store: {0}")]
    Lock(String),

    #[error("corrupt retry store '{path}': {message}")]
    Corrupt { path: PathBuf, message: String },
}

/// Snapshot of both markers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryMarkers {
    /// A push to core failed and has not succeeded since.
    pub core: bool,
    /// A push to hub failed and has not succeeded since.
    pub hub: bool,
}

impl RetryMarkers {
    /// Marker for one role.
    pub fn get(&self, role: RemoteRole) -> bool {
        match role {
            RemoteRole::Core => self.core,
            RemoteRole::Hub => self.hub,
        }
    }

    /// Set the marker for one role.
    pub fn set(&mut self, role: RemoteRole, pending: bool) {
        match role {
            RemoteRole::Core => self.core = pending,
            RemoteRole::Hub => self.hub = pending,
        }
    }

    /// Roles with a pending marker, core first.
    pub fn pending(&self) -> Vec<RemoteRole> {
        RemoteRole::ALL
            .into_iter()
            .filter(|role| self.get(*role))
            .collect()
    }
}

/// Key-value store of retry markers.
pub trait RetryStore: Send + Sync {
    /// Read the marker for one remote.
    fn get(&self, role: RemoteRole) -> Result<bool, RetryStoreError> {
        Ok(self.load()?.get(role))
    }

    /// Set or clear the marker for one remote.
    fn set(&self, role: RemoteRole, pending: bool) -> Result<(), RetryStoreError>;

    /// Read both markers.
    fn load(&self) -> Result<RetryMarkers, RetryStoreError>;
}

/// In-memory marker store.
#[derive(Debug, Default)]
pub struct MemoryRetryStore {
    markers: Mutex<RetryMarkers>,
}

impl MemoryRetryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store preloaded with markers.
    pub fn with_markers(markers: RetryMarkers) -> Self {
        Self {
            markers: Mutex::new(markers),
        }
    }
}

impl RetryStore for MemoryRetryStore {
    fn set(&self, role: RemoteRole, pending: bool) -> Result<(), RetryStoreError> {
        let mut markers = self
            .markers
            .lock()
            .map_err(|e| RetryStoreError::Lock(e.to_string()))?;
        markers.set(role, pending);
        Ok(())
    }

    fn load(&self) -> Result<RetryMarkers, RetryStoreError> {
        self.markers
            .lock()
            .map(|m| *m)
            .map_err(|e| RetryStoreError::Lock(e.to_string()))
    }
}

/// File-backed marker store.
#[derive(Debug, Clone)]
pub struct FileRetryStore {
    path: PathBuf,
    lock_path: PathBuf,
}

/// Exclusive advisory lock, released on drop.
struct StoreLock {
    file: File,
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

impl FileRetryStore {
    /// Create a store under the repository's syncdoctor directory.
    pub fn new(paths: &DoctorPaths) -> Self {
        Self {
            path: paths.retry_path(),
            lock_path: paths.retry_lock_path(),
        }
    }

    /// Path of the marker file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> RetryStoreError + '_ {
        move |source| RetryStoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn lock(&self) -> Result<StoreLock, RetryStoreError> {
        if let Some(parent) = self.lock_path.parent() {
            fs::create_dir_all(parent).map_err(Self::io_err(parent))?;
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.lock_path)
            .map_err(Self::io_err(&self.lock_path))?;
        file.lock_exclusive()
            .map_err(|e| RetryStoreError::Lock(e.to_string()))?;
        Ok(StoreLock { file })
    }

    fn read_unlocked(&self) -> Result<RetryMarkers, RetryStoreError> {
        if !self.path.exists() {
            return Ok(RetryMarkers::default());
        }
        let contents = fs::read_to_string(&self.path).map_err(Self::io_err(&self.path))?;
        toml::from_str(&contents).map_err(|e| RetryStoreError::Corrupt {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }

    fn write_unlocked(&self, markers: &RetryMarkers) -> Result<(), RetryStoreError> {
        let contents = toml::to_string_pretty(markers).map_err(|e| RetryStoreError::Corrupt {
            path: self.path.clone(),
            message: e.to_string(),
        })?;

        let temp_path = self.path.with_extension("toml.tmp");
        let mut file = File::create(&temp_path).map_err(Self::io_err(&temp_path))?;
        file.write_all(contents.as_bytes())
            .map_err(Self::io_err(&temp_path))?;
        file.sync_all().map_err(Self::io_err(&temp_path))?;
        fs::rename(&temp_path, &self.path).map_err(Self::io_err(&self.path))?;
        Ok(())
    }
}

impl RetryStore for FileRetryStore {
    fn set(&self, role: RemoteRole, pending: bool) -> Result<(), RetryStoreError> {
        let _guard = self.lock()?;
        let mut markers = self.read_unlocked()?;
        if markers.get(role) == pending {
            return Ok(());
        }
        markers.set(role, pending);
        self.write_unlocked(&markers)
    }

    fn load(&self) -> Result<RetryMarkers, RetryStoreError> {
        if !self.path.exists() {
            return Ok(RetryMarkers::default());
        }
        let _guard = self.lock()?;
        self.read_unlocked()
    }
}
