//! core::paths
//!
//! Centralized path routing for syncdoctor storage locations.
//!
//! # Architecture
//!
//! Storage lives under `<common_dir>/syncdoctor/` so linked worktrees share
//! one config file and one set of retry markers. No code may assume `.git/`
//! is a directory; every path goes through [`DoctorPaths`].
//!
//! # Storage Layout
//!
//! - `config.toml` - Repository configuration
//! - `retry.toml` - Per-remote retry markers
//! - `retry.lock` - Advisory lock guarding `retry.toml`
//!
//! # Example
//!
//! ```
//! use syncdoctor::core::paths::DoctorPaths;
//! use std::path::PathBuf;
//!
//! let paths = DoctorPaths::new(
//!     PathBuf::from("/repo/.git"),
//!     PathBuf::from("/repo/.git"),
//! );
//!
//! assert_eq!(
//!     paths.repo_config_path(),
//!     PathBuf::from("/repo/.git/syncdoctor/config.toml")
//! );
//! ```

use std::path::{Path, PathBuf};

/// Centralized path routing for syncdoctor storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoctorPaths {
    /// Path to the per-worktree git directory.
    pub git_dir: PathBuf,

    /// Path to the shared git directory (refs, objects, config).
    pub common_dir: PathBuf,
}

impl DoctorPaths {
    /// Create paths from `git rev-parse --git-dir` / `--git-common-dir` output.
    pub fn new(git_dir: PathBuf, common_dir: PathBuf) -> Self {
        Self {
            git_dir,
            common_dir,
        }
    }

    /// Best-effort paths for a plain checkout at `work_dir`, without asking git.
    ///
    /// Returns `None` when `<work_dir>/.git` is not a directory (worktree
    /// files and bare repos need [`DoctorPaths::new`]).
    pub fn for_plain_checkout(work_dir: &Path) -> Option<Self> {
        let git_dir = work_dir.join(".git");
        git_dir
            .is_dir()
            .then(|| Self::new(git_dir.clone(), git_dir))
    }

    /// `<common_dir>/syncdoctor`
    pub fn state_dir(&self) -> PathBuf {
        self.common_dir.join("syncdoctor")
    }

    /// `<common_dir>/syncdoctor/config.toml`
    pub fn repo_config_path(&self) -> PathBuf {
        self.state_dir().join("config.toml")
    }

    /// `<common_dir>/syncdoctor/retry.toml`
    pub fn retry_path(&self) -> PathBuf {
        self.state_dir().join("retry.toml")
    }

    /// `<common_dir>/syncdoctor/retry.lock`
    pub fn retry_lock_path(&self) -> PathBuf {
        self.state_dir().join("retry.lock")
    }

    /// `<common_dir>/lfs`, present once git-lfs has stored anything.
    pub fn lfs_dir(&self) -> PathBuf {
        self.common_dir.join("lfs")
    }

    /// Check if this is a linked worktree.
    pub fn is_worktree(&self) -> bool {
        self.git_dir != self.common_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worktree_storage_uses_common_dir() {
        let paths = DoctorPaths::new(
            PathBuf::from("/repo/.git/worktrees/feature"),
            PathBuf::from("/repo/.git"),
        );
        assert!(paths.is_worktree());
        assert_eq!(
            paths.retry_path(),
            PathBuf::from("/repo/.git/syncdoctor/retry.toml")
        );
        assert_eq!(paths.lfs_dir(), PathBuf::from("/repo/.git/lfs"));
    }

    #[test]
    fn plain_checkout_requires_git_directory() {
        let temp = tempfile::TempDir::new().unwrap();
        assert!(DoctorPaths::for_plain_checkout(temp.path()).is_none());

        std::fs::create_dir(temp.path().join(".git")).unwrap();
        let paths = DoctorPaths::for_plain_checkout(temp.path()).unwrap();
        assert!(!paths.is_worktree());
    }
}
