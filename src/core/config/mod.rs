//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! syncdoctor has two configuration scopes sharing one schema:
//! - **Global**: User-level settings
//! - **Repo**: Repository-level overrides
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global config file
//! 3. Repo config file
//! 4. CLI flags (not handled here)
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. `$SYNCDOCTOR_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/syncdoctor/config.toml`
//! 3. `~/.syncdoctor/config.toml`
//!
//! # Repo Config Location
//!
//! `<common_dir>/syncdoctor/config.toml` (see [`DoctorPaths`]).
//!
//! # Example
//!
//! ```no_run
//! use syncdoctor::core::config::Config;
//!
//! let result = Config::load(None).unwrap();
//! let config = result.config;
//!
//! println!("core remote: {}", config.core_remote());
//! println!("hub remote: {}", config.hub_remote());
//! println!("fetch first: {}", config.fetch_enabled());
//! ```

pub mod schema;

pub use schema::{ConfigFile, DeadlinesConfig, PlatformConfig, RemotesConfig};

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::core::paths::DoctorPaths;
use crate::core::types::RemoteRole;

/// Default remote name for the core role.
pub const DEFAULT_CORE_REMOTE: &str = "origin";
/// Default remote name for the hub role.
pub const DEFAULT_HUB_REMOTE: &str = "hub";
/// Default large-object threshold (10 MiB).
pub const DEFAULT_LARGE_OBJECT_THRESHOLD: u64 = 10 * 1024 * 1024;

const DEFAULT_PROBE_SECS: u64 = 5;
const DEFAULT_FETCH_SECS: u64 = 60;
const DEFAULT_LOCAL_SECS: u64 = 30;

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The loaded configuration.
    pub config: Config,
    /// Files that were read, in precedence order.
    pub sources: Vec<PathBuf>,
}

/// Merged configuration from all sources.
///
/// Accessor methods apply precedence automatically: a repo value overrides a
/// global value, which overrides the built-in default.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global configuration
    pub global: ConfigFile,
    /// Repository configuration (if in a repo with a config file)
    pub repo: Option<ConfigFile>,
}

impl Config {
    /// Build a config from an in-memory repo file, with empty global scope.
    pub fn with_repo(repo: ConfigFile) -> Self {
        Self {
            global: ConfigFile::default(),
            repo: Some(repo),
        }
    }

    /// Load configuration from default locations.
    ///
    /// If `paths` is provided, also loads the repo-scoped file.
    ///
    /// # Errors
    ///
    /// Returns an error if config files exist but cannot be parsed or fail
    /// validation. Missing config files are not an error (defaults are used).
    pub fn load(paths: Option<&DoctorPaths>) -> Result<ConfigLoadResult, ConfigError> {
        let global_path = Self::find_global();
        let repo_path = paths.map(DoctorPaths::repo_config_path);
        Self::load_from(global_path.as_deref(), repo_path.as_deref())
    }

    /// Load configuration from explicit file paths.
    ///
    /// A path that does not exist is skipped.
    pub fn load_from(
        global_path: Option<&Path>,
        repo_path: Option<&Path>,
    ) -> Result<ConfigLoadResult, ConfigError> {
        let mut sources = Vec::new();

        let global = match global_path.filter(|p| p.exists()) {
            Some(path) => {
                sources.push(path.to_path_buf());
                Self::read_file(path)?
            }
            None => ConfigFile::default(),
        };

        let repo = match repo_path.filter(|p| p.exists()) {
            Some(path) => {
                sources.push(path.to_path_buf());
                Some(Self::read_file(path)?)
            }
            None => None,
        };

        global.validate()?;
        if let Some(ref r) = repo {
            r.validate()?;
        }

        Ok(ConfigLoadResult {
            config: Config { global, repo },
            sources,
        })
    }

    /// Locate the global config file, if any.
    fn find_global() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("SYNCDOCTOR_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("syncdoctor/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        dirs::home_dir()
            .map(|home| home.join(".syncdoctor/config.toml"))
            .filter(|p| p.exists())
    }

    fn read_file(path: &Path) -> Result<ConfigFile, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Repo value if set, otherwise global value.
    fn pick<'a, T: ?Sized>(&'a self, get: impl Fn(&'a ConfigFile) -> Option<&'a T>) -> Option<&'a T> {
        self.repo.as_ref().and_then(&get).or_else(|| get(&self.global))
    }

    fn pick_copy<T: Copy>(&self, get: impl Fn(&ConfigFile) -> Option<T>) -> Option<T> {
        self.repo.as_ref().and_then(&get).or_else(|| get(&self.global))
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    /// Remote name playing the core role. Defaults to "origin".
    pub fn core_remote(&self) -> &str {
        self.pick(|c| c.remotes.as_ref().and_then(|r| r.core.as_deref()))
            .unwrap_or(DEFAULT_CORE_REMOTE)
    }

    /// Remote name playing the hub role. Defaults to "hub".
    pub fn hub_remote(&self) -> &str {
        self.pick(|c| c.remotes.as_ref().and_then(|r| r.hub.as_deref()))
            .unwrap_or(DEFAULT_HUB_REMOTE)
    }

    /// Remote name for a role.
    pub fn remote_name(&self, role: RemoteRole) -> &str {
        match role {
            RemoteRole::Core => self.core_remote(),
            RemoteRole::Hub => self.hub_remote(),
        }
    }

    /// Fallback URL for a role, used when git has no remote by that name.
    pub fn remote_url_override(&self, role: RemoteRole) -> Option<&str> {
        self.pick(|c| {
            c.remotes.as_ref().and_then(|r| match role {
                RemoteRole::Core => r.core_url.as_deref(),
                RemoteRole::Hub => r.hub_url.as_deref(),
            })
        })
    }

    /// Explicit default branch override, if configured.
    pub fn default_branch(&self) -> Option<&str> {
        self.pick(|c| c.default_branch.as_deref())
    }

    /// Whether detection fetches reachable remotes first. Defaults to `true`.
    pub fn fetch_enabled(&self) -> bool {
        self.pick_copy(|c| c.fetch).unwrap_or(true)
    }

    /// Large-object threshold in bytes. Defaults to 10 MiB.
    pub fn large_object_threshold(&self) -> u64 {
        self.pick_copy(|c| c.large_object_threshold)
            .unwrap_or(DEFAULT_LARGE_OBJECT_THRESHOLD)
    }

    /// Deadline for reachability probes. Defaults to 5 seconds.
    pub fn probe_deadline(&self) -> Duration {
        let secs = self.pick_copy(|c| c.deadlines.as_ref().and_then(|d| d.probe_secs));
        Duration::from_secs(secs.unwrap_or(DEFAULT_PROBE_SECS))
    }

    /// Deadline for fetch and push. Defaults to 60 seconds.
    pub fn fetch_deadline(&self) -> Duration {
        let secs = self.pick_copy(|c| c.deadlines.as_ref().and_then(|d| d.fetch_secs));
        Duration::from_secs(secs.unwrap_or(DEFAULT_FETCH_SECS))
    }

    /// Deadline for local commands. Defaults to 30 seconds.
    pub fn local_deadline(&self) -> Duration {
        let secs = self.pick_copy(|c| c.deadlines.as_ref().and_then(|d| d.local_secs));
        Duration::from_secs(secs.unwrap_or(DEFAULT_LOCAL_SECS))
    }

    /// Hub platform provider. Defaults to "github".
    pub fn platform_provider(&self) -> &str {
        self.pick(|c| c.platform.as_ref().and_then(|p| p.provider.as_deref()))
            .unwrap_or("github")
    }

    /// Platform API base URL override.
    pub fn platform_api_base(&self) -> Option<&str> {
        self.pick(|c| c.platform.as_ref().and_then(|p| p.api_base.as_deref()))
    }

    /// Environment variable holding the platform token. Defaults to "GITHUB_TOKEN".
    pub fn platform_token_env(&self) -> &str {
        self.pick(|c| c.platform.as_ref().and_then(|p| p.token_env.as_deref()))
            .unwrap_or("GITHUB_TOKEN")
    }

    /// Owner/repo override for the hub platform.
    pub fn platform_repo_override(&self) -> (Option<&str>, Option<&str>) {
        (
            self.pick(|c| c.platform.as_ref().and_then(|p| p.owner.as_deref())),
            self.pick(|c| c.platform.as_ref().and_then(|p| p.repo.as_deref())),
        )
    }
}
