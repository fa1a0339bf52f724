//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Opens a [`Session`] for the target directory
//! 2. Runs detection, suggestion or repair through the library
//! 3. Formats and displays output
//!
//! Handlers do NOT run git directly.
//!
//! # Async
//!
//! The library is async. [`dispatch`] builds one tokio runtime and blocks
//! on the selected handler.

mod completion;
mod fix;
mod fixes;
mod status;

pub use completion::completion;

use std::sync::Arc;

use anyhow::{Context as _, Result};
use tracing::debug;

use crate::cli::args::Command;
use crate::cli::Context;
use crate::core::config::Config;
use crate::core::paths::DoctorPaths;
use crate::core::retry::{FileRetryStore, MemoryRetryStore, RetryStore};
use crate::core::types::RemoteRole;
use crate::doctor::Doctor;
use crate::engine::Classifier;
use crate::git::exec::{Executor, ExecutorConfig};
use crate::git::{Deadlines, Git, GitError};
use crate::platform::{create_platform, Platform};

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    if let Command::Completion { shell } = command {
        return completion::completion(shell);
    }

    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    runtime.block_on(async {
        match command {
            Command::Status { json, no_fetch } => status::status(ctx, json, no_fetch).await,
            Command::Fixes { json } => fixes::fixes(ctx, json).await,
            Command::Fix {
                auto,
                scenarios,
                dry_run,
            } => fix::fix(ctx, auto, &scenarios, dry_run).await,
            Command::Completion { .. } => Ok(()),
        }
    })
}

/// Everything a handler needs, wired once per invocation.
pub(crate) struct Session {
    pub git: Git,
    pub config: Config,
    pub retry: Arc<dyn RetryStore>,
    pub platform: Option<Arc<dyn Platform>>,
}

impl Session {
    /// Open the repository at (or containing) the context's directory.
    ///
    /// A directory that is missing or is not a repository still yields a
    /// session, so that detection can report the missing local copy.
    pub async fn open(ctx: &Context) -> Result<Self> {
        let dir = ctx.work_dir()?;
        let exec = Executor::new(ExecutorConfig::default());
        let bootstrap = Deadlines::default();

        let (git, paths) = if !dir.is_dir() {
            debug!(dir = %dir.display(), "directory does not exist; skipping git");
            (Git::at(exec.clone(), &dir, bootstrap), None)
        } else {
            match Git::open(exec.clone(), &dir, bootstrap).await {
                Ok(git) => {
                    let paths = match git.paths().await {
                        Ok(paths) => Some(paths),
                        Err(e) => {
                            debug!(error = %e, "git did not report its directories");
                            DoctorPaths::for_plain_checkout(git.work_dir())
                        }
                    };
                    (git, paths)
                }
                Err(GitError::NotARepo { .. }) => (Git::at(exec.clone(), &dir, bootstrap), None),
                Err(e) => return Err(e).context("failed to run git"),
            }
        };

        let config = Config::load(paths.as_ref())
            .context("failed to load configuration")?
            .config;
        let git = Git::at(exec, git.work_dir(), Deadlines::from_config(&config));

        let retry = retry_store(paths.as_ref());

        let configured_hub = match &paths {
            Some(_) => git.remote_url(config.hub_remote()).await.ok().flatten(),
            None => None,
        };
        let hub_url = configured_hub.or_else(|| {
            config
                .remote_url_override(RemoteRole::Hub)
                .map(str::to_string)
        });
        let platform = create_platform(&config, hub_url.as_deref());
        debug!(
            work_dir = %git.work_dir().display(),
            worktree = paths.as_ref().map(DoctorPaths::is_worktree),
            platform = platform.as_ref().map(|p| p.name()),
            "session opened"
        );

        Ok(Self {
            git,
            config,
            retry,
            platform,
        })
    }

    /// A classifier over this session. `fetch` is ANDed with the config key.
    pub fn classifier(&self, fetch: bool) -> Classifier {
        let classifier = Classifier::new(self.git.clone(), self.config.clone())
            .with_fetch(fetch && self.config.fetch_enabled())
            .with_retry_store(Arc::clone(&self.retry));
        match &self.platform {
            Some(platform) => classifier.with_platform(Arc::clone(platform)),
            None => classifier,
        }
    }

    /// The repair orchestrator over this session.
    pub fn doctor(&self) -> Doctor {
        Doctor::new(self.git.clone(), Arc::clone(&self.retry))
    }
}

fn retry_store(paths: Option<&DoctorPaths>) -> Arc<dyn RetryStore> {
    match paths {
        Some(paths) => Arc::new(FileRetryStore::new(paths)),
        None => Arc::new(MemoryRetryStore::new()),
    }
}
