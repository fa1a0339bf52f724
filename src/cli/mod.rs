//! cli
//!
//! Command-line interface layer for syncdoctor.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Wire the git interface, configuration, platform client and retry store
//! - Delegate to command handlers and render their results
//!
//! # Architecture
//!
//! The CLI layer is thin. Detection goes through [`crate::engine::Classifier`]
//! and every repository mutation through [`crate::doctor::Doctor`]. The
//! library is async; handlers block on a tokio runtime created per
//! invocation.

pub mod args;
pub mod commands;

pub use args::{Cli, Command, Shell};

use std::path::PathBuf;

use anyhow::{Context as _, Result};

use crate::ui::output::Verbosity;

/// Per-invocation settings from the global flags.
#[derive(Debug, Clone)]
pub struct Context {
    /// Directory to run in (defaults to the process cwd)
    pub cwd: Option<PathBuf>,
    pub debug: bool,
    pub quiet: bool,
}

impl Context {
    /// Context from parsed arguments.
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            cwd: cli.cwd.clone(),
            debug: cli.debug,
            quiet: cli.quiet,
        }
    }

    /// Output verbosity implied by the flags.
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.debug)
    }

    /// The directory to operate on.
    pub fn work_dir(&self) -> Result<PathBuf> {
        match &self.cwd {
            Some(dir) => Ok(dir.clone()),
            None => std::env::current_dir().context("cannot determine current directory"),
        }
    }
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`, after logging has
/// been initialised from the same parsed arguments.
pub fn run(cli: Cli) -> Result<()> {
    let ctx = Context::from_cli(&cli);
    commands::dispatch(cli.command, &ctx)
}
