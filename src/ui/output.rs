//! ui::output
//!
//! Output formatting and display.
//!
//! # Design
//!
//! Human output goes to stdout and respects the quiet flag. Warnings and
//! errors go to stderr. `--json` output bypasses this module entirely.

use std::fmt::Display;

use crate::doctor::Fix;
use crate::engine::state::{PairComparison, PairStatus, RepositoryState};

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Quiet mode - minimal output
    Quiet,
    /// Normal mode - standard output
    Normal,
    /// Debug mode - verbose output
    Debug,
}

impl Verbosity {
    /// Create verbosity from flags.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }
}

/// Print a message (respects quiet mode).
pub fn print(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Print an error message (always shown).
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}

/// Print a warning message (respects quiet mode).
pub fn warn(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        eprintln!("warning: {}", message);
    }
}

/// `ahead 2`, `behind 1`, `diverged (+2/-1)`, `synced`, `unknown`.
pub fn format_pair(pair: &PairComparison) -> String {
    match pair.status {
        PairStatus::Synced => "synced".to_string(),
        PairStatus::Ahead => format!("ahead {}", pair.ahead),
        PairStatus::Behind => format!("behind {}", pair.behind),
        PairStatus::Diverged => format!("diverged (+{}/-{})", pair.ahead, pair.behind),
        PairStatus::Unknown => "unknown".to_string(),
    }
}

/// Multi-line human summary of a snapshot.
pub fn format_state(state: &RepositoryState) -> String {
    let mut lines = Vec::new();

    let scenario = |id: &str, description: &str| format!("  {:<9} {}", id, description);

    lines.push(scenario(
        state.existence.scenario.id(),
        state.existence.scenario.description(),
    ));
    lines.push(scenario(
        state.working_tree.scenario.id(),
        state.working_tree.scenario.description(),
    ));

    let sync = &state.sync;
    let mut sync_line = scenario(sync.scenario.id(), sync.scenario.description());
    if sync.partial {
        if let Some(remote) = sync.compared_remote {
            sync_line.push_str(&format!(" (compared with {} only)", remote));
        }
    }
    lines.push(sync_line);
    if let Some(branch) = &sync.branch {
        lines.push(format!(
            "            {}: local/core {}, local/hub {}, core/hub {}",
            branch,
            format_pair(&sync.local_core),
            format_pair(&sync.local_hub),
            format_pair(&sync.core_hub),
        ));
    }

    for entry in &state.topology {
        if entry.scenario.id() == "B1" {
            continue;
        }
        lines.push(scenario(
            entry.scenario.id(),
            &format!("{} ({})", entry.scenario.description(), entry.branch),
        ));
    }

    lines.push(scenario(
        state.corruption.scenario.id(),
        state.corruption.scenario.description(),
    ));

    let retry = state.retry.pending();
    if !retry.is_empty() {
        let roles: Vec<String> = retry.iter().map(ToString::to_string).collect();
        lines.push(format!("  retry pending: {}", roles.join(", ")));
    }

    if !state.warnings.is_empty() {
        lines.push("warnings:".to_string());
        for w in &state.warnings {
            lines.push(format!("  [{}] {}", w.dimension, w.message));
        }
    }

    lines.join("\n")
}

/// One line per fix: marker, scenario ID, description, then the command.
pub fn format_fix(fix: &Fix) -> String {
    let marker = if fix.auto_fixable() { "auto" } else { "    " };
    let mut line = format!("{} {:<9} {}", marker, fix.scenario(), fix.description());
    if let Some(command) = fix.command() {
        line.push_str(&format!("\n               $ {}", command));
    }
    line
}
