//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Run as if in that directory
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output

use clap::{ArgGroup, Parser, Subcommand};
use std::path::PathBuf;

/// syncdoctor - diagnose and safely repair a repository mirrored to two remotes
#[derive(Parser, Debug)]
#[command(name = "syncdoctor")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if syncdoctor was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Classify the repository across all five dimensions
    #[command(
        name = "status",
        long_about = "Classify the repository across all five dimensions.\n\n\
            Checks that the local copy and both remotes exist, inspects the working \
            tree, compares the branch tips of local, core and hub, maps every branch \
            across the three locations, and scans for oversized objects. Reachable \
            remotes are fetched first unless --no-fetch is given or `fetch = false` \
            is configured.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Where do things stand?
    syncdoctor status

    # Machine-readable snapshot for scripting
    syncdoctor status --json

    # Offline: compare against the last fetched remote-tracking refs
    syncdoctor status --no-fetch"
    )]
    Status {
        /// Print the snapshot as JSON
        #[arg(long)]
        json: bool,

        /// Do not fetch remotes before comparing
        #[arg(long)]
        no_fetch: bool,
    },

    /// List suggested fixes in priority order
    #[command(
        name = "fixes",
        long_about = "List suggested fixes in priority order.\n\n\
            Every fix names the scenario it addresses. Fixes marked `auto` carry an \
            operation that `syncdoctor fix --auto` may apply; the rest are guidance \
            with a command to run by hand."
    )]
    Fixes {
        /// Print the fixes as JSON
        #[arg(long)]
        json: bool,
    },

    /// Apply fixes
    #[command(
        name = "fix",
        group(ArgGroup::new("selection").required(true).args(["auto", "scenarios"])),
        long_about = "Apply fixes.\n\n\
            With --auto, every auto-fixable fix is applied in priority order, \
            stopping at the first failure. With --scenario, only fixes for the named \
            scenarios are applied. Every operation is validated against fresh \
            repository state immediately before it runs; a reset never discards \
            local commits.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Apply everything that is safe to do unattended
    syncdoctor fix --auto

    # Push only (local ahead of both remotes)
    syncdoctor fix --scenario S2

    # Check what would run
    syncdoctor fix --auto --dry-run"
    )]
    Fix {
        /// Apply every auto-fixable fix
        #[arg(long)]
        auto: bool,

        /// Apply fixes for this scenario ID (repeatable)
        #[arg(long = "scenario", value_name = "ID")]
        scenarios: Vec<String>,

        /// Validate without making changes
        #[arg(long)]
        dry_run: bool,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        after_help = "\
INSTALLATION:
    # Bash
    syncdoctor completion bash > ~/.local/share/bash-completion/completions/syncdoctor

    # Zsh
    syncdoctor completion zsh > ~/.zfunc/_syncdoctor

    # Fish
    syncdoctor completion fish > ~/.config/fish/completions/syncdoctor.fish

    # PowerShell
    syncdoctor completion powershell >> $PROFILE"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}
