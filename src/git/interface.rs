//! git::interface
//!
//! Typed git operations on top of the subprocess [`Executor`].
//!
//! This module provides the **single doorway** to all Git operations in
//! syncdoctor. Every call returns strong types and normalizes failures into
//! typed categories.
//!
//! # Architecture
//!
//! The `Git` struct is the only way to interact with a repository. It owns
//! an [`Executor`] handle and the deadlines to use, and picks the right one
//! per call: network calls use the probe or fetch deadline, everything else
//! the local deadline.
//!
//! # Error Handling
//!
//! Git failures are categorized into typed variants:
//! - [`GitError::Timeout`]: the deadline elapsed and the child was killed
//! - [`GitError::Auth`]: credentials were required or rejected
//! - [`GitError::NotFound`]: remote or repository does not exist
//! - [`GitError::PushRejected`]: the remote refused a non-fast-forward
//! - [`GitError::NotARepo`]: not inside a Git repository
//!
//! # Example
//!
//! ```ignore
//! use syncdoctor::git::{Git, Deadlines};
//! use syncdoctor::git::exec::{Executor, ExecutorConfig};
//!
//! let exec = Executor::new(ExecutorConfig::default());
//! let git = Git::open(exec, Path::new("."), Deadlines::default()).await?;
//! let oid = git.resolve_ref("refs/heads/main").await?;
//! ```

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::exec::{CommandOutput, ExecError, Executor};
use crate::core::config::Config;
use crate::core::paths::DoctorPaths;
use crate::core::types::{BranchName, Oid, RefName, TypeError};

/// Lowercased stderr fragments that mean credentials were needed or refused.
const AUTH_MARKERS: &[&str] = &[
    "terminal prompts disabled",
    "could not read username",
    "could not read password",
    "authentication failed",
    "permission denied (publickey",
    "host key verification failed",
    "http basic: access denied",
    "invalid username or password",
];

/// Lowercased stderr fragments that mean the remote or repository is absent.
const NOT_FOUND_MARKERS: &[&str] = &[
    "does not appear to be a git repository",
    "repository not found",
    "no such remote",
    "could not resolve host",
];

/// Errors from Git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// Not inside a Git repository.
    #[error("not a git repository: {path}")]
    NotARepo { path: PathBuf },

    /// The command exceeded its deadline.
    #[error("`git {command}` timed out after {}s", .deadline.as_secs())]
    Timeout { command: String, deadline: Duration },

    /// Credentials were required or rejected.
    #[error("authentication failed for `git {command}`: {message}")]
    Auth { command: String, message: String },

    /// Remote or repository does not exist.
    #[error("not found for `git {command}`: {message}")]
    NotFound { command: String, message: String },

    /// The remote refused the update (never forced).
    #[error("push to '{remote}' rejected: {message}")]
    PushRejected { remote: String, message: String },

    /// Requested ref does not exist.
    #[error("ref not found: {refname}")]
    RefNotFound { refname: String },

    /// Invalid object id in git output.
    #[error("invalid object id: {oid}")]
    InvalidOid { oid: String },

    /// Invalid ref or branch name.
    #[error("invalid ref name: {message}")]
    InvalidRefName { message: String },

    /// Output did not have the expected shape.
    #[error("unexpected output from `git {command}`: {message}")]
    Parse { command: String, message: String },

    /// The git program could not be started or talked to.
    #[error("failed to run git: {message}")]
    Spawn { message: String },

    /// Any other non-zero exit.
    #[error("`git {command}` failed with exit code {exit_code}: {stderr}")]
    CommandFailed {
        command: String,
        exit_code: i32,
        stderr: String,
    },
}

impl GitError {
    /// Whether this failure is a deadline expiry.
    pub fn is_timeout(&self) -> bool {
        matches!(self, GitError::Timeout { .. })
    }

    /// Whether this failure is a credential problem.
    pub fn is_auth(&self) -> bool {
        matches!(self, GitError::Auth { .. })
    }

    /// Classify a failed command from its stderr.
    pub fn from_output(command: &str, output: &CommandOutput) -> Self {
        let stderr = output.stderr.trim();
        let lower = stderr.to_ascii_lowercase();
        let message = first_line(stderr);
        if AUTH_MARKERS.iter().any(|m| lower.contains(m)) {
            GitError::Auth {
                command: command.to_string(),
                message,
            }
        } else if NOT_FOUND_MARKERS.iter().any(|m| lower.contains(m)) {
            GitError::NotFound {
                command: command.to_string(),
                message,
            }
        } else {
            GitError::CommandFailed {
                command: command.to_string(),
                exit_code: output.exit_code,
                stderr: stderr.to_string(),
            }
        }
    }
}

impl From<ExecError> for GitError {
    fn from(err: ExecError) -> Self {
        match err {
            ExecError::Timeout { command, deadline } => GitError::Timeout { command, deadline },
            ExecError::Spawn { .. } | ExecError::Io { .. } => GitError::Spawn {
                message: err.to_string(),
            },
        }
    }
}

impl From<TypeError> for GitError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::InvalidOid(msg) => GitError::InvalidOid { oid: msg },
            TypeError::InvalidRefName(msg) | TypeError::InvalidBranchName(msg) => {
                GitError::InvalidRefName { message: msg }
            }
        }
    }
}

fn first_line(s: &str) -> String {
    s.lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("")
        .to_string()
}

/// Deadlines for the three classes of git call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadlines {
    pub probe: Duration,
    pub fetch: Duration,
    pub local: Duration,
}

impl Default for Deadlines {
    fn default() -> Self {
        Self {
            probe: Duration::from_secs(5),
            fetch: Duration::from_secs(60),
            local: Duration::from_secs(30),
        }
    }
}

impl Deadlines {
    /// Deadlines from merged configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            probe: config.probe_deadline(),
            fetch: config.fetch_deadline(),
            local: config.local_deadline(),
        }
    }
}

/// Commit counts between two revisions, from the left side's view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AheadBehind {
    /// Commits reachable from left but not right.
    pub ahead: u32,
    /// Commits reachable from right but not left.
    pub behind: u32,
}

/// Porcelain status split into path sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusEntries {
    pub staged: BTreeSet<String>,
    pub unstaged: BTreeSet<String>,
    pub untracked: BTreeSet<String>,
    pub conflicted: BTreeSet<String>,
}

impl StatusEntries {
    /// No staged or unstaged changes. Untracked files are ignored.
    pub fn is_clean_tracked(&self) -> bool {
        self.staged.is_empty() && self.unstaged.is_empty() && self.conflicted.is_empty()
    }
}

/// A ref and the commit it points to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefEntry {
    pub name: String,
    pub oid: Oid,
}

/// Size of one object, from `cat-file --batch-check`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectSize {
    pub kind: String,
    pub oid: Oid,
    pub size: u64,
}

/// The Git interface.
///
/// Cheap to clone; clones share the executor's per-directory locks.
#[derive(Debug, Clone)]
pub struct Git {
    exec: Executor,
    work_dir: PathBuf,
    deadlines: Deadlines,
}

impl Git {
    // =========================================================================
    // Construction
    // =========================================================================

    /// Open the repository containing `path`.
    ///
    /// # Errors
    ///
    /// [`GitError::NotARepo`] if `path` is not inside a work tree.
    pub async fn open(exec: Executor, path: &Path, deadlines: Deadlines) -> Result<Self, GitError> {
        let probe = Self::at(exec, path, deadlines);
        let out = probe.run_raw(&["rev-parse", "--show-toplevel"], deadlines.local).await?;
        if !out.success() {
            return Err(GitError::NotARepo {
                path: path.to_path_buf(),
            });
        }
        let top = out.stdout.trim();
        Ok(Self {
            work_dir: PathBuf::from(top),
            ..probe
        })
    }

    /// Wrap a directory without checking it is a repository.
    pub fn at(exec: Executor, work_dir: &Path, deadlines: Deadlines) -> Self {
        Self {
            exec,
            work_dir: work_dir.to_path_buf(),
            deadlines,
        }
    }

    /// The working directory commands run in.
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// The deadlines in use.
    pub fn deadlines(&self) -> Deadlines {
        self.deadlines
    }

    /// The executor commands run through.
    pub fn executor(&self) -> &Executor {
        &self.exec
    }

    // =========================================================================
    // Raw execution
    // =========================================================================

    /// Run a command and return its output, whatever the exit code.
    pub async fn run_raw(&self, args: &[&str], deadline: Duration) -> Result<CommandOutput, GitError> {
        Ok(self.exec.execute(&self.work_dir, args, deadline).await?)
    }

    /// Run a local command and require exit code 0.
    pub async fn run(&self, args: &[&str]) -> Result<CommandOutput, GitError> {
        self.run_checked(args, self.deadlines.local).await
    }

    async fn run_checked(&self, args: &[&str], deadline: Duration) -> Result<CommandOutput, GitError> {
        let out = self.run_raw(args, deadline).await?;
        if out.success() {
            Ok(out)
        } else {
            Err(GitError::from_output(&args.join(" "), &out))
        }
    }

    // =========================================================================
    // Repository info
    // =========================================================================

    /// Whether the working directory is inside a work tree.
    pub async fn is_repository(&self) -> Result<bool, GitError> {
        let out = self
            .run_raw(&["rev-parse", "--is-inside-work-tree"], self.deadlines.local)
            .await?;
        Ok(out.success() && out.stdout.trim() == "true")
    }

    /// Storage paths from `--git-dir` / `--git-common-dir`.
    pub async fn paths(&self) -> Result<DoctorPaths, GitError> {
        let out = self.run(&["rev-parse", "--git-dir", "--git-common-dir"]).await?;
        let mut lines = out.stdout.lines().map(str::trim);
        let (Some(git_dir), Some(common_dir)) = (lines.next(), lines.next()) else {
            return Err(GitError::Parse {
                command: "rev-parse --git-dir --git-common-dir".into(),
                message: out.stdout.clone(),
            });
        };
        let absolute = |p: &str| {
            let p = PathBuf::from(p);
            if p.is_absolute() {
                p
            } else {
                self.work_dir.join(p)
            }
        };
        Ok(DoctorPaths::new(absolute(git_dir), absolute(common_dir)))
    }

    /// Whether the repository is a shallow clone.
    pub async fn is_shallow(&self) -> Result<bool, GitError> {
        let out = self.run(&["rev-parse", "--is-shallow-repository"]).await?;
        Ok(out.stdout.trim() == "true")
    }

    /// The branch HEAD is attached to, or `None` when detached.
    pub async fn current_branch(&self) -> Result<Option<BranchName>, GitError> {
        let out = self
            .run_raw(&["symbolic-ref", "-q", "--short", "HEAD"], self.deadlines.local)
            .await?;
        match out.exit_code {
            0 => Ok(Some(BranchName::new(out.stdout.trim())?)),
            1 => Ok(None),
            _ => Err(GitError::from_output("symbolic-ref -q --short HEAD", &out)),
        }
    }

    /// Branch named by `refs/remotes/<remote>/HEAD`, if set.
    pub async fn remote_head_branch(&self, remote: &str) -> Result<Option<BranchName>, GitError> {
        let refname = format!("refs/remotes/{}/HEAD", remote);
        let out = self
            .run_raw(&["symbolic-ref", "-q", "--short", &refname], self.deadlines.local)
            .await?;
        if !out.success() {
            return Ok(None);
        }
        let short = out.stdout.trim();
        let prefix = format!("{}/", remote);
        match short.strip_prefix(&prefix) {
            Some(name) => Ok(Some(BranchName::new(name)?)),
            None => Ok(None),
        }
    }

    // =========================================================================
    // Refs and ancestry
    // =========================================================================

    /// Resolve a revision to a commit, or `None` if it does not exist.
    pub async fn resolve_ref(&self, refname: &str) -> Result<Option<Oid>, GitError> {
        let spec = format!("{}^{{commit}}", refname);
        let out = self
            .run_raw(&["rev-parse", "--verify", "--quiet", &spec], self.deadlines.local)
            .await?;
        match out.exit_code {
            0 => Ok(Some(Oid::new(out.stdout.trim())?)),
            1 => Ok(None),
            _ => Err(GitError::from_output("rev-parse --verify", &out)),
        }
    }

    /// Commits each side has that the other lacks.
    pub async fn ahead_behind(&self, left: &Oid, right: &Oid) -> Result<AheadBehind, GitError> {
        let range = format!("{}...{}", left, right);
        let out = self
            .run(&["rev-list", "--left-right", "--count", &range])
            .await?;
        parse_left_right(&out.stdout).ok_or_else(|| GitError::Parse {
            command: "rev-list --left-right --count".into(),
            message: out.stdout.trim().to_string(),
        })
    }

    /// Whether `ancestor` is reachable from `descendant`.
    pub async fn is_ancestor(&self, ancestor: &str, descendant: &str) -> Result<bool, GitError> {
        let out = self
            .run_raw(
                &["merge-base", "--is-ancestor", ancestor, descendant],
                self.deadlines.local,
            )
            .await?;
        match out.exit_code {
            0 => Ok(true),
            1 => Ok(false),
            _ => Err(GitError::from_output("merge-base --is-ancestor", &out)),
        }
    }

    /// Number of commits reachable from `tip` but not from `base`.
    pub async fn count_exclusive(&self, tip: &str, base: &str) -> Result<u32, GitError> {
        let range = format!("{}..{}", base, tip);
        let out = self.run(&["rev-list", "--count", &range]).await?;
        out.stdout.trim().parse().map_err(|_| GitError::Parse {
            command: "rev-list --count".into(),
            message: out.stdout.trim().to_string(),
        })
    }

    /// Number of commits reachable from `tip`.
    pub async fn count_commits(&self, tip: &str) -> Result<u32, GitError> {
        let out = self.run(&["rev-list", "--count", tip]).await?;
        out.stdout.trim().parse().map_err(|_| GitError::Parse {
            command: "rev-list --count".into(),
            message: out.stdout.trim().to_string(),
        })
    }

    /// Enumerate refs under the given prefixes, skipping symrefs.
    pub async fn list_refs(&self, prefixes: &[&str]) -> Result<Vec<RefEntry>, GitError> {
        let mut args = vec![
            "for-each-ref",
            "--format=%(refname)%00%(objectname)%00%(symref)",
        ];
        args.extend_from_slice(prefixes);
        let out = self.run(&args).await?;
        parse_for_each_ref(&out.stdout)
    }

    // =========================================================================
    // Working tree
    // =========================================================================

    /// Porcelain status including every untracked file.
    pub async fn status(&self) -> Result<StatusEntries, GitError> {
        let out = self
            .run(&["status", "--porcelain=v1", "-z", "--untracked-files=all"])
            .await?;
        Ok(parse_status_z(&out.stdout))
    }

    /// Paths of gitlink (mode 160000) entries in the index.
    pub async fn gitlinks(&self) -> Result<Vec<String>, GitError> {
        let out = self.run(&["ls-files", "-s", "-z"]).await?;
        Ok(parse_gitlinks(&out.stdout))
    }

    /// Submodule paths declared in `.gitmodules`.
    pub async fn gitmodules_paths(&self) -> Result<BTreeSet<String>, GitError> {
        if !self.work_dir.join(".gitmodules").exists() {
            return Ok(BTreeSet::new());
        }
        let out = self
            .run_raw(
                &[
                    "config",
                    "-f",
                    ".gitmodules",
                    "--get-regexp",
                    r"^submodule\..*\.path$",
                ],
                self.deadlines.local,
            )
            .await?;
        match out.exit_code {
            0 => Ok(out
                .stdout
                .lines()
                .filter_map(|l| l.split_once(' ').map(|(_, p)| p.trim().to_string()))
                .collect()),
            1 => Ok(BTreeSet::new()),
            _ => Err(GitError::from_output("config -f .gitmodules", &out)),
        }
    }

    // =========================================================================
    // Object store
    // =========================================================================

    /// Type and size of every object reachable from any ref.
    pub async fn reachable_object_sizes(&self) -> Result<Vec<ObjectSize>, GitError> {
        let listing = self.run(&["rev-list", "--objects", "--all"]).await?;
        let mut input = String::new();
        for line in listing.stdout.lines() {
            if let Some(oid) = line.split_whitespace().next() {
                input.push_str(oid);
                input.push('\n');
            }
        }
        if input.is_empty() {
            return Ok(Vec::new());
        }

        let args = [
            "cat-file",
            "--batch-check=%(objecttype) %(objectname) %(objectsize)",
        ];
        let out = self
            .exec
            .execute_with_stdin(
                &self.work_dir,
                &args,
                Some(input.into_bytes()),
                self.deadlines.local,
            )
            .await?;
        if !out.success() {
            return Err(GitError::from_output("cat-file --batch-check", &out));
        }
        parse_batch_check(&out.stdout)
    }

    /// The `garbage` count from `count-objects -v`.
    pub async fn garbage_count(&self) -> Result<u64, GitError> {
        let out = self.run(&["count-objects", "-v"]).await?;
        Ok(out
            .stdout
            .lines()
            .find_map(|l| l.strip_prefix("garbage:"))
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0))
    }

    // =========================================================================
    // Remotes
    // =========================================================================

    /// The configured URL of a remote, or `None` if not configured.
    pub async fn remote_url(&self, name: &str) -> Result<Option<String>, GitError> {
        let key = format!("remote.{}.url", name);
        let out = self
            .run_raw(&["config", "--get", &key], self.deadlines.local)
            .await?;
        match out.exit_code {
            0 => Ok(Some(out.stdout.trim().to_string())),
            1 => Ok(None),
            _ => Err(GitError::from_output("config --get", &out)),
        }
    }

    /// Probe a remote for reachability with the probe deadline.
    pub async fn ls_remote(&self, name: &str) -> Result<(), GitError> {
        self.run_checked(&["ls-remote", "--heads", name], self.deadlines.probe)
            .await
            .map(|_| ())
    }

    /// Fetch a remote, pruning deleted branches.
    pub async fn fetch(&self, name: &str) -> Result<(), GitError> {
        self.run_checked(&["fetch", "--prune", "--quiet", name], self.deadlines.fetch)
            .await
            .map(|_| ())
    }

    /// Push a local branch to the same name on a remote. Never forces.
    pub async fn push(&self, remote: &str, branch: &BranchName) -> Result<(), GitError> {
        let local = RefName::for_branch(branch);
        let refspec = format!("{0}:{0}", local);
        let args = ["push", "--porcelain", remote, refspec.as_str()];
        let out = self.run_raw(&args, self.deadlines.fetch).await?;
        if out.success() {
            return Ok(());
        }
        let combined = format!("{}\n{}", out.stdout, out.stderr);
        if combined.contains("[rejected]") || combined.contains("non-fast-forward") {
            return Err(GitError::PushRejected {
                remote: remote.to_string(),
                message: first_line(&out.stderr),
            });
        }
        Err(GitError::from_output(&args.join(" "), &out))
    }

    /// `git reset --keep <target>`.
    pub async fn reset_keep(&self, target: &str) -> Result<(), GitError> {
        self.run(&["reset", "--keep", target]).await.map(|_| ())
    }

    /// Parse a GitHub remote URL into `(owner, repo)`.
    ///
    /// Handles HTTPS, scp-style SSH and `ssh://` URLs.
    ///
    /// # Example
    ///
    /// ```
    /// use syncdoctor::git::Git;
    ///
    /// assert_eq!(
    ///     Git::parse_github_remote("https://github.com/owner/repo.git"),
    ///     Some(("owner".to_string(), "repo".to_string()))
    /// );
    /// assert_eq!(
    ///     Git::parse_github_remote("git@github.com:owner/repo.git"),
    ///     Some(("owner".to_string(), "repo".to_string()))
    /// );
    /// assert_eq!(Git::parse_github_remote("https://gitlab.com/owner/repo.git"), None);
    /// ```
    pub fn parse_github_remote(url: &str) -> Option<(String, String)> {
        const PREFIXES: [&str; 3] = [
            "https://github.com/",
            "git@github.com:",
            "ssh://git@github.com/",
        ];
        PREFIXES
            .iter()
            .find_map(|p| url.strip_prefix(p))
            .and_then(Self::parse_owner_repo)
    }

    fn parse_owner_repo(path: &str) -> Option<(String, String)> {
        let path = path.trim_end_matches('/');
        let path = path.strip_suffix(".git").unwrap_or(path);
        let (owner, repo) = path.split_once('/')?;

        if owner.is_empty() || repo.is_empty() || repo.contains('/') {
            return None;
        }

        Some((owner.to_string(), repo.to_string()))
    }
}

// =============================================================================
// Output parsers
// =============================================================================

fn parse_left_right(stdout: &str) -> Option<AheadBehind> {
    let mut parts = stdout.split_whitespace();
    let ahead = parts.next()?.parse().ok()?;
    let behind = parts.next()?.parse().ok()?;
    Some(AheadBehind { ahead, behind })
}

/// Parse `status --porcelain=v1 -z`.
///
/// Unmerged entries land in both `conflicted` and `unstaged`.
fn parse_status_z(stdout: &str) -> StatusEntries {
    let mut entries = StatusEntries::default();
    let mut tokens = stdout.split('\0').filter(|t| !t.is_empty());

    while let Some(token) = tokens.next() {
        if token.len() < 4 {
            continue;
        }
        let (code, path) = token.split_at(3);
        let mut code_chars = code.chars();
        let x = code_chars.next().unwrap_or(' ');
        let y = code_chars.next().unwrap_or(' ');
        let path = path.to_string();

        // Renames and copies carry the original path as the next token.
        if matches!(x, 'R' | 'C') || matches!(y, 'R' | 'C') {
            tokens.next();
        }

        match (x, y) {
            ('?', '?') => {
                entries.untracked.insert(path);
            }
            ('!', '!') => {}
            ('D', 'D') | ('A', 'A') | ('U', _) | (_, 'U') => {
                entries.conflicted.insert(path.clone());
                entries.unstaged.insert(path);
            }
            _ => {
                if x != ' ' {
                    entries.staged.insert(path.clone());
                }
                if y != ' ' {
                    entries.unstaged.insert(path);
                }
            }
        }
    }
    entries
}

fn parse_gitlinks(stdout: &str) -> Vec<String> {
    stdout
        .split('\0')
        .filter_map(|entry| {
            let (meta, path) = entry.split_once('\t')?;
            meta.starts_with("160000 ").then(|| path.to_string())
        })
        .collect()
}

fn parse_for_each_ref(stdout: &str) -> Result<Vec<RefEntry>, GitError> {
    let mut refs = Vec::new();
    for line in stdout.lines().filter(|l| !l.is_empty()) {
        let mut fields = line.split('\0');
        let (Some(name), Some(oid)) = (fields.next(), fields.next()) else {
            return Err(GitError::Parse {
                command: "for-each-ref".into(),
                message: line.to_string(),
            });
        };
        let symref = fields.next().unwrap_or("");
        if !symref.is_empty() || name.ends_with("/HEAD") {
            continue;
        }
        refs.push(RefEntry {
            name: name.to_string(),
            oid: Oid::new(oid)?,
        });
    }
    Ok(refs)
}

fn parse_batch_check(stdout: &str) -> Result<Vec<ObjectSize>, GitError> {
    let mut objects = Vec::new();
    for line in stdout.lines().filter(|l| !l.is_empty()) {
        let mut fields = line.split(' ');
        let (Some(kind), Some(oid), Some(size)) = (fields.next(), fields.next(), fields.next())
        else {
            continue;
        };
        // "<oid> missing" lines have only two fields and are skipped above.
        let size = size.parse().map_err(|_| GitError::Parse {
            command: "cat-file --batch-check".into(),
            message: line.to_string(),
        })?;
        objects.push(ObjectSize {
            kind: kind.to_string(),
            oid: Oid::new(oid)?,
            size,
        });
    }
    Ok(objects)
}
