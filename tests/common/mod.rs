//! Shared fixture for integration tests.
//!
//! A [`Mirror`] is a temp directory holding a working repository plus two
//! bare repositories playing the core (`origin`) and hub (`hub`) roles.
//! Everything runs through the real `git` binary.

#![allow(dead_code)]

use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

use syncdoctor::core::config::Config;
use syncdoctor::engine::Classifier;
use syncdoctor::git::exec::{Executor, ExecutorConfig};
use syncdoctor::git::{Deadlines, Git};

/// Working copy plus bare core and hub remotes, all on `main`.
pub struct Mirror {
    dir: TempDir,
    scratch: Cell<u32>,
}

impl Mirror {
    /// Both remotes and the working copy at one shared commit.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let mirror = Self {
            dir,
            scratch: Cell::new(0),
        };

        for bare in [mirror.core(), mirror.hub()] {
            run_git(mirror.root(), &["init", "--bare", "--quiet", path_str(&bare)]);
            run_git(&bare, &["symbolic-ref", "HEAD", "refs/heads/main"]);
        }

        let work = mirror.work();
        std::fs::create_dir(&work).unwrap();
        init_work_repo(&work);
        std::fs::write(work.join("README.md"), "# mirror\n").unwrap();
        run_git(&work, &["add", "README.md"]);
        run_git(&work, &["commit", "--quiet", "-m", "initial"]);
        run_git(&work, &["remote", "add", "origin", path_str(&mirror.core())]);
        run_git(&work, &["remote", "add", "hub", path_str(&mirror.hub())]);
        run_git(&work, &["push", "--quiet", "origin", "main"]);
        run_git(&work, &["push", "--quiet", "hub", "main"]);

        mirror
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn work(&self) -> PathBuf {
        self.root().join("work")
    }

    pub fn core(&self) -> PathBuf {
        self.root().join("core.git")
    }

    pub fn hub(&self) -> PathBuf {
        self.root().join("hub.git")
    }

    /// Run git in the working copy and return trimmed stdout.
    pub fn git(&self, args: &[&str]) -> String {
        run_git(&self.work(), args)
    }

    /// Write `file`, commit it in the working copy, return the new HEAD.
    pub fn commit(&self, file: &str, message: &str) -> String {
        let work = self.work();
        std::fs::write(work.join(file), format!("{}\n", message)).unwrap();
        run_git(&work, &["add", file]);
        run_git(&work, &["commit", "--quiet", "-m", message]);
        run_git(&work, &["rev-parse", "HEAD"])
    }

    /// Add `count` commits to `main` on a bare remote through a scratch
    /// clone, leaving the working copy untouched. Returns the new tip.
    pub fn advance_remote(&self, bare: &Path, count: u32) -> String {
        let n = self.scratch.get() + 1;
        self.scratch.set(n);
        let clone = self.root().join(format!("scratch-{}", n));
        run_git(
            self.root(),
            &["clone", "--quiet", path_str(bare), path_str(&clone)],
        );
        init_work_repo(&clone);
        for i in 0..count {
            let file = format!("remote-{}-{}.txt", n, i);
            std::fs::write(clone.join(&file), "remote\n").unwrap();
            run_git(&clone, &["add", &file]);
            run_git(&clone, &["commit", "--quiet", "-m", &file]);
        }
        run_git(&clone, &["push", "--quiet", "origin", "HEAD:refs/heads/main"]);
        run_git(&clone, &["rev-parse", "HEAD"])
    }

    /// Copy core's `main` to hub, so both remotes agree.
    pub fn mirror_core_to_hub(&self) {
        let core = self.core();
        run_git(
            &core,
            &["push", "--quiet", path_str(&self.hub()), "refs/heads/main:refs/heads/main"],
        );
    }

    /// An async git handle on the working copy.
    pub async fn handle(&self) -> Git {
        Git::open(executor(), &self.work(), Deadlines::default())
            .await
            .expect("failed to open working copy")
    }

    /// A classifier with default configuration (`origin` / `hub`).
    pub async fn classifier(&self) -> Classifier {
        Classifier::new(self.handle().await, Config::default())
    }
}

pub fn executor() -> Executor {
    Executor::new(ExecutorConfig::default())
}

fn init_work_repo(dir: &Path) {
    if !dir.join(".git").exists() {
        run_git(dir, &["init", "--quiet"]);
        run_git(dir, &["symbolic-ref", "HEAD", "refs/heads/main"]);
    }
    run_git(dir, &["config", "user.email", "test@example.com"]);
    run_git(dir, &["config", "user.name", "Test User"]);
    run_git(dir, &["config", "commit.gpgsign", "false"]);
}

pub fn path_str(path: &Path) -> &str {
    path.to_str().expect("temp path is not UTF-8")
}

/// Run a git command in `dir`, panicking on failure.
pub fn run_git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .env("GIT_TERMINAL_PROMPT", "0")
        .output()
        .expect("git command failed");

    if !output.status.success() {
        panic!(
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}
