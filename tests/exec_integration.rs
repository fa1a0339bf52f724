//! Integration tests for the command executor and git interface.
//!
//! These run the real `git` binary against temp repositories.

mod common;

use std::time::Duration;

use common::{executor, Mirror};
use syncdoctor::git::exec::ExecError;
use syncdoctor::git::{Deadlines, Git, GitError};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_calls_on_one_directory_all_succeed() {
    let mirror = Mirror::new();
    let exec = executor();
    let work = mirror.work();

    let mut tasks = Vec::new();
    for i in 0..10 {
        let exec = exec.clone();
        let work = work.clone();
        tasks.push(tokio::spawn(async move {
            let args = if i % 2 == 0 {
                vec!["rev-parse", "HEAD"]
            } else {
                vec!["status", "--porcelain"]
            };
            exec.execute(&work, &args, Duration::from_secs(30)).await
        }));
    }

    for task in tasks {
        let output = task.await.unwrap().unwrap();
        assert!(output.success(), "stderr: {}", output.stderr);
    }
}

#[tokio::test]
async fn nonzero_exit_is_output_not_error() {
    let mirror = Mirror::new();
    let out = executor()
        .execute(
            &mirror.work(),
            &["rev-parse", "--verify", "refs/heads/nope"],
            Duration::from_secs(30),
        )
        .await
        .unwrap();
    assert!(!out.success());
}

#[tokio::test]
async fn missing_directory_fails_to_spawn() {
    let mirror = Mirror::new();
    let result = executor()
        .execute(
            &mirror.root().join("does-not-exist"),
            &["status"],
            Duration::from_secs(5),
        )
        .await;
    assert!(matches!(result, Err(ExecError::Spawn { .. })));
}

#[tokio::test]
async fn open_resolves_toplevel_from_subdirectory() {
    let mirror = Mirror::new();
    let sub = mirror.work().join("nested");
    std::fs::create_dir(&sub).unwrap();

    let git = Git::open(executor(), &sub, Deadlines::default()).await.unwrap();
    assert_eq!(
        git.work_dir().canonicalize().unwrap(),
        mirror.work().canonicalize().unwrap()
    );
}

#[tokio::test]
async fn open_outside_repository_fails() {
    let dir = tempfile::TempDir::new().unwrap();
    let result = Git::open(executor(), dir.path(), Deadlines::default()).await;
    assert!(matches!(result, Err(GitError::NotARepo { .. })));
}

#[tokio::test]
async fn ahead_behind_counts_commits() {
    let mirror = Mirror::new();
    let base = mirror.git(&["rev-parse", "HEAD"]);
    mirror.commit("a.txt", "a");
    mirror.commit("b.txt", "b");

    let git = mirror.handle().await;
    let head = git.resolve_ref("HEAD").await.unwrap().unwrap();
    let base = git.resolve_ref(&base).await.unwrap().unwrap();
    let counts = git.ahead_behind(&head, &base).await.unwrap();
    assert_eq!((counts.ahead, counts.behind), (2, 0));
    assert!(git.is_ancestor(base.as_str(), head.as_str()).await.unwrap());
}

#[tokio::test]
async fn unknown_remote_probe_fails() {
    let mirror = Mirror::new();
    let git = mirror.handle().await;
    assert!(git.ls_remote("nowhere").await.is_err());
    assert!(git.ls_remote("origin").await.is_ok());
    assert_eq!(git.remote_url("nowhere").await.unwrap(), None);
}
