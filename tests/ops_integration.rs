//! Repair operations and the orchestrator against real repositories.

mod common;

use std::sync::Arc;

use common::{path_str, Mirror};
use syncdoctor::core::retry::{MemoryRetryStore, RetryStore};
use syncdoctor::core::types::{BranchName, RemoteRole};
use syncdoctor::doctor::{suggest_fixes, Doctor};
use syncdoctor::engine::state::SyncScenario;
use syncdoctor::ops::{CompositeOp, FetchOp, Operation, OperationError, ResetOp};

fn main_branch() -> BranchName {
    BranchName::new("main").unwrap()
}

// =============================================================================
// Reset: never discards local commits
// =============================================================================

#[tokio::test]
async fn reset_refuses_diverged_history() {
    let mirror = Mirror::new();
    mirror.commit("local-1.txt", "local 1");
    mirror.commit("local-2.txt", "local 2");
    mirror.advance_remote(&mirror.core(), 1);
    mirror.mirror_core_to_hub();

    let classifier = mirror.classifier().await;
    let state = classifier.detect().await;
    assert_eq!(state.sync.scenario, SyncScenario::S4);

    let before = mirror.git(&["rev-parse", "HEAD"]);
    let op = Operation::Reset(ResetOp::new(main_branch(), RemoteRole::Core, "origin").unwrap());
    let err = op.validate(&state, classifier.git()).await.unwrap_err();
    match &err {
        OperationError::Validation(message) => {
            assert!(message.contains("2 commit(s)"), "{}", message)
        }
        other => panic!("expected validation error, got {:?}", other),
    }

    // Execute re-checks even without a prior validate.
    assert!(op.execute(classifier.git()).await.is_err());
    assert_eq!(mirror.git(&["rev-parse", "HEAD"]), before);
}

#[tokio::test]
async fn reset_fast_forwards_when_behind() {
    let mirror = Mirror::new();
    let tip = mirror.advance_remote(&mirror.core(), 2);
    mirror.mirror_core_to_hub();

    let classifier = mirror.classifier().await;
    let state = classifier.detect().await;
    assert_eq!(state.sync.scenario, SyncScenario::S3);

    let op = Operation::Reset(ResetOp::new(main_branch(), RemoteRole::Core, "origin").unwrap());
    op.validate(&state, classifier.git()).await.unwrap();
    op.execute(classifier.git()).await.unwrap();

    assert_eq!(mirror.git(&["rev-parse", "HEAD"]), tip);
    assert_eq!(classifier.detect().await.sync.scenario, SyncScenario::S1);
}

#[tokio::test]
async fn reset_refuses_dirty_tracked_files() {
    let mirror = Mirror::new();
    mirror.advance_remote(&mirror.core(), 1);
    std::fs::write(mirror.work().join("README.md"), "edited\n").unwrap();

    let classifier = mirror.classifier().await;
    let state = classifier.detect().await;
    let op = Operation::Reset(ResetOp::new(main_branch(), RemoteRole::Core, "origin").unwrap());
    assert!(matches!(
        op.validate(&state, classifier.git()).await,
        Err(OperationError::Validation(_))
    ));
}

#[tokio::test]
async fn later_fast_forward_still_checks_the_worktree() {
    let mirror = Mirror::new();
    mirror.advance_remote(&mirror.hub(), 1);
    std::fs::write(mirror.work().join("README.md"), "edited\n").unwrap();

    let classifier = mirror.classifier().await;
    let state = classifier.detect().await;
    let op = Operation::Composite(CompositeOp::new(vec![
        Operation::Fetch(FetchOp::new(RemoteRole::Hub, "hub")),
        Operation::Reset(ResetOp::new(main_branch(), RemoteRole::Hub, "hub").unwrap()),
    ]));
    match op.validate(&state, classifier.git()).await {
        Err(OperationError::Step { index, source, .. }) => {
            assert_eq!(index, 1);
            assert!(matches!(*source, OperationError::Validation(_)), "{:?}", source);
        }
        other => panic!("expected step 1 validation error, got {:?}", other),
    }
}

// =============================================================================
// Orchestrator
// =============================================================================

#[tokio::test]
async fn auto_fix_pushes_to_both_remotes() {
    let mirror = Mirror::new();
    let tip = mirror.commit("a.txt", "a");

    let classifier = mirror.classifier().await;
    let state = classifier.detect().await;
    assert_eq!(state.sync.scenario, SyncScenario::S2);

    let doctor = Doctor::new(classifier.git().clone(), Arc::new(MemoryRetryStore::new()));
    let report = doctor.auto_fix(&state, &suggest_fixes(&state)).await;
    assert!(report.is_success(), "{:?}", report.failed);
    assert_eq!(report.applied.len(), 2);

    for bare in [mirror.core(), mirror.hub()] {
        assert_eq!(common::run_git(&bare, &["rev-parse", "main"]), tip);
    }
    assert_eq!(classifier.detect().await.sync.scenario, SyncScenario::S1);
}

#[tokio::test]
async fn failed_hub_push_leaves_core_applied_and_hub_pending() {
    let mirror = Mirror::new();
    mirror.commit("a.txt", "a");
    let nowhere = mirror.root().join("nowhere.git");
    mirror.git(&["remote", "set-url", "--push", "hub", path_str(&nowhere)]);

    let store = Arc::new(MemoryRetryStore::new());
    let classifier = mirror
        .classifier()
        .await
        .with_retry_store(store.clone() as Arc<dyn RetryStore>);
    let state = classifier.detect().await;
    assert_eq!(state.sync.scenario, SyncScenario::S2);

    let doctor = Doctor::new(classifier.git().clone(), store.clone());
    let report = doctor.auto_fix(&state, &suggest_fixes(&state)).await;

    assert_eq!(report.applied.len(), 1);
    assert_eq!(
        report.applied[0].operation().map(Operation::pushed_remotes),
        Some(vec![RemoteRole::Core])
    );
    let failed = report.failed.expect("hub push should fail");
    assert_eq!(failed.retry_pending, vec![RemoteRole::Hub]);
    assert!(!failed.retryable);

    let markers = store.load().unwrap();
    assert!(markers.hub);
    assert!(!markers.core);

    // Re-detection sees core caught up and suggests only the hub push.
    let again = classifier.detect().await;
    assert_eq!(again.sync.scenario, SyncScenario::S5);
    assert!(again.retry.hub);
    let pushes: Vec<RemoteRole> = suggest_fixes(&again)
        .iter()
        .filter_map(|f| f.operation())
        .flat_map(Operation::pushed_remotes)
        .collect();
    assert_eq!(pushes, vec![RemoteRole::Hub]);

    // Once the hub accepts pushes again the marker clears.
    let hub = mirror.hub();
    mirror.git(&["remote", "set-url", "--push", "hub", path_str(&hub)]);
    let fixes = suggest_fixes(&again);
    let report = doctor.auto_fix(&again, &fixes).await;
    assert!(report.is_success(), "{:?}", report.failed);
    assert!(!store.load().unwrap().hub);
}

#[tokio::test]
async fn hub_ahead_catches_up_local_then_core() {
    let mirror = Mirror::new();
    let tip = mirror.advance_remote(&mirror.hub(), 2);

    let classifier = mirror.classifier().await;
    let state = classifier.detect().await;
    assert_eq!(state.sync.scenario, SyncScenario::S6);

    let doctor = Doctor::new(classifier.git().clone(), Arc::new(MemoryRetryStore::new()));
    let report = doctor.auto_fix(&state, &suggest_fixes(&state)).await;
    assert!(report.is_success(), "{:?}", report.failed);

    assert_eq!(mirror.git(&["rev-parse", "HEAD"]), tip);
    assert_eq!(common::run_git(&mirror.core(), &["rev-parse", "main"]), tip);
    assert_eq!(classifier.detect().await.sync.scenario, SyncScenario::S1);
}

#[tokio::test]
async fn divergence_is_never_auto_applied() {
    let mirror = Mirror::new();
    mirror.commit("local.txt", "local");
    mirror.advance_remote(&mirror.core(), 1);
    mirror.mirror_core_to_hub();

    let classifier = mirror.classifier().await;
    let state = classifier.detect().await;
    let before = mirror.git(&["rev-parse", "HEAD"]);

    let doctor = Doctor::new(classifier.git().clone(), Arc::new(MemoryRetryStore::new()));
    let report = doctor.auto_fix(&state, &suggest_fixes(&state)).await;
    assert!(report.applied.is_empty());
    assert!(report.skipped.iter().any(|f| f.scenario() == "S4"));
    assert_eq!(mirror.git(&["rev-parse", "HEAD"]), before);
}
