//! End-to-end classification against real repositories.

mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use common::{executor, path_str, Mirror};
use syncdoctor::core::config::{Config, ConfigFile, RemotesConfig};
use syncdoctor::core::types::RemoteRole;
use syncdoctor::doctor::{suggest_fixes, PLATFORM_PROTECTED};
use syncdoctor::engine::state::{
    Dimension, ExistenceScenario, PairStatus, SyncScenario, TopologyScenario, WarningKind,
    WorkingTreeScenario,
};
use syncdoctor::engine::Classifier;
use syncdoctor::git::exec::{Executor, ExecutorConfig};
use syncdoctor::git::{Deadlines, Git};
use syncdoctor::ops::Operation;
use syncdoctor::platform::mock::MockPlatform;
use syncdoctor::platform::PlatformError;

#[tokio::test]
async fn fully_synced_needs_no_sync_fix() {
    let mirror = Mirror::new();
    let state = mirror.classifier().await.detect().await;

    assert_eq!(state.existence.scenario, ExistenceScenario::E1);
    assert_eq!(state.working_tree.scenario, WorkingTreeScenario::W1);
    assert_eq!(state.sync.scenario, SyncScenario::S1);
    assert!(!state.sync.partial);
    assert_eq!(state.corruption.scenario.id(), "C1");
    assert!(state.warnings.is_empty(), "{:?}", state.warnings);

    let fixes = suggest_fixes(&state);
    assert!(fixes.iter().all(|f| f.dimension() != Dimension::Sync));
}

#[tokio::test]
async fn detect_is_idempotent() {
    let mirror = Mirror::new();
    mirror.commit("a.txt", "a");
    std::fs::write(mirror.work().join("scratch.txt"), "untracked\n").unwrap();

    let classifier = mirror.classifier().await;
    let first = classifier.detect().await;
    let mut second = classifier.detect().await;

    assert_eq!(first.fingerprint(), second.fingerprint());
    second.detected_at = first.detected_at;
    assert_eq!(first, second);
}

#[tokio::test]
async fn partial_ahead_when_hub_not_configured() {
    let mirror = Mirror::new();
    mirror.git(&["remote", "remove", "hub"]);
    for i in 0..3 {
        mirror.commit(&format!("f{}.txt", i), &format!("commit {}", i));
    }

    let state = mirror.classifier().await.detect().await;

    assert_eq!(state.existence.scenario, ExistenceScenario::E2);
    assert!(!state.existence.hub.configured);
    assert_eq!(state.sync.scenario, SyncScenario::S2);
    assert!(state.sync.partial);
    assert_eq!(state.sync.compared_remote, Some(RemoteRole::Core));
    assert_eq!(state.sync.local_core.status, PairStatus::Ahead);
    assert_eq!(state.sync.local_core.ahead, 3);
    assert_eq!(state.sync.hub_tip, None);
    assert_eq!(
        (state.sync.local_hub.ahead, state.sync.local_hub.behind),
        (0, 0)
    );
    assert_eq!(
        (state.sync.core_hub.ahead, state.sync.core_hub.behind),
        (0, 0)
    );

    let pushes: Vec<_> = suggest_fixes(&state)
        .iter()
        .filter_map(|f| f.operation().cloned())
        .flat_map(|op| op.pushed_remotes())
        .collect();
    assert_eq!(pushes, vec![RemoteRole::Core]);
}

#[tokio::test]
async fn true_divergence_suggests_only_manual_merge() {
    let mirror = Mirror::new();
    mirror.commit("local-1.txt", "local 1");
    mirror.commit("local-2.txt", "local 2");
    mirror.advance_remote(&mirror.core(), 1);
    mirror.mirror_core_to_hub();

    let state = mirror.classifier().await.detect().await;

    assert_eq!(state.sync.scenario, SyncScenario::S4);
    assert_eq!(state.sync.local_core.status, PairStatus::Diverged);
    assert_eq!((state.sync.local_core.ahead, state.sync.local_core.behind), (2, 1));

    let sync_fixes: Vec<_> = suggest_fixes(&state)
        .into_iter()
        .filter(|f| f.dimension() == Dimension::Sync)
        .collect();
    assert_eq!(sync_fixes.len(), 1);
    assert!(!sync_fixes[0].auto_fixable());
    assert!(sync_fixes[0].operation().is_none());
}

#[tokio::test]
async fn hub_behind_after_core_only_push() {
    let mirror = Mirror::new();
    mirror.commit("a.txt", "a");
    mirror.git(&["push", "--quiet", "origin", "main"]);

    let state = mirror.classifier().await.detect().await;
    assert_eq!(state.sync.scenario, SyncScenario::S5);

    let fixes = suggest_fixes(&state);
    let ops: Vec<&Operation> = fixes.iter().filter_map(|f| f.operation()).collect();
    assert_eq!(ops.len(), 1);
    assert_eq!(ops[0].pushed_remotes(), vec![RemoteRole::Hub]);
}

#[tokio::test]
async fn topology_maps_branches_across_locations() {
    let mirror = Mirror::new();
    mirror.git(&["branch", "feature"]);
    mirror.git(&["push", "--quiet", "origin", "feature"]);
    mirror.git(&["branch", "scratch"]);

    let state = mirror.classifier().await.detect().await;
    let find = |name: &str| {
        state
            .topology
            .iter()
            .find(|t| t.branch == name)
            .map(|t| t.scenario)
    };
    assert_eq!(find("main"), Some(TopologyScenario::B1));
    assert_eq!(find("feature"), Some(TopologyScenario::B2));
    assert_eq!(find("scratch"), Some(TopologyScenario::B4));
}

#[tokio::test]
async fn unreachable_hub_is_reported_not_fatal() {
    let mirror = Mirror::new();
    let missing = mirror.root().join("gone.git");
    mirror.git(&["remote", "set-url", "hub", path_str(&missing)]);

    let state = mirror.classifier().await.detect().await;
    assert_eq!(state.existence.scenario, ExistenceScenario::E2);
    assert!(state.existence.hub.configured);
    assert!(!state.existence.hub.reachable);
    assert!(state.sync.partial);
    assert_eq!(state.sync.scenario, SyncScenario::S1);
    assert!(!state.warnings.is_empty());
}

#[tokio::test]
async fn missing_local_copy_probes_configured_urls() {
    let mirror = Mirror::new();
    let empty = tempfile::TempDir::new().unwrap();
    let config = Config::with_repo(ConfigFile {
        remotes: Some(RemotesConfig {
            core_url: Some(path_str(&mirror.core()).to_string()),
            hub_url: Some(path_str(&mirror.hub()).to_string()),
            ..Default::default()
        }),
        ..Default::default()
    });

    let git = Git::at(executor(), &empty.path().join("checkout"), Deadlines::default());
    let state = Classifier::new(git, config).detect().await;

    assert_eq!(state.existence.scenario, ExistenceScenario::E5);
    assert_eq!(state.sync.scenario, SyncScenario::NotApplicable);
    assert_eq!(state.working_tree.scenario, WorkingTreeScenario::Unknown);

    let fixes = suggest_fixes(&state);
    assert!(fixes[0].command().unwrap_or_default().starts_with("git clone"));
}

#[tokio::test]
async fn platform_facts_flow_into_state() {
    let mirror = Mirror::new();
    let platform = MockPlatform::new("main").protect("main").admin(false);
    let state = mirror
        .classifier()
        .await
        .with_platform(Arc::new(platform.clone()))
        .detect()
        .await;

    assert_eq!(state.platform.default_branch.as_deref(), Some("main"));
    assert_eq!(state.platform.branch_protected, Some(true));
    assert_eq!(state.platform.can_admin, Some(false));
    assert!(platform.calls().contains(&"is_branch_protected(main)".to_string()));
    assert!(suggest_fixes(&state)
        .iter()
        .any(|f| f.scenario() == PLATFORM_PROTECTED));
}

#[tokio::test]
async fn platform_failure_degrades_to_unknown() {
    let mirror = Mirror::new();
    let platform = MockPlatform::failing(PlatformError::Network("offline".into()));
    let state = mirror
        .classifier()
        .await
        .with_platform(Arc::new(platform))
        .detect()
        .await;

    assert_eq!(state.platform.default_branch, None);
    assert_eq!(state.platform.branch_protected, None);
    assert_eq!(state.sync.scenario, SyncScenario::S1);
    assert!(state.warnings_for(Dimension::Platform).count() >= 1);
}

#[tokio::test]
async fn failed_fetch_marks_remote_stale_and_suggests_fetch() {
    let mirror = Mirror::new();
    mirror.advance_remote(&mirror.hub(), 1);
    // A held ref lock makes the hub fetch fail while ls-remote still works.
    let tracking = mirror.work().join(".git/refs/remotes/hub");
    std::fs::create_dir_all(&tracking).unwrap();
    std::fs::write(tracking.join("main.lock"), "").unwrap();

    let state = mirror.classifier().await.detect().await;

    assert!(state.existence.hub.reachable);
    assert_eq!(state.sync.stale, vec![RemoteRole::Hub]);
    assert!(
        state.warnings.iter().any(|w| w.dimension == Dimension::Sync),
        "{:?}",
        state.warnings
    );

    let fixes = suggest_fixes(&state);
    let fetch = fixes
        .iter()
        .find_map(|f| match f.operation() {
            Some(Operation::Fetch(op)) => Some(op.clone()),
            _ => None,
        })
        .expect("expected a fetch suggestion");
    assert_eq!(fetch.role, RemoteRole::Hub);
    assert_eq!(fetch.remote, "hub");
}

#[cfg(unix)]
#[tokio::test]
async fn credential_prompt_fails_fast_as_auth() {
    use std::os::unix::fs::PermissionsExt;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(401).insert_header("WWW-Authenticate", "Basic realm=\"mirror\""),
        )
        .mount(&server)
        .await;

    let mirror = Mirror::new();
    mirror.git(&["remote", "set-url", "hub", &format!("{}/mirror.git", server.uri())]);

    // An askpass helper that would block if git ever ran it.
    let marker = mirror.root().join("askpass-ran");
    let askpass = mirror.root().join("askpass.sh");
    std::fs::write(
        &askpass,
        format!("#!/bin/sh\ntouch '{}'\nsleep 30\n", path_str(&marker)),
    )
    .unwrap();
    std::fs::set_permissions(&askpass, std::fs::Permissions::from_mode(0o755)).unwrap();
    mirror.git(&["config", "core.askPass", path_str(&askpass)]);

    let executor = Executor::new(ExecutorConfig {
        extra_env: vec![
            ("GIT_CONFIG_NOSYSTEM".to_string(), "1".to_string()),
            ("GIT_CONFIG_GLOBAL".to_string(), "/dev/null".to_string()),
        ],
        ..Default::default()
    });
    let git = Git::open(executor, &mirror.work(), Deadlines::default())
        .await
        .unwrap();

    let started = Instant::now();
    let state = Classifier::new(git, Config::default()).detect().await;

    assert!(started.elapsed() < Duration::from_secs(10), "{:?}", started.elapsed());
    assert!(!marker.exists());
    assert!(state.existence.core.reachable);
    assert!(!state.existence.hub.reachable);
    assert!(
        state.warnings.iter().any(|w| w.kind == WarningKind::Auth),
        "{:?}",
        state.warnings
    );
}
