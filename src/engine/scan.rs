//! engine::scan
//!
//! The classifier: orchestrates the detectors into one [`RepositoryState`].
//!
//! # Architecture
//!
//! Detection runs in three steps:
//!
//! 1. Existence. If there is no local copy, every other dimension is
//!    reported unknown or not applicable and detection stops.
//! 2. Two concurrent phases joined with `tokio::join!`: the remote phase
//!    (fetch, platform queries) and the local phase (working tree,
//!    corruption).
//! 3. Sync and branch topology, against the refs the fetch just updated.
//!
//! # Invariants
//!
//! - `detect` never fails. A detector error becomes a
//!   [`DetectionWarning`] and that dimension's unknown marker.
//! - Detection is read-only apart from fetching remote-tracking refs.
//! - Two detections of an unchanged repository are equal apart from
//!   `detected_at`.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use super::detectors::sync::SyncRemote;
use super::detectors::{corruption, sync, topology, worktree};
use super::probe::{FetchReport, RemoteProber};
use super::state::{
    BranchTopologyEntry, CorruptionState, DetectionWarning, Dimension, ExistenceState, PlatformInfo, RepositoryState,
    SyncScenario, SyncState, WarningKind, WorkingTreeState,
};
use crate::core::config::Config;
use crate::core::retry::{RetryMarkers, RetryStore};
use crate::core::types::{BranchName, RemoteRole};
use crate::git::{Git, GitError};
use crate::platform::{Platform, PlatformError};

/// Produces repository snapshots.
///
/// # Example
///
/// ```ignore
/// use syncdoctor::engine::Classifier;
///
/// let state = Classifier::new(git, config).with_fetch(false).detect().await;
/// println!("{:?}", state.scenario_ids());
/// ```
pub struct Classifier {
    git: Git,
    config: Config,
    platform: Option<Arc<dyn Platform>>,
    retry: Option<Arc<dyn RetryStore>>,
    fetch: bool,
}

impl Classifier {
    /// A classifier for `git`. Fetching follows the `fetch` config key.
    pub fn new(git: Git, config: Config) -> Self {
        let fetch = config.fetch_enabled();
        Self {
            git,
            config,
            platform: None,
            retry: None,
            fetch,
        }
    }

    /// Query the hub's hosting platform during detection.
    pub fn with_platform(mut self, platform: Arc<dyn Platform>) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Read retry markers from `store`.
    pub fn with_retry_store(mut self, store: Arc<dyn RetryStore>) -> Self {
        self.retry = Some(store);
        self
    }

    /// Override whether usable remotes are fetched first.
    pub fn with_fetch(mut self, fetch: bool) -> Self {
        self.fetch = fetch;
        self
    }

    /// The git handle detection runs against.
    pub fn git(&self) -> &Git {
        &self.git
    }

    /// Detect the current state of the repository.
    pub async fn detect(&self) -> RepositoryState {
        let mut warnings = Vec::new();
        let retry = self.load_retry(&mut warnings);
        let threshold = self.config.large_object_threshold();

        let prober = RemoteProber::new(&self.git, &self.config);
        let (existence, existence_warnings) = prober.detect_existence().await;
        warnings.extend(existence_warnings);

        if !existence.local_exists {
            debug!(scenario = existence.scenario.id(), "no local copy; skipping other dimensions");
            let state = RepositoryState {
                existence,
                working_tree: WorkingTreeState::unknown(),
                sync: SyncState::empty(SyncScenario::NotApplicable),
                topology: Vec::new(),
                corruption: CorruptionState::unknown(threshold),
                retry,
                platform: PlatformInfo::default(),
                warnings,
                detected_at: Utc::now(),
            };
            log_scenarios(&state);
            return state;
        }

        let paths = match self.git.paths().await {
            Ok(paths) => Some(paths),
            Err(e) => {
                warnings.push(DetectionWarning::from_git(Dimension::Corruption, &e));
                None
            }
        };

        let remote_phase = async {
            let report = if self.fetch {
                prober.fetch_remotes(&existence).await
            } else {
                FetchReport::default()
            };
            let platform = self.query_platform().await;
            (report, platform)
        };
        let local_phase = async {
            let working_tree = worktree::detect(&self.git).await;
            let corruption = corruption::detect(&self.git, paths.as_ref(), threshold).await;
            (working_tree, corruption)
        };
        let ((report, (mut platform, mut platform_warnings)), (working_tree, corruption)) =
            tokio::join!(remote_phase, local_phase);

        let working_tree = working_tree.unwrap_or_else(|e| {
            warnings.push(DetectionWarning::from_git(Dimension::WorkingTree, &e));
            WorkingTreeState::unknown()
        });
        let corruption = corruption.unwrap_or_else(|e| {
            warnings.push(DetectionWarning::from_git(Dimension::Corruption, &e));
            CorruptionState::unknown(threshold)
        });
        warnings.extend(report.warnings());

        let branch = self
            .resolve_branch(platform.default_branch.as_deref(), &existence, &working_tree)
            .await;

        let remotes: Vec<SyncRemote<'_>> = existence
            .usable_remotes()
            .into_iter()
            .map(|role| SyncRemote {
                role,
                name: existence.remote(role).name.as_str(),
            })
            .collect();
        let (sync, sync_warnings) = sync::detect(&self.git, &branch, &remotes, report.stale()).await;
        warnings.extend(sync_warnings);

        let configured = |role: RemoteRole| {
            let presence = existence.remote(role);
            presence.configured.then_some(presence.name.as_str())
        };
        let listed = topology::detect(
            &self.git,
            configured(RemoteRole::Core),
            configured(RemoteRole::Hub),
        )
        .await;
        let topology = topology_or_unknown(listed, &branch, &mut warnings);

        if let Some(p) = &self.platform {
            platform.branch_protected =
                platform_answer(p.is_branch_protected(branch.as_str()).await, &mut platform_warnings);
        }
        warnings.extend(platform_warnings);

        let state = RepositoryState {
            existence,
            working_tree,
            sync,
            topology,
            corruption,
            retry,
            platform,
            warnings,
            detected_at: Utc::now(),
        };
        log_scenarios(&state);
        state
    }

    fn load_retry(&self, warnings: &mut Vec<DetectionWarning>) -> RetryMarkers {
        let Some(store) = &self.retry else {
            return RetryMarkers::default();
        };
        match store.load() {
            Ok(markers) => markers,
            Err(e) => {
                warn!(error = %e, "could not read retry markers");
                warnings.push(DetectionWarning {
                    dimension: Dimension::Sync,
                    kind: WarningKind::Failed,
                    message: e.to_string(),
                });
                RetryMarkers::default()
            }
        }
    }

    async fn query_platform(&self) -> (PlatformInfo, Vec<DetectionWarning>) {
        let mut warnings = Vec::new();
        let Some(platform) = &self.platform else {
            return (PlatformInfo::default(), warnings);
        };
        let (default_branch, can_admin) =
            tokio::join!(platform.default_branch(), platform.can_admin());
        let info = PlatformInfo {
            default_branch: platform_answer(default_branch, &mut warnings),
            branch_protected: None,
            can_admin: platform_answer(can_admin, &mut warnings),
        };
        (info, warnings)
    }

    /// Config, then platform default, then `<core>/HEAD`, then the current
    /// branch, then `main`.
    async fn resolve_branch(
        &self,
        platform_default: Option<&str>,
        existence: &ExistenceState,
        working_tree: &WorkingTreeState,
    ) -> BranchName {
        let configured = self
            .config
            .default_branch()
            .and_then(|b| BranchName::new(b).ok());
        if let Some(branch) = configured {
            return branch;
        }
        if let Some(branch) = platform_default.and_then(|b| BranchName::new(b).ok()) {
            return branch;
        }
        if existence.core.configured {
            if let Ok(Some(branch)) = self.git.remote_head_branch(&existence.core.name).await {
                return branch;
            }
        }
        if let Some(branch) = &working_tree.current_branch {
            return branch.clone();
        }
        BranchName::fallback()
    }
}

/// Map a platform answer to an option, recording a warning unless the
/// platform simply does not support the question.
fn platform_answer<T>(
    result: Result<T, PlatformError>,
    warnings: &mut Vec<DetectionWarning>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(PlatformError::Unsupported(_)) => None,
        Err(e) => {
            let kind = match &e {
                PlatformError::AuthFailed(_) => WarningKind::Auth,
                PlatformError::NotFound(_) => WarningKind::NotFound,
                _ => WarningKind::Failed,
            };
            debug!(error = %e, "platform query failed");
            warnings.push(DetectionWarning {
                dimension: Dimension::Platform,
                kind,
                message: e.to_string(),
            });
            None
        }
    }
}

/// Listed entries, or one unknown entry for the sync branch so a failed
/// listing never reads as "no other branches".
fn topology_or_unknown(
    listed: Result<Vec<BranchTopologyEntry>, GitError>,
    branch: &BranchName,
    warnings: &mut Vec<DetectionWarning>,
) -> Vec<BranchTopologyEntry> {
    match listed {
        Ok(entries) => entries,
        Err(e) => {
            warn!(error = %e, "could not list branches");
            warnings.push(DetectionWarning::from_git(Dimension::Topology, &e));
            vec![BranchTopologyEntry::unknown(branch.as_str())]
        }
    }
}

fn log_scenarios(state: &RepositoryState) {
    info!(
        existence = state.existence.scenario.id(),
        working_tree = state.working_tree.scenario.id(),
        sync = state.sync.scenario.id(),
        corruption = state.corruption.scenario.id(),
        branches = state.topology.len(),
        warnings = state.warnings.len(),
        "classified repository"
    );
}
