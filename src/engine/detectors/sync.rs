//! engine::detectors::sync
//!
//! Commit graph comparison of the sync branch across local, core and hub.
//!
//! # Algorithm
//!
//! 1. Resolve the tip of `refs/heads/<branch>` and of
//!    `refs/remotes/<remote>/<branch>` for each usable remote.
//! 2. Compare each pair with `rev-list --left-right --count a...b`.
//! 3. Look the status triple up in the sync table. With one usable remote
//!    the reduced comparison is used and the state is marked partial.
//!
//! A remote without the branch is compared as an empty history, so a local
//! branch never pushed there reads as ahead by its full length.

use crate::core::types::{BranchName, Oid, RefName, RemoteRole};
use crate::engine::state::{
    DetectionWarning, Dimension, PairComparison, PairStatus, SyncScenario, SyncState, WarningKind,
};
use crate::engine::tables;
use crate::git::{AheadBehind, Git, GitError};

/// A remote taking part in the comparison.
#[derive(Debug, Clone, Copy)]
pub struct SyncRemote<'a> {
    pub role: RemoteRole,
    pub name: &'a str,
}

/// Compare `branch` across local and the given usable remotes.
///
/// Never fails: a comparison that errors becomes an unknown pair plus a
/// warning, and the scenario falls to `S_UNKNOWN`.
pub async fn detect(
    git: &Git,
    branch: &BranchName,
    remotes: &[SyncRemote<'_>],
    stale: Vec<RemoteRole>,
) -> (SyncState, Vec<DetectionWarning>) {
    let mut warnings = Vec::new();
    let mut state = SyncState::empty(SyncScenario::NotApplicable);
    state.branch = Some(branch.clone());
    state.stale = stale;

    if remotes.is_empty() {
        return (state, warnings);
    }

    let local_tip = match git.resolve_ref(RefName::for_branch(branch).as_str()).await {
        Ok(Some(tip)) => tip,
        Ok(None) => {
            warnings.push(DetectionWarning {
                dimension: Dimension::Sync,
                kind: WarningKind::NotFound,
                message: format!("branch '{}' does not exist locally", branch),
            });
            state.scenario = SyncScenario::Unknown;
            return (state, warnings);
        }
        Err(e) => {
            warnings.push(DetectionWarning::from_git(Dimension::Sync, &e));
            state.scenario = SyncScenario::Unknown;
            return (state, warnings);
        }
    };

    let mut unresolved = Vec::new();
    for remote in remotes {
        let tip = match RefName::for_remote_branch(remote.name, branch) {
            Ok(refname) => git.resolve_ref(refname.as_str()).await,
            Err(e) => Err(e.into()),
        };
        let tip = match tip {
            Ok(tip) => tip,
            Err(e) => {
                warnings.push(DetectionWarning::from_git(Dimension::Sync, &e));
                unresolved.push(remote.role);
                None
            }
        };
        match remote.role {
            RemoteRole::Core => state.core_tip = tip,
            RemoteRole::Hub => state.hub_tip = tip,
        }
    }
    state.local_tip = Some(local_tip.clone());

    for remote in remotes {
        let pair = if unresolved.contains(&remote.role) {
            PairComparison::unknown()
        } else {
            compare(git, Some(&local_tip), state.remote_tip(remote.role), &mut warnings).await
        };
        match remote.role {
            RemoteRole::Core => state.local_core = pair,
            RemoteRole::Hub => state.local_hub = pair,
        }
    }

    if remotes.len() >= 2 {
        state.core_hub = if unresolved.is_empty() {
            compare(
                git,
                state.core_tip.as_ref(),
                state.hub_tip.as_ref(),
                &mut warnings,
            )
            .await
        } else {
            PairComparison::unknown()
        };
        state.scenario = tables::sync(
            state.local_core.status,
            state.local_hub.status,
            state.core_hub.status,
        );
    } else {
        let role = remotes[0].role;
        state.partial = true;
        state.compared_remote = Some(role);
        state.scenario = tables::sync_partial(state.local_vs(role).status);
    }

    (state, warnings)
}

async fn compare(
    git: &Git,
    left: Option<&Oid>,
    right: Option<&Oid>,
    warnings: &mut Vec<DetectionWarning>,
) -> PairComparison {
    match compare_tips(git, left, right).await {
        Ok(pair) => pair,
        Err(e) => {
            warnings.push(DetectionWarning::from_git(Dimension::Sync, &e));
            PairComparison::unknown()
        }
    }
}

/// Compare two tips, treating a missing tip as an empty history.
async fn compare_tips(
    git: &Git,
    left: Option<&Oid>,
    right: Option<&Oid>,
) -> Result<PairComparison, GitError> {
    let counts = match (left, right) {
        (Some(l), Some(r)) if l == r => AheadBehind::default(),
        (Some(l), Some(r)) => git.ahead_behind(l, r).await?,
        (Some(l), None) => AheadBehind {
            ahead: git.count_commits(l.as_str()).await?,
            behind: 0,
        },
        (None, Some(r)) => AheadBehind {
            ahead: 0,
            behind: git.count_commits(r.as_str()).await?,
        },
        (None, None) => AheadBehind::default(),
    };
    Ok(PairComparison::from(counts))
}

/// The remote holding the newest tip when the history is linear (S12).
///
/// Core is newest iff core is ahead of hub.
pub fn newest_remote(state: &SyncState) -> RemoteRole {
    if state.core_hub.status == PairStatus::Ahead {
        RemoteRole::Core
    } else {
        RemoteRole::Hub
    }
}
