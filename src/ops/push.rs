//! ops::push
//!
//! Push one local branch to the same name on one remote. Never forces.

use serde::{Deserialize, Serialize};

use super::fetch::require_usable;
use super::OperationError;
use crate::core::types::{BranchName, RefName, RemoteRole};
use crate::engine::state::{PairStatus, RepositoryState};
use crate::git::Git;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushOp {
    pub role: RemoteRole,
    pub remote: String,
    pub branch: BranchName,
}

impl PushOp {
    pub fn new(role: RemoteRole, remote: impl Into<String>, branch: BranchName) -> Self {
        Self {
            role,
            remote: remote.into(),
            branch,
        }
    }

    /// Snapshot checks: remote usable, and for the sync branch the pair is
    /// not diverged.
    pub(super) fn validate_static(&self, state: &RepositoryState) -> Result<(), OperationError> {
        require_usable(state, self.role, &self.remote)?;
        if state.sync.branch.as_ref() == Some(&self.branch)
            && state.sync.local_vs(self.role).status == PairStatus::Diverged
        {
            return Err(OperationError::Validation(format!(
                "'{}' has diverged from {}; a push would be rejected",
                self.branch, self.remote
            )));
        }
        Ok(())
    }

    /// Snapshot checks plus: the branch exists locally, and the remote's
    /// last known tip is contained in it.
    pub(super) async fn validate(
        &self,
        state: &RepositoryState,
        git: &Git,
    ) -> Result<(), OperationError> {
        self.validate_static(state)?;

        let local = RefName::for_branch(&self.branch);
        if git.resolve_ref(local.as_str()).await?.is_none() {
            return Err(OperationError::Validation(format!(
                "branch '{}' does not exist locally",
                self.branch
            )));
        }

        let tracking = RefName::for_remote_branch(&self.remote, &self.branch)
            .map_err(|e| OperationError::Validation(e.to_string()))?;
        if git.resolve_ref(tracking.as_str()).await?.is_some()
            && !git.is_ancestor(tracking.as_str(), local.as_str()).await?
        {
            return Err(OperationError::Validation(format!(
                "{}/{} has commits that '{}' lacks; a push would not fast-forward",
                self.remote, self.branch, self.branch
            )));
        }
        Ok(())
    }

    pub(super) async fn execute(&self, git: &Git) -> Result<(), OperationError> {
        git.push(&self.remote, &self.branch).await?;
        Ok(())
    }

    pub(super) fn rollback(&self) -> Result<(), OperationError> {
        Err(OperationError::Refused(format!(
            "a push to {} cannot be undone automatically",
            self.remote
        )))
    }

    pub(super) fn describe(&self) -> String {
        format!("push {} to {}", self.branch, self.remote)
    }
}
