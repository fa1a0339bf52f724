//! ops::reset
//!
//! Fast-forward the checked-out branch to a remote-tracking ref.
//!
//! # Invariants
//!
//! The branch tip must be an ancestor of the target. This is checked in
//! [`ResetOp::validate`] and again in [`ResetOp::execute`] immediately
//! before `git reset --keep`; if either check fails nothing is moved. A
//! reset that would drop a commit reachable only from the local branch is
//! always refused, and the error says how many commits are at stake.

use serde::{Deserialize, Serialize};

use super::OperationError;
use crate::core::types::{BranchName, RefName, RemoteRole, TypeError};
use crate::git::Git;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetOp {
    pub branch: BranchName,
    /// Remote whose tracking ref is the target.
    pub source: RemoteRole,
    /// Remote-tracking ref to move to, e.g. `refs/remotes/hub/main`.
    pub target: RefName,
}

impl ResetOp {
    /// Reset `branch` to `refs/remotes/<remote>/<branch>`.
    ///
    /// # Errors
    ///
    /// Fails when `remote` cannot form a valid ref name.
    pub fn new(branch: BranchName, source: RemoteRole, remote: &str) -> Result<Self, TypeError> {
        let target = RefName::for_remote_branch(remote, &branch)?;
        Ok(Self {
            branch,
            source,
            target,
        })
    }

    fn short_target(&self) -> &str {
        self.target
            .strip_prefix("refs/remotes/")
            .unwrap_or(self.target.as_str())
    }

    /// Live checks: clean tracked files, HEAD on the branch, fast-forward.
    pub(super) async fn validate(&self, git: &Git) -> Result<(), OperationError> {
        self.validate_worktree(git).await?;
        self.check_fast_forward(git).await
    }

    /// The live checks no fetch or push can change: clean tracked files and
    /// HEAD on the branch.
    pub(super) async fn validate_worktree(&self, git: &Git) -> Result<(), OperationError> {
        let status = git.status().await?;
        if !status.is_clean_tracked() {
            return Err(OperationError::Validation(
                "working tree has staged or unstaged changes".to_string(),
            ));
        }
        self.check_head(git).await
    }

    pub(super) async fn execute(&self, git: &Git) -> Result<(), OperationError> {
        self.check_head(git).await?;
        self.check_fast_forward(git).await?;
        git.reset_keep(self.target.as_str()).await?;
        Ok(())
    }

    pub(super) fn rollback(&self) -> Result<(), OperationError> {
        Err(OperationError::Refused(format!(
            "restore the previous tip of '{}' with `git reset --keep HEAD@{{1}}` (see `git reflog`)",
            self.branch
        )))
    }

    pub(super) fn describe(&self) -> String {
        format!("fast-forward {} to {}", self.branch, self.short_target())
    }

    async fn check_head(&self, git: &Git) -> Result<(), OperationError> {
        match git.current_branch().await? {
            Some(current) if current == self.branch => Ok(()),
            Some(current) => Err(OperationError::Validation(format!(
                "HEAD is on '{}', not '{}'",
                current, self.branch
            ))),
            None => Err(OperationError::Validation(format!(
                "HEAD is detached, not on '{}'",
                self.branch
            ))),
        }
    }

    async fn check_fast_forward(&self, git: &Git) -> Result<(), OperationError> {
        let local = RefName::for_branch(&self.branch);
        let (local_ref, target) = (local.as_str(), self.target.as_str());
        if git.resolve_ref(target).await?.is_none() {
            return Err(OperationError::Validation(format!(
                "{} does not exist",
                self.short_target()
            )));
        }
        if git.resolve_ref(local_ref).await?.is_none() {
            return Err(OperationError::Validation(format!(
                "branch '{}' does not exist locally",
                self.branch
            )));
        }
        if git.is_ancestor(local_ref, target).await? {
            return Ok(());
        }
        let local_only = git.count_exclusive(local_ref, target).await?;
        Err(OperationError::Validation(format!(
            "'{}' has {} commit(s) not in {}; resetting would discard them",
            self.branch,
            local_only,
            self.short_target()
        )))
    }
}
