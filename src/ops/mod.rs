//! ops
//!
//! Validated mutation primitives used by auto-repair.
//!
//! # Safety model
//!
//! Every operation is plain serializable data. Nothing happens until
//! [`Operation::validate`] has passed against both the snapshot and the live
//! repository, and [`Operation::execute`] is called with a [`Git`] handle.
//!
//! - `Fetch` only updates remote-tracking refs.
//! - `Push` never forces; a non-fast-forward is rejected by the remote.
//! - `Reset` only moves a branch forward. Its ancestry check runs in
//!   `validate` and again right before `reset --keep`, so a commit that
//!   exists only locally is never discarded.
//! - `Composite` runs steps in order and never rolls back.
//!
//! Rollback is deliberately narrow: only `Fetch` can be "undone" (it is a
//! no-op). Everything else refuses and tells the user how to recover.

mod composite;
mod fetch;
mod push;
mod reset;

pub use composite::CompositeOp;
pub use fetch::FetchOp;
pub use push::PushOp;
pub use reset::ResetOp;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::types::RemoteRole;
use crate::engine::state::RepositoryState;
use crate::git::{Git, GitError};

/// Errors from validating or executing an operation.
#[derive(Debug, Error)]
pub enum OperationError {
    /// A precondition does not hold. Never retried.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The underlying git command failed.
    #[error(transparent)]
    Git(#[from] GitError),

    /// The operation refuses to do this (e.g. rollback of a push).
    #[error("refused: {0}")]
    Refused(String),

    /// One step of a composite failed.
    #[error("step {} ({description}) failed: {source}", .index + 1)]
    Step {
        index: usize,
        description: String,
        #[source]
        source: Box<OperationError>,
    },
}

impl OperationError {
    /// Only deadline expiries are worth retrying unchanged.
    pub fn is_retryable(&self) -> bool {
        match self {
            OperationError::Git(e) => e.is_timeout(),
            OperationError::Step { source, .. } => source.is_retryable(),
            OperationError::Validation(_) | OperationError::Refused(_) => false,
        }
    }

    /// Whether git got as far as running the mutation.
    pub fn is_execution_failure(&self) -> bool {
        match self {
            OperationError::Git(_) => true,
            OperationError::Step { source, .. } => source.is_execution_failure(),
            OperationError::Validation(_) | OperationError::Refused(_) => false,
        }
    }
}

/// A repair step.
///
/// # Example
///
/// ```
/// use syncdoctor::core::types::{BranchName, RemoteRole};
/// use syncdoctor::ops::{Operation, PushOp};
///
/// let op = Operation::Push(PushOp::new(RemoteRole::Hub, "hub", BranchName::new("main").unwrap()));
/// assert_eq!(op.describe(), "push main to hub");
/// assert_eq!(op.pushed_remotes(), vec![RemoteRole::Hub]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Operation {
    Fetch(FetchOp),
    Push(PushOp),
    Reset(ResetOp),
    Composite(CompositeOp),
}

impl Operation {
    /// Check preconditions against the snapshot and the live repository.
    pub async fn validate(&self, state: &RepositoryState, git: &Git) -> Result<(), OperationError> {
        match self {
            Operation::Fetch(op) => op.validate(state),
            Operation::Push(op) => op.validate(state, git).await,
            Operation::Reset(op) => op.validate(git).await,
            Operation::Composite(op) => Box::pin(op.validate(state, git)).await,
        }
    }

    /// Validation for a step that runs after earlier composite steps: the
    /// snapshot checks plus the live checks earlier steps cannot invalidate.
    /// Ancestry is left to `execute`, which re-checks it.
    pub(crate) async fn validate_deferred(
        &self,
        state: &RepositoryState,
        git: &Git,
    ) -> Result<(), OperationError> {
        match self {
            Operation::Fetch(op) => op.validate(state),
            Operation::Push(op) => op.validate_static(state),
            Operation::Reset(op) => op.validate_worktree(git).await,
            Operation::Composite(op) => {
                for step in &op.steps {
                    Box::pin(step.validate_deferred(state, git)).await?;
                }
                Ok(())
            }
        }
    }

    /// Perform the operation.
    pub async fn execute(&self, git: &Git) -> Result<(), OperationError> {
        match self {
            Operation::Fetch(op) => op.execute(git).await,
            Operation::Push(op) => op.execute(git).await,
            Operation::Reset(op) => op.execute(git).await,
            Operation::Composite(op) => Box::pin(op.execute(git)).await,
        }
    }

    /// Undo the operation, where that is possible at all.
    pub async fn rollback(&self, git: &Git) -> Result<(), OperationError> {
        match self {
            Operation::Fetch(op) => op.rollback(git).await,
            Operation::Push(op) => op.rollback(),
            Operation::Reset(op) => op.rollback(),
            Operation::Composite(op) => op.rollback(),
        }
    }

    /// One-line human description.
    pub fn describe(&self) -> String {
        match self {
            Operation::Fetch(op) => op.describe(),
            Operation::Push(op) => op.describe(),
            Operation::Reset(op) => op.describe(),
            Operation::Composite(op) => op.describe(),
        }
    }

    /// Remotes this operation pushes to, in step order.
    pub fn pushed_remotes(&self) -> Vec<RemoteRole> {
        match self {
            Operation::Push(op) => vec![op.role],
            Operation::Composite(op) => {
                let mut roles = Vec::new();
                for role in op.steps.iter().flat_map(Operation::pushed_remotes) {
                    if !roles.contains(&role) {
                        roles.push(role);
                    }
                }
                roles
            }
            Operation::Fetch(_) | Operation::Reset(_) => Vec::new(),
        }
    }

    /// The remote whose push produced `err`, if a push was attempted and failed.
    pub fn failed_push(&self, err: &OperationError) -> Option<RemoteRole> {
        match (self, err) {
            (Operation::Push(op), OperationError::Git(_)) => Some(op.role),
            (Operation::Composite(op), OperationError::Step { index, source, .. }) => {
                op.steps.get(*index).and_then(|step| step.failed_push(source))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::BranchName;
    use std::time::Duration;

    fn main() -> BranchName {
        BranchName::new("main").unwrap()
    }

    fn timeout() -> OperationError {
        OperationError::Git(GitError::Timeout {
            command: "push".into(),
            deadline: Duration::from_secs(60),
        })
    }

    #[test]
    fn only_timeouts_are_retryable() {
        assert!(timeout().is_retryable());
        assert!(!OperationError::Validation("dirty".into()).is_retryable());
        assert!(!OperationError::Git(GitError::Auth {
            command: "push".into(),
            message: "denied".into()
        })
        .is_retryable());
        let wrapped = OperationError::Step {
            index: 1,
            description: "push".into(),
            source: Box::new(timeout()),
        };
        assert!(wrapped.is_retryable());
    }

    #[test]
    fn composite_reports_push_remotes() {
        let op = Operation::Composite(CompositeOp::new(vec![
            Operation::Reset(ResetOp::new(main(), RemoteRole::Hub, "hub").unwrap()),
            Operation::Push(PushOp::new(RemoteRole::Core, "origin", main())),
        ]));
        assert_eq!(op.pushed_remotes(), vec![RemoteRole::Core]);
        assert_eq!(
            op.describe(),
            "fast-forward main to hub/main, then push main to origin"
        );
    }

    #[test]
    fn failed_push_follows_composite_step() {
        let op = Operation::Composite(CompositeOp::new(vec![
            Operation::Reset(ResetOp::new(main(), RemoteRole::Core, "origin").unwrap()),
            Operation::Push(PushOp::new(RemoteRole::Hub, "hub", main())),
        ]));
        let reset_failed = OperationError::Step {
            index: 0,
            description: "reset".into(),
            source: Box::new(OperationError::Validation("diverged".into())),
        };
        assert_eq!(op.failed_push(&reset_failed), None);
        let push_failed = OperationError::Step {
            index: 1,
            description: "push".into(),
            source: Box::new(timeout()),
        };
        assert_eq!(op.failed_push(&push_failed), Some(RemoteRole::Hub));
    }

    #[test]
    fn operations_serialize_tagged() {
        let op = Operation::Fetch(FetchOp::new(RemoteRole::Core, "origin"));
        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(json["kind"], "fetch");
        assert_eq!(json["role"], "core");
        assert_eq!(json["remote"], "origin");
    }
}
