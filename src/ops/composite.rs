//! ops::composite
//!
//! An ordered sequence of operations.

use serde::{Deserialize, Serialize};

use super::{Operation, OperationError};
use crate::engine::state::RepositoryState;
use crate::git::Git;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeOp {
    pub steps: Vec<Operation>,
    pub stop_on_error: bool,
}

impl CompositeOp {
    /// Steps that stop at the first failure.
    pub fn new(steps: Vec<Operation>) -> Self {
        Self {
            steps,
            stop_on_error: true,
        }
    }

    /// The first step is validated fully. A later step's ancestry depends on
    /// what earlier steps leave behind, so it gets the snapshot checks and the
    /// live worktree checks here, and its ancestry check when it executes.
    /// A fast-forward must come before any push of the same branch.
    pub(super) async fn validate(
        &self,
        state: &RepositoryState,
        git: &Git,
    ) -> Result<(), OperationError> {
        let Some((first, rest)) = self.steps.split_first() else {
            return Err(OperationError::Validation("composite has no steps".to_string()));
        };
        self.check_order()?;
        first.validate(state, git).await.map_err(|e| step_error(0, first, e))?;
        for (offset, step) in rest.iter().enumerate() {
            step.validate_deferred(state, git)
                .await
                .map_err(|e| step_error(offset + 1, step, e))?;
        }
        Ok(())
    }

    /// Pushing a branch and then moving it would publish the old tip.
    fn check_order(&self) -> Result<(), OperationError> {
        let mut pushed = Vec::new();
        for (index, step) in self.steps.iter().enumerate() {
            match step {
                Operation::Push(op) => pushed.push(&op.branch),
                Operation::Reset(op) if pushed.contains(&&op.branch) => {
                    return Err(step_error(
                        index,
                        step,
                        OperationError::Validation(format!(
                            "fast-forward of '{}' must come before pushing it",
                            op.branch
                        )),
                    ));
                }
                _ => {}
            }
        }
        Ok(())
    }

    pub(super) async fn execute(&self, git: &Git) -> Result<(), OperationError> {
        let mut first_error = None;
        for (index, step) in self.steps.iter().enumerate() {
            if let Err(e) = step.execute(git).await {
                let err = step_error(index, step, e);
                if self.stop_on_error {
                    return Err(err);
                }
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    pub(super) fn rollback(&self) -> Result<(), OperationError> {
        Err(OperationError::Refused(
            "manual intervention required to undo a multi-step repair".to_string(),
        ))
    }

    pub(super) fn describe(&self) -> String {
        self.steps
            .iter()
            .map(Operation::describe)
            .collect::<Vec<_>>()
            .join(", then ")
    }
}

fn step_error(index: usize, step: &Operation, source: OperationError) -> OperationError {
    OperationError::Step {
        index,
        description: step.describe(),
        source: Box::new(source),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{BranchName, RemoteRole};
    use crate::ops::{PushOp, ResetOp};

    fn main() -> BranchName {
        BranchName::new("main").unwrap()
    }

    #[test]
    fn fast_forward_after_push_is_rejected() {
        let op = CompositeOp::new(vec![
            Operation::Push(PushOp::new(RemoteRole::Core, "origin", main())),
            Operation::Reset(ResetOp::new(main(), RemoteRole::Hub, "hub").unwrap()),
        ]);
        match op.check_order() {
            Err(OperationError::Step { index, source, .. }) => {
                assert_eq!(index, 1);
                assert!(matches!(*source, OperationError::Validation(_)));
            }
            other => panic!("expected ordering error, got {:?}", other),
        }
    }

    #[test]
    fn fast_forward_then_push_is_accepted() {
        let op = CompositeOp::new(vec![
            Operation::Reset(ResetOp::new(main(), RemoteRole::Hub, "hub").unwrap()),
            Operation::Push(PushOp::new(RemoteRole::Core, "origin", main())),
        ]);
        assert!(op.check_order().is_ok());
    }
}
