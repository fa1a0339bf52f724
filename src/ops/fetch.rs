//! ops::fetch

use serde::{Deserialize, Serialize};

use super::OperationError;
use crate::core::types::RemoteRole;
use crate::engine::state::RepositoryState;
use crate::git::Git;

/// Update remote-tracking refs for one remote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchOp {
    pub role: RemoteRole,
    pub remote: String,
}

impl FetchOp {
    pub fn new(role: RemoteRole, remote: impl Into<String>) -> Self {
        Self {
            role,
            remote: remote.into(),
        }
    }

    /// The remote must be configured and reachable.
    pub(super) fn validate(&self, state: &RepositoryState) -> Result<(), OperationError> {
        require_usable(state, self.role, &self.remote)
    }

    pub(super) async fn execute(&self, git: &Git) -> Result<(), OperationError> {
        git.fetch(&self.remote).await?;
        Ok(())
    }

    /// Nothing to undo: only remote-tracking refs moved.
    pub(super) async fn rollback(&self, _git: &Git) -> Result<(), OperationError> {
        Ok(())
    }

    pub(super) fn describe(&self) -> String {
        format!("fetch {}", self.remote)
    }
}

/// Fail unless the snapshot saw `role` configured and reachable.
pub(super) fn require_usable(
    state: &RepositoryState,
    role: RemoteRole,
    remote: &str,
) -> Result<(), OperationError> {
    let presence = state.existence.remote(role);
    if !presence.configured {
        return Err(OperationError::Validation(format!(
            "{} remote '{}' is not configured",
            role, remote
        )));
    }
    if !presence.reachable {
        return Err(OperationError::Validation(format!(
            "{} remote '{}' is not reachable",
            role, remote
        )));
    }
    Ok(())
}
