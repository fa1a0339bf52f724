//! doctor
//!
//! Fix suggestion and the auto-fix orchestrator.
//!
//! # Architecture
//!
//! - [`generators`]: pure mapping from a snapshot to prioritized [`Fix`]es
//! - [`policy`]: which scenarios may never be repaired unattended
//! - [`Doctor`]: validates and applies fixes, and keeps the per-remote
//!   retry markers up to date
//!
//! # Design Principles
//!
//! - Apply in priority order and stop at the first failure
//! - Report exactly what was applied, what failed and what was not attempted
//! - Never roll back a multi-step repair on the user's behalf
//!
//! # Example
//!
//! ```ignore
//! use syncdoctor::doctor::{suggest_fixes, Doctor};
//!
//! let fixes = suggest_fixes(&state);
//! let report = Doctor::new(git, retry_store).auto_fix(&state, &fixes).await;
//! for fix in &report.applied {
//!     println!("applied: {}", fix.description());
//! }
//! ```

mod fixes;
pub mod generators;
pub mod policy;

pub use fixes::Fix;
pub use generators::{suggest_fixes, PLATFORM_DEFAULT_BRANCH, PLATFORM_PROTECTED};

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::core::retry::RetryStore;
use crate::core::types::RemoteRole;
use crate::engine::state::RepositoryState;
use crate::git::Git;
use crate::ops::OperationError;

/// Errors from applying a single fix.
#[derive(Debug, Error)]
pub enum DoctorError {
    /// The fix is guidance only.
    #[error("fix for {0} has no operation to apply")]
    NoOperation(String),

    /// Validation or execution failed.
    #[error(transparent)]
    Operation(#[from] OperationError),
}

impl DoctorError {
    /// Only timeouts are worth retrying unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DoctorError::Operation(e) if e.is_retryable())
    }
}

/// The fix that stopped an auto-fix run.
#[derive(Debug, Clone, Serialize)]
pub struct FailedFix {
    pub fix: Fix,
    pub error: String,
    pub retryable: bool,
    /// Remotes whose push failed and now carry a retry marker.
    pub retry_pending: Vec<RemoteRole>,
}

/// What an auto-fix run did.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AutoFixReport {
    /// Applied successfully, in order.
    pub applied: Vec<Fix>,
    /// The first failure, if any. Nothing after it ran.
    pub failed: Option<FailedFix>,
    /// Auto-fixable fixes left untouched because of the failure.
    pub not_attempted: Vec<Fix>,
    /// Fixes that are not auto-fixable.
    pub skipped: Vec<Fix>,
}

impl AutoFixReport {
    /// Every auto-fixable fix was applied.
    pub fn is_success(&self) -> bool {
        self.failed.is_none()
    }
}

/// Applies fixes against one working copy.
pub struct Doctor {
    git: Git,
    retry: Arc<dyn RetryStore>,
}

impl Doctor {
    pub fn new(git: Git, retry: Arc<dyn RetryStore>) -> Self {
        Self { git, retry }
    }

    /// Validate a fix's operation without executing it.
    pub async fn validate_fix(&self, fix: &Fix, state: &RepositoryState) -> Result<(), DoctorError> {
        let op = fix
            .operation()
            .ok_or_else(|| DoctorError::NoOperation(fix.scenario().to_string()))?;
        op.validate(state, &self.git).await?;
        Ok(())
    }

    /// Validate and execute one fix, updating retry markers for the
    /// remotes it pushes to.
    pub async fn apply_fix(&self, fix: &Fix, state: &RepositoryState) -> Result<(), DoctorError> {
        let op = fix
            .operation()
            .ok_or_else(|| DoctorError::NoOperation(fix.scenario().to_string()))?;
        op.validate(state, &self.git).await?;

        match op.execute(&self.git).await {
            Ok(()) => {
                info!(scenario = fix.scenario(), op = %op.describe(), "applied fix");
                for role in op.pushed_remotes() {
                    self.mark(role, false);
                }
                Ok(())
            }
            Err(e) => {
                warn!(scenario = fix.scenario(), op = %op.describe(), error = %e, "fix failed");
                if let Some(role) = op.failed_push(&e) {
                    self.mark(role, true);
                }
                Err(e.into())
            }
        }
    }

    /// Apply every auto-fixable fix in priority order, stopping at the
    /// first failure.
    pub async fn auto_fix(&self, state: &RepositoryState, fixes: &[Fix]) -> AutoFixReport {
        let mut ordered: Vec<&Fix> = fixes.iter().collect();
        ordered.sort_by_key(|f| f.priority());

        let mut report = AutoFixReport::default();
        for fix in ordered {
            if !fix.auto_fixable() {
                report.skipped.push(fix.clone());
                continue;
            }
            if report.failed.is_some() {
                report.not_attempted.push(fix.clone());
                continue;
            }
            match self.apply_fix(fix, state).await {
                Ok(()) => report.applied.push(fix.clone()),
                Err(e) => {
                    let retry_pending = match (&e, fix.operation()) {
                        (DoctorError::Operation(op_err), Some(op)) => {
                            op.failed_push(op_err).into_iter().collect()
                        }
                        _ => Vec::new(),
                    };
                    report.failed = Some(FailedFix {
                        fix: fix.clone(),
                        error: e.to_string(),
                        retryable: e.is_retryable(),
                        retry_pending,
                    });
                }
            }
        }

        info!(
            applied = report.applied.len(),
            failed = report.failed.is_some(),
            not_attempted = report.not_attempted.len(),
            "auto-fix finished"
        );
        report
    }

    fn mark(&self, role: RemoteRole, pending: bool) {
        if let Err(e) = self.retry.set(role, pending) {
            warn!(role = %role, pending, error = %e, "could not update retry marker");
        }
    }
}
