//! platform::traits
//!
//! The fixed-capability interface to the hub's hosting platform.
//!
//! # Design
//!
//! The trait is async because every call is network I/O. The capability set
//! is closed: a platform that cannot answer a question returns
//! [`PlatformError::Unsupported`] rather than growing new methods. Callers in
//! detection map every error to "unknown", so a platform failure never
//! blocks diagnosis.
//!
//! # Example
//!
//! ```ignore
//! use syncdoctor::platform::{Platform, PlatformError};
//!
//! async fn protected(platform: &dyn Platform) -> Option<bool> {
//!     platform.is_branch_protected("main").await.ok()
//! }
//! ```

use async_trait::async_trait;
use thiserror::Error;

/// Errors from platform queries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    /// The platform cannot answer this question.
    #[error("not supported by {0}")]
    Unsupported(&'static str),

    /// Credentials missing, invalid, or insufficient.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The repository or branch does not exist (or is hidden).
    #[error("not found: {0}")]
    NotFound(String),

    /// Network or connection error.
    #[error("network error: {0}")]
    Network(String),

    /// Any other API failure.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },
}

/// Questions syncdoctor asks the hub's hosting platform.
#[async_trait]
pub trait Platform: Send + Sync {
    /// Short provider name, e.g. "github".
    fn name(&self) -> &'static str;

    /// Whether pushes to `branch` are restricted by branch protection.
    async fn is_branch_protected(&self, branch: &str) -> Result<bool, PlatformError>;

    /// The repository's default branch.
    async fn default_branch(&self) -> Result<String, PlatformError>;

    /// Whether the current credential has admin rights on the repository.
    async fn can_admin(&self) -> Result<bool, PlatformError>;
}
