//! platform::mock
//!
//! In-memory platform for deterministic tests.
//!
//! # Example
//!
//! ```
//! use syncdoctor::platform::mock::MockPlatform;
//! use syncdoctor::platform::{Platform, PlatformError};
//!
//! # tokio_test::block_on(async {
//! let platform = MockPlatform::new("main").protect("main");
//! assert!(platform.is_branch_protected("main").await.unwrap());
//! assert!(!platform.is_branch_protected("dev").await.unwrap());
//!
//! let down = MockPlatform::failing(PlatformError::Network("offline".into()));
//! assert!(down.default_branch().await.is_err());
//! # });
//! ```

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::traits::{Platform, PlatformError};

/// Mock platform; clones share recorded calls.
#[derive(Debug, Clone)]
pub struct MockPlatform {
    default_branch: String,
    protected: BTreeSet<String>,
    admin: Option<bool>,
    fail_with: Option<PlatformError>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockPlatform {
    /// A platform reporting `default_branch`, nothing protected, admin unknown.
    pub fn new(default_branch: impl Into<String>) -> Self {
        Self {
            default_branch: default_branch.into(),
            protected: BTreeSet::new(),
            admin: None,
            fail_with: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A platform where every call fails with `err`.
    pub fn failing(err: PlatformError) -> Self {
        Self {
            fail_with: Some(err),
            ..Self::new("main")
        }
    }

    /// Mark a branch as protected.
    pub fn protect(mut self, branch: impl Into<String>) -> Self {
        self.protected.insert(branch.into());
        self
    }

    /// Set the admin answer.
    pub fn admin(mut self, admin: bool) -> Self {
        self.admin = Some(admin);
        self
    }

    /// Calls made so far, as `method(arg)` strings.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: String) -> Result<(), PlatformError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
        match &self.fail_with {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Platform for MockPlatform {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn is_branch_protected(&self, branch: &str) -> Result<bool, PlatformError> {
        self.record(format!("is_branch_protected({})", branch))?;
        Ok(self.protected.contains(branch))
    }

    async fn default_branch(&self) -> Result<String, PlatformError> {
        self.record("default_branch()".into())?;
        Ok(self.default_branch.clone())
    }

    async fn can_admin(&self) -> Result<bool, PlatformError> {
        self.record("can_admin()".into())?;
        self.admin.ok_or(PlatformError::Unsupported("mock"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_calls_across_clones() {
        let platform = MockPlatform::new("main").admin(true);
        let clone = platform.clone();
        assert!(clone.can_admin().await.unwrap());
        assert_eq!(clone.default_branch().await.unwrap(), "main");
        assert_eq!(platform.calls(), vec!["can_admin()", "default_branch()"]);
    }

    #[tokio::test]
    async fn admin_unknown_is_unsupported() {
        let platform = MockPlatform::new("main");
        assert_eq!(
            platform.can_admin().await,
            Err(PlatformError::Unsupported("mock"))
        );
    }
}
