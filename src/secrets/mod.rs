//! secrets
//!
//! Opaque bearer-token access for the hub platform client.
//!
//! # Design
//!
//! syncdoctor never stores credentials. A [`CredentialProvider`] hands the
//! platform client a token when one is available, and `None` when not; the
//! client then runs unauthenticated and any permission-dependent answer
//! becomes "unknown".
//!
//! # Security
//!
//! Implementations MUST:
//! - Never log, print, or include secrets in error messages
//! - Be thread-safe (Send + Sync)
//!
//! # Example
//!
//! ```
//! use syncdoctor::secrets::{CredentialProvider, StaticCredentials};
//!
//! # tokio_test::block_on(async {
//! let creds = StaticCredentials::new("ghp_example");
//! assert_eq!(creds.bearer_token().await.unwrap().as_deref(), Some("ghp_example"));
//! # });
//! ```

use async_trait::async_trait;
use thiserror::Error;

/// Errors from credential providers.
///
/// Messages never include secret values.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// The source exists but could not be read.
    #[error("failed to read credential from {0}")]
    Unreadable(String),
}

/// Source of a bearer token for platform API calls.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// The current token, or `None` if no credential is configured.
    async fn bearer_token(&self) -> Result<Option<String>, CredentialError>;
}

/// Reads a token from an environment variable.
#[derive(Debug, Clone)]
pub struct EnvCredentials {
    var: String,
}

impl EnvCredentials {
    /// Read from the named variable on each call.
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

#[async_trait]
impl CredentialProvider for EnvCredentials {
    async fn bearer_token(&self) -> Result<Option<String>, CredentialError> {
        match std::env::var(&self.var) {
            Ok(value) if value.trim().is_empty() => Ok(None),
            Ok(value) => Ok(Some(value.trim().to_string())),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(std::env::VarError::NotUnicode(_)) => {
                Err(CredentialError::Unreadable(format!("${}", self.var)))
            }
        }
    }
}

/// A fixed token, or none.
#[derive(Clone, Default)]
pub struct StaticCredentials {
    token: Option<String>,
}

impl StaticCredentials {
    /// Always return `token`.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    /// Never return a token.
    pub fn none() -> Self {
        Self { token: None }
    }
}

impl std::fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("has_token", &self.token.is_some())
            .finish()
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentials {
    async fn bearer_token(&self) -> Result<Option<String>, CredentialError> {
        Ok(self.token.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_env_var_is_none() {
        let creds = EnvCredentials::new("SYNCDOCTOR_TEST_TOKEN_THAT_IS_NEVER_SET");
        assert!(creds.bearer_token().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn static_none_is_none() {
        assert!(StaticCredentials::none().bearer_token().await.unwrap().is_none());
    }

    #[test]
    fn debug_hides_token() {
        let rendered = format!("{:?}", StaticCredentials::new("s3cr3t"));
        assert!(!rendered.contains("s3cr3t"));
        assert!(rendered.contains("has_token: true"));
    }
}
