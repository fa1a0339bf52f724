//! platform::factory
//!
//! Platform selection for the hub remote.
//!
//! Detection code calls [`create_platform`] rather than constructing a
//! specific client, so the engine stays independent of hosting providers.
//!
//! # Selection
//!
//! 1. `platform.provider = "none"` disables platform queries.
//! 2. `platform.owner` and `platform.repo` together override URL parsing.
//! 3. Otherwise [`detect_provider`] must place the hub URL on the
//!    configured provider (a github.com URL for GitHub).
//!
//! When no client can be built, detection reports platform facts as unknown.

use std::sync::Arc;

use tracing::debug;

use super::github::{GitHubPlatform, DEFAULT_API_BASE};
use super::traits::Platform;
use crate::core::config::Config;
use crate::git::Git;
use crate::secrets::{CredentialProvider, EnvCredentials};

/// Supported platform providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformProvider {
    /// GitHub (github.com or an Enterprise API base)
    GitHub,
}

impl PlatformProvider {
    /// Provider name as used in configuration files.
    pub fn name(&self) -> &'static str {
        match self {
            PlatformProvider::GitHub => "github",
        }
    }

    /// Parse a configured provider name. `"none"` and unknown names yield `None`.
    ///
    /// ```
    /// use syncdoctor::platform::PlatformProvider;
    ///
    /// assert_eq!(PlatformProvider::parse("GitHub"), Some(PlatformProvider::GitHub));
    /// assert_eq!(PlatformProvider::parse("none"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "github" => Some(PlatformProvider::GitHub),
            _ => None,
        }
    }
}

impl std::fmt::Display for PlatformProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Detect the provider hosting a remote URL.
pub fn detect_provider(remote_url: &str) -> Option<PlatformProvider> {
    Git::parse_github_remote(remote_url).map(|_| PlatformProvider::GitHub)
}

/// Build the platform client for the hub, with credentials from the
/// configured environment variable.
pub fn create_platform(config: &Config, hub_url: Option<&str>) -> Option<Arc<dyn Platform>> {
    let credentials = Arc::new(EnvCredentials::new(config.platform_token_env()));
    create_platform_with(config, hub_url, credentials)
}

/// Build the platform client for the hub with explicit credentials.
pub fn create_platform_with(
    config: &Config,
    hub_url: Option<&str>,
    credentials: Arc<dyn CredentialProvider>,
) -> Option<Arc<dyn Platform>> {
    let Some(provider) = PlatformProvider::parse(config.platform_provider()) else {
        debug!(provider = config.platform_provider(), "platform queries disabled");
        return None;
    };

    let (owner, repo) = match config.platform_repo_override() {
        (Some(owner), Some(repo)) => (owner.to_string(), repo.to_string()),
        _ => match hub_url.filter(|url| detect_provider(url) == Some(provider)) {
            Some(url) => Git::parse_github_remote(url)?,
            None => {
                debug!(url = ?hub_url, %provider, "hub URL is not hosted on the configured platform");
                return None;
            }
        },
    };

    match provider {
        PlatformProvider::GitHub => {
            let api_base = config.platform_api_base().unwrap_or(DEFAULT_API_BASE);
            debug!(%owner, %repo, api_base, "using GitHub platform");
            Some(Arc::new(GitHubPlatform::with_api_base(
                credentials,
                owner,
                repo,
                api_base,
            )))
        }
    }
}
