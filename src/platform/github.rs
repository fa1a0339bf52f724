//! platform::github
//!
//! GitHub implementation of [`Platform`] using the REST API.
//!
//! # Endpoints
//!
//! - `GET /repos/{owner}/{repo}`: `default_branch`, `permissions.admin`
//! - `GET /repos/{owner}/{repo}/branches/{branch}`: `protected`
//!
//! # Authentication
//!
//! A token from the [`CredentialProvider`] is sent as a bearer token when
//! available. Without one, requests go out anonymously; public repositories
//! still answer the default branch and protection queries, while
//! `can_admin` fails with [`PlatformError::AuthFailed`].
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use syncdoctor::platform::github::GitHubPlatform;
//! use syncdoctor::secrets::EnvCredentials;
//!
//! let platform = GitHubPlatform::new(Arc::new(EnvCredentials::new("GITHUB_TOKEN")), "owner", "repo");
//! let branch = platform.default_branch().await?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;

use super::traits::{Platform, PlatformError};
use crate::git::Git;
use crate::secrets::CredentialProvider;

/// Default GitHub API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// User-Agent header value for API requests.
const USER_AGENT_VALUE: &str = "syncdoctor";

/// Per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// GitHub platform client.
pub struct GitHubPlatform {
    client: Client,
    credentials: Arc<dyn CredentialProvider>,
    owner: String,
    repo: String,
    api_base: String,
}

impl std::fmt::Debug for GitHubPlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubPlatform")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl GitHubPlatform {
    /// Create a client for `owner/repo` on github.com.
    pub fn new(
        credentials: Arc<dyn CredentialProvider>,
        owner: impl Into<String>,
        repo: impl Into<String>,
    ) -> Self {
        Self::with_api_base(credentials, owner, repo, DEFAULT_API_BASE)
    }

    /// Create a client against a custom API base (GitHub Enterprise, tests).
    pub fn with_api_base(
        credentials: Arc<dyn CredentialProvider>,
        owner: impl Into<String>,
        repo: impl Into<String>,
        api_base: impl Into<String>,
    ) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            credentials,
            owner: owner.into(),
            repo: repo.into(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    /// Create a client from a github.com remote URL.
    ///
    /// Returns `None` if the URL is not a GitHub URL.
    pub fn from_remote_url(url: &str, credentials: Arc<dyn CredentialProvider>) -> Option<Self> {
        let (owner, repo) = Git::parse_github_remote(url)?;
        Some(Self::new(credentials, owner, repo))
    }

    /// Repository owner.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Repository name.
    pub fn repo(&self) -> &str {
        &self.repo
    }

    async fn headers(&self) -> Result<HeaderMap, PlatformError> {
        let mut headers = HeaderMap::new();
        let token = self
            .credentials
            .bearer_token()
            .await
            .map_err(|e| PlatformError::AuthFailed(e.to_string()))?;
        if let Some(token) = token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| PlatformError::AuthFailed("token is not a valid header value".into()))?;
            headers.insert(AUTHORIZATION, value);
        }
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        Ok(headers)
    }

    fn repo_url(&self, path: &str) -> String {
        if path.is_empty() {
            format!("{}/repos/{}/{}", self.api_base, self.owner, self.repo)
        } else {
            format!(
                "{}/repos/{}/{}/{}",
                self.api_base, self.owner, self.repo, path
            )
        }
    }

    async fn get<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T, PlatformError> {
        let response = self
            .client
            .get(url)
            .headers(self.headers().await?)
            .send()
            .await
            .map_err(|e| PlatformError::Network(e.to_string()))?;
        Self::handle_response(response).await
    }

    async fn handle_response<T: for<'de> Deserialize<'de>>(
        response: Response,
    ) -> Result<T, PlatformError> {
        let status = response.status();
        if status.is_success() {
            return response.json().await.map_err(|e| PlatformError::Api {
                status: status.as_u16(),
                message: format!("failed to parse response: {}", e),
            });
        }

        let message = match response.json::<GitHubErrorResponse>().await {
            Ok(err) => err.message,
            Err(_) => "unknown error".to_string(),
        };

        Err(match status {
            StatusCode::UNAUTHORIZED => PlatformError::AuthFailed("invalid or expired token".into()),
            StatusCode::FORBIDDEN => PlatformError::AuthFailed(format!("permission denied: {}", message)),
            StatusCode::NOT_FOUND => PlatformError::NotFound(message),
            _ => PlatformError::Api {
                status: status.as_u16(),
                message,
            },
        })
    }

    async fn repository(&self) -> Result<GitHubRepository, PlatformError> {
        self.get(&self.repo_url("")).await
    }
}

#[async_trait]
impl Platform for GitHubPlatform {
    fn name(&self) -> &'static str {
        "github"
    }

    async fn is_branch_protected(&self, branch: &str) -> Result<bool, PlatformError> {
        let url = self.repo_url(&format!("branches/{}", branch));
        let branch: GitHubBranch = self.get(&url).await?;
        Ok(branch.protected)
    }

    async fn default_branch(&self) -> Result<String, PlatformError> {
        Ok(self.repository().await?.default_branch)
    }

    async fn can_admin(&self) -> Result<bool, PlatformError> {
        // Anonymous responses carry no permissions block.
        self.repository()
            .await?
            .permissions
            .map(|p| p.admin)
            .ok_or_else(|| PlatformError::AuthFailed("no permissions in response".into()))
    }
}

#[derive(Debug, Deserialize)]
struct GitHubErrorResponse {
    message: String,
}

#[derive(Debug, Deserialize)]
struct GitHubRepository {
    default_branch: String,
    #[serde(default)]
    permissions: Option<GitHubPermissions>,
}

#[derive(Debug, Deserialize)]
struct GitHubPermissions {
    #[serde(default)]
    admin: bool,
}

#[derive(Debug, Deserialize)]
struct GitHubBranch {
    #[serde(default)]
    protected: bool,
}
