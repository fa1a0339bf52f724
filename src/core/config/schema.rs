//! core::config::schema
//!
//! Configuration schema types.
//!
//! Both scopes (global and repo) share one file shape, [`ConfigFile`]. Every
//! field is optional so a repo file only needs to name what it overrides.
//!
//! # Validation
//!
//! Config values are validated after parsing to ensure they conform to
//! expected formats (e.g., `default_branch` must be a valid branch name,
//! deadlines must be non-zero).

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::types::BranchName;

/// One configuration file, either scope.
///
/// # Example
///
/// ```toml
/// default_branch = "main"
/// fetch = true
/// large_object_threshold = 10485760
///
/// [remotes]
/// core = "origin"
/// hub = "hub"
///
/// [deadlines]
/// probe_secs = 5
/// fetch_secs = 60
/// local_secs = 30
///
/// [platform]
/// provider = "github"
/// token_env = "GITHUB_TOKEN"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    /// Branch to compare across the three locations
    pub default_branch: Option<String>,

    /// Whether detection fetches reachable remotes first
    pub fetch: Option<bool>,

    /// Blob size in bytes above which an object is reported as large
    pub large_object_threshold: Option<u64>,

    /// Remote name mapping
    pub remotes: Option<RemotesConfig>,

    /// Subprocess deadlines
    pub deadlines: Option<DeadlinesConfig>,

    /// Hub platform settings
    pub platform: Option<PlatformConfig>,
}

impl ConfigFile {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(branch) = &self.default_branch {
            BranchName::new(branch).map_err(|e| {
                ConfigError::InvalidValue(format!("invalid default_branch: {}", e))
            })?;
        }

        if self.large_object_threshold == Some(0) {
            return Err(ConfigError::InvalidValue(
                "large_object_threshold must be greater than zero".to_string(),
            ));
        }

        if let Some(remotes) = &self.remotes {
            remotes.validate()?;
        }
        if let Some(deadlines) = &self.deadlines {
            deadlines.validate()?;
        }
        if let Some(platform) = &self.platform {
            platform.validate()?;
        }

        Ok(())
    }
}

/// Git remote names for the two roles.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RemotesConfig {
    /// Remote playing the core role (default: "origin")
    pub core: Option<String>,

    /// Remote playing the hub role (default: "hub")
    pub hub: Option<String>,

    /// Core URL to probe when git has no such remote (e.g. before cloning)
    pub core_url: Option<String>,

    /// Hub URL to probe when git has no such remote
    pub hub_url: Option<String>,
}

impl RemotesConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        for (role, name) in [("core", &self.core), ("hub", &self.hub)] {
            let Some(name) = name else { continue };
            if name.is_empty() {
                return Err(ConfigError::InvalidValue(format!(
                    "remotes.{} cannot be empty",
                    role
                )));
            }
            if name.starts_with('-') || name.contains(char::is_whitespace) || name.contains('/') {
                return Err(ConfigError::InvalidValue(format!(
                    "remotes.{} has an invalid remote name '{}'",
                    role, name
                )));
            }
        }
        for (key, url) in [("core_url", &self.core_url), ("hub_url", &self.hub_url)] {
            if matches!(url, Some(u) if u.trim().is_empty() || u.starts_with('-')) {
                return Err(ConfigError::InvalidValue(format!(
                    "remotes.{} is not a usable URL",
                    key
                )));
            }
        }
        if self.core.is_some() && self.core == self.hub {
            return Err(ConfigError::InvalidValue(
                "remotes.core and remotes.hub must name different remotes".to_string(),
            ));
        }
        Ok(())
    }
}

/// Subprocess deadlines, in seconds.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct DeadlinesConfig {
    /// Reachability probe (`ls-remote`)
    pub probe_secs: Option<u64>,

    /// Fetch and push
    pub fetch_secs: Option<u64>,

    /// Every local command
    pub local_secs: Option<u64>,
}

impl DeadlinesConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("probe_secs", self.probe_secs),
            ("fetch_secs", self.fetch_secs),
            ("local_secs", self.local_secs),
        ] {
            if value == Some(0) {
                return Err(ConfigError::InvalidValue(format!(
                    "deadlines.{} must be greater than zero",
                    key
                )));
            }
        }
        Ok(())
    }
}

/// Hub platform settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PlatformConfig {
    /// "github" or "none"
    pub provider: Option<String>,

    /// API base URL override (GitHub Enterprise, tests)
    pub api_base: Option<String>,

    /// Environment variable holding the bearer token
    pub token_env: Option<String>,

    /// Override the owner parsed from the hub URL
    pub owner: Option<String>,

    /// Override the repository name parsed from the hub URL
    pub repo: Option<String>,
}

impl PlatformConfig {
    /// Valid platform providers.
    pub const VALID_PROVIDERS: &'static [&'static str] = &["github", "none"];

    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(provider) = &self.provider {
            if !Self::VALID_PROVIDERS.contains(&provider.as_str()) {
                return Err(ConfigError::InvalidValue(format!(
                    "invalid platform provider '{}', must be one of: {}",
                    provider,
                    Self::VALID_PROVIDERS.join(", ")
                )));
            }
        }
        if let Some(base) = &self.api_base {
            if !base.starts_with("http://") && !base.starts_with("https://") {
                return Err(ConfigError::InvalidValue(format!(
                    "platform.api_base must be an http(s) URL, got '{}'",
                    base
                )));
            }
        }
        if matches!(&self.token_env, Some(v) if v.is_empty()) {
            return Err(ConfigError::InvalidValue(
                "platform.token_env cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_valid() {
        let parsed: ConfigFile = toml::from_str("").unwrap();
        assert_eq!(parsed, ConfigFile::default());
        assert!(parsed.validate().is_ok());
    }

    #[test]
    fn full_file_parses() {
        let parsed: ConfigFile = toml::from_str(
            r#"
            default_branch = "trunk"
            fetch = false
            large_object_threshold = 1024

            [remotes]
            core = "upstream"
            hub = "github"

            [deadlines]
            probe_secs = 2
            fetch_secs = 20
            local_secs = 10

            [platform]
            provider = "github"
            api_base = "https://github.example.com/api/v3"
            token_env = "HUB_TOKEN"
            "#,
        )
        .unwrap();

        assert!(parsed.validate().is_ok());
        assert_eq!(parsed.default_branch.as_deref(), Some("trunk"));
        assert_eq!(
            parsed.remotes.as_ref().and_then(|r| r.hub.as_deref()),
            Some("github")
        );
        assert_eq!(parsed.deadlines.and_then(|d| d.probe_secs), Some(2));
    }

    #[test]
    fn unknown_platform_rejected() {
        let parsed: ConfigFile = toml::from_str("[platform]\nprovider = \"gitea\"").unwrap();
        assert!(matches!(
            parsed.validate(),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[test]
    fn zero_deadline_rejected() {
        let parsed: ConfigFile = toml::from_str("[deadlines]\nfetch_secs = 0").unwrap();
        assert!(parsed.validate().is_err());
    }

    #[test]
    fn same_remote_for_both_roles_rejected() {
        let parsed: ConfigFile =
            toml::from_str("[remotes]\ncore = \"origin\"\nhub = \"origin\"").unwrap();
        assert!(parsed.validate().is_err());
    }

    #[test]
    fn option_like_remote_rejected() {
        let parsed: ConfigFile = toml::from_str("[remotes]\nhub = \"--upload-pack\"").unwrap();
        assert!(parsed.validate().is_err());
    }
}
