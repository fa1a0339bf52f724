//! engine::probe
//!
//! Remote reachability and fetching for the core and hub roles.
//!
//! # Concurrency
//!
//! Core and hub are probed concurrently, then fetched concurrently. The
//! executor's per-directory lock still serializes the git processes that
//! touch the working copy; network calls against a URL run from the
//! system temp directory and do not contend.
//!
//! # Failure handling
//!
//! A remote that cannot be probed is reported unreachable with a warning.
//! A failed fetch never aborts the other one; it lands in the
//! [`FetchReport`] and the remote is marked stale.

use std::path::PathBuf;

use tracing::{debug, info, warn};

use super::detectors::existence;
use super::state::{DetectionWarning, Dimension, ExistenceState, RemotePresence};
use crate::core::config::Config;
use crate::core::types::RemoteRole;
use crate::git::{Git, GitError};

/// Outcome of fetching every usable remote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchReport {
    /// Remotes fetched successfully.
    pub fetched: Vec<RemoteRole>,
    /// Remotes whose fetch failed, with the failure.
    pub failed: Vec<(RemoteRole, DetectionWarning)>,
}

impl FetchReport {
    /// Remotes whose remote-tracking refs may be out of date.
    pub fn stale(&self) -> Vec<RemoteRole> {
        self.failed.iter().map(|(role, _)| *role).collect()
    }

    /// Failure warnings, in role order.
    pub fn warnings(&self) -> Vec<DetectionWarning> {
        self.failed.iter().map(|(_, w)| w.clone()).collect()
    }
}

/// Probes and fetches the two remotes of one working copy.
pub struct RemoteProber<'a> {
    git: &'a Git,
    config: &'a Config,
}

impl<'a> RemoteProber<'a> {
    pub fn new(git: &'a Git, config: &'a Config) -> Self {
        Self { git, config }
    }

    /// Check the local copy, then probe core and hub concurrently.
    pub async fn detect_existence(&self) -> (ExistenceState, Vec<DetectionWarning>) {
        let mut warnings = Vec::new();

        let local = if self.git.work_dir().is_dir() {
            self.git.is_repository().await
        } else {
            Ok(false)
        };
        let local_exists = match &local {
            Ok(exists) => *exists,
            Err(_) => false,
        };

        let (core, hub) = tokio::join!(
            self.probe(RemoteRole::Core, local_exists),
            self.probe(RemoteRole::Hub, local_exists),
        );
        let (core, core_warning) = core;
        let (hub, hub_warning) = hub;
        warnings.extend(core_warning);
        warnings.extend(hub_warning);

        let state = match local {
            Ok(_) => existence::classify(local_exists, core, hub),
            Err(e) => {
                warnings.insert(0, DetectionWarning::from_git(Dimension::Existence, &e));
                existence::unknown(core, hub)
            }
        };
        (state, warnings)
    }

    async fn probe(
        &self,
        role: RemoteRole,
        local_exists: bool,
    ) -> (RemotePresence, Option<DetectionWarning>) {
        let name = self.config.remote_name(role).to_string();
        let override_url = self.config.remote_url_override(role).map(str::to_string);

        let result = if local_exists {
            match self.git.remote_url(&name).await {
                // A URL from config only feeds the "git remote add" suggestion.
                Ok(None) => {
                    return (
                        RemotePresence {
                            name,
                            configured: false,
                            reachable: false,
                            url: override_url,
                        },
                        None,
                    )
                }
                Ok(Some(url)) => {
                    let probed = self.git.ls_remote(&name).await;
                    (Some(url), probed)
                }
                Err(e) => (override_url, Err(e)),
            }
        } else {
            match &override_url {
                Some(url) => {
                    let detached = Git::at(
                        self.git.executor().clone(),
                        &probe_dir(),
                        self.git.deadlines(),
                    );
                    (override_url.clone(), detached.ls_remote(url).await)
                }
                None => (None, Ok(())),
            }
        };

        let (url, probed) = result;
        let configured = url.is_some();
        let (reachable, warning) = match (configured, probed) {
            (false, _) => (false, None),
            (true, Ok(())) => (true, None),
            (true, Err(e)) => {
                warn!(remote = %name, role = %role, error = %e, "remote unreachable");
                (false, Some(DetectionWarning::from_git(Dimension::Existence, &e)))
            }
        };
        debug!(remote = %name, role = %role, configured, reachable, "probed remote");

        (
            RemotePresence {
                name,
                configured,
                reachable,
                url,
            },
            warning,
        )
    }

    /// Fetch every usable remote concurrently.
    pub async fn fetch_remotes(&self, existence: &ExistenceState) -> FetchReport {
        let (core, hub) = tokio::join!(
            self.fetch_one(existence, RemoteRole::Core),
            self.fetch_one(existence, RemoteRole::Hub),
        );

        let mut report = FetchReport::default();
        for (role, outcome) in [(RemoteRole::Core, core), (RemoteRole::Hub, hub)] {
            match outcome {
                None => {}
                Some(Ok(())) => {
                    info!(role = %role, "fetched");
                    report.fetched.push(role);
                }
                Some(Err(e)) => {
                    warn!(role = %role, error = %e, "fetch failed; remote refs may be stale");
                    report
                        .failed
                        .push((role, DetectionWarning::from_git(Dimension::Sync, &e)));
                }
            }
        }
        report
    }

    async fn fetch_one(
        &self,
        existence: &ExistenceState,
        role: RemoteRole,
    ) -> Option<Result<(), GitError>> {
        let presence = existence.remote(role);
        if !existence.local_exists || !presence.usable() {
            return None;
        }
        Some(self.git.fetch(&presence.name).await)
    }
}

fn probe_dir() -> PathBuf {
    std::env::temp_dir()
}
