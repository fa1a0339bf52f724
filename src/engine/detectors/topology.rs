//! engine::detectors::topology
//!
//! Branch presence across local, core and hub from a single
//! `for-each-ref`. No per-branch remote calls are made.

use std::collections::BTreeMap;

use crate::engine::state::BranchTopologyEntry;
use crate::engine::tables;
use crate::git::{Git, GitError, RefEntry};

/// Enumerate local branches and the remote-tracking branches of the given
/// remotes. `None` skips a role whose remote is not configured.
pub async fn detect(
    git: &Git,
    core: Option<&str>,
    hub: Option<&str>,
) -> Result<Vec<BranchTopologyEntry>, GitError> {
    let mut prefixes = vec!["refs/heads".to_string()];
    prefixes.extend(core.map(|c| format!("refs/remotes/{}", c)));
    prefixes.extend(hub.map(|h| format!("refs/remotes/{}", h)));
    let prefixes: Vec<&str> = prefixes.iter().map(String::as_str).collect();

    let refs = git.list_refs(&prefixes).await?;
    Ok(classify(&refs, core, hub))
}

/// Build sorted topology entries from a ref listing.
pub fn classify(refs: &[RefEntry], core: Option<&str>, hub: Option<&str>) -> Vec<BranchTopologyEntry> {
    let core_prefix = core.map(|c| format!("refs/remotes/{}/", c));
    let hub_prefix = hub.map(|h| format!("refs/remotes/{}/", h));

    // (local, core, hub)
    let mut presence: BTreeMap<String, (bool, bool, bool)> = BTreeMap::new();
    for entry in refs {
        let name = entry.name.as_str();
        if let Some(branch) = name.strip_prefix("refs/heads/") {
            presence.entry(branch.to_string()).or_default().0 = true;
        } else if let Some(branch) = core_prefix.as_deref().and_then(|p| name.strip_prefix(p)) {
            presence.entry(branch.to_string()).or_default().1 = true;
        } else if let Some(branch) = hub_prefix.as_deref().and_then(|p| name.strip_prefix(p)) {
            presence.entry(branch.to_string()).or_default().2 = true;
        }
    }

    presence
        .into_iter()
        .filter(|(branch, _)| branch != "HEAD")
        .map(|(branch, (local, core, hub))| BranchTopologyEntry {
            branch,
            local,
            core,
            hub,
            scenario: tables::topology(local, core, hub),
        })
        .collect()
}
