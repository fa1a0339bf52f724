//! doctor::generators
//!
//! The fix suggester: maps a [`RepositoryState`] to prioritized [`Fix`]es.
//!
//! # Architecture
//!
//! Generators are pure functions of the snapshot. They perform no I/O;
//! anything that needs the live repository is checked later by the
//! operation's `validate`.
//!
//! # Priority bands
//!
//! | band            | priorities |
//! |-----------------|------------|
//! | existence       | 100-199    |
//! | working tree    | 200-299    |
//! | sync            | 300-399    |
//! | branch topology | 400-499    |
//! | informational   | 500+       |

use crate::core::types::{BranchName, RemoteRole};
use crate::engine::detectors::sync::newest_remote;
use crate::engine::state::{
    Dimension, ExistenceScenario, PairStatus, RepositoryState, SyncScenario, TopologyScenario,
    WorkingTreeScenario,
};
use crate::ops::{CompositeOp, FetchOp, Operation, PushOp, ResetOp};

use super::fixes::Fix;

/// Scenario ID for "the sync branch is protected on the hub".
pub const PLATFORM_PROTECTED: &str = "P_PROTECTED";

/// Scenario ID for "the hub's default branch is not the sync branch".
pub const PLATFORM_DEFAULT_BRANCH: &str = "P_DEFAULT_BRANCH";

/// Suggest fixes for a snapshot, stably sorted by priority.
///
/// # Example
///
/// ```ignore
/// use syncdoctor::doctor::suggest_fixes;
///
/// for fix in suggest_fixes(&state) {
///     println!("[{}] {}", fix.scenario(), fix.description());
/// }
/// ```
pub fn suggest_fixes(state: &RepositoryState) -> Vec<Fix> {
    let mut fixes = Vec::new();
    fixes.extend(existence_fixes(state));
    fixes.extend(working_tree_fixes(state));
    fixes.extend(sync_fixes(state));
    fixes.extend(topology_fixes(state));
    fixes.extend(informational_fixes(state));
    fixes.sort_by_key(|f| f.priority());
    fixes
}

/// Core sorts before hub within a band.
fn offset(role: RemoteRole) -> u32 {
    match role {
        RemoteRole::Core => 0,
        RemoteRole::Hub => 1,
    }
}

fn remote_name(state: &RepositoryState, role: RemoteRole) -> &str {
    state.existence.remote(role).name.as_str()
}

fn usable(state: &RepositoryState, role: RemoteRole) -> bool {
    state.existence.remote(role).usable()
}

// =============================================================================
// Existence
// =============================================================================

fn existence_fixes(state: &RepositoryState) -> Vec<Fix> {
    let existence = &state.existence;
    let id = existence.scenario.id();
    let mut fixes = Vec::new();

    match existence.scenario {
        ExistenceScenario::Unknown => fixes.push(Fix::new(
            id,
            Dimension::Existence,
            100,
            "Could not inspect the local repository; check the path and that git is installed",
        )),
        ExistenceScenario::E5 | ExistenceScenario::E6 | ExistenceScenario::E7 => {
            let source = existence
                .usable_remotes()
                .into_iter()
                .find_map(|role| existence.remote(role).url.clone().map(|url| (role, url)));
            if let Some((role, url)) = source {
                fixes.push(
                    Fix::new(
                        id,
                        Dimension::Existence,
                        100,
                        format!("No local copy; clone it from the {} remote", role),
                    )
                    .with_command(format!("git clone {}", url)),
                );
            }
        }
        ExistenceScenario::E8 => fixes.push(Fix::new(
            id,
            Dimension::Existence,
            100,
            "No copy of the repository was found; create it, or set remotes.core_url and remotes.hub_url",
        )),
        _ => {}
    }

    for role in RemoteRole::ALL {
        let presence = existence.remote(role);
        if existence.local_exists && !presence.configured {
            let url = presence.url.as_deref().unwrap_or("<url>");
            fixes.push(
                Fix::new(
                    id,
                    Dimension::Existence,
                    110 + offset(role),
                    format!("Add the {} remote '{}'", role, presence.name),
                )
                .with_command(format!("git remote add {} {}", presence.name, url)),
            );
        } else if presence.configured && !presence.reachable {
            let target = if existence.local_exists {
                presence.name.as_str()
            } else {
                presence.url.as_deref().unwrap_or(presence.name.as_str())
            };
            fixes.push(
                Fix::new(
                    id,
                    Dimension::Existence,
                    120 + offset(role),
                    format!(
                        "The {} remote '{}' is unreachable; check network access and credentials",
                        role, presence.name
                    ),
                )
                .with_command(format!("git ls-remote {}", target)),
            );
        }
    }

    fixes
}

// =============================================================================
// Working tree
// =============================================================================

fn working_tree_fixes(state: &RepositoryState) -> Vec<Fix> {
    let wt = &state.working_tree;
    if !state.existence.local_exists || wt.scenario == WorkingTreeScenario::Unknown {
        return Vec::new();
    }
    let id = wt.scenario.id();
    let mut fixes = Vec::new();

    let changes = match wt.scenario {
        WorkingTreeScenario::W2 => Some(("Commit or unstage the staged changes", "git commit")),
        WorkingTreeScenario::W3 => Some(("Commit or stash the unstaged changes", "git stash push")),
        WorkingTreeScenario::W4 => Some((
            "Commit, ignore or remove the untracked files",
            "git status --untracked-files=all",
        )),
        WorkingTreeScenario::W5 => Some((
            "Commit or stash the local changes",
            "git stash push --include-untracked",
        )),
        WorkingTreeScenario::W1 | WorkingTreeScenario::Unknown => None,
    };
    if let Some((description, command)) = changes {
        fixes.push(Fix::new(id, Dimension::WorkingTree, 200, description).with_command(command));
    }

    if !wt.conflicted.is_empty() {
        fixes.push(
            Fix::new(
                id,
                Dimension::WorkingTree,
                201,
                format!("Resolve merge conflicts in {} path(s)", wt.conflicted.len()),
            )
            .with_command("git mergetool"),
        );
    }

    if wt.detached_head {
        let branch = state
            .sync
            .branch
            .as_ref()
            .map(BranchName::as_str)
            .unwrap_or("main");
        fixes.push(
            Fix::new(
                id,
                Dimension::WorkingTree,
                210,
                format!("HEAD is detached; check out '{}'", branch),
            )
            .with_command(format!("git switch {}", branch)),
        );
    }

    if wt.shallow {
        fixes.push(
            Fix::new(
                id,
                Dimension::WorkingTree,
                220,
                "Shallow clone; fetch the full history before comparing",
            )
            .with_command(format!(
                "git fetch --unshallow {}",
                remote_name(state, RemoteRole::Core)
            )),
        );
    }

    for path in &wt.orphaned_gitlinks {
        fixes.push(
            Fix::new(
                id,
                Dimension::WorkingTree,
                230,
                format!("Submodule entry '{}' has no .gitmodules entry; remove it", path),
            )
            .with_command(format!("git rm --cached {}", path)),
        );
    }

    fixes
}

// =============================================================================
// Sync
// =============================================================================

fn sync_fixes(state: &RepositoryState) -> Vec<Fix> {
    let sync = &state.sync;
    let Some(branch) = sync.branch.as_ref() else {
        return Vec::new();
    };
    let id = sync.scenario.id();
    let mut fixes = Vec::new();

    let mut fetch_roles = sync.stale.clone();
    if sync.scenario == SyncScenario::Unknown {
        fetch_roles.extend(state.existence.usable_remotes());
    }
    for role in RemoteRole::ALL {
        if fetch_roles.contains(&role) && usable(state, role) {
            let name = remote_name(state, role);
            fixes.push(
                Fix::new(
                    id,
                    Dimension::Sync,
                    300 + offset(role),
                    format!("Fetch the {} remote '{}' to refresh its refs", role, name),
                )
                .with_command(format!("git fetch {}", name))
                .with_operation(Operation::Fetch(FetchOp::new(role, name))),
            );
        }
    }

    let push = |role: RemoteRole| push_fix(state, id, branch, role, 310 + offset(role), None);
    let compared = sync.compared_remote.unwrap_or(RemoteRole::Core);

    match sync.scenario {
        SyncScenario::S1 | SyncScenario::Unknown | SyncScenario::NotApplicable => {}
        SyncScenario::S2 if sync.partial => fixes.push(push(compared)),
        SyncScenario::S2 | SyncScenario::S11 => {
            fixes.push(push(RemoteRole::Core));
            fixes.push(push(RemoteRole::Hub));
        }
        SyncScenario::S3 => fixes.push(fast_forward_fix(state, id, branch, compared)),
        SyncScenario::S5 => fixes.push(push(RemoteRole::Hub)),
        SyncScenario::S7 => fixes.push(push(RemoteRole::Core)),
        SyncScenario::S6 => fixes.push(catch_up_fix(state, id, branch, RemoteRole::Hub)),
        SyncScenario::S8 => fixes.push(catch_up_fix(state, id, branch, RemoteRole::Core)),
        SyncScenario::S12 => fixes.push(catch_up_fix(state, id, branch, newest_remote(sync))),
        SyncScenario::S4 | SyncScenario::S9 | SyncScenario::S10 | SyncScenario::S13 => {
            fixes.push(manual_merge_fix(state, id, branch));
        }
    }

    for role in state.retry.pending() {
        if !usable(state, role) {
            continue;
        }
        if matches!(
            sync.local_vs(role).status,
            PairStatus::Behind | PairStatus::Diverged
        ) {
            continue;
        }
        fixes.retain(|f| !is_push_to(f, role, branch));
        fixes.push(push_fix(
            state,
            id,
            branch,
            role,
            305 + offset(role),
            Some("Retry the failed push"),
        ));
    }

    fixes
}

fn push_fix(
    state: &RepositoryState,
    id: &str,
    branch: &BranchName,
    role: RemoteRole,
    priority: u32,
    lead: Option<&str>,
) -> Fix {
    let name = remote_name(state, role);
    let description = match lead {
        Some(lead) => format!("{} of '{}' to the {} remote '{}'", lead, branch, role, name),
        None => format!("Push '{}' to the {} remote '{}'", branch, role, name),
    };
    Fix::new(id, Dimension::Sync, priority, description)
        .with_command(format!("git push {} {}", name, branch))
        .with_operation(Operation::Push(PushOp::new(role, name, branch.clone())))
}

fn fast_forward_fix(state: &RepositoryState, id: &str, branch: &BranchName, role: RemoteRole) -> Fix {
    let name = remote_name(state, role);
    let fix = Fix::new(
        id,
        Dimension::Sync,
        320,
        format!("Fast-forward '{}' to {}/{}", branch, name, branch),
    )
    .with_command(format!("git merge --ff-only {}/{}", name, branch));
    // A remote name that cannot form a ref leaves only the manual command.
    match ResetOp::new(branch.clone(), role, name) {
        Ok(reset) => fix.with_operation(Operation::Reset(reset)),
        Err(_) => fix,
    }
}

/// Fast-forward to `newest`, then bring the other remote up to date.
fn catch_up_fix(state: &RepositoryState, id: &str, branch: &BranchName, newest: RemoteRole) -> Fix {
    let source = remote_name(state, newest);
    let other = newest.other();
    let other_name = remote_name(state, other);
    let fix = Fix::new(
        id,
        Dimension::Sync,
        320,
        format!(
            "Fast-forward '{}' to {}/{}, then push it to the {} remote '{}'",
            branch, source, branch, other, other_name
        ),
    )
    .with_command(format!(
        "git merge --ff-only {}/{} && git push {} {}",
        source, branch, other_name, branch
    ));
    match ResetOp::new(branch.clone(), newest, source) {
        Ok(reset) => fix.with_operation(Operation::Composite(CompositeOp::new(vec![
            Operation::Reset(reset),
            Operation::Push(PushOp::new(other, other_name, branch.clone())),
        ]))),
        Err(_) => fix,
    }
}

fn manual_merge_fix(state: &RepositoryState, id: &str, branch: &BranchName) -> Fix {
    let sync = &state.sync;
    let (what, merge_from) = match sync.scenario {
        SyncScenario::S4 if sync.partial => {
            let role = sync.compared_remote.unwrap_or(RemoteRole::Core);
            (format!("'{}' has diverged from the {} remote", branch, role), Some(role))
        }
        SyncScenario::S4 => (
            format!("'{}' has diverged from both remotes", branch),
            Some(RemoteRole::Core),
        ),
        SyncScenario::S9 => (
            "The hub has diverged from local and core".to_string(),
            Some(RemoteRole::Hub),
        ),
        SyncScenario::S10 => (
            "The core has diverged from local and hub".to_string(),
            Some(RemoteRole::Core),
        ),
        _ => (
            format!("'{}' has diverged across all three locations", branch),
            None,
        ),
    };
    let fix = Fix::new(
        id,
        Dimension::Sync,
        390,
        format!("{}; manual merge required", what),
    );
    match merge_from {
        Some(role) => fix.with_command(format!(
            "git merge {}/{}",
            remote_name(state, role),
            branch
        )),
        None => fix,
    }
}

fn is_push_to(fix: &Fix, role: RemoteRole, branch: &BranchName) -> bool {
    matches!(fix.operation(), Some(Operation::Push(p)) if p.role == role && &p.branch == branch)
}

// =============================================================================
// Branch topology
// =============================================================================

fn topology_fixes(state: &RepositoryState) -> Vec<Fix> {
    let sync_branch = state.sync.branch.as_ref().map(BranchName::as_str);
    let core = remote_name(state, RemoteRole::Core);
    let hub = remote_name(state, RemoteRole::Hub);
    let mut fixes = Vec::new();

    for entry in &state.topology {
        if Some(entry.branch.as_str()) == sync_branch {
            continue;
        }
        let id = format!("{}:{}", entry.scenario.id(), entry.branch);
        let b = entry.branch.as_str();

        match entry.scenario {
            TopologyScenario::B2 | TopologyScenario::B3 => {
                let role = if entry.scenario == TopologyScenario::B2 {
                    RemoteRole::Hub
                } else {
                    RemoteRole::Core
                };
                let Ok(branch) = BranchName::new(b) else { continue };
                if usable(state, role) {
                    fixes.push(push_topology_fix(state, &id, branch, role));
                }
            }
            TopologyScenario::B4 => fixes.push(
                Fix::new(
                    id,
                    Dimension::Topology,
                    420,
                    format!("Branch '{}' exists only locally; push it if it should be shared", b),
                )
                .with_command(format!("git push -u {} {}", core, b)),
            ),
            TopologyScenario::B5 => fixes.push(
                Fix::new(
                    id,
                    Dimension::Topology,
                    430,
                    format!("Branch '{}' exists on both remotes but not locally", b),
                )
                .with_command(format!("git switch {}", b)),
            ),
            TopologyScenario::B6 => fixes.push(
                Fix::new(
                    id,
                    Dimension::Topology,
                    430,
                    format!("Branch '{}' exists only on the core; check it out or mirror it to the hub", b),
                )
                .with_command(format!("git push {} {}/{}:refs/heads/{}", hub, core, b, b)),
            ),
            TopologyScenario::B7 => fixes.push(
                Fix::new(
                    id,
                    Dimension::Topology,
                    431,
                    format!("Branch '{}' exists only on the hub; check it out or mirror it to the core", b),
                )
                .with_command(format!("git push {} {}/{}:refs/heads/{}", core, hub, b, b)),
            ),
            TopologyScenario::B1 | TopologyScenario::Unknown => {}
        }
    }

    fixes
}

fn push_topology_fix(state: &RepositoryState, id: &str, branch: BranchName, role: RemoteRole) -> Fix {
    let name = remote_name(state, role);
    Fix::new(
        id,
        Dimension::Topology,
        410 + offset(role),
        format!("Push branch '{}' to the {} remote '{}'", branch, role, name),
    )
    .with_command(format!("git push {} {}", name, branch))
    .with_operation(Operation::Push(PushOp::new(role, name, branch)))
}

// =============================================================================
// Informational
// =============================================================================

fn informational_fixes(state: &RepositoryState) -> Vec<Fix> {
    let mut fixes = Vec::new();
    let corruption = &state.corruption;
    let id = corruption.scenario.id();

    if !corruption.large_objects.is_empty() {
        let count = corruption.large_objects.len();
        let fix = if corruption.lfs_active {
            Fix::new(
                id,
                Dimension::Corruption,
                501,
                format!(
                    "{} blob(s) above {} bytes are committed outside Git LFS",
                    count, corruption.threshold
                ),
            )
        } else {
            Fix::new(
                id,
                Dimension::Corruption,
                500,
                format!(
                    "{} blob(s) above {} bytes; move them to Git LFS (rewrites history)",
                    count, corruption.threshold
                ),
            )
        };
        fixes.push(fix.with_command(format!(
            "git lfs migrate import --everything --above={}b",
            corruption.threshold
        )));
    }

    if corruption.garbage_objects > 0 {
        fixes.push(
            Fix::new(
                id,
                Dimension::Corruption,
                505,
                format!(
                    "{} stray or damaged object file(s); check the object store",
                    corruption.garbage_objects
                ),
            )
            .with_command("git fsck --full"),
        );
    }

    let sync_branch = state.sync.branch.as_ref();
    if state.platform.branch_protected == Some(true) {
        let branch = sync_branch.map(BranchName::as_str).unwrap_or("main");
        let admin = if state.platform.can_admin == Some(true) {
            " (you have admin rights)"
        } else {
            ""
        };
        fixes.push(Fix::new(
            PLATFORM_PROTECTED,
            Dimension::Platform,
            510,
            format!(
                "'{}' is protected on the hub; pushes may be rejected{}",
                branch, admin
            ),
        ));
    }

    if let (Some(default), Some(branch)) = (&state.platform.default_branch, sync_branch) {
        if default != branch.as_str() {
            fixes.push(
                Fix::new(
                    PLATFORM_DEFAULT_BRANCH,
                    Dimension::Platform,
                    520,
                    format!(
                        "The hub's default branch is '{}', but '{}' is being synced",
                        default, branch
                    ),
                )
                .with_command(format!(
                    "set default_branch = \"{}\" in .git/syncdoctor/config.toml",
                    default
                )),
            );
        }
    }

    fixes
}
