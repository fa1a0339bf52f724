//! engine::detectors::worktree
//!
//! Working tree detection: porcelain status, HEAD attachment, shallow
//! clones and gitlinks with no `.gitmodules` entry.

use std::collections::BTreeSet;

use crate::core::types::BranchName;
use crate::engine::state::{WorkingTreeScenario, WorkingTreeState};
use crate::engine::tables;
use crate::git::{Git, GitError, StatusEntries};

/// Raw observations the classification is computed from.
#[derive(Debug, Clone, Default)]
pub struct WorkingTreeObservations {
    pub status: StatusEntries,
    pub current_branch: Option<BranchName>,
    pub shallow: bool,
    pub gitlinks: Vec<String>,
    pub submodule_paths: BTreeSet<String>,
}

/// Read the working tree of `git`.
pub async fn detect(git: &Git) -> Result<WorkingTreeState, GitError> {
    let status = git.status().await?;
    let current_branch = git.current_branch().await?;
    let shallow = git.is_shallow().await?;
    let gitlinks = git.gitlinks().await?;
    let submodule_paths = if gitlinks.is_empty() {
        BTreeSet::new()
    } else {
        git.gitmodules_paths().await?
    };

    Ok(classify(WorkingTreeObservations {
        status,
        current_branch,
        shallow,
        gitlinks,
        submodule_paths,
    }))
}

/// Classify observations. Conflicted paths already count as unstaged.
pub fn classify(obs: WorkingTreeObservations) -> WorkingTreeState {
    let StatusEntries {
        staged,
        unstaged,
        untracked,
        conflicted,
    } = obs.status;

    let scenario = tables::working_tree(
        !staged.is_empty(),
        !unstaged.is_empty(),
        !untracked.is_empty(),
    );

    let mut orphaned_gitlinks: Vec<String> = obs
        .gitlinks
        .into_iter()
        .filter(|path| !obs.submodule_paths.contains(path))
        .collect();
    orphaned_gitlinks.sort();
    orphaned_gitlinks.dedup();

    WorkingTreeState {
        clean: scenario == WorkingTreeScenario::W1,
        staged: staged.into_iter().collect(),
        unstaged: unstaged.into_iter().collect(),
        untracked: untracked.into_iter().collect(),
        conflicted: conflicted.into_iter().collect(),
        detached_head: obs.current_branch.is_none(),
        current_branch: obs.current_branch,
        shallow: obs.shallow,
        orphaned_gitlinks,
        scenario,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn on_main(status: StatusEntries) -> WorkingTreeObservations {
        WorkingTreeObservations {
            status,
            current_branch: Some(BranchName::new("main").unwrap()),
            ..Default::default()
        }
    }

    #[test]
    fn clean_tree_is_w1() {
        let state = classify(on_main(StatusEntries::default()));
        assert_eq!(state.scenario, WorkingTreeScenario::W1);
        assert!(state.clean);
        assert!(!state.detached_head);
    }

    #[test]
    fn conflicts_count_as_unstaged() {
        let state = classify(on_main(StatusEntries {
            unstaged: set(&["a.txt"]),
            conflicted: set(&["a.txt"]),
            ..Default::default()
        }));
        assert_eq!(state.scenario, WorkingTreeScenario::W3);
        assert_eq!(state.conflicted, vec!["a.txt"]);
    }

    #[test]
    fn two_kinds_is_mixed() {
        let state = classify(on_main(StatusEntries {
            staged: set(&["b"]),
            untracked: set(&["c"]),
            ..Default::default()
        }));
        assert_eq!(state.scenario, WorkingTreeScenario::W5);
        assert!(!state.clean);
    }

    #[test]
    fn untracked_only_is_w4() {
        let state = classify(on_main(StatusEntries {
            untracked: set(&["new.txt"]),
            ..Default::default()
        }));
        assert_eq!(state.scenario, WorkingTreeScenario::W4);
    }

    #[test]
    fn detached_and_orphaned_flags() {
        let state = classify(WorkingTreeObservations {
            current_branch: None,
            shallow: true,
            gitlinks: vec!["vendor/lib".into(), "third_party/x".into()],
            submodule_paths: set(&["third_party/x"]),
            ..Default::default()
        });
        assert!(state.detached_head);
        assert!(state.shallow);
        assert_eq!(state.orphaned_gitlinks, vec!["vendor/lib"]);
    }
}
