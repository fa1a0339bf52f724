//! engine::state
//!
//! The immutable repository snapshot and its per-dimension parts.
//!
//! # Invariants
//!
//! - A [`RepositoryState`] is produced once per detection and never mutated.
//!   Fields are public for reading; nothing in the crate takes `&mut` to one.
//! - Every `scenario` field comes from [`super::tables`]. An observation the
//!   table does not cover carries the dimension's unknown sentinel.
//! - Path and branch collections are sorted, so two detections of an
//!   unchanged repository compare equal apart from `detected_at`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::retry::RetryMarkers;
use crate::core::types::{BranchName, Fingerprint, Oid, RemoteRole};
use crate::git::AheadBehind;

/// The five classification dimensions, plus platform facts for warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Existence,
    WorkingTree,
    Sync,
    Topology,
    Corruption,
    Platform,
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Dimension::Existence => "existence",
            Dimension::WorkingTree => "working tree",
            Dimension::Sync => "sync",
            Dimension::Topology => "topology",
            Dimension::Corruption => "corruption",
            Dimension::Platform => "platform",
        };
        f.write_str(s)
    }
}

// =============================================================================
// Scenario identifiers
// =============================================================================

/// Existence scenarios over (local, core usable, hub usable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExistenceScenario {
    E1,
    E2,
    E3,
    E4,
    E5,
    E6,
    E7,
    E8,
    #[serde(rename = "E_UNKNOWN")]
    Unknown,
}

impl ExistenceScenario {
    pub fn id(self) -> &'static str {
        match self {
            Self::E1 => "E1",
            Self::E2 => "E2",
            Self::E3 => "E3",
            Self::E4 => "E4",
            Self::E5 => "E5",
            Self::E6 => "E6",
            Self::E7 => "E7",
            Self::E8 => "E8",
            Self::Unknown => "E_UNKNOWN",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::E1 => "local, core and hub all present",
            Self::E2 => "hub missing or unreachable",
            Self::E3 => "core missing or unreachable",
            Self::E4 => "local only, no usable remote",
            Self::E5 => "no local copy; core and hub present",
            Self::E6 => "no local copy; only core present",
            Self::E7 => "no local copy; only hub present",
            Self::E8 => "nothing exists",
            Self::Unknown => "existence could not be determined",
        }
    }
}

/// Working tree scenarios over (staged, unstaged, untracked).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkingTreeScenario {
    W1,
    W2,
    W3,
    W4,
    W5,
    #[default]
    #[serde(rename = "W_UNKNOWN")]
    Unknown,
}

impl WorkingTreeScenario {
    pub fn id(self) -> &'static str {
        match self {
            Self::W1 => "W1",
            Self::W2 => "W2",
            Self::W3 => "W3",
            Self::W4 => "W4",
            Self::W5 => "W5",
            Self::Unknown => "W_UNKNOWN",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::W1 => "working tree clean",
            Self::W2 => "staged changes only",
            Self::W3 => "unstaged changes only",
            Self::W4 => "untracked files only",
            Self::W5 => "mixed changes",
            Self::Unknown => "working tree state could not be determined",
        }
    }
}

/// Sync scenarios over (local-core, local-hub, core-hub).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SyncScenario {
    S1,
    S2,
    S3,
    S4,
    S5,
    S6,
    S7,
    S8,
    S9,
    S10,
    S11,
    S12,
    S13,
    #[serde(rename = "S_UNKNOWN")]
    Unknown,
    #[serde(rename = "S_NA")]
    NotApplicable,
}

impl SyncScenario {
    pub fn id(self) -> &'static str {
        match self {
            Self::S1 => "S1",
            Self::S2 => "S2",
            Self::S3 => "S3",
            Self::S4 => "S4",
            Self::S5 => "S5",
            Self::S6 => "S6",
            Self::S7 => "S7",
            Self::S8 => "S8",
            Self::S9 => "S9",
            Self::S10 => "S10",
            Self::S11 => "S11",
            Self::S12 => "S12",
            Self::S13 => "S13",
            Self::Unknown => "S_UNKNOWN",
            Self::NotApplicable => "S_NA",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::S1 => "fully synced",
            Self::S2 => "local ahead of remotes",
            Self::S3 => "local behind remotes",
            Self::S4 => "local diverged from remotes",
            Self::S5 => "hub behind",
            Self::S6 => "hub ahead",
            Self::S7 => "core behind",
            Self::S8 => "core ahead",
            Self::S9 => "hub diverged",
            Self::S10 => "core diverged",
            Self::S11 => "local ahead of both remotes, remotes at different points",
            Self::S12 => "linear history, newest commits on a remote",
            Self::S13 => "multi-way divergence",
            Self::Unknown => "sync state could not be determined",
            Self::NotApplicable => "no usable remote to compare against",
        }
    }

    /// Whether the scenario involves divergent history.
    pub fn is_divergent(self) -> bool {
        matches!(self, Self::S4 | Self::S9 | Self::S10 | Self::S13)
    }
}

/// Branch topology scenarios over (local, core, hub) presence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TopologyScenario {
    B1,
    B2,
    B3,
    B4,
    B5,
    B6,
    B7,
    #[serde(rename = "B_UNKNOWN")]
    Unknown,
}

impl TopologyScenario {
    pub fn id(self) -> &'static str {
        match self {
            Self::B1 => "B1",
            Self::B2 => "B2",
            Self::B3 => "B3",
            Self::B4 => "B4",
            Self::B5 => "B5",
            Self::B6 => "B6",
            Self::B7 => "B7",
            Self::Unknown => "B_UNKNOWN",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::B1 => "on local, core and hub",
            Self::B2 => "on local and core only",
            Self::B3 => "on local and hub only",
            Self::B4 => "local only",
            Self::B5 => "on core and hub, not local",
            Self::B6 => "on core only",
            Self::B7 => "on hub only",
            Self::Unknown => "branch presence could not be determined",
        }
    }
}

/// Corruption scenarios over (garbage objects, large blobs, LFS active).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CorruptionScenario {
    C1,
    C2,
    C3,
    C4,
    C5,
    C6,
    C7,
    C8,
    #[serde(rename = "C_UNKNOWN")]
    Unknown,
}

impl CorruptionScenario {
    pub fn id(self) -> &'static str {
        match self {
            Self::C1 => "C1",
            Self::C2 => "C2",
            Self::C3 => "C3",
            Self::C4 => "C4",
            Self::C5 => "C5",
            Self::C6 => "C6",
            Self::C7 => "C7",
            Self::C8 => "C8",
            Self::Unknown => "C_UNKNOWN",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::C1 => "object store healthy",
            Self::C2 => "healthy, using LFS",
            Self::C3 => "large blobs without LFS",
            Self::C4 => "large blobs committed despite LFS",
            Self::C5 => "garbage objects present",
            Self::C6 => "garbage objects present, using LFS",
            Self::C7 => "garbage objects and large blobs without LFS",
            Self::C8 => "garbage objects and large blobs despite LFS",
            Self::Unknown => "object store state could not be determined",
        }
    }
}

// =============================================================================
// Dimension states
// =============================================================================

/// Configuration and reachability of one remote.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemotePresence {
    /// Git remote name for this role.
    pub name: String,
    /// A URL is configured for the remote.
    pub configured: bool,
    /// `ls-remote` succeeded within the probe deadline.
    pub reachable: bool,
    pub url: Option<String>,
}

impl RemotePresence {
    /// Configured and reachable; only then does the remote count as existing.
    pub fn usable(&self) -> bool {
        self.configured && self.reachable
    }
}

/// Where the repository exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistenceState {
    pub local_exists: bool,
    pub core: RemotePresence,
    pub hub: RemotePresence,
    pub scenario: ExistenceScenario,
}

impl ExistenceState {
    /// Presence for one role.
    pub fn remote(&self, role: RemoteRole) -> &RemotePresence {
        match role {
            RemoteRole::Core => &self.core,
            RemoteRole::Hub => &self.hub,
        }
    }

    /// Roles whose remote is usable, core first.
    pub fn usable_remotes(&self) -> Vec<RemoteRole> {
        RemoteRole::ALL
            .into_iter()
            .filter(|r| self.remote(*r).usable())
            .collect()
    }
}

/// Local modifications and HEAD flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingTreeState {
    pub clean: bool,
    pub staged: Vec<String>,
    pub unstaged: Vec<String>,
    pub untracked: Vec<String>,
    pub conflicted: Vec<String>,
    pub detached_head: bool,
    pub current_branch: Option<BranchName>,
    pub shallow: bool,
    /// Gitlinks in the index with no `.gitmodules` entry.
    pub orphaned_gitlinks: Vec<String>,
    pub scenario: WorkingTreeScenario,
}

impl WorkingTreeState {
    /// State used when the working tree could not be read.
    pub fn unknown() -> Self {
        Self {
            scenario: WorkingTreeScenario::Unknown,
            ..Default::default()
        }
    }
}

/// Relationship between two locations' tips, from the left side's view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PairStatus {
    Synced,
    Ahead,
    Behind,
    Diverged,
    Unknown,
}

impl PairStatus {
    /// Every status, for exhaustive table checks.
    pub const ALL: [PairStatus; 5] = [
        PairStatus::Synced,
        PairStatus::Ahead,
        PairStatus::Behind,
        PairStatus::Diverged,
        PairStatus::Unknown,
    ];

    /// One-character code used in logs: `=`, `A`, `B`, `D`, `?`.
    pub fn code(self) -> char {
        match self {
            PairStatus::Synced => '=',
            PairStatus::Ahead => 'A',
            PairStatus::Behind => 'B',
            PairStatus::Diverged => 'D',
            PairStatus::Unknown => '?',
        }
    }
}

/// A compared pair with its commit counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairComparison {
    pub status: PairStatus,
    pub ahead: u32,
    pub behind: u32,
}

impl PairComparison {
    /// A pair that was not or could not be compared.
    pub fn unknown() -> Self {
        Self {
            status: PairStatus::Unknown,
            ahead: 0,
            behind: 0,
        }
    }
}

impl From<AheadBehind> for PairComparison {
    fn from(counts: AheadBehind) -> Self {
        let status = match (counts.ahead, counts.behind) {
            (0, 0) => PairStatus::Synced,
            (_, 0) => PairStatus::Ahead,
            (0, _) => PairStatus::Behind,
            _ => PairStatus::Diverged,
        };
        Self {
            status,
            ahead: counts.ahead,
            behind: counts.behind,
        }
    }
}

/// Commit graph relationship of the sync branch across the three locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncState {
    pub branch: Option<BranchName>,
    pub local_tip: Option<Oid>,
    pub core_tip: Option<Oid>,
    pub hub_tip: Option<Oid>,
    pub local_core: PairComparison,
    pub local_hub: PairComparison,
    pub core_hub: PairComparison,
    pub scenario: SyncScenario,
    /// Only local and one remote were compared.
    pub partial: bool,
    pub compared_remote: Option<RemoteRole>,
    /// Remotes whose fetch failed; their refs may be old.
    pub stale: Vec<RemoteRole>,
}

impl SyncState {
    /// Sync state with nothing compared.
    pub fn empty(scenario: SyncScenario) -> Self {
        Self {
            branch: None,
            local_tip: None,
            core_tip: None,
            hub_tip: None,
            local_core: PairComparison::unknown(),
            local_hub: PairComparison::unknown(),
            core_hub: PairComparison::unknown(),
            scenario,
            partial: false,
            compared_remote: None,
            stale: Vec::new(),
        }
    }

    /// Local compared against one remote.
    pub fn local_vs(&self, role: RemoteRole) -> &PairComparison {
        match role {
            RemoteRole::Core => &self.local_core,
            RemoteRole::Hub => &self.local_hub,
        }
    }

    /// Tip of the sync branch on a remote.
    pub fn remote_tip(&self, role: RemoteRole) -> Option<&Oid> {
        match role {
            RemoteRole::Core => self.core_tip.as_ref(),
            RemoteRole::Hub => self.hub_tip.as_ref(),
        }
    }
}

/// Presence of one branch name across the three locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchTopologyEntry {
    pub branch: String,
    pub local: bool,
    pub core: bool,
    pub hub: bool,
    pub scenario: TopologyScenario,
}

impl BranchTopologyEntry {
    /// Marker for a branch whose presence could not be listed.
    pub fn unknown(branch: impl Into<String>) -> Self {
        Self {
            branch: branch.into(),
            local: false,
            core: false,
            hub: false,
            scenario: TopologyScenario::Unknown,
        }
    }
}

/// A blob above the size threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LargeObject {
    pub oid: Oid,
    pub size: u64,
}

/// Object store health.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorruptionState {
    pub large_objects: Vec<LargeObject>,
    pub lfs_active: bool,
    pub garbage_objects: u64,
    pub threshold: u64,
    pub scenario: CorruptionScenario,
}

impl CorruptionState {
    /// State used when the object store could not be read.
    pub fn unknown(threshold: u64) -> Self {
        Self {
            large_objects: Vec::new(),
            lfs_active: false,
            garbage_objects: 0,
            threshold,
            scenario: CorruptionScenario::Unknown,
        }
    }
}

/// Facts about the hub's hosting platform. `None` means unknown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformInfo {
    pub default_branch: Option<String>,
    pub branch_protected: Option<bool>,
    pub can_admin: Option<bool>,
}

/// Category of a detection failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    Timeout,
    Auth,
    NotFound,
    Failed,
}

/// A dimension that degraded instead of aborting detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionWarning {
    pub dimension: Dimension,
    pub kind: WarningKind,
    pub message: String,
}

impl DetectionWarning {
    /// Build a warning from a git failure.
    pub fn from_git(dimension: Dimension, err: &crate::git::GitError) -> Self {
        use crate::git::GitError;
        let kind = match err {
            GitError::Timeout { .. } => WarningKind::Timeout,
            GitError::Auth { .. } => WarningKind::Auth,
            GitError::NotFound { .. } => WarningKind::NotFound,
            _ => WarningKind::Failed,
        };
        Self {
            dimension,
            kind,
            message: err.to_string(),
        }
    }
}

/// Immutable snapshot of one detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryState {
    pub existence: ExistenceState,
    pub working_tree: WorkingTreeState,
    pub sync: SyncState,
    pub topology: Vec<BranchTopologyEntry>,
    pub corruption: CorruptionState,
    pub retry: RetryMarkers,
    pub platform: PlatformInfo,
    pub warnings: Vec<DetectionWarning>,
    pub detected_at: DateTime<Utc>,
}

impl RepositoryState {
    /// Canonical IDs of every dimension, topology entries as `B1:<branch>`.
    pub fn scenario_ids(&self) -> Vec<String> {
        let mut ids = vec![
            self.existence.scenario.id().to_string(),
            self.working_tree.scenario.id().to_string(),
            self.sync.scenario.id().to_string(),
            self.corruption.scenario.id().to_string(),
        ];
        ids.extend(
            self.topology
                .iter()
                .map(|t| format!("{}:{}", t.scenario.id(), t.branch)),
        );
        ids
    }

    /// Digest of everything observed, excluding the timestamp.
    pub fn fingerprint(&self) -> Fingerprint {
        let opt = |o: Option<&Oid>| o.map(|o| o.to_string()).unwrap_or_default();
        let pair = |p: &PairComparison| format!("{}{}/{}", p.status.code(), p.ahead, p.behind);

        let mut parts = self.scenario_ids();
        parts.push(opt(self.sync.local_tip.as_ref()));
        parts.push(opt(self.sync.core_tip.as_ref()));
        parts.push(opt(self.sync.hub_tip.as_ref()));
        parts.push(pair(&self.sync.local_core));
        parts.push(pair(&self.sync.local_hub));
        parts.push(pair(&self.sync.core_hub));
        for set in [
            &self.working_tree.staged,
            &self.working_tree.unstaged,
            &self.working_tree.untracked,
        ] {
            parts.push(set.join("\n"));
        }
        parts.extend(self.corruption.large_objects.iter().map(|o| o.oid.to_string()));
        parts.push(format!("{:?}", self.retry));
        Fingerprint::compute(&parts)
    }

    /// Warnings for one dimension.
    pub fn warnings_for(&self, dimension: Dimension) -> impl Iterator<Item = &DetectionWarning> {
        self.warnings.iter().filter(move |w| w.dimension == dimension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_from_counts() {
        let cases = [
            ((0, 0), PairStatus::Synced),
            ((2, 0), PairStatus::Ahead),
            ((0, 5), PairStatus::Behind),
            ((1, 1), PairStatus::Diverged),
        ];
        for ((ahead, behind), expected) in cases {
            let pair = PairComparison::from(AheadBehind { ahead, behind });
            assert_eq!(pair.status, expected);
            assert_eq!((pair.ahead, pair.behind), (ahead, behind));
        }
    }

    #[test]
    fn sentinel_ids_serialize() {
        assert_eq!(
            serde_json::to_string(&SyncScenario::NotApplicable).unwrap(),
            "\"S_NA\""
        );
        assert_eq!(
            serde_json::to_string(&CorruptionScenario::Unknown).unwrap(),
            "\"C_UNKNOWN\""
        );
        assert_eq!(serde_json::to_string(&SyncScenario::S13).unwrap(), "\"S13\"");
        let parsed: TopologyScenario = serde_json::from_str("\"B_UNKNOWN\"").unwrap();
        assert_eq!(parsed, TopologyScenario::Unknown);
    }

    #[test]
    fn usable_requires_configured_and_reachable() {
        let mut presence = RemotePresence {
            name: "hub".into(),
            configured: true,
            reachable: false,
            url: None,
        };
        assert!(!presence.usable());
        presence.reachable = true;
        assert!(presence.usable());
    }

    #[test]
    fn divergent_sync_scenarios() {
        let divergent: Vec<_> = [
            SyncScenario::S1,
            SyncScenario::S4,
            SyncScenario::S9,
            SyncScenario::S10,
            SyncScenario::S12,
            SyncScenario::S13,
        ]
        .into_iter()
        .filter(|s| s.is_divergent())
        .collect();
        assert_eq!(
            divergent,
            vec![
                SyncScenario::S4,
                SyncScenario::S9,
                SyncScenario::S10,
                SyncScenario::S13
            ]
        );
    }
}
