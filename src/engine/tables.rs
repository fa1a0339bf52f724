//! engine::tables
//!
//! Decision tables: pure, total functions from each dimension's observed
//! tuple to its canonical scenario ID.
//!
//! # Invariants
//!
//! - Every input has exactly one output. A tuple with no table entry maps to
//!   the dimension's unknown sentinel, never to the nearest-looking scenario.
//! - No I/O. Detectors gather observations; these functions only classify.
//!
//! # Sync tuples
//!
//! The sync table is keyed by `(local-core, local-hub, core-hub)`, each from
//! the left side's view. Tuples that cannot arise from three real commit
//! graphs, such as `(=, A, B)`, are absent and classify as `S_UNKNOWN`.

use super::state::{
    CorruptionScenario, ExistenceScenario, PairStatus, SyncScenario, TopologyScenario,
    WorkingTreeScenario,
};

use PairStatus::{Ahead as A, Behind as B, Diverged as D, Synced as Same};

/// Every consistent sync tuple and its scenario.
pub const SYNC_TABLE: &[((PairStatus, PairStatus, PairStatus), SyncScenario)] = &[
    ((Same, Same, Same), SyncScenario::S1),
    ((A, A, Same), SyncScenario::S2),
    ((B, B, Same), SyncScenario::S3),
    ((D, D, Same), SyncScenario::S4),
    ((Same, A, A), SyncScenario::S5),
    ((Same, B, B), SyncScenario::S6),
    ((A, Same, B), SyncScenario::S7),
    ((B, Same, A), SyncScenario::S8),
    ((Same, D, D), SyncScenario::S9),
    ((D, Same, D), SyncScenario::S10),
    // Local ahead of both, remotes apart.
    ((A, A, A), SyncScenario::S11),
    ((A, A, B), SyncScenario::S11),
    // One straight line, newest tip on a remote.
    ((B, B, A), SyncScenario::S12),
    ((B, B, B), SyncScenario::S12),
    ((A, B, B), SyncScenario::S12),
    ((B, A, A), SyncScenario::S12),
    // Divergence involving all three locations.
    ((A, A, D), SyncScenario::S13),
    ((B, B, D), SyncScenario::S13),
    ((D, A, A), SyncScenario::S13),
    ((D, A, D), SyncScenario::S13),
    ((D, B, B), SyncScenario::S13),
    ((D, B, D), SyncScenario::S13),
    ((D, D, A), SyncScenario::S13),
    ((D, D, B), SyncScenario::S13),
    ((D, D, D), SyncScenario::S13),
    ((A, D, B), SyncScenario::S13),
    ((A, D, D), SyncScenario::S13),
    ((B, D, A), SyncScenario::S13),
    ((B, D, D), SyncScenario::S13),
];

/// Classify existence from (local, core usable, hub usable).
pub fn existence(local: bool, core: bool, hub: bool) -> ExistenceScenario {
    match (local, core, hub) {
        (true, true, true) => ExistenceScenario::E1,
        (true, true, false) => ExistenceScenario::E2,
        (true, false, true) => ExistenceScenario::E3,
        (true, false, false) => ExistenceScenario::E4,
        (false, true, true) => ExistenceScenario::E5,
        (false, true, false) => ExistenceScenario::E6,
        (false, false, true) => ExistenceScenario::E7,
        (false, false, false) => ExistenceScenario::E8,
    }
}

/// Classify the working tree from which kinds of change are present.
///
/// Conflicted entries must already be folded into `unstaged`.
pub fn working_tree(staged: bool, unstaged: bool, untracked: bool) -> WorkingTreeScenario {
    match (staged, unstaged, untracked) {
        (false, false, false) => WorkingTreeScenario::W1,
        (true, false, false) => WorkingTreeScenario::W2,
        (false, true, false) => WorkingTreeScenario::W3,
        (false, false, true) => WorkingTreeScenario::W4,
        _ => WorkingTreeScenario::W5,
    }
}

/// Classify the three-way sync tuple.
pub fn sync(local_core: PairStatus, local_hub: PairStatus, core_hub: PairStatus) -> SyncScenario {
    let key = (local_core, local_hub, core_hub);
    SYNC_TABLE
        .iter()
        .find(|(tuple, _)| *tuple == key)
        .map(|(_, scenario)| *scenario)
        .unwrap_or(SyncScenario::Unknown)
}

/// Classify a two-location comparison (local against one remote).
///
/// Reuses S1-S4; the caller marks the state partial.
pub fn sync_partial(local_remote: PairStatus) -> SyncScenario {
    match local_remote {
        PairStatus::Synced => SyncScenario::S1,
        PairStatus::Ahead => SyncScenario::S2,
        PairStatus::Behind => SyncScenario::S3,
        PairStatus::Diverged => SyncScenario::S4,
        PairStatus::Unknown => SyncScenario::Unknown,
    }
}

/// Classify branch presence across (local, core, hub).
pub fn topology(local: bool, core: bool, hub: bool) -> TopologyScenario {
    match (local, core, hub) {
        (true, true, true) => TopologyScenario::B1,
        (true, true, false) => TopologyScenario::B2,
        (true, false, true) => TopologyScenario::B3,
        (true, false, false) => TopologyScenario::B4,
        (false, true, true) => TopologyScenario::B5,
        (false, true, false) => TopologyScenario::B6,
        (false, false, true) => TopologyScenario::B7,
        (false, false, false) => TopologyScenario::Unknown,
    }
}

/// Classify the object store from (garbage present, large blobs, LFS active).
pub fn corruption(garbage: bool, large: bool, lfs: bool) -> CorruptionScenario {
    match (garbage, large, lfs) {
        (false, false, false) => CorruptionScenario::C1,
        (false, false, true) => CorruptionScenario::C2,
        (false, true, false) => CorruptionScenario::C3,
        (false, true, true) => CorruptionScenario::C4,
        (true, false, false) => CorruptionScenario::C5,
        (true, false, true) => CorruptionScenario::C6,
        (true, true, false) => CorruptionScenario::C7,
        (true, true, true) => CorruptionScenario::C8,
    }
}
