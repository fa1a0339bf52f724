//! engine
//!
//! Repository state detection: probe, detect, classify.
//!
//! # Architecture
//!
//! ```text
//! RemoteProber ──┐
//!                ├─> detectors ──> tables ──> RepositoryState
//! local git   ───┘
//! ```
//!
//! - [`probe`]: reachability and fetching of the core and hub remotes
//! - [`detectors`]: one per dimension, gathering observations through git
//! - [`tables`]: pure decision tables from observations to scenario IDs
//! - [`scan`]: the [`Classifier`], which runs the above concurrently
//! - [`state`]: the immutable snapshot types
//!
//! # Invariants
//!
//! - Every scenario ID comes from a decision table; anything unmatched is
//!   the dimension's unknown sentinel.
//! - Sync and topology are computed only after the fetch phase has joined.
//! - Detection never aborts on a single dimension's failure.
//!
//! # Example
//!
//! ```ignore
//! use syncdoctor::engine::Classifier;
//!
//! let state = Classifier::new(git, config).detect().await;
//! for id in state.scenario_ids() {
//!     println!("{id}");
//! }
//! ```

pub mod detectors;
pub mod probe;
pub mod scan;
pub mod state;
pub mod tables;

pub use probe::{FetchReport, RemoteProber};
pub use scan::Classifier;
pub use state::{
    BranchTopologyEntry, CorruptionScenario, CorruptionState, DetectionWarning, Dimension,
    ExistenceScenario, ExistenceState, LargeObject, PairComparison, PairStatus, PlatformInfo,
    RemotePresence, RepositoryState, SyncScenario, SyncState, TopologyScenario, WarningKind,
    WorkingTreeScenario, WorkingTreeState,
};
