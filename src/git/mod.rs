//! git
//!
//! Single interface for all Git operations.
//!
//! # Architecture
//!
//! This module is the **ONLY doorway** to Git. Everything runs as a `git`
//! subprocess through [`exec::Executor`], which bounds each call with a
//! deadline, serializes calls per working directory, and disables
//! interactive credential prompts. [`Git`] layers typed queries on top.
//!
//! # Responsibilities
//!
//! - Repository discovery and storage paths
//! - Ref resolution, ancestry and ahead/behind counts
//! - Working tree status, gitlinks and `.gitmodules`
//! - Object sizes and garbage counts
//! - Remote URL lookup, reachability probes, fetch and push
//! - Fast-forward-only reset (`reset --keep`)
//!
//! # Invariants
//!
//! - No other module spawns git
//! - Push never forces
//! - All operations return strong types (Oid, BranchName)

pub mod exec;
mod interface;

pub use interface::{
    AheadBehind, Deadlines, Git, GitError, ObjectSize, RefEntry, StatusEntries,
};
