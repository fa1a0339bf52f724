//! engine::detectors
//!
//! One detector per classification dimension. Each pairs an async `detect`
//! that gathers observations through [`crate::git::Git`] with a pure
//! `classify` that turns them into a dimension state via
//! [`super::tables`].

pub mod corruption;
pub mod existence;
pub mod sync;
pub mod topology;
pub mod worktree;
