//! syncdoctor - diagnose and safely repair a repository mirrored to two remotes
//!
//! A repository lives in three places: the local working copy, a **core**
//! remote (the primary server) and a **hub** remote (a public host such as
//! GitHub). syncdoctor classifies the combined state into a fixed set of
//! named scenarios across five dimensions, suggests prioritized fixes, and
//! applies the safe ones.
//!
//! # Architecture
//!
//! The codebase follows a strict layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, wires the layers)
//! - [`doctor`] - Fix suggestion, auto-fix policy and the repair orchestrator
//! - [`ops`] - Validated, executable repair operations
//! - [`engine`] - Detectors, decision tables and the [`engine::Classifier`]
//! - [`platform`] - Hub hosting platform queries (GitHub REST, mock)
//! - [`git`] - Single interface for all Git operations
//! - [`secrets`] - Bearer-token access for the platform client
//! - [`core`] - Domain types, configuration, paths and retry markers
//! - [`ui`] - Terminal output helpers
//!
//! # Correctness Invariants
//!
//! syncdoctor maintains the following invariants:
//!
//! 1. Detection never mutates the repository beyond fetching
//! 2. Every repair operation is validated against fresh state before it runs
//! 3. Local commits are never discarded and pushes are never forced
//! 4. A failed push to one remote never blocks the other

pub mod cli;
pub mod core;
pub mod doctor;
pub mod engine;
pub mod git;
pub mod ops;
pub mod platform;
pub mod secrets;
pub mod ui;
