//! core
//!
//! Core domain types, configuration, and persisted state for syncdoctor.
//!
//! # Modules
//!
//! - [`types`] - Strong types: BranchName, Oid, RefName, RemoteRole, Fingerprint
//! - [`config`] - Configuration schema and loading
//! - [`paths`] - Centralized path routing for syncdoctor storage
//! - [`retry`] - Per-remote retry markers
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Schemas are strict and self-describing
//! - Nothing here talks to git; that is the job of [`crate::git`]

pub mod config;
pub mod paths;
pub mod retry;
pub mod types;
