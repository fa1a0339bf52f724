//! platform
//!
//! Read-only queries against the hub's hosting platform.
//!
//! # Modules
//!
//! - `traits`: the [`Platform`] trait and [`PlatformError`]
//! - [`github`]: GitHub REST implementation
//! - [`mock`]: in-memory implementation for tests
//! - `factory`: provider selection from config and the hub URL
//!
//! Platform answers only enrich detection (protected branch, default
//! branch, admin rights). Every failure degrades to "unknown".

mod factory;
pub mod github;
pub mod mock;
mod traits;

pub use factory::{create_platform, create_platform_with, detect_provider, PlatformProvider};
pub use traits::{Platform, PlatformError};
