//! doctor::policy
//!
//! Which scenarios may be repaired without a human.
//!
//! Divergence (S4, S9, S10, S13) needs a merge decision, and large-object or
//! damaged-store scenarios (C3-C8) can only be cleaned up by rewriting
//! history. Fixes for those are never auto-fixable, whatever operation they
//! carry.

/// Scenario IDs that are never repaired automatically.
pub const NEVER_AUTO: &[&str] = &["S4", "S9", "S10", "S13", "C3", "C4", "C5", "C6", "C7", "C8"];

/// The canonical ID of a fix scenario, dropping any `:<branch>` suffix.
pub fn base_id(scenario: &str) -> &str {
    scenario.split(':').next().unwrap_or(scenario)
}

/// Whether a fix for `scenario` may run unattended.
///
/// ```
/// use syncdoctor::doctor::policy::allows_auto;
///
/// assert!(allows_auto("S2"));
/// assert!(allows_auto("B2:feature"));
/// assert!(!allows_auto("S13"));
/// assert!(!allows_auto("C7"));
/// ```
pub fn allows_auto(scenario: &str) -> bool {
    !NEVER_AUTO.contains(&base_id(scenario))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn divergence_is_never_auto() {
        for id in ["S4", "S9", "S10", "S13"] {
            assert!(!allows_auto(id), "{id}");
        }
    }

    #[test]
    fn history_rewrites_are_never_auto() {
        for id in ["C3", "C4", "C5", "C6", "C7", "C8"] {
            assert!(!allows_auto(id), "{id}");
        }
        assert!(allows_auto("C1"));
        assert!(allows_auto("C2"));
    }

    #[test]
    fn branch_suffix_is_ignored() {
        assert_eq!(base_id("B3:release/1.0"), "B3");
        assert!(allows_auto("S_UNKNOWN"));
    }
}
