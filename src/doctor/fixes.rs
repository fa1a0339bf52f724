//! doctor::fixes
//!
//! The [`Fix`] record handed from the suggester to the orchestrator.

use serde::{Deserialize, Serialize};

use super::policy;
use crate::engine::state::Dimension;
use crate::ops::Operation;

/// One suggested remediation.
///
/// Fields are read through accessors so that `auto_fixable` can only be
/// set by [`Fix::with_operation`], which consults [`policy`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fix {
    scenario: String,
    dimension: Dimension,
    description: String,
    command: Option<String>,
    operation: Option<Operation>,
    auto_fixable: bool,
    priority: u32,
}

impl Fix {
    /// An informational fix with no operation.
    pub fn new(
        scenario: impl Into<String>,
        dimension: Dimension,
        priority: u32,
        description: impl Into<String>,
    ) -> Self {
        Self {
            scenario: scenario.into(),
            dimension,
            description: description.into(),
            command: None,
            operation: None,
            auto_fixable: false,
            priority,
        }
    }

    /// Attach a command for the user to run by hand.
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    /// Attach an operation. The fix becomes auto-fixable unless the policy
    /// forbids it for this scenario.
    pub fn with_operation(mut self, operation: Operation) -> Self {
        self.auto_fixable = policy::allows_auto(&self.scenario);
        self.operation = Some(operation);
        self
    }

    /// Scenario ID, with `:<branch>` for topology fixes.
    pub fn scenario(&self) -> &str {
        &self.scenario
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn command(&self) -> Option<&str> {
        self.command.as_deref()
    }

    pub fn operation(&self) -> Option<&Operation> {
        self.operation.as_ref()
    }

    /// Whether the orchestrator may apply this fix unattended.
    pub fn auto_fixable(&self) -> bool {
        self.auto_fixable && self.operation.is_some() && policy::allows_auto(&self.scenario)
    }

    /// Lower is more urgent.
    pub fn priority(&self) -> u32 {
        self.priority
    }

    /// Whether `id` selects this fix: an exact match, or the bare scenario
    /// ID of a `B2:<branch>` style fix.
    pub fn matches_scenario(&self, id: &str) -> bool {
        self.scenario == id || policy::base_id(&self.scenario) == id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{BranchName, RemoteRole};
    use crate::ops::PushOp;

    fn push() -> Operation {
        Operation::Push(PushOp::new(
            RemoteRole::Hub,
            "hub",
            BranchName::new("main").unwrap(),
        ))
    }

    #[test]
    fn informational_fix_is_not_auto() {
        let fix = Fix::new("W3", Dimension::WorkingTree, 200, "Commit changes")
            .with_command("git commit -a");
        assert!(!fix.auto_fixable());
        assert_eq!(fix.command(), Some("git commit -a"));
    }

    #[test]
    fn operation_makes_fix_auto() {
        let fix = Fix::new("S5", Dimension::Sync, 310, "Push to hub").with_operation(push());
        assert!(fix.auto_fixable());
    }

    #[test]
    fn policy_cannot_be_bypassed() {
        let fix = Fix::new("S13", Dimension::Sync, 390, "Merge").with_operation(push());
        assert!(fix.operation().is_some());
        assert!(!fix.auto_fixable());
    }

    #[test]
    fn tampered_json_is_still_checked() {
        let fix = Fix::new("C3", Dimension::Corruption, 500, "Migrate").with_operation(push());
        let mut json = serde_json::to_value(&fix).unwrap();
        json["auto_fixable"] = serde_json::Value::Bool(true);
        let parsed: Fix = serde_json::from_value(json).unwrap();
        assert!(!parsed.auto_fixable());
    }

    #[test]
    fn topology_fix_matches_bare_id() {
        let fix = Fix::new("B2:feature", Dimension::Topology, 410, "Push feature");
        assert!(fix.matches_scenario("B2"));
        assert!(fix.matches_scenario("B2:feature"));
        assert!(!fix.matches_scenario("B3"));
    }
}
