//! engine::detectors::existence
//!
//! Builds [`ExistenceState`] from the local check and the two remote probes.

use crate::engine::state::{ExistenceScenario, ExistenceState, RemotePresence};
use crate::engine::tables;

/// Classify existence. A remote counts only if it is configured and reachable.
pub fn classify(local_exists: bool, core: RemotePresence, hub: RemotePresence) -> ExistenceState {
    let scenario = tables::existence(local_exists, core.usable(), hub.usable());
    ExistenceState {
        local_exists,
        core,
        hub,
        scenario,
    }
}

/// State used when the local check itself failed.
pub fn unknown(core: RemotePresence, hub: RemotePresence) -> ExistenceState {
    ExistenceState {
        local_exists: false,
        core,
        hub,
        scenario: ExistenceScenario::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn presence(configured: bool, reachable: bool) -> RemotePresence {
        RemotePresence {
            name: "r".into(),
            configured,
            reachable,
            url: configured.then(|| "/srv/r.git".to_string()),
        }
    }

    #[test]
    fn unreachable_remote_does_not_exist() {
        let state = classify(true, presence(true, true), presence(true, false));
        assert_eq!(state.scenario, ExistenceScenario::E2);
    }

    #[test]
    fn unconfigured_remote_does_not_exist() {
        let state = classify(true, presence(false, false), presence(true, true));
        assert_eq!(state.scenario, ExistenceScenario::E3);
    }

    #[test]
    fn nothing_anywhere() {
        let state = classify(false, presence(false, false), presence(false, false));
        assert_eq!(state.scenario, ExistenceScenario::E8);
    }
}
