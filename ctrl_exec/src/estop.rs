//! # Estop state machine
//!
//! Tracks whether the vehicle is in emergency stop and why. While active the synthesised command
//! is overwritten with the fail-safe values.
//!
//! Per cycle the flag is recomputed from the previous state, any input failure in this cycle and
//! the planner's stop request:
//!
//! - Persistent: `active = active || input_failure || planning_estop`
//! - Not persistent: `active = input_failure || planning_estop`
//!
//! A computation failure triggers the estop after this update, and an operator reset clears it
//! from the pad delivery callback.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{info, warn};

use crate::error::CtrlError;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Reason set when the planner requests a stop.
pub const PLANNING_ESTOP_REASON: &str = "estop from planning";

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EstopState {
    active: bool,
    reason: String,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl EstopState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Reason for the estop, empty if not active.
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Enter estop, replacing any previous reason.
    pub fn trigger(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        if !self.active || self.reason != reason {
            warn!("Estop triggered: {}", reason);
        }
        self.active = true;
        self.reason = reason;
    }

    /// Leave estop unconditionally.
    pub fn reset(&mut self) {
        if self.active {
            info!("Estop reset, previous reason: {}", self.reason);
        }
        self.active = false;
        self.reason.clear();
    }

    /// Recompute the flag at the start of a cycle.
    ///
    /// `input_failure` is the presence/completeness failure of this cycle, if any. Staleness
    /// failures are not passed in as they do not estop on their own.
    pub fn update(
        &mut self,
        input_failure: Option<&CtrlError>,
        planning_estop: bool,
        persistent: bool,
    ) {
        if let Some(e) = input_failure {
            self.trigger(e.to_string());
        }

        let triggered = input_failure.is_some() || planning_estop;
        self.active = if persistent {
            self.active || triggered
        } else {
            triggered
        };

        if planning_estop {
            if self.reason != PLANNING_ESTOP_REASON {
                warn!("Estop triggered: {}", PLANNING_ESTOP_REASON);
            }
            self.reason = String::from(PLANNING_ESTOP_REASON);
        }

        if !self.active {
            self.reason.clear();
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::InputKind;

    #[test]
    fn test_persistent() {
        let mut estop = EstopState::new();

        estop.update(None, true, true);
        assert!(estop.is_active());
        assert_eq!(estop.reason(), PLANNING_ESTOP_REASON);

        // Stays active with nothing triggering it
        for _ in 0..10 {
            estop.update(None, false, true);
            assert!(estop.is_active());
            assert_eq!(estop.reason(), PLANNING_ESTOP_REASON);
        }

        estop.reset();
        assert!(!estop.is_active());
        assert_eq!(estop.reason(), "");

        estop.update(None, false, true);
        assert!(!estop.is_active());
    }

    #[test]
    fn test_not_persistent() {
        let mut estop = EstopState::new();

        let requests = [true, false, false, true, true, false];
        for &req in requests.iter() {
            estop.update(None, req, false);
            assert_eq!(estop.is_active(), req);
            if !req {
                assert_eq!(estop.reason(), "");
            }
        }

        // Computation failure from the previous cycle is forgotten
        estop.trigger("controller failed");
        estop.update(None, false, false);
        assert!(!estop.is_active());
    }

    #[test]
    fn test_input_failure() {
        let err = CtrlError::MissingInput(InputKind::Chassis);

        for &persistent in [true, false].iter() {
            let mut estop = EstopState::new();
            estop.update(Some(&err), false, persistent);
            assert!(estop.is_active());
            assert_eq!(estop.reason(), "No chassis msg");

            // Planner stop request overrides the reason
            estop.update(Some(&err), true, persistent);
            assert_eq!(estop.reason(), PLANNING_ESTOP_REASON);
        }
    }
}
