//! # Control errors
//!
//! Failures which can occur during a cycle. None of these stop the executable, they are all
//! recovered into the estop state machine and surfaced through the command's header status and
//! engage advice.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::msg::{ErrorCode, StatusPb};

use crate::controller::ControllerError;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// The input channels read by the cycle.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InputKind {
    Localization,
    Chassis,
    Planning,
}

/// A failure during a control cycle.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CtrlError {
    /// A required input has never been delivered.
    #[error("No {} msg", .0.short_name())]
    MissingInput(InputKind),

    /// The trajectory has no points and does not request a stop.
    #[error("planning has no trajectory point.")]
    IncompleteInput,

    /// An input's header timestamp is older than its budget allows.
    #[error("{input} msg timeout")]
    StaleInput {
        input: InputKind,

        /// Units: seconds
        lag_s: f64,

        /// Units: seconds
        budget_s: f64,
    },

    /// The control algorithm failed.
    #[error("{0}")]
    ComputationFailure(#[from] ControllerError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl InputKind {
    /// Lower case name of the channel, as used in "No ... msg".
    pub fn short_name(&self) -> &'static str {
        match self {
            InputKind::Localization => "localization",
            InputKind::Chassis => "chassis",
            InputKind::Planning => "planning",
        }
    }
}

impl std::fmt::Display for InputKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputKind::Localization => write!(f, "Localization"),
            InputKind::Chassis => write!(f, "Chassis"),
            InputKind::Planning => write!(f, "Trajectory"),
        }
    }
}

impl CtrlError {
    /// The wire status describing this error.
    pub fn status(&self) -> StatusPb {
        StatusPb {
            error_code: ErrorCode::ControlComputeError,
            msg: self.to_string(),
        }
    }
}
