//! # Operator pad messages

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::Header;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// An out-of-band directive from the operator.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct PadMessage {
    pub header: Header,

    /// The requested action, a pad message without an action is malformed.
    pub action: Option<DrivingAction>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Actions the operator can request.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DrivingAction {
    None,
    Start,
    Stop,
    /// Clear any active emergency stop.
    Reset,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for DrivingAction {
    fn default() -> Self {
        DrivingAction::None
    }
}

impl PadMessage {
    /// Create a pad message carrying the given action.
    pub fn with_action(action: DrivingAction) -> Self {
        Self {
            action: Some(action),
            ..Default::default()
        }
    }

    /// Returns true if this message requests a reset.
    pub fn is_reset(&self) -> bool {
        self.action == Some(DrivingAction::Reset)
    }
}
