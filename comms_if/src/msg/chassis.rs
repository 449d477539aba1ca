//! # Chassis feedback

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::Header;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Feedback from the vehicle's chassis.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Chassis {
    pub header: Header,

    /// The current driving mode of the vehicle
    pub driving_mode: DrivingMode,

    /// Current gear
    pub gear_location: GearPosition,

    /// Vehicle speed as measured by the chassis.
    ///
    /// Units: meters/second
    pub speed_mps: f64,

    /// Current throttle position.
    ///
    /// Units: percent
    pub throttle_percentage: f64,

    /// Current brake position.
    ///
    /// Units: percent
    pub brake_percentage: f64,

    /// Current steering position.
    ///
    /// Units: percent
    pub steering_percentage: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Driving mode reported by the chassis.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DrivingMode {
    CompleteManual,
    CompleteAutoDrive,
    AutoSteerOnly,
    AutoSpeedOnly,
    EmergencyMode,
}

/// Gear position, both as reported by the chassis and as commanded by control.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GearPosition {
    Neutral,
    Drive,
    Reverse,
    Parking,
    Low,
    Invalid,
    None,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for DrivingMode {
    fn default() -> Self {
        DrivingMode::CompleteManual
    }
}

impl Default for GearPosition {
    fn default() -> Self {
        GearPosition::None
    }
}
