//! # Control command
//!
//! The single output of the control stage, produced once per cycle.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::{GearPosition, Header, PadMessage, VehicleSignal};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Actuation command sent to the chassis.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ControlCommand {
    pub header: Header,

    /// Target throttle.
    ///
    /// Units: percent
    pub throttle: f64,

    /// Target brake.
    ///
    /// Units: percent
    pub brake: f64,

    /// Target steering rate.
    ///
    /// Units: percent/second
    pub steering_rate: f64,

    /// Target steering position.
    ///
    /// Units: percent
    pub steering_target: f64,

    /// Target speed.
    ///
    /// Units: meters/second
    pub speed: f64,

    /// Target acceleration.
    ///
    /// Units: meters/second^2
    pub acceleration: f64,

    pub gear_location: GearPosition,

    /// Vehicle signal forwarded from the planner's decision
    pub signal: Option<VehicleSignal>,

    pub engage_advice: EngageAdvice,

    pub latency_stats: LatencyStats,

    pub debug: ControlDebug,

    /// Pad message echoed back if one was received since the last command
    pub pad_msg: Option<PadMessage>,
}

/// Advice on whether autonomous driving can be engaged.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct EngageAdvice {
    pub advice: Advice,
    pub reason: String,
}

/// Timing of the cycle which produced the command.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Default, PartialEq)]
#[serde(default)]
pub struct LatencyStats {
    /// Units: milliseconds
    pub total_time_ms: f64,

    pub total_time_exceeded: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ControlDebug {
    pub input_debug: InputDebug,
}

/// Headers of the inputs the command was computed from.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct InputDebug {
    pub localization_header: Header,
    pub canbus_header: Header,
    pub trajectory_header: Header,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Advice {
    Unknown,
    DisallowEngage,
    ReadyToEngage,
    KeepEngaged,
    PreparingDisengage,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for Advice {
    fn default() -> Self {
        Advice::Unknown
    }
}

impl EngageAdvice {
    pub fn new(advice: Advice, reason: impl Into<String>) -> Self {
        Self {
            advice,
            reason: reason.into(),
        }
    }
}
