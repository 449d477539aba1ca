//! # Planned trajectory

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::Header;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Trajectory produced by the planner for the control stage to follow.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AdcTrajectory {
    pub header: Header,

    /// Points making up the trajectory, in order of increasing time.
    pub trajectory_point: Vec<TrajectoryPoint>,

    /// Emergency stop request from the planner.
    pub estop: EStop,

    /// Decisions made by the planner which the control stage forwards.
    pub decision: DecisionResult,
}

/// A single point on a trajectory.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Default, PartialEq)]
#[serde(default)]
pub struct TrajectoryPoint {
    pub path_point: PathPoint,

    /// Speed at this point.
    ///
    /// Units: meters/second
    pub v: f64,

    /// Acceleration at this point.
    ///
    /// Units: meters/second^2
    pub a: f64,

    /// Time of this point relative to the trajectory header timestamp.
    ///
    /// Units: seconds
    pub relative_time: f64,
}

/// Geometric part of a trajectory point.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Default, PartialEq)]
#[serde(default)]
pub struct PathPoint {
    /// Units: meters, Frame: Map
    pub x: f64,

    /// Units: meters, Frame: Map
    pub y: f64,

    /// Direction of the path at this point.
    ///
    /// Units: radians, Frame: Map
    pub theta: f64,

    /// Curvature of the path at this point.
    ///
    /// Units: 1/meters
    pub kappa: f64,

    /// Distance along the path.
    ///
    /// Units: meters
    pub s: f64,
}

/// Emergency stop request embedded in a trajectory.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct EStop {
    pub is_estop: bool,
    pub reason: String,
}

/// Planner decisions forwarded by control.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct DecisionResult {
    pub vehicle_signal: Option<VehicleSignal>,
}

/// Signal directive for the vehicle (indicators, lights, horn).
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Default, PartialEq)]
#[serde(default)]
pub struct VehicleSignal {
    pub turn_signal: TurnSignal,
    pub high_beam: bool,
    pub low_beam: bool,
    pub horn: bool,
    pub emergency_light: bool,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TurnSignal {
    TurnNone,
    TurnLeft,
    TurnRight,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for TurnSignal {
    fn default() -> Self {
        TurnSignal::TurnNone
    }
}

impl AdcTrajectory {
    /// Returns true if the planner is requesting an emergency stop.
    pub fn is_estop(&self) -> bool {
        self.estop.is_estop
    }
}
