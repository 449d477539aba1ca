//! # Localization estimate

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use super::Header;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Pose and velocity estimate of the vehicle.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct LocalizationEstimate {
    pub header: Header,

    pub pose: Pose,
}

/// Pose of the vehicle in the map frame.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Pose {
    /// Position of the vehicle reference point.
    ///
    /// Units: meters,
    /// Frame: Map
    pub position_m: Vector3<f64>,

    /// Heading of the vehicle, anticlockwise from the map X axis.
    ///
    /// Units: radians,
    /// Frame: Map
    pub heading_rad: f64,

    /// Linear velocity of the vehicle.
    ///
    /// Units: meters/second,
    /// Frame: Map
    pub linear_velocity_ms: Vector3<f64>,

    /// Linear acceleration of the vehicle.
    ///
    /// Units: meters/second^2,
    /// Frame: Map
    pub linear_acceleration_mss: Vector3<f64>,
}
