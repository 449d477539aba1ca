//! # Vehicle state
//!
//! The cycle pushes each validated (localization, chassis) pair into a [`VehicleStateSink`]. The
//! executable uses [`VehicleStateProvider`], which keeps the latest derived state for other
//! consumers in the process.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::sync::{Arc, Mutex};

use comms_if::msg::{Chassis, DrivingMode, GearPosition, LocalizationEstimate};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Write-only sink for the vehicle state.
pub trait VehicleStateSink {
    fn update(&mut self, localization: &LocalizationEstimate, chassis: &Chassis);
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Vehicle state derived from the latest localization and chassis.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VehicleState {
    /// Units: seconds since the UNIX epoch
    pub timestamp_sec: f64,

    /// Units: meters
    pub x: f64,

    /// Units: meters
    pub y: f64,

    /// Units: radians
    pub heading_rad: f64,

    /// Speed reported by the chassis.
    ///
    /// Units: meters/second
    pub speed_mps: f64,

    /// Acceleration along the heading.
    ///
    /// Units: meters/second^2
    pub linear_acceleration_mss: f64,

    pub gear: GearPosition,

    pub driving_mode: DrivingMode,
}

/// Keeps the latest [`VehicleState`], readable through cloned handles.
#[derive(Debug, Clone, Default)]
pub struct VehicleStateProvider {
    state: Arc<Mutex<VehicleState>>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl VehicleStateProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the latest state.
    pub fn latest(&self) -> VehicleState {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl VehicleStateSink for VehicleStateProvider {
    fn update(&mut self, localization: &LocalizationEstimate, chassis: &Chassis) {
        let pose = &localization.pose;
        let (sin, cos) = pose.heading_rad.sin_cos();

        let state = VehicleState {
            timestamp_sec: localization.header.timestamp_sec,
            x: pose.position_m[0],
            y: pose.position_m[1],
            heading_rad: pose.heading_rad,
            speed_mps: chassis.speed_mps,
            linear_acceleration_mss: pose.linear_acceleration_mss[0] * cos
                + pose.linear_acceleration_mss[1] * sin,
            gear: chassis.gear_location,
            driving_mode: chassis.driving_mode,
        };

        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = state;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_utils;

    #[test]
    fn test_provider() {
        let mut provider = VehicleStateProvider::new();
        let reader = provider.clone();

        let loc = test_utils::localization_at(1.0, 2.0, 0.5, 100.0);
        let chassis = test_utils::auto_chassis(4.0, 100.0);
        provider.update(&loc, &chassis);

        let state = reader.latest();
        assert_eq!(state.x, 1.0);
        assert_eq!(state.y, 2.0);
        assert_eq!(state.heading_rad, 0.5);
        assert_eq!(state.speed_mps, 4.0);
        assert_eq!(state.driving_mode, DrivingMode::CompleteAutoDrive);
    }
}
