//! # Longitudinal controller
//!
//! Tracks the speed of the nearest trajectory point with a PID on the speed error plus the
//! point's acceleration as feed-forward. The acceleration demand is mapped onto throttle or brake
//! outside of their deadzones.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::trace;
use util::maths::lin_map;

use comms_if::msg::{AdcTrajectory, Chassis, ControlCommand, GearPosition, LocalizationEstimate};

use super::{
    nearest_point, ControlAlgorithm, ControllerError, ControllerKind, LonCtrlParams,
    PidController,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct LonController {
    params: LonCtrlParams,

    speed_pid: PidController,

    /// Units: seconds
    dt: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl LonController {
    pub fn new(params: &LonCtrlParams, dt: f64) -> Result<Self, ControllerError> {
        if !(params.max_acceleration_mss > 0.0) || !(params.max_deceleration_mss > 0.0) {
            return Err(ControllerError::InvalidParams(
                ControllerKind::Lon,
                String::from("acceleration limits must be positive"),
            ))
        }

        if !(0.0..100.0).contains(&params.throttle_deadzone)
            || !(0.0..100.0).contains(&params.brake_deadzone)
        {
            return Err(ControllerError::InvalidParams(
                ControllerKind::Lon,
                String::from("deadzones must be within [0, 100) percent"),
            ))
        }

        Ok(Self {
            params: params.clone(),
            speed_pid: PidController::new(params.speed_pid),
            dt,
        })
    }
}

impl ControlAlgorithm for LonController {
    fn name(&self) -> &str {
        "LonController"
    }

    fn compute(
        &mut self,
        localization: &LocalizationEstimate,
        chassis: &Chassis,
        trajectory: &AdcTrajectory,
        cmd: &mut ControlCommand,
    ) -> Result<(), ControllerError> {
        let (point, station_error_m) = nearest_point(localization, trajectory)
            .ok_or(ControllerError::EmptyTrajectory(ControllerKind::Lon))?;

        if station_error_m > self.params.max_station_error_m {
            return Err(ControllerError::StationErrorExceeded(
                ControllerKind::Lon,
                station_error_m,
                self.params.max_station_error_m,
            ))
        }

        let speed_error_ms = point.v - chassis.speed_mps;
        let accel_mss = (self.speed_pid.get(speed_error_ms, self.dt) + point.a)
            .clamp(-self.params.max_deceleration_mss, self.params.max_acceleration_mss);

        // Map the demand onto the pedal outside of its deadzone
        let (throttle, brake) = if accel_mss > 0.0 {
            let throttle = lin_map(
                (0.0, self.params.max_acceleration_mss),
                (self.params.throttle_deadzone, 100.0),
                accel_mss
            );
            (throttle, 0.0)
        } else if accel_mss < 0.0 {
            let brake = lin_map(
                (0.0, self.params.max_deceleration_mss),
                (self.params.brake_deadzone, 100.0),
                -accel_mss
            );
            (0.0, brake)
        } else {
            (0.0, 0.0)
        };

        trace!(
            "Lon: speed error {:.3} m/s, accel {:.3} m/s^2, throttle {:.1}, brake {:.1}",
            speed_error_ms, accel_mss, throttle, brake
        );

        cmd.speed = point.v;
        cmd.acceleration = accel_mss;
        cmd.throttle = throttle.clamp(0.0, 100.0);
        cmd.brake = brake.clamp(0.0, 100.0);
        cmd.gear_location = GearPosition::Drive;

        Ok(())
    }

    fn reset(&mut self) {
        self.speed_pid.reset();
    }
}
