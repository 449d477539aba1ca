//! # Lateral controller
//!
//! Steers onto the trajectory using the curvature of the nearest point as feed-forward, corrected
//! by PIDs on the cross track and heading errors.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::trace;

use comms_if::msg::{AdcTrajectory, Chassis, ControlCommand, LocalizationEstimate};
use util::maths::norm_angle_pi;

use super::{
    nearest_point, ControlAlgorithm, ControllerError, ControllerKind, LatCtrlParams,
    PidController,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct LatController {
    params: LatCtrlParams,

    /// Cross track error controller
    lat_pid: PidController,

    /// Heading error controller
    head_pid: PidController,

    /// Units: seconds
    dt: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl LatController {
    pub fn new(params: &LatCtrlParams, dt: f64) -> Result<Self, ControllerError> {
        if !(params.wheelbase_m > 0.0) {
            return Err(ControllerError::InvalidParams(
                ControllerKind::Lat,
                String::from("wheelbase must be positive"),
            ))
        }

        if !(params.max_steer_angle_rad > 0.0) {
            return Err(ControllerError::InvalidParams(
                ControllerKind::Lat,
                String::from("maximum steer angle must be positive"),
            ))
        }

        Ok(Self {
            params: params.clone(),
            lat_pid: PidController::new(params.lat_error_pid),
            head_pid: PidController::new(params.heading_error_pid),
            dt,
        })
    }

    /// Cross track error to the point, positive if the vehicle is to the left of it.
    fn calc_lat_error(x: f64, y: f64, px: f64, py: f64, ptheta: f64) -> f64 {
        ptheta.cos() * (y - py) - ptheta.sin() * (x - px)
    }
}

impl ControlAlgorithm for LatController {
    fn name(&self) -> &str {
        "LatController"
    }

    fn compute(
        &mut self,
        localization: &LocalizationEstimate,
        _chassis: &Chassis,
        trajectory: &AdcTrajectory,
        cmd: &mut ControlCommand,
    ) -> Result<(), ControllerError> {
        let (point, _) = nearest_point(localization, trajectory)
            .ok_or(ControllerError::EmptyTrajectory(ControllerKind::Lat))?;

        let pose = &localization.pose;

        let lat_err_m = Self::calc_lat_error(
            pose.position_m[0],
            pose.position_m[1],
            point.path_point.x,
            point.path_point.y,
            point.path_point.theta,
        );
        let head_err_rad = norm_angle_pi(pose.heading_rad - point.path_point.theta);

        // Positive steering turns left, so both errors are subtracted
        let feed_forward_rad = (self.params.wheelbase_m * point.path_point.kappa).atan();
        let steer_rad = feed_forward_rad
            - self.lat_pid.get(lat_err_m, self.dt)
            - self.head_pid.get(head_err_rad, self.dt);

        let steering_target = (steer_rad / self.params.max_steer_angle_rad * 100.0)
            .clamp(-100.0, 100.0);

        trace!(
            "Lat: lateral error {:.3} m, heading error {:.3} rad, steering {:.1}",
            lat_err_m, head_err_rad, steering_target
        );

        cmd.steering_target = steering_target;
        cmd.steering_rate = self.params.steering_rate;

        Ok(())
    }

    fn reset(&mut self) {
        self.lat_pid.reset();
        self.head_pid.reset();
    }
}
