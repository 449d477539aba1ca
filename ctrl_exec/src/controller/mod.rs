//! # Controllers
//!
//! The control algorithm is an opaque capability to the cycle: given the checked inputs it fills
//! the motion fields of a command, or fails. The concrete variants are selected from the
//! parameters by [`ControllerAgent::init`] and run in the configured order.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod lat_ctrl;
mod lon_ctrl;
mod params;
mod pid;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::info;
use serde::Deserialize;

use comms_if::msg::{AdcTrajectory, Chassis, ControlCommand, LocalizationEstimate, TrajectoryPoint};

use crate::params::CtrlParams;

pub use lat_ctrl::LatController;
pub use lon_ctrl::LonController;
pub use params::{LatCtrlParams, LonCtrlParams};
pub use pid::{PidController, PidGains};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A control algorithm.
pub trait ControlAlgorithm {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Fill the motion fields of `cmd` from the checked inputs.
    fn compute(
        &mut self,
        localization: &LocalizationEstimate,
        chassis: &Chassis,
        trajectory: &AdcTrajectory,
        cmd: &mut ControlCommand,
    ) -> Result<(), ControllerError>;

    /// Clear any internal history, e.g. while the vehicle is under manual control.
    fn reset(&mut self);
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Runs a sequence of controllers as a single algorithm.
pub struct ControllerAgent {
    controllers: Vec<Box<dyn ControlAlgorithm + Send>>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// The controller variants which can be configured.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
pub enum ControllerKind {
    /// Longitudinal: throttle, brake, speed and acceleration
    Lon,

    /// Lateral: steering
    Lat,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ControllerError {
    #[error("No controllers configured")]
    NoControllers,

    #[error("Invalid {0} controller parameters: {1}")]
    InvalidParams(ControllerKind, String),

    #[error("{0} controller: trajectory has no points")]
    EmptyTrajectory(ControllerKind),

    #[error("{0} controller: station error of {1:.3} m exceeds limit of {2:.3} m")]
    StationErrorExceeded(ControllerKind, f64, f64),

    #[error("{0}")]
    Failed(String),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl std::fmt::Display for ControllerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ControllerKind::Lon => write!(f, "Lon"),
            ControllerKind::Lat => write!(f, "Lat"),
        }
    }
}

impl ControllerAgent {
    /// Build the configured controllers.
    pub fn init(params: &CtrlParams) -> Result<Self, ControllerError> {
        let mut controllers: Vec<Box<dyn ControlAlgorithm + Send>> = Vec::new();

        for kind in params.controllers.iter() {
            match kind {
                ControllerKind::Lon => controllers.push(Box::new(
                    LonController::new(&params.lon_ctrl, params.control_period)?
                )),
                ControllerKind::Lat => controllers.push(Box::new(
                    LatController::new(&params.lat_ctrl, params.control_period)?
                )),
            }
            info!("{} controller initialised", kind);
        }

        Self::from_controllers(controllers)
    }

    /// Wrap an existing list of controllers.
    pub fn from_controllers(
        controllers: Vec<Box<dyn ControlAlgorithm + Send>>
    ) -> Result<Self, ControllerError> {
        if controllers.is_empty() {
            return Err(ControllerError::NoControllers)
        }

        Ok(Self { controllers })
    }
}

impl ControlAlgorithm for ControllerAgent {
    fn name(&self) -> &str {
        "ControllerAgent"
    }

    fn compute(
        &mut self,
        localization: &LocalizationEstimate,
        chassis: &Chassis,
        trajectory: &AdcTrajectory,
        cmd: &mut ControlCommand,
    ) -> Result<(), ControllerError> {
        for controller in self.controllers.iter_mut() {
            controller.compute(localization, chassis, trajectory, cmd)?;
        }

        Ok(())
    }

    fn reset(&mut self) {
        for controller in self.controllers.iter_mut() {
            controller.reset();
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Find the trajectory point closest to the vehicle's position, and the distance to it.
pub(crate) fn nearest_point<'a>(
    localization: &LocalizationEstimate,
    trajectory: &'a AdcTrajectory,
) -> Option<(&'a TrajectoryPoint, f64)> {
    let x = localization.pose.position_m[0];
    let y = localization.pose.position_m[1];

    trajectory.trajectory_point
        .iter()
        .map(|p| (p, (p.path_point.x - x).hypot(p.path_point.y - y)))
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
}
