//! # Input checks
//!
//! Presence, completeness and staleness checks run on the inputs at the start of every cycle.
//! Both checks only ever look at the cycle's own copy of the inputs.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{error, Level};

use comms_if::msg::Header;
use util::log_every;

use crate::{
    error::{CtrlError, InputKind},
    params::CtrlParams,
    snapshot::CycleInputs,
    vehicle_state::VehicleStateSink,
};

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Check every input has been delivered and the trajectory is usable.
///
/// On success the trajectory points slower than `minimum_speed_resolution` have their speed and
/// acceleration zeroed, and the (localization, chassis) pair is pushed into `sink`.
pub fn check_input(
    inputs: &mut CycleInputs,
    params: &CtrlParams,
    sink: &mut dyn VehicleStateSink,
) -> Result<(), CtrlError> {
    let localization = inputs.localization.as_ref()
        .ok_or(CtrlError::MissingInput(InputKind::Localization))?;
    log_every!(100, Level::Debug, "Received localization: {:?}", localization.header);

    let chassis = inputs.chassis.as_ref()
        .ok_or(CtrlError::MissingInput(InputKind::Chassis))?;
    log_every!(100, Level::Debug, "Received chassis: {:?}", chassis.header);

    let trajectory = inputs.trajectory.as_mut()
        .ok_or(CtrlError::MissingInput(InputKind::Planning))?;
    log_every!(100, Level::Debug, "Received trajectory: {:?}", trajectory.header);

    if !trajectory.is_estop() && trajectory.trajectory_point.is_empty() {
        log_every!(100, Level::Warn, "Trajectory has no points and no estop request");
        return Err(CtrlError::IncompleteInput)
    }

    for point in trajectory.trajectory_point.iter_mut() {
        if point.v < params.minimum_speed_resolution {
            point.v = 0.0;
            point.a = 0.0;
        }
    }

    sink.update(localization, chassis);

    Ok(())
}

/// Check each input's header timestamp is within its budget of `now_s`.
///
/// Skipped if timestamp checking is disabled or in test mode. The inputs are checked in the order
/// localization, chassis, trajectory and the first stale one is reported.
pub fn check_timestamp(
    inputs: &CycleInputs,
    params: &CtrlParams,
    now_s: f64,
) -> Result<(), CtrlError> {
    if !params.enable_input_timestamp_check || params.is_control_test_mode {
        return Ok(())
    }

    let headers: [(InputKind, Option<&Header>, f64); 3] = [
        (
            InputKind::Localization,
            inputs.localization.as_ref().map(|l| &l.header),
            params.localization_budget_s(),
        ),
        (
            InputKind::Chassis,
            inputs.chassis.as_ref().map(|c| &c.header),
            params.chassis_budget_s(),
        ),
        (
            InputKind::Planning,
            inputs.trajectory.as_ref().map(|t| &t.header),
            params.trajectory_budget_s(),
        ),
    ];

    for &(input, header, budget_s) in headers.iter() {
        let header = header.ok_or(CtrlError::MissingInput(input))?;

        let lag_s = now_s - header.timestamp_sec;
        if lag_s > budget_s {
            error!("{} msg lost for {:.6}s", input, lag_s);
            return Err(CtrlError::StaleInput { input, lag_s, budget_s })
        }
    }

    Ok(())
}
