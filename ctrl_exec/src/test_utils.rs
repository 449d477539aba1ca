//! Fixtures and recording doubles shared by the unit tests.

use std::sync::{Arc, Mutex};

use nalgebra::Vector3;

use comms_if::{
    msg::{
        AdcTrajectory, Chassis, ControlCommand, DrivingMode, GearPosition, Header,
        LocalizationEstimate, PathPoint, Pose, TrajectoryPoint,
    },
    net::NetError,
};

use crate::{
    cmd_writer::CmdWriter,
    controller::{ControlAlgorithm, ControllerError},
    vehicle_state::VehicleStateSink,
};

/// Number of points in [`straight_trajectory`].
pub const NUM_POINTS: usize = 50;

fn header(timestamp_sec: f64) -> Header {
    Header {
        timestamp_sec,
        ..Default::default()
    }
}

/// Localization at the given position and heading, stamped at `timestamp_sec`.
pub fn localization_at(x: f64, y: f64, heading_rad: f64, timestamp_sec: f64) -> LocalizationEstimate {
    LocalizationEstimate {
        header: header(timestamp_sec),
        pose: Pose {
            position_m: Vector3::new(x, y, 0.0),
            heading_rad,
            ..Default::default()
        },
    }
}

/// Chassis in full autonomous mode moving at `speed_mps`.
pub fn auto_chassis(speed_mps: f64, timestamp_sec: f64) -> Chassis {
    Chassis {
        header: header(timestamp_sec),
        driving_mode: DrivingMode::CompleteAutoDrive,
        gear_location: GearPosition::Drive,
        speed_mps,
        ..Default::default()
    }
}

/// Trajectory along the +x axis with one point per meter, all at speed `v`.
pub fn straight_trajectory(v: f64, timestamp_sec: f64) -> AdcTrajectory {
    AdcTrajectory {
        header: header(timestamp_sec),
        trajectory_point: (0..NUM_POINTS)
            .map(|i| TrajectoryPoint {
                path_point: PathPoint {
                    x: i as f64,
                    s: i as f64,
                    ..Default::default()
                },
                v,
                a: 0.0,
                relative_time: i as f64 / v.max(0.1),
            })
            .collect(),
        ..Default::default()
    }
}

/// Counts vehicle state updates.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    updates: Arc<Mutex<usize>>,
}

impl RecordingSink {
    pub fn updates(&self) -> usize {
        *self.updates.lock().unwrap()
    }
}

impl VehicleStateSink for RecordingSink {
    fn update(&mut self, _: &LocalizationEstimate, _: &Chassis) {
        *self.updates.lock().unwrap() += 1;
    }
}

/// Keeps every written command.
#[derive(Debug, Clone, Default)]
pub struct RecordingWriter {
    cmds: Arc<Mutex<Vec<ControlCommand>>>,
}

impl RecordingWriter {
    pub fn commands(&self) -> Vec<ControlCommand> {
        self.cmds.lock().unwrap().clone()
    }

    pub fn last(&self) -> ControlCommand {
        self.cmds.lock().unwrap().last().cloned().expect("no command written")
    }
}

impl CmdWriter for RecordingWriter {
    fn write(&mut self, cmd: &ControlCommand) -> Result<(), NetError> {
        self.cmds.lock().unwrap().push(cmd.clone());
        Ok(())
    }
}

/// Calls made on a [`ScriptedController`] and the failure it should return.
#[derive(Debug, Default)]
pub struct Script {
    pub computes: usize,
    pub resets: usize,
    pub fail_with: Option<ControllerError>,
}

/// Controller which demands a fixed speed, or fails when scripted to.
pub struct ScriptedController {
    speed: f64,
    script: Arc<Mutex<Script>>,
}

impl ScriptedController {
    pub fn new(speed: f64) -> (Self, Arc<Mutex<Script>>) {
        let script = Arc::new(Mutex::new(Script::default()));
        (Self { speed, script: script.clone() }, script)
    }
}

impl ControlAlgorithm for ScriptedController {
    fn name(&self) -> &str {
        "ScriptedController"
    }

    fn compute(
        &mut self,
        _: &LocalizationEstimate,
        _: &Chassis,
        _: &AdcTrajectory,
        cmd: &mut ControlCommand,
    ) -> Result<(), ControllerError> {
        let mut script = self.script.lock().unwrap();
        script.computes += 1;

        if let Some(e) = script.fail_with.clone() {
            return Err(e);
        }

        cmd.speed = self.speed;
        cmd.throttle = 30.0;
        cmd.brake = 0.0;
        cmd.gear_location = GearPosition::Drive;
        Ok(())
    }

    fn reset(&mut self) {
        self.script.lock().unwrap().resets += 1;
    }
}
