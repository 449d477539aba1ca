//! # Command synthesis
//!
//! Builds the outgoing command around the motion fields produced by the control algorithm: the
//! fail-safe override, vehicle signal, pad echo, latency, status and header.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::msg::{AdcTrajectory, ControlCommand, GearPosition, PadMessage, StatusPb};

use crate::{estop::EstopState, params::CtrlParams};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Command synthesiser
#[derive(Debug, Clone)]
pub struct CmdSynth {
    module_name: String,

    /// Units: percent
    soft_estop_brake: f64,

    /// Units: seconds
    control_period: f64,

    /// Sequence number of the next command
    sequence_num: u32,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl CmdSynth {
    pub fn new(params: &CtrlParams) -> Self {
        Self {
            module_name: params.module_name.clone(),
            soft_estop_brake: params.soft_estop_brake,
            control_period: params.control_period,
            sequence_num: 0,
        }
    }

    /// Overwrite the motion fields with the fail-safe values.
    pub fn apply_estop(&self, cmd: &mut ControlCommand) {
        cmd.speed = 0.0;
        cmd.throttle = 0.0;
        cmd.brake = self.soft_estop_brake;
        cmd.gear_location = GearPosition::Drive;
    }

    /// Forward the planner's vehicle signal, if any.
    pub fn apply_signal(&self, cmd: &mut ControlCommand, trajectory: Option<&AdcTrajectory>) {
        if let Some(signal) = trajectory.and_then(|t| t.decision.vehicle_signal.as_ref()) {
            cmd.signal = Some(*signal);
        }
    }

    /// Echo a pad message received since the previous command.
    pub fn echo_pad(&self, cmd: &mut ControlCommand, pad: Option<PadMessage>) {
        cmd.pad_msg = pad;
    }

    /// Set the latency statistics of the cycle which started at `start_s` and ended at `end_s`.
    ///
    /// `total_time_exceeded` is true when the total time in milliseconds is *less* than the
    /// control period. Consumers depend on this so it is kept as is.
    pub fn set_latency(&self, cmd: &mut ControlCommand, start_s: f64, end_s: f64) {
        let total_time_ms = (end_s - start_s) * 1000.0;
        cmd.latency_stats.total_time_ms = total_time_ms;
        cmd.latency_stats.total_time_exceeded = total_time_ms < self.control_period;
    }

    /// Set the header status. While estopped the message is the estop reason.
    pub fn set_status(&self, cmd: &mut ControlCommand, status: StatusPb, estop: &EstopState) {
        cmd.header.status = status;
        if estop.is_active() {
            cmd.header.status.msg = String::from(estop.reason());
        }
    }

    /// Stamp the sensor timestamps from the trajectory and the transport header.
    pub fn fill_header(
        &mut self,
        cmd: &mut ControlCommand,
        trajectory: Option<&AdcTrajectory>,
        now_s: f64,
    ) {
        if let Some(t) = trajectory {
            cmd.header.lidar_timestamp = t.header.lidar_timestamp;
            cmd.header.camera_timestamp = t.header.camera_timestamp;
            cmd.header.radar_timestamp = t.header.radar_timestamp;
        }

        cmd.header.module_name = self.module_name.clone();
        cmd.header.timestamp_sec = now_s;
        cmd.header.sequence_num = self.sequence_num;
        self.sequence_num = self.sequence_num.wrapping_add(1);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::msg::{DrivingAction, ErrorCode, TurnSignal, VehicleSignal};

    #[test]
    fn test_apply_estop() {
        let synth = CmdSynth::new(&CtrlParams::default());

        let mut cmd = ControlCommand {
            speed: 5.0,
            throttle: 40.0,
            brake: 0.0,
            steering_target: 12.0,
            gear_location: GearPosition::Reverse,
            ..Default::default()
        };
        synth.apply_estop(&mut cmd);

        assert_eq!(cmd.speed, 0.0);
        assert_eq!(cmd.throttle, 0.0);
        assert_eq!(cmd.brake, 50.0);
        assert_eq!(cmd.gear_location, GearPosition::Drive);
        assert_eq!(cmd.steering_target, 12.0);
    }

    #[test]
    fn test_signal_and_pad() {
        let synth = CmdSynth::new(&CtrlParams::default());
        let mut cmd = ControlCommand::default();

        synth.apply_signal(&mut cmd, None);
        assert_eq!(cmd.signal, None);

        let mut traj = AdcTrajectory::default();
        synth.apply_signal(&mut cmd, Some(&traj));
        assert_eq!(cmd.signal, None);

        let signal = VehicleSignal {
            turn_signal: TurnSignal::TurnLeft,
            ..Default::default()
        };
        traj.decision.vehicle_signal = Some(signal.clone());
        synth.apply_signal(&mut cmd, Some(&traj));
        assert_eq!(cmd.signal, Some(signal));

        synth.echo_pad(&mut cmd, Some(PadMessage::with_action(DrivingAction::Reset)));
        assert!(cmd.pad_msg.as_ref().unwrap().is_reset());
    }

    #[test]
    fn test_latency() {
        let synth = CmdSynth::new(&CtrlParams {
            control_period: 0.01,
            ..Default::default()
        });
        let mut cmd = ControlCommand::default();

        synth.set_latency(&mut cmd, 10.0, 10.002);
        assert!((cmd.latency_stats.total_time_ms - 2.0).abs() < 1e-6);
        assert!(!cmd.latency_stats.total_time_exceeded);

        synth.set_latency(&mut cmd, 10.0, 10.0);
        assert_eq!(cmd.latency_stats.total_time_ms, 0.0);
        assert!(cmd.latency_stats.total_time_exceeded);
    }

    #[test]
    fn test_status() {
        let synth = CmdSynth::new(&CtrlParams::default());
        let mut cmd = ControlCommand::default();

        let mut estop = EstopState::new();
        synth.set_status(&mut cmd, StatusPb::default(), &estop);
        assert_eq!(cmd.header.status.error_code, ErrorCode::Ok);
        assert_eq!(cmd.header.status.msg, "");

        estop.trigger("stop now");
        synth.set_status(&mut cmd, StatusPb::default(), &estop);
        assert_eq!(cmd.header.status.error_code, ErrorCode::Ok);
        assert_eq!(cmd.header.status.msg, "stop now");
    }

    #[test]
    fn test_fill_header() {
        let mut synth = CmdSynth::new(&CtrlParams::default());

        let mut traj = AdcTrajectory::default();
        traj.header.lidar_timestamp = 11;
        traj.header.camera_timestamp = 22;
        traj.header.radar_timestamp = 33;

        let mut cmd = ControlCommand::default();
        synth.fill_header(&mut cmd, Some(&traj), 123.5);
        assert_eq!(cmd.header.lidar_timestamp, 11);
        assert_eq!(cmd.header.camera_timestamp, 22);
        assert_eq!(cmd.header.radar_timestamp, 33);
        assert_eq!(cmd.header.module_name, "control");
        assert_eq!(cmd.header.timestamp_sec, 123.5);
        assert_eq!(cmd.header.sequence_num, 0);

        let mut cmd = ControlCommand::default();
        synth.fill_header(&mut cmd, None, 124.0);
        assert_eq!(cmd.header.lidar_timestamp, 0);
        assert_eq!(cmd.header.sequence_num, 1);
    }
}
