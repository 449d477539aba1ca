//! # Control cycle
//!
//! One [`ControlCycle::proc`] call is one cycle: read the inputs, check them, update the estop
//! state, invoke the control algorithm if not estopped, synthesise the command and publish it.
//! The caller is responsible for calling it at the control period.
//!
//! No in-cycle failure is returned to the caller. Failures are recovered into the estop state and
//! reported through the command's header status and engage advice.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::sync::Arc;

use log::{error, info, warn, Level};

use comms_if::msg::{Advice, ControlCommand, DrivingMode, EngageAdvice, StatusPb};
use util::{log_every, time::Clock};

use crate::{
    checks::{check_input, check_timestamp},
    cmd_writer::CmdWriter,
    controller::ControlAlgorithm,
    error::CtrlError,
    estop::EstopState,
    params::CtrlParams,
    snapshot::{CycleInputs, InputSnapshot},
    state::ControllerState,
    synth::CmdSynth,
    vehicle_state::VehicleStateSink,
};

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Result of a cycle, telling the driver whether to keep going.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CycleStatus {
    Continue,

    /// The test duration has elapsed, no command was produced
    Finished,
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct ControlCycle {
    params: CtrlParams,

    snapshot: Arc<InputSnapshot>,

    state: Arc<ControllerState>,

    controller: Box<dyn ControlAlgorithm + Send>,

    vehicle_state: Box<dyn VehicleStateSink + Send>,

    writer: Box<dyn CmdWriter + Send>,

    clock: Box<dyn Clock + Send>,

    synth: CmdSynth,

    /// Start time of the first cycle.
    ///
    /// Units: seconds
    first_cycle_s: Option<f64>,

    num_cycles: u64,

    last_cmd: Option<ControlCommand>,

    last_result: Result<(), CtrlError>,

    /// Estop state decided by the current cycle
    cycle_estop: EstopState,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ControlCycle {
    pub fn new(
        params: CtrlParams,
        snapshot: Arc<InputSnapshot>,
        state: Arc<ControllerState>,
        controller: Box<dyn ControlAlgorithm + Send>,
        vehicle_state: Box<dyn VehicleStateSink + Send>,
        writer: Box<dyn CmdWriter + Send>,
        clock: Box<dyn Clock + Send>,
    ) -> Self {
        info!("Control cycle using {}", controller.name());

        Self {
            synth: CmdSynth::new(&params),
            params,
            snapshot,
            state,
            controller,
            vehicle_state,
            writer,
            clock,
            first_cycle_s: None,
            num_cycles: 0,
            last_cmd: None,
            last_result: Ok(()),
            cycle_estop: EstopState::new(),
        }
    }

    /// Run one cycle.
    pub fn proc(&mut self) -> CycleStatus {
        let start_s = self.clock.now_s();
        let first_cycle_s = *self.first_cycle_s.get_or_insert(start_s);

        if self.params.is_control_test_mode
            && self.params.control_test_duration > 0.0
            && start_s - first_cycle_s > self.params.control_test_duration
        {
            info!(
                "Control finished testing after {:.3} s ({} cycles)",
                start_s - first_cycle_s, self.num_cycles
            );
            return CycleStatus::Finished;
        }

        let mut inputs = self.snapshot.read();
        let mut cmd = ControlCommand::default();

        let result = self.produce_control_command(&mut inputs, &mut cmd, start_s);
        let status = match &result {
            Ok(()) => StatusPb::ok(),
            Err(e) => e.status(),
        };

        let end_s = self.clock.now_s();
        self.synth.set_latency(&mut cmd, start_s, end_s);
        log_every!(
            100,
            Level::Debug,
            "Control cycle {} took {:.3} ms",
            self.num_cycles,
            cmd.latency_stats.total_time_ms
        );

        self.synth.echo_pad(&mut cmd, self.state.take_pad());
        self.synth.set_status(&mut cmd, status, &self.cycle_estop);
        self.synth.fill_header(&mut cmd, inputs.trajectory.as_ref(), end_s);

        if !self.params.is_control_test_mode {
            if let Err(e) = self.writer.write(&cmd) {
                warn!("Could not publish control command: {}", e);
            }
        }

        self.num_cycles += 1;
        self.last_cmd = Some(cmd);
        self.last_result = result;

        CycleStatus::Continue
    }

    /// Check the inputs, update the estop state and fill the motion fields, engage advice and
    /// signal of `cmd`.
    ///
    /// Returns the first failure of this cycle. The command is always usable, if estopped it
    /// carries the fail-safe values.
    pub fn produce_control_command(
        &mut self,
        inputs: &mut CycleInputs,
        cmd: &mut ControlCommand,
        now_s: f64,
    ) -> Result<(), CtrlError> {
        let mut result = Ok(());

        let input_failure = match check_input(inputs, &self.params, self.vehicle_state.as_mut()) {
            Ok(()) => None,
            Err(e) => {
                log_every!(100, Level::Error, "Control input check failed: {}", e);
                cmd.engage_advice = EngageAdvice::new(Advice::DisallowEngage, e.to_string());
                result = Err(e.clone());
                Some(e)
            }
        };

        if input_failure.is_none() {
            match check_timestamp(inputs, &self.params, now_s) {
                Ok(()) => {
                    cmd.engage_advice = EngageAdvice::new(Advice::ReadyToEngage, "");
                }
                Err(e) => {
                    let auto = inputs.chassis
                        .as_ref()
                        .map(|c| c.driving_mode == DrivingMode::CompleteAutoDrive)
                        .unwrap_or(false);
                    if !auto {
                        cmd.engage_advice = EngageAdvice::new(
                            Advice::DisallowEngage,
                            e.to_string()
                        );
                    }
                    result = Err(e);
                }
            }
        }

        let planning_estop = inputs.trajectory
            .as_ref()
            .map(|t| t.is_estop())
            .unwrap_or(false);

        // The estop decision is taken once here and used for the rest of the cycle. A reset
        // delivered after this point takes effect from the next cycle.
        let mut estop = {
            let mut shared = self.state.estop();
            shared.update(
                input_failure.as_ref(),
                planning_estop,
                self.params.enable_persistent_estop
            );
            shared.clone()
        };

        if !estop.is_active() {
            if let Some((localization, chassis, trajectory)) = inputs.complete() {
                let debug = &mut cmd.debug.input_debug;
                debug.localization_header = localization.header.clone();
                debug.canbus_header = chassis.header.clone();
                debug.trajectory_header = trajectory.header.clone();

                if chassis.driving_mode == DrivingMode::CompleteManual {
                    self.controller.reset();
                    log_every!(100, Level::Info, "Reset controllers in manual mode");
                }
                else if let Err(e) = self.controller.compute(
                    localization, chassis, trajectory, cmd
                ) {
                    let e = CtrlError::ComputationFailure(e);
                    error!("Control computation failed: {}", e);
                    let mut shared = self.state.estop();
                    shared.trigger(e.to_string());
                    estop = shared.clone();
                    result = Err(e);
                }
            }
        }

        if estop.is_active() {
            log_every!(100, Level::Warn, "Estop active: {}", estop.reason());
            self.synth.apply_estop(cmd);
        }

        self.synth.apply_signal(cmd, inputs.trajectory.as_ref());
        self.cycle_estop = estop;

        result
    }

    /// The command produced by the last cycle, whether published or not.
    pub fn last_command(&self) -> Option<&ControlCommand> {
        self.last_cmd.as_ref()
    }

    /// The failure of the last cycle, if any.
    pub fn last_result(&self) -> &Result<(), CtrlError> {
        &self.last_result
    }

    pub fn num_cycles(&self) -> u64 {
        self.num_cycles
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        controller::ControllerError,
        error::InputKind,
        estop::PLANNING_ESTOP_REASON,
        test_utils::{self, RecordingSink, RecordingWriter, Script, ScriptedController},
    };
    use comms_if::msg::{
        DrivingAction, ErrorCode, GearPosition, MonitorLogLevel, MonitorMessage,
        MonitorMessageItem, PadMessage, TurnSignal, VehicleSignal,
    };
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;
    use util::time::SimClock;

    const T0: f64 = 100.0;

    struct Harness {
        cycle: ControlCycle,
        snapshot: Arc<InputSnapshot>,
        state: Arc<ControllerState>,
        clock: SimClock,
        writer: RecordingWriter,
        sink: RecordingSink,
        script: Arc<Mutex<Script>>,
    }

    impl Harness {
        fn new(params: CtrlParams) -> Self {
            let snapshot = Arc::new(InputSnapshot::new());
            let state = Arc::new(ControllerState::new(params.action));
            let clock = SimClock::new(T0);
            let writer = RecordingWriter::default();
            let sink = RecordingSink::default();
            let (controller, script) = ScriptedController::new(5.0);

            let cycle = ControlCycle::new(
                params,
                snapshot.clone(),
                state.clone(),
                Box::new(controller),
                Box::new(sink.clone()),
                Box::new(writer.clone()),
                Box::new(clock.clone()),
            );

            Self { cycle, snapshot, state, clock, writer, sink, script }
        }

        /// Deliver fresh inputs stamped at the current time.
        fn deliver_all(&self) {
            let now = self.clock.now_s();
            self.snapshot.on_localization(test_utils::localization_at(0.0, 0.0, 0.0, now));
            self.snapshot.on_chassis(test_utils::auto_chassis(5.0, now));
            self.snapshot.on_trajectory(test_utils::straight_trajectory(5.0, now));
        }

        fn deliver_planning_estop(&self, is_estop: bool) {
            let mut traj = test_utils::straight_trajectory(5.0, self.clock.now_s());
            traj.estop.is_estop = is_estop;
            self.snapshot.on_trajectory(traj);
        }

        fn computes(&self) -> usize {
            self.script.lock().unwrap().computes
        }

        fn estop_active(&self) -> bool {
            self.state.estop_snapshot().is_active()
        }
    }

    fn assert_fail_safe(cmd: &ControlCommand, params: &CtrlParams) {
        assert_eq!(cmd.speed, 0.0);
        assert_eq!(cmd.throttle, 0.0);
        assert_eq!(cmd.brake, params.soft_estop_brake);
        assert_eq!(cmd.gear_location, GearPosition::Drive);
    }

    #[test]
    fn test_missing_chassis() {
        let params = CtrlParams::default();
        let mut h = Harness::new(params.clone());

        h.snapshot.on_localization(test_utils::localization_at(0.0, 0.0, 0.0, T0));
        h.snapshot.on_trajectory(test_utils::straight_trajectory(5.0, T0));

        let mut inputs = h.snapshot.read();
        let mut cmd = ControlCommand::default();
        let result = h.cycle.produce_control_command(&mut inputs, &mut cmd, T0);

        assert_eq!(result, Err(CtrlError::MissingInput(InputKind::Chassis)));
        assert_eq!(cmd.engage_advice.advice, Advice::DisallowEngage);
        assert_eq!(cmd.engage_advice.reason, "No chassis msg");
        assert!(h.estop_active());
        assert_fail_safe(&cmd, &params);

        // Published with the failure in the status
        assert_eq!(h.cycle.proc(), CycleStatus::Continue);
        let published = h.writer.last();
        assert_fail_safe(&published, &params);
        assert_eq!(published.header.status.error_code, ErrorCode::ControlComputeError);
        assert_eq!(published.header.status.msg, "No chassis msg");
        assert_eq!(h.computes(), 0);
        assert_eq!(h.sink.updates(), 0);
    }

    #[test]
    fn test_input_failure_without_persistence() {
        let params = CtrlParams {
            enable_persistent_estop: false,
            ..Default::default()
        };
        let mut h = Harness::new(params.clone());

        // No inputs at all
        h.cycle.proc();
        assert_fail_safe(&h.writer.last(), &params);
        assert_eq!(h.writer.last().header.status.msg, "No localization msg");

        // Empty trajectory without a stop request
        h.deliver_all();
        let mut traj = test_utils::straight_trajectory(5.0, T0);
        traj.trajectory_point.clear();
        h.snapshot.on_trajectory(traj);

        h.cycle.proc();
        assert_fail_safe(&h.writer.last(), &params);
        assert_eq!(h.cycle.last_result(), &Err(CtrlError::IncompleteInput));

        // Recovers once the inputs are good
        h.deliver_all();
        h.cycle.proc();
        assert!(!h.estop_active());
        assert_eq!(h.writer.last().speed, 5.0);
    }

    #[test]
    fn test_nominal() {
        let mut h = Harness::new(CtrlParams::default());
        h.deliver_all();

        assert_eq!(h.cycle.proc(), CycleStatus::Continue);

        let cmd = h.writer.last();
        assert_eq!(cmd.speed, 5.0);
        assert_eq!(cmd.throttle, 30.0);
        assert_eq!(cmd.engage_advice.advice, Advice::ReadyToEngage);
        assert!(cmd.header.status.is_ok());
        assert!(!h.estop_active());
        assert_eq!(h.cycle.last_result(), &Ok(()));
        assert_eq!(h.computes(), 1);
        assert_eq!(h.sink.updates(), 1);

        let inputs = h.snapshot.read();
        assert_eq!(cmd.debug.input_debug.canbus_header, inputs.chassis.unwrap().header);
        assert_eq!(
            cmd.debug.input_debug.trajectory_header,
            inputs.trajectory.unwrap().header
        );
    }

    #[test]
    fn test_planning_estop_not_persistent() {
        let params = CtrlParams {
            enable_persistent_estop: false,
            ..Default::default()
        };
        let mut h = Harness::new(params.clone());
        h.deliver_all();
        h.deliver_planning_estop(true);

        h.cycle.proc();
        let cmd = h.writer.last();
        assert_fail_safe(&cmd, &params);
        assert_eq!(cmd.header.status.msg, PLANNING_ESTOP_REASON);
        assert_eq!(h.computes(), 0);

        // Vehicle state is still updated while estopped
        assert_eq!(h.sink.updates(), 1);

        // Follows the request with no memory
        h.deliver_planning_estop(false);
        h.cycle.proc();
        assert!(!h.estop_active());
        assert_eq!(h.writer.last().speed, 5.0);

        h.deliver_planning_estop(true);
        h.cycle.proc();
        assert!(h.estop_active());
        assert_fail_safe(&h.writer.last(), &params);
    }

    #[test]
    fn test_persistent_until_reset() {
        let params = CtrlParams::default();
        let mut h = Harness::new(params.clone());
        h.deliver_all();
        h.deliver_planning_estop(true);
        h.cycle.proc();
        assert!(h.estop_active());

        h.deliver_planning_estop(false);
        for _ in 0..5 {
            h.clock.advance(params.control_period);
            h.deliver_all();
            h.cycle.proc();
            assert!(h.estop_active());
            assert_fail_safe(&h.writer.last(), &params);
            assert_eq!(h.writer.last().header.status.msg, PLANNING_ESTOP_REASON);
        }
        assert_eq!(h.computes(), 0);

        h.state.on_pad(PadMessage::with_action(DrivingAction::Reset));
        h.cycle.proc();
        assert!(!h.estop_active());

        let cmd = h.writer.last();
        assert_eq!(cmd.speed, 5.0);
        assert_eq!(cmd.header.status.msg, "");
        assert!(cmd.pad_msg.unwrap().is_reset());

        // The pad message is only echoed once
        h.cycle.proc();
        assert_eq!(h.writer.last().pad_msg, None);
    }

    #[test]
    fn test_reset_with_new_estop() {
        let mut h = Harness::new(CtrlParams::default());
        h.deliver_all();
        h.deliver_planning_estop(true);
        h.cycle.proc();

        // A stop request in the same cycle as the reset re-asserts the estop
        h.state.on_pad(PadMessage::with_action(DrivingAction::Reset));
        h.cycle.proc();
        assert!(h.estop_active());
    }

    #[test]
    fn test_stale_input() {
        let mut h = Harness::new(CtrlParams::default());
        h.deliver_all();

        // Localization and chassis budgets are 0.2 s
        h.clock.advance(0.5);
        h.cycle.proc();

        let cmd = h.writer.last();
        assert!(!h.estop_active());
        assert_eq!(cmd.speed, 5.0);
        assert_eq!(cmd.engage_advice.advice, Advice::Unknown);
        assert_eq!(cmd.header.status.error_code, ErrorCode::ControlComputeError);
        assert_eq!(cmd.header.status.msg, "Localization msg timeout");
        assert!(matches!(
            h.cycle.last_result(),
            Err(CtrlError::StaleInput { input: InputKind::Localization, .. })
        ));

        // Not in autonomous mode engagement is disallowed
        let mut chassis = test_utils::auto_chassis(0.0, T0);
        chassis.driving_mode = DrivingMode::AutoSteerOnly;
        h.snapshot.on_chassis(chassis);
        h.cycle.proc();

        let cmd = h.writer.last();
        assert_eq!(cmd.engage_advice.advice, Advice::DisallowEngage);
        assert_eq!(cmd.engage_advice.reason, "Localization msg timeout");
    }

    #[test]
    fn test_computation_failure() {
        let params = CtrlParams::default();
        let mut h = Harness::new(params.clone());
        h.deliver_all();

        h.script.lock().unwrap().fail_with = Some(ControllerError::Failed(String::from("diverged")));
        h.cycle.proc();

        let cmd = h.writer.last();
        assert_fail_safe(&cmd, &params);
        assert_eq!(cmd.header.status.msg, "diverged");
        assert_eq!(cmd.header.status.error_code, ErrorCode::ControlComputeError);
        assert_eq!(h.state.estop_snapshot().reason(), "diverged");

        // Persists after the controller recovers, since it is no longer invoked
        h.script.lock().unwrap().fail_with = None;
        h.cycle.proc();
        assert!(h.estop_active());
        assert_eq!(h.computes(), 1);
    }

    #[test]
    fn test_computation_failure_not_persistent() {
        let params = CtrlParams {
            enable_persistent_estop: false,
            ..Default::default()
        };
        let mut h = Harness::new(params.clone());
        h.deliver_all();

        h.script.lock().unwrap().fail_with = Some(ControllerError::Failed(String::from("diverged")));
        h.cycle.proc();
        assert_fail_safe(&h.writer.last(), &params);

        h.script.lock().unwrap().fail_with = None;
        h.cycle.proc();
        assert!(!h.estop_active());
        assert_eq!(h.writer.last().speed, 5.0);
    }

    #[test]
    fn test_manual_mode() {
        let mut h = Harness::new(CtrlParams::default());
        h.deliver_all();

        let mut chassis = test_utils::auto_chassis(0.0, T0);
        chassis.driving_mode = DrivingMode::CompleteManual;
        h.snapshot.on_chassis(chassis);

        h.cycle.proc();

        let script = h.script.lock().unwrap();
        assert_eq!(script.resets, 1);
        assert_eq!(script.computes, 0);

        let cmd = h.writer.last();
        assert_eq!(cmd.speed, 0.0);
        assert_eq!(cmd.brake, 0.0);
        assert_eq!(cmd.engage_advice.advice, Advice::ReadyToEngage);
    }

    #[test]
    fn test_monitor_fatal() {
        let params = CtrlParams::default();
        let mut h = Harness::new(params.clone());
        h.deliver_all();
        h.cycle.proc();
        assert!(!h.estop_active());

        h.state.on_monitor(MonitorMessage {
            item: vec![MonitorMessageItem {
                source: String::from("canbus"),
                msg: String::from("chassis fault"),
                log_level: MonitorLogLevel::Fatal,
            }],
            ..Default::default()
        });

        h.cycle.proc();
        let cmd = h.writer.last();
        assert_fail_safe(&cmd, &params);
        assert_eq!(cmd.header.status.msg, "fatal monitor alert: chassis fault");
    }

    #[test]
    fn test_signal_forwarded_when_estopped() {
        let mut h = Harness::new(CtrlParams::default());
        h.deliver_all();

        let mut traj = test_utils::straight_trajectory(5.0, T0);
        traj.estop.is_estop = true;
        traj.decision.vehicle_signal = Some(VehicleSignal {
            turn_signal: TurnSignal::TurnRight,
            emergency_light: true,
            ..Default::default()
        });
        h.snapshot.on_trajectory(traj);

        h.cycle.proc();
        let signal = h.writer.last().signal.unwrap();
        assert_eq!(signal.turn_signal, TurnSignal::TurnRight);
        assert!(signal.emergency_light);
    }

    #[test]
    fn test_header_and_latency() {
        let mut h = Harness::new(CtrlParams::default());
        h.deliver_all();

        let mut traj = test_utils::straight_trajectory(5.0, T0);
        traj.header.lidar_timestamp = 42;
        h.snapshot.on_trajectory(traj);

        h.cycle.proc();
        h.cycle.proc();

        let cmds = h.writer.commands();
        assert_eq!(cmds.len(), 2);
        assert_eq!(cmds[0].header.sequence_num, 0);
        assert_eq!(cmds[1].header.sequence_num, 1);
        assert_eq!(cmds[1].header.module_name, "control");
        assert_eq!(cmds[1].header.lidar_timestamp, 42);
        assert_eq!(cmds[1].header.timestamp_sec, T0);

        // The simulated clock does not move during a cycle
        assert_eq!(cmds[0].latency_stats.total_time_ms, 0.0);
        assert!(cmds[0].latency_stats.total_time_exceeded);
    }

    #[test]
    fn test_clamping_does_not_touch_snapshot() {
        let mut h = Harness::new(CtrlParams::default());
        h.deliver_all();
        h.snapshot.on_trajectory(test_utils::straight_trajectory(0.1, T0));

        h.cycle.proc();

        let stored = h.snapshot.read().trajectory.unwrap();
        assert!(stored.trajectory_point.iter().all(|p| p.v == 0.1));
    }

    #[test]
    fn test_test_mode_duration() {
        let params = CtrlParams {
            is_control_test_mode: true,
            control_test_duration: 5.0,
            ..Default::default()
        };
        let mut h = Harness::new(params);
        h.deliver_all();

        assert_eq!(h.cycle.proc(), CycleStatus::Continue);
        assert_eq!(h.cycle.last_command().unwrap().speed, 5.0);

        // Stale inputs are not checked in test mode
        h.clock.set(T0 + 4.9);
        assert_eq!(h.cycle.proc(), CycleStatus::Continue);
        assert!(h.cycle.last_command().unwrap().header.status.is_ok());

        h.clock.set(T0 + 5.1);
        assert_eq!(h.cycle.proc(), CycleStatus::Finished);
        assert_eq!(h.cycle.num_cycles(), 2);

        // Nothing is ever published in test mode
        assert!(h.writer.commands().is_empty());
    }

    #[test]
    fn test_test_mode_without_duration() {
        let params = CtrlParams {
            is_control_test_mode: true,
            control_test_duration: -1.0,
            ..Default::default()
        };
        let mut h = Harness::new(params);
        h.deliver_all();

        h.cycle.proc();
        h.clock.advance(1000.0);
        assert_eq!(h.cycle.proc(), CycleStatus::Continue);
    }

    #[test]
    fn test_concurrent_reset_keeps_fail_safe() {
        let params = CtrlParams::default();
        let mut h = Harness::new(params.clone());
        h.deliver_all();
        h.deliver_planning_estop(true);

        let stop = Arc::new(AtomicBool::new(false));
        let resetter = {
            let state = h.state.clone();
            let stop = stop.clone();
            std::thread::spawn(move || {
                while !stop.load(Ordering::Relaxed) {
                    state.on_pad(PadMessage::with_action(DrivingAction::Reset));
                }
            })
        };

        // The planner requests a stop every cycle, so every command must be the fail-safe one
        // whenever the reset lands
        for _ in 0..50_000 {
            let mut inputs = h.snapshot.read();
            let mut cmd = ControlCommand::default();
            let _ = h.cycle.produce_control_command(&mut inputs, &mut cmd, T0);
            assert_fail_safe(&cmd, &params);
        }

        for _ in 0..2_000 {
            h.cycle.proc();
            let cmd = h.cycle.last_command().unwrap();
            assert_fail_safe(cmd, &params);
            assert_eq!(cmd.header.status.msg, PLANNING_ESTOP_REASON);
        }

        stop.store(true, Ordering::Relaxed);
        resetter.join().unwrap();
        assert_eq!(h.computes(), 0);
    }
}
