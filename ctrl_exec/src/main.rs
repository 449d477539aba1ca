//! Main control executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Load parameters and initialise the controllers
//!     - Connect the input subscribers and the command publisher
//!     - Wait for the output channel to become ready
//!     - Main loop, once per control period:
//!         - Read the latest inputs
//!         - Check them and update the estop state
//!         - Compute the control command
//!         - Publish the command
//!
//! The loop only ends if the test duration elapses in test mode.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{info, warn};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

// Internal
use comms_if::net::{zmq, NetParams};
use ctrl_lib::{
    cmd_writer::NetCmdWriter,
    controller::ControllerAgent,
    cycle::{ControlCycle, CycleStatus},
    input_client::InputClients,
    params::CtrlParams,
    snapshot::InputSnapshot,
    state::ControllerState,
    vehicle_state::VehicleStateProvider,
};
use util::{
    host,
    logger::{logger_init, LevelFilter},
    session::Session,
    time::WallClock,
};

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {

    // ---- EARLY INITIALISATION ----

    color_eyre::install()?;

    // Initialise session
    let session = Session::new(
        "ctrl_exec",
        "sessions"
    ).wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session)
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Control Executable\n");
    info!(
        "Running on: {:#?}",
        host::get_uname().wrap_err("Failed to get host information")?
    );
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let params: CtrlParams = util::params::load("ctrl_exec.toml")
        .wrap_err("Could not load control params")?;
    params.validate()
        .wrap_err("Invalid control params")?;

    let net_params: NetParams = util::params::load("net.toml")
        .wrap_err("Could not load net params")?;

    for file in ["ctrl_exec.toml", "net.toml"].iter() {
        session.archive_params(file)
            .wrap_err_with(|| format!("Could not archive {}", file))?;
    }

    info!("Exec parameters loaded");

    if params.is_control_test_mode {
        info!(
            "Running in test mode, commands will not be published (test duration: {} s)",
            params.control_test_duration
        );
    }

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let controller = ControllerAgent::init(&params)
        .wrap_err("Failed to initialise the controllers")?;
    info!("ControllerAgent init complete");

    let snapshot = Arc::new(InputSnapshot::new());
    let state = Arc::new(ControllerState::new(params.action));

    info!("Module initialisation complete\n");

    // ---- INITIALISE NETWORK ----

    info!("Initialising network");

    let zmq_ctx = zmq::Context::new();

    let writer = NetCmdWriter::new(
        &zmq_ctx,
        &net_params.control_endpoint,
        &params.channels.control
    ).wrap_err("Failed to initialise the command publisher")?;
    info!("Command publisher initialised");

    let input_clients = InputClients::new(
        &zmq_ctx,
        &net_params,
        &params.channels,
        snapshot.clone(),
        state.clone()
    ).wrap_err("Failed to initialise the input clients")?;
    info!("{} input clients initialised", input_clients.num_subscribers());

    info!("Network initialisation complete");

    // ---- MAIN LOOP ----

    let period = Duration::from_secs_f64(params.control_period);
    let startup_delay = Duration::from_secs_f64(params.startup_delay_s.max(0.0));

    let mut cycle = ControlCycle::new(
        params,
        snapshot,
        state,
        Box::new(controller),
        Box::new(VehicleStateProvider::new()),
        Box::new(writer),
        Box::new(WallClock),
    );

    // Give subscribers of the command channel time to connect
    info!("Waiting {:.2} s before the first cycle", startup_delay.as_secs_f64());
    thread::sleep(startup_delay);

    info!("Begining main loop\n");

    loop {
        // Get cycle start time
        let cycle_start_instant = Instant::now();

        if cycle.proc() == CycleStatus::Finished {
            break;
        }

        // Get sleep duration
        let cycle_dur = Instant::now() - cycle_start_instant;
        match period.checked_sub(cycle_dur) {
            Some(d) => thread::sleep(d),
            None => warn!(
                "Cycle overran by {:.06} s",
                cycle_dur.as_secs_f64() - period.as_secs_f64()
            ),
        }
    }

    // ---- SHUTDOWN ----

    drop(input_clients);

    info!("End of execution after {} cycles", cycle.num_cycles());

    Ok(())
}
