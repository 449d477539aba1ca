//! # Control library.
//!
//! This library holds the closed-loop orchestration core of the control stage, so that the
//! executable, the benchmarks and other crates in the workspace can access it.
//!
//! Each cycle the core:
//!     - Reads the latest chassis, localization and trajectory inputs
//!     - Checks they are present, complete and recent enough
//!     - Updates the emergency stop (estop) state
//!     - Invokes the control algorithm if not estopped
//!     - Synthesises and publishes the control command

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Input checks - presence, completeness and staleness of the cycle inputs
pub mod checks;

/// Command writer - publishes control commands on the network
pub mod cmd_writer;

/// Controllers - the control algorithm capability and its concrete variants
pub mod controller;

/// Control cycle - sequences the checks, estop, algorithm and synthesis once per period
pub mod cycle;

/// In-cycle error taxonomy
pub mod error;

/// Estop state machine
pub mod estop;

/// Input clients - subscribe to input channels and feed the snapshot and controller state
pub mod input_client;

/// Parameters of the control stage
pub mod params;

/// Shared input snapshot - latest delivered value of each input channel
pub mod snapshot;

/// Controller state - estop and pad state shared between the cycle and delivery callbacks
pub mod state;

/// Command synthesis - fail-safe override, header, latency, pad echo
pub mod synth;

/// Vehicle state sink
pub mod vehicle_state;

#[cfg(test)]
pub(crate) mod test_utils;
