//! # Command writer
//!
//! Publishes each synthesised command. Publishing never waits for an acknowledgement.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::{
    msg::ControlCommand,
    net::{zmq, NetError, Publisher},
};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Output channel for control commands.
pub trait CmdWriter {
    fn write(&mut self, cmd: &ControlCommand) -> Result<(), NetError>;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Writes commands to a zmq publisher.
pub struct NetCmdWriter {
    publisher: Publisher,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl NetCmdWriter {
    pub fn new(ctx: &zmq::Context, endpoint: &str, topic: &str) -> Result<Self, NetError> {
        Ok(Self {
            publisher: Publisher::new(ctx, endpoint, topic)?,
        })
    }
}

impl CmdWriter for NetCmdWriter {
    fn write(&mut self, cmd: &ControlCommand) -> Result<(), NetError> {
        self.publisher.publish(cmd)
    }
}
