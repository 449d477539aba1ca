//! # Messages
//!
//! Definitions of the messages carried on the control stage's channels. Only the fields the
//! control stage reads or writes are modelled. All messages are serialised as JSON on the wire.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

pub mod chassis;
pub mod control;
pub mod localization;
pub mod monitor;
pub mod pad;
pub mod planning;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

pub use chassis::*;
pub use control::*;
pub use localization::*;
pub use monitor::*;
pub use pad::*;
pub use planning::*;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Header carried by every message.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Header {
    /// Time at which the message was produced.
    ///
    /// Units: seconds since the UNIX epoch
    pub timestamp_sec: f64,

    /// Name of the module which produced the message
    pub module_name: String,

    /// Sequence number, incremented by the producer for each message
    pub sequence_num: u32,

    /// Timestamp of the lidar data the message was derived from.
    ///
    /// Units: nanoseconds
    pub lidar_timestamp: u64,

    /// Timestamp of the camera data the message was derived from.
    ///
    /// Units: nanoseconds
    pub camera_timestamp: u64,

    /// Timestamp of the radar data the message was derived from.
    ///
    /// Units: nanoseconds
    pub radar_timestamp: u64,

    /// Processing status of the producer
    pub status: StatusPb,
}

/// Status of a processing step as carried on the wire.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct StatusPb {
    pub error_code: ErrorCode,
    pub msg: String,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Error codes reported in a [`StatusPb`].
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorCode {
    Ok,
    ControlError,
    ControlInitError,
    ControlComputeError,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for ErrorCode {
    fn default() -> Self {
        ErrorCode::Ok
    }
}

impl StatusPb {
    /// A successful status with no message.
    pub fn ok() -> Self {
        Self::default()
    }

    /// Returns true if the error code is `Ok`.
    pub fn is_ok(&self) -> bool {
        self.error_code == ErrorCode::Ok
    }
}
