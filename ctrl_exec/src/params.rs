//! # Control Executable Parameters
//!
//! This module provides the parameters of the control stage, loaded once from `ctrl_exec.toml`
//! before the first cycle and read-only afterwards.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::msg::DrivingAction;
use serde::Deserialize;

use crate::controller::{ControllerKind, LatCtrlParams, LonCtrlParams};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters for the control stage.
#[derive(Debug, Clone, Deserialize)]
pub struct CtrlParams {

    // ---- CYCLE ----

    /// Name put in the header of every control command
    pub module_name: String,

    /// Target period of one cycle.
    ///
    /// Units: seconds
    pub control_period: f64,

    /// Wait before the first cycle so that the output channel is ready.
    ///
    /// Units: seconds
    pub startup_delay_s: f64,

    // ---- INPUT STALENESS ----

    /// Number of localization messages that may be missed before the input is stale
    pub max_localization_miss_num: u32,

    /// Nominal localization period.
    ///
    /// Units: seconds
    pub localization_period: f64,

    /// Number of chassis messages that may be missed before the input is stale
    pub max_chassis_miss_num: u32,

    /// Nominal chassis period.
    ///
    /// Units: seconds
    pub chassis_period: f64,

    /// Number of trajectories that may be missed before the input is stale
    pub max_planning_miss_num: u32,

    /// Nominal trajectory period.
    ///
    /// Units: seconds
    pub trajectory_period: f64,

    /// If false the staleness check is skipped
    pub enable_input_timestamp_check: bool,

    // ---- ESTOP ----

    /// Trajectory points slower than this have their speed and acceleration zeroed.
    ///
    /// Units: meters/second
    pub minimum_speed_resolution: f64,

    /// Brake demand used while estopped.
    ///
    /// Units: percent
    pub soft_estop_brake: f64,

    /// If true an estop persists across cycles until an operator reset
    pub enable_persistent_estop: bool,

    // ---- TEST MODE ----

    /// In test mode commands are synthesised but never published and staleness is not checked
    pub is_control_test_mode: bool,

    /// Time after the first cycle at which test mode stops the executable. Disabled if not
    /// positive.
    ///
    /// Units: seconds
    pub control_test_duration: f64,

    // ---- PAD ----

    /// Pad action stored at startup
    pub action: DrivingAction,

    // ---- CONTROLLERS ----

    /// Controllers to run, in order
    pub controllers: Vec<ControllerKind>,

    pub lon_ctrl: LonCtrlParams,

    pub lat_ctrl: LatCtrlParams,

    // ---- CHANNELS ----

    pub channels: Channels,
}

/// Topic names of the control stage's channels.
#[derive(Debug, Clone, Deserialize)]
pub struct Channels {
    pub chassis: String,
    pub localization: String,
    pub planning: String,
    pub pad: String,
    pub monitor: String,
    pub control: String,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Reasons the parameters can be rejected after loading.
#[derive(Debug, thiserror::Error)]
pub enum ParamsError {
    #[error("{0} must be positive, found {1}")]
    NotPositive(&'static str, f64),

    #[error("soft_estop_brake must be within [0, 100] percent, found {0}")]
    InvalidEstopBrake(f64),

    #[error("minimum_speed_resolution must not be negative, found {0}")]
    InvalidSpeedResolution(f64),

    #[error("At least one controller must be configured")]
    NoControllers,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl CtrlParams {
    /// Check the parameters are consistent.
    pub fn validate(&self) -> Result<(), ParamsError> {
        let periods = [
            ("control_period", self.control_period),
            ("localization_period", self.localization_period),
            ("chassis_period", self.chassis_period),
            ("trajectory_period", self.trajectory_period),
        ];

        for &(name, value) in periods.iter() {
            if !(value > 0.0) {
                return Err(ParamsError::NotPositive(name, value))
            }
        }

        if !(0.0..=100.0).contains(&self.soft_estop_brake) {
            return Err(ParamsError::InvalidEstopBrake(self.soft_estop_brake))
        }

        if self.minimum_speed_resolution < 0.0 {
            return Err(ParamsError::InvalidSpeedResolution(self.minimum_speed_resolution))
        }

        if self.controllers.is_empty() {
            return Err(ParamsError::NoControllers)
        }

        Ok(())
    }

    /// Maximum allowed age of the localization input.
    ///
    /// Units: seconds
    pub fn localization_budget_s(&self) -> f64 {
        self.max_localization_miss_num as f64 * self.localization_period
    }

    /// Maximum allowed age of the chassis input.
    ///
    /// Units: seconds
    pub fn chassis_budget_s(&self) -> f64 {
        self.max_chassis_miss_num as f64 * self.chassis_period
    }

    /// Maximum allowed age of the trajectory input.
    ///
    /// Units: seconds
    pub fn trajectory_budget_s(&self) -> f64 {
        self.max_planning_miss_num as f64 * self.trajectory_period
    }
}

impl Default for CtrlParams {
    fn default() -> Self {
        Self {
            module_name: String::from("control"),
            control_period: 0.01,
            startup_delay_s: 1.0,
            max_localization_miss_num: 20,
            localization_period: 0.01,
            max_chassis_miss_num: 20,
            chassis_period: 0.01,
            max_planning_miss_num: 20,
            trajectory_period: 0.1,
            enable_input_timestamp_check: true,
            minimum_speed_resolution: 0.2,
            soft_estop_brake: 50.0,
            enable_persistent_estop: true,
            is_control_test_mode: false,
            control_test_duration: -1.0,
            action: DrivingAction::Start,
            controllers: vec![ControllerKind::Lon, ControllerKind::Lat],
            lon_ctrl: LonCtrlParams::default(),
            lat_ctrl: LatCtrlParams::default(),
            channels: Channels::default(),
        }
    }
}

impl Default for Channels {
    fn default() -> Self {
        Self {
            chassis: String::from("chassis"),
            localization: String::from("localization"),
            planning: String::from("planning"),
            pad: String::from("control_pad"),
            monitor: String::from("monitor"),
            control: String::from("control"),
        }
    }
}
