//! Controller parameters

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;

use super::pid::PidGains;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters of the longitudinal controller.
#[derive(Debug, Clone, Deserialize)]
pub struct LonCtrlParams {
    /// Gains of the speed error controller
    pub speed_pid: PidGains,

    /// Units: meters/second^2
    pub max_acceleration_mss: f64,

    /// Magnitude of the largest deceleration demand.
    ///
    /// Units: meters/second^2
    pub max_deceleration_mss: f64,

    /// Throttle below which the vehicle does not move.
    ///
    /// Units: percent
    pub throttle_deadzone: f64,

    /// Brake below which the vehicle does not decelerate.
    ///
    /// Units: percent
    pub brake_deadzone: f64,

    /// Distance to the nearest trajectory point above which computation fails.
    ///
    /// Units: meters
    pub max_station_error_m: f64,
}

/// Parameters of the lateral controller.
#[derive(Debug, Clone, Deserialize)]
pub struct LatCtrlParams {
    /// Gains of the lateral (cross track) error controller
    pub lat_error_pid: PidGains,

    /// Gains of the heading error controller
    pub heading_error_pid: PidGains,

    /// Units: meters
    pub wheelbase_m: f64,

    /// Road wheel angle at 100% steering.
    ///
    /// Units: radians
    pub max_steer_angle_rad: f64,

    /// Steering rate demand.
    ///
    /// Units: percent/second
    pub steering_rate: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for LonCtrlParams {
    fn default() -> Self {
        Self {
            speed_pid: PidGains {
                k_p: 1.5,
                k_i: 0.3,
                k_d: 0.0,
                integral_limit: 0.5,
            },
            max_acceleration_mss: 2.0,
            max_deceleration_mss: 4.0,
            throttle_deadzone: 5.0,
            brake_deadzone: 10.0,
            max_station_error_m: 5.0,
        }
    }
}

impl Default for LatCtrlParams {
    fn default() -> Self {
        Self {
            lat_error_pid: PidGains {
                k_p: 0.3,
                k_i: 0.0,
                k_d: 0.05,
                integral_limit: 0.1,
            },
            heading_error_pid: PidGains {
                k_p: 0.8,
                k_i: 0.0,
                k_d: 0.0,
                integral_limit: 0.1,
            },
            wheelbase_m: 2.8,
            max_steer_angle_rad: 0.5,
            steering_rate: 100.0,
        }
    }
}
