//! # PID controller

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Gains of a PID controller.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
pub struct PidGains {
    /// Proportional gain
    pub k_p: f64,

    /// Integral gain
    pub k_i: f64,

    /// Dervative gain
    pub k_d: f64,

    /// Limit on the magnitude of the integral accumulation
    pub integral_limit: f64,
}

/// A PID controller
#[derive(Debug, Serialize, Clone)]
pub struct PidController {
    gains: PidGains,

    /// Previous error
    prev_error: Option<f64>,

    /// The integral accumulation
    integral: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl PidController {

    /// Create a new controller with the given gains.
    pub fn new(gains: PidGains) -> Self {
        Self {
            gains,
            prev_error: None,
            integral: 0f64,
        }
    }

    /// Get the value of the controller for the given error.
    ///
    /// `dt` is the time since the previous call, in seconds. The cycle runs at a fixed period so
    /// the controller is not time-aware.
    pub fn get(&mut self, error: f64, dt: f64) -> f64 {
        if dt <= 0.0 {
            return self.gains.k_p * error;
        }

        // Accumulate the integral term, bounded to stop wind-up while estopped or saturated
        let limit = self.gains.integral_limit.abs();
        self.integral = (self.integral + error * dt).clamp(-limit, limit);

        // No derivative on the first call after a reset, otherwise it spikes
        let deriv = match self.prev_error {
            Some(e) => (error - e) / dt,
            None => 0f64,
        };

        self.prev_error = Some(error);

        self.gains.k_p * error 
            + self.gains.k_i * self.integral 
            + self.gains.k_d * deriv
    }

    /// Clear the integral and derivative history.
    pub fn reset(&mut self) {
        self.prev_error = None;
        self.integral = 0f64;
    }
}

impl Default for PidGains {
    fn default() -> Self {
        Self {
            k_p: 1.0,
            k_i: 0.0,
            k_d: 0.0,
            integral_limit: 1.0,
        }
    }
}
