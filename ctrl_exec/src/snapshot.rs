//! # Shared input snapshot
//!
//! Holds the latest delivered value of each input channel. Delivery callbacks overwrite a slot
//! from their own thread and the cycle reads all slots once per period.
//!
//! Each slot has its own lock, so [`InputSnapshot::read`] is a sequence of independent reads and
//! not one atomic read across the three channels. A delivery may land between two of those reads,
//! in which case the cycle sees a newer value on one channel than it would have at the start of
//! the read. This is accepted: the next cycle sees the newer values on all channels.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::sync::Mutex;

use comms_if::msg::{AdcTrajectory, Chassis, LocalizationEstimate};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A single-value mailbox where a new value always replaces the previous one.
#[derive(Debug, Default)]
pub struct LatestSlot<T> {
    value: Mutex<Option<T>>,
}

/// Latest value of each input channel.
#[derive(Debug, Default)]
pub struct InputSnapshot {
    chassis: LatestSlot<Chassis>,
    localization: LatestSlot<LocalizationEstimate>,
    trajectory: LatestSlot<AdcTrajectory>,
}

/// Owned copy of the inputs used by a single cycle.
///
/// Mutations made by the cycle (e.g. speed clamping) only affect this copy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleInputs {
    pub chassis: Option<Chassis>,
    pub localization: Option<LocalizationEstimate>,
    pub trajectory: Option<AdcTrajectory>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<T: Clone> LatestSlot<T> {
    pub fn new() -> Self {
        Self {
            value: Mutex::new(None),
        }
    }

    /// Replace the held value.
    pub fn put(&self, value: T) {
        // A poisoned slot still holds a whole value, since writes are a single assignment
        let mut guard = self.value.lock().unwrap_or_else(|e| e.into_inner());
        *guard = Some(value);
    }

    /// Get a copy of the held value, if one has ever been delivered.
    pub fn latest(&self) -> Option<T> {
        self.value.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    #[cfg(test)]
    pub fn has_value(&self) -> bool {
        self.value.lock().unwrap_or_else(|e| e.into_inner()).is_some()
    }
}

impl InputSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_chassis(&self, chassis: Chassis) {
        self.chassis.put(chassis);
    }

    pub fn on_localization(&self, localization: LocalizationEstimate) {
        self.localization.put(localization);
    }

    pub fn on_trajectory(&self, trajectory: AdcTrajectory) {
        self.trajectory.put(trajectory);
    }

    /// Copy the latest inputs for use by one cycle.
    ///
    /// The three channels are read one after the other, each under its own lock. See the module
    /// documentation.
    pub fn read(&self) -> CycleInputs {
        CycleInputs {
            chassis: self.chassis.latest(),
            localization: self.localization.latest(),
            trajectory: self.trajectory.latest(),
        }
    }
}

impl CycleInputs {
    /// Borrow all three inputs if every channel has delivered.
    pub fn complete(&self) -> Option<(&LocalizationEstimate, &Chassis, &AdcTrajectory)> {
        match (&self.localization, &self.chassis, &self.trajectory) {
            (Some(l), Some(c), Some(t)) => Some((l, c, t)),
            _ => None,
        }
    }
}
