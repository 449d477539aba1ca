//! # Controller state
//!
//! Estop and pad state shared between the cycle and the pad/monitor delivery callbacks. The
//! callbacks apply their transitions straight away on their own thread, so a reset or fatal alert
//! is only guaranteed to be visible from the next cycle onwards.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::sync::{Mutex, MutexGuard};

use log::{error, info};

use comms_if::msg::{DrivingAction, MonitorMessage, PadMessage};

use crate::estop::EstopState;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Last operator pad message.
#[derive(Debug, Clone, Default)]
pub struct PadState {
    pub msg: PadMessage,

    /// True if a message has been received since the last published command
    pub received: bool,
}

#[derive(Debug, Default)]
pub struct ControllerState {
    estop: Mutex<EstopState>,
    pad: Mutex<PadState>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ControllerState {
    /// Create the state with the default pad action stored.
    ///
    /// The default action is not echoed, as it was not received from an operator.
    pub fn new(default_action: DrivingAction) -> Self {
        Self {
            estop: Mutex::new(EstopState::new()),
            pad: Mutex::new(PadState {
                msg: PadMessage::with_action(default_action),
                received: false,
            }),
        }
    }

    /// Handle a pad message from the operator.
    pub fn on_pad(&self, msg: PadMessage) {
        match msg.action {
            Some(action) => info!("Received pad message: {:?}", action),
            None => error!("Pad message has no action"),
        }

        if msg.is_reset() {
            self.estop().reset();
        }

        let mut pad = self.pad.lock().unwrap_or_else(|e| e.into_inner());
        pad.msg = msg;
        pad.received = true;
    }

    /// Handle a monitor message, entering estop on the first fatal item.
    pub fn on_monitor(&self, msg: MonitorMessage) {
        if let Some(item) = msg.first_fatal() {
            error!("Fatal monitor alert from {}: {}", item.source, item.msg);
            self.estop().trigger(format!("fatal monitor alert: {}", item.msg));
        }
    }

    /// Lock the estop state.
    pub fn estop(&self) -> MutexGuard<'_, EstopState> {
        // The estop state is always left consistent, so recover it from a panicked holder
        self.estop.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Copy of the current estop state.
    pub fn estop_snapshot(&self) -> EstopState {
        self.estop().clone()
    }

    /// Take the pad message if one was received since the last call.
    pub fn take_pad(&self) -> Option<PadMessage> {
        let mut pad = self.pad.lock().unwrap_or_else(|e| e.into_inner());
        if pad.received {
            pad.received = false;
            Some(pad.msg.clone())
        } else {
            None
        }
    }

    /// The currently stored pad action.
    #[cfg(test)]
    pub fn pad_action(&self) -> Option<DrivingAction> {
        self.pad.lock().unwrap_or_else(|e| e.into_inner()).msg.action
    }
}
