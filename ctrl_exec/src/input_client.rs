//! # Input clients
//!
//! Subscribes to the input channels. The handlers only store the delivered message: chassis,
//! localization and trajectory go to the [`InputSnapshot`], pad and monitor messages are applied
//! to the [`ControllerState`]. No validation is done here.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::sync::Arc;

use log::info;

use comms_if::{
    msg::{AdcTrajectory, Chassis, LocalizationEstimate, MonitorMessage, PadMessage},
    net::{zmq, NetError, NetParams, Subscriber},
};

use crate::{params::Channels, snapshot::InputSnapshot, state::ControllerState};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The input subscribers. Dropping this stops all of them.
pub struct InputClients {
    subscribers: Vec<Subscriber>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl InputClients {
    /// Connect to every input channel.
    pub fn new(
        ctx: &zmq::Context,
        net_params: &NetParams,
        channels: &Channels,
        snapshot: Arc<InputSnapshot>,
        state: Arc<ControllerState>,
    ) -> Result<Self, NetError> {
        let mut subscribers = Vec::with_capacity(5);

        let s = snapshot.clone();
        subscribers.push(Subscriber::spawn(
            ctx,
            &net_params.chassis_endpoint,
            &channels.chassis,
            move |msg: Chassis| s.on_chassis(msg),
        )?);

        let s = snapshot.clone();
        subscribers.push(Subscriber::spawn(
            ctx,
            &net_params.localization_endpoint,
            &channels.localization,
            move |msg: LocalizationEstimate| s.on_localization(msg),
        )?);

        let s = snapshot;
        subscribers.push(Subscriber::spawn(
            ctx,
            &net_params.planning_endpoint,
            &channels.planning,
            move |msg: AdcTrajectory| s.on_trajectory(msg),
        )?);

        let st = state.clone();
        subscribers.push(Subscriber::spawn(
            ctx,
            &net_params.pad_endpoint,
            &channels.pad,
            move |msg: PadMessage| st.on_pad(msg),
        )?);

        let st = state;
        subscribers.push(Subscriber::spawn(
            ctx,
            &net_params.monitor_endpoint,
            &channels.monitor,
            move |msg: MonitorMessage| st.on_monitor(msg),
        )?);

        for sub in subscribers.iter() {
            info!("Subscribed to {}", sub.topic());
        }

        Ok(Self { subscribers })
    }

    pub fn num_subscribers(&self) -> usize {
        self.subscribers.len()
    }
}
