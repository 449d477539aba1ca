//! # Network Module
//!
//! This module provides networking abstractions over ZMQ, the networking library chosen for the 
//! software.
//!
//! Every channel is a PUB/SUB pair carrying single-frame messages of the form `"<topic> <json>"`.
//! Subscribers run in a background thread and hand each decoded message to a callback.
//! Subscriber sockets are conflated by default, so only the latest message on a channel is ever
//! queued.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, trace, warn};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    sync::{atomic::{AtomicBool, Ordering}, Arc},
    thread,
};
use zmq::{Context, Socket, SocketType};

// Export zmq
pub use zmq;

// ------------------------------------------------------------------------------------------------
// MACROS
// ------------------------------------------------------------------------------------------------

macro_rules! set_sockopts {
    ($socket:expr, $(($opt:ident, $val:expr)),+) => {
        $(
            $socket.$opt($val)
                .map_err(|e| NetError::SocketOptionError(stringify!($opt).into(), e))?;
        )+
    };
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Endpoints of every channel used by the control stage.
#[derive(Deserialize, Debug, Clone)]
pub struct NetParams {
    /// Chassis feedback (input)
    pub chassis_endpoint: String,

    /// Localization estimate (input)
    pub localization_endpoint: String,

    /// Planned trajectory (input)
    pub planning_endpoint: String,

    /// Operator pad (input)
    pub pad_endpoint: String,

    /// Monitor alerts (input)
    pub monitor_endpoint: String,

    /// Control command (output), the control stage binds this endpoint
    pub control_endpoint: String,
}

/// Represents options which can be set on a socket.
///
/// Most options here correspond to those found in the 
/// [`zmq_setsockopt`](http://api.zeromq.org/4-2:zmq-setsockopt) documentation.
#[derive(Debug, Clone)]
pub struct SocketOptions {

    /// Indicates if the socket should bind itself to the endpoint. Publishers should have this
    /// value set as `true`, subscribers should have it set as `false`.
    ///
    /// The default value is `false`.
    pub bind: bool,

    /// `ZMQ_CONFLATE`: Keep only last message
    pub conflate: bool,

    /// `ZMQ_LINGER`: Set linger period for socket shutdown
    pub linger: i32,

    /// `ZMQ_RECONNECT_IVL`: Set reconnection interval
    pub reconnect_ivl: i32,

    /// `ZMQ_RECONNECT_IVL_MAX`: Set maximum reconnection interval
    pub reconnect_ivl_max: i32,

    /// `ZMQ_CONNECT_TIMEOUT`: Set `connect()` timeout
    pub connect_timeout: i32,

    /// `ZMQ_RCVTIMEO`: Maximum time before a recv operation returns with `EAGAIN`
    pub recv_timeout: i32,

    /// `ZMQ_SNDTIMEO`: Maximum time before a send operation returns with `EAGAIN`
    pub send_timeout: i32,

    /// `ZMQ_HEARTBEAT_IVL`: Set interval between sending ZMTP heartbeats
    pub heartbeat_ivl: i32,

    /// `ZMQ_HEARTBEAT_TIMEOUT`: Set timeout for ZMTP heartbeats
    pub heartbeat_timeout: i32,

    /// `ZMQ_HEARTBEAT_TTL`: Set the TTL (time to live) value for ZMTP heartbeats
    pub heartbeat_ttl: i32
}

/// Publishes messages on a single topic.
pub struct Publisher {
    socket: Socket,

    topic: String,
}

/// Receives messages on a single topic in a background thread.
///
/// The thread is stopped and joined when the subscriber is dropped.
pub struct Subscriber {
    topic: String,

    join_handle: Option<thread::JoinHandle<()>>,

    shutdown: Arc<AtomicBool>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum NetError {
    #[error("Error creating the socket: {0}")]
    CreateSocketError(zmq::Error),

    #[error("Could not connect the socket to {0}: {1}")]
    CouldNotConnect(String, zmq::Error),

    #[error("Could not set the {0} socket option: {1}")]
    SocketOptionError(String, zmq::Error),

    #[error("Could not send the message: {0}")]
    SendError(zmq::Error),

    #[error("Could not serialize the message: {0}")]
    SerializationError(serde_json::Error),

    #[error("Could not spawn the subscriber thread: {0}")]
    SpawnError(std::io::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Publisher {
    /// Create a new publisher bound to the given endpoint.
    ///
    /// Sends never block, if no subscriber is connected the message is dropped.
    pub fn new(ctx: &Context, endpoint: &str, topic: &str) -> Result<Self, NetError> {
        let socket_options = SocketOptions {
            bind: true,
            linger: 1,
            send_timeout: 0,
            ..Default::default()
        };

        let socket = create_socket(ctx, zmq::PUB, &socket_options, endpoint)?;

        Ok(Self {
            socket,
            topic: topic.into()
        })
    }

    /// Serialize and publish a message.
    pub fn publish<T: Serialize>(&self, msg: &T) -> Result<(), NetError> {
        let json = serde_json::to_string(msg)
            .map_err(NetError::SerializationError)?;

        self.socket
            .send(encode_frame(&self.topic, &json).as_bytes(), zmq::DONTWAIT)
            .map_err(NetError::SendError)
    }
}

impl Subscriber {
    /// Connect to the given endpoint and spawn a thread which calls `handler` with every message
    /// received on `topic`.
    ///
    /// Messages which cannot be deserialized are logged and dropped.
    pub fn spawn<T, F>(
        ctx: &Context,
        endpoint: &str,
        topic: &str,
        mut handler: F
    ) -> Result<Self, NetError>
    where
        T: DeserializeOwned + 'static,
        F: FnMut(T) + Send + 'static
    {
        let socket_options = SocketOptions {
            conflate: true,
            linger: 1,
            recv_timeout: 100,
            ..Default::default()
        };

        let socket = create_socket(ctx, zmq::SUB, &socket_options, endpoint)?;
        socket.set_subscribe(topic.as_bytes())
            .map_err(|e| NetError::SocketOptionError("set_subscribe".into(), e))?;

        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();
        let topic_clone = String::from(topic);

        let join_handle = thread::Builder::new()
            .name(format!("sub_{}", topic))
            .spawn(move || {
                while !shutdown_clone.load(Ordering::Relaxed) {
                    if let Some(msg) = recv_message::<T>(&socket, &topic_clone) {
                        handler(msg);
                    }
                }
                debug!("Subscriber for {} stopped", topic_clone);
            })
            .map_err(NetError::SpawnError)?;

        Ok(Self {
            topic: topic.into(),
            join_handle: Some(join_handle),
            shutdown
        })
    }

    /// The topic this subscriber listens on.
    pub fn topic(&self) -> &str {
        &self.topic
    }
}

impl Drop for Subscriber {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);

        // The receive timeout bounds how long this takes
        if let Some(jh) = self.join_handle.take() {
            if jh.join().is_err() {
                warn!("Subscriber thread for {} panicked", self.topic);
            }
        }
    }
}

impl SocketOptions {
    /// Set these options on the given socket.
    pub fn set(&self, socket: &Socket) -> Result<(), NetError> {

        // Set all the socket options, we use a macro here to make the error handling nice and
        // easy
        set_sockopts!(
            socket,
            (set_connect_timeout, self.connect_timeout),
            (set_heartbeat_ivl, self.heartbeat_ivl),
            (set_heartbeat_timeout, self.heartbeat_timeout),
            (set_heartbeat_ttl, self.heartbeat_ttl),
            (set_linger, self.linger),
            (set_reconnect_ivl, self.reconnect_ivl),
            (set_reconnect_ivl_max, self.reconnect_ivl_max),
            (set_rcvtimeo, self.recv_timeout),
            (set_sndtimeo, self.send_timeout)
        );

        // Conflation only makes sense on the receiving side
        if let Ok(SocketType::SUB) = socket.get_socket_type() {
            set_sockopts!(socket, (set_conflate, self.conflate));
        }

        Ok(())
    }
}

impl Default for SocketOptions {
    fn default() -> Self {
        // Defaults for sockopts taken from http://api.zeromq.org/4-2:zmq-setsockopt
        Self {
            bind: false,
            conflate: false,
            connect_timeout: 0,
            heartbeat_ivl: 0,
            heartbeat_timeout: 0,
            heartbeat_ttl: 0,
            linger: 30_000,
            reconnect_ivl: 100,
            reconnect_ivl_max: 0,
            recv_timeout: -1,
            send_timeout: -1
        }
    }
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Create a socket, set its options and connect or bind it to the endpoint.
pub fn create_socket(
    ctx: &Context,
    socket_type: SocketType,
    socket_options: &SocketOptions,
    endpoint: &str
) -> Result<Socket, NetError> {
    let socket = ctx.socket(socket_type)
        .map_err(NetError::CreateSocketError)?;

    socket_options.set(&socket)?;

    match socket_options.bind {
        false => socket.connect(endpoint),
        true => socket.bind(endpoint)
    }.map_err(|e| NetError::CouldNotConnect(endpoint.into(), e))?;

    Ok(socket)
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Build a wire frame from a topic and a JSON body.
fn encode_frame(topic: &str, json: &str) -> String {
    format!("{} {}", topic, json)
}

/// Extract the JSON body from a frame, or `None` if the frame is not on the given topic.
fn decode_frame<'a>(topic: &str, frame: &'a str) -> Option<&'a str> {
    frame.strip_prefix(topic)?.strip_prefix(' ')
}

/// Receive and decode a single message, returning `None` on timeout or on any error.
fn recv_message<T: DeserializeOwned>(socket: &Socket, topic: &str) -> Option<T> {
    let frame = match socket.recv_string(0) {
        Ok(Ok(s)) => s,
        Ok(Err(_)) => {
            warn!("Received a non UTF-8 message on {}", topic);
            return None
        },
        Err(zmq::Error::EAGAIN) => return None,
        Err(e) => {
            warn!("Could not receive on {}: {}", topic, e);
            return None
        }
    };

    let body = match decode_frame(topic, &frame) {
        Some(b) => b,
        None => {
            trace!("Ignoring message for another topic on {}", topic);
            return None
        }
    };

    match serde_json::from_str(body) {
        Ok(m) => Some(m),
        Err(e) => {
            warn!("Could not deserialize message on {}: {}", topic, e);
            None
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_frame_topics() {
        let frame = encode_frame("control", r#"{"speed":1.0}"#);
        assert_eq!(decode_frame("control", &frame), Some(r#"{"speed":1.0}"#));

        // ZMQ subscriptions are prefix matches, the frame decoder must be exact
        let frame = encode_frame("control_debug", "{}");
        assert_eq!(decode_frame("control", &frame), None);
    }
}
