//! UDP JSON transport glue.
//!
//! Thin stand-in for a real pub/sub layer: one datagram per message,
//! a JSON envelope carrying the topic name and payload. Everything
//! behind the [`InboundMsg`] bus and the [`VelocitySink`] trait is
//! transport-agnostic; only this module knows about sockets.

use std::net::UdpSocket;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::NodeConfig;
use crate::error::{NavError, Result};
use crate::interface::VelocitySink;
use crate::node::InboundMsg;
use crate::pose::{Point2D, Pose3D, Twist2D};
use crate::tf::TransformCache;

/// Receive buffer size (64KB)
const RECV_BUFFER_SIZE: usize = 65536;

/// Datagram envelope: topic name plus topic-specific payload.
#[derive(Debug, Serialize, Deserialize)]
struct WireMsg {
    topic: String,
    data: serde_json::Value,
}

/// Goal pose payload.
#[derive(Debug, Serialize, Deserialize)]
pub struct GoalMsg {
    pub frame_id: String,
    pub pose: Pose3D,
}

/// Local obstacle point-set payload; replaces the previous set entirely.
#[derive(Debug, Serialize, Deserialize)]
pub struct ObstaclesMsg {
    pub points: Vec<Point2D>,
}

/// Robot footprint payload.
#[derive(Debug, Serialize, Deserialize)]
pub struct ShapeMsg {
    pub vertices: Vec<Point2D>,
}

/// Velocity command payload.
#[derive(Debug, Serialize, Deserialize)]
pub struct CmdVelMsg {
    pub linear: f64,
    pub angular: f64,
}

/// Frame-transform payload: places `source_frame` in `target_frame`
/// coordinates.
#[derive(Debug, Serialize, Deserialize)]
pub struct TfMsg {
    pub target_frame: String,
    pub source_frame: String,
    pub pose: Pose3D,
}

/// Spawn the UDP subscriber thread feeding the inbound bus.
///
/// Malformed datagrams and unknown topics are logged and dropped; a bad
/// sample must never take the node down.
pub fn spawn_subscriber(
    config: &NodeConfig,
    tx: Sender<InboundMsg>,
    tf_cache: Arc<TransformCache>,
    shutdown: Arc<AtomicBool>,
) -> Result<JoinHandle<()>> {
    let socket = UdpSocket::bind(&config.transport.listen_address).map_err(|e| {
        NavError::Config(format!(
            "Failed to bind inbound socket {}: {}",
            config.transport.listen_address, e
        ))
    })?;
    // Short timeout so the thread notices shutdown promptly.
    socket.set_read_timeout(Some(Duration::from_millis(100)))?;
    info!(
        address = %config.transport.listen_address,
        "inbound transport listening"
    );

    let topic_goal = config.topics.goal.clone();
    let topic_obstacles = config.topics.obstacles.clone();
    let topic_shape = config.topics.robot_shape.clone();
    let topic_tf = config.topics.tf.clone();

    let handle = thread::Builder::new()
        .name("udp-sub".into())
        .spawn(move || {
            let mut buffer = vec![0u8; RECV_BUFFER_SIZE];
            while !shutdown.load(Ordering::Acquire) {
                let len = match socket.recv(&mut buffer) {
                    Ok(len) => len,
                    Err(e)
                        if e.kind() == std::io::ErrorKind::WouldBlock
                            || e.kind() == std::io::ErrorKind::TimedOut =>
                    {
                        continue;
                    }
                    Err(e) => {
                        warn!("inbound receive error: {}", e);
                        continue;
                    }
                };

                let wire: WireMsg = match serde_json::from_slice(&buffer[..len]) {
                    Ok(wire) => wire,
                    Err(e) => {
                        warn!("dropping malformed datagram: {}", e);
                        continue;
                    }
                };

                // Transforms feed the cache directly; they never cross
                // the dispatch bus.
                if wire.topic == topic_tf {
                    match serde_json::from_value::<TfMsg>(wire.data) {
                        Ok(tf) => {
                            tf_cache.update(&tf.target_frame, &tf.source_frame, tf.pose)
                        }
                        Err(e) => warn!("dropping malformed transform: {}", e),
                    }
                    continue;
                }

                let msg = match decode(wire, &topic_goal, &topic_obstacles, &topic_shape) {
                    Ok(Some(msg)) => msg,
                    Ok(None) => continue,
                    Err(e) => {
                        warn!("dropping malformed datagram: {}", e);
                        continue;
                    }
                };

                if tx.send(msg).is_err() {
                    info!("inbound bus closed, subscriber exiting");
                    break;
                }
            }
        })
        .map_err(NavError::Io)?;

    Ok(handle)
}

fn decode(
    wire: WireMsg,
    topic_goal: &str,
    topic_obstacles: &str,
    topic_shape: &str,
) -> serde_json::Result<Option<InboundMsg>> {
    let msg = if wire.topic == topic_goal {
        let goal: GoalMsg = serde_json::from_value(wire.data)?;
        Some(InboundMsg::Goal {
            frame_id: goal.frame_id,
            pose: goal.pose,
        })
    } else if wire.topic == topic_obstacles {
        let obs: ObstaclesMsg = serde_json::from_value(wire.data)?;
        Some(InboundMsg::Obstacles(obs.points))
    } else if !topic_shape.is_empty() && wire.topic == topic_shape {
        let shape: ShapeMsg = serde_json::from_value(wire.data)?;
        Some(InboundMsg::Shape(shape.vertices))
    } else {
        warn!(topic = %wire.topic, "ignoring message on unknown topic");
        None
    };
    Ok(msg)
}

/// Publishes velocity commands as UDP JSON datagrams.
pub struct UdpVelocitySink {
    socket: UdpSocket,
    peer: String,
    topic: String,
}

impl UdpVelocitySink {
    pub fn new(peer: impl Into<String>, topic: impl Into<String>) -> Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        Ok(Self {
            socket,
            peer: peer.into(),
            topic: topic.into(),
        })
    }
}

impl VelocitySink for UdpVelocitySink {
    fn publish(&self, cmd: Twist2D) {
        let payload = serde_json::to_value(CmdVelMsg {
            linear: cmd.linear,
            angular: cmd.angular,
        })
        .and_then(|data| {
            serde_json::to_vec(&WireMsg {
                topic: self.topic.clone(),
                data,
            })
        });
        // Fire and forget: there is no actuator-level failure reporting.
        match payload {
            Ok(payload) => {
                if let Err(e) = self.socket.send_to(&payload, &self.peer) {
                    warn!("failed to publish velocity command: {}", e);
                }
            }
            Err(e) => warn!("failed to encode velocity command: {}", e),
        }
    }
}
