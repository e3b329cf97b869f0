//! Node wiring: construction, inbound dispatch, and thread lifecycle.
//!
//! Everything between the transport boundary and the control loop lives
//! here: the fail-fast engine configuration at startup, the bounded
//! wait for an initial robot shape, the thread that routes inbound
//! messages to their staging components, and the thread that drives the
//! loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError};
use tracing::{error, info, warn};

use crate::config::NodeConfig;
use crate::engine::ReactiveEngine;
use crate::error::{NavError, Result};
use crate::footprint::FootprintPolygon;
use crate::interface::{EventListener, NodeInterface, VelocitySink};
use crate::nav_loop::NavigationLoop;
use crate::obstacles::ObstacleBuffer;
use crate::pose::{Point2D, Pose3D};
use crate::tf::{FrameTransform, PoseSource};

/// Messages arriving from the inbound channels. Each channel delivers
/// asynchronously and independently of the others.
#[derive(Debug, Clone)]
pub enum InboundMsg {
    /// Goal pose in an arbitrary frame
    Goal { frame_id: String, pose: Pose3D },
    /// Full replacement local obstacle point set, robot frame
    Obstacles(Vec<Point2D>),
    /// Robot footprint vertices
    Shape(Vec<Point2D>),
}

/// The assembled navigation node.
pub struct NavNode<E: ReactiveEngine + 'static> {
    nav: Arc<NavigationLoop<E>>,
    obstacles: Arc<ObstacleBuffer>,
    config: NodeConfig,
}

/// Handles to the node's worker threads.
pub struct NodeHandles {
    nav_loop: JoinHandle<()>,
    dispatch: JoinHandle<()>,
    shutdown: Arc<AtomicBool>,
}

impl NodeHandles {
    /// Signal both threads to stop.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
    }

    /// Signal shutdown and wait for both threads.
    pub fn join(self) {
        self.shutdown();
        if self.nav_loop.join().is_err() {
            error!("navigation loop thread panicked");
        }
        if self.dispatch.join().is_err() {
            error!("dispatch thread panicked");
        }
    }
}

impl<E: ReactiveEngine + 'static> NavNode<E> {
    /// Build the node. Fails fast if the mandatory engine configuration
    /// is missing, unreadable, or rejected by the engine — the node must
    /// never come up half-configured.
    pub fn new(
        config: NodeConfig,
        mut engine: E,
        tf: Arc<dyn FrameTransform>,
        sink: Box<dyn VelocitySink>,
        listeners: Vec<EventListener>,
    ) -> Result<Self> {
        config.validate()?;

        let engine_cfg_src = std::fs::read_to_string(&config.engine.cfg_file).map_err(|e| {
            NavError::Config(format!(
                "Failed to read engine config '{}': {}",
                config.engine.cfg_file, e
            ))
        })?;
        let engine_cfg: toml::Value = engine_cfg_src
            .parse()
            .map_err(|e: toml::de::Error| NavError::Config(e.to_string()))?;
        engine.configure(&engine_cfg)?;
        engine.enable_log(config.engine.save_nav_log);

        let obstacles = Arc::new(ObstacleBuffer::new());
        let pose_source = PoseSource::new(
            tf,
            config.frames.reference.clone(),
            config.frames.robot.clone(),
        );
        let mut io = NodeInterface::new(pose_source, Arc::clone(&obstacles), sink);
        for listener in listeners {
            io.add_listener(listener);
        }

        let nav = Arc::new(NavigationLoop::new(
            engine,
            io,
            FootprintPolygon::default(),
            config.nav.target_allowed_distance,
            Duration::from_secs_f64(config.nav.nav_period_secs),
        ));

        Ok(Self {
            nav,
            obstacles,
            config,
        })
    }

    /// The control loop, for issuing goals programmatically.
    pub fn nav(&self) -> &Arc<NavigationLoop<E>> {
        &self.nav
    }

    /// The obstacle staging buffer.
    pub fn obstacles(&self) -> &Arc<ObstacleBuffer> {
        &self.obstacles
    }

    /// Route one inbound message to its staging component.
    pub fn dispatch(&self, msg: InboundMsg) {
        match msg {
            InboundMsg::Goal { frame_id, pose } => self.nav.on_goal(&frame_id, pose),
            InboundMsg::Obstacles(points) => self.obstacles.set_latest(points),
            InboundMsg::Shape(vertices) => {
                if let Err(e) = self.nav.set_robot_shape(vertices) {
                    warn!("rejected shape update, keeping previous shape: {}", e);
                }
            }
        }
    }

    /// Wait a bounded grace period for an initial robot shape.
    ///
    /// Other inbound messages arriving meanwhile are dispatched normally.
    /// Returns whether a shape arrived; on timeout the loop proceeds with
    /// the default footprint — never blocks indefinitely.
    pub fn wait_for_initial_shape(&self, rx: &Receiver<InboundMsg>, grace: Duration) -> bool {
        info!(
            topic = %self.config.topics.robot_shape,
            grace_secs = grace.as_secs_f64(),
            "waiting for initial robot shape"
        );
        let deadline = Instant::now() + grace;
        loop {
            let remaining = match deadline.checked_duration_since(Instant::now()) {
                Some(d) if !d.is_zero() => d,
                _ => {
                    warn!("no robot shape received in time, using default footprint");
                    return false;
                }
            };
            match rx.recv_timeout(remaining) {
                Ok(msg) => {
                    let got_shape = matches!(msg, InboundMsg::Shape(_));
                    self.dispatch(msg);
                    if got_shape {
                        info!("initial robot shape received");
                        return true;
                    }
                }
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                    warn!("no robot shape received in time, using default footprint");
                    return false;
                }
            }
        }
    }

    /// Spawn the loop and dispatch threads, consuming the node.
    ///
    /// When a shape channel is configured, first waits the configured
    /// grace period for an initial footprint.
    pub fn spawn(self, rx: Receiver<InboundMsg>) -> Result<NodeHandles> {
        if self.config.shape_topic_enabled() {
            let grace = Duration::from_secs_f64(self.config.nav.shape_wait_secs);
            self.wait_for_initial_shape(&rx, grace);
        }

        let shutdown = Arc::new(AtomicBool::new(false));

        let nav = Arc::clone(&self.nav);
        let loop_shutdown = Arc::clone(&shutdown);
        let nav_loop = thread::Builder::new()
            .name("nav-loop".into())
            .spawn(move || nav.run(&loop_shutdown))
            .map_err(NavError::Io)?;

        let dispatch_shutdown = Arc::clone(&shutdown);
        let node = self;
        let dispatch = thread::Builder::new()
            .name("dispatch".into())
            .spawn(move || {
                while !dispatch_shutdown.load(Ordering::Acquire) {
                    match rx.recv_timeout(Duration::from_millis(100)) {
                        Ok(msg) => node.dispatch(msg),
                        Err(RecvTimeoutError::Timeout) => {}
                        Err(RecvTimeoutError::Disconnected) => {
                            info!("inbound channel closed, dispatch thread exiting");
                            break;
                        }
                    }
                }
            })
            .map_err(NavError::Io)?;

        Ok(NodeHandles {
            nav_loop,
            dispatch,
            shutdown,
        })
    }
}
