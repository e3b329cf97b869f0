//! The capability set the engine requires of its host, and the concrete
//! adapter implementing it.
//!
//! `NodeInterface` is the single point where the engine touches the
//! outside world: it pulls pose and obstacles from the staging
//! components and pushes velocity commands to the actuation sink,
//! without the engine ever seeing the transport layer.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::error::TransformError;
use crate::obstacles::ObstacleBuffer;
use crate::pose::{Point2D, Pose2D, Twist2D};
use crate::tf::PoseSource;

/// Navigation lifecycle events emitted by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavEvent {
    /// Navigation toward a goal has started
    Started,
    /// The goal was reached
    Ended,
    /// Navigation aborted on an engine-level error
    EndedWithError,
    /// The engine found no admissible motion
    WayBlocked,
}

/// Observer for lifecycle events. Registered on the adapter; none are
/// registered by default.
pub type EventListener = Box<dyn Fn(NavEvent) + Send + Sync>;

/// Outbound velocity-command channel boundary.
pub trait VelocitySink: Send + Sync {
    fn publish(&self, cmd: Twist2D);
}

/// What the engine may ask of its host during a navigation step.
pub trait RobotInterface: Send + Sync {
    /// Current robot pose in the reference frame plus current speeds.
    ///
    /// An `Err` means "no safe decision this cycle": the engine must not
    /// command motion based on a missing pose.
    fn current_pose_and_speeds(&self) -> Result<(Pose2D, Twist2D), TransformError>;

    /// Command instantaneous robot speeds.
    fn change_speeds(&self, cmd: Twist2D);

    /// The current set of obstacle points. An empty set is valid input.
    fn sense_obstacles(&self) -> Vec<Point2D>;

    /// Start the platform watchdog, if any.
    fn start_watchdog(&self, period: Duration);

    /// Stop the platform watchdog.
    fn stop_watchdog(&self);

    /// Report a lifecycle event.
    fn notify(&self, event: NavEvent);
}

/// Concrete [`RobotInterface`] wired to the staging components.
pub struct NodeInterface {
    pose_source: PoseSource,
    obstacles: Arc<ObstacleBuffer>,
    sink: Box<dyn VelocitySink>,
    listeners: Vec<EventListener>,
}

impl NodeInterface {
    pub fn new(
        pose_source: PoseSource,
        obstacles: Arc<ObstacleBuffer>,
        sink: Box<dyn VelocitySink>,
    ) -> Self {
        Self {
            pose_source,
            obstacles,
            sink,
            listeners: Vec::new(),
        }
    }

    /// Register a lifecycle-event observer. Call before the loop starts.
    pub fn add_listener(&mut self, listener: EventListener) {
        self.listeners.push(listener);
    }

    /// The pose source, for goal-frame reconciliation.
    pub fn pose_source(&self) -> &PoseSource {
        &self.pose_source
    }
}

impl RobotInterface for NodeInterface {
    fn current_pose_and_speeds(&self) -> Result<(Pose2D, Twist2D), TransformError> {
        self.pose_source.try_pose()
    }

    fn change_speeds(&self, cmd: Twist2D) {
        debug!(
            linear = cmd.linear,
            angular = cmd.angular,
            "commanding speeds"
        );
        // Fire and forget: the sink has no actuator-level failure
        // reporting in the base design.
        self.sink.publish(cmd);
    }

    fn sense_obstacles(&self) -> Vec<Point2D> {
        self.obstacles.snapshot()
    }

    fn start_watchdog(&self, _period: Duration) {
        // No platform watchdog wired in the base design.
    }

    fn stop_watchdog(&self) {}

    fn notify(&self, event: NavEvent) {
        debug!(?event, "navigation event");
        for listener in &self.listeners {
            listener(event);
        }
    }
}
