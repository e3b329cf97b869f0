//! Reactive navigation engine boundary.
//!
//! The algorithm that turns pose + obstacles + footprint into velocity
//! decisions is an external collaborator; the bridge only drives it
//! through this trait and never reaches around it. All calls into an
//! engine are serialized by the engine-domain lock in
//! [`crate::nav_loop::NavigationLoop`].

mod pursuit;

pub use pursuit::PursuitEngine;

use crate::error::Result;
use crate::footprint::FootprintPolygon;
use crate::interface::RobotInterface;
use crate::pose::Pose2D;

/// Goal parameters handed to the engine. Transient: constructed per goal
/// request, consumed immediately, not retained by the bridge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NavigationParams {
    /// Target pose in the reference frame
    pub target: Pose2D,
    /// Allowed arrival distance in meters
    pub target_allowed_distance: f64,
    /// Whether the target is relative to the current robot pose
    pub target_is_relative: bool,
}

/// The engine's required host-facing surface.
///
/// During `initialize` and `navigation_step` the engine pulls pose and
/// obstacles and pushes velocity commands through the supplied
/// [`RobotInterface`]; it never sees the transport behind it.
pub trait ReactiveEngine: Send {
    /// Load the engine's own configuration. Called once at startup,
    /// before `initialize`.
    fn configure(&mut self, cfg: &toml::Value) -> Result<()>;

    /// One-time engine initialization with the starting footprint.
    /// Called on the first loop tick, before any step.
    fn initialize(&mut self, shape: &FootprintPolygon, io: &dyn RobotInterface) -> Result<()>;

    /// Issue a navigation goal. May arrive before `initialize`; whether
    /// to queue or reject it then is the engine's own contract.
    fn navigate(&mut self, params: &NavigationParams);

    /// One decision cycle: produces at most one velocity command via
    /// `io`. Errors are contained by the caller as "no command this
    /// cycle".
    fn navigation_step(&mut self, io: &dyn RobotInterface) -> Result<()>;

    /// Swap the robot footprint used for clearance computation.
    fn change_robot_shape(&mut self, shape: &FootprintPolygon);

    /// Toggle the engine's own navigation log output.
    fn enable_log(&mut self, enabled: bool) {
        let _ = enabled;
    }
}
