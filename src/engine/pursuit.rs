//! Minimal concrete engine: proportional goal pursuit with a clearance
//! stop.
//!
//! A stand-in at the engine boundary so the shipped binary runs
//! end-to-end. It is not a reactive path planner: no trajectory
//! candidates, no obstacle-distance scoring, just head-toward-goal with
//! a hard stop when an obstacle intrudes within the footprint clearance.

use tracing::{info, warn};

use crate::error::Result;
use crate::footprint::FootprintPolygon;
use crate::interface::{NavEvent, RobotInterface};
use crate::pose::{Pose2D, Twist2D};
use crate::utils::normalize_angle;

use super::{NavigationParams, ReactiveEngine};

/// Heading error beyond which the robot rotates in place.
const TURN_IN_PLACE_THRESHOLD: f64 = 1.0;

/// Proportional pursuit engine.
pub struct PursuitEngine {
    linear_gain: f64,
    angular_gain: f64,
    max_linear_vel: f64,
    max_angular_vel: f64,
    /// Extra clearance beyond the footprint bounding radius, meters
    safety_margin: f64,
    clearance_radius: f64,
    goal: Option<ActiveGoal>,
    log_enabled: bool,
}

struct ActiveGoal {
    params: NavigationParams,
    /// Absolute target; resolved lazily for relative goals since that
    /// needs a pose sample.
    resolved: Option<Pose2D>,
    started_notified: bool,
}

impl PursuitEngine {
    pub fn new() -> Self {
        Self {
            linear_gain: 0.5,
            angular_gain: 1.0,
            max_linear_vel: 0.3,
            max_angular_vel: 1.0,
            safety_margin: 0.05,
            clearance_radius: FootprintPolygon::default().bounding_radius() + 0.05,
            goal: None,
            log_enabled: false,
        }
    }

    fn read_f64(cfg: &toml::Value, key: &str, default: f64) -> f64 {
        cfg.get(key).and_then(|v| v.as_float()).unwrap_or(default)
    }
}

impl Default for PursuitEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ReactiveEngine for PursuitEngine {
    fn configure(&mut self, cfg: &toml::Value) -> Result<()> {
        self.linear_gain = Self::read_f64(cfg, "linear_gain", self.linear_gain);
        self.angular_gain = Self::read_f64(cfg, "angular_gain", self.angular_gain);
        self.max_linear_vel = Self::read_f64(cfg, "max_linear_vel", self.max_linear_vel);
        self.max_angular_vel = Self::read_f64(cfg, "max_angular_vel", self.max_angular_vel);
        self.safety_margin = Self::read_f64(cfg, "safety_margin", self.safety_margin);
        info!(
            linear_gain = self.linear_gain,
            angular_gain = self.angular_gain,
            max_linear_vel = self.max_linear_vel,
            max_angular_vel = self.max_angular_vel,
            safety_margin = self.safety_margin,
            "pursuit engine configured"
        );
        Ok(())
    }

    fn initialize(&mut self, shape: &FootprintPolygon, _io: &dyn RobotInterface) -> Result<()> {
        self.clearance_radius = shape.bounding_radius() + self.safety_margin;
        info!(
            clearance_radius = self.clearance_radius,
            "pursuit engine initialized"
        );
        Ok(())
    }

    fn navigate(&mut self, params: &NavigationParams) {
        // A goal issued before initialize is simply queued: it becomes
        // active on the first step that sees it.
        self.goal = Some(ActiveGoal {
            params: *params,
            resolved: if params.target_is_relative {
                None
            } else {
                Some(params.target)
            },
            started_notified: false,
        });
    }

    fn navigation_step(&mut self, io: &dyn RobotInterface) -> Result<()> {
        let goal = match self.goal.as_mut() {
            Some(g) => g,
            None => return Ok(()), // idle: no goal, no command
        };

        let (pose, _speeds) = io.current_pose_and_speeds()?;

        let target = *goal.resolved.get_or_insert_with(|| {
            // Relative targets are anchored to the pose at first sight.
            pose.compose(&goal.params.target)
        });

        if !goal.started_notified {
            goal.started_notified = true;
            io.notify(NavEvent::Started);
        }

        let dx = target.x - pose.x;
        let dy = target.y - pose.y;
        let distance = (dx * dx + dy * dy).sqrt();

        if distance <= goal.params.target_allowed_distance {
            info!(distance, "goal reached");
            io.change_speeds(Twist2D::zero());
            io.notify(NavEvent::Ended);
            self.goal = None;
            return Ok(());
        }

        // Obstacle points are in the robot frame; anything inside the
        // clearance radius ahead of the robot blocks forward motion.
        let obstacles = io.sense_obstacles();
        let blocked = obstacles
            .iter()
            .any(|p| p.x > 0.0 && p.x * p.x + p.y * p.y < self.clearance_radius * self.clearance_radius);
        if blocked {
            warn!("obstacle within clearance radius, stopping");
            io.change_speeds(Twist2D::zero());
            io.notify(NavEvent::WayBlocked);
            return Ok(());
        }

        let heading_error = normalize_angle(dy.atan2(dx) - pose.theta);
        let angular = (self.angular_gain * heading_error)
            .clamp(-self.max_angular_vel, self.max_angular_vel);
        let linear = if heading_error.abs() > TURN_IN_PLACE_THRESHOLD {
            0.0
        } else {
            (self.linear_gain * distance).min(self.max_linear_vel)
        };

        if self.log_enabled {
            info!(linear, angular, distance, heading_error, "pursuit step");
        }
        io.change_speeds(Twist2D::new(linear, angular));
        Ok(())
    }

    fn change_robot_shape(&mut self, shape: &FootprintPolygon) {
        self.clearance_radius = shape.bounding_radius() + self.safety_margin;
        info!(
            clearance_radius = self.clearance_radius,
            "footprint changed"
        );
    }

    fn enable_log(&mut self, enabled: bool) {
        self.log_enabled = enabled;
    }
}
