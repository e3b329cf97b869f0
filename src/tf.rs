//! Frame-transform lookup boundary and the pose source built on it.

use std::sync::Arc;

use tracing::debug;

use crate::error::TransformError;
use crate::pose::{Pose2D, Pose3D, Twist2D};

/// External coordinate-transform lookup service.
///
/// `lookup` returns the most recent known transform placing
/// `source_frame` in `target_frame` coordinates. The service may be
/// slow, behind on data, or unaware of a frame entirely; every caller
/// handles the error explicitly instead of treating it as exceptional.
pub trait FrameTransform: Send + Sync {
    fn lookup(&self, target_frame: &str, source_frame: &str) -> Result<Pose3D, TransformError>;
}

/// Supplies the engine with the robot's planar pose.
///
/// Wraps the transform service and fixes the two frame names the bridge
/// cares about: the world/map reference frame and the robot body frame.
pub struct PoseSource {
    tf: Arc<dyn FrameTransform>,
    frame_reference: String,
    frame_robot: String,
}

impl PoseSource {
    pub fn new(
        tf: Arc<dyn FrameTransform>,
        frame_reference: impl Into<String>,
        frame_robot: impl Into<String>,
    ) -> Self {
        Self {
            tf,
            frame_reference: frame_reference.into(),
            frame_robot: frame_robot.into(),
        }
    }

    /// Latest robot pose in the reference frame, projected to 2D.
    ///
    /// On lookup failure the error is returned and the caller must treat
    /// it as "skip this step, do not command motion"; the next tick
    /// retries from scratch.
    ///
    /// The reported speeds are always zero: the base design has no
    /// independent velocity estimate (no odometry feed). Known gap, not
    /// an error — do not paper over it here.
    pub fn try_pose(&self) -> Result<(Pose2D, Twist2D), TransformError> {
        let tx = self.tf.lookup(&self.frame_reference, &self.frame_robot)?;
        let pose = Pose2D::from(tx);
        debug!(x = pose.x, y = pose.y, theta = pose.theta, "latest robot pose");
        Ok((pose, Twist2D::zero()))
    }

    /// The reference frame this source resolves into.
    pub fn frame_reference(&self) -> &str {
        &self.frame_reference
    }

    /// Transform a pose given in `source_frame` into the reference frame.
    ///
    /// Used for goal reconciliation; composition of the looked-up frame
    /// transform with the planar pose.
    pub fn to_reference_frame(
        &self,
        source_frame: &str,
        pose: Pose2D,
    ) -> Result<Pose2D, TransformError> {
        let tx = self.tf.lookup(&self.frame_reference, source_frame)?;
        Ok(Pose2D::from(tx).compose(&pose))
    }
}

/// Transform store fed by an inbound transform channel.
///
/// Keeps only the most recent transform per (target, source) pair,
/// matching the "latest known transform" lookup contract. Same-frame
/// lookups resolve to identity without needing data.
#[derive(Debug, Default)]
pub struct TransformCache {
    transforms: parking_lot::Mutex<std::collections::HashMap<(String, String), Pose3D>>,
}

impl TransformCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the latest transform placing `source_frame` in
    /// `target_frame` coordinates.
    pub fn update(&self, target_frame: &str, source_frame: &str, pose: Pose3D) {
        self.transforms
            .lock()
            .insert((target_frame.to_string(), source_frame.to_string()), pose);
    }
}

impl FrameTransform for TransformCache {
    fn lookup(&self, target_frame: &str, source_frame: &str) -> Result<Pose3D, TransformError> {
        if target_frame == source_frame {
            return Ok(Pose3D::default());
        }
        self.transforms
            .lock()
            .get(&(target_frame.to_string(), source_frame.to_string()))
            .copied()
            .ok_or_else(|| TransformError::new(target_frame, source_frame, "no data yet"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    struct FixedTf(Pose3D);

    impl FrameTransform for FixedTf {
        fn lookup(&self, _t: &str, _s: &str) -> Result<Pose3D, TransformError> {
            Ok(self.0)
        }
    }

    struct FailingTf;

    impl FrameTransform for FailingTf {
        fn lookup(&self, t: &str, s: &str) -> Result<Pose3D, TransformError> {
            Err(TransformError::new(t, s, "no data yet"))
        }
    }

    #[test]
    fn test_pose_is_projected_and_speeds_are_zero() {
        let tf = Arc::new(FixedTf(Pose3D::new(2.0, 3.0, 0.7, 0.5, 0.1, -0.1)));
        let source = PoseSource::new(tf, "map", "base_link");
        let (pose, twist) = source.try_pose().unwrap();
        assert_relative_eq!(pose.x, 2.0);
        assert_relative_eq!(pose.y, 3.0);
        assert_relative_eq!(pose.theta, 0.5);
        assert_eq!(twist, Twist2D::zero());
    }

    #[test]
    fn test_lookup_failure_propagates() {
        let source = PoseSource::new(Arc::new(FailingTf), "map", "base_link");
        assert!(source.try_pose().is_err());
    }

    #[test]
    fn test_cache_identity_and_miss() {
        let cache = TransformCache::new();
        assert!(cache.lookup("map", "map").is_ok());
        assert!(cache.lookup("map", "base_link").is_err());
        cache.update("map", "base_link", Pose3D::new(1.0, 2.0, 0.0, 0.3, 0.0, 0.0));
        let tx = cache.lookup("map", "base_link").unwrap();
        assert_eq!(tx.x, 1.0);
    }

    #[test]
    fn test_cache_keeps_latest_only() {
        let cache = TransformCache::new();
        cache.update("map", "base_link", Pose3D::new(1.0, 0.0, 0.0, 0.0, 0.0, 0.0));
        cache.update("map", "base_link", Pose3D::new(2.0, 0.0, 0.0, 0.0, 0.0, 0.0));
        assert_eq!(cache.lookup("map", "base_link").unwrap().x, 2.0);
    }

    #[test]
    fn test_to_reference_frame_composes() {
        // odom sits at (1, 0) rotated 90° in map.
        let tf = Arc::new(FixedTf(Pose3D::new(1.0, 0.0, 0.0, FRAC_PI_2, 0.0, 0.0)));
        let source = PoseSource::new(tf, "map", "base_link");
        let goal_in_odom = Pose2D::new(1.0, 0.0, 0.0);
        let goal_in_map = source.to_reference_frame("odom", goal_in_odom).unwrap();
        assert_relative_eq!(goal_in_map.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(goal_in_map.y, 1.0, epsilon = 1e-12);
        assert_relative_eq!(goal_in_map.theta, FRAC_PI_2, epsilon = 1e-12);
    }
}
