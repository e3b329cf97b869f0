//! Pose and point types shared across the bridge.

use serde::{Deserialize, Serialize};

use crate::utils::normalize_angle;

/// A 2D point in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    /// X coordinate in meters
    pub x: f64,
    /// Y coordinate in meters
    pub y: f64,
}

impl Point2D {
    /// Create a new point.
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared distance to another point (avoids sqrt).
    #[inline]
    pub fn distance_squared(&self, other: &Point2D) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Distance to another point.
    #[inline]
    pub fn distance(&self, other: &Point2D) -> f64 {
        self.distance_squared(other).sqrt()
    }
}

impl Default for Point2D {
    fn default() -> Self {
        Self { x: 0.0, y: 0.0 }
    }
}

/// Planar robot pose: position (x, y) in meters, heading in radians.
///
/// Theta is normalized to [-π, π].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose2D {
    /// X position in meters
    pub x: f64,
    /// Y position in meters
    pub y: f64,
    /// Heading in radians, normalized to [-π, π]
    pub theta: f64,
}

impl Pose2D {
    /// Create a new pose with theta normalized to [-π, π].
    #[inline]
    pub fn new(x: f64, y: f64, theta: f64) -> Self {
        Self {
            x,
            y,
            theta: normalize_angle(theta),
        }
    }

    /// Identity pose at origin with zero heading.
    #[inline]
    pub fn identity() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            theta: 0.0,
        }
    }

    /// Compose two poses: self ⊕ other.
    ///
    /// Applies `other` relative to the `self` frame.
    #[inline]
    pub fn compose(&self, other: &Pose2D) -> Pose2D {
        let (sin_t, cos_t) = self.theta.sin_cos();
        Pose2D::new(
            self.x + other.x * cos_t - other.y * sin_t,
            self.y + other.x * sin_t + other.y * cos_t,
            self.theta + other.theta,
        )
    }

    /// Inverse of this pose.
    #[inline]
    pub fn inverse(&self) -> Pose2D {
        let (sin_t, cos_t) = self.theta.sin_cos();
        Pose2D::new(
            -self.x * cos_t - self.y * sin_t,
            self.x * sin_t - self.y * cos_t,
            -self.theta,
        )
    }

    /// Transform a point from this pose's local frame to the global frame.
    #[inline]
    pub fn transform_point(&self, point: &Point2D) -> Point2D {
        let (sin_t, cos_t) = self.theta.sin_cos();
        Point2D::new(
            self.x + point.x * cos_t - point.y * sin_t,
            self.y + point.x * sin_t + point.y * cos_t,
        )
    }
}

impl Default for Pose2D {
    fn default() -> Self {
        Self::identity()
    }
}

impl From<Pose3D> for Pose2D {
    /// Explicit 3D→2D projection: keeps x, y and yaw, discards z, pitch
    /// and roll. Lossy by design — the planar engine cannot represent the
    /// dropped components, so they are thrown away here and nowhere else.
    #[inline]
    fn from(p: Pose3D) -> Self {
        Pose2D::new(p.x, p.y, p.yaw)
    }
}

/// A full 3D pose as delivered by the frame-transform service.
///
/// Orientation as yaw/pitch/roll Euler angles in radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Rotation about Z, radians
    pub yaw: f64,
    /// Rotation about Y, radians
    pub pitch: f64,
    /// Rotation about X, radians
    pub roll: f64,
}

impl Pose3D {
    /// Create a new 3D pose.
    pub fn new(x: f64, y: f64, z: f64, yaw: f64, pitch: f64, roll: f64) -> Self {
        Self {
            x,
            y,
            z,
            yaw,
            pitch,
            roll,
        }
    }

    /// Lift a planar pose into 3D with z/pitch/roll zeroed.
    pub fn from_planar(p: Pose2D) -> Self {
        Self::new(p.x, p.y, 0.0, p.theta, 0.0, 0.0)
    }
}

impl Default for Pose3D {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0, 0.0, 0.0)
    }
}

/// Velocity command: linear (m/s) and angular (rad/s).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Twist2D {
    /// Linear velocity in m/s
    pub linear: f64,
    /// Angular velocity in rad/s
    pub angular: f64,
}

impl Twist2D {
    /// Create a new velocity pair.
    #[inline]
    pub fn new(linear: f64, angular: f64) -> Self {
        Self { linear, angular }
    }

    /// Zero velocity.
    #[inline]
    pub fn zero() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

    #[test]
    fn test_point_distance() {
        let a = Point2D::new(0.0, 0.0);
        let b = Point2D::new(3.0, 4.0);
        assert_relative_eq!(a.distance(&b), 5.0);
        assert_relative_eq!(a.distance_squared(&b), 25.0);
    }

    #[test]
    fn test_pose_compose_identity() {
        let p = Pose2D::new(1.0, 2.0, 0.5);
        let result = p.compose(&Pose2D::identity());
        assert_relative_eq!(result.x, p.x);
        assert_relative_eq!(result.y, p.y);
        assert_relative_eq!(result.theta, p.theta);
    }

    #[test]
    fn test_pose_inverse_roundtrip() {
        let p = Pose2D::new(1.0, 2.0, 0.5);
        let result = p.compose(&p.inverse());
        assert_relative_eq!(result.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(result.y, 0.0, epsilon = 1e-12);
        assert_relative_eq!(result.theta, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_transform_point() {
        let pose = Pose2D::new(1.0, 0.0, FRAC_PI_2);
        let result = pose.transform_point(&Point2D::new(1.0, 0.0));
        assert_relative_eq!(result.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(result.y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_projection_keeps_planar_components() {
        let p3 = Pose3D::new(1.5, -2.25, 0.8, FRAC_PI_4, 0.3, -0.2);
        let p2 = Pose2D::from(p3);
        // x, y, yaw survive exactly; z, pitch, roll are gone.
        assert_eq!(p2.x, 1.5);
        assert_eq!(p2.y, -2.25);
        assert_relative_eq!(p2.theta, FRAC_PI_4);
    }

    #[test]
    fn test_projection_normalizes_yaw() {
        let p3 = Pose3D::new(0.0, 0.0, 0.0, 3.0 * FRAC_PI_2, 0.0, 0.0);
        let p2 = Pose2D::from(p3);
        assert_relative_eq!(p2.theta, -FRAC_PI_2, epsilon = 1e-12);
    }

    #[test]
    fn test_planar_lift_roundtrip() {
        let p2 = Pose2D::new(0.5, 1.0, 0.25);
        let p3 = Pose3D::from_planar(p2);
        assert_eq!(p3.z, 0.0);
        assert_eq!(p3.pitch, 0.0);
        assert_eq!(p3.roll, 0.0);
        assert_eq!(Pose2D::from(p3), p2);
    }
}
