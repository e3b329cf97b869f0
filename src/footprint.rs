//! Robot footprint polygon used for clearance checks.

use serde::{Deserialize, Serialize};

use crate::error::{NavError, Result};
use crate::pose::Point2D;

/// Ordered 2D vertices describing the robot's occupied area.
///
/// Mutated only through [`crate::nav_loop::NavigationLoop::set_robot_shape`];
/// the engine sees it read-only during a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FootprintPolygon {
    vertices: Vec<Point2D>,
}

impl FootprintPolygon {
    /// Build a footprint from ordered vertices.
    ///
    /// Rejects degenerate polygons (fewer than 3 vertices); a clearance
    /// check against a point or a segment is meaningless.
    pub fn from_vertices(vertices: Vec<Point2D>) -> Result<Self> {
        if vertices.len() < 3 {
            return Err(NavError::Shape(format!(
                "polygon needs at least 3 vertices, got {}",
                vertices.len()
            )));
        }
        Ok(Self { vertices })
    }

    /// The polygon vertices, in order.
    pub fn vertices(&self) -> &[Point2D] {
        &self.vertices
    }

    /// Radius of the smallest origin-centered circle containing the
    /// footprint. Used as a conservative clearance bound.
    pub fn bounding_radius(&self) -> f64 {
        let origin = Point2D::default();
        self.vertices
            .iter()
            .map(|v| v.distance(&origin))
            .fold(0.0, f64::max)
    }
}

impl Default for FootprintPolygon {
    /// Conservative 30 cm square centered on the robot origin.
    fn default() -> Self {
        let half = 0.15;
        Self {
            vertices: vec![
                Point2D::new(-half, -half),
                Point2D::new(half, -half),
                Point2D::new(half, half),
                Point2D::new(-half, half),
            ],
        }
    }
}
