//! Photo waypoints.

use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A photo position with the direction of flight at that point.
///
/// `z` is an absolute altitude in the same vertical datum as the elevation
/// model.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Waypoint {
    pub position: Point3<f64>,
    /// Unit heading vector (horizontal for survey lines).
    pub heading: Vector3<f64>,
    /// Id of the flight line this waypoint belongs to.
    pub line_id: usize,
}

impl Waypoint {
    pub fn new(position: Point3<f64>, heading: Vector3<f64>, line_id: usize) -> Self {
        Self {
            position,
            heading,
            line_id,
        }
    }

    /// Compass-style yaw in degrees: 0 = +y (north), 90 = +x (east).
    pub fn yaw_deg(&self) -> f64 {
        self.heading.x.atan2(self.heading.y).to_degrees().rem_euclid(360.0)
    }

    /// Position projected onto the ground plane.
    pub fn ground_point(&self) -> (f64, f64) {
        (self.position.x, self.position.y)
    }

    pub fn altitude(&self) -> f64 {
        self.position.z
    }

    /// 3D distance to another waypoint.
    pub fn distance_to(&self, other: &Waypoint) -> f64 {
        nalgebra::distance(&self.position, &other.position)
    }
}
