//! Simple polygon areas of interest.

use crate::area::{CoverageArea, CoveragePatch};
use geo::{Coord, LineString, MinimumRotatedRect, Polygon as GeoPolygon};
use u_survey_core::geometry::{self, EPSILON};
use u_survey_core::transform::AABB2D;
use u_survey_core::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A simple polygon given by its outer ring.
///
/// The ring is stored open (no closing duplicate). Self-intersection is not
/// checked; callers supply simple polygons.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Polygon {
    exterior: Vec<(f64, f64)>,
}

impl Polygon {
    /// Creates a polygon from its vertices. A closing vertex equal to the
    /// first one is dropped.
    pub fn new(mut vertices: Vec<(f64, f64)>) -> Self {
        if vertices.len() > 1 {
            let first = vertices[0];
            if let Some(&last) = vertices.last() {
                if geometry::distance(first, last) <= EPSILON {
                    vertices.pop();
                }
            }
        }
        Self { exterior: vertices }
    }

    /// Axis-aligned `width x height` rectangle with its lower-left corner at the origin.
    pub fn rectangle(width: f64, height: f64) -> Self {
        Self::new(vec![
            (0.0, 0.0),
            (width, 0.0),
            (width, height),
            (0.0, height),
        ])
    }

    /// Outer ring vertices.
    pub fn exterior(&self) -> &[(f64, f64)] {
        &self.exterior
    }

    pub fn area(&self) -> f64 {
        geometry::area(&self.exterior)
    }

    pub fn perimeter(&self) -> f64 {
        geometry::perimeter(&self.exterior)
    }

    pub fn centroid(&self) -> (f64, f64) {
        geometry::centroid(&self.exterior)
    }

    pub fn aabb(&self) -> Option<AABB2D> {
        AABB2D::from_points(&self.exterior)
    }

    /// True if the outer ring winds counter-clockwise.
    pub fn is_ccw(&self) -> bool {
        u_survey_core::robust::is_ccw_robust(&self.exterior)
    }

    pub fn is_convex(&self) -> bool {
        geometry::is_convex(&self.exterior)
    }

    /// Checks that the polygon can be covered: at least three distinct
    /// vertices and a non-zero area.
    pub fn validate(&self) -> Result<()> {
        let distinct = geometry::distinct_vertex_count(&self.exterior);
        if distinct < 3 {
            return Err(Error::InvalidGeometry(format!(
                "polygon must have at least 3 distinct vertices, got {distinct}"
            )));
        }
        if self.area() <= EPSILON {
            return Err(Error::InvalidGeometry(
                "polygon has zero area (all vertices colinear)".into(),
            ));
        }
        Ok(())
    }

    /// Converts to a `geo` polygon.
    pub fn to_geo_polygon(&self) -> GeoPolygon<f64> {
        let exterior = LineString::from(
            self.exterior
                .iter()
                .map(|&(x, y)| Coord { x, y })
                .collect::<Vec<_>>(),
        );
        GeoPolygon::new(exterior, vec![])
    }

    /// Direction of the area's major axis in radians, in `(-pi/2, pi/2]`.
    ///
    /// Taken from the longer side of the minimum rotated rectangle. Sides of
    /// equal length resolve to the one closer to the x axis. Falls back to the
    /// bounding-box major axis when no rectangle can be formed.
    pub fn dominant_axis(&self) -> f64 {
        let fallback = || match self.aabb() {
            Some(bb) if bb.height() > bb.width() => std::f64::consts::FRAC_PI_2,
            _ => 0.0,
        };

        let Some(rect) = self.to_geo_polygon().minimum_rotated_rect() else {
            return fallback();
        };
        let pts: Vec<Coord<f64>> = rect.exterior().coords().copied().collect();
        if pts.len() < 3 {
            return fallback();
        }

        let side = |a: Coord<f64>, b: Coord<f64>| {
            let dx = b.x - a.x;
            let dy = b.y - a.y;
            (dx.hypot(dy), normalize_axis(dy.atan2(dx)))
        };
        let (len_a, angle_a) = side(pts[0], pts[1]);
        let (len_b, angle_b) = side(pts[1], pts[2]);

        let tol = 1e-9 * len_a.max(len_b).max(1.0);
        if (len_a - len_b).abs() <= tol {
            if angle_a.abs() <= angle_b.abs() {
                angle_a
            } else {
                angle_b
            }
        } else if len_a > len_b {
            angle_a
        } else {
            angle_b
        }
    }
}

/// Folds an angle into `(-pi/2, pi/2]` (lines are undirected here).
fn normalize_axis(mut angle: f64) -> f64 {
    use std::f64::consts::{FRAC_PI_2, PI};
    while angle > FRAC_PI_2 + 1e-12 {
        angle -= PI;
    }
    while angle <= -FRAC_PI_2 + 1e-12 {
        angle += PI;
    }
    if angle.abs() < 1e-12 {
        0.0
    } else {
        angle
    }
}

impl From<Vec<(f64, f64)>> for Polygon {
    fn from(vertices: Vec<(f64, f64)>) -> Self {
        Self::new(vertices)
    }
}

impl CoverageArea for Polygon {
    fn patches(&self) -> Vec<CoveragePatch> {
        vec![CoveragePatch {
            rings: vec![self.exterior.clone()],
            axis_angle: self.dominant_axis(),
        }]
    }

    fn rings(&self) -> Vec<Vec<(f64, f64)>> {
        vec![self.exterior.clone()]
    }

    fn area(&self) -> f64 {
        Polygon::area(self)
    }

    fn validate(&self) -> Result<()> {
        Polygon::validate(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_closing_vertex_dropped() {
        let p = Polygon::new(vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 0.0)]);
        assert_eq!(p.exterior().len(), 3);
    }

    #[test]
    fn test_measures() {
        let p = Polygon::rectangle(100.0, 50.0);
        assert_relative_eq!(p.area(), 5000.0);
        assert_relative_eq!(p.perimeter(), 300.0);
        assert!(p.is_convex());
        let bb = p.aabb().unwrap();
        assert_relative_eq!(bb.width(), 100.0);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_winding() {
        let square = Polygon::rectangle(10.0, 10.0);
        assert!(square.is_ccw());
        let mut vertices = square.exterior().to_vec();
        vertices.reverse();
        assert!(!Polygon::new(vertices).is_ccw());
    }

    #[test]
    fn test_validate_degenerate() {
        let point = Polygon::new(vec![(3.0, 3.0), (3.0, 3.0), (3.0, 3.0)]);
        assert!(matches!(point.validate(), Err(Error::InvalidGeometry(_))));

        let segment = Polygon::new(vec![(0.0, 0.0), (5.0, 0.0), (10.0, 0.0)]);
        assert!(matches!(segment.validate(), Err(Error::InvalidGeometry(_))));

        let empty = Polygon::new(vec![]);
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_dominant_axis_wide_rectangle() {
        let p = Polygon::rectangle(200.0, 40.0);
        assert_relative_eq!(p.dominant_axis(), 0.0, epsilon = 1e-9);

        let tall = Polygon::rectangle(40.0, 200.0);
        assert_relative_eq!(
            tall.dominant_axis().abs(),
            std::f64::consts::FRAC_PI_2,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_dominant_axis_rotated() {
        // 100 x 20 strip rotated by 30 degrees.
        let angle = 30f64.to_radians();
        let (s, c) = angle.sin_cos();
        let rot = |x: f64, y: f64| (x * c - y * s, x * s + y * c);
        let p = Polygon::new(vec![
            rot(0.0, 0.0),
            rot(100.0, 0.0),
            rot(100.0, 20.0),
            rot(0.0, 20.0),
        ]);
        assert_relative_eq!(p.dominant_axis(), angle, epsilon = 1e-6);
    }

    #[test]
    fn test_dominant_axis_square_prefers_x() {
        let p = Polygon::rectangle(100.0, 100.0);
        assert_relative_eq!(p.dominant_axis(), 0.0, epsilon = 1e-9);
    }
}
