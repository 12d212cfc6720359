//! Coverage-area abstraction shared by polygons and corridors.

use u_survey_core::transform::AABB2D;
use u_survey_core::Result;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A part of an area that is flown with one line orientation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CoveragePatch {
    /// Rings covered by this patch. A line's inside intervals are the union
    /// over all rings.
    pub rings: Vec<Vec<(f64, f64)>>,
    /// Flight line direction in radians from the +x axis.
    pub axis_angle: f64,
}

impl CoveragePatch {
    /// All vertices of all rings.
    pub fn vertices(&self) -> impl Iterator<Item = &(f64, f64)> {
        self.rings.iter().flatten()
    }
}

/// Something the rasterizer can tile with flight lines.
pub trait CoverageArea {
    /// Patches to tile, in flying order.
    fn patches(&self) -> Vec<CoveragePatch>;

    /// Rings making up the whole area (used for coverage estimation).
    fn rings(&self) -> Vec<Vec<(f64, f64)>>;

    /// Area in square metres.
    fn area(&self) -> f64;

    /// Rejects degenerate input.
    fn validate(&self) -> Result<()>;

    /// Bounding box over all rings.
    fn aabb(&self) -> Option<AABB2D> {
        let rings = self.rings();
        AABB2D::from_points(rings.iter().flatten())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corridor::Corridor;
    use crate::polygon::Polygon;
    use approx::assert_relative_eq;

    #[test]
    fn test_polygon_single_patch() {
        let p = Polygon::rectangle(30.0, 10.0);
        let patches = p.patches();
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].vertices().count(), 4);
        let bb = CoverageArea::aabb(&p).unwrap();
        assert_relative_eq!(bb.width(), 30.0);
    }

    #[test]
    fn test_trait_objects() {
        let areas: Vec<Box<dyn CoverageArea>> = vec![
            Box::new(Polygon::rectangle(10.0, 10.0)),
            Box::new(Corridor::new(vec![(0.0, 0.0), (10.0, 0.0)], 10.0)),
        ];
        for a in &areas {
            assert!(a.validate().is_ok());
            assert_relative_eq!(a.area(), 100.0, epsilon = 1e-9);
        }
    }
}
