//! Coverage estimation: how much of the area the planned photos see.
//!
//! # Algorithm
//!
//! The area's bounding box is sampled on a regular `samples × samples` grid
//! (cell centres). Samples outside every area ring are ignored. Each photo
//! footprint is indexed by its bounding box in an R*-tree; a sample counts as
//! covered when one of the footprints returned by the envelope query contains
//! it. The result is `covered / inside`.

use crate::area::CoverageArea;
use crate::camera::PhotoProperties;
use crate::flight_plan::FlightPlan;
use rstar::{RTree, RTreeObject, AABB};
use u_survey_core::geometry::point_in_ring;
use u_survey_core::transform::AABB2D;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Coverage sampling parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CoverageConfig {
    /// Grid samples per axis.
    pub samples: usize,
}

impl Default for CoverageConfig {
    fn default() -> Self {
        Self { samples: 100 }
    }
}

impl CoverageConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_samples(mut self, samples: usize) -> Self {
        self.samples = samples.max(1);
        self
    }
}

/// A footprint ring in the spatial index.
#[derive(Debug, Clone)]
struct FootprintEntry {
    ring: Vec<(f64, f64)>,
    aabb: [f64; 4],
}

impl FootprintEntry {
    fn new(ring: Vec<(f64, f64)>) -> Option<Self> {
        let bb = AABB2D::from_points(&ring)?;
        Some(Self {
            ring,
            aabb: [bb.min_x, bb.min_y, bb.max_x, bb.max_y],
        })
    }
}

impl RTreeObject for FootprintEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners([self.aabb[0], self.aabb[1]], [self.aabb[2], self.aabb[3]])
    }
}

/// Fraction of the area inside `rings` covered by at least one footprint.
///
/// Returns 0 when no grid sample falls inside the area.
pub fn estimate_coverage(
    rings: &[Vec<(f64, f64)>],
    footprints: &[Vec<(f64, f64)>],
    samples: usize,
) -> f64 {
    let Some(bounds) = AABB2D::from_points(rings.iter().flatten()) else {
        return 0.0;
    };
    let samples = samples.max(1);
    let entries: Vec<FootprintEntry> = footprints
        .iter()
        .filter_map(|f| FootprintEntry::new(f.clone()))
        .collect();
    let tree = RTree::bulk_load(entries);

    let dx = bounds.width() / samples as f64;
    let dy = bounds.height() / samples as f64;
    let mut inside = 0usize;
    let mut covered = 0usize;

    for i in 0..samples {
        let x = bounds.min_x + (i as f64 + 0.5) * dx;
        for j in 0..samples {
            let y = bounds.min_y + (j as f64 + 0.5) * dy;
            let p = (x, y);
            if !rings.iter().any(|r| point_in_ring(p, r)) {
                continue;
            }
            inside += 1;
            let point = AABB::from_point([x, y]);
            if tree
                .locate_in_envelope_intersecting(&point)
                .any(|e| point_in_ring(p, &e.ring))
            {
                covered += 1;
            }
        }
    }

    if inside == 0 {
        0.0
    } else {
        covered as f64 / inside as f64
    }
}

/// Ground footprints of every photo in the plan, oriented along the
/// waypoint heading. Sizes are those of `photo`, i.e. for its altitude.
pub fn photo_footprints(plan: &FlightPlan, photo: &PhotoProperties) -> Vec<Vec<(f64, f64)>> {
    plan.waypoints()
        .into_iter()
        .map(|wp| photo.footprint_world(wp.ground_point(), (wp.heading.x, wp.heading.y)))
        .collect()
}

/// Coverage of `area` by the photos of `plan`.
pub fn estimate_plan_coverage<A>(
    area: &A,
    plan: &FlightPlan,
    photo: &PhotoProperties,
    config: &CoverageConfig,
) -> f64
where
    A: CoverageArea + ?Sized,
{
    let ratio = estimate_coverage(&area.rings(), &photo_footprints(plan, photo), config.samples);
    log::debug!("estimated coverage {:.3} with {}x{} samples", ratio, config.samples, config.samples);
    ratio
}
