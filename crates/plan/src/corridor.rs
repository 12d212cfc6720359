//! Corridor areas: a buffered centerline.
//!
//! A corridor is covered in patches. Consecutive centerline segments whose
//! heading changes by less than [`Corridor::MERGE_ANGLE_DEG`] share a patch
//! and are flown with lines parallel to the patch chord. Each segment of a
//! patch contributes one miter-joined quadrilateral, so neighbouring quads
//! share an edge and a flight line crossing them yields one merged interval.

use crate::area::{CoverageArea, CoveragePatch};
use u_survey_core::geometry::{self, normalize, segment_intersection, EPSILON};
use u_survey_core::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Offsets smaller than this return the centerline unchanged.
pub const MINIMAL_SHIFT: f64 = 0.01;

/// Miter joins are clamped to this multiple of the offset.
const MITER_LIMIT: f64 = 4.0;

/// A centerline path buffered by `width / 2` on each side.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Corridor {
    centerline: Vec<(f64, f64)>,
    width: f64,
}

impl Corridor {
    /// Heading changes below this angle keep segments in one patch.
    pub const MERGE_ANGLE_DEG: f64 = 15.0;

    /// Creates a corridor. Repeated points and loops in the centerline are
    /// removed.
    pub fn new(centerline: Vec<(f64, f64)>, width: f64) -> Self {
        let mut path: Vec<(f64, f64)> = Vec::with_capacity(centerline.len());
        for p in centerline {
            if path
                .last()
                .map_or(true, |&q| geometry::distance(p, q) > EPSILON)
            {
                path.push(p);
            }
        }
        remove_loops(&mut path);
        Self {
            centerline: path,
            width,
        }
    }

    pub fn centerline(&self) -> &[(f64, f64)] {
        &self.centerline
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    /// Length of the centerline.
    pub fn length(&self) -> f64 {
        self.centerline
            .windows(2)
            .map(|w| geometry::distance(w[0], w[1]))
            .sum()
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.width > 0.0) {
            return Err(Error::InvalidGeometry(format!(
                "corridor width must be positive, got {}",
                self.width
            )));
        }
        if self.centerline.len() < 2 || self.length() <= EPSILON {
            return Err(Error::InvalidGeometry(
                "corridor centerline needs at least 2 distinct points".into(),
            ));
        }
        Ok(())
    }

    /// Left unit normal of segment `i`.
    fn segment_normal(&self, i: usize) -> (f64, f64) {
        let a = self.centerline[i];
        let b = self.centerline[i + 1];
        let (dx, dy) = normalize((b.0 - a.0, b.1 - a.1)).unwrap_or((1.0, 0.0));
        (-dy, dx)
    }

    /// Miter offset direction at vertex `i`, scaled so that the offset point
    /// keeps unit distance from both adjacent segments.
    fn miter(&self, i: usize) -> (f64, f64) {
        let last = self.centerline.len() - 1;
        if i == 0 {
            return self.segment_normal(0);
        }
        if i == last {
            return self.segment_normal(last - 1);
        }
        let n1 = self.segment_normal(i - 1);
        let n2 = self.segment_normal(i);
        let Some(m) = normalize((n1.0 + n2.0, n1.1 + n2.1)) else {
            // Full reversal; use the incoming normal.
            return n1;
        };
        let cos = (m.0 * n1.0 + m.1 * n1.1).max(1.0 / MITER_LIMIT);
        (m.0 / cos, m.1 / cos)
    }

    /// Centerline shifted sideways by `offset` (positive = left).
    pub fn shifted(&self, offset: f64) -> Vec<(f64, f64)> {
        if offset.abs() < MINIMAL_SHIFT || self.centerline.len() < 2 {
            return self.centerline.clone();
        }
        let mut out: Vec<(f64, f64)> = (0..self.centerline.len())
            .map(|i| {
                let p = self.centerline[i];
                let m = self.miter(i);
                (p.0 + m.0 * offset, p.1 + m.1 * offset)
            })
            .collect();
        remove_loops(&mut out);
        out
    }

    /// Outline of the whole corridor as a single ring.
    pub fn hull(&self) -> Vec<(f64, f64)> {
        let half = 0.5 * self.width;
        let mut ring = self.shifted(half);
        let back = self.shifted(-half);
        ring.extend(back.into_iter().rev());
        ring
    }

    /// Miter-joined quadrilateral of each centerline segment.
    pub fn segment_quads(&self) -> Vec<Vec<(f64, f64)>> {
        let half = 0.5 * self.width;
        let n = self.centerline.len();
        if n < 2 {
            return Vec::new();
        }
        let offsets: Vec<((f64, f64), (f64, f64))> = (0..n)
            .map(|i| {
                let p = self.centerline[i];
                let m = self.miter(i);
                (
                    (p.0 + m.0 * half, p.1 + m.1 * half),
                    (p.0 - m.0 * half, p.1 - m.1 * half),
                )
            })
            .collect();
        (0..n - 1)
            .map(|i| {
                let (l0, r0) = offsets[i];
                let (l1, r1) = offsets[i + 1];
                vec![r0, r1, l1, l0]
            })
            .collect()
    }

    /// Groups segments into coverage patches.
    pub fn segment_patches(&self) -> Vec<CoveragePatch> {
        let quads = self.segment_quads();
        if quads.is_empty() {
            return Vec::new();
        }
        let heading = |i: usize| {
            let a = self.centerline[i];
            let b = self.centerline[i + 1];
            (b.1 - a.1).atan2(b.0 - a.0)
        };
        let limit = Self::MERGE_ANGLE_DEG.to_radians();

        let mut patches = Vec::new();
        let mut first = 0;
        for i in 1..=quads.len() {
            let split = i == quads.len() || angle_between(heading(i - 1), heading(i)) >= limit;
            if split {
                let a = self.centerline[first];
                let b = self.centerline[i];
                patches.push(CoveragePatch {
                    rings: quads[first..i].to_vec(),
                    axis_angle: (b.1 - a.1).atan2(b.0 - a.0),
                });
                first = i;
            }
        }
        patches
    }
}

fn angle_between(a: f64, b: f64) -> f64 {
    use std::f64::consts::{PI, TAU};
    let d = (b - a).rem_euclid(TAU);
    if d > PI {
        TAU - d
    } else {
        d
    }
}

/// Cuts self-intersections out of an open path.
///
/// Scanning segments from the start, each is tested against the later,
/// non-adjacent segments starting from the end of the path; on a hit, the loop
/// between the two segments is replaced by the intersection point.
pub fn remove_loops(path: &mut Vec<(f64, f64)>) {
    let mut i = 1;
    while i + 2 < path.len() {
        let a1 = path[i - 1];
        let a2 = path[i];
        let mut k = path.len() - 2;
        while k > i {
            if let Some(p) = segment_intersection(a1, a2, path[k], path[k + 1]) {
                path[i] = p;
                path.drain(i + 1..=k);
                break;
            }
            k -= 1;
        }
        i += 1;
    }
}

impl CoverageArea for Corridor {
    fn patches(&self) -> Vec<CoveragePatch> {
        self.segment_patches()
    }

    fn rings(&self) -> Vec<Vec<(f64, f64)>> {
        self.segment_quads()
    }

    fn area(&self) -> f64 {
        self.segment_quads().iter().map(|q| geometry::area(q)).sum()
    }

    fn validate(&self) -> Result<()> {
        Corridor::validate(self)
    }
}
