//! 2D geometry primitives used by the coverage planner.
//!
//! Points are plain `(f64, f64)` tuples in a local metric frame. Rings are
//! slices of points without a closing duplicate; the last vertex connects back
//! to the first.
//!
//! # Line/ring crossings
//!
//! A flight line is an infinite directed line `origin + t * dir`. Crossing
//! positions against a ring are found by classifying every vertex with an
//! exact orientation test and applying the half-open rule: a vertex lying on
//! the line counts as being on the left side. An edge crosses the line iff its
//! endpoints fall on different sides under that rule. This makes
//!
//! - edges lying on the line contribute nothing,
//! - a vertex touched from one side contribute zero or two crossings,
//! - a vertex passed through contribute exactly one crossing,
//!
//! so the crossing count per closed ring is always even and consecutive pairs
//! bound the inside of the ring.

use crate::robust::side_of_line;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Tolerance used to compare lengths and parameters along a line.
pub const EPSILON: f64 = 1e-9;

/// A closed range `[min, max]` of parameters along a line.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Interval {
    /// Lower bound.
    pub min: f64,
    /// Upper bound.
    pub max: f64,
}

impl Interval {
    /// Creates an interval, swapping the bounds if they are given in reverse.
    pub fn new(a: f64, b: f64) -> Self {
        if a <= b {
            Self { min: a, max: b }
        } else {
            Self { min: b, max: a }
        }
    }

    /// Length of the interval.
    #[inline]
    pub fn len(&self) -> f64 {
        self.max - self.min
    }

    /// Returns true if the interval has (numerically) zero length.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() <= EPSILON
    }

    /// Midpoint of the interval.
    #[inline]
    pub fn mid(&self) -> f64 {
        0.5 * (self.min + self.max)
    }

    /// Returns true if `t` lies within the interval (inclusive).
    #[inline]
    pub fn contains(&self, t: f64) -> bool {
        t >= self.min && t <= self.max
    }

    /// Intersection of two intervals, or `None` if they are disjoint.
    pub fn intersect(&self, other: &Interval) -> Option<Interval> {
        let min = self.min.max(other.min);
        let max = self.max.min(other.max);
        (min <= max).then_some(Interval { min, max })
    }

    /// Returns true if the intervals overlap or are separated by at most `gap`.
    pub fn overlaps_or_touches(&self, other: &Interval, gap: f64) -> bool {
        self.min <= other.max + gap && other.min <= self.max + gap
    }

    /// Grows the interval by `before` at the low end and `after` at the high end.
    ///
    /// Negative values shrink it; the result never inverts.
    pub fn expand(&self, before: f64, after: f64) -> Interval {
        let min = self.min - before;
        let max = self.max + after;
        if min <= max {
            Interval { min, max }
        } else {
            let m = 0.5 * (min + max);
            Interval { min: m, max: m }
        }
    }
}

/// Sorted union of intervals. Intervals separated by at most `gap` are merged.
pub fn merge_intervals(mut intervals: Vec<Interval>, gap: f64) -> Vec<Interval> {
    intervals.sort_by(|a, b| a.min.total_cmp(&b.min));

    let mut merged: Vec<Interval> = Vec::with_capacity(intervals.len());
    for iv in intervals {
        match merged.last_mut() {
            Some(last) if last.overlaps_or_touches(&iv, gap) => {
                last.max = last.max.max(iv.max);
            }
            _ => merged.push(iv),
        }
    }
    merged
}

#[inline]
fn cross(a: (f64, f64), b: (f64, f64)) -> f64 {
    a.0 * b.1 - a.1 * b.0
}

#[inline]
fn sub(a: (f64, f64), b: (f64, f64)) -> (f64, f64) {
    (a.0 - b.0, a.1 - b.1)
}

#[inline]
fn dot(a: (f64, f64), b: (f64, f64)) -> f64 {
    a.0 * b.0 + a.1 * b.1
}

/// Euclidean distance between two points.
#[inline]
pub fn distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    (a.0 - b.0).hypot(a.1 - b.1)
}

/// Normalizes a direction vector. Returns `None` for a zero vector.
pub fn normalize(v: (f64, f64)) -> Option<(f64, f64)> {
    let len = v.0.hypot(v.1);
    (len > EPSILON).then(|| (v.0 / len, v.1 / len))
}

/// Intersection point of segments `a1-a2` and `b1-b2`.
///
/// If the segments are colinear and overlap, the midpoint of the overlapping
/// part is returned.
pub fn segment_intersection(
    a1: (f64, f64),
    a2: (f64, f64),
    b1: (f64, f64),
    b2: (f64, f64),
) -> Option<(f64, f64)> {
    let r = sub(a2, a1);
    let s = sub(b2, b1);
    let denom = cross(r, s);
    let qp = sub(b1, a1);

    if denom.abs() <= EPSILON * (dot(r, r) * dot(s, s)).sqrt().max(EPSILON) {
        // Parallel
        if cross(qp, r).abs() > EPSILON * dot(r, r).sqrt().max(1.0) {
            return None;
        }
        let rr = dot(r, r);
        if rr <= EPSILON {
            // `a` is a point; accept if it lies on `b`.
            let ss = dot(s, s);
            if ss <= EPSILON {
                return (distance(a1, b1) <= EPSILON).then_some(a1);
            }
            let u = dot(sub(a1, b1), s) / ss;
            return (-EPSILON..=1.0 + EPSILON).contains(&u).then_some(a1);
        }
        let t0 = dot(qp, r) / rr;
        let t1 = dot(sub(b2, a1), r) / rr;
        let overlap = Interval::new(t0, t1).intersect(&Interval::new(0.0, 1.0))?;
        let t = overlap.mid();
        return Some((a1.0 + t * r.0, a1.1 + t * r.1));
    }

    let t = cross(qp, s) / denom;
    let u = cross(qp, r) / denom;
    let range = -EPSILON..=1.0 + EPSILON;
    if range.contains(&t) && range.contains(&u) {
        Some((a1.0 + t * r.0, a1.1 + t * r.1))
    } else {
        None
    }
}

/// Parametric positions where the line `origin + t * dir` crosses `ring`.
///
/// `t` is measured in units of `|dir|`; pass a unit direction to get metres.
/// The result is sorted and always has even length for a closed ring.
pub fn line_ring_crossings(origin: (f64, f64), dir: (f64, f64), ring: &[(f64, f64)]) -> Vec<f64> {
    let n = ring.len();
    if n < 3 {
        return Vec::new();
    }
    let dd = dot(dir, dir);
    if dd <= EPSILON * EPSILON {
        return Vec::new();
    }

    // Half-open rule: "on the line" is treated as left.
    let left: Vec<bool> = ring
        .iter()
        .map(|&p| side_of_line(origin, dir, p) >= 0)
        .collect();

    let mut ts = Vec::new();
    for i in 0..n {
        let j = (i + 1) % n;
        if left[i] == left[j] {
            continue;
        }
        let a = ring[i];
        let b = ring[j];
        let da = cross(dir, sub(a, origin));
        let db = cross(dir, sub(b, origin));
        let denom = da - db;
        let p = if denom.abs() > f64::MIN_POSITIVE {
            let s = (da / denom).clamp(0.0, 1.0);
            (a.0 + s * (b.0 - a.0), a.1 + s * (b.1 - a.1))
        } else {
            ((a.0 + b.0) * 0.5, (a.1 + b.1) * 0.5)
        };
        ts.push(dot(sub(p, origin), dir) / dd);
    }

    ts.sort_by(f64::total_cmp);
    ts
}

/// Inside intervals of the line `origin + t * dir` over a set of rings.
///
/// Each ring is treated as a separate simple polygon (even-odd pairing of its
/// own crossings); the per-ring intervals are then merged, so rings that touch
/// or overlap along the line yield a single interval.
pub fn line_rings_intervals(
    origin: (f64, f64),
    dir: (f64, f64),
    rings: &[Vec<(f64, f64)>],
) -> Vec<Interval> {
    let mut all = Vec::new();
    for ring in rings {
        let ts = line_ring_crossings(origin, dir, ring);
        for pair in ts.chunks_exact(2) {
            let iv = Interval::new(pair[0], pair[1]);
            if !iv.is_empty() {
                all.push(iv);
            }
        }
    }
    merge_intervals(all, EPSILON)
}

/// Signed area of a ring (positive for counter-clockwise).
pub fn signed_area(ring: &[(f64, f64)]) -> f64 {
    let n = ring.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let (x1, y1) = ring[i];
        let (x2, y2) = ring[(i + 1) % n];
        sum += x1 * y2 - x2 * y1;
    }
    0.5 * sum
}

/// Unsigned area of a ring.
#[inline]
pub fn area(ring: &[(f64, f64)]) -> f64 {
    signed_area(ring).abs()
}

/// Perimeter of a closed ring.
pub fn perimeter(ring: &[(f64, f64)]) -> f64 {
    let n = ring.len();
    if n < 2 {
        return 0.0;
    }
    (0..n).map(|i| distance(ring[i], ring[(i + 1) % n])).sum()
}

/// Area centroid of a ring. Falls back to the vertex average for
/// zero-area rings.
pub fn centroid(ring: &[(f64, f64)]) -> (f64, f64) {
    let n = ring.len();
    if n == 0 {
        return (0.0, 0.0);
    }
    let a = signed_area(ring);
    if a.abs() <= EPSILON {
        let (sx, sy) = ring
            .iter()
            .fold((0.0, 0.0), |acc, p| (acc.0 + p.0, acc.1 + p.1));
        return (sx / n as f64, sy / n as f64);
    }
    let mut cx = 0.0;
    let mut cy = 0.0;
    for i in 0..n {
        let (x1, y1) = ring[i];
        let (x2, y2) = ring[(i + 1) % n];
        let f = x1 * y2 - x2 * y1;
        cx += (x1 + x2) * f;
        cy += (y1 + y2) * f;
    }
    (cx / (6.0 * a), cy / (6.0 * a))
}

/// Number of distinct vertices (within [`EPSILON`]).
pub fn distinct_vertex_count(ring: &[(f64, f64)]) -> usize {
    let mut seen: Vec<(f64, f64)> = Vec::with_capacity(ring.len());
    for &p in ring {
        if !seen.iter().any(|&q| distance(p, q) <= EPSILON) {
            seen.push(p);
        }
    }
    seen.len()
}

/// Returns true if the ring is convex.
#[inline]
pub fn is_convex(ring: &[(f64, f64)]) -> bool {
    crate::robust::is_convex_robust(ring)
}

/// Even-odd point-in-ring test. Points on the boundary may go either way.
pub fn point_in_ring(p: (f64, f64), ring: &[(f64, f64)]) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = ring[i];
        let (xj, yj) = ring[j];
        if (yi > p.1) != (yj > p.1) {
            let x = xi + (p.1 - yi) * (xj - xi) / (yj - yi);
            if p.0 < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}
