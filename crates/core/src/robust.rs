//! Robust geometric predicates for numerical stability.
//!
//! Flight lines are intersected against polygon rings whose vertices often sit
//! exactly on (or within a rounding error of) a candidate line. A plain cross
//! product can then flip sign and produce an odd number of crossings, which
//! breaks even-odd pairing. The predicates here use Shewchuk's adaptive
//! precision arithmetic through the `robust` crate so the sign is always exact.
//!
//! ## References
//!
//! - Shewchuk, J.R. (1997). "Adaptive Precision Floating-Point Arithmetic and
//!   Fast Robust Predicates for Computational Geometry"
//!
//! ## Example
//!
//! ```rust
//! use u_survey_core::robust::{orient2d, Orientation};
//!
//! let a = (0.0, 0.0);
//! let b = (1.0, 0.0);
//! let c = (0.5, 1.0);
//!
//! assert_eq!(orient2d(a, b, c), Orientation::CounterClockwise);
//! ```

use robust::{orient2d as robust_orient2d, Coord};

/// Result of an orientation test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Points are arranged counter-clockwise (left turn).
    CounterClockwise,
    /// Points are arranged clockwise (right turn).
    Clockwise,
    /// Points are collinear (on the same line).
    Collinear,
}

impl Orientation {
    /// Returns true if the orientation is counter-clockwise.
    #[inline]
    pub fn is_ccw(self) -> bool {
        matches!(self, Orientation::CounterClockwise)
    }

    /// Returns true if the orientation is clockwise.
    #[inline]
    pub fn is_cw(self) -> bool {
        matches!(self, Orientation::Clockwise)
    }

    /// Returns true if the points are collinear.
    #[inline]
    pub fn is_collinear(self) -> bool {
        matches!(self, Orientation::Collinear)
    }
}

/// Determines the orientation of three 2D points.
///
/// - `CounterClockwise` if `pc` lies to the left of the directed line `pa -> pb`
/// - `Clockwise` if `pc` lies to the right
/// - `Collinear` if the three points are collinear
#[inline]
pub fn orient2d(pa: (f64, f64), pb: (f64, f64), pc: (f64, f64)) -> Orientation {
    let result = orient2d_raw(pa, pb, pc);

    if result > 0.0 {
        Orientation::CounterClockwise
    } else if result < 0.0 {
        Orientation::Clockwise
    } else {
        Orientation::Collinear
    }
}

/// Returns the raw orientation determinant (twice the signed triangle area).
#[inline]
pub fn orient2d_raw(pa: (f64, f64), pb: (f64, f64), pc: (f64, f64)) -> f64 {
    robust_orient2d(
        Coord { x: pa.0, y: pa.1 },
        Coord { x: pb.0, y: pb.1 },
        Coord { x: pc.0, y: pc.1 },
    )
}

/// Relative threshold under which the fast determinant is not trusted.
const FILTER_EPSILON: f64 = 1e-12;

/// Fast orientation test with exact fallback.
///
/// Most calls are decided by a plain cross product; only near-degenerate
/// configurations fall through to adaptive arithmetic.
#[inline]
pub fn orient2d_filtered(pa: (f64, f64), pb: (f64, f64), pc: (f64, f64)) -> Orientation {
    let acx = pa.0 - pc.0;
    let bcx = pb.0 - pc.0;
    let acy = pa.1 - pc.1;
    let bcy = pb.1 - pc.1;

    let det = acx * bcy - acy * bcx;
    let det_sum = (acx * bcy).abs() + (acy * bcx).abs();

    if det.abs() > FILTER_EPSILON * det_sum {
        return if det > 0.0 {
            Orientation::CounterClockwise
        } else {
            Orientation::Clockwise
        };
    }

    orient2d(pa, pb, pc)
}

/// Classifies `p` against the infinite directed line through `origin` with
/// direction `dir`.
///
/// Returns `1` if `p` is on the left, `-1` on the right, `0` on the line.
#[inline]
pub fn side_of_line(origin: (f64, f64), dir: (f64, f64), p: (f64, f64)) -> i8 {
    let ahead = (origin.0 + dir.0, origin.1 + dir.1);
    match orient2d_filtered(origin, ahead, p) {
        Orientation::CounterClockwise => 1,
        Orientation::Clockwise => -1,
        Orientation::Collinear => 0,
    }
}

/// Checks if a ring is convex using robust orientation tests.
///
/// Collinear vertex triples are ignored.
pub fn is_convex_robust(polygon: &[(f64, f64)]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }

    let mut expected_orientation: Option<Orientation> = None;

    for i in 0..n {
        let p0 = polygon[i];
        let p1 = polygon[(i + 1) % n];
        let p2 = polygon[(i + 2) % n];

        let o = orient2d(p0, p1, p2);
        if o.is_collinear() {
            continue;
        }

        match expected_orientation {
            None => expected_orientation = Some(o),
            Some(expected) if expected != o => return false,
            _ => {}
        }
    }

    expected_orientation.is_some()
}

/// Checks if a ring has counter-clockwise winding order.
pub fn is_ccw_robust(polygon: &[(f64, f64)]) -> bool {
    if polygon.len() < 3 {
        return false;
    }

    // The lowest-leftmost vertex is always convex.
    let mut min_idx = 0;
    for (i, &(x, y)) in polygon.iter().enumerate() {
        let (min_x, min_y) = polygon[min_idx];
        if y < min_y || (y == min_y && x < min_x) {
            min_idx = i;
        }
    }

    let n = polygon.len();
    let prev = polygon[(min_idx + n - 1) % n];
    let curr = polygon[min_idx];
    let next = polygon[(min_idx + 1) % n];

    orient2d(prev, curr, next).is_ccw()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orient2d_basic() {
        assert_eq!(
            orient2d((0.0, 0.0), (1.0, 0.0), (0.5, 1.0)),
            Orientation::CounterClockwise
        );
        assert_eq!(
            orient2d((0.0, 0.0), (1.0, 0.0), (0.5, -1.0)),
            Orientation::Clockwise
        );
    }

    #[test]
    fn test_orient2d_collinear() {
        assert_eq!(
            orient2d((0.0, 0.0), (1.0, 1.0), (2.0, 2.0)),
            Orientation::Collinear
        );
    }

    #[test]
    fn test_orient2d_near_collinear() {
        // Off the line by far less than the coordinate magnitude.
        let a = (0.0, 0.0);
        let b = (1e8, 1e8);
        let c = (5e7, 5e7 + 1e-6);
        assert_eq!(orient2d(a, b, c), Orientation::CounterClockwise);
        assert_eq!(orient2d_filtered(a, b, c), Orientation::CounterClockwise);
    }

    #[test]
    fn test_side_of_line() {
        let origin = (0.0, 5.0);
        let dir = (1.0, 0.0);
        assert_eq!(side_of_line(origin, dir, (3.0, 7.0)), 1);
        assert_eq!(side_of_line(origin, dir, (3.0, 2.0)), -1);
        assert_eq!(side_of_line(origin, dir, (-40.0, 5.0)), 0);
    }

    #[test]
    fn test_is_convex_robust() {
        let square = vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];
        assert!(is_convex_robust(&square));

        let l_shape = vec![
            (0.0, 0.0),
            (2.0, 0.0),
            (2.0, 1.0),
            (1.0, 1.0),
            (1.0, 2.0),
            (0.0, 2.0),
        ];
        assert!(!is_convex_robust(&l_shape));

        let flat = vec![(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)];
        assert!(!is_convex_robust(&flat));
    }

    #[test]
    fn test_is_ccw_robust() {
        let ccw = vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];
        let cw: Vec<_> = ccw.iter().rev().copied().collect();
        assert!(is_ccw_robust(&ccw));
        assert!(!is_ccw_robust(&cw));
    }

    #[test]
    fn test_orientation_methods() {
        assert!(Orientation::CounterClockwise.is_ccw());
        assert!(Orientation::Clockwise.is_cw());
        assert!(Orientation::Collinear.is_collinear());
        assert!(!Orientation::Collinear.is_ccw());
    }
}
