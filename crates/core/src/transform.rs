//! Axis-aligned bounds and local 2D frames.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 2D axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AABB2D {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl AABB2D {
    /// Creates a bounding box from its corners.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Bounding box of a point set, or `None` if it is empty.
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a (f64, f64)>,
    {
        let mut iter = points.into_iter();
        let &(x0, y0) = iter.next()?;
        let mut bb = Self::new(x0, y0, x0, y0);
        for &(x, y) in iter {
            bb.min_x = bb.min_x.min(x);
            bb.min_y = bb.min_y.min(y);
            bb.max_x = bb.max_x.max(x);
            bb.max_y = bb.max_y.max(y);
        }
        Some(bb)
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    #[inline]
    pub fn center(&self) -> (f64, f64) {
        (
            0.5 * (self.min_x + self.max_x),
            0.5 * (self.min_y + self.max_y),
        )
    }

    /// Returns a box grown by `margin` on every side.
    pub fn expand(&self, margin: f64) -> Self {
        Self::new(
            self.min_x - margin,
            self.min_y - margin,
            self.max_x + margin,
            self.max_y + margin,
        )
    }

    /// Smallest box containing both.
    pub fn union(&self, other: &AABB2D) -> Self {
        Self::new(
            self.min_x.min(other.min_x),
            self.min_y.min(other.min_y),
            self.max_x.max(other.max_x),
            self.max_y.max(other.max_y),
        )
    }

    #[inline]
    pub fn contains(&self, p: (f64, f64)) -> bool {
        p.0 >= self.min_x && p.0 <= self.max_x && p.1 >= self.min_y && p.1 <= self.max_y
    }
}

/// Orthonormal 2D frame: an origin, a unit axis `u` and its left normal `v`.
///
/// The rasterizer works in the frame of the dominant area axis: local `x`
/// runs along flight lines and local `y` steps across them.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Frame2D {
    pub origin: (f64, f64),
    pub u: (f64, f64),
    pub v: (f64, f64),
}

impl Frame2D {
    /// Frame whose `u` axis points at `angle` radians from world +x.
    pub fn from_angle(origin: (f64, f64), angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self {
            origin,
            u: (c, s),
            v: (-s, c),
        }
    }

    /// Angle of the `u` axis in radians.
    pub fn angle(&self) -> f64 {
        self.u.1.atan2(self.u.0)
    }

    /// World point to local coordinates.
    #[inline]
    pub fn to_local(&self, p: (f64, f64)) -> (f64, f64) {
        let dx = p.0 - self.origin.0;
        let dy = p.1 - self.origin.1;
        (dx * self.u.0 + dy * self.u.1, dx * self.v.0 + dy * self.v.1)
    }

    /// Local coordinates to world point.
    #[inline]
    pub fn to_world(&self, p: (f64, f64)) -> (f64, f64) {
        (
            self.origin.0 + p.0 * self.u.0 + p.1 * self.v.0,
            self.origin.1 + p.0 * self.u.1 + p.1 * self.v.1,
        )
    }

    /// Local bounding box of a world point set.
    pub fn local_bounds<'a, I>(&self, points: I) -> Option<AABB2D>
    where
        I: IntoIterator<Item = &'a (f64, f64)>,
    {
        let local: Vec<(f64, f64)> = points.into_iter().map(|&p| self.to_local(p)).collect();
        AABB2D::from_points(&local)
    }
}
