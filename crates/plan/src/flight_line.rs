//! Flight lines: straight directed passes over the area.
//!
//! A line is `start + t * direction` for `t` in `[0, length]` at a nominal
//! altitude. Its photo waypoints are laid out lazily on first access and
//! cached; terrain adaptation later rewrites their altitudes in place.
//!
//! # Waypoint layout
//!
//! A line of length `L` with spacing `s` gets `n = max(1, ceil(L / s))`
//! waypoints at `(k + 1/2) * L / n`. The actual gap is therefore never larger
//! than `s`, and a line shorter than one spacing still gets a single photo at
//! its midpoint.

use crate::waypoint::Waypoint;
use nalgebra::{Point3, Vector3};
use std::cell::OnceCell;
use u_survey_core::geometry::{line_rings_intervals, normalize, Interval, EPSILON};
use u_survey_core::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A directed straight pass.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FlightLine {
    /// Line identifier, unique within a plan.
    pub id: usize,
    start: (f64, f64),
    direction: (f64, f64),
    length: f64,
    altitude: f64,
    spacing: f64,
    forward: bool,
    /// Photo centrency the track is shifted against.
    centrency: (f64, f64),
    #[cfg_attr(feature = "serde", serde(skip))]
    waypoints: OnceCell<Vec<Waypoint>>,
}

impl FlightLine {
    /// Creates a line. `direction` need not be normalized but must be non-zero.
    pub fn new(
        id: usize,
        start: (f64, f64),
        direction: (f64, f64),
        length: f64,
        altitude: f64,
        spacing: f64,
    ) -> Result<Self> {
        let direction = normalize(direction)
            .ok_or_else(|| Error::InvalidGeometry("flight line direction is zero".into()))?;
        if !(length >= 0.0) || !length.is_finite() {
            return Err(Error::InvalidGeometry(format!(
                "flight line length must be finite and non-negative, got {length}"
            )));
        }
        if !(spacing > 0.0) {
            return Err(Error::config(format!(
                "waypoint spacing must be positive, got {spacing}"
            )));
        }
        Ok(Self {
            id,
            start,
            direction,
            length,
            altitude,
            spacing,
            forward: true,
            centrency: (0.0, 0.0),
            waypoints: OnceCell::new(),
        })
    }

    /// Line from `start` to `end`.
    pub fn through(
        id: usize,
        start: (f64, f64),
        end: (f64, f64),
        altitude: f64,
        spacing: f64,
    ) -> Result<Self> {
        let d = (end.0 - start.0, end.1 - start.1);
        Self::new(id, start, d, d.0.hypot(d.1), altitude, spacing)
    }

    pub fn start(&self) -> (f64, f64) {
        self.start
    }

    /// Unit direction.
    pub fn direction(&self) -> (f64, f64) {
        self.direction
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    /// Nominal altitude used for waypoints that have not been adapted.
    pub fn altitude(&self) -> f64 {
        self.altitude
    }

    pub fn spacing(&self) -> f64 {
        self.spacing
    }

    /// False once the line has been mirrored an odd number of times.
    pub fn is_forward(&self) -> bool {
        self.forward
    }

    pub fn end(&self) -> (f64, f64) {
        self.point_at(self.length)
    }

    #[inline]
    pub fn point_at(&self, t: f64) -> (f64, f64) {
        (
            self.start.0 + t * self.direction.0,
            self.start.1 + t * self.direction.1,
        )
    }

    /// Parts of the line (as parameter ranges within `[0, length]`) that lie
    /// inside the union of `rings`.
    pub fn intersect(&self, rings: &[Vec<(f64, f64)>]) -> Vec<Interval> {
        let span = Interval::new(0.0, self.length);
        line_rings_intervals(self.start, self.direction, rings)
            .into_iter()
            .filter_map(|iv| iv.intersect(&span))
            .filter(|iv| iv.len() > EPSILON)
            .collect()
    }

    /// Sub-lines covering the inside parts of the line, in line order.
    pub fn clip(&self, rings: &[Vec<(f64, f64)>]) -> Vec<FlightLine> {
        self.intersect(rings)
            .into_iter()
            .map(|iv| FlightLine {
                id: self.id,
                start: self.point_at(iv.min),
                direction: self.direction,
                length: iv.len(),
                altitude: self.altitude,
                spacing: self.spacing,
                forward: self.forward,
                centrency: self.centrency,
                waypoints: OnceCell::new(),
            })
            .collect()
    }

    /// Extends the line by `before` metres ahead of its start and `after`
    /// metres past its end. Cached waypoints are discarded.
    pub fn enlarge(&mut self, before: f64, after: f64) {
        let before = before.max(-self.length);
        self.start = self.point_at(-before);
        self.length = (self.length + before + after).max(0.0);
        self.waypoints = OnceCell::new();
    }

    /// Reverses the flying direction.
    ///
    /// Already laid-out waypoints are kept (reversed, with flipped headings) so
    /// adapted altitudes survive.
    pub fn mirror(&mut self) {
        let (ux, uy) = self.centrency_shift();
        self.translate(-ux, -uy);
        self.start = self.end();
        self.direction = (-self.direction.0, -self.direction.1);
        self.forward = !self.forward;
        if let Some(waypoints) = self.waypoints.get_mut() {
            waypoints.reverse();
            for wp in waypoints.iter_mut() {
                wp.heading = -wp.heading;
            }
        }
        let (dx, dy) = self.centrency_shift();
        self.translate(dx, dy);
    }

    /// Moves the line by `(dx, dy)`, cached waypoints included.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.start = (self.start.0 + dx, self.start.1 + dy);
        if let Some(waypoints) = self.waypoints.get_mut() {
            for wp in waypoints.iter_mut() {
                wp.position.x += dx;
                wp.position.y += dy;
            }
        }
    }

    /// Shifts the line so that a photo whose usable area is centred at
    /// `centrency` (across track, along track, relative to nadir) has that
    /// centre on the unshifted track. The shift follows the flying direction:
    /// [`FlightLine::mirror`] moves the line to the other side. A previous
    /// compensation is replaced.
    pub fn compensate_centrency(&mut self, centrency: (f64, f64)) {
        let (ux, uy) = self.centrency_shift();
        self.translate(-ux, -uy);
        self.centrency = centrency;
        let (dx, dy) = self.centrency_shift();
        self.translate(dx, dy);
    }

    pub fn centrency(&self) -> (f64, f64) {
        self.centrency
    }

    fn centrency_shift(&self) -> (f64, f64) {
        let (cx, cy) = self.centrency;
        let (fx, fy) = self.direction;
        let right = (fy, -fx);
        (-(cx * right.0 + cy * fx), -(cx * right.1 + cy * fy))
    }

    /// Photo waypoints, laid out on first access.
    pub fn waypoints(&self) -> &[Waypoint] {
        self.waypoints.get_or_init(|| self.layout())
    }

    /// Mutable access to the waypoints (laid out first if needed).
    pub fn waypoints_mut(&mut self) -> &mut [Waypoint] {
        if self.waypoints.get().is_none() {
            let laid_out = self.layout();
            self.waypoints = OnceCell::from(laid_out);
        }
        self.waypoints
            .get_mut()
            .map(Vec::as_mut_slice)
            .unwrap_or_default()
    }

    /// Returns true if waypoints have been laid out.
    pub fn has_waypoints(&self) -> bool {
        self.waypoints.get().is_some()
    }

    /// Changes the waypoint spacing. Cached waypoints are discarded.
    pub fn set_spacing(&mut self, spacing: f64) {
        if spacing > 0.0 {
            self.spacing = spacing;
            self.waypoints = OnceCell::new();
        }
    }

    /// Sets the nominal altitude and moves every cached waypoint to it.
    pub fn set_altitude(&mut self, altitude: f64) {
        self.altitude = altitude;
        if let Some(waypoints) = self.waypoints.get_mut() {
            for wp in waypoints.iter_mut() {
                wp.position.z = altitude;
            }
        }
    }

    /// Renumbers the line and its cached waypoints.
    pub fn set_id(&mut self, id: usize) {
        self.id = id;
        if let Some(waypoints) = self.waypoints.get_mut() {
            for wp in waypoints.iter_mut() {
                wp.line_id = id;
            }
        }
    }

    /// Number of waypoints the layout produces.
    pub fn waypoint_count(&self) -> usize {
        match self.waypoints.get() {
            Some(w) => w.len(),
            None => layout_count(self.length, self.spacing),
        }
    }

    fn layout(&self) -> Vec<Waypoint> {
        let n = layout_count(self.length, self.spacing);
        let step = self.length / n as f64;
        let heading = Vector3::new(self.direction.0, self.direction.1, 0.0);
        (0..n)
            .map(|k| {
                let (x, y) = self.point_at((k as f64 + 0.5) * step);
                Waypoint::new(Point3::new(x, y, self.altitude), heading, self.id)
            })
            .collect()
    }
}

fn layout_count(length: f64, spacing: f64) -> usize {
    ((length / spacing - EPSILON).ceil() as usize).max(1)
}
