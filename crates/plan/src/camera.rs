//! Sensor description and derived photo properties.
//!
//! # Frames
//!
//! The camera sits at height `altitude` above a flat ground plane. In the
//! photo frame `x` points across track (right of the flight direction) and
//! `y` along track. A nadir camera looks down `-z`; a [`Tilt`] pitches the
//! view forward (rotation about `x`) and rolls it sideways (rotation about `y`).
//!
//! # Effective footprint
//!
//! A tilted footprint is a trapezoid or general quadrilateral. Overlap
//! spacing uses the largest axis-aligned rectangle that fits inside it, so
//! the guaranteed overlap holds across the whole photo and not only at its
//! widest part.

use crate::goal::Goal;
use crate::platform::PlatformDescription;
use nalgebra::{Rotation3, Vector3};
use u_survey_core::geometry;
use u_survey_core::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Height levels sampled when searching the inscribed rectangle.
const RECT_SEARCH_LEVELS: usize = 64;

/// Rays closer than this to horizontal are treated as never hitting ground.
const HORIZON_EPSILON: f64 = 1e-6;

/// Optics and pixel array of a camera.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SensorDescription {
    focal_length_mm: f64,
    sensor_width_mm: f64,
    sensor_height_mm: f64,
    resolution_x: u32,
    resolution_y: u32,
    principal_shift_mm: (f64, f64),
}

impl SensorDescription {
    pub fn builder() -> SensorBuilder {
        SensorBuilder::new()
    }

    pub fn focal_length_mm(&self) -> f64 {
        self.focal_length_mm
    }

    /// Physical sensor size `(width, height)` in millimetres.
    pub fn sensor_size_mm(&self) -> (f64, f64) {
        (self.sensor_width_mm, self.sensor_height_mm)
    }

    /// Resolution `(x, y)` in pixels.
    pub fn resolution(&self) -> (u32, u32) {
        (self.resolution_x, self.resolution_y)
    }

    pub fn principal_shift_mm(&self) -> (f64, f64) {
        self.principal_shift_mm
    }

    /// Size of one pixel in millimetres (the coarser axis for non-square pixels).
    pub fn pixel_pitch_mm(&self) -> f64 {
        let px = self.sensor_width_mm / f64::from(self.resolution_x);
        let py = self.sensor_height_mm / f64::from(self.resolution_y);
        px.max(py)
    }

    /// Nadir ground sample distance (m/px) at `altitude` metres.
    pub fn gsd_at(&self, altitude: f64) -> f64 {
        altitude * self.pixel_pitch_mm() / self.focal_length_mm
    }

    /// Altitude at which a nadir photo has the given GSD.
    pub fn altitude_for_gsd(&self, gsd: f64) -> f64 {
        gsd * self.focal_length_mm / self.pixel_pitch_mm()
    }
}

/// Builder for [`SensorDescription`].
#[derive(Debug, Clone)]
pub struct SensorBuilder {
    focal_length_mm: f64,
    sensor_width_mm: f64,
    sensor_height_mm: f64,
    resolution_x: u32,
    resolution_y: u32,
    principal_shift_mm: (f64, f64),
}

impl Default for SensorBuilder {
    /// Full-frame sensor with a 35 mm lens.
    fn default() -> Self {
        Self {
            focal_length_mm: 35.0,
            sensor_width_mm: 36.0,
            sensor_height_mm: 24.0,
            resolution_x: 6000,
            resolution_y: 4000,
            principal_shift_mm: (0.0, 0.0),
        }
    }
}

impl SensorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_focal_length_mm(mut self, focal: f64) -> Self {
        self.focal_length_mm = focal;
        self
    }

    /// Sensor width (across track) and height (along track) in millimetres.
    pub fn with_sensor_size_mm(mut self, width: f64, height: f64) -> Self {
        self.sensor_width_mm = width;
        self.sensor_height_mm = height;
        self
    }

    pub fn with_resolution(mut self, x: u32, y: u32) -> Self {
        self.resolution_x = x;
        self.resolution_y = y;
        self
    }

    pub fn with_principal_shift_mm(mut self, dx: f64, dy: f64) -> Self {
        self.principal_shift_mm = (dx, dy);
        self
    }

    pub fn build(self) -> Result<SensorDescription> {
        if !(self.focal_length_mm > 0.0) {
            return Err(Error::config(format!(
                "focal length must be positive, got {}",
                self.focal_length_mm
            )));
        }
        if !(self.sensor_width_mm > 0.0) || !(self.sensor_height_mm > 0.0) {
            return Err(Error::config("sensor size must be positive"));
        }
        if self.resolution_x == 0 || self.resolution_y == 0 {
            return Err(Error::config("sensor resolution must be positive"));
        }
        if !self.principal_shift_mm.0.is_finite() || !self.principal_shift_mm.1.is_finite() {
            return Err(Error::config("principal point shift must be finite"));
        }
        Ok(SensorDescription {
            focal_length_mm: self.focal_length_mm,
            sensor_width_mm: self.sensor_width_mm,
            sensor_height_mm: self.sensor_height_mm,
            resolution_x: self.resolution_x,
            resolution_y: self.resolution_y,
            principal_shift_mm: self.principal_shift_mm,
        })
    }
}

/// Camera tilt relative to nadir, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Tilt {
    /// Forward tilt (positive looks ahead of the aircraft).
    pub pitch_deg: f64,
    /// Sideways tilt.
    pub roll_deg: f64,
}

impl Tilt {
    pub fn new(pitch_deg: f64, roll_deg: f64) -> Self {
        Self {
            pitch_deg,
            roll_deg,
        }
    }

    pub fn nadir() -> Self {
        Self::default()
    }

    pub fn is_nadir(&self) -> bool {
        self.pitch_deg == 0.0 && self.roll_deg == 0.0
    }

    /// Rotation from the nadir camera frame to the tilted one.
    pub fn rotation(&self) -> Rotation3<f64> {
        Rotation3::from_axis_angle(&Vector3::x_axis(), self.pitch_deg.to_radians())
            * Rotation3::from_axis_angle(&Vector3::y_axis(), self.roll_deg.to_radians())
    }
}

/// Exposure and trigger limits of a camera.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CameraTiming {
    /// Exposure time (s).
    pub exposure_s: f64,
    /// Tolerated motion blur (px).
    pub max_blur_px: f64,
    /// Shortest time between two photos (s).
    pub min_trigger_interval_s: f64,
}

impl Default for CameraTiming {
    fn default() -> Self {
        Self {
            exposure_s: 0.001,
            max_blur_px: 1.0,
            min_trigger_interval_s: 1.0,
        }
    }
}

impl CameraTiming {
    pub fn new(exposure_s: f64, max_blur_px: f64, min_trigger_interval_s: f64) -> Self {
        Self {
            exposure_s,
            max_blur_px,
            min_trigger_interval_s,
        }
    }
}

/// Ground projection of one photo. Derived from sensor, altitude and tilt;
/// recompute whenever one of them changes.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PhotoProperties {
    /// Altitude the properties were computed for.
    pub altitude: f64,
    /// Ground corners in the photo frame, relative to the nadir point.
    pub footprint: [(f64, f64); 4],
    /// Across-track extent of the footprint.
    pub width: f64,
    /// Along-track extent of the footprint.
    pub height: f64,
    /// Across-track size of the inscribed rectangle.
    pub effective_width: f64,
    /// Along-track size of the inscribed rectangle.
    pub effective_height: f64,
    /// Centre of the inscribed rectangle relative to the nadir point.
    pub centrency: (f64, f64),
    /// Inscribed rectangle area over footprint area, in `(0, 1]`.
    pub efficiency: f64,
    /// Ground resolution loss along the principal ray relative to nadir (>= 1).
    pub pixel_enlarging_center: f64,
    /// GSD along the principal ray (m/px).
    pub gsd: f64,
}

impl PhotoProperties {
    /// Distance between adjacent flight lines for the goal's parallel overlap.
    pub fn line_spacing(&self, goal: &Goal) -> f64 {
        self.effective_width * (1.0 - goal.overlap_parallel() / 100.0)
    }

    /// Distance between consecutive photos for the goal's in-flight overlap.
    pub fn waypoint_spacing(&self, goal: &Goal) -> f64 {
        self.effective_height * (1.0 - goal.overlap_in_flight() / 100.0)
    }

    /// Highest ground speed that keeps motion blur below `max_blur_px` pixels.
    pub fn max_ground_speed_for_blur(&self, exposure_s: f64, max_blur_px: f64) -> Result<f64> {
        if !(exposure_s > 0.0) || !(max_blur_px > 0.0) {
            return Err(Error::config(
                "exposure time and blur limit must be positive",
            ));
        }
        Ok(max_blur_px * self.gsd / exposure_s)
    }

    /// Highest ground speed at which the camera can still trigger at every
    /// waypoint, given its minimum trigger interval.
    pub fn max_ground_speed_for_interval(&self, min_interval_s: f64, goal: &Goal) -> Result<f64> {
        if !(min_interval_s > 0.0) {
            return Err(Error::config("trigger interval must be positive"));
        }
        Ok(self.waypoint_spacing(goal) / min_interval_s)
    }

    /// Fastest survey speed the camera and the platform allow: the lower of
    /// the blur and trigger-interval limits, capped at the platform's
    /// maximum speed.
    pub fn max_survey_speed(
        &self,
        timing: &CameraTiming,
        goal: &Goal,
        platform: &PlatformDescription,
    ) -> Result<f64> {
        let blur = self.max_ground_speed_for_blur(timing.exposure_s, timing.max_blur_px)?;
        let interval = self.max_ground_speed_for_interval(timing.min_trigger_interval_s, goal)?;
        Ok(blur.min(interval).min(platform.max_speed))
    }

    /// Footprint placed at `center` with the photo's `y` axis along `heading`.
    pub fn footprint_world(&self, center: (f64, f64), heading: (f64, f64)) -> Vec<(f64, f64)> {
        let forward = geometry::normalize(heading).unwrap_or((0.0, 1.0));
        let right = (forward.1, -forward.0);
        self.footprint
            .iter()
            .map(|&(x, y)| {
                (
                    center.0 + x * right.0 + y * forward.0,
                    center.1 + x * right.1 + y * forward.1,
                )
            })
            .collect()
    }
}

/// Projects the sensor through the lens onto flat ground.
///
/// Returns `Error::InvalidConfig` for a non-positive altitude or when a corner
/// ray does not reach the ground (tilt at or beyond the horizon).
pub fn compute_photo_properties(
    sensor: &SensorDescription,
    altitude: f64,
    tilt: Option<Tilt>,
) -> Result<PhotoProperties> {
    if !(altitude > 0.0) {
        return Err(Error::config(format!(
            "altitude must be positive, got {altitude}"
        )));
    }
    if !(sensor.focal_length_mm > 0.0) {
        return Err(Error::config("focal length must be positive"));
    }

    let rotation = tilt.unwrap_or_default().rotation();
    let (sx, sy) = sensor.principal_shift_mm;
    let hw = 0.5 * sensor.sensor_width_mm;
    let hh = 0.5 * sensor.sensor_height_mm;
    let f = sensor.focal_length_mm;

    let project = |v: Vector3<f64>| -> Result<(f64, f64)> {
        let d = rotation * v.normalize();
        if d.z > -HORIZON_EPSILON {
            return Err(Error::config("camera ray does not reach the ground"));
        }
        let s = altitude / -d.z;
        Ok((s * d.x, s * d.y))
    };

    let mut footprint = [(0.0, 0.0); 4];
    let corners = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];
    for (slot, (cx, cy)) in footprint.iter_mut().zip(corners) {
        *slot = project(Vector3::new(cx * hw + sx, cy * hh + sy, -f))?;
    }

    let min_x = footprint.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
    let max_x = footprint.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
    let min_y = footprint.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
    let max_y = footprint.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);

    let (x0, x1, y0, y1) = inscribed_rectangle(&footprint, min_y, max_y);
    let effective_width = x1 - x0;
    let effective_height = y1 - y0;
    let footprint_area = geometry::area(&footprint);
    let efficiency = if footprint_area > 0.0 {
        (effective_width * effective_height / footprint_area).min(1.0)
    } else {
        0.0
    };

    let principal = rotation * Vector3::new(sx, sy, -f).normalize();
    let pixel_enlarging_center = 1.0 / -principal.z;

    log::debug!(
        "photo at {altitude:.1} m: footprint {:.1} x {:.1} m, effective {:.1} x {:.1} m",
        max_x - min_x,
        max_y - min_y,
        effective_width,
        effective_height
    );

    Ok(PhotoProperties {
        altitude,
        footprint,
        width: max_x - min_x,
        height: max_y - min_y,
        effective_width,
        effective_height,
        centrency: (0.5 * (x0 + x1), 0.5 * (y0 + y1)),
        efficiency,
        pixel_enlarging_center,
        gsd: sensor.gsd_at(altitude) * pixel_enlarging_center,
    })
}

/// Horizontal slice `[x_lo, x_hi]` of a convex ring at height `y`.
fn slice_at(ring: &[(f64, f64)], y: f64) -> Option<(f64, f64)> {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    let n = ring.len();
    for i in 0..n {
        let a = ring[i];
        let b = ring[(i + 1) % n];
        if y < a.1.min(b.1) || y > a.1.max(b.1) {
            continue;
        }
        if a.1 == b.1 {
            lo = lo.min(a.0.min(b.0));
            hi = hi.max(a.0.max(b.0));
        } else {
            let x = a.0 + (y - a.1) * (b.0 - a.0) / (b.1 - a.1);
            lo = lo.min(x);
            hi = hi.max(x);
        }
    }
    (lo <= hi).then_some((lo, hi))
}

/// Largest axis-aligned rectangle `(x0, x1, y0, y1)` inside a convex quad.
///
/// For a convex ring the slice bounds are convex/concave in `y`, so the
/// rectangle between two heights is limited by the slices at those heights.
fn inscribed_rectangle(ring: &[(f64, f64)], min_y: f64, max_y: f64) -> (f64, f64, f64, f64) {
    let levels: Vec<(f64, Option<(f64, f64)>)> = (0..=RECT_SEARCH_LEVELS)
        .map(|k| {
            let y = if k == RECT_SEARCH_LEVELS {
                max_y
            } else {
                min_y + (max_y - min_y) * k as f64 / RECT_SEARCH_LEVELS as f64
            };
            (y, slice_at(ring, y))
        })
        .collect();

    let mut best = (0.0, 0.0, min_y, min_y);
    let mut best_area = -1.0;
    for (a, &(ya, sa)) in levels.iter().enumerate() {
        let Some((lo_a, hi_a)) = sa else { continue };
        for &(yb, sb) in &levels[a + 1..] {
            let Some((lo_b, hi_b)) = sb else { continue };
            let lo = lo_a.max(lo_b);
            let hi = hi_a.min(hi_b);
            if hi <= lo {
                continue;
            }
            let area = (hi - lo) * (yb - ya);
            if area > best_area {
                best_area = area;
                best = (lo, hi, ya, yb);
            }
        }
    }
    best
}
