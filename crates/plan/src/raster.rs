//! Rasterization: tiling a coverage area with parallel flight lines.
//!
//! # Algorithm
//!
//! For every patch of the area:
//!
//! 1. Build a local frame whose `u` axis is the patch's flight direction.
//! 2. Measure the patch's extent across that axis and split it into
//!    `n = max(1, ceil(extent / line_spacing))` equal strips; one candidate line
//!    runs through the middle of each strip, spanning the whole patch.
//! 3. Clip each candidate against the patch rings. A candidate with no inside
//!    part is discarded; one with several parts (concave polygon, corridor
//!    bends) yields several lines.
//! 4. Extend each part by the configured overshoot and alternate the flying
//!    direction of consecutive rows (boustrophedon).
//! 5. Shift each part against the photo's centrency, so the usable part of a
//!    tilted photo (not the nadir point) runs along the strip. The shift
//!    flips with the flying direction.
//!
//! Geometric problems never fail the call. They are attached to the returned
//! plan as [`RecomputeError`]s next to whatever could be computed.

use crate::area::CoverageArea;
use crate::camera::{PhotoProperties, SensorDescription};
use crate::coverage::{estimate_plan_coverage, CoverageConfig};
use crate::elevation::ElevationModel;
use crate::flight_line::FlightLine;
use crate::flight_plan::{FlightPlan, PlanElement, RecomputeError};
use crate::goal::Goal;
use crate::platform::PlatformDescription;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use u_survey_core::geometry::EPSILON;
use u_survey_core::transform::{Frame2D, AABB2D};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Margin added to candidate lines beyond the patch bounds (m).
const CANDIDATE_MARGIN: f64 = 1.0;

/// Rasterizer parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RasterConfig {
    /// Extension of every line beyond the area boundary at both ends (m).
    pub overshoot: f64,
    /// Coverage ratio below which the plan carries
    /// [`RecomputeError::InsufficientCoverage`].
    pub min_coverage: f64,
    /// Grid samples per axis for the coverage estimate.
    pub coverage_samples: usize,
    /// Fly every line in the same direction instead of back and forth.
    pub single_direction: bool,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            overshoot: 0.0,
            min_coverage: 0.95,
            coverage_samples: 100,
            single_direction: false,
        }
    }
}

impl RasterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_overshoot(mut self, metres: f64) -> Self {
        self.overshoot = metres.max(0.0);
        self
    }

    pub fn with_min_coverage(mut self, ratio: f64) -> Self {
        self.min_coverage = ratio.clamp(0.0, 1.0);
        self
    }

    pub fn with_coverage_samples(mut self, samples: usize) -> Self {
        self.coverage_samples = samples.max(1);
        self
    }

    pub fn with_single_direction(mut self, single: bool) -> Self {
        self.single_direction = single;
        self
    }
}

/// Tiles coverage areas with flight lines.
#[derive(Debug, Clone)]
pub struct Rasterizer {
    config: RasterConfig,
    cancelled: Arc<AtomicBool>,
}

impl Default for Rasterizer {
    fn default() -> Self {
        Self::new(RasterConfig::default())
    }
}

impl Rasterizer {
    pub fn new(config: RasterConfig) -> Self {
        Self {
            config,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Shares an external cancellation flag.
    pub fn with_cancel_handle(mut self, cancelled: Arc<AtomicBool>) -> Self {
        self.cancelled = cancelled;
        self
    }

    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }

    pub fn config(&self) -> &RasterConfig {
        &self.config
    }

    /// Computes the flight lines covering `area`.
    ///
    /// Lines fly at the goal's flying height above the ground found at the
    /// centre of their patch; terrain following is a separate step.
    pub fn rasterize<A, E>(
        &self,
        area: &A,
        sensor: &SensorDescription,
        platform: &PlatformDescription,
        elevation: &E,
        goal: &Goal,
        photo: &PhotoProperties,
    ) -> FlightPlan
    where
        A: CoverageArea + ?Sized,
        E: ElevationModel + ?Sized,
    {
        if let Err(err) = area.validate() {
            log::warn!("rasterization skipped: {err}");
            return FlightPlan::failed(RecomputeError::DegenerateArea(err.to_string()));
        }

        let line_spacing = photo.line_spacing(goal);
        let waypoint_spacing = photo
            .waypoint_spacing(goal)
            .max(platform.min_waypoint_separation);
        if !(line_spacing > EPSILON) || !(waypoint_spacing > EPSILON) {
            log::warn!("photo footprint too small to space lines ({line_spacing} m)");
            return FlightPlan::failed(RecomputeError::DegenerateArea(format!(
                "footprint too small: line spacing {line_spacing} m"
            )));
        }

        let above_ground = goal.flying_height(sensor);
        log::debug!(
            "rasterizing: line spacing {:.2} m, waypoint spacing {:.2} m, height {:.1} m",
            line_spacing,
            waypoint_spacing,
            above_ground
        );

        let mut plan = FlightPlan::new();
        let mut next_id = 0usize;
        let mut row = 0usize;
        let mut cancelled = false;

        'patches: for (patch_index, patch) in area.patches().iter().enumerate() {
            let Some(bounds) = AABB2D::from_points(patch.vertices()) else {
                continue;
            };
            let frame = Frame2D::from_angle(bounds.center(), patch.axis_angle);
            let Some(local) = frame.local_bounds(patch.vertices()) else {
                continue;
            };

            let altitude = ground_at(elevation, bounds.center()) + above_ground;
            let extent = local.height();
            let count = ((extent / line_spacing - EPSILON).ceil() as usize).max(1);
            let step = extent / count as f64;
            let length = local.width() + 2.0 * CANDIDATE_MARGIN;
            let mut elements = Vec::new();

            for i in 0..count {
                if self.cancelled.load(Ordering::Relaxed) {
                    cancelled = true;
                    if !elements.is_empty() {
                        plan.push(group(patch_index, elements));
                    }
                    break 'patches;
                }

                let v = local.min_y + (i as f64 + 0.5) * step;
                let start = frame.to_world((local.min_x - CANDIDATE_MARGIN, v));
                let candidate = match FlightLine::new(
                    next_id,
                    start,
                    frame.u,
                    length,
                    altitude,
                    waypoint_spacing,
                ) {
                    Ok(line) => line,
                    Err(err) => {
                        log::warn!("candidate line {i} rejected: {err}");
                        continue;
                    }
                };

                let mut parts = candidate.clip(&patch.rings);
                if parts.is_empty() {
                    log::trace!("candidate line {i} of patch {patch_index} misses the area");
                    continue;
                }

                let reversed = !self.config.single_direction && row % 2 == 1;
                if reversed {
                    parts.reverse();
                }
                for mut part in parts {
                    part.enlarge(self.config.overshoot, self.config.overshoot);
                    if reversed {
                        part.mirror();
                    }
                    part.compensate_centrency(photo.centrency);
                    part.set_id(next_id);
                    next_id += 1;
                    elements.push(PlanElement::Line(part));
                }
                row += 1;
            }

            if !elements.is_empty() {
                plan.push(group(patch_index, elements));
            }
        }

        if cancelled {
            log::debug!("rasterization cancelled after {next_id} lines");
            plan.push_error(RecomputeError::Cancelled);
            plan.finalize(platform, None);
            return plan;
        }

        if next_id == 0 {
            log::warn!("no flight line intersects the area");
            plan.push_error(RecomputeError::NoFlightLines);
            plan.finalize(platform, Some(0.0));
            return plan;
        }

        let coverage_config = CoverageConfig::new().with_samples(self.config.coverage_samples);
        let coverage = estimate_plan_coverage(area, &plan, photo, &coverage_config);
        if coverage < self.config.min_coverage {
            log::warn!(
                "coverage {:.3} below required {:.3}",
                coverage,
                self.config.min_coverage
            );
            plan.push_error(RecomputeError::InsufficientCoverage {
                ratio: coverage,
                required: self.config.min_coverage,
            });
        }

        plan.finalize(platform, Some(coverage));
        plan
    }

}

fn ground_at<E: ElevationModel + ?Sized>(elevation: &E, (x, y): (f64, f64)) -> f64 {
    elevation.elevation(x, y).unwrap_or_else(|err| {
        log::warn!("no elevation at patch centre ({x:.1}, {y:.1}), assuming 0: {err}");
        0.0
    })
}

fn group(patch_index: usize, elements: Vec<PlanElement>) -> PlanElement {
    PlanElement::Group {
        label: format!("patch {patch_index}"),
        elements,
    }
}
