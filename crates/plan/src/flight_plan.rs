//! The flight plan aggregate.
//!
//! A plan is a small tree of [`PlanElement`]s: flight lines, loose waypoints
//! and labelled groups. All read-only traversals go through one generic
//! [`PlanElement::fold`]; in-place rewrites of lines go through
//! [`FlightPlan::walk_lines_mut`].

use crate::flight_line::FlightLine;
use crate::platform::PlatformDescription;
use crate::waypoint::Waypoint;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Recoverable problems found while computing a plan.
///
/// These are attached to the returned plan instead of failing the call, so a
/// caller can show a warning next to a partial result.
#[derive(Debug, Clone, PartialEq, Error)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RecomputeError {
    #[error("area is degenerate: {0}")]
    DegenerateArea(String),

    #[error("no flight line intersects the area")]
    NoFlightLines,

    #[error("coverage {ratio:.3} is below the required {required:.3}")]
    InsufficientCoverage { ratio: f64, required: f64 },

    #[error("elevation unavailable for line {line_id}: {reason}")]
    ElevationUnavailable { line_id: usize, reason: String },

    #[error("computation was cancelled")]
    Cancelled,
}

/// Node of the plan tree.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PlanElement {
    Line(FlightLine),
    Waypoint(Waypoint),
    Group {
        label: String,
        elements: Vec<PlanElement>,
    },
}

impl PlanElement {
    /// Folds over the subtree in flying order.
    pub fn fold<'a, A, L, W>(&'a self, init: A, on_line: &mut L, on_waypoint: &mut W) -> A
    where
        L: FnMut(A, &'a FlightLine) -> A,
        W: FnMut(A, &'a Waypoint) -> A,
    {
        match self {
            PlanElement::Line(line) => on_line(init, line),
            PlanElement::Waypoint(wp) => on_waypoint(init, wp),
            PlanElement::Group { elements, .. } => {
                let mut acc = init;
                for element in elements {
                    acc = element.fold(acc, on_line, on_waypoint);
                }
                acc
            }
        }
    }

    fn walk_lines_mut<F>(&mut self, f: &mut F)
    where
        F: FnMut(&mut FlightLine),
    {
        match self {
            PlanElement::Line(line) => f(line),
            PlanElement::Waypoint(_) => {}
            PlanElement::Group { elements, .. } => {
                for element in elements {
                    element.walk_lines_mut(f);
                }
            }
        }
    }

    /// Moves every line out of the subtree into `out`. Returns what is left,
    /// or `None` if nothing is.
    fn split_lines(self, out: &mut Vec<FlightLine>) -> Option<PlanElement> {
        match self {
            PlanElement::Line(line) => {
                out.push(line);
                None
            }
            PlanElement::Waypoint(wp) => Some(PlanElement::Waypoint(wp)),
            PlanElement::Group { label, elements } => {
                let kept: Vec<PlanElement> = elements
                    .into_iter()
                    .filter_map(|e| e.split_lines(out))
                    .collect();
                if kept.is_empty() {
                    None
                } else {
                    Some(PlanElement::Group {
                        label,
                        elements: kept,
                    })
                }
            }
        }
    }
}

/// Derived totals of a plan.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlanSummary {
    /// 3D path length through all waypoints in flying order (m).
    pub total_distance: f64,
    /// `total_distance` at cruise speed (s).
    pub estimated_duration_s: f64,
    pub photo_count: usize,
    pub line_count: usize,
    /// Covered fraction of the area, in `[0, 1]`.
    pub coverage_ratio: f64,
}

/// Ordered plan elements plus summary and recoverable errors.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FlightPlan {
    pub elements: Vec<PlanElement>,
    pub recompute_errors: Vec<RecomputeError>,
    pub summary: PlanSummary,
}

impl FlightPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty plan carrying a single error.
    pub fn failed(error: RecomputeError) -> Self {
        Self {
            recompute_errors: vec![error],
            ..Self::default()
        }
    }

    pub fn push(&mut self, element: PlanElement) {
        self.elements.push(element);
    }

    pub fn push_error(&mut self, error: RecomputeError) {
        self.recompute_errors.push(error);
    }

    /// Folds over all elements in flying order.
    pub fn fold<'a, A, L, W>(&'a self, init: A, mut on_line: L, mut on_waypoint: W) -> A
    where
        L: FnMut(A, &'a FlightLine) -> A,
        W: FnMut(A, &'a Waypoint) -> A,
    {
        let mut acc = init;
        for element in &self.elements {
            acc = element.fold(acc, &mut on_line, &mut on_waypoint);
        }
        acc
    }

    /// Applies `f` to every flight line in flying order.
    pub fn walk_lines_mut<F>(&mut self, f: &mut F)
    where
        F: FnMut(&mut FlightLine),
    {
        for element in &mut self.elements {
            element.walk_lines_mut(f);
        }
    }

    pub fn lines(&self) -> Vec<&FlightLine> {
        self.fold(
            Vec::new(),
            |mut acc, line| {
                acc.push(line);
                acc
            },
            |acc, _| acc,
        )
    }

    /// All waypoints in flying order, including those of flight lines.
    pub fn waypoints(&self) -> Vec<&Waypoint> {
        self.fold(
            Vec::new(),
            |mut acc, line| {
                acc.extend(line.waypoints());
                acc
            },
            |mut acc, wp| {
                acc.push(wp);
                acc
            },
        )
    }

    pub fn line_count(&self) -> usize {
        self.fold(0, |n, _| n + 1, |n, _| n)
    }

    pub fn photo_count(&self) -> usize {
        self.fold(0, |n, line| n + line.waypoint_count(), |n, _| n + 1)
    }

    /// True if the plan has nothing to fly.
    pub fn is_empty(&self) -> bool {
        self.photo_count() == 0
    }

    pub fn has_errors(&self) -> bool {
        !self.recompute_errors.is_empty()
    }

    /// Moves all flight lines out of the plan in flying order. Groups left
    /// empty are removed; loose waypoints stay.
    pub fn take_lines(&mut self) -> Vec<FlightLine> {
        let mut lines = Vec::new();
        self.elements = std::mem::take(&mut self.elements)
            .into_iter()
            .filter_map(|e| e.split_lines(&mut lines))
            .collect();
        lines
    }

    /// Recomputes the summary. `coverage` replaces the stored ratio when given.
    pub fn finalize(&mut self, platform: &PlatformDescription, coverage: Option<f64>) {
        let (distance, _) = self.fold(
            (0.0, None::<&Waypoint>),
            |(mut d, mut last), line| {
                for wp in line.waypoints() {
                    if let Some(prev) = last {
                        d += prev.distance_to(wp);
                    }
                    last = Some(wp);
                }
                (d, last)
            },
            |(mut d, last), wp| {
                if let Some(prev) = last {
                    d += prev.distance_to(wp);
                }
                (d, Some(wp))
            },
        );

        let photo_count = self.photo_count();
        let line_count = self.line_count();
        let coverage_ratio = coverage.unwrap_or(self.summary.coverage_ratio);
        let estimated_duration_s = if platform.cruise_speed > 0.0 {
            distance / platform.cruise_speed
        } else {
            0.0
        };

        self.summary = PlanSummary {
            total_distance: distance,
            estimated_duration_s,
            photo_count,
            line_count,
            coverage_ratio,
        };
        log::debug!(
            "plan finalized: {} lines, {} photos, {:.1} m, coverage {:.3}",
            line_count,
            photo_count,
            distance,
            coverage_ratio
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Point3, Vector3};

    fn line(id: usize, y: f64) -> FlightLine {
        FlightLine::through(id, (0.0, y), (30.0, y), 50.0, 10.0).unwrap()
    }

    fn sample_plan() -> FlightPlan {
        let mut plan = FlightPlan::new();
        plan.push(PlanElement::Waypoint(Waypoint::new(
            Point3::new(0.0, -10.0, 50.0),
            Vector3::y(),
            usize::MAX,
        )));
        plan.push(PlanElement::Group {
            label: "patch 0".into(),
            elements: vec![PlanElement::Line(line(0, 0.0)), PlanElement::Line(line(1, 10.0))],
        });
        plan
    }

    #[test]
    fn test_fold_counts() {
        let plan = sample_plan();
        assert_eq!(plan.line_count(), 2);
        assert_eq!(plan.photo_count(), 7);
        assert_eq!(plan.waypoints().len(), 7);
        assert_eq!(plan.lines()[1].id, 1);
        assert!(!plan.is_empty());
    }

    #[test]
    fn test_walk_lines_mut() {
        let mut plan = sample_plan();
        plan.walk_lines_mut(&mut |l: &mut FlightLine| l.set_altitude(99.0));
        assert!(plan.lines().iter().all(|l| l.altitude() == 99.0));
    }

    #[test]
    fn test_take_lines_removes_empty_groups() {
        let mut plan = sample_plan();
        let lines = plan.take_lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(plan.elements.len(), 1);
        assert!(matches!(plan.elements[0], PlanElement::Waypoint(_)));
    }

    #[test]
    fn test_finalize() {
        let mut plan = FlightPlan::new();
        plan.push(PlanElement::Line(line(0, 0.0)));
        let platform = PlatformDescription::builder()
            .with_cruise_speed(5.0)
            .build()
            .unwrap();
        plan.finalize(&platform, Some(0.97));
        // Waypoints at x = 5, 15, 25.
        assert_relative_eq!(plan.summary.total_distance, 20.0);
        assert_relative_eq!(plan.summary.estimated_duration_s, 4.0);
        assert_eq!(plan.summary.photo_count, 3);
        assert_eq!(plan.summary.line_count, 1);
        assert_relative_eq!(plan.summary.coverage_ratio, 0.97);

        plan.finalize(&platform, None);
        assert_relative_eq!(plan.summary.coverage_ratio, 0.97);
    }

    #[test]
    fn test_failed_plan() {
        let plan = FlightPlan::failed(RecomputeError::NoFlightLines);
        assert!(plan.is_empty());
        assert!(plan.has_errors());
        assert_eq!(
            plan.recompute_errors[0].to_string(),
            "no flight line intersects the area"
        );
    }
}
