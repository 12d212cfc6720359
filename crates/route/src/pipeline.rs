//! End-to-end flight plan computation.
//!
//! The stages run in a fixed order on the calling thread:
//!
//! 1. validate inputs and compute photo properties (configuration errors are
//!    returned as `Err` before any geometry runs),
//! 2. rasterize the area into flight lines,
//! 3. reorder the lines with the annealer,
//! 4. extend line ends so turns respect the platform's turn radius,
//! 5. adapt altitudes to the terrain,
//! 6. recompute the plan summary, timed at the survey speed.
//!
//! Geometric problems are attached to the returned plan as
//! [`RecomputeError`]s. Cancellation stops the pipeline at the next stage
//! boundary (or inside the rasterizer and annealer) and returns what has been
//! computed so far.

use crate::config::RouteConfig;
use crate::context::PlanningContext;
use crate::optimize::optimize_plan;
use u_survey_core::Result;
use u_survey_plan::{
    adapt_plan_to_terrain, assure_turn_radius, compute_photo_properties, CameraTiming,
    CoverageArea, ElevationModel, FlightPlan, Goal, PlatformDescription, RasterConfig,
    Rasterizer, RecomputeError, SensorDescription, TerrainConfig, Tilt,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Options for [`compute_flight_plan`].
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PipelineOptions {
    pub raster: RasterConfig,
    pub route: RouteConfig,
    /// Reorder lines with the annealer.
    pub optimize: bool,
    /// Follow the terrain instead of flying at one altitude.
    pub terrain_following: bool,
    /// Terrain settings. `agl` is replaced by the goal's flying height.
    pub terrain: TerrainConfig,
    /// Camera limits. When set, the plan is timed at the fastest speed the
    /// camera allows instead of cruise speed, if that is slower.
    pub camera_timing: Option<CameraTiming>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            raster: RasterConfig::default(),
            route: RouteConfig::default(),
            optimize: true,
            terrain_following: true,
            terrain: TerrainConfig::default(),
            camera_timing: None,
        }
    }
}

impl PipelineOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_raster(mut self, raster: RasterConfig) -> Self {
        self.raster = raster;
        self
    }

    pub fn with_route(mut self, route: RouteConfig) -> Self {
        self.route = route;
        self
    }

    pub fn with_optimize(mut self, optimize: bool) -> Self {
        self.optimize = optimize;
        self
    }

    pub fn with_terrain_following(mut self, enabled: bool) -> Self {
        self.terrain_following = enabled;
        self
    }

    pub fn with_terrain(mut self, terrain: TerrainConfig) -> Self {
        self.terrain = terrain;
        self
    }

    pub fn with_camera_timing(mut self, timing: CameraTiming) -> Self {
        self.camera_timing = Some(timing);
        self
    }
}

/// Computes a complete flight plan in a fresh [`PlanningContext`].
pub fn compute_flight_plan<A, E>(
    area: &A,
    sensor: &SensorDescription,
    platform: &PlatformDescription,
    elevation: &E,
    goal: &Goal,
    tilt: Option<Tilt>,
    options: &PipelineOptions,
) -> Result<FlightPlan>
where
    A: CoverageArea + ?Sized,
    E: ElevationModel + ?Sized,
{
    let mut context = PlanningContext::new();
    compute_flight_plan_with_context(
        area,
        sensor,
        platform,
        elevation,
        goal,
        tilt,
        options,
        &mut context,
    )
}

/// Computes a complete flight plan within `context`.
#[allow(clippy::too_many_arguments)]
pub fn compute_flight_plan_with_context<A, E>(
    area: &A,
    sensor: &SensorDescription,
    platform: &PlatformDescription,
    elevation: &E,
    goal: &Goal,
    tilt: Option<Tilt>,
    options: &PipelineOptions,
    context: &mut PlanningContext<'_>,
) -> Result<FlightPlan>
where
    A: CoverageArea + ?Sized,
    E: ElevationModel + ?Sized,
{
    platform.validate()?;
    let photo = compute_photo_properties(sensor, goal.flying_height(sensor), tilt)?;
    let survey_speed = match &options.camera_timing {
        Some(timing) => photo
            .max_survey_speed(timing, goal, platform)?
            .min(platform.cruise_speed),
        None => platform.cruise_speed,
    };

    let rasterizer =
        Rasterizer::new(options.raster.clone()).with_cancel_handle(context.cancel_handle());
    let mut plan = rasterizer.rasterize(area, sensor, platform, elevation, goal, &photo);
    if plan.is_empty() || plan.recompute_errors.contains(&RecomputeError::Cancelled) {
        return Ok(plan);
    }

    if options.optimize {
        let mut route = options.route.clone();
        if let Some(seed) = context.seed() {
            route.sa = route.sa.with_seed(seed);
        }
        let cancel = context.cancel_handle();
        let result = optimize_plan(&mut plan, &route, cancel, |event| context.notify(event));
        if result.cancelled {
            plan.push_error(RecomputeError::Cancelled);
            plan.finalize(platform, None);
            return Ok(plan);
        }
    }

    if context.is_cancelled() {
        plan.push_error(RecomputeError::Cancelled);
        plan.finalize(platform, None);
        return Ok(plan);
    }

    assure_turn_radius(&mut plan, platform);

    if options.terrain_following {
        let terrain = options.terrain.clone().with_goal(goal, sensor);
        adapt_plan_to_terrain(&mut plan, elevation, platform, &terrain);
    }

    plan.finalize(platform, None);
    if survey_speed < platform.cruise_speed {
        log::warn!(
            "camera limits the survey speed to {:.1} m/s (cruise {:.1} m/s)",
            survey_speed,
            platform.cruise_speed
        );
        plan.summary.estimated_duration_s = plan.summary.total_distance / survey_speed;
    }
    log::info!(
        "flight plan: {} lines, {} photos, {:.0} m, {:.0} s, {} warnings",
        plan.summary.line_count,
        plan.summary.photo_count,
        plan.summary.total_distance,
        plan.summary.estimated_duration_s,
        plan.recompute_errors.len()
    );
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::sync::atomic::Ordering;
    use u_survey_core::sa::SaConfig;
    use u_survey_core::Error;
    use u_survey_plan::{FlatElevation, Polygon};

    fn sensor() -> SensorDescription {
        SensorDescription::builder()
            .with_focal_length_mm(10.0)
            .with_sensor_size_mm(20.0, 15.0)
            .with_resolution(4000, 3000)
            .build()
            .unwrap()
    }

    fn goal() -> Goal {
        Goal::builder()
            .with_altitude(10.0)
            .with_overlap_in_flight(60.0)
            .with_overlap_parallel(50.0)
            .build()
            .unwrap()
    }

    fn options() -> PipelineOptions {
        PipelineOptions::new().with_route(
            RouteConfig::new().with_sa(SaConfig::new().with_seed(5).with_restarts(2)),
        )
    }

    #[test]
    fn test_square() {
        let plan = compute_flight_plan(
            &Polygon::rectangle(100.0, 100.0),
            &sensor(),
            &PlatformDescription::default(),
            &FlatElevation(20.0),
            &goal(),
            None,
            &options(),
        )
        .unwrap();
        assert!(!plan.has_errors(), "{:?}", plan.recompute_errors);
        assert_eq!(plan.summary.line_count, 10);
        assert_eq!(plan.summary.photo_count, 170);
        assert!(plan.waypoints().iter().all(|w| (w.altitude() - 30.0).abs() < 1e-9));
    }

    #[test]
    fn test_turn_radius_extends_lines() {
        let platform = PlatformDescription::builder()
            .with_turn_radius(25.0)
            .build()
            .unwrap();
        let plan = compute_flight_plan(
            &Polygon::rectangle(100.0, 100.0),
            &sensor(),
            &platform,
            &FlatElevation(0.0),
            &goal(),
            None,
            &options(),
        )
        .unwrap();
        assert_eq!(plan.summary.line_count, 10);
        assert!(plan.lines().iter().any(|l| l.length() > 101.0));
        assert!(plan.summary.photo_count > 170);
    }

    #[test]
    fn test_camera_timing_slows_survey() {
        let platform = PlatformDescription::default();
        let base = compute_flight_plan(
            &Polygon::rectangle(100.0, 100.0),
            &sensor(),
            &platform,
            &FlatElevation(0.0),
            &goal(),
            None,
            &options(),
        )
        .unwrap();
        assert_relative_eq!(
            base.summary.estimated_duration_s,
            base.summary.total_distance / platform.cruise_speed,
            epsilon = 1e-9
        );

        // 6 m between photos and a 2 s trigger interval: 3 m/s.
        let timed = compute_flight_plan(
            &Polygon::rectangle(100.0, 100.0),
            &sensor(),
            &platform,
            &FlatElevation(0.0),
            &goal(),
            None,
            &options().with_camera_timing(CameraTiming::new(0.001, 1.0, 2.0)),
        )
        .unwrap();
        assert_relative_eq!(
            timed.summary.estimated_duration_s,
            timed.summary.total_distance / 3.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_invalid_platform_fails_fast() {
        let platform = PlatformDescription {
            cruise_speed: 0.0,
            ..PlatformDescription::default()
        };
        let result = compute_flight_plan(
            &Polygon::rectangle(100.0, 100.0),
            &sensor(),
            &platform,
            &FlatElevation(0.0),
            &goal(),
            None,
            &options(),
        );
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_tilt_beyond_horizon_fails_fast() {
        let result = compute_flight_plan(
            &Polygon::rectangle(100.0, 100.0),
            &sensor(),
            &PlatformDescription::default(),
            &FlatElevation(0.0),
            &goal(),
            Some(Tilt::new(80.0, 0.0)),
            &options(),
        );
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_cancelled_context() {
        let mut context = PlanningContext::new();
        context.cancel_handle().store(true, Ordering::Relaxed);
        let plan = compute_flight_plan_with_context(
            &Polygon::rectangle(100.0, 100.0),
            &sensor(),
            &PlatformDescription::default(),
            &FlatElevation(0.0),
            &goal(),
            None,
            &options(),
            &mut context,
        )
        .unwrap();
        assert!(plan.recompute_errors.contains(&RecomputeError::Cancelled));
    }
}
