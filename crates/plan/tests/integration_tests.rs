//! Integration tests for u-survey-plan.

use u_survey_plan::{
    adapt_plan_to_terrain, compute_photo_properties, Corridor, CoverageArea, Error,
    FlatElevation, FlightPlan, FnElevation, Goal, PhotoProperties, PlatformDescription, Polygon,
    RasterConfig, Rasterizer, RecomputeError, SensorDescription, TerrainConfig, Tilt,
};

/// Camera with a 20 m x 15 m footprint at 10 m.
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

fn photo(sensor: &SensorDescription, goal: &Goal) -> PhotoProperties {
    compute_photo_properties(sensor, goal.altitude(sensor), None).unwrap()
}

fn rasterize(area: &dyn CoverageArea) -> FlightPlan {
    let sensor = sensor();
    let goal = goal();
    let photo = photo(&sensor, &goal);
    Rasterizer::new(RasterConfig::default()).rasterize(
        area,
        &sensor,
        &PlatformDescription::default(),
        &FlatElevation(0.0),
        &goal,
        &photo,
    )
}

mod photo_tests {
    use super::*;

    #[test]
    fn test_spacing_from_overlap() {
        let sensor = sensor();
        let goal = goal();
        let photo = photo(&sensor, &goal);
        assert!((photo.width - 20.0).abs() < 1e-9);
        assert!((photo.height - 15.0).abs() < 1e-9);
        assert!((photo.line_spacing(&goal) - 10.0).abs() < 1e-9);
        assert!((photo.waypoint_spacing(&goal) - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_oblique_photo_is_less_efficient() {
        let sensor = sensor();
        let nadir = compute_photo_properties(&sensor, 50.0, None).unwrap();
        let oblique = compute_photo_properties(&sensor, 50.0, Some(Tilt::new(25.0, 0.0))).unwrap();
        assert!(oblique.efficiency < nadir.efficiency);
        assert!(oblique.height > nadir.height);
        assert!(oblique.pixel_enlarging_center > 1.0);
    }

    #[test]
    fn test_invalid_inputs_fail_fast() {
        let sensor = sensor();
        assert!(matches!(
            compute_photo_properties(&sensor, 0.0, None),
            Err(Error::InvalidConfig(_))
        ));
        assert!(Goal::builder().with_gsd(0.0).build().is_err());
        assert!(Goal::builder()
            .with_altitude(50.0)
            .with_overlap_parallel(100.0)
            .build()
            .is_err());
        assert!(SensorDescription::builder()
            .with_focal_length_mm(-1.0)
            .build()
            .is_err());
    }
}

mod raster_tests {
    use super::*;

    #[test]
    fn test_square_scenario() {
        let plan = rasterize(&Polygon::rectangle(100.0, 100.0));
        assert!(!plan.has_errors());
        assert_eq!(plan.lines().len(), 10);
        for line in plan.lines() {
            assert_eq!(line.waypoints().len(), 17);
        }
        assert!(plan.summary.coverage_ratio >= 0.95);
        assert!(plan.summary.total_distance > 1000.0);
    }

    #[test]
    fn test_line_count_matches_width() {
        // 37 m across the flight direction: ceil(37 / 10) = 4 lines.
        let plan = rasterize(&Polygon::rectangle(120.0, 37.0));
        assert_eq!(plan.line_count(), 4);
    }

    #[test]
    fn test_rotated_convex_area_is_covered() {
        let hexagon: Vec<(f64, f64)> = (0..6)
            .map(|k| {
                let a = 0.3 + k as f64 * std::f64::consts::PI / 3.0;
                (60.0 * a.cos(), 40.0 * a.sin())
            })
            .collect();
        let plan = rasterize(&Polygon::new(hexagon));
        assert!(!plan.is_empty());
        assert!(
            plan.summary.coverage_ratio >= 0.95,
            "coverage {}",
            plan.summary.coverage_ratio
        );
    }

    #[test]
    fn test_concave_area_splits_lines() {
        let u = Polygon::new(vec![
            (0.0, 0.0),
            (100.0, 0.0),
            (100.0, 100.0),
            (70.0, 100.0),
            (70.0, 30.0),
            (30.0, 30.0),
            (30.0, 100.0),
            (0.0, 100.0),
        ]);
        let plan = rasterize(&u);
        assert!(plan.line_count() > 10);
        for line in plan.lines() {
            let mid = line.point_at(0.5 * line.length());
            assert!(!(mid.0 > 30.5 && mid.0 < 69.5 && mid.1 > 30.5));
        }
    }

    #[test]
    fn test_degenerate_areas_yield_empty_plans() {
        let point = Polygon::new(vec![(5.0, 5.0), (5.0, 5.0), (5.0, 5.0)]);
        let segment = Polygon::new(vec![(0.0, 0.0), (10.0, 10.0), (20.0, 20.0)]);
        for area in [point, segment] {
            let plan = rasterize(&area);
            assert!(plan.is_empty());
            assert!(matches!(
                plan.recompute_errors.as_slice(),
                [RecomputeError::DegenerateArea(_)]
            ));
        }
    }

    #[test]
    fn test_corridor_is_covered() {
        let corridor = Corridor::new(
            vec![(0.0, 0.0), (150.0, 20.0), (300.0, 0.0), (300.0, 150.0)],
            30.0,
        );
        let plan = rasterize(&corridor);
        assert!(!plan.is_empty());
        assert!(
            plan.summary.coverage_ratio >= 0.95,
            "coverage {}",
            plan.summary.coverage_ratio
        );
    }
}

mod terrain_tests {
    use super::*;

    fn rough(x: f64, y: f64) -> Result<f64, Error> {
        Ok(15.0 * (x / 23.0).sin() * (y / 31.0).cos() + 0.1 * x)
    }

    #[test]
    fn test_plan_adaptation_is_idempotent() {
        let mut plan = rasterize(&Polygon::rectangle(200.0, 60.0));
        let terrain = FnElevation(rough);
        let platform = PlatformDescription::default();
        let config = TerrainConfig::new().with_agl(40.0).with_tolerance(2.0);

        assert_eq!(adapt_plan_to_terrain(&mut plan, &terrain, &platform, &config), plan.line_count());
        let once: Vec<f64> = plan.waypoints().iter().map(|w| w.altitude()).collect();

        adapt_plan_to_terrain(&mut plan, &terrain, &platform, &config);
        let twice: Vec<f64> = plan.waypoints().iter().map(|w| w.altitude()).collect();

        assert_eq!(once.len(), twice.len());
        for (a, b) in once.iter().zip(&twice) {
            assert!((a - b).abs() < 1e-9);
        }
        for wp in plan.waypoints() {
            let (x, y) = wp.ground_point();
            assert!(wp.altitude() >= rough(x, y).unwrap() + 40.0 - 1e-9);
        }
    }

    #[test]
    fn test_elevation_failure_only_affects_one_line() {
        let mut plan = rasterize(&Polygon::rectangle(100.0, 30.0));
        let before: Vec<f64> = plan.lines()[0].waypoints().iter().map(|w| w.altitude()).collect();
        // Fails only along the first line (y = 5).
        let flaky = FnElevation(|_x: f64, y: f64| {
            if (y - 5.0).abs() < 1.0 {
                Err(Error::Elevation("tile unavailable".into()))
            } else {
                Ok(0.0)
            }
        });
        let adapted = adapt_plan_to_terrain(
            &mut plan,
            &flaky,
            &PlatformDescription::default(),
            &TerrainConfig::new().with_agl(30.0),
        );
        assert_eq!(adapted, 2);
        assert!(matches!(
            plan.recompute_errors.as_slice(),
            [RecomputeError::ElevationUnavailable { line_id: 0, .. }]
        ));
        let after: Vec<f64> = plan.lines()[0].waypoints().iter().map(|w| w.altitude()).collect();
        assert_eq!(before, after);
        assert!(plan.lines()[1]
            .waypoints()
            .iter()
            .all(|w| (w.altitude() - 30.0).abs() < 1e-9));
    }
}
