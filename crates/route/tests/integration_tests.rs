//! Integration tests for u-survey-route.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use u_survey_core::sa::{FnStrategy, SaConfig, SaEvent, SaRunner, Tour};
use u_survey_core::Error;
use u_survey_plan::{
    Corridor, FlatElevation, FlightLine, FlightPlan, FnElevation, Goal, PlanElement,
    PlatformDescription, Polygon, RecomputeError, SensorDescription, Tilt,
};
use u_survey_route::{
    compute_flight_plan, compute_flight_plan_with_context, optimize_plan, PipelineOptions,
    PlanningContext, RouteConfig,
};

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

fn options(seed: u64) -> PipelineOptions {
    PipelineOptions::new().with_route(
        RouteConfig::new().with_sa(SaConfig::new().with_seed(seed).with_restarts(3)),
    )
}

mod annealer_tests {
    use super::*;

    #[test]
    fn test_colinear_nodes() {
        let strategy = FnStrategy::new(|a: &f64, b: &f64| (a - b).abs());
        let runner = SaRunner::new(SaConfig::new().with_seed(1));
        let result = runner.solve(Tour::identity(vec![0.0, 10.0, 5.0, 20.0]), &strategy);
        assert_eq!(result.best_cost, 20.0);
        let nodes = result.best.nodes();
        let ascending = nodes.windows(2).all(|w| w[0] < w[1]);
        let descending = nodes.windows(2).all(|w| w[0] > w[1]);
        assert!(ascending || descending, "{nodes:?}");
    }

    #[test]
    fn test_permutation_and_cost_bound() {
        for seed in 0..5u64 {
            let points: Vec<(i64, i64)> = (0..12)
                .map(|i| ((i * 7 + seed as i64 * 3) % 13, (i * 5 + seed as i64) % 11))
                .collect();
            let strategy = FnStrategy::new(|a: &(i64, i64), b: &(i64, i64)| {
                (((a.0 - b.0).pow(2) + (a.1 - b.1).pow(2)) as f64).sqrt()
            });
            let runner = SaRunner::new(
                SaConfig::new()
                    .with_seed(seed)
                    .with_restarts(2)
                    .with_max_iterations(2_000),
            );
            let result = runner.solve(Tour::identity(points.clone()), &strategy);
            assert!(result.best.is_permutation_of(&points));
            assert_eq!(result.best.len(), points.len());
            assert!(result.best_cost <= result.initial_cost);
        }
    }
}

mod route_tests {
    use super::*;

    #[test]
    fn test_optimize_is_reproducible() {
        let build = || {
            let mut plan = FlightPlan::new();
            for (id, y) in [40.0, 0.0, 70.0, 20.0, 10.0, 60.0, 30.0, 50.0].into_iter().enumerate() {
                let line = FlightLine::through(id, (0.0, y), (200.0, y), 30.0, 10.0).unwrap();
                plan.push(PlanElement::Line(line));
            }
            plan
        };
        let config = RouteConfig::new()
            .with_home(0.0, -20.0)
            .with_sa(SaConfig::new().with_seed(99).with_restarts(3));

        let mut a = build();
        let mut b = build();
        let ra = optimize_plan(&mut a, &config, Arc::new(AtomicBool::new(false)), |_| {});
        let rb = optimize_plan(&mut b, &config, Arc::new(AtomicBool::new(false)), |_| {});
        assert_eq!(ra, rb);
        assert_eq!(a, b);
        assert!(ra.optimized_cost < ra.initial_cost);
    }
}

mod pipeline_tests {
    use super::*;

    #[test]
    fn test_concave_area() {
        let u = Polygon::new(vec![
            (0.0, 0.0),
            (120.0, 0.0),
            (120.0, 100.0),
            (80.0, 100.0),
            (80.0, 40.0),
            (40.0, 40.0),
            (40.0, 100.0),
            (0.0, 100.0),
        ]);
        let plan = compute_flight_plan(
            &u,
            &sensor(),
            &PlatformDescription::default(),
            &FlatElevation(0.0),
            &goal(),
            None,
            &options(4),
        )
        .unwrap();
        assert!(!plan.has_errors(), "{:?}", plan.recompute_errors);
        assert!(plan.summary.coverage_ratio >= 0.95);
        let ids: Vec<usize> = plan.lines().iter().map(|l| l.id).collect();
        assert_eq!(ids, (0..ids.len()).collect::<Vec<_>>());
    }

    #[test]
    fn test_corridor_over_hills() {
        let corridor = Corridor::new(vec![(0.0, 0.0), (400.0, 0.0), (400.0, 300.0)], 30.0);
        let hills = FnElevation(|x: f64, y: f64| Ok::<f64, Error>(25.0 * (x / 80.0).sin() + 0.05 * y));
        let platform = PlatformDescription::default();
        let plan = compute_flight_plan(
            &corridor,
            &sensor(),
            &platform,
            &hills,
            &goal(),
            None,
            &options(8),
        )
        .unwrap();
        assert!(!plan.is_empty());
        for wp in plan.waypoints() {
            let (x, y) = wp.ground_point();
            let ground = 25.0 * (x / 80.0).sin() + 0.05 * y;
            assert!(wp.altitude() >= ground + 10.0 - 1e-9);
        }
        for line in plan.lines() {
            for pair in line.waypoints().windows(2) {
                let run = (pair[1].ground_point().0 - pair[0].ground_point().0)
                    .hypot(pair[1].ground_point().1 - pair[0].ground_point().1);
                let dz = pair[1].altitude() - pair[0].altitude();
                assert!(dz <= platform.climb_slope() * run + 1e-9);
                assert!(-dz <= platform.descent_slope() * run + 1e-9);
            }
        }
    }

    #[test]
    fn test_rolled_camera_low_overlap_is_covered() {
        let goal = Goal::builder()
            .with_altitude(50.0)
            .with_overlap_in_flight(10.0)
            .with_overlap_parallel(10.0)
            .build()
            .unwrap();
        for tilt in [Tilt::new(0.0, 0.0), Tilt::new(0.0, 25.0), Tilt::new(10.0, -15.0)] {
            let plan = compute_flight_plan(
                &Polygon::rectangle(400.0, 400.0),
                &sensor(),
                &PlatformDescription::default(),
                &FlatElevation(0.0),
                &goal,
                Some(tilt),
                &options(2),
            )
            .unwrap();
            assert!(!plan.has_errors(), "{tilt:?}: {:?}", plan.recompute_errors);
            assert!(plan.summary.coverage_ratio >= 0.95, "{tilt:?}");
        }
    }

    #[test]
    fn test_degenerate_area_is_not_an_error() {
        let plan = compute_flight_plan(
            &Polygon::new(vec![(0.0, 0.0), (50.0, 0.0)]),
            &sensor(),
            &PlatformDescription::default(),
            &FlatElevation(0.0),
            &goal(),
            None,
            &options(1),
        )
        .unwrap();
        assert!(plan.is_empty());
        assert!(matches!(
            plan.recompute_errors.as_slice(),
            [RecomputeError::DegenerateArea(_)]
        ));
    }

    #[test]
    fn test_context_observer_sees_annealing() {
        let mut events = 0usize;
        let plan = {
            let mut context = PlanningContext::new()
                .with_seed(12)
                .with_observer(|e: &SaEvent| {
                    if matches!(e, SaEvent::RestartFinished { .. }) {
                        events += 1;
                    }
                });
            compute_flight_plan_with_context(
                &Polygon::rectangle(80.0, 60.0),
                &sensor(),
                &PlatformDescription::default(),
                &FlatElevation(0.0),
                &goal(),
                None,
                &options(0),
                &mut context,
            )
            .unwrap()
        };
        assert!(!plan.is_empty());
        assert_eq!(events, 3);
    }
}
