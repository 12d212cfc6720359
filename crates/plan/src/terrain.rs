//! Terrain following for flight lines.
//!
//! # Algorithm
//!
//! For each waypoint the desired altitude is `agl` above the highest ground
//! found under the waypoint and along the ground track within half the gap to
//! each neighbour (sampled every `sample_distance`). A waypoint at most
//! `tolerance` above its desired altitude keeps its altitude; the others move
//! to it, so no waypoint ends up below `agl`. The profile is then lifted to the lowest envelope the platform can fly:
//!
//! 1. forward pass: an altitude may not drop faster than the descent slope,
//! 2. backward pass: an altitude may not rise faster than the climb slope,
//!
//! where a slope is the vertical rate divided by cruise speed. Both passes
//! only raise altitudes. Running the adaptation on its own output leaves it
//! unchanged: every waypoint that shaped the envelope is already within
//! tolerance, and every other one is dominated by the envelope.

use crate::camera::SensorDescription;
use crate::elevation::ElevationModel;
use crate::flight_line::FlightLine;
use crate::flight_plan::{FlightPlan, RecomputeError};
use crate::goal::Goal;
use crate::platform::PlatformDescription;
use u_survey_core::geometry;
use u_survey_core::Result;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Terrain-following parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TerrainConfig {
    /// Allowed excess over the desired height above ground (m).
    pub tolerance: f64,
    /// Ground sampling step along the track (m).
    pub sample_distance: f64,
    /// Desired height above ground (m).
    pub agl: f64,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            tolerance: 2.0,
            sample_distance: 10.0,
            agl: 100.0,
        }
    }
}

impl TerrainConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance.max(0.0);
        self
    }

    pub fn with_sample_distance(mut self, distance: f64) -> Self {
        self.sample_distance = distance.max(0.1);
        self
    }

    pub fn with_agl(mut self, agl: f64) -> Self {
        self.agl = agl;
        self
    }

    /// Sets `agl` to the goal's flying height, but never below its minimum
    /// object distance.
    pub fn with_goal(mut self, goal: &Goal, sensor: &SensorDescription) -> Self {
        self.agl = goal.flying_height(sensor);
        self
    }
}

/// Returns a copy of `line` whose waypoint altitudes follow the terrain.
///
/// An elevation failure aborts only this line and is returned as the error.
pub fn adapt_to_terrain<E>(
    line: &FlightLine,
    elevation: &E,
    platform: &PlatformDescription,
    config: &TerrainConfig,
) -> Result<FlightLine>
where
    E: ElevationModel + ?Sized,
{
    let mut adapted = line.clone();
    let ground: Vec<(f64, f64)> = adapted.waypoints().iter().map(|w| w.ground_point()).collect();
    let n = ground.len();
    if n == 0 {
        return Ok(adapted);
    }

    let mut target = Vec::with_capacity(n);
    for (i, &p) in ground.iter().enumerate() {
        let mut highest = elevation.elevation(p.0, p.1)?;
        if i > 0 {
            highest = highest.max(max_along(elevation, p, ground[i - 1], config)?);
        }
        if i + 1 < n {
            highest = highest.max(max_along(elevation, p, ground[i + 1], config)?);
        }
        target.push(highest + config.agl);
    }

    let current: Vec<f64> = adapted.waypoints().iter().map(|w| w.altitude()).collect();
    let mut alt: Vec<f64> = current
        .iter()
        .zip(&target)
        .map(|(&z, &t)| if z >= t && z - t <= config.tolerance { z } else { t })
        .collect();

    let gaps: Vec<f64> = ground
        .windows(2)
        .map(|w| geometry::distance(w[0], w[1]))
        .collect();
    let descent = platform.descent_slope();
    let climb = platform.climb_slope();

    for i in 1..n {
        alt[i] = alt[i].max(alt[i - 1] - descent * gaps[i - 1]);
    }
    for i in (0..n - 1).rev() {
        alt[i] = alt[i].max(alt[i + 1] - climb * gaps[i]);
    }

    for (wp, z) in adapted.waypoints_mut().iter_mut().zip(alt) {
        wp.position.z = z;
    }

    log::trace!("line {} adapted to terrain over {} waypoints", line.id, n);
    Ok(adapted)
}

/// Highest ground on the half of the track from `from` towards `to`.
fn max_along<E>(
    elevation: &E,
    from: (f64, f64),
    to: (f64, f64),
    config: &TerrainConfig,
) -> Result<f64>
where
    E: ElevationModel + ?Sized,
{
    let half = 0.5 * geometry::distance(from, to);
    let steps = (half / config.sample_distance).ceil() as usize;
    let mut highest = f64::NEG_INFINITY;
    for k in 1..=steps {
        let f = 0.5 * (k as f64 / steps as f64);
        let x = from.0 + f * (to.0 - from.0);
        let y = from.1 + f * (to.1 - from.1);
        highest = highest.max(elevation.elevation(x, y)?);
    }
    Ok(highest)
}

/// Adapts every line of `plan` in place.
///
/// A line whose elevation queries fail is left as it was and reported as
/// [`RecomputeError::ElevationUnavailable`]. Returns the number of adapted lines.
pub fn adapt_plan_to_terrain<E>(
    plan: &mut FlightPlan,
    elevation: &E,
    platform: &PlatformDescription,
    config: &TerrainConfig,
) -> usize
where
    E: ElevationModel + ?Sized,
{
    let mut failures = Vec::new();
    let mut adapted = 0;
    plan.walk_lines_mut(&mut |line: &mut FlightLine| {
        match adapt_to_terrain(line, elevation, platform, config) {
            Ok(new_line) => {
                *line = new_line;
                adapted += 1;
            }
            Err(err) => {
                log::warn!("terrain adaptation failed for line {}: {err}", line.id);
                failures.push(RecomputeError::ElevationUnavailable {
                    line_id: line.id,
                    reason: err.to_string(),
                });
            }
        }
    });
    for failure in failures {
        plan.push_error(failure);
    }
    adapted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elevation::{FlatElevation, FnElevation, PlaneElevation};
    use approx::assert_relative_eq;
    use u_survey_core::Error;

    fn platform() -> PlatformDescription {
        PlatformDescription::builder()
            .with_cruise_speed(10.0)
            .with_max_climb_rate(2.0)
            .with_max_descent_rate(1.0)
            .build()
            .unwrap()
    }

    fn line(altitude: f64) -> FlightLine {
        FlightLine::through(0, (0.0, 0.0), (400.0, 0.0), altitude, 20.0).unwrap()
    }

    fn altitudes(line: &FlightLine) -> Vec<f64> {
        line.waypoints().iter().map(|w| w.altitude()).collect()
    }

    #[test]
    fn test_flat_ground_within_tolerance_unchanged() {
        let config = TerrainConfig::new().with_agl(100.0).with_tolerance(2.0);
        let adapted = adapt_to_terrain(&line(101.0), &FlatElevation(0.0), &platform(), &config)
            .unwrap();
        assert!(altitudes(&adapted).iter().all(|&z| z == 101.0));
    }

    #[test]
    fn test_never_below_agl_within_tolerance() {
        // 1.5 m too low is inside the tolerance but still below agl.
        let config = TerrainConfig::new().with_agl(100.0).with_tolerance(2.0);
        let adapted = adapt_to_terrain(&line(98.5), &FlatElevation(0.0), &platform(), &config)
            .unwrap();
        assert!(altitudes(&adapted).iter().all(|&z| z == 100.0));
    }

    #[test]
    fn test_follows_gentle_slope() {
        // 5% slope, well inside the 10% descent / 20% climb limits.
        let ground = PlaneElevation {
            base: 0.0,
            slope_x: 0.05,
            slope_y: 0.0,
        };
        let config = TerrainConfig::new().with_agl(50.0).with_tolerance(0.5).with_sample_distance(5.0);
        let adapted = adapt_to_terrain(&line(50.0), &ground, &platform(), &config).unwrap();
        for wp in adapted.waypoints() {
            let agl = wp.altitude() - 0.05 * wp.position.x;
            assert!(agl >= 50.0 - 1e-9);
            // Highest sample is half a gap ahead: at most 0.5 m above.
            assert!(agl <= 50.0 + 0.5 + 1e-9, "agl {agl}");
        }
    }

    #[test]
    fn test_rate_limits_hold() {
        // A 60 m cliff halfway along the line.
        let cliff = FnElevation(|x: f64, _y: f64| Ok::<f64, Error>(if x > 200.0 { 60.0 } else { 0.0 }));
        let config = TerrainConfig::new().with_agl(50.0).with_tolerance(1.0);
        let p = platform();
        let adapted = adapt_to_terrain(&line(50.0), &cliff, &p, &config).unwrap();
        let wps = adapted.waypoints();
        for pair in wps.windows(2) {
            let dz = pair[1].altitude() - pair[0].altitude();
            let horizontal = (pair[1].position.x - pair[0].position.x).abs();
            assert!(dz <= p.climb_slope() * horizontal + 1e-9);
            assert!(-dz <= p.descent_slope() * horizontal + 1e-9);
        }
        // Every waypoint clears the ground by at least agl.
        for wp in wps {
            let ground = if wp.position.x > 200.0 { 60.0 } else { 0.0 };
            assert!(wp.altitude() >= ground + 50.0 - 1e-9);
        }
    }

    #[test]
    fn test_idempotent() {
        let rough = FnElevation(|x: f64, y: f64| {
            Ok::<f64, Error>(20.0 * (x / 37.0).sin() + 5.0 * (y / 11.0).cos() + if x > 250.0 { 30.0 } else { 0.0 })
        });
        let config = TerrainConfig::new().with_agl(80.0).with_tolerance(3.0).with_sample_distance(4.0);
        let p = platform();
        let once = adapt_to_terrain(&line(80.0), &rough, &p, &config).unwrap();
        let twice = adapt_to_terrain(&once, &rough, &p, &config).unwrap();
        for (a, b) in altitudes(&once).iter().zip(altitudes(&twice)) {
            assert_relative_eq!(*a, b, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_agl_from_goal() {
        let sensor = SensorDescription::builder().build().unwrap();
        let goal = Goal::builder()
            .with_altitude(40.0)
            .with_min_object_distance(60.0)
            .build()
            .unwrap();
        assert_relative_eq!(TerrainConfig::new().with_goal(&goal, &sensor).agl, 60.0);
    }

    #[test]
    fn test_elevation_failure_propagates() {
        let failing = FnElevation(|_x: f64, _y: f64| -> Result<f64> {
            Err(Error::Elevation("tile missing".into()))
        });
        let config = TerrainConfig::new();
        let result = adapt_to_terrain(&line(100.0), &failing, &platform(), &config);
        assert!(matches!(result, Err(Error::Elevation(_))));
    }
}
