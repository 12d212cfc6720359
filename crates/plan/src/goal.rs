//! Photogrammetric goals.

use crate::camera::SensorDescription;
use u_survey_core::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Validated photogrammetric constraints of a survey.
///
/// Overlaps are percentages in `[0, 100)`. Build with [`GoalBuilder`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Goal {
    target_gsd: Option<f64>,
    target_altitude: Option<f64>,
    overlap_in_flight: f64,
    overlap_parallel: f64,
    min_ground_distance: f64,
    min_object_distance: f64,
    crop_height: Option<(f64, f64)>,
}

impl Goal {
    pub fn builder() -> GoalBuilder {
        GoalBuilder::new()
    }

    /// Target ground sample distance in metres per pixel.
    pub fn target_gsd(&self) -> Option<f64> {
        self.target_gsd
    }

    pub fn target_altitude(&self) -> Option<f64> {
        self.target_altitude
    }

    /// Overlap between consecutive photos of one line, in percent.
    pub fn overlap_in_flight(&self) -> f64 {
        self.overlap_in_flight
    }

    /// Overlap between adjacent lines, in percent.
    pub fn overlap_parallel(&self) -> f64 {
        self.overlap_parallel
    }

    pub fn min_ground_distance(&self) -> f64 {
        self.min_ground_distance
    }

    pub fn min_object_distance(&self) -> f64 {
        self.min_object_distance
    }

    /// Crop height range `(min, max)` in metres, if the survey is over crops.
    pub fn crop_height(&self) -> Option<(f64, f64)> {
        self.crop_height
    }

    /// Flying height above ground.
    ///
    /// An explicit altitude wins; otherwise it is derived from the target GSD,
    /// which then applies at the crop canopy when a crop height is set. The
    /// result never drops below the minimum ground distance.
    pub fn altitude(&self, sensor: &SensorDescription) -> f64 {
        let above_ground = match (self.target_altitude, self.target_gsd) {
            (Some(alt), _) => alt,
            (None, Some(gsd)) => {
                let canopy = self.crop_height.map_or(0.0, |(_, max)| max);
                sensor.altitude_for_gsd(gsd) + canopy
            }
            // Unreachable through the builder.
            (None, None) => self.min_ground_distance,
        };
        above_ground.max(self.min_ground_distance)
    }

    /// Height above ground the lines are flown at: [`Goal::altitude`], raised
    /// to the minimum object distance.
    pub fn flying_height(&self, sensor: &SensorDescription) -> f64 {
        self.altitude(sensor).max(self.min_object_distance)
    }
}

/// Builder for [`Goal`]. `build` fails fast on inconsistent values.
#[derive(Debug, Clone)]
pub struct GoalBuilder {
    target_gsd: Option<f64>,
    target_altitude: Option<f64>,
    overlap_in_flight: f64,
    overlap_parallel: f64,
    min_ground_distance: f64,
    min_object_distance: f64,
    crop_height: Option<(f64, f64)>,
}

impl Default for GoalBuilder {
    fn default() -> Self {
        Self {
            target_gsd: None,
            target_altitude: None,
            overlap_in_flight: 60.0,
            overlap_parallel: 50.0,
            min_ground_distance: 0.0,
            min_object_distance: 0.0,
            crop_height: None,
        }
    }
}

impl GoalBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the target GSD in metres per pixel.
    pub fn with_gsd(mut self, gsd: f64) -> Self {
        self.target_gsd = Some(gsd);
        self
    }

    /// Sets the flying height above ground in metres.
    pub fn with_altitude(mut self, altitude: f64) -> Self {
        self.target_altitude = Some(altitude);
        self
    }

    pub fn with_overlap_in_flight(mut self, percent: f64) -> Self {
        self.overlap_in_flight = percent;
        self
    }

    pub fn with_overlap_parallel(mut self, percent: f64) -> Self {
        self.overlap_parallel = percent;
        self
    }

    pub fn with_min_ground_distance(mut self, metres: f64) -> Self {
        self.min_ground_distance = metres;
        self
    }

    pub fn with_min_object_distance(mut self, metres: f64) -> Self {
        self.min_object_distance = metres;
        self
    }

    pub fn with_crop_height(mut self, min: f64, max: f64) -> Self {
        self.crop_height = Some((min, max));
        self
    }

    pub fn build(self) -> Result<Goal> {
        if self.target_gsd.is_none() && self.target_altitude.is_none() {
            return Err(Error::config("goal needs a target GSD or altitude"));
        }
        if let Some(gsd) = self.target_gsd {
            if !(gsd > 0.0) {
                return Err(Error::config(format!("GSD must be positive, got {gsd}")));
            }
        }
        if let Some(alt) = self.target_altitude {
            if !(alt > 0.0) {
                return Err(Error::config(format!(
                    "altitude must be positive, got {alt}"
                )));
            }
        }
        for (name, value) in [
            ("in-flight overlap", self.overlap_in_flight),
            ("parallel overlap", self.overlap_parallel),
        ] {
            if !(0.0..100.0).contains(&value) {
                return Err(Error::config(format!(
                    "{name} must be in [0, 100), got {value}"
                )));
            }
        }
        if !(self.min_ground_distance >= 0.0) || !(self.min_object_distance >= 0.0) {
            return Err(Error::config("minimum distances must not be negative"));
        }
        if let Some((min, max)) = self.crop_height {
            if !(min >= 0.0) || min > max {
                return Err(Error::config(format!(
                    "crop height range [{min}, {max}] is invalid"
                )));
            }
        }

        Ok(Goal {
            target_gsd: self.target_gsd,
            target_altitude: self.target_altitude,
            overlap_in_flight: self.overlap_in_flight,
            overlap_parallel: self.overlap_parallel,
            min_ground_distance: self.min_ground_distance,
            min_object_distance: self.min_object_distance,
            crop_height: self.crop_height,
        })
    }
}
