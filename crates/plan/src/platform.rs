//! Platform (aircraft) limits.

use u_survey_core::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Performance limits of the flying platform. Build with [`PlatformBuilder`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlatformDescription {
    /// Minimum distance between consecutive waypoints (m).
    pub min_waypoint_separation: f64,
    /// Maximum climb rate (m/s).
    pub max_climb_rate: f64,
    /// Maximum descent rate (m/s).
    pub max_descent_rate: f64,
    /// Survey speed (m/s).
    pub cruise_speed: f64,
    /// Maximum speed (m/s).
    pub max_speed: f64,
    /// Minimum turn radius (m).
    pub turn_radius: f64,
}

impl PlatformDescription {
    pub fn builder() -> PlatformBuilder {
        PlatformBuilder::new()
    }

    /// Checks the limits the builder enforces. Useful for descriptions built
    /// field by field.
    pub fn validate(&self) -> Result<()> {
        if !(self.min_waypoint_separation >= 0.0) {
            return Err(Error::config("minimum waypoint separation must not be negative"));
        }
        if !(self.max_climb_rate > 0.0) || !(self.max_descent_rate > 0.0) {
            return Err(Error::config("climb and descent rates must be positive"));
        }
        if !(self.cruise_speed > 0.0) {
            return Err(Error::config("cruise speed must be positive"));
        }
        if !(self.max_speed >= self.cruise_speed) {
            return Err(Error::config(format!(
                "max speed {} is below cruise speed {}",
                self.max_speed, self.cruise_speed
            )));
        }
        if !(self.turn_radius >= 0.0) {
            return Err(Error::config("turn radius must not be negative"));
        }
        Ok(())
    }

    /// Height gained per metre flown at cruise speed.
    pub fn climb_slope(&self) -> f64 {
        self.max_climb_rate / self.cruise_speed
    }

    /// Height lost per metre flown at cruise speed.
    pub fn descent_slope(&self) -> f64 {
        self.max_descent_rate / self.cruise_speed
    }
}

impl Default for PlatformDescription {
    /// A small multicopter.
    fn default() -> Self {
        Self {
            min_waypoint_separation: 0.0,
            max_climb_rate: 3.0,
            max_descent_rate: 2.0,
            cruise_speed: 8.0,
            max_speed: 15.0,
            turn_radius: 0.0,
        }
    }
}

/// Builder for [`PlatformDescription`].
#[derive(Debug, Clone, Default)]
pub struct PlatformBuilder {
    inner: PlatformDescription,
}

impl PlatformBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_waypoint_separation(mut self, metres: f64) -> Self {
        self.inner.min_waypoint_separation = metres;
        self
    }

    pub fn with_max_climb_rate(mut self, rate: f64) -> Self {
        self.inner.max_climb_rate = rate;
        self
    }

    pub fn with_max_descent_rate(mut self, rate: f64) -> Self {
        self.inner.max_descent_rate = rate;
        self
    }

    pub fn with_cruise_speed(mut self, speed: f64) -> Self {
        self.inner.cruise_speed = speed;
        self
    }

    pub fn with_max_speed(mut self, speed: f64) -> Self {
        self.inner.max_speed = speed;
        self
    }

    pub fn with_turn_radius(mut self, metres: f64) -> Self {
        self.inner.turn_radius = metres;
        self
    }

    pub fn build(self) -> Result<PlatformDescription> {
        self.inner.validate()?;
        Ok(self.inner)
    }
}
