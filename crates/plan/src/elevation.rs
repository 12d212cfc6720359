//! Ground elevation queries.
//!
//! The planner only needs a synchronous point query. Caching, retries and
//! tiling belong to the implementation behind the trait.

use u_survey_core::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Point-to-elevation query in the plan's local metric frame.
pub trait ElevationModel {
    /// Ground elevation at `(x, y)` in metres.
    fn elevation(&self, x: f64, y: f64) -> Result<f64>;
}

impl<E: ElevationModel + ?Sized> ElevationModel for &E {
    fn elevation(&self, x: f64, y: f64) -> Result<f64> {
        (**self).elevation(x, y)
    }
}

impl<E: ElevationModel + ?Sized> ElevationModel for Box<E> {
    fn elevation(&self, x: f64, y: f64) -> Result<f64> {
        (**self).elevation(x, y)
    }
}

/// Constant ground height.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FlatElevation(pub f64);

impl ElevationModel for FlatElevation {
    fn elevation(&self, _x: f64, _y: f64) -> Result<f64> {
        Ok(self.0)
    }
}

/// Inclined plane `base + slope_x * x + slope_y * y`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlaneElevation {
    pub base: f64,
    pub slope_x: f64,
    pub slope_y: f64,
}

impl ElevationModel for PlaneElevation {
    fn elevation(&self, x: f64, y: f64) -> Result<f64> {
        Ok(self.base + self.slope_x * x + self.slope_y * y)
    }
}

/// Elevation from a closure.
pub struct FnElevation<F>(pub F);

impl<F> ElevationModel for FnElevation<F>
where
    F: Fn(f64, f64) -> Result<f64>,
{
    fn elevation(&self, x: f64, y: f64) -> Result<f64> {
        let h = (self.0)(x, y)?;
        if h.is_finite() {
            Ok(h)
        } else {
            Err(Error::Elevation(format!("non-finite elevation at ({x}, {y})")))
        }
    }
}
