//! # U-Survey Plan
//!
//! Coverage flight planning: from an area of interest, a camera and a set of
//! photogrammetric goals to flight lines and photo waypoints.
//!
//! ## Features
//!
//! - Polygon and corridor areas behind one [`CoverageArea`] abstraction
//! - Photo footprint model with oblique tilt and effective (inscribed) size
//! - Flight lines with lazy waypoint layout, clipping, overshoot and mirroring
//! - Boustrophedon rasterizer with tilt compensation and cooperative cancellation
//! - Turn-radius alignment of neighbouring lines
//! - Terrain following under climb/descent rate limits
//! - Coverage estimation over an R*-tree of photo footprints
//!
//! ## Quick Start
//!
//! ```rust
//! use u_survey_plan::{
//!     compute_photo_properties, FlatElevation, Goal, PlatformDescription, Polygon,
//!     Rasterizer, RasterConfig, SensorDescription,
//! };
//!
//! let sensor = SensorDescription::builder()
//!     .with_focal_length_mm(10.0)
//!     .with_sensor_size_mm(20.0, 15.0)
//!     .with_resolution(4000, 3000)
//!     .build()
//!     .unwrap();
//! let goal = Goal::builder()
//!     .with_altitude(10.0)
//!     .with_overlap_in_flight(60.0)
//!     .with_overlap_parallel(50.0)
//!     .build()
//!     .unwrap();
//! let photo = compute_photo_properties(&sensor, goal.flying_height(&sensor), None).unwrap();
//!
//! let plan = Rasterizer::new(RasterConfig::default()).rasterize(
//!     &Polygon::rectangle(100.0, 100.0),
//!     &sensor,
//!     &PlatformDescription::default(),
//!     &FlatElevation(0.0),
//!     &goal,
//!     &photo,
//! );
//!
//! assert_eq!(plan.lines().len(), 10);
//! assert!(!plan.has_errors());
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization support

pub mod area;
pub mod camera;
pub mod corridor;
pub mod coverage;
pub mod elevation;
pub mod flight_line;
pub mod flight_plan;
pub mod goal;
pub mod platform;
pub mod polygon;
pub mod raster;
pub mod terrain;
pub mod turns;
pub mod waypoint;

// Re-exports
pub use area::{CoverageArea, CoveragePatch};
pub use camera::{
    compute_photo_properties, CameraTiming, PhotoProperties, SensorBuilder, SensorDescription,
    Tilt,
};
pub use corridor::Corridor;
pub use coverage::{estimate_coverage, estimate_plan_coverage, photo_footprints, CoverageConfig};
pub use elevation::{ElevationModel, FlatElevation, FnElevation, PlaneElevation};
pub use flight_line::FlightLine;
pub use flight_plan::{FlightPlan, PlanElement, PlanSummary, RecomputeError};
pub use goal::{Goal, GoalBuilder};
pub use platform::{PlatformBuilder, PlatformDescription};
pub use polygon::Polygon;
pub use raster::{RasterConfig, Rasterizer};
pub use terrain::{adapt_plan_to_terrain, adapt_to_terrain, TerrainConfig};
pub use turns::{assure_turn_radius, turn_extensions};
pub use waypoint::Waypoint;
pub use u_survey_core::{Error, Result};
