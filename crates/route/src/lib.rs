//! # U-Survey Route
//!
//! Flight line sequencing and the end-to-end flight plan pipeline.
//!
//! The lines produced by the rasterizer are reordered with the simulated
//! annealing runner from `u-survey-core`, using [`LineTourStrategy`] as cost
//! model: the transit distance between lines, with each line's flying
//! direction picked by dynamic programming. [`compute_flight_plan`] chains
//! rasterization, route optimization and terrain following.
//!
//! ## Quick Start
//!
//! ```rust
//! use u_survey_plan::{FlatElevation, Goal, PlatformDescription, Polygon, SensorDescription};
//! use u_survey_route::{compute_flight_plan, PipelineOptions, RouteConfig};
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
//! let options = PipelineOptions::new().with_route(RouteConfig::new().with_seed(42));
//!
//! let plan = compute_flight_plan(
//!     &Polygon::rectangle(100.0, 100.0),
//!     &sensor,
//!     &PlatformDescription::default(),
//!     &FlatElevation(0.0),
//!     &goal,
//!     None,
//!     &options,
//! )
//! .unwrap();
//!
//! println!(
//!     "{} lines, {} photos, {:.0} m",
//!     plan.summary.line_count, plan.summary.photo_count, plan.summary.total_distance
//! );
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization support

pub mod config;
pub mod context;
pub mod optimize;
pub mod pipeline;
pub mod sequence;

// Re-exports
pub use config::RouteConfig;
pub use context::PlanningContext;
pub use optimize::{optimize_plan, RouteResult};
pub use pipeline::{compute_flight_plan, compute_flight_plan_with_context, PipelineOptions};
pub use sequence::LineTourStrategy;
