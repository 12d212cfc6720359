//! # U-Survey Core
//!
//! Domain-agnostic foundations for the u-survey coverage flight planner.
//!
//! ## Core Components
//!
//! - **Errors**: [`Error`], [`Result`]
//! - **Robust predicates**: [`robust::orient2d`] and friends
//! - **Geometry**: intervals along lines, line/ring crossings, polygon measures
//! - **Transforms**: [`AABB2D`], [`Frame2D`]
//! - **SA framework**: [`SaRunner`], [`TourStrategy`] - simulated annealing
//!   over node orderings
//!
//! ## Example
//!
//! ```rust
//! use u_survey_core::{FnStrategy, SaConfig, SaRunner, Tour};
//!
//! let strategy = FnStrategy::new(|a: &f64, b: &f64| (a - b).abs());
//! let runner = SaRunner::new(SaConfig::new().with_seed(42));
//! let result = runner.solve(Tour::identity(vec![0.0, 10.0, 5.0, 20.0]), &strategy);
//!
//! assert!(result.best_cost <= result.initial_cost);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization support

pub mod error;
pub mod geometry;
pub mod robust;
pub mod sa;
pub mod transform;

// Re-exports
pub use error::{Error, Result};
pub use geometry::{
    line_ring_crossings, line_rings_intervals, merge_intervals, segment_intersection, Interval,
};
pub use sa::{
    FnStrategy, InitialTour, SaConfig, SaEvent, SaResult, SaRunner, SaState, TerminationReason,
    Tour, TourStrategy,
};
pub use transform::{Frame2D, AABB2D};
