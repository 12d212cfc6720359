//! Configuration for flight line sequencing.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use u_survey_core::sa::SaConfig;

/// Parameters for reordering the lines of a plan.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RouteConfig {
    /// Annealer settings.
    pub sa: SaConfig,

    /// Take-off and landing point. When set, the transit from home to the
    /// first line counts towards the route cost.
    pub home: Option<(f64, f64)>,

    /// Keep the plan's first line first and in its original direction.
    pub pin_first_line: bool,

    /// Let the optimizer choose the flying direction of each line.
    pub allow_line_reversal: bool,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            sa: SaConfig::default(),
            home: None,
            pin_first_line: false,
            allow_line_reversal: true,
        }
    }
}

impl RouteConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sa(mut self, sa: SaConfig) -> Self {
        self.sa = sa;
        self
    }

    /// Sets the home position.
    pub fn with_home(mut self, x: f64, y: f64) -> Self {
        self.home = Some((x, y));
        self
    }

    pub fn with_pin_first_line(mut self, pin: bool) -> Self {
        self.pin_first_line = pin;
        self
    }

    pub fn with_line_reversal(mut self, allow: bool) -> Self {
        self.allow_line_reversal = allow;
        self
    }

    /// Shortcut for seeding the annealer.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.sa = self.sa.with_seed(seed);
        self
    }
}
