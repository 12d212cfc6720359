//! Reordering the flight lines of a plan.

use crate::config::RouteConfig;
use crate::sequence::LineTourStrategy;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use u_survey_core::sa::{SaEvent, SaRunner, Tour};
use u_survey_plan::{FlightLine, FlightPlan, PlanElement};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Outcome of [`optimize_plan`].
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RouteResult {
    /// Transit distance of the plan as it came in (m).
    pub initial_cost: f64,
    /// Transit distance after reordering (m).
    pub optimized_cost: f64,
    /// Relative saving, `(initial - optimized) / initial`, 0 if nothing to save.
    pub improvement: f64,
    /// Original line positions in the new flying order.
    pub order: Vec<usize>,
    /// Annealer iterations over all restarts.
    pub iterations: u64,
    /// Whether the search was cut short.
    pub cancelled: bool,
}

/// Reorders and redirects the flight lines of `plan` to shorten the transits
/// between them.
///
/// Lines are renumbered in their new flying order and placed at the top
/// level of the plan; loose waypoints keep their place ahead of them. The
/// result never costs more than the input: the annealer only keeps strictly
/// cheaper orders, and the input directions are among the candidates.
pub fn optimize_plan<F>(
    plan: &mut FlightPlan,
    config: &RouteConfig,
    cancel: Arc<AtomicBool>,
    observer: F,
) -> RouteResult
where
    F: FnMut(&SaEvent),
{
    let mut lines = plan.take_lines();
    if lines.is_empty() {
        return RouteResult::default();
    }

    let strategy = LineTourStrategy::new(&lines, config);
    let identity: Vec<usize> = (0..lines.len()).collect();
    let initial_cost = strategy.fixed_cost(&identity);

    let runner = SaRunner::new(config.sa.clone()).with_cancel_handle(cancel);
    let result = runner.solve_with_observer(Tour::identity(identity), &strategy, observer);
    let order = result.best.into_nodes();
    let (optimized_cost, reversed) = strategy.orientations(&order);

    let mut slots: Vec<Option<FlightLine>> = lines.drain(..).map(Some).collect();
    for (position, (&index, &flip)) in order.iter().zip(&reversed).enumerate() {
        let Some(mut line) = slots[index].take() else {
            continue;
        };
        if flip {
            line.mirror();
        }
        line.set_id(position);
        plan.push(PlanElement::Line(line));
    }

    let improvement = if initial_cost > 0.0 {
        ((initial_cost - optimized_cost) / initial_cost).max(0.0)
    } else {
        0.0
    };
    log::debug!(
        "route optimized: transit {:.1} m -> {:.1} m ({} iterations{})",
        initial_cost,
        optimized_cost,
        result.iterations,
        if result.cancelled { ", cancelled" } else { "" }
    );

    RouteResult {
        initial_cost,
        optimized_cost,
        improvement,
        order,
        iterations: result.iterations,
        cancelled: result.cancelled,
    }
}
