//! Per-computation state.
//!
//! A [`PlanningContext`] is created for one flight plan computation and
//! dropped with it. It carries the cancel flag shared by every stage, an
//! optional seed for the annealer and the progress observer.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use u_survey_core::sa::SaEvent;

type Observer<'a> = Box<dyn FnMut(&SaEvent) + 'a>;

/// State shared by the stages of one computation.
pub struct PlanningContext<'a> {
    cancelled: Arc<AtomicBool>,
    seed: Option<u64>,
    observer: Observer<'a>,
}

impl Default for PlanningContext<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PlanningContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlanningContext")
            .field("cancelled", &self.is_cancelled())
            .field("seed", &self.seed)
            .finish_non_exhaustive()
    }
}

impl<'a> PlanningContext<'a> {
    /// Context with a fresh cancel flag, no seed and a logging observer.
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            seed: None,
            observer: Box::new(log_event),
        }
    }

    /// Shares an external cancel flag.
    pub fn with_cancel_handle(mut self, cancelled: Arc<AtomicBool>) -> Self {
        self.cancelled = cancelled;
        self
    }

    /// Seeds the annealer, overriding the route configuration's seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Replaces the default logging observer.
    pub fn with_observer<F>(mut self, observer: F) -> Self
    where
        F: FnMut(&SaEvent) + 'a,
    {
        self.observer = Box::new(observer);
        self
    }

    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }

    /// Requests cancellation of the running computation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Forwards an annealer event to the observer.
    pub fn notify(&mut self, event: &SaEvent) {
        (self.observer)(event);
    }
}

/// Logs the coarse annealer events.
fn log_event(event: &SaEvent) {
    match event {
        SaEvent::RestartFinished {
            restart,
            iterations,
            best_cost,
            reason,
        } => log::debug!(
            "restart {restart} finished after {iterations} iterations ({reason:?}), best {best_cost:.1}"
        ),
        SaEvent::Terminated {
            reason,
            best_cost,
            restarts,
            iterations,
        } => log::debug!(
            "annealing terminated ({reason:?}) after {restarts} restarts, {iterations} iterations, best {best_cost:.1}"
        ),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use u_survey_core::sa::TerminationReason;

    #[test]
    fn test_observer_receives_events() {
        let mut seen = Vec::new();
        {
            let mut ctx = PlanningContext::new().with_observer(|e: &SaEvent| seen.push(e.clone()));
            ctx.notify(&SaEvent::Terminated {
                reason: TerminationReason::TrivialTour,
                best_cost: 0.0,
                restarts: 0,
                iterations: 0,
            });
        }
        assert_eq!(seen.len(), 1);
    }

    #[test]
    fn test_cancel_is_shared() {
        let flag = Arc::new(AtomicBool::new(false));
        let ctx = PlanningContext::new().with_cancel_handle(flag.clone()).with_seed(3);
        assert!(!ctx.is_cancelled());
        ctx.cancel();
        assert!(flag.load(Ordering::Relaxed));
        assert_eq!(ctx.seed(), Some(3));
    }
}
