//! Simulated annealing for tour (node ordering) problems.
//!
//! The optimizer reorders a sequence of nodes to reduce a caller-supplied cost.
//! It knows nothing about the node type: distances and feasibility come from a
//! [`TourStrategy`], so the same runner orders flight lines, waypoints or plain
//! 2D points.
//!
//! # Algorithm
//!
//! Each of a fixed number of independent restarts runs the state machine
//! `Initial -> Cooling -> Terminated`:
//!
//! 1. **Initial**: start from the input tour (or a shuffled copy of it) at
//!    `starting_temperature`.
//! 2. **Cooling**: propose a random pairwise position swap. A move that lowers
//!    the cost is always kept; a worse move is kept with probability
//!    `exp(-|delta| / T)` (Metropolis criterion), otherwise the swap is undone.
//!    `T` is multiplied by `cooling_rate` every iteration.
//! 3. **Terminated**: `T` fell below `min_temperature`, the per-restart
//!    iteration cap was hit, or the cancel flag was raised.
//!
//! The best acceptable tour across all restarts is returned. It is always a
//! permutation of the input and never costs more than the input.
//!
//! # Progress
//!
//! The hot loop does not log. Callers that want diagnostics pass an observer
//! to [`SaRunner::solve_with_observer`] and receive [`SaEvent`]s.
//!
//! # References
//!
//! - Kirkpatrick, S., Gelatt, C.D., Vecchi, M.P. (1983). "Optimization by
//!   Simulated Annealing"

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An ordered sequence of nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Tour<N> {
    nodes: Vec<N>,
}

impl<N> Tour<N> {
    /// Creates a tour visiting `nodes` in the given order.
    pub fn identity(nodes: Vec<N>) -> Self {
        Self { nodes }
    }

    /// Nodes in visiting order.
    pub fn nodes(&self) -> &[N] {
        &self.nodes
    }

    /// Consumes the tour and returns its nodes.
    pub fn into_nodes(self) -> Vec<N> {
        self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Exchanges the nodes at positions `i` and `j`.
    #[inline]
    pub fn swap(&mut self, i: usize, j: usize) {
        self.nodes.swap(i, j);
    }

    /// Randomly permutes the tour.
    pub fn shuffle<R: Rng>(&mut self, rng: &mut R) {
        self.nodes.shuffle(rng);
    }

    /// Returns true if this tour holds exactly the nodes of `other`
    /// (same multiset, any order).
    pub fn is_permutation_of(&self, other: &[N]) -> bool
    where
        N: PartialEq,
    {
        if self.nodes.len() != other.len() {
            return false;
        }
        let mut used = vec![false; other.len()];
        self.nodes.iter().all(|node| {
            match other
                .iter()
                .enumerate()
                .position(|(k, o)| !used[k] && o == node)
            {
                Some(k) => {
                    used[k] = true;
                    true
                }
                None => false,
            }
        })
    }
}

/// Cost model and feasibility rule for a tour.
pub trait TourStrategy<N> {
    /// Travel cost from `a` to `b`.
    fn distance(&self, a: &N, b: &N) -> f64;

    /// Total cost of visiting `nodes` in order. Defaults to the open path
    /// length (no return leg).
    fn tour_cost(&self, nodes: &[N]) -> f64 {
        nodes
            .windows(2)
            .map(|w| self.distance(&w[0], &w[1]))
            .sum()
    }

    /// Returns false for orderings that must never be selected.
    fn is_acceptable(&self, _nodes: &[N]) -> bool {
        true
    }
}

type Predicate<N> = Box<dyn Fn(&[N]) -> bool + Send + Sync>;

/// [`TourStrategy`] built from closures.
///
/// ```rust
/// use u_survey_core::sa::{FnStrategy, TourStrategy};
///
/// let strategy = FnStrategy::new(|a: &f64, b: &f64| (a - b).abs());
/// assert_eq!(strategy.tour_cost(&[0.0, 10.0, 5.0]), 15.0);
/// ```
pub struct FnStrategy<N, D> {
    distance: D,
    acceptable: Option<Predicate<N>>,
    _node: PhantomData<fn(&N)>,
}

impl<N, D> FnStrategy<N, D>
where
    D: Fn(&N, &N) -> f64,
{
    /// Strategy with the given distance function and no feasibility rule.
    pub fn new(distance: D) -> Self {
        Self {
            distance,
            acceptable: None,
            _node: PhantomData,
        }
    }

    /// Adds a feasibility predicate.
    pub fn with_acceptable<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&[N]) -> bool + Send + Sync + 'static,
    {
        self.acceptable = Some(Box::new(predicate));
        self
    }
}

impl<N, D> TourStrategy<N> for FnStrategy<N, D>
where
    D: Fn(&N, &N) -> f64,
{
    fn distance(&self, a: &N, b: &N) -> f64 {
        (self.distance)(a, b)
    }

    fn is_acceptable(&self, nodes: &[N]) -> bool {
        self.acceptable.as_ref().map_or(true, |p| p(nodes))
    }
}

/// How each restart builds its starting tour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum InitialTour {
    /// Start from the input order.
    #[default]
    Identity,
    /// Start from a random permutation of the input (falls back to the input
    /// order if the permutation is not acceptable).
    Shuffled,
}

/// Configuration for the annealer.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SaConfig {
    /// Temperature at the start of every restart.
    pub starting_temperature: f64,
    /// Multiplicative cooling factor per iteration, in (0, 1).
    pub cooling_rate: f64,
    /// A restart stops once the temperature drops below this floor.
    pub min_temperature: f64,
    /// Iteration cap per restart.
    pub max_iterations: u64,
    /// Number of independent restarts (at least 1).
    pub restarts: usize,
    /// Starting tour of each restart.
    pub initial: InitialTour,
    /// RNG seed; `None` seeds from entropy.
    pub seed: Option<u64>,
    /// The cancel flag is polled every this many iterations.
    pub cancel_poll_interval: u64,
    /// A [`SaEvent::Progress`] is emitted every this many iterations.
    pub progress_interval: u64,
}

impl Default for SaConfig {
    fn default() -> Self {
        Self {
            starting_temperature: 100.0,
            cooling_rate: 0.995,
            min_temperature: 0.001,
            max_iterations: 100_000,
            restarts: 10,
            initial: InitialTour::Identity,
            seed: None,
            cancel_poll_interval: 256,
            progress_interval: 1_000,
        }
    }
}

impl SaConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the starting temperature.
    pub fn with_starting_temperature(mut self, temp: f64) -> Self {
        self.starting_temperature = temp.max(f64::MIN_POSITIVE);
        self
    }

    /// Sets the cooling rate, clamped into the open interval (0, 1).
    pub fn with_cooling_rate(mut self, rate: f64) -> Self {
        self.cooling_rate = rate.clamp(1e-6, 1.0 - 1e-9);
        self
    }

    /// Sets the temperature floor.
    pub fn with_min_temperature(mut self, temp: f64) -> Self {
        self.min_temperature = temp.max(0.0);
        self
    }

    /// Sets the per-restart iteration cap.
    pub fn with_max_iterations(mut self, iterations: u64) -> Self {
        self.max_iterations = iterations;
        self
    }

    /// Sets the number of restarts (at least 1).
    pub fn with_restarts(mut self, restarts: usize) -> Self {
        self.restarts = restarts.max(1);
        self
    }

    /// Sets how restarts build their starting tour.
    pub fn with_initial(mut self, initial: InitialTour) -> Self {
        self.initial = initial;
        self
    }

    /// Fixes the RNG seed for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the cancel polling interval (at least 1).
    pub fn with_cancel_poll_interval(mut self, interval: u64) -> Self {
        self.cancel_poll_interval = interval.max(1);
        self
    }

    /// Sets the progress event interval (at least 1).
    pub fn with_progress_interval(mut self, interval: u64) -> Self {
        self.progress_interval = interval.max(1);
        self
    }
}

/// Why a restart (or the whole search) stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TerminationReason {
    /// Temperature fell below the floor.
    TemperatureFloor,
    /// The iteration cap was reached.
    IterationCap,
    /// The cancel flag was raised.
    Cancelled,
    /// Fewer than two nodes; nothing to reorder.
    TrivialTour,
}

/// Phase of a single restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaState {
    Initial,
    Cooling,
    Terminated(TerminationReason),
}

/// Events reported to a [`SaRunner::solve_with_observer`] observer.
#[derive(Debug, Clone, PartialEq)]
pub enum SaEvent {
    RestartStarted {
        restart: usize,
        temperature: f64,
        cost: f64,
    },
    Progress {
        restart: usize,
        iteration: u64,
        temperature: f64,
        current_cost: f64,
        best_cost: f64,
    },
    NewBest {
        restart: usize,
        iteration: u64,
        cost: f64,
    },
    RestartFinished {
        restart: usize,
        iterations: u64,
        best_cost: f64,
        reason: TerminationReason,
    },
    Terminated {
        reason: TerminationReason,
        best_cost: f64,
        restarts: usize,
        iterations: u64,
    },
}

/// Result of an annealing run.
#[derive(Debug, Clone)]
pub struct SaResult<N> {
    /// Best acceptable tour found (the input tour if nothing better was found).
    pub best: Tour<N>,
    /// Cost of `best`.
    pub best_cost: f64,
    /// Cost of the input tour.
    pub initial_cost: f64,
    /// Number of restarts that ran.
    pub restarts: usize,
    /// Total iterations over all restarts.
    pub iterations: u64,
    /// Wall-clock time.
    pub elapsed: Duration,
    /// Whether the run was cut short by cancellation.
    pub cancelled: bool,
    /// Reason the last restart stopped.
    pub reason: TerminationReason,
    /// Best cost after each restart.
    pub history: Vec<f64>,
}

impl<N> SaResult<N> {
    /// Returns true if the best tour is strictly cheaper than the input.
    pub fn improved(&self) -> bool {
        self.best_cost < self.initial_cost
    }
}

/// Simulated annealing runner.
pub struct SaRunner {
    config: SaConfig,
    cancelled: Arc<AtomicBool>,
}

impl SaRunner {
    /// Creates a new runner.
    pub fn new(config: SaConfig) -> Self {
        Self {
            config,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Shares an existing cancel flag instead of the runner's own.
    pub fn with_cancel_handle(mut self, cancelled: Arc<AtomicBool>) -> Self {
        self.cancelled = cancelled;
        self
    }

    /// Returns a handle to cancel the search.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }

    pub fn config(&self) -> &SaConfig {
        &self.config
    }

    /// Runs the search.
    pub fn solve<N, S>(&self, tour: Tour<N>, strategy: &S) -> SaResult<N>
    where
        N: Clone,
        S: TourStrategy<N> + ?Sized,
    {
        self.solve_with_observer(tour, strategy, |_| {})
    }

    /// Runs the search and reports progress to `observer`.
    pub fn solve_with_observer<N, S, F>(
        &self,
        tour: Tour<N>,
        strategy: &S,
        observer: F,
    ) -> SaResult<N>
    where
        N: Clone,
        S: TourStrategy<N> + ?Sized,
        F: FnMut(&SaEvent),
    {
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.solve_with_rng(tour, strategy, &mut rng, observer)
    }

    /// Runs the search with a specific RNG.
    pub fn solve_with_rng<N, S, R, F>(
        &self,
        tour: Tour<N>,
        strategy: &S,
        rng: &mut R,
        mut observer: F,
    ) -> SaResult<N>
    where
        N: Clone,
        S: TourStrategy<N> + ?Sized,
        R: Rng,
        F: FnMut(&SaEvent),
    {
        let start = Instant::now();
        let initial_cost = strategy.tour_cost(tour.nodes());

        if tour.len() < 2 {
            let reason = TerminationReason::TrivialTour;
            observer(&SaEvent::Terminated {
                reason,
                best_cost: initial_cost,
                restarts: 0,
                iterations: 0,
            });
            return SaResult {
                best: tour,
                best_cost: initial_cost,
                initial_cost,
                restarts: 0,
                iterations: 0,
                elapsed: start.elapsed(),
                cancelled: false,
                reason,
                history: Vec::new(),
            };
        }

        let mut best = tour.clone();
        let mut best_cost = initial_cost;
        let mut history = Vec::with_capacity(self.config.restarts);
        let mut total_iterations = 0u64;
        let mut restarts_run = 0usize;
        let mut reason = TerminationReason::TemperatureFloor;

        // Hard, finite bound regardless of whether a best was ever improved.
        for restart in 0..self.config.restarts.max(1) {
            if self.cancelled.load(Ordering::Relaxed) {
                reason = TerminationReason::Cancelled;
                break;
            }

            let mut run = Restart {
                current: tour.clone(),
                current_cost: initial_cost,
                temperature: self.config.starting_temperature,
                iteration: 0,
                state: SaState::Initial,
            };

            let finished = loop {
                match run.state {
                    SaState::Initial => {
                        self.enter(&mut run, &tour, strategy, rng);
                        observer(&SaEvent::RestartStarted {
                            restart,
                            temperature: run.temperature,
                            cost: run.current_cost,
                        });
                        run.state = SaState::Cooling;
                    }
                    SaState::Cooling => {
                        if let Some(stop) = self.should_stop(&run) {
                            run.state = SaState::Terminated(stop);
                            continue;
                        }
                        self.step(&mut run, strategy, rng);

                        if run.current_cost < best_cost
                            && strategy.is_acceptable(run.current.nodes())
                        {
                            best = run.current.clone();
                            best_cost = run.current_cost;
                            observer(&SaEvent::NewBest {
                                restart,
                                iteration: run.iteration,
                                cost: best_cost,
                            });
                        }

                        if run.iteration % self.config.progress_interval.max(1) == 0 {
                            observer(&SaEvent::Progress {
                                restart,
                                iteration: run.iteration,
                                temperature: run.temperature,
                                current_cost: run.current_cost,
                                best_cost,
                            });
                        }
                    }
                    SaState::Terminated(stop) => break stop,
                }
            };

            restarts_run += 1;
            total_iterations += run.iteration;
            history.push(best_cost);
            reason = finished;
            observer(&SaEvent::RestartFinished {
                restart,
                iterations: run.iteration,
                best_cost,
                reason: finished,
            });

            if finished == TerminationReason::Cancelled {
                break;
            }
        }

        let cancelled = reason == TerminationReason::Cancelled;
        observer(&SaEvent::Terminated {
            reason,
            best_cost,
            restarts: restarts_run,
            iterations: total_iterations,
        });

        SaResult {
            best,
            best_cost,
            initial_cost,
            restarts: restarts_run,
            iterations: total_iterations,
            elapsed: start.elapsed(),
            cancelled,
            reason,
            history,
        }
    }

    fn enter<N, S, R>(&self, run: &mut Restart<N>, input: &Tour<N>, strategy: &S, rng: &mut R)
    where
        N: Clone,
        S: TourStrategy<N> + ?Sized,
        R: Rng,
    {
        if self.config.initial == InitialTour::Shuffled {
            let mut shuffled = input.clone();
            shuffled.shuffle(rng);
            if strategy.is_acceptable(shuffled.nodes()) {
                run.current_cost = strategy.tour_cost(shuffled.nodes());
                run.current = shuffled;
            }
        }
    }

    fn should_stop<N>(&self, run: &Restart<N>) -> Option<TerminationReason> {
        if run.temperature < self.config.min_temperature {
            return Some(TerminationReason::TemperatureFloor);
        }
        if run.iteration >= self.config.max_iterations {
            return Some(TerminationReason::IterationCap);
        }
        if run.iteration % self.config.cancel_poll_interval.max(1) == 0
            && self.cancelled.load(Ordering::Relaxed)
        {
            return Some(TerminationReason::Cancelled);
        }
        None
    }

    /// One propose/accept/reject iteration.
    fn step<N, S, R>(&self, run: &mut Restart<N>, strategy: &S, rng: &mut R)
    where
        S: TourStrategy<N> + ?Sized,
        R: Rng,
    {
        let n = run.current.len();
        let i = rng.gen_range(0..n);
        let mut j = rng.gen_range(0..n - 1);
        if j >= i {
            j += 1;
        }

        run.current.swap(i, j);
        let keep = if strategy.is_acceptable(run.current.nodes()) {
            let candidate = strategy.tour_cost(run.current.nodes());
            let delta = candidate - run.current_cost;
            let accept =
                delta < 0.0 || rng.gen::<f64>() < (-delta.abs() / run.temperature).exp();
            if accept {
                run.current_cost = candidate;
            }
            accept
        } else {
            false
        };
        if !keep {
            run.current.swap(i, j);
        }

        run.temperature *= self.config.cooling_rate;
        run.iteration += 1;
    }
}

/// Working state of one restart.
struct Restart<N> {
    current: Tour<N>,
    current_cost: f64,
    temperature: f64,
    iteration: u64,
    state: SaState,
}
