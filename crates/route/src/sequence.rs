//! Flight line sequencing as a tour over line indices.
//!
//! # Algorithm
//!
//! A node is the index of a flight line. For a given visiting order the best
//! flying direction of every line follows from a two-state dynamic program:
//!
//! ```text
//! cost[i][o] = min over o' of cost[i-1][o'] + |exit(i-1, o') - entry(i, o)|
//! ```
//!
//! where `o` is forward or reversed, `entry` is the point the line is entered
//! at and `exit` the point it is left at. The first line is entered from the
//! home position when one is configured. Line lengths are the same for every
//! order and are left out, so the cost is the total transit distance.
//!
//! # References
//!
//! - Bähnemann et al. (2019), "Revisiting boustrophedon coverage path planning
//!   as a generalized traveling salesman problem"

use crate::config::RouteConfig;
use u_survey_core::geometry::distance;
use u_survey_core::sa::TourStrategy;
use u_survey_plan::FlightLine;

/// Start and end of a line as currently flown.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Ends {
    start: (f64, f64),
    end: (f64, f64),
}

impl Ends {
    fn entry(&self, reversed: bool) -> (f64, f64) {
        if reversed {
            self.end
        } else {
            self.start
        }
    }

    fn exit(&self, reversed: bool) -> (f64, f64) {
        if reversed {
            self.start
        } else {
            self.end
        }
    }
}

/// Transit-distance cost model over flight line indices.
#[derive(Debug, Clone)]
pub struct LineTourStrategy {
    lines: Vec<Ends>,
    home: Option<(f64, f64)>,
    allow_reversal: bool,
    pinned: Option<usize>,
}

impl LineTourStrategy {
    /// Builds the cost model for `lines` in their current directions.
    ///
    /// With `pin_first_line`, index 0 must stay first and keeps its direction.
    pub fn new(lines: &[FlightLine], config: &RouteConfig) -> Self {
        Self {
            lines: lines
                .iter()
                .map(|l| Ends {
                    start: l.start(),
                    end: l.end(),
                })
                .collect(),
            home: config.home,
            allow_reversal: config.allow_line_reversal,
            pinned: (config.pin_first_line && !lines.is_empty()).then_some(0),
        }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Transit cost of `order` with every line flown in its current direction.
    pub fn fixed_cost(&self, order: &[usize]) -> f64 {
        let mut cost = 0.0;
        let mut position = self.home;
        for &i in order {
            let ends = self.lines[i];
            if let Some(p) = position {
                cost += distance(p, ends.start);
            }
            position = Some(ends.end);
        }
        cost
    }

    /// Cheapest directions for `order`: the transit cost and, per position,
    /// whether that line is flown reversed.
    pub fn orientations(&self, order: &[usize]) -> (f64, Vec<bool>) {
        if order.is_empty() {
            return (0.0, Vec::new());
        }

        let options = |pos: usize, line: usize| -> &'static [bool] {
            let pinned = pos == 0 && self.pinned == Some(line);
            if self.allow_reversal && !pinned {
                &[false, true]
            } else {
                &[false]
            }
        };

        // cost[o] for the line at the current position, o = reversed as index.
        let mut cost = [f64::INFINITY; 2];
        let first = self.lines[order[0]];
        for &o in options(0, order[0]) {
            cost[o as usize] = self.home.map_or(0.0, |h| distance(h, first.entry(o)));
        }

        let mut came_from: Vec<[bool; 2]> = Vec::with_capacity(order.len());
        came_from.push([false; 2]);

        for pos in 1..order.len() {
            let prev = self.lines[order[pos - 1]];
            let cur = self.lines[order[pos]];
            let mut next = [f64::INFINITY; 2];
            let mut from = [false; 2];
            for &o in options(pos, order[pos]) {
                for p in [false, true] {
                    let c = cost[p as usize];
                    if !c.is_finite() {
                        continue;
                    }
                    let candidate = c + distance(prev.exit(p), cur.entry(o));
                    if candidate < next[o as usize] {
                        next[o as usize] = candidate;
                        from[o as usize] = p;
                    }
                }
            }
            cost = next;
            came_from.push(from);
        }

        let mut o = cost[1] < cost[0];
        let total = cost[o as usize];
        let mut reversed = vec![false; order.len()];
        for pos in (0..order.len()).rev() {
            reversed[pos] = o;
            o = came_from[pos][o as usize];
        }
        (total, reversed)
    }
}

impl TourStrategy<usize> for LineTourStrategy {
    /// Transit from the end of `a` to the start of `b` as currently flown.
    fn distance(&self, a: &usize, b: &usize) -> f64 {
        distance(self.lines[*a].end, self.lines[*b].start)
    }

    fn tour_cost(&self, nodes: &[usize]) -> f64 {
        self.orientations(nodes).0
    }

    fn is_acceptable(&self, nodes: &[usize]) -> bool {
        match self.pinned {
            Some(first) => nodes.first() == Some(&first),
            None => true,
        }
    }
}
