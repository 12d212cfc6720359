//! Turn-radius alignment between consecutive flight lines.
//!
//! # Algorithm
//!
//! For each pair of consecutive, antiparallel lines that run side by side,
//! the exit of the first line and the entry of the second are moved to a
//! common along-track position `p`:
//!
//! ```text
//! p = max(exit, entry + max(0, turn_radius - gap))
//! ```
//!
//! measured along the first line's direction, where `gap` is the distance
//! between the two tracks. Lines are only ever extended, so the turn between
//! them is a clean 180° and tight turns get room to swing out.

use crate::flight_line::FlightLine;
use crate::flight_plan::FlightPlan;
use crate::platform::PlatformDescription;
use u_survey_core::geometry::EPSILON;

/// Cosine below which two directions count as antiparallel.
const ANTIPARALLEL_COS: f64 = -1.0 + 1e-6;

/// Extensions `(before, after)` per line, in metres, for lines in flying order.
pub fn turn_extensions(lines: &[&FlightLine], turn_radius: f64) -> Vec<(f64, f64)> {
    let mut extensions = vec![(0.0, 0.0); lines.len()];
    for (i, pair) in lines.windows(2).enumerate() {
        let (cur, next) = (pair[0], pair[1]);
        let d = cur.direction();
        let nd = next.direction();
        if d.0 * nd.0 + d.1 * nd.1 > ANTIPARALLEL_COS {
            continue;
        }

        let along = |p: (f64, f64)| p.0 * d.0 + p.1 * d.1;
        let (cur_lo, cur_hi) = (along(cur.start()), along(cur.end()));
        let (next_lo, next_hi) = (along(next.end()), along(next.start()));
        if cur_hi < next_lo - EPSILON || next_hi < cur_lo - EPSILON {
            // Not side by side: no shared turn to shape.
            continue;
        }

        let exit = cur.end();
        let entry = next.start();
        let gap = ((entry.0 - exit.0) * d.1 - (entry.1 - exit.1) * d.0).abs();
        let offset = (turn_radius - gap).max(0.0);
        let target = cur_hi.max(next_hi + offset);

        extensions[i].1 += target - cur_hi;
        extensions[i + 1].0 += target - next_hi;
    }
    extensions
}

/// Extends the lines of `plan` so every turn between neighbouring rows
/// respects the platform's turn radius. Returns the number of extended lines.
pub fn assure_turn_radius(plan: &mut FlightPlan, platform: &PlatformDescription) -> usize {
    let extensions = turn_extensions(&plan.lines(), platform.turn_radius);
    let mut index = 0;
    let mut extended = 0;
    plan.walk_lines_mut(&mut |line: &mut FlightLine| {
        let (before, after) = extensions[index];
        index += 1;
        if before > EPSILON || after > EPSILON {
            line.enlarge(before, after);
            extended += 1;
        }
    });
    if extended > 0 {
        log::debug!(
            "extended {extended} lines for a {:.1} m turn radius",
            platform.turn_radius
        );
    }
    extended
}
