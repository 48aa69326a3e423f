//! Run-time accumulation with fractional-millisecond carry.
//!
//! Tick deltas are floats (often a non-integer number of milliseconds),
//! so truncating each tick independently would lose up to a millisecond
//! per tick. The whole part goes into `elapsed_ms` and the fraction is
//! carried in `elapsed_remainder_ms`, keeping long runs drift-free.

use log::debug;

use crate::run::ActiveRun;

/// Advance the run's elapsed time by one tick delta.
pub fn advance(run: &mut ActiveRun, delta_seconds: f32, now_ms: u64) {
    if run.waiting_for_start {
        run.elapsed_ms = 0;
        run.elapsed_remainder_ms = 0.0;
        run.skip_next_time_increment = false;
        return;
    }
    if run.skip_next_time_increment {
        run.skip_next_time_increment = false;
        return;
    }
    if !delta_seconds.is_finite() || delta_seconds <= 0.0 {
        // No usable delta this tick; resync from the wall clock.
        debug!(
            "tick delta unusable ({delta_seconds}); falling back to wall clock for course {}",
            run.course_id
        );
        run.elapsed_ms = now_ms.saturating_sub(run.start_time_ms);
        run.elapsed_remainder_ms = 0.0;
        return;
    }
    let delta_ms = f64::from(delta_seconds) * 1000.0;
    let whole_ms = delta_ms as u64;
    let fraction_ms = delta_ms - whole_ms as f64 + run.elapsed_remainder_ms;
    let carry_ms = fraction_ms as u64;
    run.elapsed_remainder_ms = fraction_ms - carry_ms as f64;
    run.elapsed_ms += whole_ms + carry_ms;
}
