//! Checkpoint and finish detection with sub-tick touch timing.
//!
//! Detection runs once per tick, but the recorded touch time is
//! interpolated along the segment the player moved this tick, so splits
//! are accurate to well under a tick even at low tick rates.

use glam::DVec3;

use parkour_core::constants::{
    FINISH_WARNING_INTERVAL_MS, TOUCH_RADIUS, TOUCH_RADIUS_SQ, TOUCH_VERTICAL_BONUS,
};
use parkour_core::course::Course;
use parkour_core::geometry::{distance_sq_with_vertical_bonus, segment_sphere_intersection};

use crate::run::ActiveRun;

/// The previous-tick observations checkpoint/finish timing interpolates
/// against. Captured before the time accumulator runs.
#[derive(Debug, Clone, Copy)]
pub struct DetectionWindow {
    pub previous_position: Option<DVec3>,
    pub previous_elapsed_ms: u64,
    /// Elapsed-time gain this tick (current minus previous), never negative.
    pub delta_ms: f64,
}

/// A checkpoint touched this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckpointTouch {
    pub index: usize,
    pub touch_time_ms: u64,
}

/// Outcome of the finish test for one tick.
#[derive(Debug, Clone, PartialEq)]
pub enum FinishCheck {
    NotTouched,
    /// Finish touched with checkpoints still missing; `warn` is set at
    /// most once per warning interval.
    MissingCheckpoints { warn: bool },
    Finished {
        duration_ms: u64,
        checkpoint_times_ms: Vec<u64>,
    },
}

/// Touch time for a target hit this tick: the elapsed time at which the
/// movement segment first entered the target's touch sphere, clamped
/// into the tick's elapsed window. Falls back to the current elapsed
/// time when no interpolation is possible.
pub fn resolve_touch_time_ms(
    run: &ActiveRun,
    window: &DetectionWindow,
    position: DVec3,
    target: DVec3,
) -> u64 {
    let current_elapsed_ms = run.elapsed();
    if run.waiting_for_start || window.delta_ms <= 0.0 {
        return current_elapsed_ms;
    }
    let Some(previous_position) = window.previous_position else {
        return current_elapsed_ms;
    };
    let Some(t) = segment_sphere_intersection(previous_position, position, target, TOUCH_RADIUS)
    else {
        return current_elapsed_ms;
    };
    let interpolated = window.previous_elapsed_ms + (window.delta_ms * t).round() as u64;
    interpolated.clamp(window.previous_elapsed_ms, current_elapsed_ms)
}

/// Test every untouched checkpoint against the player's position and
/// record hits. A fast player may collect several in one tick; all get
/// the same tick's interpolation inputs.
pub fn check_checkpoints(
    run: &mut ActiveRun,
    course: &Course,
    position: DVec3,
    window: &DetectionWindow,
) -> Vec<CheckpointTouch> {
    if run.practice_enabled() || course.checkpoints.is_empty() {
        return Vec::new();
    }
    if run.touched_checkpoints.len() >= course.checkpoints.len() {
        return Vec::new();
    }
    let mut touches = Vec::new();
    for (index, checkpoint) in course.checkpoints.iter().enumerate() {
        if run.touched_checkpoints.contains(&index) {
            continue;
        }
        let distance_sq =
            distance_sq_with_vertical_bonus(position, checkpoint.position, TOUCH_VERTICAL_BONUS);
        if distance_sq > TOUCH_RADIUS_SQ {
            continue;
        }
        run.touched_checkpoints.insert(index);
        run.last_checkpoint_index = Some(index);
        let touch_time_ms = resolve_touch_time_ms(run, window, position, checkpoint.position);
        run.checkpoint_touch_times.insert(index, touch_time_ms);
        touches.push(CheckpointTouch {
            index,
            touch_time_ms,
        });
    }
    touches
}

/// Test the finish point. Finishing requires every checkpoint touched;
/// a premature finish touch warns (rate limited) and stays re-testable.
pub fn check_finish(
    run: &mut ActiveRun,
    course: &Course,
    position: DVec3,
    window: &DetectionWindow,
    now_ms: u64,
) -> FinishCheck {
    if run.practice_enabled() || run.finish_touched {
        return FinishCheck::NotTouched;
    }
    let Some(finish) = course.finish.as_ref() else {
        return FinishCheck::NotTouched;
    };
    let distance_sq =
        distance_sq_with_vertical_bonus(position, finish.position, TOUCH_VERTICAL_BONUS);
    if distance_sq > TOUCH_RADIUS_SQ {
        return FinishCheck::NotTouched;
    }
    let checkpoint_count = course.checkpoints.len();
    if checkpoint_count > 0 && run.touched_checkpoints.len() < checkpoint_count {
        let warn = now_ms.saturating_sub(run.last_finish_warning_ms) >= FINISH_WARNING_INTERVAL_MS;
        if warn {
            run.last_finish_warning_ms = now_ms;
        }
        return FinishCheck::MissingCheckpoints { warn };
    }
    run.finish_touched = true;
    let duration_ms = resolve_touch_time_ms(run, window, position, finish.position);
    let checkpoint_times_ms = (0..checkpoint_count)
        .map(|i| run.checkpoint_touch_times.get(&i).copied().unwrap_or(0))
        .collect();
    FinishCheck::Finished {
        duration_ms,
        checkpoint_times_ms,
    }
}
