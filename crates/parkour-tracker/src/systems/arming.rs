//! Start-arming: a freshly started run waits at the course start until
//! the player moves past a tiny threshold, then the timer begins.

use glam::DVec3;

use parkour_core::constants::START_MOVE_THRESHOLD_SQ;
use parkour_core::types::Transform;

use crate::run::ActiveRun;

/// Put the run into the waiting-for-start state at `start`, or directly
/// into the running state when the course has no start placement.
pub fn arm_on_start(run: &mut ActiveRun, start: Option<&Transform>, now_ms: u64) {
    let Some(start) = start else {
        run.waiting_for_start = false;
        run.start_position = None;
        return;
    };
    run.start_position = Some(start.position);
    run.waiting_for_start = true;
    run.start_time_ms = now_ms;
    run.elapsed_ms = 0;
    run.elapsed_remainder_ms = 0.0;
    run.skip_next_time_increment = false;
    run.ping.reset();
}

/// While waiting, transition to running once the player has moved past
/// the arming threshold. Returns true on the tick that arms the run.
pub fn update_start_on_movement(run: &mut ActiveRun, position: DVec3, now_ms: u64) -> bool {
    if !run.waiting_for_start {
        return false;
    }
    let Some(start_position) = run.start_position else {
        return false;
    };
    if position.distance_squared(start_position) <= START_MOVE_THRESHOLD_SQ {
        return false;
    }
    run.waiting_for_start = false;
    run.start_time_ms = now_ms;
    run.elapsed_ms = 0;
    run.elapsed_remainder_ms = 0.0;
    // The tick that detects the movement must not also add a delta.
    run.skip_next_time_increment = true;
    run.ping.reset();
    true
}
