//! Fall-respawn timing and the absolute-Y void failsafe.

use glam::DVec3;

use parkour_core::types::MovementFlags;

use crate::run::{ActiveRun, FallTracker};

/// Configured fall timeout in milliseconds; zero disables the detector.
pub fn fall_timeout_ms(fall_respawn_seconds: f64) -> u64 {
    if fall_respawn_seconds <= 0.0 {
        return 0;
    }
    (fall_respawn_seconds * 1000.0).max(1.0) as u64
}

/// Run the in-run fall detector for one tick. Free-fall courses bypass
/// detection but still record the sample so the baseline stays fresh.
/// Returns true when the run should respawn.
pub fn check_run_fall(
    run: &mut ActiveRun,
    position: DVec3,
    movement: MovementFlags,
    timeout_ms: u64,
    free_fall_enabled: bool,
    now_ms: u64,
) -> bool {
    if free_fall_enabled {
        run.fall.track_only(position.y);
        return false;
    }
    if timeout_ms == 0 {
        return false;
    }
    run.fall.observe(
        position.y,
        movement.blocks_fall_tracking(),
        now_ms,
        timeout_ms,
    )
}

/// Idle variant: same hysteresis over a standalone tracker.
pub fn check_idle_fall(
    fall: &mut FallTracker,
    position: DVec3,
    movement: MovementFlags,
    timeout_ms: u64,
    now_ms: u64,
) -> bool {
    if timeout_ms == 0 {
        return false;
    }
    fall.observe(
        position.y,
        movement.blocks_fall_tracking(),
        now_ms,
        timeout_ms,
    )
}

/// The void failsafe fires at or below the configured floor, regardless
/// of run state. A non-finite floor disables it.
pub fn below_void_floor(y: f64, void_floor_y: f64) -> bool {
    void_floor_y.is_finite() && y <= void_floor_y
}
