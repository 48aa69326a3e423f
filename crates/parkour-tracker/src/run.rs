//! Per-run and per-player mutable state.

use std::collections::{HashMap, HashSet};

use glam::{DVec3, Vec3};

use parkour_core::constants::PING_SAMPLE_INTERVAL_MS;
use parkour_core::types::Transform;

/// Fall hysteresis over vertical position samples. Tagged so "falling
/// without a previous sample" cannot be expressed.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum FallTracker {
    /// No sample yet (fresh run, just respawned, or just reset).
    #[default]
    NoSample,
    /// Last sample seen while supported, ascending, or level.
    Steady { last_y: f64 },
    /// Descending since `since_ms`.
    Falling { last_y: f64, since_ms: u64 },
}

impl FallTracker {
    pub fn reset(&mut self) {
        *self = FallTracker::NoSample;
    }

    /// Feed one vertical sample. Returns true when the player has been
    /// descending for at least `timeout_ms`; the caller is expected to
    /// respawn and `reset` the tracker.
    pub fn observe(&mut self, y: f64, blocked: bool, now_ms: u64, timeout_ms: u64) -> bool {
        if blocked {
            *self = FallTracker::Steady { last_y: y };
            return false;
        }
        match *self {
            FallTracker::NoSample => {
                *self = FallTracker::Steady { last_y: y };
                false
            }
            FallTracker::Steady { last_y } => {
                if y < last_y {
                    *self = FallTracker::Falling {
                        last_y: y,
                        since_ms: now_ms,
                    };
                    // Descent just began; only a zero timeout fires here.
                    timeout_ms == 0
                } else {
                    *self = FallTracker::Steady { last_y: y };
                    false
                }
            }
            FallTracker::Falling { last_y, since_ms } => {
                if y < last_y {
                    *self = FallTracker::Falling {
                        last_y: y,
                        since_ms,
                    };
                    now_ms.saturating_sub(since_ms) >= timeout_ms
                } else {
                    *self = FallTracker::Steady { last_y: y };
                    false
                }
            }
        }
    }

    /// Record the sample without descent detection (free-fall courses).
    pub fn track_only(&mut self, y: f64) {
        *self = FallTracker::Steady { last_y: y };
    }
}

/// Ping sampling over the lifetime of one run.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PingStats {
    pub sample_count: u32,
    pub sum_ms: u64,
    /// Elapsed run time at which the next sample is due.
    pub next_sample_at_ms: u64,
    pub start_ping_ms: Option<u32>,
    pub finish_ping_ms: Option<u32>,
}

impl PingStats {
    pub fn reset(&mut self) {
        *self = PingStats::default();
    }

    /// Accumulate a sample and schedule the next one.
    pub fn record_sample(&mut self, elapsed_ms: u64, ping_ms: u32) {
        self.sample_count += 1;
        self.sum_ms += u64::from(ping_ms);
        self.next_sample_at_ms = elapsed_ms + PING_SAMPLE_INTERVAL_MS;
    }

    pub fn sample_due(&self, elapsed_ms: u64) -> bool {
        elapsed_ms >= self.next_sample_at_ms
    }

    /// Mean of the samples taken so far.
    pub fn average_ms(&self) -> Option<u32> {
        if self.sample_count == 0 {
            return None;
        }
        Some((self.sum_ms / u64::from(self.sample_count)) as u32)
    }
}

/// Practice overlay: checkpoint/finish scoring suspended in favor of a
/// single free-form checkpoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PracticeState {
    pub checkpoint: Option<Transform>,
    pub head_rotation: Option<Vec3>,
}

/// One run in progress. Owned by the registry, mutated only by the tick
/// pipeline for the owning player.
#[derive(Debug, Clone)]
pub struct ActiveRun {
    pub course_id: String,
    pub start_time_ms: u64,
    /// Accumulated run time in whole milliseconds.
    pub elapsed_ms: u64,
    /// Fractional-millisecond carry, always in `[0, 1)`.
    pub elapsed_remainder_ms: f64,
    pub waiting_for_start: bool,
    pub start_position: Option<DVec3>,
    /// One-shot: the arming tick must not also add a time delta.
    pub skip_next_time_increment: bool,
    /// Previous tick's position; `None` right after (re)spawn.
    pub last_position: Option<DVec3>,
    pub touched_checkpoints: HashSet<usize>,
    pub checkpoint_touch_times: HashMap<usize, u64>,
    pub last_checkpoint_index: Option<usize>,
    /// One-shot latch; a finished run is cleared in the same tick.
    pub finish_touched: bool,
    pub last_finish_warning_ms: u64,
    pub fall: FallTracker,
    pub practice: Option<PracticeState>,
    pub ping: PingStats,
}

impl ActiveRun {
    pub fn new(course_id: impl Into<String>, now_ms: u64) -> Self {
        Self {
            course_id: course_id.into(),
            start_time_ms: now_ms,
            elapsed_ms: 0,
            elapsed_remainder_ms: 0.0,
            waiting_for_start: false,
            start_position: None,
            skip_next_time_increment: false,
            last_position: None,
            touched_checkpoints: HashSet::new(),
            checkpoint_touch_times: HashMap::new(),
            last_checkpoint_index: None,
            finish_touched: false,
            last_finish_warning_ms: 0,
            fall: FallTracker::NoSample,
            practice: None,
            ping: PingStats::default(),
        }
    }

    /// Elapsed run time; zero while armed and waiting.
    pub fn elapsed(&self) -> u64 {
        if self.waiting_for_start {
            0
        } else {
            self.elapsed_ms
        }
    }

    pub fn practice_enabled(&self) -> bool {
        self.practice.is_some()
    }

    /// Checkpoint to respawn at: the most recently touched index when it
    /// is still valid for the course, otherwise the highest touched
    /// index that is.
    pub fn resolve_checkpoint_index(&self, checkpoint_count: usize) -> Option<usize> {
        if let Some(index) = self.last_checkpoint_index {
            if index < checkpoint_count {
                return Some(index);
            }
        }
        self.touched_checkpoints
            .iter()
            .copied()
            .filter(|&i| i < checkpoint_count)
            .max()
    }
}
