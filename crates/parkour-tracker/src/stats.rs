//! Teleport-cause counters.
//!
//! Incremented from the tick pipeline, drained by a background metrics
//! reporter. Increment and drain race on the same counters, so each
//! counter is read-and-zeroed with a single atomic swap.

use std::sync::atomic::{AtomicU32, Ordering};

use serde::{Deserialize, Serialize};

/// Why a teleport was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TeleportCause {
    /// Player walked into a course's start trigger.
    StartTrigger,
    /// Player walked into the leave trigger.
    LeaveTrigger,
    /// Fall or void respawn during an active run.
    RunRespawn,
    /// Fall or void respawn with no active run.
    IdleRespawn,
    Finish,
    /// Manual teleport back to the last (or practice) checkpoint.
    Checkpoint,
}

/// Live per-player counters. Created lazily on first increment.
#[derive(Debug, Default)]
pub struct TeleportStats {
    start_trigger: AtomicU32,
    leave_trigger: AtomicU32,
    run_respawn: AtomicU32,
    idle_respawn: AtomicU32,
    finish: AtomicU32,
    checkpoint: AtomicU32,
}

impl TeleportStats {
    pub fn increment(&self, cause: TeleportCause) {
        self.counter(cause).fetch_add(1, Ordering::Relaxed);
    }

    /// Atomically read and zero all six counters.
    pub fn snapshot_and_reset(&self) -> TeleportStatsSnapshot {
        TeleportStatsSnapshot {
            start_trigger: self.start_trigger.swap(0, Ordering::Relaxed),
            leave_trigger: self.leave_trigger.swap(0, Ordering::Relaxed),
            run_respawn: self.run_respawn.swap(0, Ordering::Relaxed),
            idle_respawn: self.idle_respawn.swap(0, Ordering::Relaxed),
            finish: self.finish.swap(0, Ordering::Relaxed),
            checkpoint: self.checkpoint.swap(0, Ordering::Relaxed),
        }
    }

    /// True when every counter currently reads zero. Only meaningful
    /// under the registry's shard lock during removal.
    pub fn is_zero(&self) -> bool {
        self.start_trigger.load(Ordering::Relaxed) == 0
            && self.leave_trigger.load(Ordering::Relaxed) == 0
            && self.run_respawn.load(Ordering::Relaxed) == 0
            && self.idle_respawn.load(Ordering::Relaxed) == 0
            && self.finish.load(Ordering::Relaxed) == 0
            && self.checkpoint.load(Ordering::Relaxed) == 0
    }

    fn counter(&self, cause: TeleportCause) -> &AtomicU32 {
        match cause {
            TeleportCause::StartTrigger => &self.start_trigger,
            TeleportCause::LeaveTrigger => &self.leave_trigger,
            TeleportCause::RunRespawn => &self.run_respawn,
            TeleportCause::IdleRespawn => &self.idle_respawn,
            TeleportCause::Finish => &self.finish,
            TeleportCause::Checkpoint => &self.checkpoint,
        }
    }
}

/// Drained counter values for one player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeleportStatsSnapshot {
    pub start_trigger: u32,
    pub leave_trigger: u32,
    pub run_respawn: u32,
    pub idle_respawn: u32,
    pub finish: u32,
    pub checkpoint: u32,
}

impl TeleportStatsSnapshot {
    pub fn is_empty(&self) -> bool {
        *self == TeleportStatsSnapshot::default()
    }

    pub fn get(&self, cause: TeleportCause) -> u32 {
        match cause {
            TeleportCause::StartTrigger => self.start_trigger,
            TeleportCause::LeaveTrigger => self.leave_trigger,
            TeleportCause::RunRespawn => self.run_respawn,
            TeleportCause::IdleRespawn => self.idle_respawn,
            TeleportCause::Finish => self.finish,
            TeleportCause::Checkpoint => self.checkpoint,
        }
    }
}
