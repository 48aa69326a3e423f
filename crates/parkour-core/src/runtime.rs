//! Host runtime services consumed by the tracker.
//!
//! The tracker never touches world state or the wall clock directly;
//! everything flows through these traits so the tick pipeline stays
//! deterministic under test.

use std::time::{SystemTime, UNIX_EPOCH};

use uuid::Uuid;

use crate::events::Notice;
use crate::types::TeleportTarget;

/// Executes relocations. Failures are the host's problem; the tracker
/// has already updated its own state when this is called.
pub trait TeleportExecutor: Send + Sync {
    fn teleport(&self, player: Uuid, target: &TeleportTarget);
}

/// Receives progress and warning messages. Non-critical; sinks may drop
/// messages freely.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, player: Uuid, notice: &Notice);
}

/// Current network round-trip estimate per player, when the host has one.
pub trait PingSource: Send + Sync {
    fn ping_ms(&self, player: Uuid) -> Option<u32>;
}

/// Wall-clock milliseconds. Injected so fall timeouts and warning rate
/// limits are steppable in tests.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;
}

/// Production clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}
