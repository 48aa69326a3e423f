//! Notifications emitted by the tracker for the host's chat/HUD layer.

use serde::{Deserialize, Serialize};

/// Structured progress and warning messages. The sink owns rendering;
/// the tracker only reports what happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Notice {
    /// A run was installed and armed from a start trigger or command.
    RunStarted { course: String },
    /// The run ended without finishing (leave trigger).
    RunEnded { course: String },
    /// A start trigger was touched on a course with no start placement.
    NoStartSet { course: String },
    /// An untouched checkpoint was reached. `delta_vs_best_ms` compares
    /// against the personal-best split when one exists (negative = faster).
    CheckpointReached {
        index: usize,
        split_ms: u64,
        delta_vs_best_ms: Option<i64>,
    },
    /// Finish touched with checkpoints still missing (rate limited).
    MissedCheckpoints,
    /// The run finished and was handed to the progress recorder.
    RunCompleted {
        course: String,
        duration_ms: u64,
        delta_vs_best_ms: Option<i64>,
    },
    /// Experience granted for the completion.
    XpAwarded { amount: u64 },
    /// The progress recorder failed; the result may not have been saved.
    CompletionSaveFailed,
    /// Ping changed significantly between arming and finishing.
    LatencyShift {
        start_ping_ms: u32,
        finish_ping_ms: u32,
    },
}
