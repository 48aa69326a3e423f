//! Progress recording interface: best times, splits, and completions.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// A finished run, handed to the recorder exactly once per completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub player: Uuid,
    pub course_id: String,
    pub duration_ms: u64,
    /// Interpolated touch time per checkpoint index; untouched entries
    /// (possible only on courses edited mid-run) are 0.
    pub checkpoint_times_ms: Vec<u64>,
    /// Mean of the ping samples taken during the run, when any were.
    pub average_ping_ms: Option<u32>,
}

/// What the recorder decided about a completion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressOutcome {
    pub new_best: bool,
    pub first_completion: bool,
    pub xp_awarded: u64,
}

/// Persistence failure at the recording seam. The tracker warns the
/// player and clears the run regardless; retrying is the recorder's job.
#[derive(Debug, Error)]
pub enum ProgressError {
    #[error("progress storage unavailable: {0}")]
    Unavailable(String),
    #[error("completion rejected: {0}")]
    Rejected(String),
}

/// Best-time and completion storage, owned by the surrounding plugin.
pub trait ProgressRecorder: Send + Sync {
    /// Personal-best duration on a course, if the player has finished it.
    fn best_time_ms(&self, player: Uuid, course_id: &str) -> Option<u64>;

    /// Personal-best checkpoint splits, indexed by checkpoint. Empty when
    /// the player has no recorded completion.
    fn checkpoint_splits(&self, player: Uuid, course_id: &str) -> Vec<u64>;

    fn record_completion(&self, record: &CompletionRecord)
        -> Result<ProgressOutcome, ProgressError>;
}
