//! Course model and the read-only provider interface.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::types::Transform;

/// A parkour course: start/finish/trigger placements and an ordered
/// checkpoint list. All placements are optional; the tracker skips any
/// check whose placement is unset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Course {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Where an armed run waits and where respawns fall back to.
    pub start: Option<Transform>,
    /// Walking into this point starts a run on the course.
    pub start_trigger: Option<Transform>,
    /// Walking into this point abandons the run.
    pub leave_trigger: Option<Transform>,
    /// Where the leave trigger deposits the player, if anywhere.
    pub leave_teleport: Option<Transform>,
    pub checkpoints: Vec<Transform>,
    pub finish: Option<Transform>,
    /// Courses built around long drops disable the fall-respawn detector.
    #[serde(default)]
    pub free_fall_enabled: bool,
}

impl Course {
    /// Human-facing name, falling back to the id.
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

/// Read-only course storage. Snapshots are stable for the duration of a
/// tick; the provider may swap content between ticks.
pub trait CourseProvider: Send + Sync {
    fn course(&self, course_id: &str) -> Option<Arc<Course>>;

    /// All known courses, for start-trigger scanning.
    fn courses(&self) -> Vec<Arc<Course>>;
}
