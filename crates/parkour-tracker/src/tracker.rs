//! The run tracker: per-player registries and the per-tick pipeline.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use dashmap::{DashMap, DashSet};
use glam::{DVec3, Vec3};
use log::{debug, warn};
use uuid::Uuid;

use parkour_core::constants::{
    DEFAULT_FALL_RESPAWN_SECONDS, FALL_FAILSAFE_VOID_Y, PING_DELTA_THRESHOLD_MS,
    PING_SAMPLE_INTERVAL_MS, TOUCH_RADIUS_SQ,
};
use parkour_core::course::{Course, CourseProvider};
use parkour_core::events::Notice;
use parkour_core::progress::{CompletionRecord, ProgressRecorder};
use parkour_core::runtime::{Clock, NotificationSink, PingSource, TeleportExecutor};
use parkour_core::types::{MovementFlags, TeleportTarget, Transform};

use crate::run::{ActiveRun, FallTracker, PracticeState};
use crate::stats::{TeleportCause, TeleportStats, TeleportStatsSnapshot};
use crate::systems::checkpoints::{self, DetectionWindow, FinishCheck};
use crate::systems::{arming, falling, timing};

/// Tunables owned by the surrounding plugin's settings layer.
#[derive(Debug, Clone, Copy)]
pub struct TrackerConfig {
    /// Continuous-descent timeout before a safety respawn; `<= 0`
    /// disables fall respawns entirely.
    pub fall_respawn_seconds: f64,
    /// Absolute void floor; non-finite disables the failsafe.
    pub void_floor_y: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            fall_respawn_seconds: DEFAULT_FALL_RESPAWN_SECONDS,
            void_floor_y: FALL_FAILSAFE_VOID_Y,
        }
    }
}

/// Host collaborators, handed in at construction. The tracker reaches
/// nothing through globals.
pub struct Collaborators {
    pub courses: Arc<dyn CourseProvider>,
    pub progress: Arc<dyn ProgressRecorder>,
    pub teleports: Arc<dyn TeleportExecutor>,
    pub notices: Arc<dyn NotificationSink>,
    pub ping: Arc<dyn PingSource>,
    pub clock: Arc<dyn Clock>,
}

/// Tracks active runs, checkpoint/finish detection, fall respawns, and
/// teleport-cause counters for every player.
///
/// Per-player state lives in concurrent maps so the host's worker pool
/// may tick different players concurrently; any one player's state is
/// only ever mutated by the tick processing that player.
pub struct RunTracker {
    config: TrackerConfig,
    courses: Arc<dyn CourseProvider>,
    progress: Arc<dyn ProgressRecorder>,
    teleports: Arc<dyn TeleportExecutor>,
    notices: Arc<dyn NotificationSink>,
    ping: Arc<dyn PingSource>,
    clock: Arc<dyn Clock>,
    runs: DashMap<Uuid, ActiveRun>,
    idle_falls: DashMap<Uuid, FallTracker>,
    teleport_stats: DashMap<Uuid, TeleportStats>,
    ready: DashSet<Uuid>,
}

impl RunTracker {
    pub fn new(config: TrackerConfig, collaborators: Collaborators) -> Self {
        Self {
            config,
            courses: collaborators.courses,
            progress: collaborators.progress,
            teleports: collaborators.teleports,
            notices: collaborators.notices,
            ping: collaborators.ping,
            clock: collaborators.clock,
            runs: DashMap::new(),
            idle_falls: DashMap::new(),
            teleport_stats: DashMap::new(),
            ready: DashSet::new(),
        }
    }

    // ---- Lifecycle ----

    /// A player is ticked only after the host marks them ready (fully
    /// spawned in); earlier positions are join-teleport noise.
    pub fn mark_player_ready(&self, player: Uuid) {
        self.ready.insert(player);
    }

    /// Install a fresh run on `course_id`, replacing any existing run.
    /// With a start transform the run begins armed at that point.
    pub fn start(&self, player: Uuid, course_id: &str, start: Option<&Transform>) {
        let now_ms = self.clock.now_ms();
        let mut run = ActiveRun::new(course_id, now_ms);
        arming::arm_on_start(&mut run, start, now_ms);
        self.runs.insert(player, run);
        self.idle_falls.remove(&player);
    }

    /// Remove the player's active run, if any.
    pub fn clear(&self, player: Uuid) {
        self.runs.remove(&player);
    }

    /// Drop every piece of per-player state (disconnect).
    pub fn clear_player(&self, player: Uuid) {
        self.runs.remove(&player);
        self.idle_falls.remove(&player);
        self.teleport_stats.remove(&player);
        self.ready.remove(&player);
    }

    /// Remove state for players no longer online. An empty set means the
    /// host could not enumerate players; wipe everything rather than let
    /// stale entries accumulate.
    pub fn sweep(&self, online: &HashSet<Uuid>) {
        if online.is_empty() {
            let dropped = self.runs.len();
            self.runs.clear();
            self.idle_falls.clear();
            self.teleport_stats.clear();
            self.ready.clear();
            if dropped > 0 {
                debug!("sweep with empty online set dropped {dropped} active runs");
            }
            return;
        }
        self.runs.retain(|id, _| online.contains(id));
        self.idle_falls.retain(|id, _| online.contains(id));
        self.teleport_stats.retain(|id, _| online.contains(id));
        self.ready.retain(|id| online.contains(id));
    }

    // ---- Queries ----

    pub fn active_course_id(&self, player: Uuid) -> Option<String> {
        self.runs.get(&player).map(|run| run.course_id.clone())
    }

    /// Elapsed run time; `0` while armed and waiting, `None` without a run.
    pub fn elapsed_ms(&self, player: Uuid) -> Option<u64> {
        self.runs.get(&player).map(|run| run.elapsed())
    }

    /// `(touched, total)` checkpoint counts for the active course.
    pub fn checkpoint_progress(&self, player: Uuid) -> Option<(usize, usize)> {
        let run = self.runs.get(&player)?;
        let course = self.courses.course(&run.course_id)?;
        let total = course.checkpoints.len();
        Some((run.touched_checkpoints.len().min(total), total))
    }

    /// Most recently touched checkpoint and its split time.
    pub fn last_checkpoint_split(&self, player: Uuid) -> Option<(usize, u64)> {
        let run = self.runs.get(&player)?;
        let index = run.last_checkpoint_index?;
        let time_ms = run.checkpoint_touch_times.get(&index).copied()?;
        Some((index, time_ms))
    }

    // ---- Practice mode ----

    pub fn is_practice_enabled(&self, player: Uuid) -> bool {
        self.runs
            .get(&player)
            .map(|run| run.practice_enabled())
            .unwrap_or(false)
    }

    /// Switch the run into practice mode, discarding checkpoint progress
    /// so a later disable cannot finish with practice-era touches.
    pub fn enable_practice(&self, player: Uuid) -> bool {
        let Some(mut run) = self.runs.get_mut(&player) else {
            return false;
        };
        run.practice = Some(PracticeState::default());
        run.touched_checkpoints.clear();
        run.checkpoint_touch_times.clear();
        run.last_checkpoint_index = None;
        run.finish_touched = false;
        true
    }

    /// Leave practice mode, discarding the overlay state.
    pub fn disable_practice(&self, player: Uuid) -> bool {
        let Some(mut run) = self.runs.get_mut(&player) else {
            return false;
        };
        run.practice.take().is_some()
    }

    /// Set the free-form practice checkpoint at the player's current
    /// placement.
    pub fn set_practice_checkpoint(
        &self,
        player: Uuid,
        transform: Transform,
        head_rotation: Option<Vec3>,
    ) -> bool {
        let Some(mut run) = self.runs.get_mut(&player) else {
            return false;
        };
        let Some(practice) = run.practice.as_mut() else {
            return false;
        };
        practice.checkpoint = Some(transform);
        practice.head_rotation = head_rotation;
        true
    }

    /// Teleport back to the practice checkpoint (practice mode) or the
    /// resolved last checkpoint. Clears fall tracking and the previous
    /// position sample so the next tick starts a fresh segment.
    pub fn teleport_to_last_checkpoint(&self, player: Uuid) -> bool {
        let Some(mut run) = self.runs.get_mut(&player) else {
            return false;
        };
        if let Some(practice) = run.practice.clone() {
            let Some(checkpoint) = practice.checkpoint else {
                return false;
            };
            self.teleports.teleport(
                player,
                &TeleportTarget::Point {
                    transform: checkpoint,
                    head_rotation: practice.head_rotation,
                },
            );
        } else {
            let Some(course) = self.courses.course(&run.course_id) else {
                return false;
            };
            let Some(index) = run.resolve_checkpoint_index(course.checkpoints.len()) else {
                return false;
            };
            self.teleports
                .teleport(player, &TeleportTarget::point(course.checkpoints[index]));
        }
        self.record_teleport(player, TeleportCause::Checkpoint);
        run.fall.reset();
        run.last_position = None;
        true
    }

    /// Restart the active run from the course start, preserving any
    /// practice overlay across the reset.
    pub fn reset_run_to_start(&self, player: Uuid) -> bool {
        let Some(course_id) = self.active_course_id(player) else {
            return false;
        };
        let Some(course) = self.courses.course(&course_id) else {
            return false;
        };
        let Some(start) = course.start else {
            return false;
        };
        let practice = self.runs.get(&player).and_then(|run| run.practice.clone());
        self.start(player, &course_id, Some(&start));
        if practice.is_some() {
            if let Some(mut run) = self.runs.get_mut(&player) {
                run.practice = practice;
            }
        }
        self.teleports
            .teleport(player, &TeleportTarget::point(start));
        true
    }

    // ---- Teleport stats ----

    /// Atomically drain all teleport counters. Players whose counters
    /// are all zero are removed from the table; the removal re-checks
    /// under the shard lock so a racing increment is never dropped.
    pub fn drain_teleport_stats(&self) -> HashMap<Uuid, TeleportStatsSnapshot> {
        if self.teleport_stats.is_empty() {
            return HashMap::new();
        }
        let players: Vec<Uuid> = self
            .teleport_stats
            .iter()
            .map(|entry| *entry.key())
            .collect();
        let mut snapshots = HashMap::new();
        for player in players {
            let snapshot = match self.teleport_stats.get(&player) {
                Some(stats) => stats.snapshot_and_reset(),
                None => continue,
            };
            if snapshot.is_empty() {
                self.teleport_stats
                    .remove_if(&player, |_, stats| stats.is_zero());
            } else {
                snapshots.insert(player, snapshot);
            }
        }
        snapshots
    }

    // ---- Tick pipeline ----

    /// The single per-tick entry point. Call once per ready player per
    /// simulation tick with the player's current position, movement
    /// flags, and the tick delta in seconds.
    pub fn tick(
        &self,
        player: Uuid,
        position: DVec3,
        movement: MovementFlags,
        delta_seconds: f32,
    ) {
        if !self.ready.contains(&player) {
            return;
        }
        // The void failsafe outranks every other detector.
        if falling::below_void_floor(position.y, self.config.void_floor_y) {
            self.void_respawn(player);
            return;
        }
        if self.runs.contains_key(&player) {
            let now_ms = self.clock.now_ms();
            if self.tick_run(player, position, movement, delta_seconds, now_ms) {
                self.runs.remove(&player);
            }
        } else {
            let now_ms = self.clock.now_ms();
            self.tick_idle(player, position, movement, now_ms);
        }
    }

    /// Tick a player with an active run. Returns true when the run ended
    /// this tick and must be removed from the registry.
    fn tick_run(
        &self,
        player: Uuid,
        position: DVec3,
        movement: MovementFlags,
        delta_seconds: f32,
        now_ms: u64,
    ) -> bool {
        let Some(mut entry) = self.runs.get_mut(&player) else {
            return false;
        };
        let run = entry.value_mut();
        let Some(course) = self.courses.course(&run.course_id) else {
            // Course deleted mid-run; leave the run alone until the
            // player leaves or the course comes back.
            return false;
        };

        if arming::update_start_on_movement(run, position, now_ms) {
            run.ping.start_ping_ms = self.ping.ping_ms(player);
            debug!("run armed for {player} on course {}", run.course_id);
        }

        let previous_elapsed_ms = run.elapsed();
        let previous_position = run.last_position;
        timing::advance(run, delta_seconds, now_ms);
        let current_elapsed_ms = run.elapsed();
        let window = DetectionWindow {
            previous_position,
            previous_elapsed_ms,
            delta_ms: current_elapsed_ms.saturating_sub(previous_elapsed_ms) as f64,
        };

        self.sample_ping(player, run);

        // Leave trigger abandons the run before any scoring.
        if let Some(trigger) = course.leave_trigger.as_ref() {
            if position.distance_squared(trigger.position) <= TOUCH_RADIUS_SQ {
                if let Some(target) = course.leave_teleport.as_ref() {
                    self.teleports
                        .teleport(player, &TeleportTarget::point(*target));
                    self.record_teleport(player, TeleportCause::LeaveTrigger);
                }
                self.notices.notify(
                    player,
                    &Notice::RunEnded {
                        course: course.display_name().to_string(),
                    },
                );
                return true;
            }
        }

        let touches = checkpoints::check_checkpoints(run, &course, position, &window);
        if !touches.is_empty() {
            let best_splits = self.progress.checkpoint_splits(player, &course.id);
            for touch in touches {
                let delta_vs_best_ms = best_splits
                    .get(touch.index)
                    .copied()
                    .filter(|&best| best > 0)
                    .map(|best| touch.touch_time_ms as i64 - best as i64);
                self.notices.notify(
                    player,
                    &Notice::CheckpointReached {
                        index: touch.index,
                        split_ms: touch.touch_time_ms,
                        delta_vs_best_ms,
                    },
                );
            }
        }

        let timeout_ms = falling::fall_timeout_ms(self.config.fall_respawn_seconds);
        if falling::check_run_fall(
            run,
            position,
            movement,
            timeout_ms,
            course.free_fall_enabled,
            now_ms,
        ) {
            run.fall.reset();
            // Falling before the first checkpoint re-arms the run so the
            // retry gets a clean timer.
            if run.last_checkpoint_index.is_none() {
                arming::arm_on_start(run, course.start.as_ref(), now_ms);
            }
            self.respawn_into_run(player, run, &course);
            self.record_teleport(player, TeleportCause::RunRespawn);
            return false;
        }

        match checkpoints::check_finish(run, &course, position, &window, now_ms) {
            FinishCheck::NotTouched => {}
            FinishCheck::MissingCheckpoints { warn } => {
                if warn {
                    self.notices.notify(player, &Notice::MissedCheckpoints);
                }
            }
            FinishCheck::Finished {
                duration_ms,
                checkpoint_times_ms,
            } => {
                self.finish_run(player, run, &course, duration_ms, checkpoint_times_ms);
                return true;
            }
        }

        run.last_position = Some(position);
        false
    }

    /// Tick a player with no active run: idle fall protection, then
    /// start-trigger scanning.
    fn tick_idle(&self, player: Uuid, position: DVec3, movement: MovementFlags, now_ms: u64) {
        let timeout_ms = falling::fall_timeout_ms(self.config.fall_respawn_seconds);
        if timeout_ms > 0 {
            let mut fall = self.idle_falls.entry(player).or_default();
            if falling::check_idle_fall(&mut fall, position, movement, timeout_ms, now_ms) {
                fall.reset();
                drop(fall);
                self.teleports.teleport(player, &TeleportTarget::WorldSpawn);
                self.record_teleport(player, TeleportCause::IdleRespawn);
                return;
            }
        }
        let Some(course) = self.find_start_trigger_course(position) else {
            return;
        };
        self.start_run_from_trigger(player, &course);
    }

    fn find_start_trigger_course(&self, position: DVec3) -> Option<Arc<Course>> {
        self.courses.courses().into_iter().find(|course| {
            course
                .start_trigger
                .as_ref()
                .is_some_and(|trigger| {
                    position.distance_squared(trigger.position) <= TOUCH_RADIUS_SQ
                })
        })
    }

    fn start_run_from_trigger(&self, player: Uuid, course: &Course) {
        let Some(start) = course.start else {
            self.notices.notify(
                player,
                &Notice::NoStartSet {
                    course: course.display_name().to_string(),
                },
            );
            return;
        };
        self.start(player, &course.id, Some(&start));
        self.teleports
            .teleport(player, &TeleportTarget::point(start));
        self.record_teleport(player, TeleportCause::StartTrigger);
        self.notices.notify(
            player,
            &Notice::RunStarted {
                course: course.display_name().to_string(),
            },
        );
    }

    /// Void failsafe respawn: back into the run when a course is still
    /// resolvable, otherwise to world spawn.
    fn void_respawn(&self, player: Uuid) {
        if let Some(mut run) = self.runs.get_mut(&player) {
            if let Some(course) = self.courses.course(&run.course_id) {
                self.respawn_into_run(player, &mut run, &course);
                run.fall.reset();
                self.record_teleport(player, TeleportCause::RunRespawn);
                return;
            }
        }
        self.teleports.teleport(player, &TeleportTarget::WorldSpawn);
        self.record_teleport(player, TeleportCause::IdleRespawn);
    }

    /// Teleport into the run: practice checkpoint first, then the
    /// resolved last checkpoint, then the course start.
    fn respawn_into_run(&self, player: Uuid, run: &mut ActiveRun, course: &Course) {
        run.last_position = None;
        let spawn = run
            .practice
            .as_ref()
            .and_then(|practice| practice.checkpoint)
            .or_else(|| {
                run.resolve_checkpoint_index(course.checkpoints.len())
                    .map(|index| course.checkpoints[index])
            })
            .or(course.start);
        if let Some(spawn) = spawn {
            self.teleports
                .teleport(player, &TeleportTarget::point(spawn));
        }
    }

    /// Completion: latch the finish ping, hand the result to the
    /// recorder, notify, and send the player home. The caller removes
    /// the run afterwards.
    fn finish_run(
        &self,
        player: Uuid,
        run: &mut ActiveRun,
        course: &Course,
        duration_ms: u64,
        checkpoint_times_ms: Vec<u64>,
    ) {
        if run.ping.finish_ping_ms.is_none() {
            run.ping.finish_ping_ms = self.ping.ping_ms(player);
        }
        let previous_best_ms = self.progress.best_time_ms(player, &course.id);
        let record = CompletionRecord {
            player,
            course_id: course.id.clone(),
            duration_ms,
            checkpoint_times_ms,
            average_ping_ms: run.ping.average_ms(),
        };
        let outcome = self.progress.record_completion(&record);
        if let Err(err) = &outcome {
            warn!("failed to record completion for {player} on {}: {err}", course.id);
            self.notices.notify(player, &Notice::CompletionSaveFailed);
        }
        let delta_vs_best_ms = previous_best_ms
            .filter(|&best| best > 0)
            .map(|best| duration_ms as i64 - best as i64);
        self.notices.notify(
            player,
            &Notice::RunCompleted {
                course: course.display_name().to_string(),
                duration_ms,
                delta_vs_best_ms,
            },
        );
        if let Ok(outcome) = &outcome {
            if outcome.xp_awarded > 0 {
                self.notices.notify(
                    player,
                    &Notice::XpAwarded {
                        amount: outcome.xp_awarded,
                    },
                );
            }
        }
        if let (Some(start_ping_ms), Some(finish_ping_ms)) =
            (run.ping.start_ping_ms, run.ping.finish_ping_ms)
        {
            if start_ping_ms.abs_diff(finish_ping_ms) > PING_DELTA_THRESHOLD_MS {
                self.notices.notify(
                    player,
                    &Notice::LatencyShift {
                        start_ping_ms,
                        finish_ping_ms,
                    },
                );
            }
        }
        self.teleports.teleport(player, &TeleportTarget::WorldSpawn);
        self.record_teleport(player, TeleportCause::Finish);
    }

    /// Poll the ping source at most once per sample interval of run time.
    fn sample_ping(&self, player: Uuid, run: &mut ActiveRun) {
        if run.waiting_for_start {
            return;
        }
        let elapsed_ms = run.elapsed();
        if !run.ping.sample_due(elapsed_ms) {
            return;
        }
        match self.ping.ping_ms(player) {
            Some(ping_ms) => run.ping.record_sample(elapsed_ms, ping_ms),
            // Source has no estimate yet; try again next interval.
            None => run.ping.next_sample_at_ms = elapsed_ms + PING_SAMPLE_INTERVAL_MS,
        }
    }

    fn record_teleport(&self, player: Uuid, cause: TeleportCause) {
        self.teleport_stats
            .entry(player)
            .or_default()
            .increment(cause);
    }
}
