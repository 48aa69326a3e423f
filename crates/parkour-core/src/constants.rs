//! Tracker constants and tuning parameters.

/// Spherical tolerance for registering contact with a checkpoint, finish,
/// or trigger point (world units).
pub const TOUCH_RADIUS: f64 = 1.5;

/// Squared touch radius, the form every distance test compares against.
pub const TOUCH_RADIUS_SQ: f64 = TOUCH_RADIUS * TOUCH_RADIUS;

/// Vertical relaxation applied when the player approaches a point from
/// above, making touches easier when dropping onto a platform.
pub const TOUCH_VERTICAL_BONUS: f64 = 1.0;

/// Squared movement threshold that arms a waiting run (0.05 units).
pub const START_MOVE_THRESHOLD_SQ: f64 = 0.0025;

// --- Fall handling ---

/// Default continuous-descent timeout before a safety respawn.
pub const DEFAULT_FALL_RESPAWN_SECONDS: f64 = 3.0;

/// Absolute Y floor; at or below this the void failsafe fires regardless
/// of run state.
pub const FALL_FAILSAFE_VOID_Y: f64 = -10.0;

// --- Finish ---

/// Minimum interval between "missed checkpoints" warnings.
pub const FINISH_WARNING_INTERVAL_MS: u64 = 2000;

// --- Ping sampling ---

/// Minimum elapsed run time between ping samples.
pub const PING_SAMPLE_INTERVAL_MS: u64 = 5000;

/// Start/finish ping divergence above which a latency warning is sent.
pub const PING_DELTA_THRESHOLD_MS: u32 = 50;

// --- Geometry ---

/// Segment lengths squared at or below this are treated as degenerate
/// (no interpolation possible).
pub const SEGMENT_EPSILON: f64 = 1e-9;
