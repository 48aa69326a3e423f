//! Pure geometric routines for touch detection and sub-tick timing.

use glam::DVec3;

use crate::constants::SEGMENT_EPSILON;

/// Squared distance with a vertical bonus: when the position is above the
/// target, the Y difference is reduced by `vertical_bonus` (floored at 0)
/// before squaring. Makes checkpoints easier to hit when falling onto
/// them from above; approaches from below are unaffected.
pub fn distance_sq_with_vertical_bonus(position: DVec3, target: DVec3, vertical_bonus: f64) -> f64 {
    let dx = position.x - target.x;
    let mut dy = position.y - target.y;
    if dy > 0.0 {
        dy = (dy - vertical_bonus).max(0.0);
    }
    let dz = position.z - target.z;
    dx * dx + dy * dy + dz * dz
}

/// Parameter `t` in `[0, 1]` at which the segment `from -> to` first
/// enters the sphere of `radius` around `center`, or `None` when the
/// segment is degenerate or never intersects.
///
/// Standard quadratic: with `d = to - from` and `f = from - center`,
/// solve `|d|^2 t^2 + 2(f.d) t + (|f|^2 - r^2) = 0` and prefer the
/// smaller in-range root (first entry point).
pub fn segment_sphere_intersection(
    from: DVec3,
    to: DVec3,
    center: DVec3,
    radius: f64,
) -> Option<f64> {
    let d = to - from;
    let a = d.length_squared();
    if a <= SEGMENT_EPSILON {
        return None;
    }
    let f = from - center;
    let b = 2.0 * f.dot(d);
    let c = f.length_squared() - radius * radius;
    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return None;
    }
    let sqrt = discriminant.sqrt();
    let t1 = (-b - sqrt) / (2.0 * a);
    if (0.0..=1.0).contains(&t1) {
        return Some(t1);
    }
    let t2 = (-b + sqrt) / (2.0 * a);
    if (0.0..=1.0).contains(&t2) {
        return Some(t2);
    }
    None
}
