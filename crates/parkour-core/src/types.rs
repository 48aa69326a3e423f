//! Fundamental simulation types.

use glam::{DVec3, Vec3};
use serde::{Deserialize, Serialize};

/// A world placement: position plus body rotation (pitch/yaw/roll degrees).
/// Positions are `f64` (simulation space), rotations `f32` (render space).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: DVec3,
    pub rotation: Vec3,
}

impl Transform {
    pub fn new(position: DVec3, rotation: Vec3) -> Self {
        Self { position, rotation }
    }

    /// Placement at a position with no rotation.
    pub fn at(position: DVec3) -> Self {
        Self {
            position,
            rotation: Vec3::ZERO,
        }
    }
}

/// Per-tick movement flags reported by the host's movement source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementFlags {
    pub on_ground: bool,
    pub climbing: bool,
}

impl MovementFlags {
    /// Fall tracking is suspended while the player is supported or climbing.
    pub fn blocks_fall_tracking(&self) -> bool {
        self.on_ground || self.climbing
    }
}

/// Where a respawn or trigger teleport should place the player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TeleportTarget {
    /// A concrete placement, optionally with a separate head rotation
    /// (practice checkpoints restore the camera as well as the body).
    Point {
        transform: Transform,
        head_rotation: Option<Vec3>,
    },
    /// The player's world spawn, resolved by the host.
    WorldSpawn,
}

impl TeleportTarget {
    pub fn point(transform: Transform) -> Self {
        Self::Point {
            transform,
            head_rotation: None,
        }
    }
}
