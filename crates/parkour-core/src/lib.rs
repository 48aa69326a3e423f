//! Core types and definitions for the parkour time-trial mode.
//!
//! This crate defines the vocabulary shared across the tracker crates:
//! course geometry, collaborator traits, notification events, constants,
//! and the pure geometric routines used for touch detection. It has no
//! dependency on any game engine or runtime framework.

pub mod constants;
pub mod course;
pub mod events;
pub mod geometry;
pub mod progress;
pub mod runtime;
pub mod types;
