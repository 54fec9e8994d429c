//! # Motion Playback Module
//!
//! Plays motion files by interpolating every joint's deviation from home between keyframes on a
//! fixed control cadence.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod clock;
mod player;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use clock::*;
pub use player::*;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use plen_if::motion::MotionLoadError;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Period of one interpolation step.
///
/// Units: milliseconds
pub const CONTROL_INTERVAL_MS: f64 = 40.0;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors which stop a motion from being played.
#[derive(Debug, thiserror::Error)]
pub enum MotionError {
    #[error("Could not load the motion: {0}")]
    Load(#[from] MotionLoadError),

    #[error("This player has already been used (state {0:?}), create a new one")]
    PlayerUsed(PlayerState),
}
