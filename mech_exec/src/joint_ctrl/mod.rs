//! # Joint Control Module
//!
//! Converts logical joint angles into actuator ticks. Angles are signed integers in tenths of a
//! degree. Every joint is clamped to its own limits, then mapped onto the tick range using the
//! global angle range so that every joint has the same tick granularity.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod calibrator;
mod controller;
mod registry;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use calibrator::*;
pub use controller::*;
pub use registry::*;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use plen_if::{InvalidJointId, JointId};
use util::maths::lin_map;

use crate::servo_ctrl::ServoError;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Lowest logical angle of any joint.
pub const ANGLE_MIN: i32 = -800;

/// Highest logical angle of any joint.
pub const ANGLE_MAX: i32 = 800;

/// Neutral angle used for joints with no calibrated home.
pub const ANGLE_NEUTRAL: i32 = 0;

/// Tick corresponding to [`ANGLE_MIN`] (60 Hz, 12 bit).
pub const PWM_MIN: u16 = 175;

/// Tick corresponding to [`ANGLE_MAX`] (60 Hz, 12 bit).
pub const PWM_MAX: u16 = 575;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Possible errors that can occur during joint control.
#[derive(Debug, thiserror::Error)]
pub enum JointCtrlError {
    #[error(transparent)]
    InvalidJointId(#[from] InvalidJointId),

    #[error("No joint is selected for calibration")]
    NoJointSelected,

    #[error("Could not command joint {joint}: {source}")]
    Dispatch {
        joint: JointId,
        source: ServoError,
    },
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Map a logical angle onto an actuator tick.
///
/// Pure function of the angle and the global angle and tick ranges. Angles outside the global
/// range extrapolate, callers clamp to the joint limits first.
pub fn angle_to_tick(angle: i32) -> u16 {
    lin_map(
        (ANGLE_MIN as f64, ANGLE_MAX as f64),
        (PWM_MIN as f64, PWM_MAX as f64),
        angle as f64,
    )
    .round() as u16
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
