//! # Mechanisms Library
//!
//! Joint control and motion playback for the PLEN robot:
//! - [`servo_ctrl`] abstracts the servo driver board behind [`servo_ctrl::ActuatorPort`]
//! - [`joint_ctrl`] holds the joint calibration and converts angles to actuator ticks
//! - [`motion`] interpolates motion files on a fixed control cadence

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Driver used to control servos.
pub mod servo_ctrl;

/// Joint calibration and angle conversion.
pub mod joint_ctrl;

/// Motion file playback.
pub mod motion;

/// Parameters for the mechanisms executables.
pub mod params;
