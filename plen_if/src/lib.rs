//! # PLEN interface crate.
//!
//! Provides the data interfaces shared between the joint control library and the executables:
//! joint identifiers, the motion file schema and the calibration overlay schema.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Joint identifiers and the device name table
pub mod joint;

/// Motion file schema
pub mod motion;

/// Calibration overlay schema
pub mod calib;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use joint::{JointId, InvalidJointId, NUM_JOINTS};
