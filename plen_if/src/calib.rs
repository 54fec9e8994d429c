//! # Calibration Overlay Schema
//!
//! The overlay file is a JSON list with one entry per joint in ascending id order. On load only
//! `home` is applied, `min` and `max` are written for reference.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// One joint's entry in the calibration overlay.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CalibEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<i32>,

    /// Home (neutral) angle of the joint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home: Option<i32>,
}

/// The whole overlay, indexed by joint id.
pub type CalibOverlay = Vec<CalibEntry>;

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
