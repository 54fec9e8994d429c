//! # Motion File Schema
//!
//! A motion is an ordered list of keyframes. Each frame gives target deviations from home for a
//! subset of joints (addressed by device name) and the time taken to reach them.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::warn;
use serde::{Deserialize, Serialize};
use std::{fs::read_to_string, path::Path};

use crate::JointId;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Transition time used by frames which do not give one.
pub const DEFAULT_TRANSITION_TIME_MS: f64 = 200.0;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A complete motion as loaded from a motion file.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MotionFile {
    /// Display name of the motion
    #[serde(default = "default_name")]
    pub name: String,

    /// Keyframes in playback order
    pub frames: Vec<Frame>,
}

/// A single keyframe.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Frame {
    /// Time to move from the previous frame to this one.
    ///
    /// Units: milliseconds
    #[serde(default = "default_transition_time")]
    pub transition_time_ms: f64,

    /// Target deviations for the joints this frame moves
    #[serde(default)]
    pub outputs: Vec<Output>,
}

/// Target deviation for one device.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Output {
    /// Device name, see [`JointId::from_device`]
    pub device: String,

    /// Deviation from the joint's home angle
    pub value: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors which prevent a motion file from being used.
#[derive(thiserror::Error, Debug)]
pub enum MotionLoadError {
    #[error("Cannot read the motion file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot parse the motion file: {0}")]
    Parse(#[from] serde_json::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl MotionFile {
    /// Load a motion from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, MotionLoadError> {
        let json = read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Parse a motion from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, MotionLoadError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Frame {
    /// Resolve the frame's outputs onto joint ids.
    ///
    /// Outputs naming an unknown device are skipped.
    pub fn targets(&self) -> impl Iterator<Item = (JointId, f64)> + '_ {
        self.outputs.iter().filter_map(|o| match JointId::from_device(&o.device) {
            Some(id) => Some((id, o.value)),
            None => {
                warn!("Ignoring unknown device \"{}\" in motion frame", o.device);
                None
            }
        })
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn default_name() -> String {
    String::from("Unknown")
}

fn default_transition_time() -> f64 {
    DEFAULT_TRANSITION_TIME_MS
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
