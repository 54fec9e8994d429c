//! # Joint Identifiers
//!
//! The robot has a fixed number of joint slots. Some slots are reserved and carry no actuator, but
//! they are still valid identifiers and are accepted everywhere a [`JointId`] is.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, fmt};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of joint slots in the topology.
pub const NUM_JOINTS: usize = 24;

/// Map from motion file device names to joint ids.
const DEVICE_TABLE: [(&str, u8); 18] = [
    ("left_shoulder_pitch", 0),
    ("left_thigh_yaw", 1),
    ("left_shoulder_roll", 2),
    ("left_elbow_roll", 3),
    ("left_thigh_roll", 4),
    ("left_thigh_pitch", 5),
    ("left_knee_pitch", 6),
    ("left_foot_pitch", 7),
    ("left_foot_roll", 8),
    ("right_shoulder_pitch", 12),
    ("right_thigh_yaw", 13),
    ("right_shoulder_roll", 14),
    ("right_elbow_roll", 15),
    ("right_thigh_roll", 16),
    ("right_thigh_pitch", 17),
    ("right_knee_pitch", 18),
    ("right_foot_pitch", 19),
    ("right_foot_roll", 20),
];

/// Human readable joint names, `None` for reserved slots.
const DISPLAY_NAMES: [Option<&str>; NUM_JOINTS] = [
    Some("Left Shoulder Pitch"),
    Some("Left Thigh Yaw"),
    Some("Left Shoulder Roll"),
    Some("Left Elbow Roll"),
    Some("Left Thigh Roll"),
    Some("Left Thigh Pitch"),
    Some("Left Knee Pitch"),
    Some("Left Foot Pitch"),
    Some("Left Foot Roll"),
    None,
    None,
    None,
    Some("Right Shoulder Pitch"),
    Some("Right Thigh Yaw"),
    Some("Right Shoulder Roll"),
    Some("Right Elbow Roll"),
    Some("Right Thigh Roll"),
    Some("Right Thigh Pitch"),
    Some("Right Knee Pitch"),
    Some("Right Foot Pitch"),
    Some("Right Foot Roll"),
    None,
    None,
    None,
];

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A validated joint identifier, always in `0..NUM_JOINTS`.
#[derive(Serialize, Deserialize, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Copy, Clone)]
#[serde(try_from = "u8", into = "u8")]
pub struct JointId(u8);

/// Error returned when a raw integer does not name a joint.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Joint id {0} is outside the known range (0..{})", NUM_JOINTS)]
pub struct InvalidJointId(pub usize);

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl JointId {
    /// Validate a raw joint index.
    pub fn new(index: usize) -> Result<Self, InvalidJointId> {
        if index < NUM_JOINTS {
            Ok(Self(index as u8))
        } else {
            Err(InvalidJointId(index))
        }
    }

    /// Iterate over every joint in ascending id order.
    pub fn all() -> impl Iterator<Item = JointId> {
        (0..NUM_JOINTS as u8).map(JointId)
    }

    /// Index of this joint into per-joint arrays.
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Look up the joint driven by a motion file device name.
    ///
    /// Unknown names return `None`.
    pub fn from_device(device: &str) -> Option<JointId> {
        DEVICE_TABLE
            .iter()
            .find(|(name, _)| *name == device)
            .map(|(_, id)| JointId(*id))
    }

    /// Display name of the joint, `None` for reserved slots.
    pub fn display_name(self) -> Option<&'static str> {
        DISPLAY_NAMES[self.index()]
    }
}

impl TryFrom<u8> for JointId {
    type Error = InvalidJointId;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        JointId::new(value as usize)
    }
}

impl From<JointId> for u8 {
    fn from(id: JointId) -> Self {
        id.0
    }
}

impl fmt::Display for JointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.0)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
