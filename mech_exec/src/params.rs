//! # Mechanisms Executable Parameters

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::servo_ctrl::ActuatorParams;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Deserialize, Debug, Clone)]
pub struct MechExecParams {

    /// Actuator backend selection
    #[serde(default)]
    pub actuator: ActuatorParams,

    /// Path to the calibration overlay, relative paths are below the software root
    pub calib_file: PathBuf,

    /// Directory containing the motion files, relative paths are below the software root
    pub motion_dir: PathBuf,

    /// Playback speed used when none is given
    #[serde(default = "default_speed")]
    pub default_speed: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl MechExecParams {
    /// Resolve a path from the parameters against the software root.
    pub fn resolve<P: AsRef<Path>>(&self, root: &Path, path: P) -> PathBuf {
        if path.as_ref().is_absolute() {
            path.as_ref().to_path_buf()
        }
        else {
            root.join(path)
        }
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn default_speed() -> f64 {
    1.0
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
