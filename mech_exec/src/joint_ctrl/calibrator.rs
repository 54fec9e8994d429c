//! Interactive home calibration

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::debug;
use plen_if::JointId;

use super::{JointCtrl, JointCtrlError};
use crate::servo_ctrl::ActuatorPort;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Home adjustment of a normal step.
pub const SMALL_STEP: i32 = 1;

/// Home adjustment of a large step.
pub const LARGE_STEP: i32 = 10;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Adjusts the home angle of one selected joint at a time.
///
/// Every change is sent to the joint straight away so the effect can be seen before it is saved.
#[derive(Debug, Default)]
pub struct Calibrator {
    selected: Option<JointId>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A single adjustment of the selected joint's home.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibStep {
    Up,
    Down,
    UpLarge,
    DownLarge,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl CalibStep {
    pub fn delta(self) -> i32 {
        match self {
            CalibStep::Up => SMALL_STEP,
            CalibStep::Down => -SMALL_STEP,
            CalibStep::UpLarge => LARGE_STEP,
            CalibStep::DownLarge => -LARGE_STEP,
        }
    }
}

impl Calibrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<JointId> {
        self.selected
    }

    /// Select a joint by raw index and move it to its home angle.
    pub fn select<P: ActuatorPort>(
        &mut self,
        ctrl: &mut JointCtrl<P>,
        index: usize,
    ) -> Result<JointId, JointCtrlError> {
        let id = JointId::new(index)?;
        self.selected = Some(id);

        let home = ctrl.registry().home(id);
        ctrl.set_angle(id, home)?;

        Ok(id)
    }

    pub fn deselect(&mut self) {
        self.selected = None;
    }

    /// Adjust the selected joint's home by one step and show it, returning the new home.
    pub fn step<P: ActuatorPort>(
        &self,
        ctrl: &mut JointCtrl<P>,
        step: CalibStep,
    ) -> Result<i32, JointCtrlError> {
        let id = self.selected.ok_or(JointCtrlError::NoJointSelected)?;

        let home = ctrl.registry_mut().adjust_home(id, step.delta());
        debug!("Joint {} home adjusted by {} to {}", id, step.delta(), home);

        ctrl.set_angle(id, home)?;
        Ok(home)
    }

    /// Set the selected joint's home to an absolute value and show it.
    pub fn set_home<P: ActuatorPort>(
        &self,
        ctrl: &mut JointCtrl<P>,
        home: i32,
    ) -> Result<(), JointCtrlError> {
        let id = self.selected.ok_or(JointCtrlError::NoJointSelected)?;

        ctrl.registry_mut().set_home(id, home);
        ctrl.set_angle(id, home)
    }

    /// Move the selected joint to an absolute angle without changing its home.
    pub fn preview<P: ActuatorPort>(
        &self,
        ctrl: &mut JointCtrl<P>,
        angle: i32,
    ) -> Result<(), JointCtrlError> {
        let id = self.selected.ok_or(JointCtrlError::NoJointSelected)?;
        ctrl.set_angle(id, angle)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
