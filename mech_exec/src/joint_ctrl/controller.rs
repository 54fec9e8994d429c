//! Angle to actuator translation

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{trace, warn};
use plen_if::JointId;
use util::maths::clamp;

use super::{angle_to_tick, JointCtrlError, JointRegistry, Wiring};
use crate::servo_ctrl::ActuatorPort;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Drives joints by angle through an [`ActuatorPort`].
///
/// The controller owns both the calibration and the port, so a playback or calibration session
/// borrowing it mutably is the only writer to either.
pub struct JointCtrl<P: ActuatorPort> {
    registry: JointRegistry,

    port: P,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<P: ActuatorPort> JointCtrl<P> {
    pub fn new(registry: JointRegistry, port: P) -> Self {
        Self { registry, port }
    }

    pub fn registry(&self) -> &JointRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut JointRegistry {
        &mut self.registry
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    /// Command a joint to an absolute angle.
    ///
    /// The angle is clamped to the joint's limits before being converted to a tick. Joints with no
    /// actuator accept the command and do nothing.
    pub fn set_angle(&mut self, id: JointId, angle: i32) -> Result<(), JointCtrlError> {
        let spec = self.registry.spec(id);

        let clamped = clamp(&angle, &spec.angle_min, &spec.angle_max);
        let tick = angle_to_tick(clamped);

        match spec.wiring {
            Wiring::Pwm(channel) => {
                trace!("Joint {} -> {} (channel {}, tick {})", id, clamped, channel, tick);
                self.port
                    .set_channel_tick(channel, tick)
                    .map_err(|source| JointCtrlError::Dispatch { joint: id, source })
            }
            Wiring::Unwired => Ok(()),
        }
    }

    /// Command a joint to a deviation from its home angle.
    pub fn set_angle_by_deviation(
        &mut self,
        id: JointId,
        deviation: i32,
    ) -> Result<(), JointCtrlError> {
        let target = deviation.saturating_add(self.registry.home(id));
        self.set_angle(id, target)
    }

    /// Drive every joint to its home angle.
    ///
    /// Failures are logged and the remaining joints are still commanded. Returns the number of
    /// joints which could not be commanded.
    pub fn home_all(&mut self) -> usize {
        let mut failed = 0;

        for id in JointId::all() {
            if let Err(e) = self.set_angle_by_deviation(id, 0) {
                warn!("{}", e);
                failed += 1;
            }
        }

        failed
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
