//! Simulated [`ActuatorPort`]

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::trace;

use super::{validate, ActuatorPort, ServoError, NUM_PWM_CHANNELS};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Actuator port used when no servo board is attached.
///
/// Commands are validated exactly as the hardware port would, then remembered so the last
/// commanded tick of every channel can be inspected.
#[derive(Debug, Default, Clone)]
pub struct SimPort {
    ticks: [Option<u16>; NUM_PWM_CHANNELS as usize],
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SimPort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last tick written to `channel`, `None` if it was never written.
    pub fn tick(&self, channel: u8) -> Option<u16> {
        self.ticks.get(channel as usize).copied().flatten()
    }
}

impl ActuatorPort for SimPort {
    fn set_channel_tick(&mut self, channel: u8, tick: u16) -> Result<(), ServoError> {
        validate(channel, tick)?;

        trace!("[sim] channel {:2} <- {}", channel, tick);
        self.ticks[channel as usize] = Some(tick);

        Ok(())
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_sim_port_records() {
        let mut port = SimPort::new();
        assert_eq!(port.tick(3), None);

        port.set_channel_tick(3, 375).unwrap();
        assert_eq!(port.tick(3), Some(375));

        assert!(port.set_channel_tick(16, 375).is_err());
        assert!(port.set_channel_tick(0, 4096).is_err());
        assert_eq!(port.tick(0), None);
    }
}
