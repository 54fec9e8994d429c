//! # Servo Controller Module
//!
//! This module provides a unified actuator interface which abstracts over the servo driver board.
//! The joint controller only ever asks for "set channel to tick value", the backend is chosen
//! explicitly when the executable starts.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// [`ActuatorPort`] implementation for the PCA9685 16 channel servo driver board.
pub mod pca9685;

/// [`ActuatorPort`] implementation which drives no hardware.
pub mod sim;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use pca9685::Pca9685Port;
pub use sim::SimPort;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::info;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of physically wired PWM channels. Channels at or above this are never sent to a port.
pub const NUM_PWM_CHANNELS: u8 = 16;

/// Largest tick value a 12 bit PWM channel accepts.
pub const MAX_TICK: u16 = 4095;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Trait to provide a unified API for accessing servo driver boards.
pub trait ActuatorPort {
    /// Set the pulse width of a channel.
    ///
    /// ## Arguments
    /// - `channel` - The channel to set, must be below [`NUM_PWM_CHANNELS`]
    /// - `tick` - The pulse width in ticks, between 0 and [`MAX_TICK`]. Values outside this range
    ///   will be rejected.
    fn set_channel_tick(&mut self, channel: u8, tick: u16) -> Result<(), ServoError>;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters selecting and configuring the actuator backend.
#[derive(serde::Deserialize, Debug, Clone)]
pub struct ActuatorParams {
    /// Backend to drive
    #[serde(default)]
    pub backend: Backend,

    /// Linux I2C bus number (`/dev/i2c-N`) the driver board is on
    #[serde(default)]
    pub i2c_bus: u8,

    /// I2C address of the driver board
    #[serde(default = "default_address")]
    pub address: u8,

    /// Servo PWM frequency
    ///
    /// Units: hertz
    #[serde(default = "default_pwm_freq")]
    pub pwm_freq_hz: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum ServoError {
    #[error("An I2C error occured")]
    I2c,

    #[error("Channel {0} is not a PWM channel")]
    InvalidChannel(u8),

    #[error("Tick must be between 0 and 4095, got {0}")]
    InvalidTick(u16),

    #[error("The driver rejected the input data")]
    InvalidInput,

    #[error("PWM frequency of {0} Hz cannot be generated")]
    InvalidFrequency(f64),

    #[error("Cannot open the servo driver: {0}")]
    Open(String),
}

/// Which [`ActuatorPort`] backend to use.
#[derive(serde::Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// No hardware, commands are only logged
    Sim,

    /// PCA9685 board on an I2C bus
    Pca9685,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<P: ActuatorPort + ?Sized> ActuatorPort for Box<P> {
    fn set_channel_tick(&mut self, channel: u8, tick: u16) -> Result<(), ServoError> {
        (**self).set_channel_tick(channel, tick)
    }
}

impl Default for ActuatorParams {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            i2c_bus: 0,
            address: default_address(),
            pwm_freq_hz: default_pwm_freq(),
        }
    }
}

impl Default for Backend {
    fn default() -> Self {
        Backend::Sim
    }
}

/// Check a channel/tick pair against the PWM limits.
pub(crate) fn validate(channel: u8, tick: u16) -> Result<(), ServoError> {
    if channel >= NUM_PWM_CHANNELS {
        return Err(ServoError::InvalidChannel(channel));
    }
    if tick > MAX_TICK {
        return Err(ServoError::InvalidTick(tick));
    }
    Ok(())
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Open the actuator port selected by the parameters.
pub fn open_port(params: &ActuatorParams) -> Result<Box<dyn ActuatorPort>, ServoError> {
    match params.backend {
        Backend::Sim => {
            info!("Using the simulated actuator port");
            Ok(Box::new(SimPort::new()))
        }
        Backend::Pca9685 => open_pca9685(params),
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

#[cfg(all(target_arch = "arm", target_os = "linux"))]
fn open_pca9685(params: &ActuatorParams) -> Result<Box<dyn ActuatorPort>, ServoError> {
    let i2c = rppal::i2c::I2c::with_bus(params.i2c_bus)
        .map_err(|e| ServoError::Open(e.to_string()))?;

    info!(
        "Using the PCA9685 on /dev/i2c-{} at 0x{:02X}",
        params.i2c_bus, params.address
    );

    Ok(Box::new(Pca9685Port::new(i2c, params.address, params.pwm_freq_hz)?))
}

#[cfg(not(all(target_arch = "arm", target_os = "linux")))]
fn open_pca9685(_params: &ActuatorParams) -> Result<Box<dyn ActuatorPort>, ServoError> {
    Err(ServoError::Open(String::from(
        "the PCA9685 backend is only available on ARM Linux targets",
    )))
}

fn default_address() -> u8 {
    0x40
}

fn default_pwm_freq() -> f64 {
    60.0
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(validate(0, 0).is_ok());
        assert!(validate(15, MAX_TICK).is_ok());
        assert!(matches!(validate(16, 0), Err(ServoError::InvalidChannel(16))));
        assert!(matches!(validate(0, 4096), Err(ServoError::InvalidTick(4096))));
    }

    #[test]
    fn test_open_sim_port() {
        let mut port = open_port(&ActuatorParams::default()).unwrap();
        assert!(port.set_channel_tick(0, 375).is_ok());
        assert!(port.set_channel_tick(16, 375).is_err());
    }
}
