//! [`ActuatorPort`] implementation for the PCA9685 driver

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use embedded_hal::blocking::i2c::{Write, WriteRead};
use log::debug;
use pwm_pca9685::{Channel, Pca9685};

use super::{validate, ActuatorPort, ServoError};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Frequency of the board's internal oscillator.
const OSC_CLOCK_HZ: f64 = 25_000_000.0;

/// Number of steps in one PWM period.
const PWM_RESOLUTION: f64 = 4096.0;

/// Smallest prescale value the board accepts.
const MIN_PRESCALE: f64 = 3.0;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A PCA9685 board driven over an embedded-hal I2C bus.
pub struct Pca9685Port<I2C> {
    pwm: Pca9685<I2C>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<I2C, E> Pca9685Port<I2C>
where
    I2C: Write<Error = E> + WriteRead<Error = E>,
{
    /// Open the board at `address`, program the PWM frequency and enable the outputs.
    pub fn new(i2c: I2C, address: u8, pwm_freq_hz: f64) -> Result<Self, ServoError> {
        let prescale = prescale_for(pwm_freq_hz)?;

        let mut pwm = Pca9685::new(i2c, address).map_err(map_err)?;
        pwm.set_prescale(prescale).map_err(map_err)?;
        pwm.enable().map_err(map_err)?;

        debug!(
            "PCA9685 at 0x{:02X} enabled, {} Hz (prescale {})",
            address, pwm_freq_hz, prescale
        );

        Ok(Self { pwm })
    }
}

impl<I2C, E> ActuatorPort for Pca9685Port<I2C>
where
    I2C: Write<Error = E> + WriteRead<Error = E>,
{
    fn set_channel_tick(&mut self, channel: u8, tick: u16) -> Result<(), ServoError> {
        validate(channel, tick)?;

        // The pulse starts at the beginning of the period and ends after `tick` steps
        self.pwm
            .set_channel_on_off(to_channel(channel)?, 0, tick)
            .map_err(map_err)
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Compute the prescale register value for the given output frequency.
fn prescale_for(pwm_freq_hz: f64) -> Result<u8, ServoError> {
    if !pwm_freq_hz.is_finite() || pwm_freq_hz <= 0.0 {
        return Err(ServoError::InvalidFrequency(pwm_freq_hz));
    }

    let prescale = (OSC_CLOCK_HZ / (PWM_RESOLUTION * pwm_freq_hz)).round() - 1.0;

    if prescale < MIN_PRESCALE || prescale > u8::MAX as f64 {
        return Err(ServoError::InvalidFrequency(pwm_freq_hz));
    }

    Ok(prescale as u8)
}

fn to_channel(channel: u8) -> Result<Channel, ServoError> {
    Ok(match channel {
        0 => Channel::C0,
        1 => Channel::C1,
        2 => Channel::C2,
        3 => Channel::C3,
        4 => Channel::C4,
        5 => Channel::C5,
        6 => Channel::C6,
        7 => Channel::C7,
        8 => Channel::C8,
        9 => Channel::C9,
        10 => Channel::C10,
        11 => Channel::C11,
        12 => Channel::C12,
        13 => Channel::C13,
        14 => Channel::C14,
        15 => Channel::C15,
        c => return Err(ServoError::InvalidChannel(c)),
    })
}

fn map_err<E>(e: pwm_pca9685::Error<E>) -> ServoError {
    match e {
        pwm_pca9685::Error::I2C(_) => ServoError::I2c,
        pwm_pca9685::Error::InvalidInputData => ServoError::InvalidInput,
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
