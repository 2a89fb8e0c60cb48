//! [`ServoDriver`] implementation for the PCA9685 driver

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use embedded_hal::blocking::i2c::{Write, WriteRead};
use pwm_pca9685::{Channel, Pca9685};
use util::maths::lin_map;

use super::{
    check_command, check_pulse, ServoDriver, ServoError, MAX_ANGLE_DEG, MAX_PULSE_US,
    MIN_ANGLE_DEG, MIN_PULSE_US,
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

const MAX_PWM: u16 = 4096;

/// Frequency of the internal oscillator.
const OSC_CLOCK_HZ: f64 = 25_000_000.0;

/// Servo PWM frequency.
const PWM_FREQUENCY_HZ: f64 = 50.0;

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<I2C, E> ServoDriver for Pca9685<I2C>
where
    I2C: Write<Error = E> + WriteRead<Error = E> + Send,
{
    fn set_angle(&mut self, channel: u8, angle_deg: f64) -> Result<(), ServoError> {
        check_command(channel, angle_deg)?;

        match set_ticks(self, channel, angle_to_ticks(angle_deg)) {
            Err(pwm_pca9685::Error::InvalidInputData) => Err(ServoError::InvalidAngle(angle_deg)),
            r => r.map_err(|_| ServoError::I2c),
        }
    }

    fn set_pulse_us(&mut self, channel: u8, pulse_us: u16) -> Result<(), ServoError> {
        check_pulse(channel, pulse_us)?;

        match set_ticks(self, channel, pulse_to_ticks(pulse_us as f64)) {
            Err(pwm_pca9685::Error::InvalidInputData) => Err(ServoError::InvalidPulse(pulse_us)),
            r => r.map_err(|_| ServoError::I2c),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Set a freshly created board up for driving servos (50 Hz) and enable its outputs.
pub fn init_board<I2C, E>(pwm: &mut Pca9685<I2C>) -> Result<(), ServoError>
where
    I2C: Write<Error = E> + WriteRead<Error = E>,
{
    pwm.set_prescale(prescale()).map_err(|_| ServoError::I2c)?;
    pwm.enable().map_err(|_| ServoError::I2c)
}

/// Prescale register value giving `PWM_FREQUENCY_HZ`.
fn prescale() -> u8 {
    ((OSC_CLOCK_HZ / (MAX_PWM as f64 * PWM_FREQUENCY_HZ)).round() - 1.0) as u8
}

/// Switch the output of a channel on at the start of the period and off after `ticks`.
///
/// The channel must already have been checked.
fn set_ticks<I2C, E>(
    pwm: &mut Pca9685<I2C>,
    channel: u8,
    ticks: u16,
) -> Result<(), pwm_pca9685::Error<E>>
where
    I2C: Write<Error = E> + WriteRead<Error = E>,
{
    let channel = channel_from_index(channel).ok_or(pwm_pca9685::Error::InvalidInputData)?;
    pwm.set_channel_on_off(channel, 0, ticks)
}

/// Number of PWM ticks the output is high for to hold the servo at `angle_deg`.
fn angle_to_ticks(angle_deg: f64) -> u16 {
    pulse_to_ticks(lin_map(
        (MIN_ANGLE_DEG, MAX_ANGLE_DEG),
        (MIN_PULSE_US as f64, MAX_PULSE_US as f64),
        angle_deg,
    ))
}

/// Number of PWM ticks in a pulse of `pulse_us`.
fn pulse_to_ticks(pulse_us: f64) -> u16 {
    let period_us = 1_000_000.0 / PWM_FREQUENCY_HZ;

    ((pulse_us / period_us) * MAX_PWM as f64)
        .round()
        .min((MAX_PWM - 1) as f64) as u16
}

fn channel_from_index(index: u8) -> Option<Channel> {
    Some(match index {
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
        _ => return None,
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_prescale_for_50_hz() {
        assert_eq!(prescale(), 121);
    }

    #[test]
    fn test_angle_to_ticks() {
        // 500 us, 1500 us and 2500 us of a 20 ms period
        assert_eq!(angle_to_ticks(0.0), 102);
        assert_eq!(angle_to_ticks(90.0), 307);
        assert_eq!(angle_to_ticks(180.0), 512);
    }

    #[test]
    fn test_pulse_to_ticks() {
        assert_eq!(pulse_to_ticks(MIN_PULSE_US as f64), angle_to_ticks(0.0));
        assert_eq!(pulse_to_ticks(1500.0), 307);
        assert_eq!(pulse_to_ticks(MAX_PULSE_US as f64), 512);
    }

    #[test]
    fn test_channels() {
        assert!(matches!(channel_from_index(15), Some(Channel::C15)));
        assert!(channel_from_index(16).is_none());
    }
}
