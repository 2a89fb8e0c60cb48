//! # Servo Controller Module
//!
//! This module provides a unified interface over the boards which drive the robot's angle
//! servos. An angle servo is addressed by the board it is plugged into and a channel on that
//! board, and can only be commanded, never read back.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// [`ServoDriver`] implementation for the Adafruit PCA9685 16 channel servo driver board.
pub mod pca9685;

/// A [`ServoDriver`] which only logs, for running without hardware.
pub mod sim;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

pub use sim::SimServoBoard;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of channels on a single board.
pub const NUM_CHANNELS: u8 = 16;

/// Minimum commandable angle of an angle servo.
///
/// Units: degrees
pub const MIN_ANGLE_DEG: f64 = 0.0;

/// Maximum commandable angle of an angle servo.
///
/// Units: degrees
pub const MAX_ANGLE_DEG: f64 = 180.0;

/// Pulse width which holds a servo at `MIN_ANGLE_DEG`.
///
/// Units: microseconds
pub const MIN_PULSE_US: u16 = 500;

/// Pulse width which holds a servo at `MAX_ANGLE_DEG`.
///
/// Units: microseconds
pub const MAX_PULSE_US: u16 = 2500;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Trait to provide a unified API for accessing servo driver boards.
pub trait ServoDriver: Send {
    /// Set the angle of the servo plugged into a channel.
    ///
    /// ## Arguments
    /// - `channel` - The channel to drive, `0..NUM_CHANNELS`
    /// - `angle_deg` - The angle to set. Must be within `MIN_ANGLE_DEG..=MAX_ANGLE_DEG`, values
    ///   outside this range will be rejected.
    fn set_angle(&mut self, channel: u8, angle_deg: f64) -> Result<(), ServoError>;

    /// Drive a channel with a raw pulse width, used when calibrating a servo.
    ///
    /// ## Arguments
    /// - `channel` - The channel to drive, `0..NUM_CHANNELS`
    /// - `pulse_us` - High time of the pulse, within `MIN_PULSE_US..=MAX_PULSE_US`
    fn set_pulse_us(&mut self, channel: u8, pulse_us: u16) -> Result<(), ServoError>;
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ServoError {
    #[error("An I2C error occured")]
    I2c,

    #[error("Channel {0} does not exist on the board")]
    InvalidChannel(u8),

    #[error("Angle {0} deg must be between 0 and 180")]
    InvalidAngle(f64),

    #[error("Pulse width {0} us must be between 500 and 2500")]
    InvalidPulse(u16),
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Check that a channel and angle can be sent to a board.
pub fn check_command(channel: u8, angle_deg: f64) -> Result<(), ServoError> {
    if channel >= NUM_CHANNELS {
        return Err(ServoError::InvalidChannel(channel));
    }

    if !(MIN_ANGLE_DEG..=MAX_ANGLE_DEG).contains(&angle_deg) {
        return Err(ServoError::InvalidAngle(angle_deg));
    }

    Ok(())
}

/// Check that a channel and pulse width can be sent to a board.
pub fn check_pulse(channel: u8, pulse_us: u16) -> Result<(), ServoError> {
    if channel >= NUM_CHANNELS {
        return Err(ServoError::InvalidChannel(channel));
    }

    if !(MIN_PULSE_US..=MAX_PULSE_US).contains(&pulse_us) {
        return Err(ServoError::InvalidPulse(pulse_us));
    }

    Ok(())
}
