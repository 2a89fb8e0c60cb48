//! # Arm Executable Parameters
//!
//! This module provides the hardware parameters for the arm executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::time::Duration;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArmExecParams {
    /// Serial device the servo bus is connected to
    pub bus_port: String,

    /// Baud rate of the servo bus
    pub bus_baud_rate: u32,

    /// Time a servo is given to reply to a query
    ///
    /// Units: milliseconds
    pub bus_response_wait_ms: u64,

    /// Timeout of a single read or write on the serial port
    ///
    /// Units: milliseconds
    pub bus_timeout_ms: u64,

    /// Number of the I2C bus the servo boards are on
    pub i2c_bus: u8,

    /// I2C addresses of the angle servo boards, in board number order
    pub board_addresses: Vec<u8>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ArmExecParams {
    pub fn bus_response_wait(&self) -> Duration {
        Duration::from_millis(self.bus_response_wait_ms)
    }

    pub fn bus_timeout(&self) -> Duration {
        Duration::from_millis(self.bus_timeout_ms)
    }
}

impl Default for ArmExecParams {
    fn default() -> Self {
        Self {
            bus_port: "/dev/ttyUSB0".into(),
            bus_baud_rate: 115_200,
            bus_response_wait_ms: 10,
            bus_timeout_ms: 50,
            i2c_bus: 1,
            board_addresses: vec![0x40, 0x41],
        }
    }
}
