//! # Equipment Interface
//!
//! This module defines the identifiers and wire formats used to talk to the robot's actuators.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

pub mod bus_servo;
pub mod joint;
