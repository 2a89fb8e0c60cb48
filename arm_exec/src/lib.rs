//! # Arm library.
//!
//! Kinematics, actuation and orchestration for the Artisan robot's arms. The executable in
//! `main.rs` is a thin command line wrapper around the items defined here.
//!
//! Data flows from a target point through the [`arm_ctrl::IkSolver`] to a set of joint angles,
//! which [`actuators::Actuators`] routes either to an angle servo board ([`servo_ctrl`]) or onto
//! the serial servo bus ([`bus_servo`]). Telemetry only flows back from the bus servos.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Joint level actuation API - maps logical joints onto physical devices
pub mod actuators;

/// Arm control - kinematics and the reach/grasp orchestration
pub mod arm_ctrl;

/// Serial bus servo controller - drives the LX-16A chain
pub mod bus_servo;

/// Parameters for the arm executable
pub mod params;

/// Angle servo drivers - PCA9685 boards and a simulated board
pub mod servo_ctrl;

#[cfg(test)]
pub(crate) mod test_util;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::sync::{Mutex, MutexGuard};

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// The kinds of failure any operation in this library can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The target is outside the mechanical reach of the arm.
    Unreachable,

    /// A solution or command exceeds the configured joint or device limits.
    LimitViolation,

    /// A reply from a bus servo was missing, short or malformed.
    CommunicationFailure,

    /// The joint to actuator mapping or parameters are inconsistent.
    ConfigurationError,
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Lock a mutex, taking the data even if another thread panicked while holding it.
///
/// Hardware handles stay usable after a panic elsewhere, stopping the servos must still work.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(g) => g,
        Err(p) => p.into_inner(),
    }
}
