//! Arm control module

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod arm_config;
mod controller;
mod forward_kinematics;
mod inverse_kinematics;
mod params;
mod solver;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};
use std::fmt;

// Internal
pub use arm_config::*;
pub use controller::*;
pub use params::*;
pub use solver::*;

use crate::actuators::ActuatorError;
use crate::FailureKind;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// The number of rotational axes on each arm.
pub const NUM_ARM_JOINTS: usize = 5;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The joints of a single arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArmJoint {
    ShoulderPitch,
    ShoulderRoll,
    ShoulderYaw,
    Elbow,
    Wrist,
}

/// Possible errors produced by the kinematics solver.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IkError {
    #[error(
        "Target is {distance_m:.3} m from the shoulder, outside the reachable range \
        [{min_reach_m:.3}, {max_reach_m:.3}] m"
    )]
    Unreachable {
        distance_m: f64,
        min_reach_m: f64,
        max_reach_m: f64,
    },

    #[error(
        "Solution puts the {joint} at {angle_deg:.1} deg, outside its limits \
        [{min_deg:.1}, {max_deg:.1}] deg"
    )]
    LimitViolation {
        joint: ArmJoint,
        angle_deg: f64,
        min_deg: f64,
        max_deg: f64,
    },

    #[error("Invalid arm configuration: {0}")]
    InvalidConfiguration(String),
}

/// Possible errors that can occur during ArmCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum ArmCtrlError {
    #[error("Could not solve for the target: {0}")]
    Ik(#[from] IkError),

    #[error("Could not command the joints: {0}")]
    Actuator(#[from] ActuatorError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ArmJoint {
    /// All arm joints, in the order they are stored in [`JointAngles`] and [`JointLimits`].
    pub const ALL: [ArmJoint; NUM_ARM_JOINTS] = [
        ArmJoint::ShoulderPitch,
        ArmJoint::ShoulderRoll,
        ArmJoint::ShoulderYaw,
        ArmJoint::Elbow,
        ArmJoint::Wrist,
    ];

    /// Position of the joint in per-joint arrays.
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for ArmJoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ArmJoint::ShoulderPitch => "shoulder pitch",
            ArmJoint::ShoulderRoll => "shoulder roll",
            ArmJoint::ShoulderYaw => "shoulder yaw",
            ArmJoint::Elbow => "elbow",
            ArmJoint::Wrist => "wrist",
        })
    }
}

impl IkError {
    pub fn kind(&self) -> FailureKind {
        match self {
            IkError::Unreachable { .. } => FailureKind::Unreachable,
            IkError::LimitViolation { .. } => FailureKind::LimitViolation,
            IkError::InvalidConfiguration(_) => FailureKind::ConfigurationError,
        }
    }
}

impl ArmCtrlError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ArmCtrlError::Ik(e) => e.kind(),
            ArmCtrlError::Actuator(e) => e.kind(),
        }
    }
}
