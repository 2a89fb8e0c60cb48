//! # Arm control telecommands

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use crate::eqpt::joint::{ArmSide, JointId};
use serde::{Deserialize, Serialize};
use structopt::StructOpt;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A command that can be completed by the arm executable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, StructOpt)]
pub enum ArmCmd {
    /// Solve the inverse kinematics for a point without moving anything.
    #[structopt(name = "ik")]
    SolveIk {
        /// Target x coordinate in meters.
        x_m: f64,

        /// Target y coordinate in meters.
        y_m: f64,

        /// Target z coordinate in meters.
        z_m: f64,

        /// Which arm to solve for.
        #[structopt(long, default_value = "left")]
        side: ArmSide,

        /// Approach angle of the hand in degrees, 0 is horizontal.
        ///
        /// If given the target is treated as the fingertip position and the wrist is set to the
        /// approach angle.
        #[structopt(long)]
        approach_deg: Option<f64>,
    },

    /// Compute where the hand would be for a set of joint angles.
    #[structopt(name = "fk")]
    ForwardKinematics {
        shoulder_pitch_deg: f64,
        shoulder_roll_deg: f64,
        shoulder_yaw_deg: f64,
        elbow_deg: f64,
        wrist_deg: f64,

        #[structopt(long, default_value = "left")]
        side: ArmSide,
    },

    /// Move the hand of one arm to a point.
    #[structopt(name = "move")]
    MoveTo {
        x_m: f64,
        y_m: f64,
        z_m: f64,

        #[structopt(long, default_value = "left")]
        side: ArmSide,

        /// Duration of the motion in milliseconds.
        #[structopt(long, default_value = "1000")]
        time_ms: u16,
    },

    /// Reach to a point, grasp, and lift.
    #[structopt(name = "grasp")]
    ReachAndGrasp {
        x_m: f64,
        y_m: f64,
        z_m: f64,

        #[structopt(long, default_value = "left")]
        side: ArmSide,
    },

    /// Open the gripper of one arm.
    #[structopt(name = "release")]
    Release {
        #[structopt(long, default_value = "left")]
        side: ArmSide,
    },

    /// Move every joint to the neutral pose.
    #[structopt(name = "neutral")]
    Neutral,

    /// Stop every bus servo immediately.
    #[structopt(name = "stop")]
    Stop,

    /// Read telemetry from one joint.
    #[structopt(name = "telemetry")]
    Telemetry {
        /// Joint name, e.g. `left_knee`.
        joint: JointId,
    },

    /// Read the positions of all leg joints.
    #[structopt(name = "legs")]
    LegPositions,

    /// Drive an angle servo joint with a raw pulse width, for calibration.
    #[structopt(name = "pulse")]
    SetPulse {
        /// Joint name, e.g. `left_elbow`.
        joint: JointId,

        /// Pulse width in microseconds, 500 to 2500.
        pulse_us: u16,
    },
}
