//! Arm forward kinematics calculations

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::joint::ArmSide;
use nalgebra::Point3;
use std::f64::consts::PI;

use super::{IkSolver, JointAngles};

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl IkSolver {
    /// Compute the fingertip position for a set of joint angles.
    ///
    /// The arm is modelled as two links in a vertical plane which is rotated about the vertical
    /// axis by the shoulder yaw. The upper arm is elevated by the shoulder roll, the distal link
    /// (forearm and hand) by `roll + elbow - 180`, where the elbow angle is the interior angle
    /// between the links (180 is a straight arm). The horizontal reach is scaled by the cosine of
    /// the shoulder pitch.
    ///
    /// The result is in the frame the solver works in, see [`IkSolver::forward_kinematics_for`]
    /// for the body frame of a particular side.
    pub fn forward_kinematics(&self, angles: &JointAngles) -> Point3<f64> {
        let g = &self.config.geometry;

        let pitch_rad = angles.shoulder_pitch_deg.to_radians();
        let yaw_rad = angles.shoulder_yaw_deg.to_radians();
        let upper_elev_rad = angles.shoulder_roll_deg.to_radians();
        let distal_elev_rad = upper_elev_rad + angles.elbow_deg.to_radians() - PI;

        let planar_m = g.upper_arm_length_m * upper_elev_rad.cos()
            + g.distal_length_m() * distal_elev_rad.cos();
        let horizontal_m = planar_m * pitch_rad.cos();
        let height_m = g.upper_arm_length_m * upper_elev_rad.sin()
            + g.distal_length_m() * distal_elev_rad.sin();

        Point3::new(
            horizontal_m * yaw_rad.cos(),
            horizontal_m * yaw_rad.sin(),
            height_m,
        )
    }

    /// Compute the fingertip position in the body frame of the given side.
    ///
    /// The solver negates the yaw of the right arm, so its positions are mirrored in y.
    pub fn forward_kinematics_for(&self, angles: &JointAngles, side: ArmSide) -> Point3<f64> {
        let mut point = self.forward_kinematics(angles);

        if side == ArmSide::Right {
            point.y = -point.y;
        }

        point
    }
}
