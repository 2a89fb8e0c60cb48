//! Joint angles of a single arm

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{ArmJoint, NUM_ARM_JOINTS};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The five joint angles of one arm.
///
/// A value of this type says nothing about whether it is within limits until it has been checked
/// by the solver.
///
/// Units: degrees
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointAngles {
    pub shoulder_pitch_deg: f64,
    pub shoulder_roll_deg: f64,
    pub shoulder_yaw_deg: f64,
    pub elbow_deg: f64,
    pub wrist_deg: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl JointAngles {
    pub fn from_array(angles_deg: [f64; NUM_ARM_JOINTS]) -> Self {
        Self {
            shoulder_pitch_deg: angles_deg[0],
            shoulder_roll_deg: angles_deg[1],
            shoulder_yaw_deg: angles_deg[2],
            elbow_deg: angles_deg[3],
            wrist_deg: angles_deg[4],
        }
    }

    /// The angles in [`ArmJoint::ALL`] order.
    pub fn to_array(&self) -> [f64; NUM_ARM_JOINTS] {
        [
            self.shoulder_pitch_deg,
            self.shoulder_roll_deg,
            self.shoulder_yaw_deg,
            self.elbow_deg,
            self.wrist_deg,
        ]
    }

    pub fn get(&self, joint: ArmJoint) -> f64 {
        self.to_array()[joint.index()]
    }

    pub fn set(&mut self, joint: ArmJoint, angle_deg: f64) {
        match joint {
            ArmJoint::ShoulderPitch => self.shoulder_pitch_deg = angle_deg,
            ArmJoint::ShoulderRoll => self.shoulder_roll_deg = angle_deg,
            ArmJoint::ShoulderYaw => self.shoulder_yaw_deg = angle_deg,
            ArmJoint::Elbow => self.elbow_deg = angle_deg,
            ArmJoint::Wrist => self.wrist_deg = angle_deg,
        }
    }

    /// Iterate over `(joint, angle)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (ArmJoint, f64)> {
        let angles = self.to_array();
        ArmJoint::ALL.iter().map(move |j| (*j, angles[j.index()]))
    }
}

impl fmt::Display for JointAngles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pitch {:.1}, roll {:.1}, yaw {:.1}, elbow {:.1}, wrist {:.1} (deg)",
            self.shoulder_pitch_deg,
            self.shoulder_roll_deg,
            self.shoulder_yaw_deg,
            self.elbow_deg,
            self.wrist_deg
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_array_order() {
        let angles = JointAngles::from_array([1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(angles.elbow_deg, 4.0);
        assert_eq!(angles.get(ArmJoint::ShoulderYaw), 3.0);

        let mut angles = angles;
        angles.set(ArmJoint::Wrist, -5.0);
        assert_eq!(angles.to_array(), [1.0, 2.0, 3.0, 4.0, -5.0]);

        let joints: Vec<ArmJoint> = angles.iter().map(|(j, _)| j).collect();
        assert_eq!(joints, ArmJoint::ALL.to_vec());
    }
}
