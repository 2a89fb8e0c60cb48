//! Parameters structure for ArmCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::collections::BTreeMap;

use comms_if::eqpt::joint::JointId;
use serde::{Deserialize, Serialize};

use super::{ArmJoint, IkError, NUM_ARM_JOINTS};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for Arm control, loaded from `arm_ctrl.toml`.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    pub geometry: ArmGeometry,

    pub limits: JointLimits,

    pub grasp: GraspParams,

    pub neutral: NeutralParams,
}

/// Segment lengths of one arm.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArmGeometry {
    /// Offset of the shoulder joint from the torso centreline.
    ///
    /// Not used by the planar solver, kept so the full arm is described in one place.
    ///
    /// Units: meters
    pub shoulder_offset_m: f64,

    /// Units: meters
    pub upper_arm_length_m: f64,

    /// Units: meters
    pub forearm_length_m: f64,

    /// Units: meters
    pub hand_length_m: f64,
}

/// Allowed range of each arm joint.
///
/// Arrays are indexed by [`ArmJoint::index`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointLimits {
    /// Minimum joint angle (lowest value)
    ///
    /// Units: degrees
    pub min_deg: [f64; NUM_ARM_JOINTS],

    /// Maximum joint angle (highest value)
    ///
    /// Units: degrees
    pub max_deg: [f64; NUM_ARM_JOINTS],
}

/// Geometry and limits of an arm, everything the kinematics solver needs.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArmConfiguration {
    pub geometry: ArmGeometry,
    pub limits: JointLimits,
}

/// Timings, offsets and gripper angles of the reach and grasp manoeuvre.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraspParams {
    /// Height above the target of the pre-grasp point.
    ///
    /// Units: meters
    pub pre_grasp_height_m: f64,

    /// Height above the target the object is lifted to.
    ///
    /// Units: meters
    pub lift_height_m: f64,

    /// Units: milliseconds
    pub pre_grasp_time_ms: u16,

    /// Units: milliseconds
    pub descend_time_ms: u16,

    /// Units: milliseconds
    pub lift_time_ms: u16,

    /// Time allowed for the fingers and thumb to open or close.
    ///
    /// Units: milliseconds
    pub gripper_settle_ms: u16,

    /// Units: degrees
    pub gripper_open_deg: f64,

    /// Units: degrees
    pub gripper_closed_deg: f64,
}

/// The safe resting pose of the robot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeutralParams {
    /// Duration of the move into the pose.
    ///
    /// Units: milliseconds
    pub time_ms: u16,

    /// Angle of each joint in the pose. Joints not listed are left where they are.
    ///
    /// Units: degrees
    pub pose_deg: BTreeMap<JointId, f64>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Params {
    pub fn arm_config(&self) -> ArmConfiguration {
        ArmConfiguration {
            geometry: self.geometry,
            limits: self.limits,
        }
    }
}

impl ArmGeometry {
    /// Length of the distal link (forearm plus hand).
    pub fn distal_length_m(&self) -> f64 {
        self.forearm_length_m + self.hand_length_m
    }

    /// Distance from the shoulder to the fingertip with the arm straight.
    pub fn max_reach_m(&self) -> f64 {
        self.upper_arm_length_m + self.distal_length_m()
    }

    /// Closest the fingertip can get to the shoulder with the elbow fully folded.
    pub fn min_reach_m(&self) -> f64 {
        (self.upper_arm_length_m - self.distal_length_m()).abs()
    }
}

impl Default for ArmGeometry {
    fn default() -> Self {
        Self {
            shoulder_offset_m: 0.05,
            upper_arm_length_m: 0.25,
            forearm_length_m: 0.20,
            hand_length_m: 0.10,
        }
    }
}

impl JointLimits {
    pub fn min(&self, joint: ArmJoint) -> f64 {
        self.min_deg[joint.index()]
    }

    pub fn max(&self, joint: ArmJoint) -> f64 {
        self.max_deg[joint.index()]
    }

    /// Check a single joint angle, NaN is never within limits.
    pub fn check(&self, joint: ArmJoint, angle_deg: f64) -> Result<(), IkError> {
        let (min_deg, max_deg) = (self.min(joint), self.max(joint));

        if (min_deg..=max_deg).contains(&angle_deg) {
            Ok(())
        } else {
            Err(IkError::LimitViolation {
                joint,
                angle_deg,
                min_deg,
                max_deg,
            })
        }
    }
}

impl Default for JointLimits {
    fn default() -> Self {
        Self {
            // pitch, roll, yaw, elbow, wrist
            min_deg: [-90.0, -90.0, -90.0, 0.0, -90.0],
            max_deg: [180.0, 90.0, 90.0, 150.0, 90.0],
        }
    }
}

impl ArmConfiguration {
    /// Check the configuration describes a physically meaningful arm.
    pub fn validate(&self) -> Result<(), IkError> {
        let g = &self.geometry;
        let lengths = [
            ("upper arm", g.upper_arm_length_m),
            ("forearm", g.forearm_length_m),
            ("hand", g.hand_length_m),
        ];

        for (name, length) in lengths.iter() {
            if !(*length > 0.0 && length.is_finite()) {
                return Err(IkError::InvalidConfiguration(format!(
                    "{} length must be positive, got {} m",
                    name, length
                )));
            }
        }

        if !(g.shoulder_offset_m >= 0.0) {
            return Err(IkError::InvalidConfiguration(format!(
                "shoulder offset must not be negative, got {} m",
                g.shoulder_offset_m
            )));
        }

        for joint in ArmJoint::ALL.iter() {
            let (min, max) = (self.limits.min(*joint), self.limits.max(*joint));
            if !(min <= max) {
                return Err(IkError::InvalidConfiguration(format!(
                    "{} limits are inverted: [{}, {}] deg",
                    joint, min, max
                )));
            }
        }

        Ok(())
    }
}

impl Default for GraspParams {
    fn default() -> Self {
        Self {
            pre_grasp_height_m: 0.05,
            lift_height_m: 0.10,
            pre_grasp_time_ms: 1500,
            descend_time_ms: 800,
            lift_time_ms: 1000,
            gripper_settle_ms: 500,
            gripper_open_deg: 0.0,
            gripper_closed_deg: 90.0,
        }
    }
}

impl Default for NeutralParams {
    fn default() -> Self {
        use JointId::*;

        let mut pose_deg = BTreeMap::new();
        pose_deg.insert(HeadPan, 90.0);
        pose_deg.insert(HeadTilt, 90.0);

        for &(pitch, roll, yaw, elbow, wrist) in [
            (LeftShoulderPitch, LeftShoulderRoll, LeftShoulderYaw, LeftElbow, LeftWrist),
            (RightShoulderPitch, RightShoulderRoll, RightShoulderYaw, RightElbow, RightWrist),
        ]
        .iter()
        {
            pose_deg.insert(pitch, 90.0);
            pose_deg.insert(roll, 45.0);
            pose_deg.insert(yaw, 90.0);
            pose_deg.insert(elbow, 45.0);
            pose_deg.insert(wrist, 90.0);
        }

        Self {
            time_ms: 2000,
            pose_deg,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_default_reach() {
        let g = ArmGeometry::default();
        assert!((g.max_reach_m() - 0.55).abs() < 1e-12);
        assert!((g.min_reach_m() - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_validate() {
        assert!(ArmConfiguration::default().validate().is_ok());

        let mut config = ArmConfiguration::default();
        config.geometry.forearm_length_m = 0.0;
        assert!(matches!(
            config.validate(),
            Err(IkError::InvalidConfiguration(_))
        ));

        let mut config = ArmConfiguration::default();
        config.limits.min_deg[ArmJoint::Elbow.index()] = 160.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_limit_check_rejects_nan() {
        let limits = JointLimits::default();
        assert!(limits.check(ArmJoint::Wrist, 0.0).is_ok());
        assert!(limits.check(ArmJoint::Wrist, f64::NAN).is_err());
        assert!(limits.check(ArmJoint::Elbow, -0.1).is_err());
    }

    #[test]
    fn test_params_from_toml() {
        let params: Params = toml::from_str(
            r#"
            [geometry]
            shoulder_offset_m = 0.05
            upper_arm_length_m = 0.3
            forearm_length_m = 0.2
            hand_length_m = 0.1

            [grasp]
            lift_height_m = 0.2

            [neutral]
            time_ms = 500
            [neutral.pose_deg]
            head_pan = 45.0
            "#,
        )
        .unwrap();

        assert_eq!(params.geometry.upper_arm_length_m, 0.3);
        assert_eq!(params.limits, JointLimits::default());
        assert_eq!(params.grasp.lift_height_m, 0.2);
        assert_eq!(params.grasp.descend_time_ms, 800);
        assert_eq!(params.neutral.pose_deg.len(), 1);
        assert_eq!(params.neutral.pose_deg[&JointId::HeadPan], 45.0);
    }

    #[test]
    fn test_default_neutral_pose() {
        let n = NeutralParams::default();
        assert_eq!(n.pose_deg.len(), 12);
        assert_eq!(n.pose_deg[&JointId::RightElbow], 45.0);
        assert_eq!(n.pose_deg[&JointId::HeadTilt], 90.0);
    }

    #[test]
    fn test_shipped_params_match_defaults() {
        let params: Params = toml::from_str(include_str!("../../../params/arm_ctrl.toml")).unwrap();

        assert_eq!(params.arm_config(), ArmConfiguration::default());
        assert_eq!(params.grasp, GraspParams::default());
        assert_eq!(params.neutral, NeutralParams::default());
    }
}
