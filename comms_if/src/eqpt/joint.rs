//! # Joint identifiers
//!
//! Every controllable joint on the robot has a [`JointId`]. The identifiers are fixed at compile
//! time and are used as the key of the joint to actuator mapping.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{
    de::{self, Visitor},
    Deserialize, Deserializer, Serialize, Serializer,
};
use std::{fmt, str::FromStr};
use thiserror::Error;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// The number of joints on the robot.
pub const NUM_JOINTS: usize = 26;

/// The leg joints, all of which are driven by bus servos in the default mapping.
pub const LEG_JOINTS: [JointId; 10] = [
    JointId::LeftHipPitch,
    JointId::LeftHipRoll,
    JointId::LeftHipYaw,
    JointId::LeftKnee,
    JointId::LeftAnkle,
    JointId::RightHipPitch,
    JointId::RightHipRoll,
    JointId::RightHipYaw,
    JointId::RightKnee,
    JointId::RightAnkle,
];

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// IDs of all joints available on the robot
///
/// Serialised as its snake case [`JointId::name`]. The serde impls go through the name so the
/// id can also be used as a table key in parameter files.
#[derive(Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Copy, Clone)]
pub enum JointId {
    // Legs
    LeftHipPitch,
    LeftHipRoll,
    LeftHipYaw,
    LeftKnee,
    LeftAnkle,
    RightHipPitch,
    RightHipRoll,
    RightHipYaw,
    RightKnee,
    RightAnkle,

    // Arms
    LeftShoulderPitch,
    LeftShoulderRoll,
    LeftShoulderYaw,
    LeftElbow,
    LeftWrist,
    RightShoulderPitch,
    RightShoulderRoll,
    RightShoulderYaw,
    RightElbow,
    RightWrist,

    // Head
    HeadPan,
    HeadTilt,

    // Hands
    LeftHandFingers,
    LeftHandThumb,
    RightHandFingers,
    RightHandThumb,
}

/// Which of the two arms a command is for.
#[derive(Serialize, Deserialize, Debug, Hash, Eq, PartialEq, Copy, Clone)]
#[serde(rename_all = "snake_case")]
pub enum ArmSide {
    Left,
    Right,
}

/// Error returned when a joint or side name cannot be parsed.
#[derive(Debug, Error, PartialEq)]
#[error("Unknown {kind} name \"{name}\"")]
pub struct ParseNameError {
    kind: &'static str,
    name: String,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl JointId {
    /// All joints, in declaration order.
    pub const ALL: [JointId; NUM_JOINTS] = [
        JointId::LeftHipPitch,
        JointId::LeftHipRoll,
        JointId::LeftHipYaw,
        JointId::LeftKnee,
        JointId::LeftAnkle,
        JointId::RightHipPitch,
        JointId::RightHipRoll,
        JointId::RightHipYaw,
        JointId::RightKnee,
        JointId::RightAnkle,
        JointId::LeftShoulderPitch,
        JointId::LeftShoulderRoll,
        JointId::LeftShoulderYaw,
        JointId::LeftElbow,
        JointId::LeftWrist,
        JointId::RightShoulderPitch,
        JointId::RightShoulderRoll,
        JointId::RightShoulderYaw,
        JointId::RightElbow,
        JointId::RightWrist,
        JointId::HeadPan,
        JointId::HeadTilt,
        JointId::LeftHandFingers,
        JointId::LeftHandThumb,
        JointId::RightHandFingers,
        JointId::RightHandThumb,
    ];

    /// The five arm joints of one side, in the order shoulder pitch, shoulder roll, shoulder
    /// yaw, elbow, wrist.
    pub fn arm_joints(side: ArmSide) -> [JointId; 5] {
        match side {
            ArmSide::Left => [
                JointId::LeftShoulderPitch,
                JointId::LeftShoulderRoll,
                JointId::LeftShoulderYaw,
                JointId::LeftElbow,
                JointId::LeftWrist,
            ],
            ArmSide::Right => [
                JointId::RightShoulderPitch,
                JointId::RightShoulderRoll,
                JointId::RightShoulderYaw,
                JointId::RightElbow,
                JointId::RightWrist,
            ],
        }
    }

    /// The gripper joints (fingers, thumb) of one side.
    pub fn gripper_joints(side: ArmSide) -> [JointId; 2] {
        match side {
            ArmSide::Left => [JointId::LeftHandFingers, JointId::LeftHandThumb],
            ArmSide::Right => [JointId::RightHandFingers, JointId::RightHandThumb],
        }
    }

    /// The snake case name of the joint, as used in parameter files.
    pub fn name(&self) -> &'static str {
        match self {
            JointId::LeftHipPitch => "left_hip_pitch",
            JointId::LeftHipRoll => "left_hip_roll",
            JointId::LeftHipYaw => "left_hip_yaw",
            JointId::LeftKnee => "left_knee",
            JointId::LeftAnkle => "left_ankle",
            JointId::RightHipPitch => "right_hip_pitch",
            JointId::RightHipRoll => "right_hip_roll",
            JointId::RightHipYaw => "right_hip_yaw",
            JointId::RightKnee => "right_knee",
            JointId::RightAnkle => "right_ankle",
            JointId::LeftShoulderPitch => "left_shoulder_pitch",
            JointId::LeftShoulderRoll => "left_shoulder_roll",
            JointId::LeftShoulderYaw => "left_shoulder_yaw",
            JointId::LeftElbow => "left_elbow",
            JointId::LeftWrist => "left_wrist",
            JointId::RightShoulderPitch => "right_shoulder_pitch",
            JointId::RightShoulderRoll => "right_shoulder_roll",
            JointId::RightShoulderYaw => "right_shoulder_yaw",
            JointId::RightElbow => "right_elbow",
            JointId::RightWrist => "right_wrist",
            JointId::HeadPan => "head_pan",
            JointId::HeadTilt => "head_tilt",
            JointId::LeftHandFingers => "left_hand_fingers",
            JointId::LeftHandThumb => "left_hand_thumb",
            JointId::RightHandFingers => "right_hand_fingers",
            JointId::RightHandThumb => "right_hand_thumb",
        }
    }
}

impl fmt::Display for JointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for JointId {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JointId::ALL
            .iter()
            .find(|j| j.name() == s)
            .copied()
            .ok_or_else(|| ParseNameError {
                kind: "joint",
                name: s.to_string(),
            })
    }
}

impl Serialize for JointId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for JointId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_str(JointIdVisitor)
    }
}

struct JointIdVisitor;

impl<'de> Visitor<'de> for JointIdVisitor {
    type Value = JointId;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a snake case joint name such as \"left_knee\"")
    }

    fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        value.parse().map_err(E::custom)
    }
}

impl ArmSide {
    pub fn name(&self) -> &'static str {
        match self {
            ArmSide::Left => "left",
            ArmSide::Right => "right",
        }
    }
}

impl Default for ArmSide {
    fn default() -> Self {
        ArmSide::Left
    }
}

impl fmt::Display for ArmSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ArmSide {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "left" | "l" => Ok(ArmSide::Left),
            "right" | "r" => Ok(ArmSide::Right),
            _ => Err(ParseNameError {
                kind: "arm side",
                name: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::{BTreeMap, HashSet};

    #[test]
    fn test_all_is_complete_and_unique() {
        let set: HashSet<JointId> = JointId::ALL.iter().copied().collect();
        assert_eq!(set.len(), NUM_JOINTS);

        for joint in LEG_JOINTS.iter() {
            assert!(set.contains(joint));
        }
    }

    #[test]
    fn test_names_round_trip() {
        for joint in JointId::ALL.iter() {
            assert_eq!(joint.name().parse::<JointId>(), Ok(*joint));
        }

        assert!("left_tail".parse::<JointId>().is_err());
    }

    #[test]
    fn test_serde_names_match() {
        #[derive(Deserialize)]
        struct Wrapper {
            joint: JointId,
        }

        for joint in JointId::ALL.iter() {
            let w: Wrapper = toml::from_str(&format!("joint = \"{}\"", joint.name())).unwrap();
            assert_eq!(w.joint, *joint);
        }

        assert!(toml::from_str::<Wrapper>("joint = \"left_tail\"").is_err());
    }

    #[test]
    fn test_joint_names_as_table_keys() {
        #[derive(Deserialize)]
        struct Table {
            angles: BTreeMap<JointId, f64>,
        }

        let t: Table = toml::from_str(
            r#"
            [angles]
            left_knee = 10.0
            head_pan = 90.0
            "#,
        )
        .unwrap();

        assert_eq!(t.angles.len(), 2);
        assert_eq!(t.angles[&JointId::LeftKnee], 10.0);
        assert_eq!(t.angles[&JointId::HeadPan], 90.0);

        assert!(toml::from_str::<Table>("[angles]\nleft_tail = 1.0").is_err());

        // Keys come back out under the same names
        let json = serde_json::to_string(&t.angles).unwrap();
        assert_eq!(json, r#"{"left_knee":10.0,"head_pan":90.0}"#);
    }

    #[test]
    fn test_side_joints() {
        assert_eq!(JointId::arm_joints(ArmSide::Right)[3], JointId::RightElbow);
        assert_eq!(
            JointId::gripper_joints(ArmSide::Left),
            [JointId::LeftHandFingers, JointId::LeftHandThumb]
        );
        assert_eq!("R".parse::<ArmSide>(), Ok(ArmSide::Right));
        assert!("up".parse::<ArmSide>().is_err());
    }
}
