//! Mapping of logical joints onto physical actuators

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::collections::{BTreeSet, HashMap};

use comms_if::eqpt::{
    bus_servo::MAX_ID,
    joint::{JointId, NUM_JOINTS},
};
use serde::{Deserialize, Serialize};

use crate::{servo_ctrl::NUM_CHANNELS, FailureKind};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of angle servo boards fitted to the robot.
pub const NUM_BOARDS: u8 = 2;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Which physical device drives each joint.
///
/// Every [`JointId`] has exactly one actuator and no two joints share one.
#[derive(Debug, Clone, PartialEq)]
pub struct JointMap {
    map: HashMap<JointId, ActuatorDescriptor>,
}

/// Contents of a joint map override file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JointMapFile {
    pub joints: HashMap<JointId, ActuatorDescriptor>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A physical actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActuatorDescriptor {
    /// A PWM angle servo on one of the PCA9685 boards.
    ///
    /// Boards are numbered from 1.
    AngleServo { board: u8, channel: u8 },

    /// An LX-16A servo on the serial bus.
    BusServo { id: u8 },
}

#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum JointMapError {
    #[error("No actuator is given for {0}")]
    MissingJoint(JointId),

    #[error("{joint} is on board {board}, boards are numbered 1 to {}", NUM_BOARDS)]
    InvalidBoard { joint: JointId, board: u8 },

    #[error("{joint} is on channel {channel}, channels are numbered 0 to {}", NUM_CHANNELS - 1)]
    InvalidChannel { joint: JointId, channel: u8 },

    #[error("{joint} has bus ID {id}, IDs are 1 to {}", MAX_ID)]
    InvalidBusId { joint: JointId, id: u8 },

    #[error("{first} and {second} are both driven by {actuator:?}")]
    SharedActuator {
        first: JointId,
        second: JointId,
        actuator: ActuatorDescriptor,
    },
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl JointMap {
    /// Build a map from explicit descriptors, checking it is complete and consistent.
    pub fn from_descriptors(
        descriptors: HashMap<JointId, ActuatorDescriptor>,
    ) -> Result<Self, JointMapError> {
        let mut owners: HashMap<ActuatorDescriptor, JointId> = HashMap::new();

        // In joint order, not map order
        for &joint in JointId::ALL.iter() {
            let actuator = *descriptors
                .get(&joint)
                .ok_or(JointMapError::MissingJoint(joint))?;

            actuator.validate(joint)?;

            if let Some(&first) = owners.get(&actuator) {
                return Err(JointMapError::SharedActuator {
                    first,
                    second: joint,
                    actuator,
                });
            }
            owners.insert(actuator, joint);
        }

        Ok(Self { map: descriptors })
    }

    /// Build a map from an override file.
    pub fn from_file(file: JointMapFile) -> Result<Self, JointMapError> {
        Self::from_descriptors(file.joints)
    }

    /// The actuator driving `joint`.
    pub fn get(&self, joint: JointId) -> Option<ActuatorDescriptor> {
        self.map.get(&joint).copied()
    }

    /// All bus servo IDs in the map, in ascending order.
    pub fn bus_ids(&self) -> Vec<u8> {
        let ids: BTreeSet<u8> = self
            .map
            .values()
            .filter_map(|a| match a {
                ActuatorDescriptor::BusServo { id } => Some(*id),
                _ => None,
            })
            .collect();

        ids.into_iter().collect()
    }

    /// Highest board number used by the map, 0 if no angle servos are used.
    pub fn max_board(&self) -> u8 {
        self.map
            .values()
            .filter_map(|a| match a {
                ActuatorDescriptor::AngleServo { board, .. } => Some(*board),
                _ => None,
            })
            .max()
            .unwrap_or(0)
    }

    /// Iterate over all `(joint, actuator)` pairs in joint order.
    pub fn iter(&self) -> impl Iterator<Item = (JointId, ActuatorDescriptor)> + '_ {
        JointId::ALL
            .iter()
            .filter_map(move |j| self.map.get(j).map(|a| (*j, *a)))
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Remove a joint, for testing how unmapped joints are handled.
    #[cfg(test)]
    pub(crate) fn without(mut self, joint: JointId) -> Self {
        self.map.remove(&joint);
        self
    }
}

impl Default for JointMap {
    /// The wiring of the robot as built.
    ///
    /// Legs are on the bus with IDs 1 to 10, arms on board 1 and the head and hands on board 2.
    fn default() -> Self {
        use ActuatorDescriptor::*;
        use JointId::*;

        let mut map = HashMap::with_capacity(NUM_JOINTS);

        for (i, joint) in comms_if::eqpt::joint::LEG_JOINTS.iter().enumerate() {
            map.insert(*joint, BusServo { id: i as u8 + 1 });
        }

        let arms = [
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
        ];
        for (channel, joint) in arms.iter().enumerate() {
            map.insert(
                *joint,
                AngleServo {
                    board: 1,
                    channel: channel as u8,
                },
            );
        }

        let head_and_hands = [
            HeadPan,
            HeadTilt,
            LeftHandFingers,
            LeftHandThumb,
            RightHandFingers,
            RightHandThumb,
        ];
        for (channel, joint) in head_and_hands.iter().enumerate() {
            map.insert(
                *joint,
                AngleServo {
                    board: 2,
                    channel: channel as u8,
                },
            );
        }

        Self { map }
    }
}

impl ActuatorDescriptor {
    fn validate(&self, joint: JointId) -> Result<(), JointMapError> {
        match *self {
            ActuatorDescriptor::AngleServo { board, channel } => {
                if board == 0 || board > NUM_BOARDS {
                    return Err(JointMapError::InvalidBoard { joint, board });
                }
                if channel >= NUM_CHANNELS {
                    return Err(JointMapError::InvalidChannel { joint, channel });
                }
            }
            ActuatorDescriptor::BusServo { id } => {
                if id == 0 || id > MAX_ID {
                    return Err(JointMapError::InvalidBusId { joint, id });
                }
            }
        }

        Ok(())
    }
}

impl JointMapError {
    pub fn kind(&self) -> FailureKind {
        FailureKind::ConfigurationError
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn default_descriptors() -> HashMap<JointId, ActuatorDescriptor> {
        JointMap::default().iter().collect()
    }

    #[test]
    fn test_default_map_is_valid() {
        let map = JointMap::default();

        assert_eq!(map.len(), NUM_JOINTS);
        assert_eq!(JointMap::from_descriptors(default_descriptors()), Ok(map.clone()));
        assert_eq!(map.bus_ids(), (1..=10).collect::<Vec<u8>>());
        assert_eq!(map.max_board(), 2);

        assert_eq!(
            map.get(JointId::LeftHipPitch),
            Some(ActuatorDescriptor::BusServo { id: 1 })
        );
        assert_eq!(
            map.get(JointId::RightWrist),
            Some(ActuatorDescriptor::AngleServo {
                board: 1,
                channel: 9
            })
        );
        assert_eq!(
            map.get(JointId::RightHandThumb),
            Some(ActuatorDescriptor::AngleServo {
                board: 2,
                channel: 5
            })
        );
    }

    #[test]
    fn test_missing_joint() {
        let mut d = default_descriptors();
        d.remove(&JointId::HeadTilt);

        let err = JointMap::from_descriptors(d).unwrap_err();
        assert_eq!(err, JointMapError::MissingJoint(JointId::HeadTilt));
        assert_eq!(err.kind(), FailureKind::ConfigurationError);
    }

    #[test]
    fn test_shared_actuator() {
        let mut d = default_descriptors();
        d.insert(JointId::RightAnkle, ActuatorDescriptor::BusServo { id: 1 });

        assert_eq!(
            JointMap::from_descriptors(d),
            Err(JointMapError::SharedActuator {
                first: JointId::LeftHipPitch,
                second: JointId::RightAnkle,
                actuator: ActuatorDescriptor::BusServo { id: 1 },
            })
        );
    }

    #[test]
    fn test_addresses_out_of_range() {
        let cases = [
            (
                ActuatorDescriptor::AngleServo {
                    board: 3,
                    channel: 0,
                },
                JointMapError::InvalidBoard {
                    joint: JointId::HeadPan,
                    board: 3,
                },
            ),
            (
                ActuatorDescriptor::AngleServo {
                    board: 2,
                    channel: 16,
                },
                JointMapError::InvalidChannel {
                    joint: JointId::HeadPan,
                    channel: 16,
                },
            ),
            (
                ActuatorDescriptor::BusServo { id: 0 },
                JointMapError::InvalidBusId {
                    joint: JointId::HeadPan,
                    id: 0,
                },
            ),
        ];

        for (actuator, expected) in cases.iter() {
            let mut d = default_descriptors();
            d.insert(JointId::HeadPan, *actuator);
            assert_eq!(JointMap::from_descriptors(d), Err(expected.clone()));
        }
    }

    #[test]
    fn test_parse_override_file() {
        let mut text = String::from("[joints]\n");
        for (joint, actuator) in JointMap::default().iter() {
            let line = match actuator {
                ActuatorDescriptor::BusServo { id } => {
                    format!("{} = {{ kind = \"bus_servo\", id = {} }}\n", joint, id)
                }
                ActuatorDescriptor::AngleServo { board, channel } => format!(
                    "{} = {{ kind = \"angle_servo\", board = {}, channel = {} }}\n",
                    joint, board, channel
                ),
            };
            text.push_str(&line);
        }

        // Swap the head onto the bus
        text = text.replace(
            "head_pan = { kind = \"angle_servo\", board = 2, channel = 0 }",
            "head_pan = { kind = \"bus_servo\", id = 20 }",
        );

        let file: JointMapFile = toml::from_str(&text).unwrap();
        let map = JointMap::from_file(file).unwrap();

        assert_eq!(
            map.get(JointId::HeadPan),
            Some(ActuatorDescriptor::BusServo { id: 20 })
        );
        assert_eq!(*map.bus_ids().last().unwrap(), 20);
    }

    #[test]
    fn test_example_file_matches_default() {
        let file: JointMapFile =
            toml::from_str(include_str!("../../../params/joint_map.example.toml")).unwrap();

        assert_eq!(JointMap::from_file(file), Ok(JointMap::default()));
    }
}
