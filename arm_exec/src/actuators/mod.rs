//! # Actuators
//!
//! Joint level actuation. Callers name a [`JointId`] and an angle, this module looks the joint up
//! in the [`JointMap`] and drives whichever device is behind it. Angle servo boards and the servo
//! bus are independent resources, each guarded by its own lock, so the struct can be shared
//! between threads behind an `Arc`.
//!
//! Only bus servos can report their state. Reading an angle servo always gives `None`.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod joint_map;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{collections::BTreeMap, sync::Mutex};

use comms_if::eqpt::{
    bus_servo::{self as codec, TelemetrySample, MAX_MOVE_TIME_MS, TRAVEL_DEG},
    joint::{JointId, LEG_JOINTS},
};
use util::{diag::Diagnostics, diag_debug, diag_info, diag_warn};

pub use joint_map::*;

use crate::{
    bus_servo::{BusServoCtrl, BusTransport},
    lock,
    servo_ctrl::{ServoDriver, MAX_ANGLE_DEG, MAX_PULSE_US, MIN_ANGLE_DEG, MIN_PULSE_US},
    FailureKind,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Every actuator on the robot.
pub struct Actuators<D, T>
where
    D: ServoDriver,
    T: BusTransport,
{
    map: JointMap,

    /// Angle servo boards, board `n` is at index `n - 1`.
    boards: Vec<Mutex<D>>,

    bus: BusServoCtrl<T>,

    diag: Diagnostics,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ActuatorError {
    #[error("No actuator is mapped to {0}")]
    UnmappedJoint(JointId),

    #[error("{joint} is on board {board} but only {num_boards} boards are connected")]
    MissingBoard {
        joint: JointId,
        board: u8,
        num_boards: usize,
    },

    #[error(
        "{joint} cannot be commanded to {angle_deg:.1} deg, its {device} accepts \
        [{min_deg:.0}, {max_deg:.0}] deg"
    )]
    OutOfRange {
        joint: JointId,
        angle_deg: f64,
        device: &'static str,
        min_deg: f64,
        max_deg: f64,
    },

    #[error("{joint} cannot be driven with a {pulse_us} us pulse, angle servos accept [500, 2500] us")]
    PulseOutOfRange { joint: JointId, pulse_us: u16 },

    #[error("{0} is not driven by an angle servo, it cannot be sent a raw pulse")]
    NotAngleServo(JointId),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<D, T> Actuators<D, T>
where
    D: ServoDriver,
    T: BusTransport,
{
    /// Gather the hardware into one joint level interface.
    ///
    /// `boards` holds the angle servo boards in board number order. Every board referenced by the
    /// map must be present.
    pub fn new(
        map: JointMap,
        boards: Vec<D>,
        bus: BusServoCtrl<T>,
        diag: Diagnostics,
    ) -> Result<Self, ActuatorError> {
        let num_boards = boards.len();

        // Boards are numbered from 1 by the map, so only the highest one needs checking
        if map.max_board() as usize > num_boards {
            let missing = map.iter().find_map(|(joint, actuator)| match actuator {
                ActuatorDescriptor::AngleServo { board, .. } if board as usize > num_boards => {
                    Some((joint, board))
                }
                _ => None,
            });

            if let Some((joint, board)) = missing {
                return Err(ActuatorError::MissingBoard {
                    joint,
                    board,
                    num_boards,
                });
            }
        }

        diag_info!(
            diag,
            "Actuators ready: {} joints, {} boards, {} bus servos",
            map.len(),
            boards.len(),
            map.bus_ids().len()
        );

        Ok(Self {
            map,
            boards: boards.into_iter().map(Mutex::new).collect(),
            bus,
            diag,
        })
    }

    pub fn joint_map(&self) -> &JointMap {
        &self.map
    }

    /// Check that `joint` exists and its device can be sent `angle_deg`, without sending anything.
    pub fn check_joint_angle(&self, joint: JointId, angle_deg: f64) -> Result<(), ActuatorError> {
        match self.actuator(joint)? {
            ActuatorDescriptor::AngleServo { .. } => {
                check_range(joint, angle_deg, "angle servo", MIN_ANGLE_DEG, MAX_ANGLE_DEG)
            }
            ActuatorDescriptor::BusServo { .. } => {
                check_range(joint, angle_deg, "bus servo", 0.0, TRAVEL_DEG)
            }
        }
    }

    /// Command a joint to an angle.
    ///
    /// Angle servos move immediately at their own speed and `time_ms` is ignored. Bus servos are
    /// told to take `time_ms` to get there.
    ///
    /// Commands are sent and forgotten. A failure to write to the device is logged but not
    /// returned, the only errors are an unmapped joint or an angle the device cannot accept.
    pub fn set_joint_angle(
        &self,
        joint: JointId,
        angle_deg: f64,
        time_ms: u16,
    ) -> Result<(), ActuatorError> {
        self.check_joint_angle(joint, angle_deg)?;

        match self.actuator(joint)? {
            ActuatorDescriptor::AngleServo { board, channel } => {
                let mut driver = lock(&self.boards[board as usize - 1]);

                if let Err(e) = driver.set_angle(channel, angle_deg) {
                    diag_warn!(
                        self.diag,
                        "Could not set {} (board {} channel {}): {}",
                        joint,
                        board,
                        channel,
                        e
                    );
                }
            }
            ActuatorDescriptor::BusServo { id } => {
                let position = codec::angle_to_units(angle_deg).ok_or(ActuatorError::OutOfRange {
                    joint,
                    angle_deg,
                    device: "bus servo",
                    min_deg: 0.0,
                    max_deg: TRAVEL_DEG,
                })?;

                if time_ms > MAX_MOVE_TIME_MS {
                    diag_debug!(
                        self.diag,
                        "{} move time {} ms limited to {} ms",
                        joint,
                        time_ms,
                        MAX_MOVE_TIME_MS
                    );
                }

                if let Err(e) =
                    self.bus
                        .move_time_write(id, position, time_ms.min(MAX_MOVE_TIME_MS))
                {
                    diag_warn!(self.diag, "Could not set {} (bus ID {}): {}", joint, id, e);
                }
            }
        }

        Ok(())
    }

    /// Drive an angle servo joint with a raw pulse width, bypassing the angle conversion.
    ///
    /// Used to find the pulse widths matching a servo's end stops. Bus servos have no pulse
    /// input. As with angles, a failure to write to the board is logged but not returned.
    pub fn set_joint_pulse(&self, joint: JointId, pulse_us: u16) -> Result<(), ActuatorError> {
        let (board, channel) = match self.actuator(joint)? {
            ActuatorDescriptor::AngleServo { board, channel } => (board, channel),
            ActuatorDescriptor::BusServo { .. } => return Err(ActuatorError::NotAngleServo(joint)),
        };

        if !(MIN_PULSE_US..=MAX_PULSE_US).contains(&pulse_us) {
            return Err(ActuatorError::PulseOutOfRange { joint, pulse_us });
        }

        let mut driver = lock(&self.boards[board as usize - 1]);

        if let Err(e) = driver.set_pulse_us(channel, pulse_us) {
            diag_warn!(
                self.diag,
                "Could not pulse {} (board {} channel {}): {}",
                joint,
                board,
                channel,
                e
            );
        }

        Ok(())
    }

    /// Read the angle of a joint.
    ///
    /// Gives `None` for angle servos, which cannot be read, and for bus servos which do not
    /// answer correctly. Reads are not retried.
    pub fn read_joint_position(&self, joint: JointId) -> Result<Option<f64>, ActuatorError> {
        match self.actuator(joint)? {
            ActuatorDescriptor::AngleServo { .. } => Ok(None),
            ActuatorDescriptor::BusServo { id } => match self.bus.read_position(id) {
                Ok(units) => Ok(Some(codec::units_to_angle(units))),
                Err(e) => {
                    diag_warn!(self.diag, "No position from {} (bus ID {}): {}", joint, id, e);
                    Ok(None)
                }
            },
        }
    }

    /// Read position, temperature and voltage of a joint.
    ///
    /// Gives `None` for angle servos.
    pub fn read_joint_telemetry(
        &self,
        joint: JointId,
    ) -> Result<Option<TelemetrySample>, ActuatorError> {
        match self.actuator(joint)? {
            ActuatorDescriptor::AngleServo { .. } => Ok(None),
            ActuatorDescriptor::BusServo { id } => Ok(Some(self.bus.read_telemetry(id))),
        }
    }

    /// Read the angle of every leg joint.
    pub fn get_leg_positions(&self) -> BTreeMap<JointId, Option<f64>> {
        LEG_JOINTS
            .iter()
            .map(|&joint| {
                let angle = match self.read_joint_position(joint) {
                    Ok(a) => a,
                    Err(e) => {
                        diag_warn!(self.diag, "{}", e);
                        None
                    }
                };
                (joint, angle)
            })
            .collect()
    }

    /// Stop every bus servo.
    ///
    /// A stop is sent to each bus ID in the map exactly once, in ascending order. This does not
    /// wait for any read in progress and always runs to completion.
    ///
    /// Angle servos cannot be stopped, they hold their last commanded angle.
    pub fn emergency_stop(&self) {
        let ids = self.map.bus_ids();

        diag_warn!(self.diag, "EMERGENCY STOP: stopping bus servos {:?}", ids);

        self.bus.stop_all(&ids);
    }

    /// Release all hardware.
    pub fn shutdown(self) {
        diag_info!(self.diag, "Shutting down actuators");
        self.diag.flush();
    }

    fn actuator(&self, joint: JointId) -> Result<ActuatorDescriptor, ActuatorError> {
        self.map
            .get(joint)
            .ok_or(ActuatorError::UnmappedJoint(joint))
    }
}

impl ActuatorError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ActuatorError::UnmappedJoint(_)
            | ActuatorError::MissingBoard { .. }
            | ActuatorError::NotAngleServo(_) => FailureKind::ConfigurationError,
            ActuatorError::OutOfRange { .. } | ActuatorError::PulseOutOfRange { .. } => {
                FailureKind::LimitViolation
            }
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn check_range(
    joint: JointId,
    angle_deg: f64,
    device: &'static str,
    min_deg: f64,
    max_deg: f64,
) -> Result<(), ActuatorError> {
    if (min_deg..=max_deg).contains(&angle_deg) {
        Ok(())
    } else {
        Err(ActuatorError::OutOfRange {
            joint,
            angle_deg,
            device,
            min_deg,
            max_deg,
        })
    }
}
