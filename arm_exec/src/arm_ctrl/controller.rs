//! Arm controller
//!
//! Sequences joint commands into whole arm motions. All motion is open loop: a command is sent,
//! then the controller waits for as long as the motion was asked to take and assumes it has
//! arrived. Bus servos could be polled for their position, but the arms are on angle servos,
//! which give no feedback at all.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use comms_if::eqpt::joint::{ArmSide, JointId};
use nalgebra::Point3;
use serde::Serialize;
use std::{fmt, sync::Arc, thread, time::Duration};
use util::{diag::Diagnostics, diag_error, diag_info};

// Internal
use super::{ArmCtrlError, GraspParams, IkSolver, JointAngles, NeutralParams};
use crate::{actuators::Actuators, bus_servo::BusTransport, servo_ctrl::ServoDriver};

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Waits for a motion to complete.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

/// The external signal which says whether an object is held, e.g. from a tactile sensor.
pub trait GraspSignal {
    fn grasp_confirmed(&mut self, side: ArmSide) -> bool;
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Sleeps the current thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

/// Moves the arms and hands.
pub struct ArmController<D, T, S = ThreadSleeper>
where
    D: ServoDriver,
    T: BusTransport,
    S: Sleeper,
{
    solver: IkSolver,
    actuators: Arc<Actuators<D, T>>,
    grasp: GraspParams,
    neutral: NeutralParams,
    sleeper: S,
    diag: Diagnostics,
}

/// Result of a completed reach and grasp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GraspOutcome {
    pub side: ArmSide,
    pub target: Point3<f64>,

    /// Whether the grasp signal reported an object in the hand after lifting.
    pub confirmed: bool,
}

/// Phases of the reach and grasp manoeuvre, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraspPhase {
    PreGrasp,
    Open,
    Descend,
    Close,
    Lift,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<D, T, S> ArmController<D, T, S>
where
    D: ServoDriver,
    T: BusTransport,
    S: Sleeper,
{
    pub fn new(
        solver: IkSolver,
        actuators: Arc<Actuators<D, T>>,
        grasp: GraspParams,
        neutral: NeutralParams,
        sleeper: S,
        diag: Diagnostics,
    ) -> Self {
        Self {
            solver,
            actuators,
            grasp,
            neutral,
            sleeper,
            diag,
        }
    }

    pub fn solver(&self) -> &IkSolver {
        &self.solver
    }

    pub fn actuators(&self) -> &Arc<Actuators<D, T>> {
        &self.actuators
    }

    /// Move the fingertip of one arm to `target`.
    ///
    /// All five arm joints are given the same `time_ms`. Nothing is sent unless the solution is
    /// within the joint limits and every angle can be sent to its device. Returns the commanded
    /// angles without waiting for the arm to get there.
    pub fn move_to_position(
        &self,
        target: &Point3<f64>,
        side: ArmSide,
        time_ms: u16,
    ) -> Result<JointAngles, ArmCtrlError> {
        let angles = match self.plan(target, side) {
            Ok(a) => a,
            Err(e) => {
                diag_error!(self.diag, "Cannot move {} arm to {}: {}", side, target, e);
                return Err(e);
            }
        };

        let joints = JointId::arm_joints(side);
        let demands = angles.to_array();

        for (joint, angle_deg) in joints.iter().zip(demands.iter()) {
            self.actuators.set_joint_angle(*joint, *angle_deg, time_ms)?;
        }

        diag_info!(self.diag, "Moving {} arm to {} ({})", side, target, angles);

        Ok(angles)
    }

    /// Reach for an object at `target`, grasp it and lift it.
    ///
    /// Phases are run in order, each one waiting for its configured time before the next:
    /// move above the target, open the hand, descend, close the hand, lift. After lifting the
    /// `signal` is asked whether the object is held.
    ///
    /// The pre-grasp and lift points are solved, and the gripper angles checked, before anything
    /// moves, so a grasp which cannot be completed fails without moving the arm.
    pub fn reach_and_grasp<G>(
        &self,
        target: &Point3<f64>,
        side: ArmSide,
        signal: &mut G,
    ) -> Result<GraspOutcome, ArmCtrlError>
    where
        G: GraspSignal + ?Sized,
    {
        let g = self.grasp;
        let pre_grasp = Point3::new(target.x, target.y, target.z + g.pre_grasp_height_m);
        let lift = Point3::new(target.x, target.y, target.z + g.lift_height_m);

        for point in [pre_grasp, *target, lift].iter() {
            if let Err(e) = self.plan(point, side) {
                diag_error!(
                    self.diag,
                    "Cannot grasp at {} with {} arm, {} is not reachable: {}",
                    target,
                    side,
                    point,
                    e
                );
                return Err(e);
            }
        }

        for joint in JointId::gripper_joints(side).iter() {
            for angle_deg in [g.gripper_open_deg, g.gripper_closed_deg].iter() {
                if let Err(e) = self.actuators.check_joint_angle(*joint, *angle_deg) {
                    diag_error!(self.diag, "Cannot grasp with {} hand: {}", side, e);
                    return Err(e.into());
                }
            }
        }

        diag_info!(self.diag, "Reaching for {} with {} arm", target, side);

        self.log_phase(GraspPhase::PreGrasp);
        self.move_to_position(&pre_grasp, side, g.pre_grasp_time_ms)?;
        self.wait_ms(g.pre_grasp_time_ms);

        self.log_phase(GraspPhase::Open);
        self.set_gripper(side, g.gripper_open_deg)?;

        self.log_phase(GraspPhase::Descend);
        self.move_to_position(target, side, g.descend_time_ms)?;
        self.wait_ms(g.descend_time_ms);

        self.log_phase(GraspPhase::Close);
        self.set_gripper(side, g.gripper_closed_deg)?;

        self.log_phase(GraspPhase::Lift);
        self.move_to_position(&lift, side, g.lift_time_ms)?;
        self.wait_ms(g.lift_time_ms);

        let confirmed = signal.grasp_confirmed(side);
        diag_info!(
            self.diag,
            "Grasp at {} with {} arm complete, object {}",
            target,
            side,
            if confirmed { "held" } else { "not detected" }
        );

        Ok(GraspOutcome {
            side,
            target: *target,
            confirmed,
        })
    }

    /// Solve for `target` and check every joint angle can be sent to its device.
    fn plan(&self, target: &Point3<f64>, side: ArmSide) -> Result<JointAngles, ArmCtrlError> {
        let angles = self.solver.solve_ik(target, side)?;

        for (joint, angle_deg) in JointId::arm_joints(side).iter().zip(angles.to_array().iter()) {
            self.actuators.check_joint_angle(*joint, *angle_deg)?;
        }

        Ok(angles)
    }

    /// Open the hand of one arm.
    pub fn release(&self, side: ArmSide) -> Result<(), ArmCtrlError> {
        diag_info!(self.diag, "Releasing {} hand", side);
        self.set_gripper(side, self.grasp.gripper_open_deg)
    }

    /// Move every joint in the configured neutral pose there and wait for it.
    pub fn move_to_neutral_pose(&self) -> Result<(), ArmCtrlError> {
        for (joint, angle_deg) in self.neutral.pose_deg.iter() {
            self.actuators.check_joint_angle(*joint, *angle_deg)?;
        }

        diag_info!(self.diag, "Moving to neutral pose");

        for (joint, angle_deg) in self.neutral.pose_deg.iter() {
            self.actuators
                .set_joint_angle(*joint, *angle_deg, self.neutral.time_ms)?;
        }
        self.wait_ms(self.neutral.time_ms);

        Ok(())
    }

    /// Set fingers and thumb of one hand and wait for them to settle.
    fn set_gripper(&self, side: ArmSide, angle_deg: f64) -> Result<(), ArmCtrlError> {
        let joints = JointId::gripper_joints(side);

        for joint in joints.iter() {
            self.actuators.check_joint_angle(*joint, angle_deg)?;
        }
        for joint in joints.iter() {
            self.actuators
                .set_joint_angle(*joint, angle_deg, self.grasp.gripper_settle_ms)?;
        }
        self.wait_ms(self.grasp.gripper_settle_ms);

        Ok(())
    }

    fn wait_ms(&self, time_ms: u16) {
        self.sleeper.sleep(Duration::from_millis(time_ms as u64));
    }

    fn log_phase(&self, phase: GraspPhase) {
        diag_info!(self.diag, "Grasp phase: {}", phase);
    }
}

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        thread::sleep(duration)
    }
}

impl<F> GraspSignal for F
where
    F: FnMut(ArmSide) -> bool,
{
    fn grasp_confirmed(&mut self, side: ArmSide) -> bool {
        self(side)
    }
}

impl fmt::Display for GraspPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GraspPhase::PreGrasp => "pre-grasp",
            GraspPhase::Open => "open",
            GraspPhase::Descend => "descend",
            GraspPhase::Close => "close",
            GraspPhase::Lift => "lift",
        })
    }
}
