//! Arm inverse kinematics calculations

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::joint::ArmSide;
use nalgebra::Point3;
use util::{diag_debug, diag_warn, maths::clamp_unit};

// Internal imports
use super::{ArmJoint, IkError, IkSolver, JointAngles};

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl IkSolver {
    /// Find the joint angles which put the fingertip at `target`.
    ///
    /// The target is relative to the shoulder, in meters. The shoulder yaw points the arm's plane
    /// at the target, then the upper arm and distal link (forearm and hand) are solved as a
    /// two link planar chain using the law of cosines. Of the two elbow solutions the one with
    /// the elbow above the line from shoulder to target is returned. Shoulder pitch and wrist are left at zero.
    ///
    /// The yaw of the right arm is negated, so a mirrored target produces a mirrored pose.
    ///
    /// Targets which cannot be reached are never clamped onto the workspace, they produce
    /// [`IkError::Unreachable`]. A solution with any joint out of limits produces
    /// [`IkError::LimitViolation`].
    pub fn solve_ik(&self, target: &Point3<f64>, side: ArmSide) -> Result<JointAngles, IkError> {
        let g = &self.config.geometry;
        let max_reach_m = g.max_reach_m();
        let min_reach_m = g.min_reach_m();

        let distance_m = target.coords.norm();
        if !(distance_m <= max_reach_m) {
            diag_warn!(
                self.diag,
                "Target {} is {:.3} m away, beyond max reach of {:.3} m",
                target,
                distance_m,
                max_reach_m
            );
            return Err(IkError::Unreachable {
                distance_m,
                min_reach_m,
                max_reach_m,
            });
        }

        let mut yaw_rad = target.y.atan2(target.x);
        if side == ArmSide::Right {
            yaw_rad = -yaw_rad;
        }

        // Planar problem in the plane of the arm
        let l1 = g.upper_arm_length_m;
        let l2 = g.distal_length_m();
        let horizontal_m = target.x.hypot(target.y);
        let r = horizontal_m.hypot(target.z);

        if r < min_reach_m || r > max_reach_m || r <= f64::EPSILON {
            diag_warn!(
                self.diag,
                "Target {} at planar distance {:.3} m is outside [{:.3}, {:.3}] m",
                target,
                r,
                min_reach_m,
                max_reach_m
            );
            return Err(IkError::Unreachable {
                distance_m: r,
                min_reach_m,
                max_reach_m,
            });
        }

        let elbow_rad = clamp_unit((l1.powi(2) + l2.powi(2) - r.powi(2)) / (2.0 * l1 * l2)).acos();

        // Elevation of the target plus the angle between the target line and the upper arm
        let alpha_rad = target.z.atan2(horizontal_m);
        let beta_rad = clamp_unit((l1.powi(2) + r.powi(2) - l2.powi(2)) / (2.0 * l1 * r)).acos();
        let roll_rad = alpha_rad + beta_rad;

        let angles = JointAngles {
            shoulder_pitch_deg: 0.0,
            shoulder_roll_deg: roll_rad.to_degrees(),
            shoulder_yaw_deg: yaw_rad.to_degrees(),
            elbow_deg: elbow_rad.to_degrees(),
            wrist_deg: 0.0,
        };

        if let Err(e) = self.check_joint_limits(&angles) {
            diag_warn!(self.diag, "No valid {} arm solution for {}: {}", side, target, e);
            return Err(e);
        }

        diag_debug!(self.diag, "{} arm solution for {}: {}", side, target, angles);

        Ok(angles)
    }

    /// Find the joint angles which put the fingertip at `target` with the hand pitched at
    /// `approach_deg` (0 is horizontal, positive points the fingers up).
    ///
    /// The wrist position is found by stepping back from the target by the hand length along the
    /// approach direction, which lies in the vertical plane through the shoulder and the target.
    /// The wrist is then set to the approach angle.
    pub fn solve_ik_with_orientation(
        &self,
        target: &Point3<f64>,
        approach_deg: f64,
        side: ArmSide,
    ) -> Result<JointAngles, IkError> {
        let hand_m = self.config.geometry.hand_length_m;
        let approach_rad = approach_deg.to_radians();
        let azimuth_rad = target.y.atan2(target.x);

        let back_horizontal_m = hand_m * approach_rad.cos();
        let wrist_target = Point3::new(
            target.x - back_horizontal_m * azimuth_rad.cos(),
            target.y - back_horizontal_m * azimuth_rad.sin(),
            target.z - hand_m * approach_rad.sin(),
        );

        let mut angles = self.solve_ik(&wrist_target, side)?;
        angles.wrist_deg = approach_deg;

        self.config.limits.check(ArmJoint::Wrist, angles.wrist_deg)?;

        Ok(angles)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{arm_ctrl::ArmConfiguration, FailureKind};
    use proptest::prelude::*;
    use util::diag::{Diagnostics, Level, MemorySink};

    fn solver() -> IkSolver {
        IkSolver::new(ArmConfiguration::default(), Diagnostics::null()).unwrap()
    }

    #[test]
    fn test_reachable_target_round_trips() {
        let s = solver();
        let target = Point3::new(0.30, 0.10, 0.20);

        let angles = s.solve_ik(&target, ArmSide::Left).unwrap();
        let reached = s.forward_kinematics(&angles);

        assert!((reached - target).norm() < 0.01);
        assert_eq!(angles.shoulder_pitch_deg, 0.0);
        assert_eq!(angles.wrist_deg, 0.0);
    }

    #[test]
    fn test_far_target_is_unreachable() {
        let sink = MemorySink::new();
        let s = IkSolver::new(
            ArmConfiguration::default(),
            Diagnostics::new(sink.clone(), "ik"),
        )
        .unwrap();

        let err = s
            .solve_ik(&Point3::new(1.0, 0.0, 0.0), ArmSide::Left)
            .unwrap_err();

        assert_eq!(err.kind(), FailureKind::Unreachable);
        match err {
            IkError::Unreachable {
                distance_m,
                max_reach_m,
                ..
            } => {
                assert!((distance_m - 1.0).abs() < 1e-12);
                assert!((max_reach_m - 0.55).abs() < 1e-12);
            }
            e => panic!("Unexpected error {:?}", e),
        }
        assert!(sink.contains(Level::Warn, "beyond max reach"));
    }

    #[test]
    fn test_target_inside_folded_reach_is_unreachable() {
        let s = solver();

        for target in [
            Point3::new(0.03, 0.0, 0.0),
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 0.02, -0.02),
        ]
        .iter()
        {
            let err = s.solve_ik(target, ArmSide::Left).unwrap_err();
            assert_eq!(err.kind(), FailureKind::Unreachable, "{}", target);
        }
    }

    #[test]
    fn test_sides_mirror_yaw() {
        let s = solver();
        let target = Point3::new(0.35, 0.1, 0.1);

        let left = s.solve_ik(&target, ArmSide::Left).unwrap();
        let right = s.solve_ik(&target, ArmSide::Right).unwrap();

        assert!(left.shoulder_yaw_deg > 0.0);
        assert_eq!(left.shoulder_yaw_deg, -right.shoulder_yaw_deg);
        assert_eq!(left.shoulder_roll_deg, right.shoulder_roll_deg);
        assert_eq!(left.elbow_deg, right.elbow_deg);

        // Right arm solutions land on the target in the right arm's body frame
        let reached = s.forward_kinematics_for(&right, ArmSide::Right);
        assert!((reached - target).norm() < 0.01);
    }

    #[test]
    fn test_straight_arm_violates_elbow_limit() {
        let s = solver();

        // Within reach, but needs the elbow nearly straight
        let err = s
            .solve_ik(&Point3::new(0.54, 0.0, 0.0), ArmSide::Left)
            .unwrap_err();

        assert_eq!(err.kind(), FailureKind::LimitViolation);
        match err {
            IkError::LimitViolation {
                joint, angle_deg, ..
            } => {
                assert_eq!(joint, ArmJoint::Elbow);
                assert!(angle_deg > 150.0);
            }
            e => panic!("Unexpected error {:?}", e),
        }
    }

    #[test]
    fn test_target_overhead_violates_roll_limit() {
        let s = solver();

        // Reachable, but the upper arm would have to pass vertical (about 131 deg of roll)
        let err = s
            .solve_ik(&Point3::new(0.05, 0.0, 0.40), ArmSide::Left)
            .unwrap_err();

        match err {
            IkError::LimitViolation {
                joint, angle_deg, ..
            } => {
                assert_eq!(joint, ArmJoint::ShoulderRoll);
                assert!(angle_deg > 90.0);
            }
            e => panic!("Unexpected error {:?}", e),
        }
    }

    #[test]
    fn test_target_behind_violates_yaw_limit() {
        let s = solver();
        let err = s
            .solve_ik(&Point3::new(-0.2, 0.1, 0.0), ArmSide::Left)
            .unwrap_err();

        assert!(matches!(
            err,
            IkError::LimitViolation {
                joint: ArmJoint::ShoulderYaw,
                ..
            }
        ));
    }

    #[test]
    fn test_orientation_sets_wrist() {
        let s = solver();
        let target = Point3::new(0.40, 0.10, 0.05);

        let angles = s
            .solve_ik_with_orientation(&target, -30.0, ArmSide::Left)
            .unwrap();
        assert_eq!(angles.wrist_deg, -30.0);

        // The solved point is one hand length back from the target along the approach
        let wrist = s.forward_kinematics(&angles);
        let hand_m = s.config().geometry.hand_length_m;
        assert!(((target - wrist).norm() - hand_m).abs() < 0.01);
        assert!(wrist.z > target.z);

        let err = s
            .solve_ik_with_orientation(&target, 120.0, ArmSide::Left)
            .unwrap_err();
        assert!(matches!(
            err,
            IkError::LimitViolation {
                joint: ArmJoint::Wrist,
                ..
            }
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = ArmConfiguration::default();
        config.geometry.upper_arm_length_m = -0.1;

        let err = IkSolver::new(config, Diagnostics::null()).unwrap_err();
        assert_eq!(err.kind(), FailureKind::ConfigurationError);
    }

    fn any_side() -> impl Strategy<Value = ArmSide> {
        prop_oneof![Just(ArmSide::Left), Just(ArmSide::Right)]
    }

    proptest! {
        // Targets are generated from poses the solver can reach: shoulder above horizontal,
        // elbow bent far enough that the hand stays in front of the shoulder.
        #[test]
        fn test_reachable_targets_round_trip(
            roll_deg in 0.0..85.0f64,
            yaw_deg in -80.0..80.0f64,
            elbow_deg in 40.0..149.0f64,
            side in any_side(),
        ) {
            let s = solver();
            let pose = JointAngles {
                shoulder_roll_deg: roll_deg,
                shoulder_yaw_deg: yaw_deg,
                elbow_deg,
                ..Default::default()
            };
            let target = s.forward_kinematics_for(&pose, side);

            let angles = s.solve_ik(&target, side);
            prop_assert!(angles.is_ok(), "{} arm: {} gave {:?}", side, target, angles);

            let reached = s.forward_kinematics_for(&angles.unwrap(), side);
            prop_assert!(
                (reached - target).norm() < 0.01,
                "{} arm: {} reached {}",
                side,
                target,
                reached
            );
        }

        #[test]
        fn test_targets_beyond_reach_are_unreachable(
            direction in (-1.0..1.0f64, -1.0..1.0f64, -1.0..1.0f64),
            extra_m in 0.001..1.0f64,
            side in any_side(),
        ) {
            let s = solver();
            let (x, y, z) = direction;
            let dir = nalgebra::Vector3::new(x, y, z);
            prop_assume!(dir.norm() > 1e-3);

            let distance_m = s.config().geometry.max_reach_m() + extra_m;
            let target = Point3::from(dir.normalize() * distance_m);

            let err = s.solve_ik(&target, side).unwrap_err();
            prop_assert_eq!(err.kind(), FailureKind::Unreachable);
        }
    }
}
