//! Kinematics solver state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use util::{diag::Diagnostics, diag_debug};

use super::{ArmConfiguration, IkError, JointAngles};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Inverse and forward kinematics for one arm model.
///
/// The configuration is fixed at construction, both sides of the robot share one solver.
#[derive(Debug, Clone)]
pub struct IkSolver {
    pub(crate) config: ArmConfiguration,

    pub(crate) diag: Diagnostics,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl IkSolver {
    /// Create a new solver, rejecting configurations which do not describe a real arm.
    pub fn new(config: ArmConfiguration, diag: Diagnostics) -> Result<Self, IkError> {
        config.validate()?;

        diag_debug!(
            diag,
            "IkSolver ready, reach {:.3} to {:.3} m",
            config.geometry.min_reach_m(),
            config.geometry.max_reach_m()
        );

        Ok(Self { config, diag })
    }

    pub fn config(&self) -> &ArmConfiguration {
        &self.config
    }

    /// Check every joint of a solution against the configured limits.
    ///
    /// The first joint out of limits, in [`super::ArmJoint::ALL`] order, is reported.
    pub fn check_joint_limits(&self, angles: &JointAngles) -> Result<(), IkError> {
        for (joint, angle_deg) in angles.iter() {
            self.config.limits.check(joint, angle_deg)?;
        }

        Ok(())
    }
}
