//! # Telecommand module
//!
//! This module provides the commands which can be issued to the arm executable.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod arm_ctrl;
