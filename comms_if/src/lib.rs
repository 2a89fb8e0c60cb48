//! # Communications interface crate.
//!
//! Provides all common interfaces between the arm software and the equipment it drives, as well
//! as the commands accepted by the arm executable.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Commands accepted by the arm executable
pub mod tc;

/// Joint identifiers and device wire protocols
pub mod eqpt;
