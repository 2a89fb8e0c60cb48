//! Utility library for the Artisan arm software

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

#[macro_use]
pub mod diag;
pub mod host;
pub mod logger;
pub mod maths;
pub mod params;
pub mod session;

