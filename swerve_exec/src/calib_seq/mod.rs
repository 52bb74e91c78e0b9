//! Calibration sequencer module
//!
//! A timed state machine used for drivetrain bring-up and diagnostics.
//! Instead of taking an external velocity command it emits a scripted
//! series of [`crate::swerve_ctrl::SwerveCmd`]s, one per control cycle,
//! exercising the same module controller path as closed-loop operation:
//! first the raw encoders and drive motors, then the steering loop, then
//! whole-body rotation, translation, heading and speed normalisation.
//!
//! Phase transitions are driven purely by elapsed tick count, never by
//! convergence or operator input, so a run is fully deterministic for a
//! given tick rate. This path is a bring-up tool only and is not used once
//! closed-loop operation is qualified.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod phases;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use params::*;
pub use phases::*;
pub use state::*;
