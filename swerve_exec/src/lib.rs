//! # Swerve drivetrain software library
//!
//! Control software for a four wheel independently steered and driven
//! ("swerve") drivetrain. The library is split into cyclic modules in the
//! sense of [`util::module::State`]:
//!
//! - [`swerve_ctrl`] - the motion control core, converting whole-body
//!   chassis velocity demands into per-module steer/drive actuator powers.
//! - [`calib_seq`] - the timed bring-up sequence which exercises the same
//!   control path with scripted setpoints.
//! - [`elec_driver`] - the seam to the angle encoders and motor drivers,
//!   including a simulated implementation for bring-up and testing.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod calib_seq;
pub mod elec_driver;
pub mod swerve_ctrl;
