//! Swerve drive control module
//!
//! This module is the motion control core of the drivetrain. Each cycle it
//! takes an optional [`SwerveCmd`] plus the raw angle encoder readings, and
//! produces one steer power and one drive power per module, all normalised
//! to `[-1, 1]`.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod cmd;
mod config;
mod kinematics;
mod module_ctrl;
mod params;
mod state;
mod steer_ctrl;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use cmd::*;
pub use config::*;
pub use kinematics::*;
pub use module_ctrl::*;
pub use params::*;
pub use state::*;
pub use steer_ctrl::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// The number of swerve modules on the drivetrain.
///
/// The modules are always ordered [FL, FR, BL, BR]. Kinematics output and
/// the module controller array use this order, established at init and
/// never changed.
pub const NUM_MODULES: usize = 4;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during SwerveCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum SwerveCtrlError {
    #[error("Received an invalid command: {0:#?}")]
    InvalidCmd(SwerveCmd),
}
