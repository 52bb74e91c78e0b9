//! # Electronics driver module
//!
//! The seam between the motion control core and the drivetrain hardware:
//! four absolute angle encoders and four steer/drive motor pairs. The core
//! never talks to a bus directly; it consumes [`AngleEncoder`] readings and
//! hands its outputs to a [`MotorSink`], both of which must complete within
//! the control cycle budget.
//!
//! Real bus transports live outside this repository. [`SimElecDriver`]
//! provides a first-order simulated drivetrain so the executable and tests
//! can run the full control path without hardware.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use params::*;
pub use state::*;

use crate::swerve_ctrl::{OutputData, NUM_MODULES};

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A source of absolute steering angle readings.
///
/// Readings are raw fractional turns in `[0, 1)`, one per module in the
/// fixed module order. `None` marks a sensor that could not produce a valid
/// value this cycle; the core skips actuation of that module for the cycle
/// rather than acting on stale data.
pub trait AngleEncoder {
    fn read_raw_frac(&self) -> [Option<f64>; NUM_MODULES];
}

/// A sink for per-module actuator power demands.
///
/// The core guarantees every demand is within `[-1, 1]`.
pub trait MotorSink {
    type Error;

    fn command(&mut self, demands: &OutputData) -> Result<(), Self::Error>;
}
