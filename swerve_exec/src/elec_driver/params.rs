//! Parameters structure for the simulated electronics driver

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;
use thiserror::Error;

// Internal
use crate::swerve_ctrl::NUM_MODULES;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the simulated drivetrain electronics.
#[derive(Debug, Default, Deserialize)]
pub struct Params {
    /// The fixed control cycle period the simulation steps by.
    ///
    /// Units: seconds
    pub cycle_period_s: f64,

    /// Steering slew rate at full steer power.
    ///
    /// Units: degrees/second
    pub steer_rate_degs: f64,

    /// True steering angle of each module at startup.
    ///
    /// Units: degrees
    pub initial_angle_deg: [f64; NUM_MODULES],

    /// Magnetic offset baked into each simulated encoder, mirroring the
    /// offsets the control core must undo during normalisation.
    ///
    /// Units: fractional turns
    pub mag_offset_frac: [f64; NUM_MODULES],

    /// Steer motors wired with inverted polarity.
    ///
    /// Direction inversion is configuration data consumed uniformly here,
    /// not conditional logic scattered through the control path.
    pub steer_inverted: [bool; NUM_MODULES],

    /// Drive motors wired with inverted polarity.
    pub drive_inverted: [bool; NUM_MODULES],
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Ways in which a loaded simulation parameter set can be invalid.
#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("Cycle period must be positive, got {0}")]
    InvalidCyclePeriod(f64),

    #[error("Steer rate must be finite and non-negative, got {0}")]
    InvalidSteerRate(f64),

    #[error("Initial angles and offsets must be finite")]
    NonFiniteValue,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Params {
    /// Determines if the parameters are valid.
    pub fn are_valid(&self) -> Result<(), ParamsError> {
        if !(self.cycle_period_s.is_finite() && self.cycle_period_s > 0.0) {
            return Err(ParamsError::InvalidCyclePeriod(self.cycle_period_s));
        }

        if !(self.steer_rate_degs.is_finite() && self.steer_rate_degs >= 0.0) {
            return Err(ParamsError::InvalidSteerRate(self.steer_rate_degs));
        }

        if !self.initial_angle_deg.iter().all(|a| a.is_finite())
            || !self.mag_offset_frac.iter().all(|o| o.is_finite())
        {
            return Err(ParamsError::NonFiniteValue);
        }

        Ok(())
    }
}
