//! Parameters structure for the calibration sequencer

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the calibration sequence.
///
/// The numeric values here are test stimuli, not tuning: they are kept
/// deliberately slow so an operator can watch each phase and intervene.
#[derive(Debug, Default, Deserialize)]
pub struct Params {
    /// Number of control ticks each phase runs for before the sequence
    /// advances.
    pub phase_duration_ticks: u64,

    /// What to do after the final phase: wrap back to the first phase or
    /// halt with a permanent stop demand.
    pub on_complete: OnComplete,

    /// Raw drive power used during the moving half of the encoder check.
    ///
    /// Units: normalised, [-1, 1]
    pub encoder_check_drive_power: f64,

    /// Drive power used while stepping the steering setpoint, slow enough
    /// to make the drive direction visible.
    ///
    /// Units: normalised, [-1, 1]
    pub steer_step_drive_power: f64,

    /// Chassis angular rate for the rotation-only phase.
    ///
    /// Units: radians/second
    pub rotation_rate_rads: f64,

    /// Chassis linear speed for the translation-only phase.
    ///
    /// Units: meters/second
    pub translation_speed_ms: f64,

    /// Chassis velocity (vx, vy, omega) for the speed normalisation
    /// phase. Should be large enough to saturate at least one module.
    pub speed_norm_velocity: [f64; 3],
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Behaviour of the sequence after its final phase.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub enum OnComplete {
    /// Restart from the first phase.
    Wrap,

    /// Enter the terminal `Complete` phase and demand a stop forever.
    Halt,
}

impl Default for OnComplete {
    fn default() -> Self {
        OnComplete::Halt
    }
}

/// Ways in which a loaded sequencer parameter set can be invalid.
#[derive(Debug, Error)]
pub enum ParamsError {
    #[error(
        "Phase duration must be at least 4 ticks so phases can be split \
         into halves and quarters, got {0}"
    )]
    InvalidPhaseDuration(u64),

    #[error("Drive power {0} is outside the normalised range [-1, 1]")]
    PowerOutOfRange(f64),

    #[error("Velocity values must be finite")]
    NonFiniteVelocity,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Params {
    /// Determines if the parameters are valid.
    pub fn are_valid(&self) -> Result<(), ParamsError> {
        if self.phase_duration_ticks < 4 {
            return Err(ParamsError::InvalidPhaseDuration(self.phase_duration_ticks));
        }

        for power in [self.encoder_check_drive_power, self.steer_step_drive_power].iter() {
            if !power.is_finite() || power.abs() > 1.0 {
                return Err(ParamsError::PowerOutOfRange(*power));
            }
        }

        if !self.rotation_rate_rads.is_finite()
            || !self.translation_speed_ms.is_finite()
            || !self.speed_norm_velocity.iter().all(|v| v.is_finite())
        {
            return Err(ParamsError::NonFiniteVelocity);
        }

        Ok(())
    }
}
