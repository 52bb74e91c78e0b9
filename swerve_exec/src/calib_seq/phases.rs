//! Calibration phase definitions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The test phases of the calibration sequence, executed strictly in the
/// order they are declared here.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum CalibPhase {
    /// Alternate slow raw drive power with a pause, so the operator can
    /// verify each encoder reads counter-clockwise positive and record the
    /// magnetic offsets. Bypasses the steering loop entirely.
    EncoderCheck,

    /// Step the steering setpoint by 90 degrees at fixed intervals while
    /// creeping forward, for tuning the steering controller's response.
    SteerStep,

    /// Rotation-only chassis velocity: verifies a positive omega demand
    /// turns the chassis counter-clockwise.
    RotationOnly,

    /// Translation-only chassis velocity, first forward then leftward:
    /// verifies the body-frame axis conventions.
    TranslationOnly,

    /// No motion demand; the operator rotates the chassis by hand and
    /// checks the reported heading increases counter-clockwise.
    HeadingHold,

    /// A deliberately saturating velocity demand, to verify all module
    /// speeds are scaled uniformly back into the actuator range.
    SpeedNorm,

    /// Terminal phase when the sequence is configured to halt: emits a
    /// stop demand forever.
    Complete,
}

impl Default for CalibPhase {
    fn default() -> Self {
        CalibPhase::EncoderCheck
    }
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CalibPhase {
    /// The first phase of the sequence.
    pub fn first() -> Self {
        CalibPhase::EncoderCheck
    }

    /// The phase following this one, or `None` at the end of the sequence.
    pub fn next(self) -> Option<Self> {
        match self {
            CalibPhase::EncoderCheck => Some(CalibPhase::SteerStep),
            CalibPhase::SteerStep => Some(CalibPhase::RotationOnly),
            CalibPhase::RotationOnly => Some(CalibPhase::TranslationOnly),
            CalibPhase::TranslationOnly => Some(CalibPhase::HeadingHold),
            CalibPhase::HeadingHold => Some(CalibPhase::SpeedNorm),
            CalibPhase::SpeedNorm => None,
            CalibPhase::Complete => None,
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_phase_order() {
        let mut phase = CalibPhase::first();
        let mut order = vec![phase];

        while let Some(next) = phase.next() {
            order.push(next);
            phase = next;
        }

        assert_eq!(
            order,
            vec![
                CalibPhase::EncoderCheck,
                CalibPhase::SteerStep,
                CalibPhase::RotationOnly,
                CalibPhase::TranslationOnly,
                CalibPhase::HeadingHold,
                CalibPhase::SpeedNorm,
            ]
        );
    }
}
