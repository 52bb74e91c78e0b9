//! Static per-module configuration

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// Internal
use util::maths::norm_angle_deg;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Static geometry and identity of a single swerve module.
///
/// Exactly [`super::NUM_MODULES`] of these exist, one per physical corner,
/// loaded from the parameter file at init and immutable afterwards.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ModuleConfig {
    /// Short identity label for the module, e.g. "FL".
    pub label: String,

    /// Position of the module's steer axis in the body frame.
    ///
    /// Units: meters,
    /// Frame: body (+x forward, +y left)
    pub pos_m: [f64; 2],

    /// Magnetic offset of the module's angle encoder.
    ///
    /// The encoder reports an absolute fractional turn in `[0, 1)`; this
    /// offset is added during normalisation so that a reading of zero
    /// corresponds to the module pointing straight ahead (+x).
    ///
    /// Units: fractional turns
    pub mag_offset_frac: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ModuleConfig {
    /// Normalise a raw encoder reading (fractional turn) into the canonical
    /// `[0, 360)` degree domain, applying the magnetic offset.
    pub fn normalise_raw_angle(&self, raw_frac: f64) -> f64 {
        norm_angle_deg((raw_frac + self.mag_offset_frac) * 360.0)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
