//! Commands passed into SwerveCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;

// Internal
use super::{ModuleState, NUM_MODULES};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A whole-body velocity demand for the chassis.
///
/// Sign convention: +x forward, +y left, +omega counter-clockwise viewed
/// from above.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct ChassisVelocity {
    /// Forward linear velocity component.
    ///
    /// Units: meters/second
    pub vx_ms: f64,

    /// Lateral (leftward) linear velocity component.
    ///
    /// Units: meters/second
    pub vy_ms: f64,

    /// Angular velocity about the chassis centre.
    ///
    /// Units: radians/second
    pub omega_rads: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A command to be executed by SwerveCtrl.
///
/// `Velocity` is the normal closed-loop operation path. `ModuleTargets` and
/// `RawDrive` exist for the calibration sequence, which drives the same
/// module controllers with scripted setpoints, bypassing the kinematics or
/// (for `RawDrive`) the steering loop as well.
#[derive(Clone, Copy, Debug, Serialize)]
pub enum SwerveCmd {
    /// Follow a whole-body chassis velocity.
    Velocity(ChassisVelocity),

    /// Drive each module to an explicit (speed, angle) target, bypassing
    /// kinematics. Order is the fixed module order.
    ModuleTargets([ModuleState; NUM_MODULES]),

    /// Feed raw drive power directly to each module, holding steer still.
    /// Used only by the lowest-level calibration phase.
    RawDrive([f64; NUM_MODULES]),

    /// Bring the drivetrain to a stop: zero all drive power while holding
    /// the current steer targets.
    Stop,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ChassisVelocity {
    /// Build a body-frame velocity from a field-relative demand.
    ///
    /// Field oriented control: the (vx, vy) demand is expressed in the
    /// field frame and rotated into the body frame using the measured
    /// chassis heading (degrees, CCW positive, 0 = facing field +x).
    pub fn from_field_relative(
        vx_ms: f64,
        vy_ms: f64,
        omega_rads: f64,
        heading_deg: f64,
    ) -> Self {
        let heading_rad = heading_deg.to_radians();
        let (sin, cos) = heading_rad.sin_cos();

        Self {
            vx_ms: vx_ms * cos + vy_ms * sin,
            vy_ms: -vx_ms * sin + vy_ms * cos,
            omega_rads,
        }
    }
}

impl SwerveCmd {
    /// Determine if the command is valid (i.e. all components are finite).
    pub fn is_valid(&self) -> bool {
        match self {
            SwerveCmd::Velocity(v) => {
                v.vx_ms.is_finite() && v.vy_ms.is_finite() && v.omega_rads.is_finite()
            }
            SwerveCmd::ModuleTargets(targets) => targets
                .iter()
                .all(|t| t.speed.is_finite() && t.angle_deg.is_finite()),
            SwerveCmd::RawDrive(powers) => powers.iter().all(|p| p.is_finite()),
            SwerveCmd::Stop => true,
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
    fn test_field_relative() {
        // Facing +y (heading 90), a field +x demand becomes body -y
        let vel = ChassisVelocity::from_field_relative(1.0, 0.0, 0.5, 90.0);

        assert!(vel.vx_ms.abs() < 1e-9);
        assert!((vel.vy_ms + 1.0).abs() < 1e-9);
        assert_eq!(vel.omega_rads, 0.5);

        // Facing the field +x the demand passes through unchanged
        let vel = ChassisVelocity::from_field_relative(1.0, 0.5, 0.0, 0.0);
        assert!((vel.vx_ms - 1.0).abs() < 1e-9);
        assert!((vel.vy_ms - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_is_valid() {
        assert!(SwerveCmd::Stop.is_valid());
        assert!(SwerveCmd::Velocity(ChassisVelocity::default()).is_valid());

        assert!(!SwerveCmd::Velocity(ChassisVelocity {
            vx_ms: f64::NAN,
            vy_ms: 0.0,
            omega_rads: 0.0,
        })
        .is_valid());

        assert!(!SwerveCmd::RawDrive([0.0, 0.1, f64::INFINITY, 0.0]).is_valid());
    }
}
