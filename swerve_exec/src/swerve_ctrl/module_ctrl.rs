//! Per-module controller
//!
//! A module controller composes one [`SteeringController`] with the
//! shortest-path optimisation and output clamping needed to turn a desired
//! module state plus a measured steering angle into the two actuator powers
//! for that corner.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;

// Internal
use super::{ModuleConfig, ModuleState, SteerCtrlParams, SteeringController};
use util::maths::clamp;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Controller for a single swerve module.
#[derive(Clone, Debug, Default)]
pub struct ModuleController {
    /// Static configuration of this module.
    pub config: ModuleConfig,

    /// The steering feedback controller, exclusively owned by this module
    /// controller.
    steer_ctrl: SteeringController,
}

/// Actuator powers for one module, both guaranteed within `[-1, 1]`.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct ModuleOutput {
    /// Drive motor power demand.
    pub drive_power: f64,

    /// Steer motor power demand.
    pub steer_power: f64,
}

/// Per-cycle status flags for one module.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct ModuleStatus {
    /// The cycle was skipped because the angle reading was stale.
    pub skipped_stale: bool,

    /// The steering controller is within its tolerance band.
    pub at_setpoint: bool,

    /// The drive demand was clamped to the actuator range.
    pub drive_limited: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// An angle measurement from a module's absolute encoder.
///
/// Readings are normalised into the canonical `[0, 360)` degree domain
/// before they reach the controller. A sensor which cannot produce a valid
/// value this cycle reports `Stale`, which the controller must handle
/// explicitly rather than acting on old data.
#[derive(Clone, Copy, Debug, Serialize)]
pub enum AngleReading {
    /// A valid, normalised angle in degrees.
    Valid(f64),

    /// No valid reading available this cycle.
    Stale,
}

impl Default for AngleReading {
    fn default() -> Self {
        AngleReading::Stale
    }
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ModuleController {
    /// Create a new module controller for the given corner.
    pub fn new(config: ModuleConfig, steer_params: &SteerCtrlParams) -> Self {
        Self {
            config,
            steer_ctrl: SteeringController::new(steer_params),
        }
    }

    /// Initialise the module controller.
    ///
    /// Clears the steering controller's accumulated state. Never commands
    /// any actuator motion.
    pub fn init(&mut self) {
        self.steer_ctrl.reset();
    }

    /// Perform one closed-loop control step towards the given target.
    ///
    /// A stale reading skips actuation entirely for this cycle: both powers
    /// are zero and the steering controller state is untouched, so the next
    /// valid reading resumes cleanly.
    pub fn apply(
        &mut self,
        target: ModuleState,
        reading: AngleReading,
    ) -> (ModuleOutput, ModuleStatus) {
        let mut status = ModuleStatus::default();

        let measured_deg = match reading {
            AngleReading::Valid(angle_deg) => angle_deg,
            AngleReading::Stale => {
                status.skipped_stale = true;
                return (ModuleOutput::default(), status);
            }
        };

        // Optimise before control: never rotate further than 90 degrees
        // when reversing the drive direction gets there quicker
        let target = target.optimised(measured_deg);

        let drive_power = clamp(&target.speed, &-1f64, &1f64);
        status.drive_limited = drive_power != target.speed;

        let raw_steer = self.steer_ctrl.calculate(measured_deg, target.angle_deg);
        status.at_setpoint = self.steer_ctrl.at_setpoint();

        // Anti-jitter deadband: no steer output within the tolerance band,
        // even though the raw PID output is nonzero
        let steer_power = if status.at_setpoint {
            0.0
        }
        else {
            clamp(&raw_steer, &-1f64, &1f64)
        };

        (
            ModuleOutput {
                drive_power,
                steer_power,
            },
            status,
        )
    }

    /// Feed raw power straight to the drive motor, holding steer still.
    ///
    /// Used by the lowest-level calibration phase, which must work before
    /// the steering loop is trusted. The steering controller state is not
    /// touched.
    pub fn raw_drive(&self, power: f64) -> ModuleOutput {
        ModuleOutput {
            drive_power: clamp(&power, &-1f64, &1f64),
            steer_power: 0.0,
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn test_module() -> ModuleController {
        ModuleController::new(
            ModuleConfig {
                label: "FL".into(),
                pos_m: [0.18, 0.18],
                mag_offset_frac: 0.0,
            },
            &SteerCtrlParams {
                k_p: 0.0095,
                k_i: 0.0,
                k_d: 0.0,
                cycle_period_s: 0.02,
                pos_tolerance_deg: 0.2,
                vel_tolerance_degs: None,
            },
        )
    }

    #[test]
    fn test_stale_reading_skips_actuation() {
        let mut module = test_module();

        let target = ModuleState {
            speed: 0.8,
            angle_deg: 45.0,
        };

        let (output, status) = module.apply(target, AngleReading::Stale);

        assert!(status.skipped_stale);
        assert_eq!(output.drive_power, 0.0);
        assert_eq!(output.steer_power, 0.0);

        // The skip is self-healing: the next valid reading actuates as
        // normal
        let (output, status) = module.apply(target, AngleReading::Valid(0.0));
        assert!(!status.skipped_stale);
        assert!(output.drive_power != 0.0);
        assert!(output.steer_power != 0.0);
    }

    #[test]
    fn test_optimisation_flips_drive_sign() {
        let mut module = test_module();

        // Target is 180 degrees from the measurement: drive reverses and
        // steering stays put (effective target == measured angle)
        let (output, status) = module.apply(
            ModuleState {
                speed: 0.5,
                angle_deg: 190.0,
            },
            AngleReading::Valid(10.0),
        );

        assert_eq!(output.drive_power, -0.5);
        assert!(status.at_setpoint);
        assert_eq!(output.steer_power, 0.0);
    }

    #[test]
    fn test_drive_clamped() {
        let mut module = test_module();

        let (output, status) = module.apply(
            ModuleState {
                speed: 2.5,
                angle_deg: 0.0,
            },
            AngleReading::Valid(0.0),
        );

        assert_eq!(output.drive_power, 1.0);
        assert!(status.drive_limited);
    }

    #[test]
    fn test_deadband_zeroes_steer_power() {
        let mut module = test_module();

        // Error within the 0.2 degree tolerance: no steer output at all
        let (output, status) = module.apply(
            ModuleState {
                speed: 0.1,
                angle_deg: 90.0,
            },
            AngleReading::Valid(90.1),
        );

        assert!(status.at_setpoint);
        assert_eq!(output.steer_power, 0.0);
        assert_eq!(output.drive_power, 0.1);
    }

    #[test]
    fn test_raw_drive_clamps_and_holds_steer() {
        let module = test_module();

        let output = module.raw_drive(-3.0);
        assert_eq!(output.drive_power, -1.0);
        assert_eq!(output.steer_power, 0.0);
    }
}
