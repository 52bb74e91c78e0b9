//! Parameters structure for SwerveCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;
use thiserror::Error;

// Internal
use super::{ModuleConfig, NUM_MODULES};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for swerve drive control.
#[derive(Debug, Default, Deserialize)]
pub struct Params {
    /// The static configuration of each module.
    ///
    /// Order is fixed as [FL, FR, BL, BR] and must match the physical
    /// drivetrain; kinematics outputs follow this order one to one.
    pub modules: [ModuleConfig; NUM_MODULES],

    /// Steering controller tuning, shared by all four modules.
    pub steer_ctrl: SteerCtrlParams,
}

/// Tuning for one steering feedback controller.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SteerCtrlParams {
    /// Proportional gain
    pub k_p: f64,

    /// Integral gain. Zero disables the integral term.
    pub k_i: f64,

    /// Derivative gain
    pub k_d: f64,

    /// The fixed control cycle period the controller integrates against.
    ///
    /// Units: seconds
    pub cycle_period_s: f64,

    /// Angular tolerance of the at-setpoint deadband.
    ///
    /// Units: degrees
    pub pos_tolerance_deg: f64,

    /// Optional error-rate tolerance for at-setpoint.
    ///
    /// Units: degrees/second
    pub vel_tolerance_degs: Option<f64>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Ways in which a loaded parameter set can be invalid.
///
/// Any of these is fatal at init: acting on corrupt geometry or tuning
/// would produce wrong per-wheel demands on every cycle.
#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("Module {0} has an empty label")]
    EmptyLabel(usize),

    #[error("Module label {0:?} is not unique")]
    DuplicateLabel(String),

    #[error("Modules {0:?} and {1:?} share the same mount position")]
    DuplicatePosition(String, String),

    #[error("Module {0:?} has a non-finite configuration value")]
    NonFiniteModule(String),

    #[error("Steering gains must be finite")]
    NonFiniteGains,

    #[error("Cycle period must be positive, got {0}")]
    InvalidCyclePeriod(f64),

    #[error("Steering tolerance must be positive, got {0}")]
    InvalidTolerance(f64),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Params {
    /// Determines if the parameters are valid.
    pub fn are_valid(&self) -> Result<(), ParamsError> {
        for (i, module) in self.modules.iter().enumerate() {
            if module.label.is_empty() {
                return Err(ParamsError::EmptyLabel(i));
            }

            if !module.pos_m.iter().all(|p| p.is_finite())
                || !module.mag_offset_frac.is_finite()
            {
                return Err(ParamsError::NonFiniteModule(module.label.clone()));
            }

            for other in self.modules.iter().skip(i + 1) {
                if module.label == other.label {
                    return Err(ParamsError::DuplicateLabel(module.label.clone()));
                }

                if module.pos_m == other.pos_m {
                    return Err(ParamsError::DuplicatePosition(
                        module.label.clone(),
                        other.label.clone(),
                    ));
                }
            }
        }

        let steer = &self.steer_ctrl;

        if !(steer.k_p.is_finite() && steer.k_i.is_finite() && steer.k_d.is_finite()) {
            return Err(ParamsError::NonFiniteGains);
        }

        if !(steer.cycle_period_s.is_finite() && steer.cycle_period_s > 0.0) {
            return Err(ParamsError::InvalidCyclePeriod(steer.cycle_period_s));
        }

        if !(steer.pos_tolerance_deg.is_finite() && steer.pos_tolerance_deg > 0.0) {
            return Err(ParamsError::InvalidTolerance(steer.pos_tolerance_deg));
        }

        if let Some(tol) = steer.vel_tolerance_degs {
            if !(tol.is_finite() && tol > 0.0) {
                return Err(ParamsError::InvalidTolerance(tol));
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn valid_params() -> Params {
        let labels = ["FL", "FR", "BL", "BR"];
        let positions = [[0.18, 0.18], [0.18, -0.18], [-0.18, 0.18], [-0.18, -0.18]];

        let mut modules: [ModuleConfig; NUM_MODULES] = Default::default();
        for i in 0..NUM_MODULES {
            modules[i] = ModuleConfig {
                label: labels[i].into(),
                pos_m: positions[i],
                mag_offset_frac: 0.0,
            };
        }

        Params {
            modules,
            steer_ctrl: SteerCtrlParams {
                k_p: 0.0095,
                k_i: 0.0,
                k_d: 0.00015,
                cycle_period_s: 0.02,
                pos_tolerance_deg: 0.2,
                vel_tolerance_degs: None,
            },
        }
    }

    #[test]
    fn test_valid_params_pass() {
        assert!(valid_params().are_valid().is_ok());
    }

    #[test]
    fn test_duplicate_position_rejected() {
        let mut params = valid_params();
        params.modules[3].pos_m = params.modules[0].pos_m;

        assert!(matches!(
            params.are_valid(),
            Err(ParamsError::DuplicatePosition(_, _))
        ));
    }

    #[test]
    fn test_duplicate_label_rejected() {
        let mut params = valid_params();
        params.modules[1].label = "FL".into();

        assert!(matches!(
            params.are_valid(),
            Err(ParamsError::DuplicateLabel(_))
        ));
    }

    #[test]
    fn test_bad_cycle_period_rejected() {
        let mut params = valid_params();
        params.steer_ctrl.cycle_period_s = 0.0;

        assert!(matches!(
            params.are_valid(),
            Err(ParamsError::InvalidCyclePeriod(_))
        ));
    }
}
