//! Simulated electronics driver state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;

// Internal
use super::{AngleEncoder, MotorSink, Params, ParamsError};
use crate::swerve_ctrl::{OutputData, NUM_MODULES};
use util::{
    maths::{norm_angle_deg, rem_euclid},
    module::State,
    params,
    session::Session,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A first-order simulation of the drivetrain electronics.
///
/// Steering responds as a pure rate actuator: full power slews the module
/// at the configured rate. Drive power is recorded but not integrated; the
/// simulation tracks steering only, since that is the closed loop under
/// test.
#[derive(Default)]
pub struct SimElecDriver {
    params: Params,

    /// True steering angle of each module.
    ///
    /// Units: degrees, [0, 360)
    angle_deg: [f64; NUM_MODULES],

    /// Last drive power applied to each module, after polarity.
    drive_power: [f64; NUM_MODULES],

    /// Modules whose encoder is forced stale, for fault-injection in
    /// tests.
    stale: [bool; NUM_MODULES],
}

/// Status report for the simulated driver. Nothing to report: faults are
/// surfaced through the encoder readings themselves.
#[derive(Clone, Copy, Debug, Default)]
pub struct StatusReport {}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors which can occur during simulated driver initialisation.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("Failed to load parameters: {0}")]
    ParamLoadError(params::LoadError),

    #[error("Loaded parameters are invalid: {0}")]
    ParamsInvalid(ParamsError),
}

/// Errors which can occur while commanding the simulated motors.
#[derive(Debug, thiserror::Error)]
pub enum ProcError {
    #[error("Power demand {0} is outside the normalised range [-1, 1]")]
    PowerOutOfRange(f64),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for SimElecDriver {
    type InitData = &'static str;
    type InitError = InitError;

    type InputData = OutputData;
    type OutputData = [Option<f64>; NUM_MODULES];
    type StatusReport = StatusReport;
    type ProcError = ProcError;

    /// Initialise the simulated driver.
    ///
    /// Expected init data is the path to the parameter file. Sets the
    /// simulated modules to their configured startup angles; no motion is
    /// commanded.
    fn init(&mut self, init_data: Self::InitData, _session: &Session)
        -> Result<(), Self::InitError>
    {
        let loaded: Params = params::load(init_data).map_err(InitError::ParamLoadError)?;

        *self = Self::with_params(loaded).map_err(InitError::ParamsInvalid)?;

        Ok(())
    }

    /// Apply one cycle of motor demands and return the encoder readings
    /// the control core should see on the next cycle.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        self.command(input_data)?;

        Ok((self.read_raw_frac(), StatusReport {}))
    }
}

impl AngleEncoder for SimElecDriver {
    fn read_raw_frac(&self) -> [Option<f64>; NUM_MODULES] {
        let mut readings = [None; NUM_MODULES];

        for i in 0..NUM_MODULES {
            if !self.stale[i] {
                // Encode the true angle the way the hardware does: as a
                // fractional turn with the magnetic offset still baked in
                readings[i] = Some(rem_euclid(
                    self.angle_deg[i] / 360.0 - self.params.mag_offset_frac[i],
                    1.0,
                ));
            }
        }

        readings
    }
}

impl MotorSink for SimElecDriver {
    type Error = ProcError;

    fn command(&mut self, demands: &OutputData) -> Result<(), ProcError> {
        for (i, module) in demands.modules.iter().enumerate() {
            for power in [module.drive_power, module.steer_power].iter() {
                if !power.is_finite() || power.abs() > 1.0 {
                    return Err(ProcError::PowerOutOfRange(*power));
                }
            }

            let steer_power = if self.params.steer_inverted[i] {
                -module.steer_power
            }
            else {
                module.steer_power
            };

            self.drive_power[i] = if self.params.drive_inverted[i] {
                -module.drive_power
            }
            else {
                module.drive_power
            };

            self.angle_deg[i] = norm_angle_deg(
                self.angle_deg[i]
                    + steer_power * self.params.steer_rate_degs * self.params.cycle_period_s,
            );
        }

        trace!("Sim module angles: {:?}", self.angle_deg);

        Ok(())
    }
}

impl SimElecDriver {
    /// Build a simulated driver from an already loaded parameter set.
    pub fn with_params(params: Params) -> Result<Self, ParamsError> {
        params.are_valid()?;

        let mut sim = Self {
            angle_deg: params.initial_angle_deg,
            ..Default::default()
        };

        for angle in sim.angle_deg.iter_mut() {
            *angle = norm_angle_deg(*angle);
        }

        sim.params = params;

        Ok(sim)
    }

    /// Force a module's encoder stale (or back to healthy).
    pub fn set_stale(&mut self, module_idx: usize, stale: bool) {
        self.stale[module_idx] = stale;
    }

    /// True steering angle of each simulated module, in degrees.
    pub fn angles_deg(&self) -> [f64; NUM_MODULES] {
        self.angle_deg
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::swerve_ctrl::{
        ChassisVelocity, InputData as SwerveInputData, ModuleConfig, ModuleOutput,
        Params as SwerveParams, SteerCtrlParams, SwerveCmd, SwerveCtrl,
    };

    fn sim_params() -> Params {
        Params {
            cycle_period_s: 0.02,
            steer_rate_degs: 360.0,
            initial_angle_deg: [0.0; NUM_MODULES],
            mag_offset_frac: [0.0; NUM_MODULES],
            steer_inverted: [false; NUM_MODULES],
            drive_inverted: [false; NUM_MODULES],
        }
    }

    fn swerve_params() -> SwerveParams {
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

        SwerveParams {
            modules,
            steer_ctrl: SteerCtrlParams {
                k_p: 0.05,
                k_i: 0.0,
                k_d: 0.001,
                cycle_period_s: 0.02,
                pos_tolerance_deg: 0.2,
                vel_tolerance_degs: None,
            },
        }
    }

    #[test]
    fn test_steer_slew() {
        let mut sim = SimElecDriver::with_params(sim_params()).unwrap();

        let mut demands = OutputData::default();
        for module in demands.modules.iter_mut() {
            *module = ModuleOutput {
                drive_power: 0.0,
                steer_power: 0.5,
            };
        }

        sim.command(&demands).unwrap();

        // Half power at 360 deg/s over 20 ms moves 3.6 degrees
        for angle in sim.angles_deg().iter() {
            assert!((angle - 3.6).abs() < 1e-9);
        }
    }

    #[test]
    fn test_inversion_flips_direction() {
        let mut params = sim_params();
        params.steer_inverted[0] = true;
        let mut sim = SimElecDriver::with_params(params).unwrap();

        let mut demands = OutputData::default();
        demands.modules[0].steer_power = 0.5;
        demands.modules[1].steer_power = 0.5;

        sim.command(&demands).unwrap();

        let angles = sim.angles_deg();
        assert!(angles[0] > 180.0); // wrapped negative
        assert!(angles[1] > 0.0 && angles[1] < 180.0);
    }

    #[test]
    fn test_out_of_range_power_rejected() {
        let mut sim = SimElecDriver::with_params(sim_params()).unwrap();

        let mut demands = OutputData::default();
        demands.modules[2].drive_power = 1.5;

        assert!(matches!(
            sim.command(&demands),
            Err(ProcError::PowerOutOfRange(_))
        ));
    }

    #[test]
    fn test_encoder_bakes_in_offset() {
        let mut params = sim_params();
        params.initial_angle_deg = [90.0; NUM_MODULES];
        params.mag_offset_frac = [0.1; NUM_MODULES];
        let sim = SimElecDriver::with_params(params).unwrap();

        for reading in sim.read_raw_frac().iter() {
            // 90 deg is 0.25 turns; the encoder reports it shifted by the
            // offset, which the core's normalisation undoes
            assert!((reading.unwrap() - 0.15).abs() < 1e-9);
        }
    }

    #[test]
    fn test_stale_injection() {
        let mut sim = SimElecDriver::with_params(sim_params()).unwrap();

        sim.set_stale(1, true);
        let readings = sim.read_raw_frac();

        assert!(readings[1].is_none());
        assert!(readings[0].is_some());
    }

    /// Closed-loop sanity check: the control core steering the simulated
    /// drivetrain converges onto a sideways demand.
    #[test]
    fn test_closed_loop_convergence() {
        let mut ctrl = SwerveCtrl::with_params(swerve_params()).unwrap();
        let mut sim = SimElecDriver::with_params(sim_params()).unwrap();

        let cmd = SwerveCmd::Velocity(ChassisVelocity {
            vx_ms: 0.0,
            vy_ms: 0.5,
            omega_rads: 0.0,
        });

        let mut readings = sim.read_raw_frac();

        for tick in 0..500 {
            let (output, _) = ctrl
                .proc(&SwerveInputData {
                    cmd: if tick == 0 { Some(cmd) } else { None },
                    raw_angles_frac: readings,
                })
                .unwrap();

            let (new_readings, _) = sim.proc(&output).unwrap();
            readings = new_readings;
        }

        // All modules settle at 90 degrees within the tolerance band
        for angle in sim.angles_deg().iter() {
            assert!(
                util::maths::ang_dist_deg(*angle, 90.0).abs() < 1.0,
                "module did not converge: {} deg",
                angle
            );
        }
    }
}
