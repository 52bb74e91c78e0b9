//! Implementations for the calibration sequencer state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::debug;
use serde::Serialize;

// Internal
use super::{CalibPhase, OnComplete, Params, ParamsError};
use crate::swerve_ctrl::{ChassisVelocity, ModuleState, SwerveCmd, NUM_MODULES};
use util::{
    archive::{Archived, Archiver},
    module::State,
    params,
    session::Session,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Calibration sequencer module state.
///
/// Advances through [`CalibPhase`]s purely on elapsed tick count and emits
/// the command for the current phase each cycle. The emitted command is fed
/// into [`crate::swerve_ctrl::SwerveCtrl`] exactly as a teleop command
/// would be.
#[derive(Default)]
pub struct CalibSeq {
    params: Params,

    report: StatusReport,
    arch_report: Archiver,

    /// The phase currently being executed.
    phase: CalibPhase,

    /// Ticks elapsed within the current phase.
    ticks_in_phase: u64,
}

/// Input data to the calibration sequencer.
///
/// Inputs never influence phase timing; the heading is used for logging
/// only, during the heading verification phase.
#[derive(Clone, Copy, Debug, Default)]
pub struct InputData {
    /// Measured chassis heading, if a heading sensor is fitted.
    ///
    /// Units: degrees, CCW positive
    pub heading_deg: Option<f64>,
}

/// Status report for calibration sequencer processing.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct StatusReport {
    /// The phase in effect for this cycle's command.
    pub phase: CalibPhase,

    /// Ticks elapsed within that phase.
    pub ticks_in_phase: u64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors which can occur during sequencer initialisation.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("Failed to load parameters: {0}")]
    ParamLoadError(params::LoadError),

    #[error("Loaded parameters are invalid: {0}")]
    ParamsInvalid(ParamsError),

    #[error("Failed to set up archives: {0}")]
    ArchInitError(String),
}

/// Errors which can occur during sequencer processing. The sequencer is
/// total over its inputs, so there are none.
#[derive(Debug, thiserror::Error)]
pub enum ProcError {}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for CalibSeq {
    type InitData = &'static str;
    type InitError = InitError;

    type InputData = InputData;
    type OutputData = SwerveCmd;
    type StatusReport = StatusReport;
    type ProcError = ProcError;

    /// Initialise the calibration sequencer.
    ///
    /// Expected init data is the path to the parameter file.
    fn init(&mut self, init_data: Self::InitData, session: &Session)
        -> Result<(), Self::InitError>
    {
        let loaded = params::load(init_data).map_err(InitError::ParamLoadError)?;

        *self = Self::with_params(loaded).map_err(InitError::ParamsInvalid)?;

        let mut arch_path = session.arch_root.clone();
        arch_path.push("calib_seq");
        std::fs::create_dir_all(arch_path)
            .map_err(|e| InitError::ArchInitError(e.to_string()))?;

        self.arch_report = Archiver::from_path(session, "calib_seq/status_report.csv")
            .map_err(|e| InitError::ArchInitError(e.to_string()))?;

        Ok(())
    }

    /// Perform cyclic processing of the calibration sequence.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        // Timing first: the transition depends on nothing but the tick
        // count, so it happens before any input is looked at
        self.ticks_in_phase += 1;
        if self.ticks_in_phase >= self.params.phase_duration_ticks {
            self.ticks_in_phase = 0;
            self.advance_phase();
        }

        let cmd = self.phase_cmd(input_data);

        self.report = StatusReport {
            phase: self.phase,
            ticks_in_phase: self.ticks_in_phase,
        };

        Ok((cmd, self.report))
    }
}

impl Archived for CalibSeq {
    fn write(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.arch_report.serialise(self.report)?;

        Ok(())
    }
}

impl CalibSeq {
    /// Build a sequencer from an already loaded parameter set.
    pub fn with_params(params: Params) -> Result<Self, ParamsError> {
        params.are_valid()?;

        Ok(Self {
            params,
            ..Default::default()
        })
    }

    /// The phase currently being executed.
    pub fn phase(&self) -> CalibPhase {
        self.phase
    }

    /// Move to the next phase, honouring the configured end behaviour.
    fn advance_phase(&mut self) {
        self.phase = match self.phase.next() {
            Some(next) => next,
            None => match self.params.on_complete {
                OnComplete::Wrap => CalibPhase::first(),
                OnComplete::Halt => CalibPhase::Complete,
            },
        };

        debug!("Calibration sequence phase: {:?}", self.phase);
    }

    /// Compute the command for the current phase and tick.
    ///
    /// Pure with respect to the sequencer state: the same (phase, tick)
    /// pair always produces the same command.
    fn phase_cmd(&self, input_data: &InputData) -> SwerveCmd {
        match self.phase {
            CalibPhase::EncoderCheck => {
                // Moving for the first half of the phase, paused for the
                // second so the wheels can be rotated by hand
                if self.segment(2) == 0 {
                    SwerveCmd::RawDrive([self.params.encoder_check_drive_power; NUM_MODULES])
                }
                else {
                    SwerveCmd::RawDrive([0.0; NUM_MODULES])
                }
            }
            CalibPhase::SteerStep => {
                // Step the setpoint through 0/90/180/270 across the phase
                let angle_deg = 90.0 * self.segment(4) as f64;

                SwerveCmd::ModuleTargets(
                    [ModuleState {
                        speed: self.params.steer_step_drive_power,
                        angle_deg,
                    }; NUM_MODULES],
                )
            }
            CalibPhase::RotationOnly => SwerveCmd::Velocity(ChassisVelocity {
                vx_ms: 0.0,
                vy_ms: 0.0,
                omega_rads: self.params.rotation_rate_rads,
            }),
            CalibPhase::TranslationOnly => {
                // Forward for the first half, leftward for the second
                if self.segment(2) == 0 {
                    SwerveCmd::Velocity(ChassisVelocity {
                        vx_ms: self.params.translation_speed_ms,
                        vy_ms: 0.0,
                        omega_rads: 0.0,
                    })
                }
                else {
                    SwerveCmd::Velocity(ChassisVelocity {
                        vx_ms: 0.0,
                        vy_ms: self.params.translation_speed_ms,
                        omega_rads: 0.0,
                    })
                }
            }
            CalibPhase::HeadingHold => {
                // No motion; the operator rotates the chassis and checks
                // the heading reads CCW positive
                if let Some(heading_deg) = input_data.heading_deg {
                    if heading_deg.is_finite() {
                        debug!("Measured heading: {:.1} deg", heading_deg);
                    }
                }

                SwerveCmd::Stop
            }
            CalibPhase::SpeedNorm => {
                let [vx_ms, vy_ms, omega_rads] = self.params.speed_norm_velocity;

                SwerveCmd::Velocity(ChassisVelocity {
                    vx_ms,
                    vy_ms,
                    omega_rads,
                })
            }
            CalibPhase::Complete => SwerveCmd::Stop,
        }
    }

    /// Which of `divisions` equal segments of the phase the current tick
    /// falls in.
    fn segment(&self, divisions: u64) -> u64 {
        self.ticks_in_phase * divisions / self.params.phase_duration_ticks
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn test_params(on_complete: OnComplete) -> Params {
        Params {
            phase_duration_ticks: 8,
            on_complete,
            encoder_check_drive_power: 0.1,
            steer_step_drive_power: 0.1,
            rotation_rate_rads: 0.2,
            translation_speed_ms: 0.3,
            speed_norm_velocity: [3.0, 0.0, 0.0],
        }
    }

    /// Run the sequencer for `ticks` cycles, returning the phase in effect
    /// on each cycle.
    fn run(seq: &mut CalibSeq, ticks: u64, heading_deg: Option<f64>) -> Vec<CalibPhase> {
        (0..ticks)
            .map(|_| {
                let (_, report) = seq.proc(&InputData { heading_deg }).unwrap();
                report.phase
            })
            .collect()
    }

    #[test]
    fn test_phase_advances_every_n_ticks() {
        let mut seq = CalibSeq::with_params(test_params(OnComplete::Halt)).unwrap();

        let phases = run(&mut seq, 8 * 7, None);

        // The phase index changes exactly once every 8 ticks: ticks 0..=6
        // are EncoderCheck, the transition lands on the 8th call
        for (i, phase) in phases.iter().enumerate() {
            let expected = match (i + 1) / 8 {
                0 => CalibPhase::EncoderCheck,
                1 => CalibPhase::SteerStep,
                2 => CalibPhase::RotationOnly,
                3 => CalibPhase::TranslationOnly,
                4 => CalibPhase::HeadingHold,
                5 => CalibPhase::SpeedNorm,
                _ => CalibPhase::Complete,
            };
            assert_eq!(*phase, expected, "wrong phase on tick {}", i);
        }
    }

    #[test]
    fn test_deterministic_and_input_independent() {
        let mut seq_a = CalibSeq::with_params(test_params(OnComplete::Halt)).unwrap();
        let mut seq_b = CalibSeq::with_params(test_params(OnComplete::Halt)).unwrap();

        // One run sees no heading, the other sees garbage headings;
        // neither may affect the phase sequence
        let phases_a = run(&mut seq_a, 100, None);
        let phases_b = run(&mut seq_b, 100, Some(f64::NAN));

        assert_eq!(phases_a, phases_b);
    }

    #[test]
    fn test_wrap_restarts_sequence() {
        let mut seq = CalibSeq::with_params(test_params(OnComplete::Wrap)).unwrap();

        // Run through all six phases; the next transition wraps back
        run(&mut seq, 8 * 6, None);
        assert_eq!(seq.phase(), CalibPhase::EncoderCheck);
    }

    #[test]
    fn test_halt_is_terminal() {
        let mut seq = CalibSeq::with_params(test_params(OnComplete::Halt)).unwrap();

        let phases = run(&mut seq, 8 * 20, None);

        assert_eq!(*phases.last().unwrap(), CalibPhase::Complete);

        // And Complete emits a stop demand
        let (cmd, _) = seq.proc(&InputData::default()).unwrap();
        assert!(matches!(cmd, SwerveCmd::Stop));
    }

    #[test]
    fn test_encoder_check_alternates() {
        let mut seq = CalibSeq::with_params(test_params(OnComplete::Halt)).unwrap();

        // First half of the phase moves, second half pauses
        let (cmd, report) = seq.proc(&InputData::default()).unwrap();
        assert_eq!(report.ticks_in_phase, 1);
        match cmd {
            SwerveCmd::RawDrive(powers) => assert_eq!(powers, [0.1; NUM_MODULES]),
            other => panic!("expected RawDrive, got {:?}", other),
        }

        for _ in 0..4 {
            seq.proc(&InputData::default()).unwrap();
        }

        let (cmd, report) = seq.proc(&InputData::default()).unwrap();
        assert_eq!(report.ticks_in_phase, 6);
        match cmd {
            SwerveCmd::RawDrive(powers) => assert_eq!(powers, [0.0; NUM_MODULES]),
            other => panic!("expected RawDrive, got {:?}", other),
        }
    }

    #[test]
    fn test_steer_step_quarters() {
        let mut seq = CalibSeq::with_params(test_params(OnComplete::Halt)).unwrap();

        // Skip the encoder check phase
        run(&mut seq, 8, None);
        assert_eq!(seq.phase(), CalibPhase::SteerStep);

        let mut seen_angles = Vec::new();
        for _ in 0..8 {
            let (cmd, report) = seq.proc(&InputData::default()).unwrap();
            if report.phase != CalibPhase::SteerStep {
                break;
            }
            if let SwerveCmd::ModuleTargets(targets) = cmd {
                if seen_angles.last() != Some(&targets[0].angle_deg) {
                    seen_angles.push(targets[0].angle_deg);
                }
            }
        }

        assert_eq!(seen_angles, vec![0.0, 90.0, 180.0, 270.0]);
    }
}
