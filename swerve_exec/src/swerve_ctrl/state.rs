//! Implementations for the SwerveCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use serde::Serialize;

// Internal
use super::{
    AngleReading, ModuleController, ModuleOutput, ModuleState, Params, ParamsError, SwerveCmd,
    SwerveCtrlError, SwerveKinematics, NUM_MODULES,
};
use util::{
    archive::{Archived, Archiver},
    module::State,
    params,
    session::Session,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Swerve drive control module state.
///
/// Owns the four module controllers and the kinematics instance. This is
/// the single entry point through which a whole-body command reaches the
/// actuators: one `proc` per control cycle fans the command out to the four
/// modules in the fixed configured order.
#[derive(Default)]
pub struct SwerveCtrl {
    pub(crate) params: Params,

    pub(crate) report: StatusReport,
    arch_report: Archiver,

    /// One controller per module, in the fixed configured order.
    pub(crate) modules: [ModuleController; NUM_MODULES],

    pub(crate) kinematics: SwerveKinematics,

    pub(crate) current_cmd: Option<SwerveCmd>,
    arch_current_cmd: Archiver,

    pub(crate) target_states: Option<[ModuleState; NUM_MODULES]>,
    arch_target_states: Archiver,

    pub(crate) last_readings: [AngleReading; NUM_MODULES],

    pub(crate) output: Option<OutputData>,
    arch_output: Archiver,
}

/// Input data to swerve control.
#[derive(Clone, Copy, Debug, Default)]
pub struct InputData {
    /// The command to be executed, or `None` if there is no new command on
    /// this cycle. The previous command remains in effect until replaced.
    pub cmd: Option<SwerveCmd>,

    /// Raw angle encoder readings for each module, as absolute fractional
    /// turns. `None` (or a non-finite value) marks a stale sensor for this
    /// cycle.
    pub raw_angles_frac: [Option<f64>; NUM_MODULES],
}

/// Output command from SwerveCtrl that the electronics driver must execute.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct OutputData {
    /// Per-module actuator powers, in the fixed module order. All values
    /// are within `[-1, 1]`.
    pub modules: [ModuleOutput; NUM_MODULES],
}

/// Status report for SwerveCtrl processing.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct StatusReport {
    /// Steering controllers within their tolerance band this cycle.
    pub at_setpoint: [bool; NUM_MODULES],

    /// Modules skipped this cycle due to a stale angle reading.
    pub skipped_stale: [bool; NUM_MODULES],

    /// Modules whose drive demand was clamped to the actuator range.
    pub drive_limited: [bool; NUM_MODULES],

    /// Uniform factor the kinematics divided all module speeds by to keep
    /// them within the actuator range. 1 when no desaturation occurred.
    pub speed_scale: f64,
}

impl Default for StatusReport {
    fn default() -> Self {
        StatusReport {
            at_setpoint: [false; NUM_MODULES],
            skipped_stale: [false; NUM_MODULES],
            drive_limited: [false; NUM_MODULES],
            speed_scale: 1.0,
        }
    }
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors which can occur during SwerveCtrl initialisation.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("Failed to load parameters: {0}")]
    ParamLoadError(params::LoadError),

    #[error("Loaded parameters are invalid: {0}")]
    ParamsInvalid(ParamsError),

    #[error("Failed to set up archives: {0}")]
    ArchInitError(String),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for SwerveCtrl {
    type InitData = &'static str;
    type InitError = InitError;

    type InputData = InputData;
    type OutputData = OutputData;
    type StatusReport = StatusReport;
    type ProcError = SwerveCtrlError;

    /// Initialise the SwerveCtrl module.
    ///
    /// Expected init data is the path to the parameter file. Initialisation
    /// issues no actuator commands.
    fn init(&mut self, init_data: Self::InitData, session: &Session)
        -> Result<(), Self::InitError>
    {
        // Load the parameters
        let params = params::load(init_data).map_err(InitError::ParamLoadError)?;

        *self = Self::with_params(params).map_err(InitError::ParamsInvalid)?;

        // Create the arch folder for swerve_ctrl
        let mut arch_path = session.arch_root.clone();
        arch_path.push("swerve_ctrl");
        std::fs::create_dir_all(arch_path)
            .map_err(|e| InitError::ArchInitError(e.to_string()))?;

        // Initialise the archivers
        self.arch_report = Archiver::from_path(session, "swerve_ctrl/status_report.csv")
            .map_err(|e| InitError::ArchInitError(e.to_string()))?;
        self.arch_current_cmd = Archiver::from_path(session, "swerve_ctrl/current_cmd.csv")
            .map_err(|e| InitError::ArchInitError(e.to_string()))?;
        self.arch_target_states = Archiver::from_path(session, "swerve_ctrl/target_states.csv")
            .map_err(|e| InitError::ArchInitError(e.to_string()))?;
        self.arch_output = Archiver::from_path(session, "swerve_ctrl/output.csv")
            .map_err(|e| InitError::ArchInitError(e.to_string()))?;

        Ok(())
    }

    /// Perform cyclic processing of swerve control.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        // Clear the status report
        self.report = StatusReport::default();

        // Normalise the raw sensor readings using each module's calibration
        // offset. Anything non-finite is treated as stale.
        let mut readings = [AngleReading::Stale; NUM_MODULES];
        for i in 0..NUM_MODULES {
            readings[i] = match input_data.raw_angles_frac[i] {
                Some(raw) if raw.is_finite() => {
                    AngleReading::Valid(self.modules[i].config.normalise_raw_angle(raw))
                }
                _ => AngleReading::Stale,
            };
        }
        self.last_readings = readings;

        // Check to see if there's a new command
        if let Some(cmd) = input_data.cmd {
            if !cmd.is_valid() {
                return Err(SwerveCtrlError::InvalidCmd(cmd));
            }

            // Update the internal copy of the command and recalculate the
            // target module states
            self.current_cmd = Some(cmd);
            self.calc_target_states();
        }

        // Produce the per-module outputs. RawDrive bypasses the steering
        // loop entirely; everything else runs the closed-loop path against
        // the current target states.
        let mut output = OutputData::default();

        match self.current_cmd {
            Some(SwerveCmd::RawDrive(powers)) => {
                for i in 0..NUM_MODULES {
                    output.modules[i] = self.modules[i].raw_drive(powers[i]);
                }
            }
            _ => {
                if let Some(targets) = self.target_states {
                    for i in 0..NUM_MODULES {
                        let (module_output, status) =
                            self.modules[i].apply(targets[i], readings[i]);

                        output.modules[i] = module_output;
                        self.report.at_setpoint[i] = status.at_setpoint;
                        self.report.skipped_stale[i] = status.skipped_stale;
                        self.report.drive_limited[i] = status.drive_limited;
                    }
                }
                // If no target has ever been set the default (all zero)
                // output stands.
            }
        }

        trace!(
            "SwerveCtrl output:\n    drive: {:?}\n    steer: {:?}",
            output.modules.iter().map(|m| m.drive_power).collect::<Vec<_>>(),
            output.modules.iter().map(|m| m.steer_power).collect::<Vec<_>>()
        );

        // Update the output in self
        self.output = Some(output);

        Ok((output, self.report))
    }
}

impl Archived for SwerveCtrl {
    fn write(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        // Write each one individually
        self.arch_report.serialise(self.report)?;
        self.arch_current_cmd.serialise(self.current_cmd)?;
        self.arch_target_states.serialise(self.target_states)?;
        self.arch_output.serialise(self.output)?;

        Ok(())
    }
}

impl SwerveCtrl {
    /// Build a SwerveCtrl instance from an already loaded parameter set.
    ///
    /// Validates the parameters (fatal on a geometry or tuning error),
    /// builds the kinematics over the configured module positions and
    /// constructs the four module controllers in the same fixed order.
    pub fn with_params(params: Params) -> Result<Self, ParamsError> {
        params.are_valid()?;

        let mut positions_m = [[0f64; 2]; NUM_MODULES];
        for (i, module) in params.modules.iter().enumerate() {
            positions_m[i] = module.pos_m;
        }

        let mut state = Self {
            kinematics: SwerveKinematics::new(positions_m),
            ..Default::default()
        };

        for i in 0..NUM_MODULES {
            state.modules[i] =
                ModuleController::new(params.modules[i].clone(), &params.steer_ctrl);
            state.modules[i].init();
        }

        state.params = params;

        Ok(state)
    }

    /// The target module states currently in effect, if any.
    ///
    /// Read-only accessor for telemetry; order matches the configured
    /// module order.
    pub fn target_states(&self) -> Option<[ModuleState; NUM_MODULES]> {
        self.target_states
    }

    /// The (normalised) angle readings seen on the most recent cycle.
    pub fn last_readings(&self) -> [AngleReading; NUM_MODULES] {
        self.last_readings
    }

    /// The command currently in effect.
    pub fn current_cmd(&self) -> Option<SwerveCmd> {
        self.current_cmd
    }

    /// Labels of the configured modules, in the fixed order.
    pub fn module_labels(&self) -> [&str; NUM_MODULES] {
        let mut labels = [""; NUM_MODULES];
        for (i, module) in self.modules.iter().enumerate() {
            labels[i] = module.config.label.as_str();
        }
        labels
    }

    /// Based on the current command calculate the target module states.
    fn calc_target_states(&mut self) {
        match self.current_cmd {
            Some(SwerveCmd::Velocity(velocity)) => {
                let (states, scale) = self.kinematics.compute(&velocity);
                self.report.speed_scale = scale;
                self.target_states = Some(states);
            }
            Some(SwerveCmd::ModuleTargets(targets)) => {
                self.target_states = Some(targets);
            }
            Some(SwerveCmd::Stop) => {
                // Maintain the current steer targets, zero all drive. Stop
                // must always succeed, even before any target exists.
                self.target_states = self.target_states.map(|mut targets| {
                    for target in targets.iter_mut() {
                        target.speed = 0.0;
                    }
                    targets
                });
            }
            Some(SwerveCmd::RawDrive(_)) | None => {
                self.target_states = None;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
