//! Main swerve drivetrain executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise all modules
//!     - Main loop:
//!         - Steering angle acquisition from the electronics driver
//!         - Command generation (demo drive profile or calibration
//!           sequence)
//!         - Swerve control processing
//!         - Electronics driver execution
//!
//! # Modules
//!
//! All modules (e.g. `swerve_ctrl`) shall meet the following requirements:
//!     1. Provide a public struct implementing the `util::module::State`
//!        trait.

// ---------------------------------------------------------------------------
// USE MODULES FROM LIBRARY
// ---------------------------------------------------------------------------

use swerve_lib::{
    calib_seq::{self, CalibPhase, CalibSeq},
    elec_driver::{AngleEncoder, SimElecDriver},
    swerve_ctrl::{ChassisVelocity, InputData, SwerveCmd, SwerveCtrl},
};

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{debug, info, warn};
use std::env;
use std::thread;
use std::time::{Duration, Instant};

// Internal
use util::{
    archive::Archived,
    logger::{logger_init, LevelFilter},
    module::State,
    session::Session,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Target period of one control cycle.
const CYCLE_PERIOD_S: f64 = 0.02;

/// Demo drive profile executed when no mode argument is given. Each segment
/// is a body-frame velocity demand held for a duration.
const DEMO_PROFILE: [(f64, ChassisVelocity); 5] = [
    // Forward
    (3.0, ChassisVelocity { vx_ms: 0.5, vy_ms: 0.0, omega_rads: 0.0 }),
    // Strafe left
    (3.0, ChassisVelocity { vx_ms: 0.0, vy_ms: 0.5, omega_rads: 0.0 }),
    // Diagonal
    (3.0, ChassisVelocity { vx_ms: 0.4, vy_ms: 0.4, omega_rads: 0.0 }),
    // Spin in place
    (3.0, ChassisVelocity { vx_ms: 0.0, vy_ms: 0.0, omega_rads: 1.0 }),
    // Arc
    (3.0, ChassisVelocity { vx_ms: 0.5, vy_ms: 0.0, omega_rads: 0.5 }),
];

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("swerve_exec", "sessions")
        .wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Trace, &session)
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Swerve Drivetrain Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- DETERMINE COMMAND SOURCE ----

    // Collect all arguments
    let args: Vec<String> = env::args().collect();

    debug!("CLI arguments: {:?}", args);

    let mut cmd_source = match args.len() {
        1 => {
            info!("No mode argument, running the demo drive profile\n");
            CmdSource::DemoProfile { segment: 0, ticks_in_segment: 0 }
        }
        2 if args[1] == "calib" => {
            info!("Running the calibration sequence\n");
            CmdSource::Calib(CalibSeq::default())
        }
        _ => {
            return Err(eyre!(
                "Expected either no argument or \"calib\", found {:?}",
                &args[1..]
            ))
        }
    };

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let mut swerve_ctrl = SwerveCtrl::default();
    swerve_ctrl
        .init("swerve_ctrl.toml", &session)
        .wrap_err("Failed to initialise SwerveCtrl")?;
    info!("SwerveCtrl init complete");

    if let CmdSource::Calib(ref mut calib_seq) = cmd_source {
        calib_seq
            .init("calib_seq.toml", &session)
            .wrap_err("Failed to initialise CalibSeq")?;
        info!("CalibSeq init complete");
    }

    let mut elec_driver = SimElecDriver::default();
    elec_driver
        .init("elec_driver.toml", &session)
        .wrap_err("Failed to initialise SimElecDriver")?;
    info!("SimElecDriver init complete");

    info!("Module initialisation complete\n");

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    // Readings the control core sees on the first cycle, before any motor
    // demand has been applied.
    let mut raw_angles_frac = elec_driver.read_raw_frac();

    loop {
        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // Set when this is the last cycle; the cycle still completes so the
        // final command reaches the motors.
        let mut last_cycle = false;

        // ---- COMMAND GENERATION ----

        let cmd = match cmd_source {
            CmdSource::DemoProfile {
                ref mut segment,
                ref mut ticks_in_segment,
            } => {
                match demo_profile_cmd(segment, ticks_in_segment) {
                    Some(cmd) => cmd,
                    None => {
                        info!("End of demo profile reached, stopping");
                        last_cycle = true;
                        Some(SwerveCmd::Stop)
                    }
                }
            }
            CmdSource::Calib(ref mut calib_seq) => {
                let (cmd, report) = calib_seq
                    .proc(&calib_seq::InputData { heading_deg: None })
                    .wrap_err("CalibSeq processing failed")?;

                if report.ticks_in_phase == 0 {
                    info!("Calibration phase: {:?}", report.phase);
                }

                // Halt once the sequence declares itself complete
                if calib_seq.phase() == CalibPhase::Complete {
                    info!("Calibration sequence complete, stopping");
                    last_cycle = true;
                }

                Some(cmd)
            }
        };

        // ---- CONTROL PROCESSING ----

        let (output, _report) = swerve_ctrl
            .proc(&InputData {
                cmd,
                raw_angles_frac,
            })
            .wrap_err("SwerveCtrl processing failed")?;

        // ---- ELECTRONICS DRIVER EXECUTION ----

        let (readings, _) = elec_driver
            .proc(&output)
            .wrap_err("SimElecDriver processing failed")?;
        raw_angles_frac = readings;

        // ---- ARCHIVING ----

        if let Err(e) = swerve_ctrl.write() {
            warn!("Could not archive SwerveCtrl data: {}", e);
        }

        if let CmdSource::Calib(ref mut calib_seq) = cmd_source {
            if let Err(e) = calib_seq.write() {
                warn!("Could not archive CalibSeq data: {}", e);
            }
        }

        // ---- CYCLE MANAGEMENT ----

        if last_cycle {
            break;
        }

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match Duration::from_secs_f64(CYCLE_PERIOD_S).checked_sub(cycle_dur) {
            Some(d) => thread::sleep(d),
            None => {
                warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - CYCLE_PERIOD_S
                );
            }
        }
    }

    // ---- SHUTDOWN ----

    info!("End of execution");

    Ok(())
}

/// Step the demo profile by one tick, returning the command for this cycle
/// or `None` once the profile is exhausted.
fn demo_profile_cmd(segment: &mut usize, ticks_in_segment: &mut u64) -> Option<Option<SwerveCmd>> {
    if *segment >= DEMO_PROFILE.len() {
        return None;
    }

    let (duration_s, velocity) = DEMO_PROFILE[*segment];

    // A new command is only issued on the first tick of a segment, after
    // that the previous command stays in effect
    let cmd = match *ticks_in_segment {
        0 => Some(SwerveCmd::Velocity(velocity)),
        _ => None,
    };

    *ticks_in_segment += 1;
    if (*ticks_in_segment as f64) * CYCLE_PERIOD_S >= duration_s {
        *ticks_in_segment = 0;
        *segment += 1;
    }

    Some(cmd)
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Sources of commands driving the control core.
enum CmdSource {
    /// Built-in sequence of velocity demands.
    DemoProfile { segment: usize, ticks_in_segment: u64 },

    /// The timed calibration sequence.
    Calib(CalibSeq),
}
