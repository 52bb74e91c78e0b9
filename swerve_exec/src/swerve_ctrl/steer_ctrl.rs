//! Steering feedback controller
//!
//! A three-term (PID) controller over the circular steering domain. The
//! error between setpoint and measurement is computed as the shortest
//! signed angular distance in the canonical `[0, 360)` degree range, so a
//! setpoint of 359 against a measurement of 1 produces a 2 degree error
//! rather than 358.
//!
//! The control loop runs at a fixed rate, so the controller integrates and
//! differentiates against the configured cycle period rather than wall
//! clock time. This keeps a given tick sequence fully deterministic.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;

// Internal
use super::SteerCtrlParams;
use util::maths::ang_dist_deg;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A wraparound-aware PID controller for one steer axis.
///
/// Each instance is exclusively owned and mutated by one module controller.
/// Accumulated state persists across cycles and is cleared only by an
/// explicit [`Self::reset`].
#[derive(Clone, Debug, Default, Serialize)]
pub struct SteeringController {
    /// Proportional gain
    k_p: f64,

    /// Integral gain. Zero is valid and simply disables the term.
    k_i: f64,

    /// Derivative gain
    k_d: f64,

    /// Fixed cycle period used for the integral and derivative terms.
    ///
    /// Units: seconds
    cycle_period_s: f64,

    /// Angular tolerance below which the controller reports at-setpoint.
    ///
    /// Units: degrees
    pos_tolerance_deg: f64,

    /// Optional error-rate tolerance which must also be met for
    /// at-setpoint.
    ///
    /// Units: degrees/second
    vel_tolerance_degs: Option<f64>,

    /// The integral accumulation
    integral: f64,

    /// Error computed on the previous cycle, `None` until the first
    /// `calculate` after construction or reset.
    prev_error_deg: Option<f64>,

    /// Error computed on the most recent cycle.
    last_error_deg: Option<f64>,

    /// Error rate computed on the most recent cycle.
    ///
    /// Units: degrees/second
    last_error_rate_degs: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SteeringController {
    /// Create a new controller from the steering parameters.
    pub fn new(params: &SteerCtrlParams) -> Self {
        Self {
            k_p: params.k_p,
            k_i: params.k_i,
            k_d: params.k_d,
            cycle_period_s: params.cycle_period_s,
            pos_tolerance_deg: params.pos_tolerance_deg,
            vel_tolerance_degs: params.vel_tolerance_degs,
            integral: 0f64,
            prev_error_deg: None,
            last_error_deg: None,
            last_error_rate_degs: 0f64,
        }
    }

    /// Perform one control step, returning the unclamped output power.
    ///
    /// Mutates the integral accumulator and the stored previous error. The
    /// caller is responsible for clamping the result to the actuator range
    /// and for applying the at-setpoint deadband.
    pub fn calculate(&mut self, measurement_deg: f64, setpoint_deg: f64) -> f64 {
        // Shortest signed distance from measurement to setpoint in the
        // wraparound domain
        let error_deg = ang_dist_deg(measurement_deg, setpoint_deg);

        self.integral += error_deg * self.cycle_period_s;

        // No derivative on the first step after a reset, to avoid a kick
        // from an undefined previous error
        let error_rate_degs = match self.prev_error_deg {
            Some(prev) => (error_deg - prev) / self.cycle_period_s,
            None => 0f64,
        };

        let out = self.k_p * error_deg
            + self.k_i * self.integral
            + self.k_d * error_rate_degs;

        self.prev_error_deg = Some(error_deg);
        self.last_error_deg = Some(error_deg);
        self.last_error_rate_degs = error_rate_degs;

        out
    }

    /// True when the last computed error is within the configured
    /// tolerance band.
    ///
    /// Always false before the first `calculate` after construction or
    /// reset, since no error has been computed yet.
    pub fn at_setpoint(&self) -> bool {
        let pos_ok = match self.last_error_deg {
            Some(e) => e.abs() <= self.pos_tolerance_deg,
            None => return false,
        };

        let vel_ok = match self.vel_tolerance_degs {
            Some(tol) => self.last_error_rate_degs.abs() <= tol,
            None => true,
        };

        pos_ok && vel_ok
    }

    /// Clear all accumulated state without changing the gains.
    ///
    /// Produces no output itself; the next `calculate` starts from a clean
    /// slate.
    pub fn reset(&mut self) {
        self.integral = 0f64;
        self.prev_error_deg = None;
        self.last_error_deg = None;
        self.last_error_rate_degs = 0f64;
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn test_params() -> SteerCtrlParams {
        SteerCtrlParams {
            k_p: 0.01,
            k_i: 0.0,
            k_d: 0.0005,
            cycle_period_s: 0.02,
            pos_tolerance_deg: 0.5,
            vel_tolerance_degs: None,
        }
    }

    #[test]
    fn test_wraparound_error() {
        let mut ctrl = SteeringController::new(&test_params());

        // Setpoint 359, measurement 1: the error is -2 degrees, so the
        // proportional output is -2 * k_p
        let out = ctrl.calculate(1.0, 359.0);
        assert!((out - (-2.0 * 0.01)).abs() < 1e-12);

        // And the controller is outside its 0.5 degree tolerance
        assert!(!ctrl.at_setpoint());
    }

    #[test]
    fn test_at_setpoint_within_tolerance() {
        let mut ctrl = SteeringController::new(&test_params());

        // Never at setpoint before the first calculate
        assert!(!ctrl.at_setpoint());

        let out = ctrl.calculate(90.2, 90.0);
        assert!(ctrl.at_setpoint());

        // The raw PID output is nonzero even though we're at setpoint -
        // suppressing it is the module controller's job
        assert!(out != 0.0);
    }

    #[test]
    fn test_velocity_tolerance() {
        let mut params = test_params();
        params.vel_tolerance_degs = Some(1.0);
        let mut ctrl = SteeringController::new(&params);

        // First step: position inside tolerance, no rate yet
        ctrl.calculate(90.3, 90.0);
        assert!(ctrl.at_setpoint());

        // Second step: the error moved 0.2 deg in 20 ms = 10 deg/s, which
        // violates the 1 deg/s rate tolerance
        ctrl.calculate(90.1, 90.0);
        assert!(!ctrl.at_setpoint());
    }

    #[test]
    fn test_integral_accumulates() {
        let mut params = test_params();
        params.k_p = 0.0;
        params.k_d = 0.0;
        params.k_i = 1.0;
        let mut ctrl = SteeringController::new(&params);

        let out_1 = ctrl.calculate(0.0, 10.0);
        let out_2 = ctrl.calculate(0.0, 10.0);

        // Constant error: the integral term grows linearly
        assert!((out_1 - 10.0 * 0.02).abs() < 1e-12);
        assert!((out_2 - 2.0 * 10.0 * 0.02).abs() < 1e-12);
    }

    #[test]
    fn test_reset_clears_state() {
        let mut params = test_params();
        params.k_i = 0.1;
        let mut ctrl = SteeringController::new(&params);

        ctrl.calculate(0.0, 45.0);
        ctrl.calculate(0.0, 45.0);

        ctrl.reset();

        assert!(!ctrl.at_setpoint());

        // After reset the output matches a fresh controller's first step
        let mut fresh = SteeringController::new(&params);
        let out_reset = ctrl.calculate(0.0, 45.0);
        let out_fresh = fresh.calculate(0.0, 45.0);
        assert_eq!(out_reset, out_fresh);
    }
}
