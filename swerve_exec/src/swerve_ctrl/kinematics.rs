//! Inverse kinematics for the swerve drivetrain
//!
//! Maps a whole-body [`ChassisVelocity`] demand into one [`ModuleState`]
//! target per configured module position. The computation is pure: no
//! internal state is mutated and all finite inputs produce a defined
//! output.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Vector2;
use serde::Serialize;

// Internal
use super::{ChassisVelocity, NUM_MODULES};
use util::maths::{ang_dist_deg, norm_angle_deg};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Desired state of a single swerve module.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct ModuleState {
    /// Signed wheel speed demand.
    ///
    /// Units: normalised, [-1, 1] is the actuator's full range. Conversion
    /// to a true physical wheel velocity (gearing, feed forward) is outside
    /// this module's contract.
    pub speed: f64,

    /// Absolute steering angle demand.
    ///
    /// Units: degrees, in the canonical [0, 360) domain
    pub angle_deg: f64,
}

/// Inverse kinematics over a fixed set of module positions.
#[derive(Clone, Debug, Default, Serialize)]
pub struct SwerveKinematics {
    /// Module steer axis positions in the body frame.
    ///
    /// Units: meters,
    /// Frame: body
    positions_m: [[f64; 2]; NUM_MODULES],
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ModuleState {
    /// Optimise this target against the measured module angle.
    ///
    /// If reaching the target angle directly would require rotating the
    /// module by more than 90 degrees, the angle is flipped by 180 degrees
    /// and the speed negated, so the wheel drives backwards instead of
    /// taking the long way round. This bounds the required steer travel to
    /// 90 degrees.
    pub fn optimised(self, measured_deg: f64) -> Self {
        if ang_dist_deg(measured_deg, self.angle_deg).abs() > 90.0 {
            Self {
                speed: -self.speed,
                angle_deg: norm_angle_deg(self.angle_deg + 180.0),
            }
        }
        else {
            self
        }
    }
}

impl SwerveKinematics {
    /// Create a new kinematics instance over the given module positions.
    ///
    /// The position order is fixed for the lifetime of the instance, and
    /// [`Self::compute`] outputs match it one to one.
    pub fn new(positions_m: [[f64; 2]; NUM_MODULES]) -> Self {
        Self { positions_m }
    }

    /// Compute the target module states for the given chassis velocity.
    ///
    /// Returns the four module states, in configured position order, plus
    /// the desaturation factor applied to the speeds. If any module's raw
    /// speed magnitude exceeds 1, every module's speed is divided by the
    /// maximum magnitude so that the largest becomes exactly 1 while the
    /// relative balance between modules is preserved. The factor is 1 when
    /// no desaturation was needed.
    pub fn compute(
        &self,
        velocity: &ChassisVelocity,
    ) -> ([ModuleState; NUM_MODULES], f64) {
        let mut states = [ModuleState::default(); NUM_MODULES];

        for (i, pos) in self.positions_m.iter().enumerate() {
            // Velocity of the module contact point: the body's linear
            // velocity plus the tangential component omega x r.
            let vel_m = Vector2::new(
                velocity.vx_ms - velocity.omega_rads * pos[1],
                velocity.vy_ms + velocity.omega_rads * pos[0],
            );

            states[i] = ModuleState {
                speed: vel_m.norm(),
                angle_deg: norm_angle_deg(vel_m[1].atan2(vel_m[0]).to_degrees()),
            };
        }

        // Desaturate: scale all speeds uniformly so none exceeds the
        // actuator's normalised range. Scaling per-module would distort the
        // turning geometry.
        let max_speed = states
            .iter()
            .map(|s| s.speed.abs())
            .fold(0f64, f64::max);

        let scale = if max_speed > 1.0 { max_speed } else { 1.0 };

        if scale > 1.0 {
            for state in states.iter_mut() {
                state.speed /= scale;
            }
        }

        (states, scale)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    /// Square drivetrain with the flight-configuration geometry, [FL, FR, BL,
    /// BR] order.
    fn square_kin() -> SwerveKinematics {
        SwerveKinematics::new([
            [0.18, 0.18],
            [0.18, -0.18],
            [-0.18, 0.18],
            [-0.18, -0.18],
        ])
    }

    #[test]
    fn test_pure_translation() {
        let kin = square_kin();

        let (states, scale) = kin.compute(&ChassisVelocity {
            vx_ms: 1.0,
            vy_ms: 0.0,
            omega_rads: 0.0,
        });

        assert_eq!(scale, 1.0);

        // Every module moves straight ahead at the commanded speed,
        // regardless of its position
        for state in states.iter() {
            assert!((state.speed - 1.0).abs() < 1e-9);
            assert!(state.angle_deg.abs() < 1e-9);
        }
    }

    #[test]
    fn test_pure_rotation() {
        let kin = square_kin();

        let (states, _) = kin.compute(&ChassisVelocity {
            vx_ms: 0.0,
            vy_ms: 0.0,
            omega_rads: 1.0,
        });

        let positions: [[f64; 2]; NUM_MODULES] = [
            [0.18, 0.18],
            [0.18, -0.18],
            [-0.18, 0.18],
            [-0.18, -0.18],
        ];

        let radius = (0.18f64.powi(2) + 0.18f64.powi(2)).sqrt();

        for (state, pos) in states.iter().zip(positions.iter()) {
            // Speed magnitude is proportional to distance from centre, and
            // all four modules are equidistant here
            assert!((state.speed - radius).abs() < 1e-9);

            // The module angle is perpendicular to its position vector
            let pos_angle_deg = norm_angle_deg(pos[1].atan2(pos[0]).to_degrees());
            let diff = ang_dist_deg(pos_angle_deg, state.angle_deg).abs();
            assert!((diff - 90.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_desaturation() {
        let kin = square_kin();

        // Mixed demand that saturates at least one module
        let velocity = ChassisVelocity {
            vx_ms: 1.0,
            vy_ms: 0.5,
            omega_rads: 4.0,
        };

        let (states, scale) = kin.compute(&velocity);

        assert!(scale > 1.0);

        // The maximum speed is exactly 1 after scaling
        let max_speed = states
            .iter()
            .map(|s| s.speed.abs())
            .fold(0f64, f64::max);
        assert!((max_speed - 1.0).abs() < 1e-9);

        // All modules were scaled by the identical factor: recompute the
        // unscaled states and check the ratios
        let mut unscaled = [ModuleState::default(); NUM_MODULES];
        for (i, pos) in [[0.18, 0.18], [0.18, -0.18], [-0.18, 0.18], [-0.18, -0.18]]
            .iter()
            .enumerate()
        {
            let vx = velocity.vx_ms - velocity.omega_rads * pos[1];
            let vy = velocity.vy_ms + velocity.omega_rads * pos[0];
            unscaled[i].speed = (vx.powi(2) + vy.powi(2)).sqrt();
        }

        for (state, raw) in states.iter().zip(unscaled.iter()) {
            assert!((state.speed * scale - raw.speed).abs() < 1e-9);
        }
    }

    #[test]
    fn test_optimise_flip() {
        // Target 180 degrees away from the measurement flips to the
        // measured angle with negated speed
        let state = ModuleState {
            speed: 0.5,
            angle_deg: 190.0,
        };

        let opt = state.optimised(10.0);

        assert_eq!(opt.speed, -0.5);
        assert!(ang_dist_deg(opt.angle_deg, 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_optimise_passthrough() {
        // A 45 degree rotation is within the 90 degree bound, no flip
        let state = ModuleState {
            speed: 0.5,
            angle_deg: 55.0,
        };

        let opt = state.optimised(10.0);

        assert_eq!(opt, state);
    }

    #[test]
    fn test_optimise_wraparound() {
        // Measurement near the wrap point: 350 -> 10 is only 20 degrees
        let state = ModuleState {
            speed: 1.0,
            angle_deg: 10.0,
        };

        assert_eq!(state.optimised(350.0), state);
    }
}
