//! Utility maths functions
//!
//! The steering control loops work in a circular (wraparound) angle domain,
//! so as well as the generic helpers this module provides functions for
//! normalising angles into the canonical `[0, 360)` degree range and for
//! computing shortest signed angular distances within it.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Map a value from one range into another.
pub fn lin_map<T>(source_range: (T, T), target_range: (T, T), value: T) -> T
where
    T: Float,
{
    target_range.0
        + ((value - source_range.0)
        * (target_range.1 - target_range.0)
        / (source_range.1 - source_range.0))
}

/// Clamp a value between a minimum and maximum.
pub fn clamp<T>(value: &T, min: &T, max: &T) -> T
where
    T: Float,
{
    let mut ret = *value;

    if ret > *max {
        ret = *max
    }
    if ret < *min {
        ret = *min
    }

    ret
}

/// Normalise an angle in degrees into the canonical `[0, 360)` range.
pub fn norm_angle_deg<T>(angle_deg: T) -> T
where
    T: Float,
{
    let full_turn: T = T::from(360.0).unwrap();

    rem_euclid(angle_deg, full_turn)
}

/// Get the shortest signed angular distance from `a` to `b` in degrees.
///
/// Both angles are treated as positions on a circle, so the result accounts
/// for wrapping at 360 degrees and always lies in `(-180, 180]`. For example
/// the distance from 359 to 1 is 2 degrees, not -358.
pub fn ang_dist_deg<T>(a: T, b: T) -> T
where
    T: Float,
{
    let full_turn: T = T::from(360.0).unwrap();

    let ccw = rem_euclid(b - a, full_turn);
    let cw = rem_euclid(a - b, full_turn);

    if cw < ccw {
        -cw
    }
    else {
        ccw
    }
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
///
/// This function is taken from the std library as num is missing it.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float,
{
    let r = lhs % rhs;
    if r < T::from(0.0).unwrap() { r + rhs.abs() } else { r }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_norm_angle_deg() {
        assert_eq!(norm_angle_deg(0f64), 0f64);
        assert_eq!(norm_angle_deg(360f64), 0f64);
        assert_eq!(norm_angle_deg(540f64), 180f64);
        assert_eq!(norm_angle_deg(-90f64), 270f64);
        assert_eq!(norm_angle_deg(-360f64), 0f64);
    }

    #[test]
    fn test_ang_dist_deg() {
        assert_eq!(ang_dist_deg(10f64, 30f64), 20f64);
        assert_eq!(ang_dist_deg(30f64, 10f64), -20f64);

        // Wraparound: 359 vs 1 is a 2 degree error, not 358
        assert_eq!(ang_dist_deg(359f64, 1f64), 2f64);
        assert_eq!(ang_dist_deg(1f64, 359f64), -2f64);

        assert_eq!(ang_dist_deg(0f64, 360f64), 0f64);
        assert_eq!(ang_dist_deg(0f64, 180f64), 180f64);
    }

    #[test]
    fn test_lin_map() {
        assert_eq!(lin_map((0f64, 10f64), (-1f64, 1f64), 5f64), 0f64);
        assert_eq!(lin_map((0f64, 10f64), (-1f64, 1f64), 10f64), 1f64);
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(&1.5f64, &-1f64, &1f64), 1f64);
        assert_eq!(clamp(&-1.5f64, &-1f64, &1f64), -1f64);
        assert_eq!(clamp(&0.3f64, &-1f64, &1f64), 0.3f64);
    }
}
