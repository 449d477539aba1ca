//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Map a value from one range into another.
pub fn lin_map<T>(source_range: (T, T), target_range: (T, T), value: T) -> T
where 
    T: Float 
{
    target_range.0 
        + ((value - source_range.0) 
        * (target_range.1 - target_range.0) 
        / (source_range.1 - source_range.0))
}

/// Wrap an angle into the range [-pi, pi).
pub fn norm_angle_pi<T>(angle: T) -> T
where
    T: Float
{
    let pi_t: T = T::from(std::f64::consts::PI).unwrap();
    let tau_t: T = T::from(std::f64::consts::TAU).unwrap();

    rem_euclid(angle + pi_t, tau_t) - pi_t
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
/// 
/// This function is taken from the std library as num is missing it.
///
/// In particular, the return value `r` satisfies `0.0 <= r < rhs.abs()` in
/// most cases. However, due to a floating point round-off error it can
/// result in `r == rhs.abs()`, violating the mathematical definition, if
/// `self` is much smaller than `rhs.abs()` in magnitude and `self < 0.0`.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float
{
    let r = lhs % rhs;
    if r < T::zero() { r + rhs.abs() } else { r }
}

#[cfg(test)]
mod test {
    use super::*;

    const PI: f64 = std::f64::consts::PI;

    #[test]
    fn test_lin_map() {
        assert_eq!(lin_map((0f64, 10f64), (0f64, 100f64), 2.5), 25.0);
        assert_eq!(lin_map((-1f64, 1f64), (0f64, 1f64), 0.0), 0.5);
    }

    #[test]
    fn test_norm_angle_pi() {
        assert!((norm_angle_pi(0.5f64) - 0.5).abs() < 1e-12);
        assert!((norm_angle_pi(PI + 0.5) - (-PI + 0.5)).abs() < 1e-12);
        assert!((norm_angle_pi(-PI - 0.5) - (PI - 0.5)).abs() < 1e-12);
        assert!((norm_angle_pi(4.0 * PI + 0.25) - 0.25).abs() < 1e-12);
    }
}
