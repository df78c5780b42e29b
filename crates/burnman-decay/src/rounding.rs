//! Rounding that matches the reference implementation.
//!
//! `f64::round` rounds half away from zero; the amounts other peers compute
//! round half towards positive infinity. The two differ for negative halves
//! (`-2.5` is `-2` here) and for the largest double below one half, which
//! a naive `(x + 0.5).floor()` would round up.

/// Round to the nearest integer, halves towards positive infinity.
///
/// Saturates at the `i64` bounds; NaN maps to 0.
pub fn round_half_up(value: f64) -> i64 {
    if value.is_nan() {
        return 0;
    }
    let floor = value.floor();
    let rounded = if value - floor >= 0.5 { floor + 1.0 } else { floor };
    rounded as i64
}

/// Ceiling division for non-negative numerators and positive divisors.
pub fn ceil_div(numerator: i64, divisor: i64) -> i64 {
    debug_assert!(divisor > 0);
    let q = numerator / divisor;
    if numerator % divisor > 0 { q + 1 } else { q }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn halves_round_up() {
        assert_eq!(round_half_up(0.5), 1);
        assert_eq!(round_half_up(2.5), 3);
        assert_eq!(round_half_up(-2.5), -2);
        assert_eq!(round_half_up(-0.5), 0);
    }

    #[test]
    fn just_below_half_rounds_down() {
        assert_eq!(round_half_up(0.499_999_999_999_999_94), 0);
    }

    #[test]
    fn nan_and_saturation() {
        assert_eq!(round_half_up(f64::NAN), 0);
        assert_eq!(round_half_up(f64::INFINITY), i64::MAX);
        assert_eq!(round_half_up(f64::NEG_INFINITY), i64::MIN);
    }

    #[test]
    fn ceil_div_basic() {
        assert_eq!(ceil_div(0, 4), 0);
        assert_eq!(ceil_div(8, 4), 2);
        assert_eq!(ceil_div(9, 4), 3);
        assert_eq!(ceil_div(3320, 4), 830);
    }

    proptest! {
        #[test]
        fn matches_std_round_for_positive_non_halves(x in 0.0f64..1e12) {
            let frac = x - x.floor();
            prop_assume!(frac != 0.5);
            prop_assert_eq!(round_half_up(x), x.round() as i64);
        }
    }
}
