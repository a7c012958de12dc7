use rust_decimal::Decimal;

/// Number of samples the swing-high rule looks at.
pub const SWING_HIGH_WINDOW: usize = 3;

/// Returns true when the three most recent samples are strictly increasing.
///
/// Despite the name this is not a classic swing high (a peak with lower values on
/// both sides); it only asks for `p2 > p1 > p0`. Equal neighbours never fire.
pub fn detect_swing_high(last_three: &[Decimal; SWING_HIGH_WINDOW]) -> bool {
    let [p0, p1, p2] = last_three;
    p2 > p1 && p1 > p0
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn rising_triple_fires() {
        assert!(detect_swing_high(&[dec!(100), dec!(105), dec!(110)]));
    }

    #[test]
    fn falling_triple_does_not_fire() {
        assert!(!detect_swing_high(&[dec!(100), dec!(95), dec!(90)]));
    }

    #[test]
    fn ties_never_fire() {
        assert!(!detect_swing_high(&[dec!(100), dec!(100), dec!(110)]));
        assert!(!detect_swing_high(&[dec!(100), dec!(110), dec!(110)]));
        assert!(!detect_swing_high(&[dec!(100), dec!(100), dec!(100)]));
    }

    #[test]
    fn peak_shape_does_not_fire() {
        // A textbook swing high is not what this rule detects.
        assert!(!detect_swing_high(&[dec!(100), dec!(110), dec!(105)]));
    }

    proptest! {
        #[test]
        fn fires_iff_strictly_increasing(
            a in 1u32..10_000,
            b in 1u32..10_000,
            c in 1u32..10_000,
        ) {
            let window = [Decimal::from(a), Decimal::from(b), Decimal::from(c)];
            prop_assert_eq!(detect_swing_high(&window), a < b && b < c);
        }
    }
}
