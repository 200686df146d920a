//! Integer linear scaling and clipping

use super::DestinationType;

/// Linearly map `value` in `0..=source_max` onto `from..=to`.
///
/// Division truncates toward zero, so with negative bounds the result is
/// not a floor.
pub fn scale(value: i32, source_max: i32, from: i32, to: i32) -> i32 {
    let value = i64::from(value);
    let from = i64::from(from);
    let to = i64::from(to);
    let scaled = from + value * (to - from) / i64::from(source_max.max(1));
    scaled.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// Clamp to the legal range of the destination
pub fn clip(value: i32, dest: DestinationType) -> i32 {
    match dest.value_range() {
        Some((min, max)) => value.clamp(min, max),
        None => value,
    }
}

/// Scale then clip, the only order in which the two are ever applied
pub fn scale_and_clip(value: i32, source_max: i32, from: i32, to: i32, dest: DestinationType) -> i32 {
    clip(scale(value, source_max, from, to), dest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_scale_identity() {
        assert_eq!(scale(0, 127, 0, 127), 0);
        assert_eq!(scale(64, 127, 0, 127), 64);
        assert_eq!(scale(127, 127, 0, 127), 127);
    }

    #[test]
    fn test_scale_7_to_14_bit() {
        assert_eq!(scale(0, 127, 0, 16383), 0);
        assert_eq!(scale(127, 127, 0, 16383), 16383);
        assert_eq!(scale(64, 127, 0, 16383), 8256);
        // 1 * 16383 / 127 = 129.0
        assert_eq!(scale(1, 127, 0, 16383), 129);
    }

    #[test]
    fn test_scale_14_to_7_bit() {
        assert_eq!(scale(16383, 16383, 0, 127), 127);
        assert_eq!(scale(8192, 16383, 0, 127), 63);
    }

    #[test]
    fn test_scale_truncates() {
        // 1 * 100 / 127 = 0.78
        assert_eq!(scale(1, 127, 0, 100), 0);
        assert_eq!(scale(126, 127, 0, 100), 99);
    }

    #[test]
    fn test_scale_truncates_toward_zero() {
        // 1 * -100 / 127 = -0.78, truncated to 0 rather than floored to -1
        assert_eq!(scale(1, 127, 0, -100), 0);
        assert_eq!(scale(2, 127, 0, -100), -1);
    }

    #[test]
    fn test_scale_inverted() {
        assert_eq!(scale(0, 127, 127, 0), 127);
        assert_eq!(scale(127, 127, 127, 0), 0);
    }

    #[test]
    fn test_clip() {
        assert_eq!(clip(-5, DestinationType::Cc), 0);
        assert_eq!(clip(200, DestinationType::Cc), 127);
        assert_eq!(clip(200, DestinationType::Aftertouch), 127);
        assert_eq!(clip(20000, DestinationType::Nrpn), 16383);
        assert_eq!(clip(-1, DestinationType::PitchBend), 0);
        assert_eq!(clip(500, DestinationType::Rpn), 500);
    }

    #[test]
    fn test_partial_range_clips() {
        // Fine control over the first half of the travel
        assert_eq!(scale_and_clip(0, 127, 0, 254, DestinationType::Cc), 0);
        assert_eq!(scale_and_clip(50, 127, 0, 254, DestinationType::Cc), 100);
        assert_eq!(scale_and_clip(100, 127, 0, 254, DestinationType::Cc), 127);
    }

    proptest! {
        #[test]
        fn scale_is_monotonic(a in 0i32..=127, b in 0i32..=127, to in 0i32..=16383) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(scale(lo, 127, 0, to) <= scale(hi, 127, 0, to));
            prop_assert!(scale(lo, 127, to, 0) >= scale(hi, 127, to, 0));
        }

        #[test]
        fn pitch_bend_source_is_monotonic(a in 0i32..=16383, b in 0i32..=16383) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(scale(lo, 16383, 0, 127) <= scale(hi, 16383, 0, 127));
        }

        #[test]
        fn clip_stays_in_range(value in any::<i32>()) {
            for dest in [
                DestinationType::Cc,
                DestinationType::Nrpn,
                DestinationType::Rpn,
                DestinationType::PitchBend,
                DestinationType::Aftertouch,
            ] {
                let (min, max) = dest.value_range().unwrap();
                let clipped = clip(value, dest);
                prop_assert!(clipped >= min && clipped <= max);
            }
        }

        #[test]
        fn extreme_bounds_do_not_overflow(value in 0i32..=16383, from in any::<i32>(), to in any::<i32>()) {
            let _ = scale_and_clip(value, 16383, from, to, DestinationType::Nrpn);
        }
    }
}
