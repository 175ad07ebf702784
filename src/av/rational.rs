use std::fmt;

/// A rational number used as a time base: one tick lasts `num / den` seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rational {
    pub num: i32,
    pub den: i32,
}

impl Rational {
    /// Microsecond clock used for caller-supplied timestamps.
    pub const MICROSECONDS: Rational = Rational::new(1, 1_000_000);
    /// 90 kHz system clock used for PES timestamps.
    pub const MPEG_90K: Rational = Rational::new(1, 90_000);

    pub const fn new(num: i32, den: i32) -> Self {
        Self { num, den }
    }

    /// Time base of a stream running at `fps` frames per second.
    pub const fn from_fps(fps: u32) -> Self {
        Self::new(1, fps as i32)
    }

    pub fn is_valid(&self) -> bool {
        self.num > 0 && self.den > 0
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

/// Rescales `value` expressed in `from` units into `to` units.
///
/// Computes `value * from / to` in 128-bit arithmetic and rounds half away
/// from zero, so large timestamps neither overflow nor drift. Results outside
/// the `i64` range saturate.
pub fn rescale_q(value: i64, from: Rational, to: Rational) -> i64 {
    let b = from.num as i128 * to.den as i128;
    let c = from.den as i128 * to.num as i128;
    if c == 0 {
        return if value == 0 { 0 } else if value > 0 { i64::MAX } else { i64::MIN };
    }
    let (b, c) = if c < 0 { (-b, -c) } else { (b, c) };

    let product = value as i128 * b;
    let half = c / 2;
    let rounded = if product < 0 {
        -((-product + half) / c)
    } else {
        (product + half) / c
    };

    rounded.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use quickcheck_macros::quickcheck;

    #[test]
    fn test_one_second_at_30fps() {
        let tb = Rational::from_fps(30);
        assert_eq!(rescale_q(1_000_000, Rational::MICROSECONDS, tb), 30);
        assert_eq!(rescale_q(0, Rational::MICROSECONDS, tb), 0);
    }

    #[test]
    fn test_rounds_half_away_from_zero() {
        let tb = Rational::from_fps(2);
        // 0.25 s at 2 fps is exactly half a tick
        assert_eq!(rescale_q(250_000, Rational::MICROSECONDS, tb), 1);
        assert_eq!(rescale_q(-250_000, Rational::MICROSECONDS, tb), -1);
        assert_eq!(rescale_q(249_999, Rational::MICROSECONDS, tb), 0);
    }

    #[test]
    fn test_large_timestamps_do_not_overflow() {
        let ten_years_us: i64 = 10 * 365 * 24 * 3600 * 1_000_000;
        let pts = rescale_q(ten_years_us, Rational::MICROSECONDS, Rational::MPEG_90K);
        assert_eq!(pts, ten_years_us / 1_000_000 * 90_000);

        assert_eq!(
            rescale_q(i64::MAX, Rational::new(1, 1), Rational::MICROSECONDS),
            i64::MAX
        );
    }

    #[test]
    fn test_stream_to_90khz() {
        assert_eq!(rescale_q(1, Rational::from_fps(30), Rational::MPEG_90K), 3000);
        assert_eq!(rescale_q(1, Rational::from_fps(25), Rational::MPEG_90K), 3600);
    }

    #[quickcheck]
    fn prop_whole_seconds_map_to_fps_ticks(secs: u16, fps: u8) -> bool {
        if fps == 0 {
            return true;
        }
        let micros = secs as i64 * 1_000_000;
        rescale_q(micros, Rational::MICROSECONDS, Rational::from_fps(fps as u32))
            == secs as i64 * fps as i64
    }

    #[quickcheck]
    fn prop_rescale_is_monotonic(a: i32, b: i32) -> bool {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let tb = Rational::from_fps(30);
        rescale_q(lo as i64, Rational::MICROSECONDS, tb)
            <= rescale_q(hi as i64, Rational::MICROSECONDS, tb)
    }
}
