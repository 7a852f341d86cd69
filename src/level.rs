//! Darkness levels and the level-to-opacity mapping.
//!
//! A level is a small integer picked by the user; the compositor wants a
//! 32-bit `_NET_WM_WINDOW_OPACITY` value where `0xFFFFFFFF`-ish means opaque.
//! Two granularities exist: a coarse 5-step table and a fine 20-step linear
//! ramp.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::FULL_OPACITY;

const COARSE_TABLE: [u32; 5] = [0x3300_0000, 0x6600_0000, 0x9900_0000, 0xCC00_0000, 0xFF00_0000];

/// Granularity of the darkness scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scale {
    /// Five steps of 20%.
    Coarse,
    /// Twenty steps of 5%.
    Fine,
}

impl Scale {
    pub const fn max_level(self) -> u32 {
        match self {
            Scale::Coarse => 5,
            Scale::Fine => 20,
        }
    }

    /// Level used when the overlay is started without an argument.
    pub const fn default_level(self) -> Level {
        match self {
            Scale::Coarse => Level(3),
            Scale::Fine => Level(10),
        }
    }

    /// Looks up the scale with the given number of steps.
    pub fn from_max_level(max: u32) -> Option<Scale> {
        match max {
            5 => Some(Scale::Coarse),
            20 => Some(Scale::Fine),
            _ => None,
        }
    }

    /// Clamps an arbitrary integer into `1..=max_level`. Out-of-range input
    /// is never an error.
    pub fn clamp(self, raw: i64) -> Level {
        let max = i64::from(self.max_level());
        // Both bounds fit in u32, so the cast cannot truncate.
        Level(raw.clamp(1, max) as u32)
    }

    /// Opacity property value for `level`. The level is clamped first, so a
    /// level from another scale still yields a valid value.
    pub fn opacity(self, level: Level) -> Opacity {
        let level = self.clamp(i64::from(level.0));
        match self {
            Scale::Coarse => Opacity(COARSE_TABLE[(level.0 - 1) as usize]),
            Scale::Fine => {
                let max = u64::from(self.max_level());
                let wide = (u64::from(level.0) * u64::from(FULL_OPACITY) + max / 2) / max;
                Opacity(u32::try_from(wide).unwrap_or(FULL_OPACITY))
            }
        }
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-level", self.max_level())
    }
}

/// A darkness level, always within the range of the scale that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Level(u32);

impl Level {
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Value written to `_NET_WM_WINDOW_OPACITY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Opacity(u32);

impl Opacity {
    pub const fn value(self) -> u32 {
        self.0
    }

    pub fn fraction(self) -> f64 {
        f64::from(self.0) / f64::from(FULL_OPACITY)
    }
}

impl fmt::Display for Opacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x} ({:.0}%)", self.0, self.fraction() * 100.0)
    }
}

/// Parses a level argument the way C's `atoi` does: optional leading
/// whitespace and sign, then as many digits as there are. Anything that does
/// not start with a number yields 0. Saturates instead of overflowing.
pub fn parse_level_arg(arg: &str) -> i64 {
    let s = arg.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let mut value: i64 = 0;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        value = value.saturating_mul(10).saturating_add(i64::from(b - b'0'));
    }

    if negative {
        -value
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_keeps_in_range_values() {
        for scale in [Scale::Coarse, Scale::Fine] {
            for l in 1..=scale.max_level() {
                assert_eq!(scale.clamp(i64::from(l)).get(), l);
            }
        }
    }

    #[test]
    fn clamp_pins_out_of_range_values() {
        assert_eq!(Scale::Coarse.clamp(99), Scale::Coarse.clamp(5));
        assert_eq!(Scale::Fine.clamp(99).get(), 20);
        assert_eq!(Scale::Coarse.clamp(0).get(), 1);
        assert_eq!(Scale::Fine.clamp(-7).get(), 1);
        assert_eq!(Scale::Fine.clamp(i64::MIN).get(), 1);
        assert_eq!(Scale::Fine.clamp(i64::MAX).get(), 20);
    }

    #[test]
    fn defaults() {
        assert_eq!(Scale::Coarse.default_level().get(), 3);
        assert_eq!(Scale::Fine.default_level().get(), 10);
    }

    #[test]
    fn coarse_table() {
        let expected = [0x3300_0000, 0x6600_0000, 0x9900_0000, 0xCC00_0000, 0xFF00_0000];
        for (i, want) in expected.into_iter().enumerate() {
            let level = Scale::Coarse.clamp(i as i64 + 1);
            let opacity = Scale::Coarse.opacity(level);
            assert_eq!(opacity.value(), want, "level {level}");
            assert_eq!(opacity.value() & 0x00FF_FFFF, 0);
        }
    }

    #[test]
    fn fine_ramp_is_linear() {
        assert_eq!(Scale::Fine.opacity(Scale::Fine.clamp(1)).value(), 0x0CC0_0000);
        assert_eq!(Scale::Fine.opacity(Scale::Fine.clamp(10)).value(), 0x7F80_0000);
        assert_eq!(Scale::Fine.opacity(Scale::Fine.clamp(20)).value(), 0xFF00_0000);

        for l in 1..=20u64 {
            let want = (l * 0xFF00_0000 / 20) as u32;
            assert_eq!(Scale::Fine.opacity(Scale::Fine.clamp(l as i64)).value(), want);
        }
    }

    #[test]
    fn fine_ramp_is_monotonic() {
        let values: Vec<u32> = (1..=20)
            .map(|l| Scale::Fine.opacity(Scale::Fine.clamp(l)).value())
            .collect();
        assert!(values.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn foreign_level_is_clamped_before_lookup() {
        let fine = Scale::Fine.clamp(17);
        assert_eq!(Scale::Coarse.opacity(fine).value(), 0xFF00_0000);
    }

    #[test]
    fn opacity_accessors() {
        let full = Scale::Coarse.opacity(Scale::Coarse.clamp(5));
        assert!((full.fraction() - 1.0).abs() < f64::EPSILON);
        assert_eq!(full.to_string(), "0xff000000 (100%)");

        let fifth = Scale::Coarse.opacity(Scale::Coarse.clamp(1));
        assert!((fifth.fraction() - 0.2).abs() < 1e-9);
    }

    #[test]
    fn atoi_semantics() {
        assert_eq!(parse_level_arg("4"), 4);
        assert_eq!(parse_level_arg("  12"), 12);
        assert_eq!(parse_level_arg("+7"), 7);
        assert_eq!(parse_level_arg("-3"), -3);
        assert_eq!(parse_level_arg("7abc"), 7);
        assert_eq!(parse_level_arg("abc"), 0);
        assert_eq!(parse_level_arg(""), 0);
        assert_eq!(parse_level_arg("-"), 0);
        assert_eq!(parse_level_arg("99999999999999999999999"), i64::MAX);
    }

    #[test]
    fn non_numeric_argument_ends_up_at_level_one() {
        assert_eq!(Scale::Coarse.clamp(parse_level_arg("dark")).get(), 1);
    }

    #[test]
    fn scale_lookup() {
        assert_eq!(Scale::from_max_level(5), Some(Scale::Coarse));
        assert_eq!(Scale::from_max_level(20), Some(Scale::Fine));
        assert_eq!(Scale::from_max_level(7), None);
    }
}
