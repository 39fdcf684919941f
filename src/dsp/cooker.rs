//! # Parameter Cooker
//!
//! Users think in milliseconds and percentages. The per-sample loop wants
//! a delay length in whole samples and gains in `[0, 1]`. "Cooking" is the
//! conversion between the two:
//!
//! ```text
//! delay_samples = delay_ms * sample_rate / 1000
//! feedback      = feedback_pct / 100
//! wet_level     = wet_level_pct / 100        dry = 1 - wet_level
//! ```
//!
//! The cooked values are bundled into a [`DerivedState`] that is handed to
//! the engine by value, so the audio loop never sees a half-updated mix of
//! old and new parameters.
//!
//! Cooking also tells the engine where each channel's read cursor belongs:
//! `delay_len` samples behind its write cursor, wrapped into the ring
//! (see [`read_index`]).

/// Milliseconds per second, used by the ms → samples conversion.
const MS_PER_SECOND: f64 = 1000.0;

/// Upper bound of the feedback and wet/dry percentages.
const PERCENT: f32 = 100.0;

/// The user-facing parameters, in the units the controls display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterSet {
    /// Delay time in milliseconds, 0 to 2000.
    pub delay_time_ms: f32,
    /// Feedback in percent, 0 to 100.
    pub feedback_pct: f32,
    /// Wet level in percent, 0 to 100. The dry level is whatever is left.
    pub wet_level_pct: f32,
    /// Cross mode: each channel reads its delayed tap from the other
    /// channel's line.
    pub cross: bool,
}

impl Default for ParameterSet {
    /// One second of delay, half feedback, even mix, straight routing.
    fn default() -> Self {
        Self {
            delay_time_ms: 1000.0,
            feedback_pct: 50.0,
            wet_level_pct: 50.0,
            cross: false,
        }
    }
}

/// Engine-side quantities produced by [`cook`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DerivedState {
    /// Delay in (possibly fractional) samples.
    pub delay_samples: f32,
    /// Whole-sample distance between a channel's write and read cursors.
    /// Never larger than the ring length.
    pub delay_len: usize,
    /// Feedback gain in `[0, 1]`.
    pub feedback: f32,
    /// Wet mix coefficient in `[0, 1]`.
    pub wet_level: f32,
    pub cross: bool,
}

impl DerivedState {
    /// Dry mix coefficient. Wet and dry always sum to 1 (a linear
    /// crossfade, not constant-power).
    pub fn dry_level(&self) -> f32 {
        1.0 - self.wet_level
    }

    /// A delay that truncates to zero samples would read the slot that is
    /// about to be overwritten (two seconds of stale history), so the
    /// engine bypasses the tap instead.
    pub fn is_zero_delay(&self) -> bool {
        self.delay_len == 0
    }
}

/// Convert a [`ParameterSet`] into a [`DerivedState`].
///
/// Out-of-range values are clamped rather than rejected: delay time to
/// `[0, max_delay_ms]`, percentages to `[0, 100]`, and anything non-finite
/// counts as zero. The delay length is further capped at `buffer_len`, so
/// a sample rate high enough to overflow the ring shortens the delay
/// instead of corrupting the cursors.
pub fn cook(
    params: &ParameterSet,
    sample_rate: f32,
    max_delay_ms: f32,
    buffer_len: usize,
) -> DerivedState {
    let delay_ms = finite_or_zero(params.delay_time_ms).clamp(0.0, max_delay_ms.max(0.0));

    // f64 keeps `ms * rate` exact for every integer ms/rate pair, so whole
    // sample delays don't truncate one short.
    let delay_samples =
        (f64::from(delay_ms) * f64::from(sample_rate) / MS_PER_SECOND).min(buffer_len as f64);

    // `as usize` truncates toward zero, which is `floor` for the
    // non-negative values we have here.
    let delay_len = (delay_samples as usize).min(buffer_len);

    DerivedState {
        delay_samples: delay_samples as f32,
        delay_len,
        feedback: percent_to_gain(params.feedback_pct),
        wet_level: percent_to_gain(params.wet_level_pct),
        cross: params.cross,
    }
}

/// Where the read cursor belongs for a given write cursor:
/// `(write_pos - delay_len) mod buffer_len`.
///
/// A single backward wrap is enough because `delay_len <= buffer_len`.
///
/// Example: `write_pos = 0`, `delay_len = 48000`, `buffer_len = 96000`:
/// ```text
/// 0 - 48000 < 0  →  0 + 96000 - 48000 = 48000
/// ```
pub fn read_index(write_pos: usize, delay_len: usize, buffer_len: usize) -> usize {
    debug_assert!(delay_len <= buffer_len);
    debug_assert!(write_pos < buffer_len);

    if write_pos >= delay_len {
        write_pos - delay_len
    } else {
        write_pos + buffer_len - delay_len
    }
}

fn percent_to_gain(pct: f32) -> f32 {
    finite_or_zero(pct).clamp(0.0, PERCENT) / PERCENT
}

fn finite_or_zero(value: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RING_48K: usize = 96_000;

    /// The worked example: one second at 48 kHz is 48000 samples.
    #[test]
    fn test_cook_one_second_at_48k() {
        let cooked = cook(&ParameterSet::default(), 48_000.0, 2000.0, RING_48K);

        assert_eq!(cooked.delay_len, 48_000);
        assert!((cooked.delay_samples - 48_000.0).abs() < 1e-3);
        assert!((cooked.feedback - 0.5).abs() < 1e-6);
        assert!((cooked.wet_level - 0.5).abs() < 1e-6);
        assert!(!cooked.cross);
    }

    /// Wet and dry always add up to exactly one.
    #[test]
    fn test_wet_and_dry_sum_to_one() {
        for wet in [0.0, 12.5, 33.0, 50.0, 99.0, 100.0] {
            let params = ParameterSet {
                wet_level_pct: wet,
                ..ParameterSet::default()
            };
            let cooked = cook(&params, 44_100.0, 2000.0, 88_200);
            let sum = cooked.wet_level + cooked.dry_level();
            assert!((sum - 1.0).abs() < 1e-6, "wet {wet}% summed to {sum}");
        }
    }

    /// Fractional sample delays truncate, they don't round.
    #[test]
    fn test_fractional_delay_truncates() {
        let params = ParameterSet {
            delay_time_ms: 10.007,
            ..ParameterSet::default()
        };
        let cooked = cook(&params, 44_100.0, 2000.0, 88_200);

        // 10.007 ms at 44.1 kHz is 441.3 samples.
        assert_eq!(cooked.delay_len, 441);
        assert!((cooked.delay_samples - 441.3).abs() < 1e-2);
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let params = ParameterSet {
            delay_time_ms: 5000.0,
            feedback_pct: 140.0,
            wet_level_pct: -20.0,
            cross: true,
        };
        let cooked = cook(&params, 48_000.0, 2000.0, RING_48K);

        assert_eq!(cooked.delay_len, RING_48K);
        assert!((cooked.feedback - 1.0).abs() < 1e-6);
        assert!(cooked.wet_level.abs() < 1e-6);
        assert!(cooked.cross);
    }

    #[test]
    fn test_non_finite_values_count_as_zero() {
        let params = ParameterSet {
            delay_time_ms: f32::NAN,
            feedback_pct: f32::INFINITY,
            wet_level_pct: f32::NEG_INFINITY,
            cross: false,
        };
        let cooked = cook(&params, 48_000.0, 2000.0, RING_48K);

        assert!(cooked.is_zero_delay());
        assert_eq!(cooked.feedback, 0.0);
        assert_eq!(cooked.wet_level, 0.0);
    }

    /// At a sample rate whose two-second ring is shorter than the longest
    /// delay, the delay length is capped at the ring length.
    #[test]
    fn test_delay_len_never_exceeds_ring() {
        let params = ParameterSet {
            delay_time_ms: 2000.0,
            ..ParameterSet::default()
        };
        let cooked = cook(&params, 192_000.0, 2000.0, 100_000);

        assert_eq!(cooked.delay_len, 100_000);
        assert!(cooked.delay_samples <= 100_000.0);
    }

    #[test]
    fn test_read_index_wraps_backwards() {
        assert_eq!(read_index(0, 48_000, RING_48K), 48_000);
        assert_eq!(read_index(50_000, 48_000, RING_48K), 2_000);
        assert_eq!(read_index(10, 0, RING_48K), 10);
        // A full-ring delay lands back on the write cursor.
        assert_eq!(read_index(7, RING_48K, RING_48K), 7);
    }

    /// For every whole-millisecond delay and common sample rate, the read
    /// cursor sits exactly `t * r / 1000` samples behind the write cursor
    /// and always inside the ring.
    #[test]
    fn test_read_index_matches_delay_for_all_times() {
        for rate in [22_050u32, 44_100, 48_000, 88_200, 96_000] {
            let ring = 2 * rate as usize;
            for t in (0..=2000u32).step_by(7).chain([2000]) {
                let params = ParameterSet {
                    delay_time_ms: t as f32,
                    ..ParameterSet::default()
                };
                let cooked = cook(&params, rate as f32, 2000.0, ring);
                let expected_len = (u64::from(t) * u64::from(rate) / 1000) as usize;
                assert_eq!(cooked.delay_len, expected_len, "{t} ms at {rate} Hz");

                for write in [0, 1, ring / 3, ring - 1] {
                    let read = read_index(write, cooked.delay_len, ring);
                    assert!(read < ring);
                    assert_eq!((read + cooked.delay_len) % ring, write);
                }
            }
        }
    }
}
