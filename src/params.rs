//! # Plugin Parameters
//!
//! These are the controls the host shows for Cross DDL. Each one has a
//! stable string ID (`#[id = "..."]`) the host uses to save and recall
//! presets, so the IDs must never change once published.
//!
//! None of the parameters are smoothed. A delay time change moves the read
//! cursor in one jump, which is an accepted artifact of this design.
//!
//! The audio thread never works on these directly. Once per block it takes
//! a [`ParameterSet`] snapshot and hands it to the engine by value.

use nih_plug::prelude::*;

use crate::dsp::cooker::ParameterSet;

#[derive(Params)]
pub struct PluginParams {
    /// **Delay Time** in milliseconds, 0 to 2000.
    ///
    /// Zero is allowed and turns the effect into a straight wire (the delay
    /// tap is bypassed).
    #[id = "delay"]
    pub delay_time: FloatParam,

    /// **Feedback** in percent. At 100% the repeats never die away.
    #[id = "fdbk"]
    pub feedback: FloatParam,

    /// **Dry/Wet** in percent. Dry is always `100 - wet`.
    #[id = "wet"]
    pub wet_level: FloatParam,

    /// **Cross**: read each channel's echoes from the other channel's
    /// delay line, so repeats bounce left and right.
    #[id = "cross"]
    pub cross: BoolParam,
}

impl Default for PluginParams {
    fn default() -> Self {
        let defaults = ParameterSet::default();

        Self {
            delay_time: FloatParam::new(
                "Delay Time",
                defaults.delay_time_ms,
                FloatRange::Linear {
                    min: 0.0,
                    max: 2000.0,
                },
            )
            .with_unit(" ms")
            .with_step_size(1.0),

            feedback: FloatParam::new(
                "Feedback",
                defaults.feedback_pct,
                FloatRange::Linear {
                    min: 0.0,
                    max: 100.0,
                },
            )
            .with_unit(" %")
            .with_step_size(1.0),

            wet_level: FloatParam::new(
                "Dry/Wet",
                defaults.wet_level_pct,
                FloatRange::Linear {
                    min: 0.0,
                    max: 100.0,
                },
            )
            .with_unit(" %")
            .with_step_size(1.0),

            cross: BoolParam::new("Cross", defaults.cross),
        }
    }
}

impl PluginParams {
    /// Read every parameter at once. Each field is an atomic load, so this
    /// is safe on the audio thread.
    pub fn snapshot(&self) -> ParameterSet {
        ParameterSet {
            delay_time_ms: self.delay_time.value(),
            feedback_pct: self.feedback.value(),
            wet_level_pct: self.wet_level.value(),
            cross: self.cross.value(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A freshly loaded plugin starts from the same settings the engine
    /// cooks in `prepare()`.
    #[test]
    fn test_defaults_match_engine_defaults() {
        let params = PluginParams::default();
        assert_eq!(params.snapshot(), ParameterSet::default());
    }

    #[test]
    fn test_ranges_cover_the_full_controls() {
        let params = PluginParams::default();

        assert_eq!(params.delay_time.preview_plain(0.0), 0.0);
        assert_eq!(params.delay_time.preview_plain(1.0), 2000.0);
        assert_eq!(params.feedback.preview_plain(1.0), 100.0);
        assert_eq!(params.wet_level.preview_plain(0.0), 0.0);
    }
}
