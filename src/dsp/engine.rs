//! # Stereo Delay Engine
//!
//! Owns one [`DelayLine`] per channel and runs the per-sample
//! read → feedback → write → mix loop over each block the host hands us.
//!
//! ```text
//!                 ┌──────────── cross? ────────────┐
//!                 │                                │
//!   x[n] ──┬──►(+)──► [own line] ──► tap ──┐   [other line] ──► tap
//!          │    ▲                          │         │
//!          │    └──── × feedback ◄──── y[n] ◄────────┘ (cross mode)
//!          │                               │
//!          └──── × (1 - wet) ──►(+)◄── × wet
//!                                │
//!                                ▼
//!                              out[n]
//! ```
//!
//! Feedback always goes back into the channel's *own* line; cross mode
//! only swaps which line the read tap comes from. With cross enabled the
//! two lines form one long loop that bounces between the channels.
//!
//! ## Lifecycle
//!
//! An engine starts Unprepared: it has no buffers and every call to
//! [`process_block`](DelayEngine::process_block) leaves the audio alone.
//! [`prepare`](DelayEngine::prepare) allocates the rings once the sample
//! rate is known; [`release_resources`](DelayEngine::release_resources)
//! drops them again.

use std::num::NonZeroUsize;

use nih_plug::{nih_log, nih_warn};

use super::cooker::{cook, DerivedState, ParameterSet};
use super::delay_line::DelayLine;
use crate::error::EngineError;

/// The engine is strictly stereo. Channels beyond the right one are
/// neither read nor written.
pub const NUM_CHANNELS: usize = 2;

/// Feedback below this is treated as "no repeats" when estimating the tail.
const SILENT_FEEDBACK: f32 = 0.001;

/// `log10` of the level (-60 dB) at which an echo counts as gone.
const TAIL_FLOOR_LOG10: f32 = -3.0;

/// Engine-level settings that don't change while audio is streaming.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// Length of each ring buffer in seconds of audio.
    pub buffer_seconds: f32,
    /// Longest delay time the cooker will accept, in milliseconds.
    pub max_delay_ms: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            buffer_seconds: 2.0,
            max_delay_ms: 2000.0,
        }
    }
}

impl EngineConfig {
    fn validate(&self) -> Result<(), EngineError> {
        let fits = self.buffer_seconds.is_finite()
            && self.max_delay_ms.is_finite()
            && self.max_delay_ms >= 0.0
            && self.buffer_seconds * 1000.0 >= self.max_delay_ms;

        if fits {
            Ok(())
        } else {
            Err(EngineError::BufferTooShort {
                buffer_seconds: self.buffer_seconds,
                max_delay_ms: self.max_delay_ms,
            })
        }
    }
}

/// A channel's write and read positions in its ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursors {
    pub write: usize,
    pub read: usize,
}

pub struct DelayEngine {
    config: EngineConfig,

    /// What the user asked for, in display units.
    params: ParameterSet,

    /// What the audio loop uses. Only ever replaced as a whole by
    /// `cook_variables()`.
    derived: DerivedState,

    sample_rate: f32,

    /// `None` while Unprepared.
    lines: Option<[DelayLine; NUM_CHANNELS]>,

    /// Set by `reset()`, which zeroes the cursors. The read cursors are put
    /// back behind the write cursors before the next block runs.
    retarget_pending: bool,
}

impl Default for DelayEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl DelayEngine {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            params: ParameterSet::default(),
            derived: DerivedState::default(),
            sample_rate: 0.0,
            lines: None,
            retarget_pending: false,
        }
    }

    // ─────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────

    /// Allocate two silent rings sized for `sample_rate`, put every cursor
    /// at 0 and cook the default parameters.
    ///
    /// Call this before the first block and again whenever the sample rate
    /// changes. Any previous buffers are dropped. This allocates, so it
    /// must not be called from the audio callback.
    ///
    /// `max_block_size` is only a hint; blocks of any length are handled.
    pub fn prepare(&mut self, sample_rate: f32, max_block_size: usize) -> Result<(), EngineError> {
        if let Err(err) = self.config.validate() {
            nih_warn!("Refusing to prepare delay engine: {err}");
            return Err(err);
        }
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(EngineError::InvalidSampleRate(sample_rate));
        }

        let buffer_len = (f64::from(self.config.buffer_seconds) * f64::from(sample_rate)) as usize;
        let buffer_len =
            NonZeroUsize::new(buffer_len).ok_or(EngineError::InvalidSampleRate(sample_rate))?;

        self.lines = Some([DelayLine::new(buffer_len), DelayLine::new(buffer_len)]);
        self.sample_rate = sample_rate;
        self.params = ParameterSet::default();
        self.cook_variables();

        nih_log!(
            "Delay engine prepared: {sample_rate} Hz, {} samples per channel, blocks up to {max_block_size}",
            buffer_len.get()
        );

        Ok(())
    }

    /// Drop the ring buffers and return to Unprepared. Parameters survive.
    pub fn release_resources(&mut self) {
        if self.lines.take().is_some() {
            nih_log!("Delay engine released its buffers");
        }
        self.retarget_pending = false;
    }

    /// Silence both rings and move all four cursors to 0 without
    /// reallocating or touching the parameters.
    ///
    /// The delay tap is re-aimed at the start of the next block.
    pub fn reset(&mut self) {
        if let Some(lines) = self.lines.as_mut() {
            for line in lines.iter_mut() {
                line.clear();
            }
            self.retarget_pending = true;
        }
    }

    pub fn is_prepared(&self) -> bool {
        self.lines.is_some()
    }

    // ─────────────────────────────────────────────────────────────────
    // Parameters
    // ─────────────────────────────────────────────────────────────────

    /// Replace every parameter and recook in one step. Does nothing if
    /// `params` matches what's already applied, so calling this once per
    /// block is cheap.
    ///
    /// Safe to call from the audio thread: it never allocates.
    pub fn apply(&mut self, params: ParameterSet) {
        if params == self.params {
            return;
        }
        self.params = params;
        self.cook_variables();
    }

    pub fn set_delay_time(&mut self, ms: f32) {
        self.params.delay_time_ms = ms;
        self.cook_variables();
    }

    pub fn set_feedback(&mut self, pct: f32) {
        self.params.feedback_pct = pct;
        self.cook_variables();
    }

    pub fn set_wet_level(&mut self, pct: f32) {
        self.params.wet_level_pct = pct;
        self.cook_variables();
    }

    pub fn set_cross_enabled(&mut self, enabled: bool) {
        self.params.cross = enabled;
        self.cook_variables();
    }

    pub fn toggle_cross(&mut self) {
        self.set_cross_enabled(!self.params.cross);
    }

    pub fn delay_time(&self) -> f32 {
        self.params.delay_time_ms
    }

    pub fn feedback(&self) -> f32 {
        self.params.feedback_pct
    }

    pub fn wet_level(&self) -> f32 {
        self.params.wet_level_pct
    }

    pub fn cross_enabled(&self) -> bool {
        self.params.cross
    }

    pub fn params(&self) -> ParameterSet {
        self.params
    }

    /// Recompute the derived state from the current parameters and move
    /// each channel's read cursor to sit `delay_len` samples behind its
    /// write cursor. Buffer contents and write cursors are untouched.
    ///
    /// The setters already call this; it's public for callers that want to
    /// force a recompute.
    pub fn cook_variables(&mut self) {
        self.derived = cook(
            &self.params,
            self.sample_rate,
            self.config.max_delay_ms,
            self.buffer_len(),
        );

        if let Some(lines) = self.lines.as_mut() {
            for line in lines.iter_mut() {
                line.retarget(self.derived.delay_len);
            }
        }
        self.retarget_pending = false;
    }

    // ─────────────────────────────────────────────────────────────────
    // Audio
    // ─────────────────────────────────────────────────────────────────

    /// Run the delay over one block, in place.
    ///
    /// `channels[0]` is left, `channels[1]` is right. Each channel is
    /// processed start to finish before the next one. Per sample:
    ///
    /// 1. Read `y[n]` at this channel's read cursor, from the other line in
    ///    cross mode or this channel's own line otherwise. A zero-length
    ///    delay uses the input as `y[n]`.
    /// 2. Write `x[n] + feedback * y[n]` into this channel's own line.
    /// 3. Output `wet * y[n] + (1 - wet) * x[n]`.
    /// 4. Advance both cursors.
    ///
    /// Does nothing while Unprepared. Channels past the right one are left
    /// as they are. A mono block reads its own line even in cross mode.
    pub fn process_block(&mut self, channels: &mut [&mut [f32]]) {
        if self.retarget_pending {
            self.cook_variables();
        }

        // Snapshot by value so the loop works from one consistent state.
        let derived = self.derived;
        let dry_level = derived.dry_level();
        let cross = derived.cross && channels.len() >= NUM_CHANNELS;

        let Some(lines) = self.lines.as_mut() else {
            return;
        };

        for (channel, samples) in channels.iter_mut().take(NUM_CHANNELS).enumerate() {
            let source = if cross {
                NUM_CHANNELS - 1 - channel
            } else {
                channel
            };

            for sample in samples.iter_mut() {
                let input = *sample;

                let delayed = if derived.is_zero_delay() {
                    input
                } else {
                    lines[source].sample_at(lines[channel].read_pos())
                };

                lines[channel].write(input + derived.feedback * delayed);
                *sample = derived.wet_level * delayed + dry_level * input;
                lines[channel].advance();
            }
        }
    }

    /// How many samples the echoes keep sounding after the input stops.
    ///
    /// Each pass around the loop scales an echo by `feedback`, so it takes
    /// `log(0.001) / log(feedback)` passes to fall to -60 dB. With no
    /// feedback there's exactly one echo, one delay length later. Feedback
    /// of 100% never decays and reports `u32::MAX`.
    pub fn tail_samples(&self) -> u32 {
        if !self.is_prepared() {
            return 0;
        }

        let delay = self.derived.delay_len as f32;
        let feedback = self.derived.feedback;

        if feedback >= 1.0 {
            u32::MAX
        } else if feedback > SILENT_FEEDBACK {
            let repeats = TAIL_FLOOR_LOG10 / feedback.log10();
            // Float → int casts saturate, so a huge tail clamps to u32::MAX.
            (repeats * delay) as u32
        } else {
            delay as u32
        }
    }

    // ─────────────────────────────────────────────────────────────────
    // Introspection
    // ─────────────────────────────────────────────────────────────────

    pub fn config(&self) -> EngineConfig {
        self.config
    }

    /// 0 while Unprepared.
    pub fn sample_rate(&self) -> f32 {
        if self.is_prepared() {
            self.sample_rate
        } else {
            0.0
        }
    }

    /// Ring length in samples, 0 while Unprepared.
    pub fn buffer_len(&self) -> usize {
        self.lines.as_ref().map_or(0, |lines| lines[0].len())
    }

    pub fn derived(&self) -> DerivedState {
        self.derived
    }

    /// `None` while Unprepared or for a channel past the right one.
    pub fn cursors(&self, channel: usize) -> Option<Cursors> {
        let line = self.lines.as_ref()?.get(channel)?;
        Some(Cursors {
            write: line.write_pos(),
            read: line.read_pos(),
        })
    }

    #[cfg(test)]
    fn is_silent(&self) -> bool {
        self.lines
            .as_ref()
            .is_some_and(|lines| lines.iter().all(DelayLine::is_silent))
    }
}
