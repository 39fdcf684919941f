//! # Cross DDL: A Stereo Digital Delay Line (AU/VST3/CLAP)
//!
//! A two-channel feedback delay built with
//! [nih-plug](https://github.com/robbert-vdh/nih-plug). Each channel has a
//! two-second ring buffer; the delay time, feedback and wet/dry mix are
//! shared. The **Cross** switch makes each channel read its echoes from the
//! other channel's line, so repeats alternate between left and right.
//!
//! ## Layout
//!
//! - [`dsp::cooker`] turns ms/% parameters into sample counts and gains.
//! - [`dsp::delay_line`] is the per-channel ring buffer with its cursors.
//! - [`dsp::engine`] owns both lines and runs the block loop.
//! - This file is the host adapter: it forwards the host's lifecycle calls
//!   and parameter values to the engine.

pub mod dsp;
pub mod error;
mod params;

use std::num::NonZeroU32;
use std::sync::Arc;

use dsp::engine::DelayEngine;
use nih_plug::nih_error;
use nih_plug::prelude::*;
use params::PluginParams;

/// The plugin as the host sees it.
///
/// Parameters live behind an `Arc` because the host, the UI and the audio
/// thread all read them. The engine is owned by the audio thread alone and
/// only touched from `initialize()`, `reset()`, `deactivate()` and
/// `process()`, so it needs no locking.
struct CrossDdl {
    params: Arc<PluginParams>,
    engine: DelayEngine,
}

impl Default for CrossDdl {
    fn default() -> Self {
        Self {
            params: Arc::new(PluginParams::default()),
            // Unprepared until the host tells us the sample rate.
            engine: DelayEngine::new(),
        }
    }
}

impl Plugin for CrossDdl {
    const NAME: &'static str = "Cross DDL";
    const VENDOR: &'static str = "Loveless Audio";
    const URL: &'static str = "";
    const EMAIL: &'static str = "steve.loveless@gmail.com";
    const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    // Stereo first since that's what cross mode is for. Mono works too; it
    // simply has no partner line to cross over to.
    const AUDIO_IO_LAYOUTS: &'static [AudioIOLayout] = &[
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(2),
            main_output_channels: NonZeroU32::new(2),
            aux_input_ports: &[],
            aux_output_ports: &[],
            names: PortNames::const_default(),
        },
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(1),
            main_output_channels: NonZeroU32::new(1),
            aux_input_ports: &[],
            aux_output_ports: &[],
            names: PortNames::const_default(),
        },
    ];

    const MIDI_INPUT: MidiConfig = MidiConfig::None;

    type SysExMessage = ();
    type BackgroundTask = ();

    fn params(&self) -> Arc<dyn Params> {
        self.params.clone()
    }

    /// Allocate the delay lines for the host's sample rate.
    ///
    /// Returning `false` tells the host we can't run in this configuration.
    fn initialize(
        &mut self,
        _audio_io_layout: &AudioIOLayout,
        buffer_config: &BufferConfig,
        _context: &mut impl InitContext<Self>,
    ) -> bool {
        match self.engine.prepare(
            buffer_config.sample_rate,
            buffer_config.max_buffer_size as usize,
        ) {
            Ok(()) => {
                // `prepare()` cooks the defaults; bring the engine in line
                // with whatever the host has restored.
                self.engine.apply(self.params.snapshot());
                true
            }
            Err(err) => {
                nih_error!("Cross DDL can't start: {err}");
                false
            }
        }
    }

    /// Playback stopped or the plugin was bypassed. Clear the echoes so
    /// they don't bleed into the next run.
    fn reset(&mut self) {
        self.engine.reset();
    }

    fn deactivate(&mut self) {
        self.engine.release_resources();
    }

    fn process(
        &mut self,
        buffer: &mut Buffer,
        _aux: &mut AuxiliaryBuffers,
        _context: &mut impl ProcessContext<Self>,
    ) -> ProcessStatus {
        // Set and cook in one step; a no-op when nothing moved.
        self.engine.apply(self.params.snapshot());
        self.engine.process_block(buffer.as_slice());

        // Keep the host calling us while echoes are still ringing out.
        match self.engine.tail_samples() {
            u32::MAX => ProcessStatus::KeepAlive,
            tail => ProcessStatus::Tail(tail),
        }
    }
}

impl ClapPlugin for CrossDdl {
    const CLAP_ID: &'static str = "com.loveless-audio.cross-ddl";
    const CLAP_DESCRIPTION: Option<&'static str> =
        Some("A stereo feedback delay with cross-coupled delay taps");
    const CLAP_MANUAL_URL: Option<&'static str> = None;
    const CLAP_SUPPORT_URL: Option<&'static str> = None;
    const CLAP_FEATURES: &'static [ClapFeature] = &[
        ClapFeature::AudioEffect,
        ClapFeature::Stereo,
        ClapFeature::Delay,
    ];
}

impl Vst3Plugin for CrossDdl {
    const VST3_CLASS_ID: [u8; 16] = *b"LvlssCrossDDL001";
    const VST3_SUBCATEGORIES: &'static [Vst3SubCategory] =
        &[Vst3SubCategory::Fx, Vst3SubCategory::Delay];
}

nih_export_clap!(CrossDdl);
nih_export_vst3!(CrossDdl);

// AUv2 entry point for Logic Pro, wrapped around the CLAP export.
clap_wrapper::export_auv2!();

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_plugin_starts_unprepared() {
        let plugin = CrossDdl::default();

        assert!(!plugin.engine.is_prepared());
        assert_eq!(plugin.engine.params(), plugin.params.snapshot());
    }

    #[test]
    fn test_class_id_is_sixteen_ascii_bytes() {
        assert!(CrossDdl::VST3_CLASS_ID.is_ascii());
    }
}
